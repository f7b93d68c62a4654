use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use env_logger::Env;
use glam::Vec3;
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use surfplot::error::RenderError;
use surfplot::math::PrimitiveKind;
use surfplot::math::examples::{FORMULA_EXAMPLES, find_example};
use surfplot::renderer::{
    Controller, Expression, GpuContext, NavigationKey, RecordingContext, Rgb,
};
use surfplot::SceneConfig;

const ZOOM_STEP: f64 = 5.0;

#[derive(Parser)]
#[command(name = "surfplot", version, about = "Plot z = f(x, y) surfaces in 3D")]
#[command(after_help = r#"
Formulas take an optional color suffix, e.g. "sin(x) + cos(y)#2eac23".
Function arguments are separated by spaces: "atan2(y x)", "pow(x 2)".

Controls:
  Arrow keys    rotate the scene
  Right drag    spin the camera
  Mouse wheel   zoom in or out
  R             re-sample
  Esc           quit
"#)]
struct Cli {
    /// Formulas to plot, each as FORMULA or FORMULA#RRGGBB
    formulas: Vec<String>,

    /// Plot a named preset instead of FORMULAS
    #[arg(short, long, conflicts_with = "formulas")]
    example: Option<String>,

    /// List the presets and exit
    #[arg(long)]
    list_examples: bool,

    /// Zoom level from 0 (widest) to 100
    #[arg(short, long, default_value_t = 50.0)]
    zoom: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    x_offset: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    y_offset: f64,

    /// Draw filled triangles
    #[arg(long, conflicts_with = "wireframe")]
    filled: bool,

    /// Draw triangle edges (default)
    #[arg(long)]
    wireframe: bool,

    /// Sample and render one frame without opening a window
    #[arg(long)]
    headless: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// The state the viewer re-samples from.
struct Plot {
    expressions: Vec<Expression>,
    zoom: f64,
    x_offset: f64,
    y_offset: f64,
}

fn parse_expression(arg: &str, fallback: Rgb) -> Result<Expression> {
    match arg.rsplit_once('#') {
        Some((formula, hex)) => {
            let color = Rgb::from_hex(hex)
                .ok_or_else(|| anyhow!("invalid color '#{hex}' in '{arg}'"))?;
            Ok(Expression::new(formula.trim(), color))
        }
        None => Ok(Expression::new(arg.trim(), fallback)),
    }
}

fn expressions_from(cli: &Cli) -> Result<Vec<Expression>> {
    if let Some(name) = &cli.example {
        let example =
            find_example(name).with_context(|| format!("no preset named '{name}'"))?;
        info!("plotting preset {}: {}", example.name, example.formula);
        return Ok(vec![Expression::new(example.formula, example.color)]);
    }

    if cli.formulas.is_empty() {
        let example = &FORMULA_EXAMPLES[0];
        info!("no formula given, plotting {}", example.formula);
        return Ok(vec![Expression::new(example.formula, example.color)]);
    }

    cli.formulas
        .iter()
        .enumerate()
        .map(|(i, arg)| parse_expression(arg, FORMULA_EXAMPLES[i % FORMULA_EXAMPLES.len()].color))
        .collect()
}

fn scene_config(cli: &Cli) -> SceneConfig {
    let mut config = SceneConfig::default();
    config.surface.primitive = if cli.filled && !cli.wireframe {
        PrimitiveKind::Triangles
    } else {
        PrimitiveKind::Lines
    };
    config
}

fn run_headless(config: SceneConfig, plot: &Plot) -> Result<()> {
    let mut controller = Controller::with_config(config);
    controller
        .init(RecordingContext::new(800, 800))
        .context("initializing headless scene")?;
    controller
        .sample(plot.zoom, &plot.expressions, plot.x_offset, plot.y_offset)
        .context("sampling expressions")?;

    for (expression, surface) in plot.expressions.iter().zip(controller.surfaces()) {
        let (low, high) = surface
            .points()
            .chunks_exact(4)
            .map(|p| p[2])
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), z| {
                (lo.min(z), hi.max(z))
            });
        info!("{}: z in [{low}, {high}]", expression.formula);
    }

    if let Some(ctx) = controller.context() {
        info!(
            "rendered {} frame(s), {} draw call(s) in the last",
            ctx.frame_count(),
            ctx.last_frame().len()
        );
    }
    Ok(())
}

struct App {
    config: Option<SceneConfig>,
    plot: Plot,
    controller: Option<Controller<GpuContext>>,
    window: Option<Arc<Window>>,
    dragging: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: SceneConfig, plot: Plot) -> Self {
        Self {
            config: Some(config),
            plot,
            controller: None,
            window: None,
            dragging: false,
            last_cursor: None,
            fatal: None,
        }
    }

    fn init_scene(&mut self, window: Arc<Window>) -> Result<()> {
        let gpu = pollster::block_on(GpuContext::new(window.clone()))
            .context("initializing GPU")?;

        let config = self.config.take().unwrap_or_default();
        let mut controller = Controller::with_config(config);
        controller.init(gpu).context("initializing scene")?;

        self.window = Some(window);
        self.controller = Some(controller);
        self.resample();
        Ok(())
    }

    fn with_controller(
        &mut self,
        action: impl FnOnce(&mut Controller<GpuContext>, &Plot) -> Result<(), RenderError>,
    ) {
        if let Some(controller) = &mut self.controller {
            if let Err(e) = action(controller, &self.plot) {
                error!("render failed: {e}");
            }
        }
    }

    fn resample(&mut self) {
        self.with_controller(|controller, plot| {
            controller.sample(plot.zoom, &plot.expressions, plot.x_offset, plot.y_offset)
        });
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        let navigation = match key {
            KeyCode::ArrowLeft => NavigationKey::ArrowLeft,
            KeyCode::ArrowUp => NavigationKey::ArrowUp,
            KeyCode::ArrowRight => NavigationKey::ArrowRight,
            KeyCode::ArrowDown => NavigationKey::ArrowDown,
            KeyCode::KeyR => return self.resample(),
            KeyCode::Escape => return event_loop.exit(),
            _ => return,
        };

        self.with_controller(|controller, _| controller.key_navigate(navigation.name()));
    }

    fn zoom_by(&mut self, lines: f32) {
        if lines == 0.0 {
            return;
        }
        self.plot.zoom = (self.plot.zoom + ZOOM_STEP * lines.signum() as f64).clamp(0.0, 100.0);
        info!("zoom {}", self.plot.zoom);
        self.resample();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("surfplot")
            .with_inner_size(PhysicalSize::new(900, 900));

        let result = event_loop
            .create_window(window_attrs)
            .context("creating window")
            .and_then(|window| self.init_scene(Arc::new(window)));
        if let Err(e) = result {
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.controller.as_mut().and_then(|c| c.context_mut()) {
                    gpu.resize(size);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    if let PhysicalKey::Code(key) = event.physical_key {
                        self.handle_key(event_loop, key);
                    }
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
                self.last_cursor = None;
                if !self.dragging {
                    self.with_controller(|controller, _| controller.rotate_camera(0.0, 0.0));
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if self.dragging {
                    if let Some(last) = self.last_cursor {
                        let dx = (position.x - last.x) as f32;
                        let dy = (position.y - last.y) as f32;
                        self.with_controller(|controller, _| controller.rotate_camera(dx, dy));
                    }
                    self.last_cursor = Some(position);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.zoom_by(lines);
            }

            WindowEvent::RedrawRequested => {
                self.with_controller(|controller, _| controller.render());
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let spinning = self
            .controller
            .as_ref()
            .is_some_and(|c| c.camera().rotation_speed != Vec3::ZERO);
        if spinning {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    if cli.list_examples {
        for example in FORMULA_EXAMPLES {
            println!("{:<12} {:<32} {}", example.name, example.formula, example.description);
        }
        return Ok(());
    }

    if !(0.0..=100.0).contains(&cli.zoom) {
        bail!("zoom must be between 0 and 100, got {}", cli.zoom);
    }

    let plot = Plot {
        expressions: expressions_from(&cli)?,
        zoom: cli.zoom,
        x_offset: cli.x_offset,
        y_offset: cli.y_offset,
    };
    let config = scene_config(&cli);

    if cli.headless {
        return run_headless(config, &plot);
    }

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, plot);
    event_loop.run_app(&mut app).context("running event loop")?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

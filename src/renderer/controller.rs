use std::sync::Arc;

use glam::{Mat4, Vec3};
use parking_lot::{Mutex, MutexGuard};

use crate::config::SceneConfig;
use crate::error::{DrawError, RenderError, StateError};
use crate::math::formula::{Formula, zoom_scale};
use crate::math::mesh::AxisKind;
use crate::renderer::camera::{CameraState, NavigationKey};
use crate::renderer::context::{GraphicsContext, ProgramId, UNIFORM_VIEW};
use crate::renderer::scene::{Axis, Drawable, Expression, Surface};
use crate::renderer::shaders;

/// Everything that only exists once a graphics context has been attached.
struct Graphics<G> {
    ctx: G,
    program: ProgramId,
    axes: [Axis; 3],
}

/// Owns the camera and one surface per plotted expression, and drives the
/// draw loop through a [`GraphicsContext`].
pub struct Controller<G: GraphicsContext> {
    config: SceneConfig,
    gfx: Option<Graphics<G>>,
    camera: CameraState,
    surfaces: Vec<Surface>,
}

impl<G: GraphicsContext> Controller<G> {
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    pub fn with_config(config: SceneConfig) -> Self {
        let camera = CameraState::new(&config.camera);
        Self {
            config,
            gfx: None,
            camera,
            surfaces: Vec::new(),
        }
    }

    /// Compiles the shader program, resets the camera and builds the axes.
    pub fn init(&mut self, mut ctx: G) -> Result<(), RenderError> {
        let program = ctx.compile_program(shaders::VERTEX_SHADER, shaders::FRAGMENT_SHADER)?;
        let (width, height) = ctx.drawable_size();
        ctx.set_viewport(0, 0, width, height);

        self.camera = CameraState::new(&self.config.camera);
        self.gfx = Some(Graphics {
            ctx,
            program,
            axes: AxisKind::ALL.map(Axis::new),
        });

        log::info!("scene initialized at {width}x{height}");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.gfx.is_some()
    }

    /// Re-evaluates every expression onto its surface, drops surfaces left
    /// over from a longer list, and renders.
    ///
    /// A formula that fails to compile or evaluate is logged and its surface
    /// keeps whatever heights it had.
    pub fn sample(
        &mut self,
        zoom: f64,
        expressions: &[Expression],
        x_offset: f64,
        y_offset: f64,
    ) -> Result<(), RenderError> {
        if self.gfx.is_none() {
            return Err(StateError::NotInitialized.into());
        }

        let scale = zoom_scale(zoom);
        log::debug!(
            "sampling {} expression(s) at zoom {zoom} (scale {scale}), offset ({x_offset}, {y_offset})",
            expressions.len()
        );

        let surface_config = self.config.surface;
        for (index, expression) in expressions.iter().enumerate() {
            let color = expression.color.normalized();
            if index == self.surfaces.len() {
                self.surfaces.push(Surface::new(
                    surface_config.width,
                    surface_config.height,
                    surface_config.resolution,
                    surface_config.primitive,
                    color,
                )?);
            }

            let surface = &mut self.surfaces[index];
            surface.set_color(color);

            let result = Formula::compile(&expression.formula)
                .and_then(|formula| {
                    formula
                        .sample_heights(surface.points_mut(), scale, x_offset, y_offset)
                        .map_err(Into::into)
                });
            if let Err(err) = result {
                log::warn!(
                    "skipping expression {index} ({:?}): {err}",
                    expression.formula
                );
            }
        }

        self.surfaces.truncate(expressions.len());
        self.render()
    }

    /// Sets the per-frame spin from a drag delta in degrees and renders once.
    pub fn rotate_camera(&mut self, dx: f32, dy: f32) -> Result<(), RenderError> {
        if self.gfx.is_none() {
            return Err(StateError::NotInitialized.into());
        }

        let scale = self.config.rotation_speed_scale;
        let speed = Vec3::new(dx.to_radians() * scale, dy.to_radians() * scale, 0.0);
        self.camera = self.camera.with_rotation_speed(speed);
        self.render()
    }

    /// Applies an arrow key by name; other keys only re-render.
    pub fn key_navigate(&mut self, key: &str) -> Result<(), RenderError> {
        if self.gfx.is_none() {
            return Err(StateError::NotInitialized.into());
        }

        let key = NavigationKey::from_name(key);
        self.camera = self.camera.navigated(key, self.config.key_step());
        self.render()
    }

    pub fn render(&mut self) -> Result<(), RenderError> {
        let Some(gfx) = self.gfx.as_mut() else {
            return Err(StateError::NotInitialized.into());
        };

        self.camera = self.camera.advanced();
        let view = self.camera.view_matrix(&self.config.projection);

        gfx.ctx.begin_frame(self.config.clear_color)?;
        if let Err(e) = Self::draw_scene(gfx, &self.surfaces, &view) {
            log::warn!("dropping frame: {e}");
            gfx.ctx.abort_frame();
            return Err(e);
        }
        gfx.ctx.end_frame()
    }

    fn draw_scene(
        gfx: &mut Graphics<G>,
        surfaces: &[Surface],
        view: &Mat4,
    ) -> Result<(), RenderError> {
        let ctx = &mut gfx.ctx;
        ctx.use_program(gfx.program);

        let location = ctx
            .uniform_location(gfx.program, UNIFORM_VIEW)
            .ok_or(DrawError::MissingLocation(UNIFORM_VIEW))?;
        ctx.set_uniform_mat4(location, view);

        for surface in surfaces {
            surface.draw(ctx, gfx.program)?;
        }
        for axis in &gfx.axes {
            axis.draw(ctx, gfx.program)?;
        }
        Ok(())
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn context(&self) -> Option<&G> {
        self.gfx.as_ref().map(|gfx| &gfx.ctx)
    }

    pub fn context_mut(&mut self) -> Option<&mut G> {
        self.gfx.as_mut().map(|gfx| &mut gfx.ctx)
    }
}

impl<G: GraphicsContext> Default for Controller<G> {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Controller`] behind a mutex, for hosts that drive the scene from more
/// than one thread. Each call holds the lock for its whole duration.
pub struct SharedController<G: GraphicsContext> {
    inner: Arc<Mutex<Controller<G>>>,
}

impl<G: GraphicsContext> Clone for SharedController<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: GraphicsContext> SharedController<G> {
    pub fn new(controller: Controller<G>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    pub fn init(&self, ctx: G) -> Result<(), RenderError> {
        self.inner.lock().init(ctx)
    }

    pub fn sample(
        &self,
        zoom: f64,
        expressions: &[Expression],
        x_offset: f64,
        y_offset: f64,
    ) -> Result<(), RenderError> {
        self.inner
            .lock()
            .sample(zoom, expressions, x_offset, y_offset)
    }

    pub fn rotate_camera(&self, dx: f32, dy: f32) -> Result<(), RenderError> {
        self.inner.lock().rotate_camera(dx, dy)
    }

    pub fn key_navigate(&self, key: &str) -> Result<(), RenderError> {
        self.inner.lock().key_navigate(key)
    }

    pub fn render(&self) -> Result<(), RenderError> {
        self.inner.lock().render()
    }

    /// Locks the controller for direct inspection.
    pub fn lock(&self) -> MutexGuard<'_, Controller<G>> {
        self.inner.lock()
    }
}

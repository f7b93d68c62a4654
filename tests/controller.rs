use std::sync::Once;

use surfplot::error::{DrawError, RenderError, StateError};
use surfplot::math::PrimitiveKind;
use surfplot::math::matrix;
use surfplot::renderer::{Controller, Expression, RecordingContext, Rgb, SharedController};
use surfplot::SceneConfig;

fn init_logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn controller() -> Controller<RecordingContext> {
    init_logger();
    let mut controller = Controller::new();
    controller
        .init(RecordingContext::new(500, 500))
        .expect("init");
    controller
}

fn expr(formula: &str) -> Expression {
    Expression::new(formula, Rgb::new(84, 102, 206))
}

fn heights(controller: &Controller<RecordingContext>, surface: usize) -> Vec<f32> {
    controller.surfaces()[surface]
        .points()
        .chunks_exact(4)
        .map(|p| p[2])
        .collect()
}

#[test]
fn paraboloid_at_half_zoom() {
    let mut controller = controller();
    controller
        .sample(50.0, &[expr("x^2 + y^2")], 0.0, 0.0)
        .expect("sample");

    let points = controller.surfaces()[0].points();
    assert_eq!(points.len(), 110 * 110 * 4);
    for p in points.chunks_exact(4) {
        let (px, py) = (p[0] as f64, p[1] as f64);
        let expected = 10.0 * (px * px + py * py);
        assert!(
            (p[2] as f64 - expected).abs() < 1e-4,
            "({px}, {py}) -> {} != {expected}",
            p[2]
        );
        assert_eq!(p[3], 1.0);
    }
}

#[test]
fn offsets_shift_the_sampled_domain() {
    let mut controller = controller();
    controller
        .sample(50.0, &[expr("x")], 3.0, 0.0)
        .expect("sample");

    for p in controller.surfaces()[0].points().chunks_exact(4) {
        let expected = (10.0 * p[0] as f64 + 3.0) / 10.0;
        assert!((p[2] as f64 - expected).abs() < 1e-5);
    }
}

#[test]
fn shrinking_the_list_drops_trailing_surfaces() {
    let mut controller = controller();
    controller
        .sample(50.0, &[expr("x"), expr("y")], 0.0, 0.0)
        .expect("sample");
    assert_eq!(controller.surfaces().len(), 2);

    controller.sample(50.0, &[expr("y")], 0.0, 0.0).expect("sample");
    assert_eq!(controller.surfaces().len(), 1);

    let mut fresh = self::controller();
    fresh.sample(50.0, &[expr("y")], 0.0, 0.0).expect("sample");
    assert_eq!(heights(&controller, 0), heights(&fresh, 0));
}

#[test]
fn empty_formula_is_flat() {
    let mut controller = controller();
    controller.sample(50.0, &[expr("")], 0.0, 0.0).expect("sample");

    assert!(heights(&controller, 0).iter().all(|&z| z == 0.0));
}

#[test]
fn bad_formula_keeps_previous_heights() {
    let mut controller = controller();
    controller
        .sample(50.0, &[expr("x"), expr("y")], 0.0, 0.0)
        .expect("sample");
    let before = heights(&controller, 0);

    // lex failure for the first, eval failure for the second
    controller
        .sample(50.0, &[expr("x $ 2"), expr("t * 2")], 0.0, 0.0)
        .expect("bad formulas are not fatal");

    assert_eq!(controller.surfaces().len(), 2);
    assert_eq!(heights(&controller, 0), before);

    let frame = controller.context().expect("context").last_frame();
    assert_eq!(frame.len(), 2 + 3);
}

#[test]
fn bad_formula_on_new_slot_still_draws_flat() {
    let mut controller = controller();
    controller
        .sample(50.0, &[expr("sin")], 0.0, 0.0)
        .expect("sample");

    assert_eq!(controller.surfaces().len(), 1);
    assert!(heights(&controller, 0).iter().all(|&z| z == 0.0));
}

#[test]
fn four_left_presses_make_forty_degrees() {
    let mut controller = controller();
    let initial = controller.camera().rotation_matrix;

    for _ in 0..4 {
        controller.key_navigate("ArrowLeft").expect("navigate");
    }

    let expected = matrix::multiply(&matrix::z_rotation(-40f32.to_radians()), &initial);
    assert!(controller.camera().rotation_matrix.abs_diff_eq(expected, 1e-5));
}

#[test]
fn unknown_key_only_renders() {
    let mut controller = controller();
    let camera = *controller.camera();
    let frames = controller.context().expect("context").frame_count();

    controller.key_navigate("Enter").expect("navigate");

    assert_eq!(*controller.camera(), camera);
    assert_eq!(controller.context().expect("context").frame_count(), frames + 1);
}

#[test]
fn operations_before_init_fail() {
    let mut controller: Controller<RecordingContext> = Controller::new();
    assert!(!controller.is_initialized());

    let not_initialized =
        |r: Result<(), RenderError>| matches!(r, Err(RenderError::State(StateError::NotInitialized)));

    assert!(not_initialized(controller.sample(50.0, &[expr("x")], 0.0, 0.0)));
    assert!(not_initialized(controller.render()));
    assert!(not_initialized(controller.rotate_camera(1.0, 1.0)));
    assert!(not_initialized(controller.key_navigate("ArrowLeft")));
    assert!(controller.surfaces().is_empty());
}

#[test]
fn frame_draws_surfaces_then_axes() {
    let mut controller = controller();
    controller
        .sample(
            50.0,
            &[
                Expression::new("x", Rgb::new(255, 0, 0)),
                Expression::new("y", Rgb::new(0, 255, 0)),
            ],
            0.0,
            0.0,
        )
        .expect("sample");

    let view = controller
        .camera()
        .view_matrix(&controller.config().projection);
    let frame = controller.context().expect("context").last_frame();

    assert_eq!(frame.len(), 5);
    assert_eq!(frame[0].primitive, PrimitiveKind::Lines);
    assert_eq!(frame[0].color, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(frame[1].color, [0.0, 1.0, 0.0, 1.0]);
    assert_eq!(frame[2].color, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(frame[3].color, [0.0, 1.0, 0.0, 1.0]);
    assert_eq!(frame[4].color, [0.0, 0.0, 1.0, 1.0]);
    assert!(frame[2..].iter().all(|d| d.primitive == PrimitiveKind::Triangles));

    for draw in frame {
        assert_eq!(draw.view, view);
        assert_eq!(draw.model, glam::Mat4::IDENTITY);
        assert_eq!(draw.index_count as usize, draw.indexes.len());
        assert_eq!(draw.points.len() % 4, 0);
        assert!(draw.indexes.iter().all(|&i| (i as usize) < draw.points.len() / 4));
    }
}

#[test]
fn filled_surfaces_use_triangles() {
    init_logger();
    let mut config = SceneConfig::default();
    config.surface.primitive = PrimitiveKind::Triangles;
    config.surface.resolution = 0.1;

    let mut controller = Controller::with_config(config);
    controller
        .init(RecordingContext::new(100, 100))
        .expect("init");
    controller.sample(50.0, &[expr("x")], 0.0, 0.0).expect("sample");

    let frame = controller.context().expect("context").last_frame();
    assert_eq!(frame[0].primitive, PrimitiveKind::Triangles);
    assert_eq!(frame[0].index_count, 6 * 10 * 10);
}

#[test]
fn failed_draw_does_not_wedge_later_frames() {
    init_logger();
    let mut config = SceneConfig::default();
    config.surface.width = 0.3;
    config.surface.height = 0.1;
    config.surface.resolution = 0.1;

    let mut controller = Controller::with_config(config);
    controller
        .init(RecordingContext::new(100, 100))
        .expect("init");

    // a single grid row has points but no faces to index
    assert!(matches!(
        controller.sample(50.0, &[expr("x")], 0.0, 0.0),
        Err(RenderError::Draw(DrawError::EmptyIndexes))
    ));
    assert_eq!(controller.context().expect("context").frame_count(), 0);

    controller
        .sample(50.0, &[], 0.0, 0.0)
        .expect("frame after a failed draw");
    controller.render().expect("render");

    let ctx = controller.context().expect("context");
    assert_eq!(ctx.frame_count(), 2);
    assert_eq!(ctx.last_frame().len(), 3);
}

#[test]
fn long_sessions_keep_one_frame_of_log() {
    let mut controller = controller();
    controller
        .sample(50.0, &[expr("x"), expr("y")], 0.0, 0.0)
        .expect("sample");

    for _ in 0..200 {
        controller.rotate_camera(1.0, 0.0).expect("rotate");
    }

    let ctx = controller.context().expect("context");
    assert_eq!(ctx.frame_count(), 201);
    assert_eq!(ctx.draws().len(), 5);
    assert_eq!(ctx.last_frame().len(), 5);
}

#[test]
fn shared_controller_serializes_threads() {
    let shared = SharedController::new(controller());
    let initial = shared.lock().camera().rotation_matrix;

    std::thread::scope(|scope| {
        for _ in 0..2 {
            let shared = shared.clone();
            scope.spawn(move || {
                for _ in 0..2 {
                    shared.key_navigate("ArrowLeft").expect("navigate");
                }
            });
        }
    });

    let expected = matrix::multiply(&matrix::z_rotation(-40f32.to_radians()), &initial);
    let controller = shared.lock();
    assert!(controller.camera().rotation_matrix.abs_diff_eq(expected, 1e-5));
    assert_eq!(controller.context().expect("context").frame_count(), 4);
}

use glam::{Mat4, Vec3};

use crate::math::matrix;
use crate::math::mesh::PrimitiveKind;

/// Grid every surface is sampled on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    pub width: f32,
    pub height: f32,
    pub resolution: f32,
    pub primitive: PrimitiveKind,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 1.1,
            height: 1.1,
            resolution: 0.01,
            primitive: PrimitiveKind::Lines,
        }
    }
}

/// Where the camera starts. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub pitch_degrees: f32,
    pub roll_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.75, 0.0, 0.0),
            target: Vec3::ZERO,
            up: Vec3::Z,
            pitch_degrees: -20.0,
            roll_degrees: -30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: std::f32::consts::FRAC_PI_2,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        matrix::perspective(self.fov_y, self.aspect, self.near, self.far)
    }
}

#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub surface: SurfaceConfig,
    pub camera: CameraConfig,
    pub projection: Projection,

    /// Rotation applied per arrow key press.
    pub key_step_degrees: f32,
    /// Multiplier from drag delta (in degrees) to per-frame spin.
    pub rotation_speed_scale: f32,

    pub clear_color: [f32; 4],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            camera: CameraConfig::default(),
            projection: Projection::default(),

            key_step_degrees: 10.0,
            rotation_speed_scale: 0.05,

            clear_color: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

impl SceneConfig {
    pub fn key_step(&self) -> f32 {
        self.key_step_degrees.to_radians()
    }
}

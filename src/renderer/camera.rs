use glam::{Mat4, Vec3};

use crate::config::{CameraConfig, Projection};
use crate::math::matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKey {
    ArrowLeft,
    ArrowUp,
    ArrowRight,
    ArrowDown,
    Unknown,
}

impl NavigationKey {
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => NavigationKey::ArrowLeft,
            "ArrowUp" => NavigationKey::ArrowUp,
            "ArrowRight" => NavigationKey::ArrowRight,
            "ArrowDown" => NavigationKey::ArrowDown,
            _ => NavigationKey::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NavigationKey::ArrowLeft => "ArrowLeft",
            NavigationKey::ArrowUp => "ArrowUp",
            NavigationKey::ArrowRight => "ArrowRight",
            NavigationKey::ArrowDown => "ArrowDown",
            NavigationKey::Unknown => "Unknown",
        }
    }
}

/// Camera placement plus the scene spin.
///
/// `camera_matrix` is camera-to-world and is inverted when building the view.
/// `rotation_matrix` spins the world about its z axis before viewing.
/// `rotation_speed` holds per-frame radians: `x` turns about y and `y` turns
/// about x, applied on every `advanced()` step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub camera_matrix: Mat4,
    pub rotation_matrix: Mat4,
    pub rotation_speed: Vec3,
}

impl CameraState {
    pub fn new(config: &CameraConfig) -> Self {
        let camera = matrix::look_at(config.eye, config.target, config.up);
        let camera_matrix = matrix::multiply(
            &matrix::y_rotation(config.pitch_degrees.to_radians()),
            &camera,
        );
        let rotation_matrix = matrix::multiply(
            &matrix::z_rotation(config.roll_degrees.to_radians()),
            &matrix::identity(),
        );

        Self {
            camera_matrix,
            rotation_matrix,
            rotation_speed: Vec3::ZERO,
        }
    }

    pub fn with_rotation_speed(self, rotation_speed: Vec3) -> Self {
        Self {
            rotation_speed,
            ..self
        }
    }

    pub fn navigated(self, key: NavigationKey, step: f32) -> Self {
        match key {
            NavigationKey::ArrowLeft => self.spun(-step),
            NavigationKey::ArrowRight => self.spun(step),
            NavigationKey::ArrowUp => self.pitched(step),
            NavigationKey::ArrowDown => self.pitched(-step),
            NavigationKey::Unknown => self,
        }
    }

    fn spun(self, radians: f32) -> Self {
        Self {
            rotation_matrix: matrix::multiply(&matrix::z_rotation(radians), &self.rotation_matrix),
            ..self
        }
    }

    fn pitched(self, radians: f32) -> Self {
        Self {
            camera_matrix: matrix::multiply(&matrix::y_rotation(radians), &self.camera_matrix),
            ..self
        }
    }

    /// One frame of spin at the current speed.
    pub fn advanced(self) -> Self {
        let camera = matrix::multiply(
            &matrix::y_rotation(-self.rotation_speed.x),
            &self.camera_matrix,
        );
        let camera = matrix::multiply(&matrix::x_rotation(self.rotation_speed.y), &camera);

        Self {
            camera_matrix: camera,
            ..self
        }
    }

    pub fn view_matrix(&self, projection: &Projection) -> Mat4 {
        let view = matrix::multiply(&projection.matrix(), &matrix::inverse(&self.camera_matrix));
        matrix::multiply(&view, &self.rotation_matrix)
    }
}

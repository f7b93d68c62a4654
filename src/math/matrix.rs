//! 4x4 matrix helpers for the scene camera.
//!
//! Matrices are column-major `glam::Mat4` acting on column vectors, so
//! `multiply(a, b)` applies `b` first and then `a`.

use glam::{Mat4, Vec3};

pub fn identity() -> Mat4 {
    Mat4::IDENTITY
}

pub fn x_rotation(radians: f32) -> Mat4 {
    Mat4::from_rotation_x(radians)
}

pub fn y_rotation(radians: f32) -> Mat4 {
    Mat4::from_rotation_y(radians)
}

pub fn z_rotation(radians: f32) -> Mat4 {
    Mat4::from_rotation_z(radians)
}

/// OpenGL-style perspective projection (clip depth in `[-w, w]`).
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh_gl(fov_y, aspect, near, far)
}

/// Camera-to-world matrix for a camera at `eye` looking at `target`.
///
/// This is the inverse of a view matrix: invert it before composing it into
/// the view transform.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let z_axis = (eye - target).normalize();
    let x_axis = up.cross(z_axis).normalize();
    let y_axis = z_axis.cross(x_axis).normalize();

    Mat4::from_cols(
        x_axis.extend(0.0),
        y_axis.extend(0.0),
        z_axis.extend(0.0),
        eye.extend(1.0),
    )
}

pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    *a * *b
}

pub fn inverse(m: &Mat4) -> Mat4 {
    m.inverse()
}

pub fn transpose(m: &Mat4) -> Mat4 {
    m.transpose()
}

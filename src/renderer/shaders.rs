//! Flat-color program used for every surface and axis.
//!
//! Both stages read one uniform block holding `u_view`, `u_model` and
//! `u_color`; positions arrive as `a_position` at location 0.

pub const VERTEX_SHADER: &str = include_str!("vertex.wgsl");
pub const FRAGMENT_SHADER: &str = include_str!("fragment.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

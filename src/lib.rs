//! Live 3D plots of `z = f(x, y)` surfaces.
//!
//! Formula text is compiled by [`math::Formula`] and sampled onto a grid
//! owned by [`renderer::Controller`], which draws every surface and the three
//! axes through a [`renderer::GraphicsContext`].

pub mod config;
pub mod error;
pub mod math;
pub mod renderer;

pub use config::SceneConfig;
pub use error::{FormulaError, RenderError};
pub use math::Formula;
pub use renderer::{Controller, Expression, GraphicsContext, Rgb, SharedController};

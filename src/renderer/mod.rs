pub mod camera;
pub mod context;
pub mod controller;
pub mod gpu;
pub mod recording;
pub mod scene;
pub mod shaders;

pub use camera::{CameraState, NavigationKey};
pub use context::{GraphicsContext, IndexType, ProgramId, UniformLocation};
pub use controller::{Controller, SharedController};
pub use gpu::GpuContext;
pub use recording::{DrawRecord, GlCall, RecordingContext};
pub use scene::{Axis, Drawable, Expression, Mesh, Rgb, Surface};

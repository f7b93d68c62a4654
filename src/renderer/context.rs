use glam::Mat4;

use crate::error::RenderError;
use crate::math::mesh::PrimitiveKind;

pub const ATTRIB_POSITION: &str = "a_position";
pub const UNIFORM_MODEL: &str = "u_model";
pub const UNIFORM_VIEW: &str = "u_view";
pub const UNIFORM_COLOR: &str = "u_color";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
}

/// Fixed uniform slots shared by the built-in backends.
pub(crate) fn builtin_uniform_location(name: &str) -> Option<UniformLocation> {
    match name {
        UNIFORM_MODEL => Some(UniformLocation(0)),
        UNIFORM_VIEW => Some(UniformLocation(1)),
        UNIFORM_COLOR => Some(UniformLocation(2)),
        _ => None,
    }
}

pub(crate) fn builtin_attrib_location(name: &str) -> Option<u32> {
    (name == ATTRIB_POSITION).then_some(0)
}

/// The small slice of a GL-style graphics API the scene needs.
///
/// State is bound rather than passed: the last uploaded vertex and index data
/// and the last uniform values are what `draw_elements` draws with. A frame is
/// bracketed by `begin_frame` and `end_frame`.
pub trait GraphicsContext {
    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, RenderError>;

    fn use_program(&mut self, program: ProgramId);

    /// Size of the render target in pixels.
    fn drawable_size(&self) -> (u32, u32);

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<(), RenderError>;

    fn end_frame(&mut self) -> Result<(), RenderError>;

    /// Discards the frame in progress, if any, without presenting it.
    fn abort_frame(&mut self);

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn upload_vertices(
        &mut self,
        attrib: u32,
        components: u32,
        data: &[f32],
    ) -> Result<(), RenderError>;

    fn upload_indices(&mut self, data: &[u16]) -> Result<(), RenderError>;

    fn set_uniform_mat4(&mut self, location: UniformLocation, matrix: &Mat4);

    fn set_uniform_vec4(&mut self, location: UniformLocation, value: [f32; 4]);

    fn draw_elements(
        &mut self,
        primitive: PrimitiveKind,
        count: u32,
        index_type: IndexType,
    ) -> Result<(), RenderError>;
}

use glam::Mat4;

use crate::error::{DrawError, MeshError, RenderError};
use crate::math::mesh::{self, AxisKind, MeshBuffers, POINT_STRIDE, PrimitiveKind};
use crate::renderer::context::{
    ATTRIB_POSITION, GraphicsContext, IndexType, ProgramId, UNIFORM_COLOR, UNIFORM_MODEL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels scaled to `0.0..=1.0` with an opaque alpha.
    pub fn normalized(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            1.0,
        ]
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#').unwrap_or(text);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let channel = |at: usize| u8::from_str_radix(&hex[at..at + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// One plotted formula and the color to draw it in.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub formula: String,
    pub color: Rgb,
}

impl Expression {
    pub fn new(formula: impl Into<String>, color: Rgb) -> Self {
        Self {
            formula: formula.into(),
            color,
        }
    }
}

/// Geometry plus the per-object state bound for each draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub buffers: MeshBuffers,
    pub transform: Mat4,
    pub primitive: PrimitiveKind,
    pub color: [f32; 4],
}

impl Mesh {
    pub fn new(buffers: MeshBuffers, primitive: PrimitiveKind, color: [f32; 4]) -> Self {
        Self {
            buffers,
            transform: Mat4::IDENTITY,
            primitive,
            color,
        }
    }
}

pub trait Drawable {
    fn mesh(&self) -> &Mesh;

    fn draw<G: GraphicsContext + ?Sized>(
        &self,
        ctx: &mut G,
        program: ProgramId,
    ) -> Result<(), RenderError> {
        let mesh = self.mesh();
        if mesh.buffers.points.is_empty() {
            return Err(DrawError::EmptyPoints.into());
        }
        if mesh.buffers.indexes.is_empty() {
            return Err(DrawError::EmptyIndexes.into());
        }

        let position = ctx
            .attrib_location(program, ATTRIB_POSITION)
            .ok_or(DrawError::MissingLocation(ATTRIB_POSITION))?;
        let model = ctx
            .uniform_location(program, UNIFORM_MODEL)
            .ok_or(DrawError::MissingLocation(UNIFORM_MODEL))?;
        let color = ctx
            .uniform_location(program, UNIFORM_COLOR)
            .ok_or(DrawError::MissingLocation(UNIFORM_COLOR))?;

        ctx.upload_vertices(position, POINT_STRIDE as u32, &mesh.buffers.points)?;
        ctx.upload_indices(&mesh.buffers.indexes)?;
        ctx.set_uniform_mat4(model, &mesh.transform);
        ctx.set_uniform_vec4(color, mesh.color);

        let count = mesh.buffers.indexes.len() as u32;
        log::trace!(
            "draw {:?}: {} points, {} indexes",
            mesh.primitive,
            mesh.buffers.point_count(),
            count
        );
        ctx.draw_elements(mesh.primitive, count, IndexType::U16)
    }
}

/// A sampled height field. Only the `z` of its points changes after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    mesh: Mesh,
}

impl Surface {
    pub fn new(
        width: f32,
        height: f32,
        resolution: f32,
        primitive: PrimitiveKind,
        color: [f32; 4],
    ) -> Result<Self, MeshError> {
        let buffers = mesh::make_surface(width, height, resolution, primitive)?;
        Ok(Self {
            mesh: Mesh::new(buffers, primitive, color),
        })
    }

    pub fn points(&self) -> &[f32] {
        &self.mesh.buffers.points
    }

    pub fn points_mut(&mut self) -> &mut [f32] {
        &mut self.mesh.buffers.points
    }

    pub fn color(&self) -> [f32; 4] {
        self.mesh.color
    }

    pub fn set_color(&mut self, color: [f32; 4]) {
        self.mesh.color = color;
    }
}

impl Drawable for Surface {
    fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    kind: AxisKind,
    mesh: Mesh,
}

impl Axis {
    pub fn new(kind: AxisKind) -> Self {
        Self {
            kind,
            mesh: Mesh::new(mesh::make_axis(kind), PrimitiveKind::Triangles, kind.color()),
        }
    }

    pub fn kind(&self) -> AxisKind {
        self.kind
    }
}

impl Drawable for Axis {
    fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::{GlCall, RecordingContext};

    fn compiled() -> (RecordingContext, ProgramId) {
        let mut ctx = RecordingContext::new(64, 64);
        let program = ctx.compile_program("vs", "fs").unwrap();
        ctx.use_program(program);
        (ctx, program)
    }

    #[test]
    fn rgb_normalizes_to_unit_range() {
        assert_eq!(Rgb::new(255, 0, 51).normalized(), [1.0, 0.0, 0.2, 1.0]);
    }

    #[test]
    fn rgb_from_hex() {
        assert_eq!(Rgb::from_hex("#5466ce"), Some(Rgb::new(0x54, 0x66, 0xce)));
        assert_eq!(Rgb::from_hex("FF0000"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("#zz0000"), None);
    }

    #[test]
    fn surface_draw_binds_state_then_draws() {
        let (mut ctx, program) = compiled();
        let surface =
            Surface::new(0.3, 0.3, 0.1, PrimitiveKind::Triangles, [1.0, 0.5, 0.0, 1.0]).unwrap();

        surface.draw(&mut ctx, program).unwrap();

        let calls = ctx.calls();
        let tail = &calls[calls.len() - 5..];
        assert!(matches!(tail[0], GlCall::UploadVertices { components: 4, len: 36, .. }));
        assert!(matches!(tail[1], GlCall::UploadIndices { len: 24 }));
        assert!(matches!(tail[2], GlCall::SetUniformMat4 { .. }));
        assert!(matches!(tail[3], GlCall::SetUniformVec4 { value, .. } if value == [1.0, 0.5, 0.0, 1.0]));
        assert!(matches!(
            tail[4],
            GlCall::DrawElements {
                primitive: PrimitiveKind::Triangles,
                count: 24,
                index_type: IndexType::U16,
            }
        ));
    }

    #[test]
    fn empty_indexes_are_rejected() {
        let (mut ctx, program) = compiled();
        // a single row has points but no cells
        let surface =
            Surface::new(0.3, 0.1, 0.1, PrimitiveKind::Lines, [1.0; 4]).unwrap();

        let err = surface.draw(&mut ctx, program).unwrap_err();
        assert!(matches!(err, RenderError::Draw(DrawError::EmptyIndexes)));
        assert!(ctx.draws().is_empty());
    }

    #[test]
    fn axes_are_colored_triangles() {
        let (mut ctx, program) = compiled();
        for kind in AxisKind::ALL {
            Axis::new(kind).draw(&mut ctx, program).unwrap();
        }

        let draws = ctx.draws();
        assert_eq!(draws.len(), 3);
        assert!(draws.iter().all(|d| d.primitive == PrimitiveKind::Triangles));
        assert!(draws.iter().all(|d| d.index_count == 42));
        assert_eq!(draws[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(draws[2].color, [0.0, 0.0, 1.0, 1.0]);
    }
}

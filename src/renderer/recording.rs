//! Headless [`GraphicsContext`] that keeps a log of every call.
//!
//! Bound state is tracked the same way a GL driver would, so each
//! `draw_elements` snapshots the geometry and uniforms it would have used.
//! The log only reaches back one frame: `begin_frame` drops older calls and
//! `end_frame` drops draws from earlier frames.

use glam::Mat4;

use crate::error::RenderError;
use crate::math::mesh::PrimitiveKind;
use crate::renderer::context::{
    GraphicsContext, IndexType, ProgramId, UNIFORM_VIEW, UniformLocation,
    builtin_attrib_location, builtin_uniform_location,
};

#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CompileProgram(ProgramId),
    UseProgram(ProgramId),
    SetViewport {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    BeginFrame {
        clear_color: [f32; 4],
    },
    EndFrame,
    AbortFrame,
    UploadVertices {
        attrib: u32,
        components: u32,
        len: usize,
    },
    UploadIndices {
        len: usize,
    },
    SetUniformMat4 {
        location: UniformLocation,
        matrix: Mat4,
    },
    SetUniformVec4 {
        location: UniformLocation,
        value: [f32; 4],
    },
    DrawElements {
        primitive: PrimitiveKind,
        count: u32,
        index_type: IndexType,
    },
}

/// Everything bound at the moment of one indexed draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub frame: usize,
    pub primitive: PrimitiveKind,
    pub index_count: u32,
    pub points: Vec<f32>,
    pub indexes: Vec<u16>,
    pub model: Mat4,
    pub view: Mat4,
    pub color: [f32; 4],
}

#[derive(Default)]
struct Bound {
    program: Option<ProgramId>,
    points: Vec<f32>,
    components: u32,
    indexes: Vec<u16>,
    model: Mat4,
    view: Mat4,
    color: [f32; 4],
}

pub struct RecordingContext {
    size: (u32, u32),
    programs: u32,
    in_frame: bool,
    frames: usize,
    bound: Bound,
    calls: Vec<GlCall>,
    draws: Vec<DrawRecord>,
}

impl RecordingContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            programs: 0,
            in_frame: false,
            frames: 0,
            bound: Bound::default(),
            calls: Vec::new(),
            draws: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[GlCall] {
        &self.calls
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    /// Draws issued during the most recently finished frame.
    pub fn last_frame(&self) -> &[DrawRecord] {
        let Some(last) = self.frames.checked_sub(1) else {
            return &[];
        };
        let start = self.draws.partition_point(|d| d.frame < last);
        let end = self.draws.partition_point(|d| d.frame <= last);
        &self.draws[start..end]
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    fn check_program(&self, program: ProgramId) -> bool {
        program.0 < self.programs
    }
}

impl GraphicsContext for RecordingContext {
    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, RenderError> {
        if vertex_source.trim().is_empty() || fragment_source.trim().is_empty() {
            return Err(RenderError::ShaderCompile("empty shader source".to_string()));
        }

        let program = ProgramId(self.programs);
        self.programs += 1;
        self.calls.push(GlCall::CompileProgram(program));
        Ok(program)
    }

    fn use_program(&mut self, program: ProgramId) {
        self.bound.program = Some(program);
        self.calls.push(GlCall::UseProgram(program));
    }

    fn drawable_size(&self) -> (u32, u32) {
        self.size
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.calls.push(GlCall::SetViewport {
            x,
            y,
            width,
            height,
        });
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<(), RenderError> {
        if self.in_frame {
            return Err(RenderError::backend("frame already in progress"));
        }
        self.in_frame = true;
        self.calls.clear();
        self.calls.push(GlCall::BeginFrame { clear_color });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        if !self.in_frame {
            return Err(RenderError::backend("no frame in progress"));
        }
        self.in_frame = false;
        let finished = self.frames;
        self.frames += 1;
        self.draws.retain(|d| d.frame == finished);
        self.calls.push(GlCall::EndFrame);
        Ok(())
    }

    fn abort_frame(&mut self) {
        if !self.in_frame {
            return;
        }
        self.in_frame = false;
        let current = self.frames;
        self.draws.retain(|d| d.frame != current);
        self.calls.push(GlCall::AbortFrame);
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.check_program(program)
            .then(|| builtin_attrib_location(name))
            .flatten()
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.check_program(program)
            .then(|| builtin_uniform_location(name))
            .flatten()
    }

    fn upload_vertices(
        &mut self,
        attrib: u32,
        components: u32,
        data: &[f32],
    ) -> Result<(), RenderError> {
        if components == 0 || data.len() % components as usize != 0 {
            return Err(RenderError::backend(format!(
                "{} floats do not split into {components}-component vertices",
                data.len()
            )));
        }

        self.bound.points = data.to_vec();
        self.bound.components = components;
        self.calls.push(GlCall::UploadVertices {
            attrib,
            components,
            len: data.len(),
        });
        Ok(())
    }

    fn upload_indices(&mut self, data: &[u16]) -> Result<(), RenderError> {
        self.bound.indexes = data.to_vec();
        self.calls.push(GlCall::UploadIndices { len: data.len() });
        Ok(())
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, matrix: &Mat4) {
        if builtin_uniform_location(UNIFORM_VIEW) == Some(location) {
            self.bound.view = *matrix;
        } else {
            self.bound.model = *matrix;
        }
        self.calls.push(GlCall::SetUniformMat4 {
            location,
            matrix: *matrix,
        });
    }

    fn set_uniform_vec4(&mut self, location: UniformLocation, value: [f32; 4]) {
        self.bound.color = value;
        self.calls.push(GlCall::SetUniformVec4 { location, value });
    }

    fn draw_elements(
        &mut self,
        primitive: PrimitiveKind,
        count: u32,
        index_type: IndexType,
    ) -> Result<(), RenderError> {
        if self.bound.program.is_none() {
            return Err(RenderError::backend("draw without a program in use"));
        }
        if count as usize > self.bound.indexes.len() {
            return Err(RenderError::backend(format!(
                "draw of {count} indexes with only {} bound",
                self.bound.indexes.len()
            )));
        }
        if count as usize % primitive.indices_per_primitive() != 0 {
            return Err(RenderError::backend(format!(
                "{count} indexes do not form whole {primitive:?}"
            )));
        }

        let point_count = self.bound.points.len() / self.bound.components.max(1) as usize;
        if let Some(bad) = self
            .bound
            .indexes
            .iter()
            .find(|&&i| i as usize >= point_count)
        {
            return Err(RenderError::backend(format!(
                "index {bad} out of range for {point_count} points"
            )));
        }

        self.calls.push(GlCall::DrawElements {
            primitive,
            count,
            index_type,
        });
        self.draws.push(DrawRecord {
            frame: self.frames,
            primitive,
            index_count: count,
            points: self.bound.points.clone(),
            indexes: self.bound.indexes.clone(),
            model: self.bound.model,
            view: self.bound.view,
            color: self.bound.color,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_must_be_balanced() {
        let mut ctx = RecordingContext::new(10, 10);
        assert!(ctx.end_frame().is_err());
        ctx.begin_frame([0.0; 4]).unwrap();
        assert!(ctx.begin_frame([0.0; 4]).is_err());
        ctx.end_frame().unwrap();
        assert_eq!(ctx.frame_count(), 1);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut ctx = RecordingContext::new(10, 10);
        let program = ctx.compile_program("vs", "fs").unwrap();
        ctx.use_program(program);
        ctx.upload_vertices(0, 4, &[0.0; 8]).unwrap();
        ctx.upload_indices(&[0, 1, 2]).unwrap();

        let err = ctx
            .draw_elements(PrimitiveKind::Triangles, 3, IndexType::U16)
            .unwrap_err();
        assert!(err.to_string().contains("index 2 out of range"));
        assert!(ctx.draws().is_empty());
    }

    #[test]
    fn locations_require_a_compiled_program() {
        let mut ctx = RecordingContext::new(10, 10);
        assert_eq!(ctx.attrib_location(ProgramId(0), "a_position"), None);

        let program = ctx.compile_program("vs", "fs").unwrap();
        assert_eq!(ctx.attrib_location(program, "a_position"), Some(0));
        assert!(ctx.uniform_location(program, "u_color").is_some());
        assert_eq!(ctx.uniform_location(program, "u_normal"), None);
    }

    #[test]
    fn empty_source_fails_to_compile() {
        let mut ctx = RecordingContext::new(10, 10);
        assert!(matches!(
            ctx.compile_program("", "fs"),
            Err(RenderError::ShaderCompile(_))
        ));
    }

    fn draw_one(ctx: &mut RecordingContext) {
        ctx.upload_vertices(0, 4, &[0.0; 8]).unwrap();
        ctx.upload_indices(&[0, 1]).unwrap();
        ctx.draw_elements(PrimitiveKind::Lines, 2, IndexType::U16).unwrap();
    }

    #[test]
    fn aborted_frame_is_discarded() {
        let mut ctx = RecordingContext::new(10, 10);
        let program = ctx.compile_program("vs", "fs").unwrap();
        ctx.use_program(program);

        ctx.begin_frame([0.0; 4]).unwrap();
        draw_one(&mut ctx);
        ctx.end_frame().unwrap();

        ctx.begin_frame([0.0; 4]).unwrap();
        draw_one(&mut ctx);
        ctx.abort_frame();

        assert_eq!(ctx.frame_count(), 1);
        assert_eq!(ctx.last_frame().len(), 1);
        assert_eq!(ctx.calls().last(), Some(&GlCall::AbortFrame));

        // a new frame can start right away
        ctx.begin_frame([0.0; 4]).unwrap();
        ctx.end_frame().unwrap();
        assert_eq!(ctx.frame_count(), 2);
    }

    #[test]
    fn log_only_keeps_the_previous_frame() {
        let mut ctx = RecordingContext::new(10, 10);
        let program = ctx.compile_program("vs", "fs").unwrap();
        ctx.use_program(program);

        for _ in 0..500 {
            ctx.begin_frame([0.0; 4]).unwrap();
            draw_one(&mut ctx);
            draw_one(&mut ctx);
            ctx.end_frame().unwrap();
        }

        assert_eq!(ctx.frame_count(), 500);
        assert_eq!(ctx.draws().len(), 2);
        assert_eq!(ctx.last_frame().len(), 2);
        assert!(ctx.calls().len() <= 8, "{} calls kept", ctx.calls().len());
        assert_eq!(
            ctx.calls().first(),
            Some(&GlCall::BeginFrame {
                clear_color: [0.0; 4]
            })
        );
    }
}

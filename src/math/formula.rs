use crate::error::{EvalError, FormulaError};
use crate::math::codegen::codegen;
use crate::math::interpreter::interpret;
use crate::math::lexer::scan;
use crate::math::parser::{AstNode, parse};
use crate::math::mesh::POINT_STRIDE;

/// A formula scanned and parsed once, ready to be evaluated at many points.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    ast: AstNode,
}

impl Formula {
    /// Compiles formula text. Blank text plots the flat surface `0`.
    pub fn compile(source: &str) -> Result<Self, FormulaError> {
        let text = if source.chars().all(|c| c == ' ') {
            "0"
        } else {
            source
        };

        let tokens = scan(text)?;
        let ast = parse(&tokens)?;

        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &AstNode {
        &self.ast
    }

    pub fn eval(&self, x: f64, y: f64) -> Result<f64, EvalError> {
        interpret(&self.ast, x, y)
    }

    pub fn to_glsl(&self) -> Result<String, EvalError> {
        codegen(&self.ast)
    }

    /// Rewrites the `z` coordinate of every `[x, y, z, w]` point.
    ///
    /// Each point is mapped into formula space as `scale * p + offset` and its
    /// height becomes `f(...) / scale`. Heights are only written back once
    /// every point evaluated, so a failure leaves the buffer untouched.
    pub fn sample_heights(
        &self,
        points: &mut [f32],
        scale: f64,
        x_offset: f64,
        y_offset: f64,
    ) -> Result<(), EvalError> {
        let heights = points
            .chunks_exact(POINT_STRIDE)
            .map(|point| {
                let x = scale * point[0] as f64 + x_offset;
                let y = scale * point[1] as f64 + y_offset;
                self.eval(x, y).map(|z| ((1.0 / scale) * z) as f32)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (point, height) in points.chunks_exact_mut(POINT_STRIDE).zip(heights) {
            point[2] = height;
        }

        Ok(())
    }
}

/// Domain scale for a zoom level: 20 at zoom 0, shrinking linearly toward
/// 100 and clamped at 0.01.
pub fn zoom_scale(zoom: f64) -> f64 {
    (20.0 * (1.0 - zoom / 100.0)).max(0.01)
}

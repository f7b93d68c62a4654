pub mod builtins;
pub mod codegen;
pub mod examples;
pub mod formula;
pub mod interpreter;
pub mod lexer;
pub mod matrix;
pub mod mesh;
pub mod parser;

pub use examples::FORMULA_EXAMPLES;
pub use formula::{Formula, zoom_scale};
pub use mesh::{AxisKind, MeshBuffers, PrimitiveKind};

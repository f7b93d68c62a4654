//! GLSL emission for evaluating a formula in a vertex shader instead of on
//! the CPU. The emitted shader displaces `a_position.z` by the formula and
//! then applies `u_view`.

use crate::error::EvalError;
use crate::math::builtins::Builtin;
use crate::math::interpreter::check_assign_target;
use crate::math::parser::{AstNode, BinaryOpKind};

const VERTEX_PROLOGUE: &str = "attribute vec4 a_position;
uniform mat4 u_view;
void main() {
    vec4 result = a_position;

    // [START CODEGEN]

    ";

const VERTEX_EPILOGUE: &str = "

    // [END CODEGEN]
    gl_Position = u_view*result;
}";

pub fn codegen(node: &AstNode) -> Result<String, EvalError> {
    Ok(format!(
        "{VERTEX_PROLOGUE}result.z = {};{VERTEX_EPILOGUE}",
        emit(node)?
    ))
}

fn emit(node: &AstNode) -> Result<String, EvalError> {
    Ok(match node {
        // Debug formatting always keeps a decimal point or exponent, which
        // GLSL needs to read the literal as a float.
        AstNode::Number(value) => format!("{value:?}"),
        AstNode::Identifier(name) => match name.as_str() {
            "x" => "a_position.x".to_string(),
            "y" => "a_position.y".to_string(),
            _ => return Err(EvalError::UnknownIdentifier(name.clone())),
        },
        AstNode::Call { name, args } => {
            let builtin =
                Builtin::lookup(name).ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
            builtin.check_arity(args.len())?;
            let args = args.iter().map(emit).collect::<Result<Vec<_>, _>>()?;
            format!("{}({})", builtin.glsl_name(), args.join(", "))
        }
        AstNode::BinaryOp { op, left, right } => {
            let l = emit(left)?;
            let r = emit(right)?;
            match op {
                BinaryOpKind::Add => format!("({l} + {r})"),
                BinaryOpKind::Sub => format!("({l} - {r})"),
                BinaryOpKind::Mul => format!("({l} * {r})"),
                BinaryOpKind::Div => format!("({l} / {r})"),
                BinaryOpKind::Pow => format!("pow({l}, {r})"),
            }
        }
        AstNode::Assign { target, value } => {
            check_assign_target(target)?;
            emit(value)?
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::lexer::scan;
    use crate::math::parser::parse;

    fn body(input: &str) -> Result<String, EvalError> {
        let ast = parse(&scan(input).unwrap()).unwrap();
        let shader = codegen(&ast)?;
        let start = shader.find("result.z = ").unwrap() + "result.z = ".len();
        let end = shader[start..].find(';').unwrap() + start;
        Ok(shader[start..end].to_string())
    }

    #[test]
    fn wraps_expression_in_shader_template() {
        let ast = parse(&scan("x").unwrap()).unwrap();
        let shader = codegen(&ast).unwrap();
        assert!(shader.starts_with("attribute vec4 a_position;"));
        assert!(shader.contains("result.z = a_position.x;"));
        assert!(shader.ends_with("gl_Position = u_view*result;\n}"));
    }

    #[test]
    fn integer_literals_gain_decimal_point() {
        assert_eq!(body("2").unwrap(), "2.0");
        assert_eq!(body("2.5").unwrap(), "2.5");
    }

    #[test]
    fn grouping_survives_emission() {
        assert_eq!(
            body("(1 + x) * y").unwrap(),
            "((1.0 + a_position.x) * a_position.y)"
        );
    }

    #[test]
    fn power_and_calls() {
        assert_eq!(body("x^2").unwrap(), "pow(a_position.x, 2.0)");
        assert_eq!(
            body("atan2(y x)").unwrap(),
            "atan(a_position.y, a_position.x)"
        );
        assert_eq!(body("sin(x)").unwrap(), "sin(a_position.x)");
    }

    #[test]
    fn z_assignment_emits_right_hand_side() {
        assert_eq!(body("z = y").unwrap(), "a_position.y");
    }

    #[test]
    fn unknown_names_fail() {
        assert_eq!(
            body("t"),
            Err(EvalError::UnknownIdentifier("t".to_string()))
        );
        assert_eq!(
            body("floor(x)"),
            Err(EvalError::UnknownFunction("floor".to_string()))
        );
        assert!(matches!(body("q = 1"), Err(EvalError::InvalidAssignTarget(_))));
    }
}

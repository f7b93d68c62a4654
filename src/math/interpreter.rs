use crate::error::EvalError;
use crate::math::builtins::Builtin;
use crate::math::parser::{AstNode, BinaryOpKind};

/// Evaluates a syntax tree at the point `(x, y)`.
///
/// Arithmetic follows IEEE-754 doubles, so dividing by zero gives an
/// infinity or NaN rather than an error. The only variables are `x` and `y`,
/// and the only assignment target is `z`.
pub fn interpret(node: &AstNode, x: f64, y: f64) -> Result<f64, EvalError> {
    match node {
        AstNode::Number(value) => Ok(*value),
        AstNode::Identifier(name) => match name.as_str() {
            "x" => Ok(x),
            "y" => Ok(y),
            _ => Err(EvalError::UnknownIdentifier(name.clone())),
        },
        AstNode::Call { name, args } => {
            let values = args
                .iter()
                .map(|arg| interpret(arg, x, y))
                .collect::<Result<Vec<_>, _>>()?;
            let builtin =
                Builtin::lookup(name).ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
            builtin.apply(&values)
        }
        AstNode::BinaryOp { op, left, right } => {
            let l = interpret(left, x, y)?;
            let r = interpret(right, x, y)?;
            Ok(match op {
                BinaryOpKind::Add => l + r,
                BinaryOpKind::Sub => l - r,
                BinaryOpKind::Mul => l * r,
                BinaryOpKind::Div => l / r,
                BinaryOpKind::Pow => l.powf(r),
            })
        }
        AstNode::Assign { target, value } => {
            check_assign_target(target)?;
            interpret(value, x, y)
        }
    }
}

pub(crate) fn check_assign_target(target: &AstNode) -> Result<(), EvalError> {
    match target {
        AstNode::Identifier(name) if name == "z" => Ok(()),
        AstNode::Identifier(name) => Err(EvalError::InvalidAssignTarget(format!("'{name}'"))),
        _ => Err(EvalError::InvalidAssignTarget("an expression".to_string())),
    }
}

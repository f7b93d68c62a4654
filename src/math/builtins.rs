use crate::error::EvalError;

/// The fixed set of math functions a formula may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Pow,
    Exp,
    Log,
    Sqrt,
    Abs,
}

impl Builtin {
    pub const ALL: [Builtin; 12] = [
        Builtin::Sin,
        Builtin::Cos,
        Builtin::Tan,
        Builtin::Asin,
        Builtin::Acos,
        Builtin::Atan,
        Builtin::Atan2,
        Builtin::Pow,
        Builtin::Exp,
        Builtin::Log,
        Builtin::Sqrt,
        Builtin::Abs,
    ];

    pub fn lookup(name: &str) -> Option<Builtin> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Tan => "tan",
            Builtin::Asin => "asin",
            Builtin::Acos => "acos",
            Builtin::Atan => "atan",
            Builtin::Atan2 => "atan2",
            Builtin::Pow => "pow",
            Builtin::Exp => "exp",
            Builtin::Log => "log",
            Builtin::Sqrt => "sqrt",
            Builtin::Abs => "abs",
        }
    }

    /// Name of the equivalent GLSL function. GLSL spells two-argument
    /// arctangent as an `atan` overload.
    pub fn glsl_name(self) -> &'static str {
        match self {
            Builtin::Atan2 => "atan",
            other => other.name(),
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::Atan2 | Builtin::Pow => 2,
            _ => 1,
        }
    }

    pub fn check_arity(self, found: usize) -> Result<(), EvalError> {
        if found != self.arity() {
            return Err(EvalError::Arity {
                name: self.name().to_string(),
                expected: self.arity(),
                found,
            });
        }
        Ok(())
    }

    pub fn apply(self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args.len())?;

        let a = args[0];
        Ok(match self {
            Builtin::Sin => a.sin(),
            Builtin::Cos => a.cos(),
            Builtin::Tan => a.tan(),
            Builtin::Asin => a.asin(),
            Builtin::Acos => a.acos(),
            Builtin::Atan => a.atan(),
            Builtin::Atan2 => a.atan2(args[1]),
            Builtin::Pow => a.powf(args[1]),
            Builtin::Exp => a.exp(),
            Builtin::Log => a.ln(),
            Builtin::Sqrt => a.sqrt(),
            Builtin::Abs => a.abs(),
        })
    }
}

//! Error types shared by the formula compiler, the mesh generator and the
//! render controller.

use thiserror::Error;

use crate::math::lexer::Token;

/// Failures while turning formula text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("invalid character '{character}' at offset {position}")]
    InvalidCharacter { character: char, position: usize },

    #[error("invalid number '{text}' at offset {position}")]
    InvalidNumber { text: String, position: usize },
}

/// Failures while building the syntax tree from tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected token {found} at position {position}")]
    UnexpectedToken { found: Token, position: usize },

    #[error("expecting ) at position {position}, found {found}")]
    ExpectingCloseParen { found: Token, position: usize },

    #[error("expecting number or identifier at position {position}, found {found}")]
    ExpectingPrimary { found: Token, position: usize },

    #[error("invalid numeric literal '{0}'")]
    InvalidLiteral(String),

    #[error("formula nests deeper than {max} levels")]
    TooDeep { max: usize },
}

/// Failures while evaluating (or emitting shader code for) a syntax tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("must assign to z, found {0}")]
    InvalidAssignTarget(String),
}

/// Any failure on the way from formula text to a height value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("eval error: {0}")]
    Eval(#[from] EvalError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("invalid grid: {message}")]
    InvalidGrid { message: String },

    #[error("too many vertices: {count} (max: {max})")]
    TooManyVertices { count: usize, max: usize },
}

impl MeshError {
    pub fn invalid_grid(message: impl Into<String>) -> Self {
        Self::InvalidGrid {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("no points to draw")]
    EmptyPoints,

    #[error("no indexes to draw")]
    EmptyIndexes,

    #[error("program has no location named '{0}'")]
    MissingLocation(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("controller not initialized")]
    NotInitialized,
}

/// Errors surfaced by `Controller` operations and graphics backends.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Draw(#[from] DrawError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),

    #[error("graphics backend error: {0}")]
    Backend(String),
}

impl RenderError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

use std::fmt;

use logos::{Lexer, Logos};

use crate::error::LexError;

/// Error type of the derived lexer, before [`scan`] attaches a position.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawError {
    #[default]
    Unrecognized,
    MalformedNumber(String),
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip " ")]
#[logos(error = RawError)]
pub enum Token {
    #[regex("[0-9][0-9.]*", number)]
    Number(String),
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Multiply,
    #[token("/")]
    Divide,
    #[token("**")]
    #[token("^")]
    Power,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex("[A-Za-z]+", |lex| lex.slice().to_string())]
    Identifier(String),
    #[token("=")]
    Equal,
    EndOfInput,
}

/// Accepts digits with at most one `.`; the error text runs up to the
/// offending second dot.
fn number(lex: &mut Lexer<Token>) -> Result<String, RawError> {
    let text = lex.slice();
    match text.match_indices('.').nth(1) {
        Some((second, _)) => Err(RawError::MalformedNumber(text[..=second].to_string())),
        None => Ok(text.to_string()),
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(text) => write!(f, "number '{text}'"),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Multiply => f.write_str("'*'"),
            Token::Divide => f.write_str("'/'"),
            Token::Power => f.write_str("'^'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Identifier(name) => write!(f, "identifier '{name}'"),
            Token::Equal => f.write_str("'='"),
            Token::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// Splits formula text into tokens in a single left-to-right pass.
///
/// Only the space character is skipped. Letters (ASCII) form identifiers,
/// a leading digit starts a number that may hold one `.`, and both `**` and
/// `^` mean exponentiation. The returned sequence always ends with
/// [`Token::EndOfInput`].
pub fn scan(input: &str) -> Result<Vec<Token>, LexError> {
    let mut lex = Token::lexer(input);
    let mut tokens = Vec::new();

    while let Some(result) = lex.next() {
        let position = lex.span().start;
        match result {
            Ok(token) => tokens.push(token),
            Err(RawError::MalformedNumber(text)) => {
                return Err(LexError::InvalidNumber { text, position });
            }
            Err(RawError::Unrecognized) => {
                let character = input[position..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(LexError::InvalidCharacter {
                    character,
                    position,
                });
            }
        }
    }

    tokens.push(Token::EndOfInput);
    Ok(tokens)
}

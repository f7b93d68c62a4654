use crate::error::ParseError;
use crate::math::lexer::Token;

static END_OF_INPUT: Token = Token::EndOfInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Number(f64),
    Identifier(String),
    Call {
        name: String,
        args: Vec<AstNode>,
    },
    BinaryOp {
        op: BinaryOpKind,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    Assign {
        target: Box<AstNode>,
        value: Box<AstNode>,
    },
}

impl AstNode {
    fn binary(op: BinaryOpKind, left: AstNode, right: AstNode) -> Self {
        AstNode::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Deepest syntax tree `parse` accepts, counting both nested groups and
/// chains of binary operators.
pub const MAX_DEPTH: usize = 256;

/// Builds a syntax tree from a token sequence produced by [`scan`].
///
/// Precedence from loosest to tightest: `=`, `+ -`, `* /`, `^`. Every binary
/// level folds to the left, `^` included, so `2^3^2` is `(2^3)^2`. Trees
/// deeper than [`MAX_DEPTH`] are rejected with [`ParseError::TooDeep`].
///
/// [`scan`]: crate::math::lexer::scan
pub fn parse(tokens: &[Token]) -> Result<AstNode, ParseError> {
    Parser {
        tokens,
        pos: 0,
        nesting: 0,
    }
    .program()
}

/// A subtree paired with its height.
type Parsed = (AstNode, usize);

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    nesting: usize,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&END_OF_INPUT)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn check_depth(depth: usize) -> Result<usize, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::TooDeep { max: MAX_DEPTH });
        }
        Ok(depth)
    }

    fn fold(op: BinaryOpKind, left: Parsed, right: Parsed) -> Result<Parsed, ParseError> {
        let height = Self::check_depth(left.1.max(right.1) + 1)?;
        Ok((AstNode::binary(op, left.0, right.0), height))
    }

    fn program(&mut self) -> Result<AstNode, ParseError> {
        let (node, _) = self.statement()?;

        if *self.peek() != Token::EndOfInput {
            return Err(ParseError::UnexpectedToken {
                found: self.peek().clone(),
                position: self.pos,
            });
        }

        Ok(node)
    }

    fn statement(&mut self) -> Result<Parsed, ParseError> {
        let (target, target_height) = self.expression()?;

        if *self.peek() == Token::Equal {
            self.advance();
            let (value, value_height) = self.expression()?;
            let height = Self::check_depth(target_height.max(value_height) + 1)?;
            let node = AstNode::Assign {
                target: Box::new(target),
                value: Box::new(value),
            };
            return Ok((node, height));
        }

        Ok((target, target_height))
    }

    fn expression(&mut self) -> Result<Parsed, ParseError> {
        let mut node = self.term()?;

        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOpKind::Add,
                Token::Minus => BinaryOpKind::Sub,
                _ => return Ok(node),
            };
            self.advance();
            node = Self::fold(op, node, self.term()?)?;
        }
    }

    fn term(&mut self) -> Result<Parsed, ParseError> {
        let mut node = self.factor()?;

        loop {
            let op = match self.peek() {
                Token::Multiply => BinaryOpKind::Mul,
                Token::Divide => BinaryOpKind::Div,
                _ => return Ok(node),
            };
            self.advance();
            node = Self::fold(op, node, self.factor()?)?;
        }
    }

    fn factor(&mut self) -> Result<Parsed, ParseError> {
        let mut node = self.primary()?;

        while *self.peek() == Token::Power {
            self.advance();
            node = Self::fold(BinaryOpKind::Pow, node, self.primary()?)?;
        }

        Ok(node)
    }

    fn primary(&mut self) -> Result<Parsed, ParseError> {
        match self.peek().clone() {
            Token::Number(text) => {
                self.advance();
                text.parse::<f64>()
                    .map(|value| (AstNode::Number(value), 1))
                    .map_err(|_| ParseError::InvalidLiteral(text))
            }
            Token::Identifier(name) => {
                self.advance();
                if *self.peek() != Token::LParen {
                    return Ok((AstNode::Identifier(name), 1));
                }
                self.advance();
                self.nested(|parser| {
                    let (args, height) = parser.arguments()?;
                    Ok((AstNode::Call { name, args }, Self::check_depth(height + 1)?))
                })
            }
            Token::LParen => {
                self.advance();
                self.nested(|parser| {
                    let node = parser.expression()?;
                    parser.expect_close_paren()?;
                    Ok(node)
                })
            }
            found => Err(ParseError::ExpectingPrimary {
                found,
                position: self.pos,
            }),
        }
    }

    /// Runs `inner` one group level down, refusing to descend past the limit
    /// before any subtree exists.
    fn nested(
        &mut self,
        inner: impl FnOnce(&mut Self) -> Result<Parsed, ParseError>,
    ) -> Result<Parsed, ParseError> {
        self.nesting = Self::check_depth(self.nesting + 1)?;
        let result = inner(self);
        self.nesting -= 1;
        result
    }

    // Arguments follow one another up to the closing paren; the token set has
    // no separator, so `pow(x 2)` is a two-argument call.
    fn arguments(&mut self) -> Result<(Vec<AstNode>, usize), ParseError> {
        let mut args = Vec::new();
        let mut height = 0;

        loop {
            match self.peek() {
                Token::RParen => {
                    self.advance();
                    return Ok((args, height));
                }
                Token::EndOfInput => return self.expect_close_paren().map(|_| (args, height)),
                _ => {
                    let (arg, arg_height) = self.expression()?;
                    height = height.max(arg_height);
                    args.push(arg);
                }
            }
        }
    }

    fn expect_close_paren(&mut self) -> Result<(), ParseError> {
        if *self.peek() != Token::RParen {
            return Err(ParseError::ExpectingCloseParen {
                found: self.peek().clone(),
                position: self.pos,
            });
        }
        self.advance();
        Ok(())
    }
}

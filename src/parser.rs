use std::mem;

use thiserror::Error;

use crate::{
    ast::{Comparator, Expr, Spanned, Token},
    lexer::{LexError, Lexer, Position},
    value::Value,
};

/// Deepest syntax tree the parser builds, counting both nested
/// sub-expressions and chained operators such as `a.b.c` or `a | b | c`
pub const MAX_DEPTH: usize = 128;

/// Tokens binding at least this tightly continue a projection; anything
/// looser (pipe, logic, comparators, flatten, terminators) ends it.
const PROJECTION_STOP: u8 = 10;

const BP_PIPE: u8 = 1;
const BP_OR: u8 = 2;
const BP_AND: u8 = 3;
const BP_COMPARATOR: u8 = 5;
const BP_FLATTEN: u8 = 9;
const BP_STAR: u8 = 20;
const BP_FILTER: u8 = 21;
const BP_DOT: u8 = 40;
const BP_NOT: u8 = 45;
const BP_LBRACE: u8 = 50;
const BP_LBRACKET: u8 = 55;
const BP_LPAREN: u8 = 60;

/// Infix binding power of a token (0 for tokens that never continue an
/// expression).
fn binding_power(token: &Token) -> u8 {
    match token {
        Token::Pipe => BP_PIPE,
        Token::Or => BP_OR,
        Token::And => BP_AND,
        Token::Lt | Token::LtEq | Token::EqEq | Token::NotEq | Token::GtEq | Token::Gt => {
            BP_COMPARATOR
        }
        Token::Flatten => BP_FLATTEN,
        Token::Star => BP_STAR,
        Token::Filter => BP_FILTER,
        Token::Dot => BP_DOT,
        Token::Not => BP_NOT,
        Token::LBrace => BP_LBRACE,
        Token::LBracket => BP_LBRACKET,
        Token::LParen => BP_LPAREN,
        _ => 0,
    }
}

/// Errors raised while turning tokens into an AST.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Unexpected {found} at position {position}, expected {expected}")]
    UnexpectedToken {
        found: Token,
        expected: &'static str,
        position: Position,
    },

    #[error("Unexpected end of expression at position {position}, expected {expected}")]
    UnexpectedEof {
        expected: &'static str,
        position: Position,
    },

    #[error("Invalid syntax at position {position}: {message}")]
    InvalidSyntax { message: String, position: Position },

    #[error("Expression nested deeper than {limit} levels at position {position}")]
    TooDeep { limit: usize, position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex(e) => e.position(),
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEof { position, .. }
            | ParseError::InvalidSyntax { position, .. }
            | ParseError::TooDeep { position, .. } => *position,
        }
    }

    fn unexpected(spanned: Spanned, expected: &'static str) -> Self {
        match spanned.token {
            Token::Eof => ParseError::UnexpectedEof {
                expected,
                position: spanned.position,
            },
            found => ParseError::UnexpectedToken {
                found,
                expected,
                position: spanned.position,
            },
        }
    }
}

fn bounded(expr: Expr, position: Position) -> Result<Expr, ParseError> {
    if expr.deeper_than(MAX_DEPTH) {
        return Err(ParseError::TooDeep {
            limit: MAX_DEPTH,
            position,
        });
    }
    Ok(expr)
}

/// Pratt parser over a fully lexed token stream.
///
/// Every token kind has an optional prefix rule ([`Parser::nud`]) and an
/// optional infix rule ([`Parser::led`]) with the binding power given by
/// [`binding_power`].
pub struct Parser {
    tokens: Vec<Spanned>,
    index: usize,
    depth: usize,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Result<Self, ParseError> {
        Ok(Parser {
            tokens: lexer.tokenize()?,
            index: 0,
            depth: 0,
        })
    }

    /// Token at `offset` past the current one; the trailing `Eof` repeats
    fn peek(&self, offset: usize) -> &Spanned {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.index + offset).min(last)]
    }

    fn current(&self) -> &Token {
        &self.peek(0).token
    }

    fn position(&self) -> Position {
        self.peek(0).position
    }

    fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    /// Takes ownership of the current token and moves past it.
    fn take(&mut self) -> Spanned {
        let position = self.position();
        let token = match self.tokens.get_mut(self.index) {
            Some(spanned) => mem::replace(&mut spanned.token, Token::Eof),
            None => Token::Eof,
        };
        self.advance();
        Spanned { token, position }
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(self.current()) == mem::discriminant(token)
    }

    fn expect(&mut self, expected: Token, description: &'static str) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(ParseError::unexpected(self.peek(0).clone(), description));
        }
        self.advance();
        Ok(())
    }

    /// Parses the whole token stream into a single expression.
    ///
    /// An empty expression parses to [`Expr::Identity`].
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::Eof) {
            return Ok(Expr::Identity);
        }
        let expr = self.parse_expression(0)?;
        self.expect(Token::Eof, "end of expression")?;
        Ok(expr)
    }

    pub fn parse_expression(&mut self, binding: u8) -> Result<Expr, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep {
                limit: MAX_DEPTH,
                position: self.position(),
            });
        }
        self.depth += 1;
        let result = self.parse_expression_inner(binding);
        self.depth -= 1;
        result
    }

    fn parse_expression_inner(&mut self, binding: u8) -> Result<Expr, ParseError> {
        let token = self.take();
        let position = token.position;
        let mut left = bounded(self.nud(token)?, position)?;

        // Infix rules grow the tree leftwards without recursing, so each
        // node is measured as it is built.
        while binding < binding_power(self.current()) {
            let token = self.take();
            let position = token.position;
            left = bounded(self.led(token, left)?, position)?;
        }
        Ok(left)
    }

    /// Prefix rules: a token seen where no left expression exists yet
    fn nud(&mut self, spanned: Spanned) -> Result<Expr, ParseError> {
        let position = spanned.position;
        match spanned.token {
            Token::Literal(value) => Ok(Expr::Literal(value)),
            Token::RawString(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Identifier(name) => Ok(Expr::Field(name)),
            Token::QuotedIdentifier(name) => {
                if self.check(&Token::LParen) {
                    return Err(ParseError::InvalidSyntax {
                        message: format!("quoted identifier \"{}\" cannot name a function", name),
                        position,
                    });
                }
                Ok(Expr::Field(name))
            }
            Token::FunctionName(name) => self.parse_function(name),
            Token::At => Ok(Expr::CurrentNode),
            Token::Star => {
                let projection = self.parse_projection_rhs(BP_STAR)?;
                Ok(Expr::WildcardValues {
                    child: Box::new(Expr::Identity),
                    projection: Box::new(projection),
                })
            }
            Token::Flatten => {
                let projection = self.parse_projection_rhs(BP_FLATTEN)?;
                Ok(Expr::Flatten {
                    child: Box::new(Expr::Identity),
                    projection: Box::new(projection),
                })
            }
            Token::Filter => self.parse_filter(Expr::Identity),
            Token::LBracket => match self.current() {
                Token::Number(_) | Token::Colon => {
                    let right = self.parse_index_expression()?;
                    self.project_if_slice(Expr::Identity, right)
                }
                Token::Star if self.peek(1).token == Token::RBracket => {
                    self.advance();
                    self.advance();
                    let projection = self.parse_projection_rhs(BP_STAR)?;
                    Ok(Expr::WildcardIndex {
                        child: Box::new(Expr::Identity),
                        projection: Box::new(projection),
                    })
                }
                _ => self.parse_multi_select_list(),
            },
            Token::LBrace => self.parse_multi_select_hash(),
            Token::LParen => {
                let expr = self.parse_expression(0)?;
                self.expect(Token::RParen, "')'")?;
                Ok(expr)
            }
            Token::Not => {
                let operand = self.parse_expression(BP_NOT)?;
                Ok(Expr::Not(Box::new(operand)))
            }
            Token::Ampersand => {
                let expr = self.parse_expression(0)?;
                Ok(Expr::ExpressionRef(Box::new(expr)))
            }
            token => Err(ParseError::unexpected(
                Spanned { token, position },
                "an expression",
            )),
        }
    }

    /// Infix rules: a token continuing an already parsed `left`
    fn led(&mut self, spanned: Spanned, left: Expr) -> Result<Expr, ParseError> {
        let left = Box::new(left);
        match spanned.token {
            Token::Dot => {
                if self.check(&Token::Star) {
                    self.advance();
                    let projection = self.parse_projection_rhs(BP_DOT)?;
                    Ok(Expr::WildcardValues {
                        child: left,
                        projection: Box::new(projection),
                    })
                } else {
                    let right = self.parse_dot_rhs(BP_DOT)?;
                    Ok(Expr::SubExpression {
                        left,
                        right: Box::new(right),
                    })
                }
            }
            Token::Pipe => {
                let right = self.parse_expression(BP_PIPE)?;
                Ok(Expr::Pipe {
                    left,
                    right: Box::new(right),
                })
            }
            Token::Or => {
                let right = self.parse_expression(BP_OR)?;
                Ok(Expr::Or {
                    left,
                    right: Box::new(right),
                })
            }
            Token::And => {
                let right = self.parse_expression(BP_AND)?;
                Ok(Expr::And {
                    left,
                    right: Box::new(right),
                })
            }
            Token::Lt => self.parse_comparator(Comparator::LessThan, left),
            Token::LtEq => self.parse_comparator(Comparator::LessEqual, left),
            Token::EqEq => self.parse_comparator(Comparator::Equal, left),
            Token::NotEq => self.parse_comparator(Comparator::NotEqual, left),
            Token::GtEq => self.parse_comparator(Comparator::GreaterEqual, left),
            Token::Gt => self.parse_comparator(Comparator::GreaterThan, left),
            Token::Flatten => {
                let projection = self.parse_projection_rhs(BP_FLATTEN)?;
                Ok(Expr::Flatten {
                    child: left,
                    projection: Box::new(projection),
                })
            }
            Token::Filter => self.parse_filter(*left),
            Token::LBracket => match self.current() {
                Token::Number(_) | Token::Colon => {
                    let right = self.parse_index_expression()?;
                    self.project_if_slice(*left, right)
                }
                _ => {
                    self.expect(Token::Star, "number, ':' or '*'")?;
                    self.expect(Token::RBracket, "']'")?;
                    let projection = self.parse_projection_rhs(BP_STAR)?;
                    Ok(Expr::WildcardIndex {
                        child: left,
                        projection: Box::new(projection),
                    })
                }
            },
            token => Err(ParseError::unexpected(
                Spanned {
                    token,
                    position: spanned.position,
                },
                "an operator",
            )),
        }
    }

    fn parse_comparator(&mut self, op: Comparator, left: Box<Expr>) -> Result<Expr, ParseError> {
        let right = self.parse_expression(BP_COMPARATOR)?;
        Ok(Expr::Comparator {
            op,
            left,
            right: Box::new(right),
        })
    }

    /// Right-hand side of a projection: everything that binds tighter than
    /// [`PROJECTION_STOP`] is applied per element.
    fn parse_projection_rhs(&mut self, binding: u8) -> Result<Expr, ParseError> {
        match self.current() {
            token if binding_power(token) < PROJECTION_STOP => Ok(Expr::Identity),
            Token::LBracket | Token::Filter => self.parse_expression(binding),
            Token::Dot => {
                self.advance();
                self.parse_dot_rhs(binding)
            }
            _ => Err(ParseError::unexpected(
                self.peek(0).clone(),
                "'.', '[' or '[?' after a projection",
            )),
        }
    }

    fn parse_dot_rhs(&mut self, binding: u8) -> Result<Expr, ParseError> {
        match self.current() {
            Token::Identifier(_)
            | Token::QuotedIdentifier(_)
            | Token::FunctionName(_)
            | Token::Star => self.parse_expression(binding),
            Token::LBracket => {
                self.advance();
                self.parse_multi_select_list()
            }
            Token::LBrace => {
                self.advance();
                self.parse_multi_select_hash()
            }
            _ => Err(ParseError::unexpected(
                self.peek(0).clone(),
                "identifier, '*', '[' or '{' after '.'",
            )),
        }
    }

    /// `[?predicate]` applied to `left`; the opening `[?` is consumed.
    fn parse_filter(&mut self, left: Expr) -> Result<Expr, ParseError> {
        let predicate = self.parse_expression(0)?;
        self.expect(Token::RBracket, "']'")?;
        let projection = self.parse_projection_rhs(BP_FILTER)?;
        Ok(Expr::FilterProjection {
            child: Box::new(left),
            predicate: Box::new(predicate),
            projection: Box::new(projection),
        })
    }

    /// Index or slice after `[`, up to and including the closing `]`.
    fn parse_index_expression(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::Colon) || self.peek(1).token == Token::Colon {
            return self.parse_slice();
        }
        match self.take() {
            Spanned {
                token: Token::Number(n),
                ..
            } => {
                self.expect(Token::RBracket, "']'")?;
                Ok(Expr::Index(n))
            }
            other => Err(ParseError::unexpected(other, "number")),
        }
    }

    fn parse_slice(&mut self) -> Result<Expr, ParseError> {
        let mut parts: [Option<i64>; 3] = [None; 3];
        let mut index = 0;

        loop {
            match self.current() {
                Token::RBracket => break,
                Token::Colon => {
                    index += 1;
                    if index == parts.len() {
                        return Err(ParseError::InvalidSyntax {
                            message: "too many colons in slice".to_string(),
                            position: self.position(),
                        });
                    }
                    self.advance();
                }
                Token::Number(n) if parts[index].is_none() => {
                    parts[index] = Some(*n);
                    self.advance();
                }
                _ => {
                    return Err(ParseError::unexpected(
                        self.peek(0).clone(),
                        "number, ':' or ']'",
                    ));
                }
            }
        }

        let position = self.position();
        self.expect(Token::RBracket, "']'")?;

        let [start, stop, step] = parts;
        if step == Some(0) {
            return Err(ParseError::InvalidSyntax {
                message: "slice step cannot be 0".to_string(),
                position,
            });
        }
        Ok(Expr::Slice { start, stop, step })
    }

    /// Attaches an index or slice to `left`; slices start a projection.
    fn project_if_slice(&mut self, left: Expr, right: Expr) -> Result<Expr, ParseError> {
        let is_slice = matches!(right, Expr::Slice { .. });
        let indexed = match left {
            Expr::Identity => right,
            left => Expr::IndexExpression {
                left: Box::new(left),
                right: Box::new(right),
            },
        };

        if is_slice {
            let projection = self.parse_projection_rhs(BP_STAR)?;
            Ok(Expr::WildcardIndex {
                child: Box::new(indexed),
                projection: Box::new(projection),
            })
        } else {
            Ok(indexed)
        }
    }

    /// `[a, b, ...]`; the opening bracket is consumed.
    fn parse_multi_select_list(&mut self) -> Result<Expr, ParseError> {
        let mut elements = vec![];

        loop {
            elements.push(self.parse_expression(0)?);
            match self.current() {
                Token::Comma => self.advance(),
                Token::RBracket => {
                    self.advance();
                    break;
                }
                _ => return Err(ParseError::unexpected(self.peek(0).clone(), "',' or ']'")),
            }
        }

        Ok(Expr::MultiSelectList(elements))
    }

    /// `{key: expr, ...}`; the opening brace is consumed.
    fn parse_multi_select_hash(&mut self) -> Result<Expr, ParseError> {
        let mut pairs = vec![];

        loop {
            let key = match self.take() {
                Spanned {
                    token: Token::Identifier(name) | Token::QuotedIdentifier(name),
                    ..
                } => name,
                other => return Err(ParseError::unexpected(other, "identifier as hash key")),
            };
            self.expect(Token::Colon, "':'")?;

            let value = self.parse_expression(0)?;
            pairs.push((key, value));

            match self.current() {
                Token::Comma => self.advance(),
                Token::RBrace => {
                    self.advance();
                    break;
                }
                _ => return Err(ParseError::unexpected(self.peek(0).clone(), "',' or '}'")),
            }
        }

        Ok(Expr::MultiSelectHash(pairs))
    }

    /// `name(arg, ...)`; the function name is consumed.
    fn parse_function(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(Token::LParen, "'('")?;
        let mut args = vec![];

        if self.check(&Token::RParen) {
            self.advance();
            return Ok(Expr::Function { name, args });
        }

        loop {
            args.push(self.parse_expression(0)?);
            match self.current() {
                Token::Comma => self.advance(),
                Token::RParen => {
                    self.advance();
                    break;
                }
                _ => return Err(ParseError::unexpected(self.peek(0).clone(), "',' or ')'")),
            }
        }

        Ok(Expr::Function { name, args })
    }
}

/// Lexes and parses `text` into an AST.
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    Parser::new(Lexer::new(text))?.parse()
}

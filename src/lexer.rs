use thiserror::Error;

use crate::{
    ast::{Spanned, Token},
    value::Value,
};

/// Character offset into the expression text
pub type Position = usize;

/// Errors raised while splitting an expression into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: Position },

    #[error("Unterminated {what} starting at position {position}")]
    Unterminated {
        what: &'static str,
        position: Position,
    },

    #[error("Invalid quoted identifier at position {position}: {message}")]
    InvalidQuotedIdentifier { message: String, position: Position },

    #[error("Invalid JSON literal at position {position}: {message}")]
    InvalidJsonLiteral { message: String, position: Position },

    #[error("Invalid number '{text}' at position {position}")]
    InvalidNumber { text: String, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedCharacter { position, .. }
            | LexError::Unterminated { position, .. }
            | LexError::InvalidQuotedIdentifier { position, .. }
            | LexError::InvalidJsonLiteral { position, .. }
            | LexError::InvalidNumber { position, .. } => *position,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Whether the next non-whitespace character is `(`
    fn followed_by_paren(&self) -> bool {
        self.input[self.position..]
            .iter()
            .find(|c| !c.is_whitespace())
            .is_some_and(|c| *c == '(')
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Reads up to the closing `delimiter`, skipping over backslash escapes.
    ///
    /// Returns the raw text between the delimiters, escapes untouched.
    fn read_delimited(&mut self, delimiter: char, what: &'static str) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // opening delimiter

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == delimiter => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    result.push(ch);
                    self.advance();
                    match self.current_char() {
                        Some(escaped) => {
                            result.push(escaped);
                            self.advance();
                        }
                        None => break,
                    }
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::Unterminated {
            what,
            position: start,
        })
    }

    fn read_quoted_identifier(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        let raw = self.read_delimited('"', "quoted identifier")?;
        serde_json::from_str::<String>(&format!("\"{}\"", raw))
            .map(Token::QuotedIdentifier)
            .map_err(|e| LexError::InvalidQuotedIdentifier {
                message: e.to_string(),
                position: start,
            })
    }

    fn read_raw_string(&mut self) -> Result<Token, LexError> {
        let raw = self.read_delimited('\'', "raw string")?;
        let mut result = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();
        while let Some(ch) = chars.next() {
            match (ch, chars.peek()) {
                ('\\', Some(&next @ ('\'' | '\\'))) => {
                    result.push(next);
                    chars.next();
                }
                _ => result.push(ch),
            }
        }
        Ok(Token::RawString(result))
    }

    fn read_json_literal(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        let raw = self.read_delimited('`', "JSON literal")?.replace("\\`", "`");
        serde_json::from_str::<serde_json::Value>(raw.trim())
            .map(|json| Token::Literal(Value::from(json)))
            .map_err(|e| LexError::InvalidJsonLiteral {
                message: e.to_string(),
                position: start,
            })
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        let mut number = String::new();

        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
        }
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        number
            .parse::<i64>()
            .map(Token::Number)
            .map_err(|_| LexError::InvalidNumber {
                text: number,
                position: start,
            })
    }

    /// Consumes `second` if it is the next character, picking between a
    /// one- and a two-character token.
    fn one_or_two(&mut self, second: char, double: Token, single: Token) -> Token {
        self.advance();
        if self.current_char() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    pub fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace();
        let position = self.position;

        let token = match self.current_char() {
            None => Token::Eof,
            Some('.') => {
                self.advance();
                Token::Dot
            }
            Some('*') => {
                self.advance();
                Token::Star
            }
            Some(',') => {
                self.advance();
                Token::Comma
            }
            Some(':') => {
                self.advance();
                Token::Colon
            }
            Some('@') => {
                self.advance();
                Token::At
            }
            Some('(') => {
                self.advance();
                Token::LParen
            }
            Some(')') => {
                self.advance();
                Token::RParen
            }
            Some('{') => {
                self.advance();
                Token::LBrace
            }
            Some('}') => {
                self.advance();
                Token::RBrace
            }
            Some(']') => {
                self.advance();
                Token::RBracket
            }
            Some('[') => {
                self.advance();
                match self.current_char() {
                    Some(']') => {
                        self.advance();
                        Token::Flatten
                    }
                    Some('?') => {
                        self.advance();
                        Token::Filter
                    }
                    _ => Token::LBracket,
                }
            }
            Some('|') => self.one_or_two('|', Token::Or, Token::Pipe),
            Some('&') => self.one_or_two('&', Token::And, Token::Ampersand),
            Some('!') => self.one_or_two('=', Token::NotEq, Token::Not),
            Some('<') => self.one_or_two('=', Token::LtEq, Token::Lt),
            Some('>') => self.one_or_two('=', Token::GtEq, Token::Gt),
            Some('=') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Token::EqEq
                } else {
                    return Err(LexError::UnexpectedCharacter {
                        character: '=',
                        position,
                    });
                }
            }
            Some('"') => self.read_quoted_identifier()?,
            Some('\'') => self.read_raw_string()?,
            Some('`') => self.read_json_literal()?,
            Some('-') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number()?
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();
                if self.followed_by_paren() {
                    Token::FunctionName(ident)
                } else {
                    Token::Identifier(ident)
                }
            }
            Some(character) => {
                return Err(LexError::UnexpectedCharacter {
                    character,
                    position,
                });
            }
        };

        Ok(Spanned { token, position })
    }

    /// Consumes the whole input, the last token being `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

/// Splits `text` into tokens, ending with `Eof`.
pub fn tokenize(text: &str) -> Result<Vec<Spanned>, LexError> {
    Lexer::new(text).tokenize()
}

#[test]
fn test_operators() {
    let mut lexer = Lexer::new("|| && ! != | &");
    assert_eq!(lexer.next_token().unwrap().token, Token::Or);
    assert_eq!(lexer.next_token().unwrap().token, Token::And);
    assert_eq!(lexer.next_token().unwrap().token, Token::Not);
    assert_eq!(lexer.next_token().unwrap().token, Token::NotEq);
    assert_eq!(lexer.next_token().unwrap().token, Token::Pipe);
    assert_eq!(lexer.next_token().unwrap().token, Token::Ampersand);
    assert_eq!(lexer.next_token().unwrap().token, Token::Eof);
}

#[test]
fn test_brackets() {
    let tokens: Vec<Token> = tokenize("foo[?a][][0]")
        .unwrap()
        .into_iter()
        .map(|s| s.token)
        .collect();
    assert_eq!(
        tokens,
        vec![
            Token::Identifier("foo".to_string()),
            Token::Filter,
            Token::Identifier("a".to_string()),
            Token::RBracket,
            Token::Flatten,
            Token::LBracket,
            Token::Number(0),
            Token::RBracket,
            Token::Eof,
        ]
    );
}

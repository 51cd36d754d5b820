use std::fmt;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Names
    /// Unquoted field name
    ///
    /// Must start with a letter or underscore, followed by letters, digits,
    /// or underscores. `true`, `false` and `null` are plain identifiers.
    ///
    /// # Examples
    /// ```text
    /// foo
    /// item_count
    /// _internal
    /// ```
    Identifier(String),

    /// Double-quoted field name with JSON escapes
    ///
    /// # Examples
    /// ```text
    /// "foo bar"
    /// ""
    /// "été"
    /// ```
    QuotedIdentifier(String),

    /// Unquoted identifier directly followed by `(`
    ///
    /// # Examples
    /// ```text
    /// length(@)
    /// sort_by(people, &age)
    /// ```
    FunctionName(String),

    // Literals
    /// Single-quoted raw string
    ///
    /// # Examples
    /// ```text
    /// 'hello'
    /// 'it\'s'
    /// ```
    RawString(String),

    /// Backtick-delimited JSON literal, parsed at lex time
    ///
    /// # Examples
    /// ```text
    /// `1`
    /// `{"a": [true, null]}`
    /// ```
    Literal(Value),

    /// Integer used in index and slice position
    ///
    /// # Examples
    /// ```text
    /// 0
    /// -1
    /// ```
    Number(i64),

    // Navigation
    /// Sub-expression separator
    Dot,

    /// Wildcard (`*`)
    Star,

    /// Flatten (`[]`)
    Flatten,

    /// Filter opening (`[?`)
    Filter,

    /// Left bracket for index, slice, wildcard or multi-select list
    LBracket,

    /// Right bracket
    RBracket,

    /// Left brace for multi-select hashes
    LBrace,

    /// Right brace
    RBrace,

    /// Pipe (`|`)
    ///
    /// Stops any projection on its left.
    Pipe,

    // Logical
    /// Logical OR (`||`)
    Or,

    /// Logical AND (`&&`)
    And,

    /// Logical NOT (`!`)
    Not,

    // Comparison
    /// Less than
    Lt,

    /// Less than or equal
    LtEq,

    /// Equality operator
    EqEq,

    /// Inequality operator
    NotEq,

    /// Greater than or equal
    GtEq,

    /// Greater than
    Gt,

    // Delimiters
    /// Colon for slices and multi-select hash pairs
    Colon,

    /// Comma for separating arguments and multi-select elements
    Comma,

    /// Left parenthesis for grouping or function calls
    LParen,

    /// Right parenthesis
    RParen,

    /// Current node (`@`)
    At,

    /// Expression reference prefix (`&`)
    ///
    /// # Examples
    /// ```text
    /// sort_by(people, &age)
    /// ```
    Ampersand,

    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::QuotedIdentifier(name) => write!(f, "quoted identifier \"{}\"", name),
            Token::FunctionName(name) => write!(f, "function '{}'", name),
            Token::RawString(s) => write!(f, "raw string '{}'", s),
            Token::Literal(_) => write!(f, "literal"),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Dot => write!(f, "'.'"),
            Token::Star => write!(f, "'*'"),
            Token::Flatten => write!(f, "'[]'"),
            Token::Filter => write!(f, "'[?'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::Pipe => write!(f, "'|'"),
            Token::Or => write!(f, "'||'"),
            Token::And => write!(f, "'&&'"),
            Token::Not => write!(f, "'!'"),
            Token::Lt => write!(f, "'<'"),
            Token::LtEq => write!(f, "'<='"),
            Token::EqEq => write!(f, "'=='"),
            Token::NotEq => write!(f, "'!='"),
            Token::GtEq => write!(f, "'>='"),
            Token::Gt => write!(f, "'>'"),
            Token::Colon => write!(f, "':'"),
            Token::Comma => write!(f, "','"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::At => write!(f, "'@'"),
            Token::Ampersand => write!(f, "'&'"),
            Token::Eof => write!(f, "end of expression"),
        }
    }
}

/// A token together with the character offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

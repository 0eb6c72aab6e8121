//! SQL tokens: the atomic units of SQL output.
//!
//! Builders never write strings directly. They push tokens, and the dialect
//! decides how identifiers, literals and "today" are spelled when the stream
//! is serialized.

use super::dialect::{Dialect, SqlDialect};
use super::expr::BinaryOperator;

/// Reserved words and fixed keyword phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    Distinct,
    From,
    Where,
    With,
    As,
    On,
    InnerJoin,
    LeftOuterJoin,
    GroupBy,
    OrderBy,
    Asc,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::Distinct => "DISTINCT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::With => "WITH",
            Keyword::As => "AS",
            Keyword::On => "ON",
            Keyword::InnerJoin => "INNER JOIN",
            Keyword::LeftOuterJoin => "LEFT OUTER JOIN",
            Keyword::GroupBy => "GROUP BY",
            Keyword::OrderBy => "ORDER BY",
            Keyword::Asc => "ASC",
        }
    }
}

/// Every element the builders can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Operator(BinaryOperator),

    Comma,
    Dot,
    LParen,
    RParen,

    Space,
    Newline,
    /// Two spaces per level.
    Indent(usize),

    /// Table, column, CTE or alias name, quoted per dialect.
    Ident(String),
    /// `schema.name` or bare `name`.
    QualifiedIdent {
        schema: Option<String>,
        name: String,
    },
    Int(i64),
    Str(String),
    Null,
    /// Rendered upper-case, never quoted.
    FunctionName(String),
    /// The dialect's "today" expression.
    CurrentDate,
    /// Single-line comment. Embedded newlines are folded into spaces so the
    /// comment can never swallow the statement that follows it.
    Comment(String),

    /// Emitted verbatim.
    ///
    /// # Security Warning
    ///
    /// **Never pass untrusted input to this variant.** It carries dialect
    /// fragments and the operator text of calculated metric formulas, which
    /// are authored by the model owner.
    Raw(String),
}

impl Token {
    /// Serialize this token for `dialect`.
    pub fn serialize(&self, dialect: Dialect) -> String {
        match self {
            Token::Keyword(kw) => kw.as_str().into(),
            Token::Operator(op) => op.as_str().into(),

            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),

            Token::Space => " ".into(),
            Token::Newline => "\n".into(),
            Token::Indent(n) => "  ".repeat(*n),

            Token::Ident(name) => dialect.quote_identifier(name),
            Token::QualifiedIdent { schema, name } => match schema {
                Some(s) => format!(
                    "{}.{}",
                    dialect.quote_identifier(s),
                    dialect.quote_identifier(name)
                ),
                None => dialect.quote_identifier(name),
            },
            Token::Int(n) => n.to_string(),
            Token::Str(s) => dialect.quote_string(s),
            Token::Null => "NULL".into(),
            Token::FunctionName(name) => name.to_uppercase(),
            Token::CurrentDate => dialect.current_date().into(),
            Token::Comment(text) => {
                let folded: Vec<&str> = text.lines().map(str::trim).collect();
                format!("-- {}", folded.join(" "))
            }

            Token::Raw(s) => s.clone(),
        }
    }
}

/// An ordered run of tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    pub fn serialize(&self, dialect: Dialect) -> String {
        self.tokens.iter().map(|t| t.serialize(dialect)).collect()
    }

    pub fn keyword(&mut self, kw: Keyword) -> &mut Self {
        self.push(Token::Keyword(kw))
    }

    pub fn ident(&mut self, name: &str) -> &mut Self {
        self.push(Token::Ident(name.into()))
    }

    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }

    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }

    pub fn indent(&mut self, n: usize) -> &mut Self {
        self.push(Token::Indent(n))
    }

    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }

    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }

    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
}

use std::fmt::Display;

use crate::common::span::Spanned;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum Delim {
    Paren,
    Curly,
    Square,
}

impl Delim {
    pub fn open(&self) -> char {
        match self {
            Delim::Paren => '(',
            Delim::Curly => '{',
            Delim::Square => '[',
        }
    }

    pub fn close(&self) -> char {
        match self {
            Delim::Paren => ')',
            Delim::Curly => '}',
            Delim::Square => ']',
        }
    }
}

impl Display for Delim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Delim::Paren => "parenthesis",
            Delim::Curly => "curly brackets",
            Delim::Square => "square brackets",
        };

        write!(f, "{}", name)
    }
}

pub type Tokens = Vec<Spanned<Token>>;

/// These are the different tokens the lexer will output.
/// Literals keep their raw text, quotes and prefixes included,
/// because the rewriter only ever needs to copy them back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // Grouping
    Open(Delim),
    Close(Delim),

    // Leafs
    Name(String),
    Number(String),
    Str(String),
    Op(String),
}

/// Reserved words, which can never be bound by an assignment.
pub const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Whether `name` could be bound by an assignment.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&name)
}

impl Token {
    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, Token::Name(n) if n == name)
    }

    pub fn is_op(&self, op: &str) -> bool {
        matches!(self, Token::Op(o) if o == op)
    }

    /// Returns the identifier, if this token is a name that is not a keyword.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Token::Name(n) if !KEYWORDS.contains(&n.as_str()) => Some(n),
            _ => None,
        }
    }

    /// Returns the unquoted contents of a plain string literal.
    pub fn string_value(&self) -> Option<&str> {
        match self {
            Token::Str(raw) => {
                let quote = raw.chars().next()?;
                if quote != '"' && quote != '\'' || raw.len() < 2 || raw.starts_with("\"\"\"") {
                    return None;
                }
                raw.strip_prefix(quote)?.strip_suffix(quote)
            },
            _ => None,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // pretty formatting for tokens
        // just use debug if you're not printing a message or something.
        let message = match self {
            Token::Open(d) => format!("opening {}", d),
            Token::Close(d) => format!("closing {}", d),
            Token::Name(n) => format!("name `{}`", n),
            Token::Number(n) => format!("number `{}`", n),
            Token::Str(s) => format!("string {}", s),
            Token::Op(o) => format!("operator `{}`", o),
        };

        write!(f, "{}", message)
    }
}

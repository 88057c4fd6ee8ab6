use std::{collections::BTreeSet, rc::Rc};

use crate::{
    common::{source::Source, span::Spanned},
    construct::token::{Token, Tokens},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Comment,
    Code,
}

/// A logical line: one or more physical lines joined by
/// open brackets, backslash continuations, or multi-line strings.
/// Blank and comment-only lines are kept as lines of their own,
/// so that the lines of a `Script` cover every physical line exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub kind: LineKind,
    /// Indentation width, tabs advancing to the next multiple of 8.
    pub indent: usize,
    /// First and last physical line, zero-based and inclusive.
    pub first: usize,
    pub last: usize,
    /// Byte range of the line's text, without the trailing newline.
    pub start: usize,
    pub end: usize,
    pub tokens: Tokens,
}

impl Line {
    pub fn is_code(&self) -> bool {
        self.kind == LineKind::Code
    }

    /// Whether this line is a compound statement header
    /// whose body follows on the next, indented, lines.
    pub fn opens_block(&self) -> bool {
        self.is_code()
            && self
                .tokens
                .last()
                .map(|t| t.item.is_op(":"))
                .unwrap_or(false)
    }

    pub fn starts_with(&self, name: &str) -> bool {
        self.tokens.first().map(|t| t.item.is_name(name)).unwrap_or(false)
    }

    /// The leading whitespace of the first physical line.
    pub fn leading<'a>(&self, source: &'a Source) -> &'a str {
        let text = &source.contents[self.start..self.end];
        let trimmed = text.trim_start_matches(|c: char| c == ' ' || c == '\t' || c == '\x0c');
        &text[..text.len() - trimmed.len()]
    }

    pub fn text<'a>(&self, source: &'a Source) -> &'a str {
        &source.contents[self.start..self.end]
    }

    /// Splits the line into simple statements on top-level `;`.
    pub fn statements(&self) -> Vec<&[Spanned<Token>]> {
        let mut statements = vec![];
        let mut depth = 0usize;
        let mut begin = 0;

        for (index, token) in self.tokens.iter().enumerate() {
            match &token.item {
                Token::Open(_) => depth += 1,
                Token::Close(_) => depth = depth.saturating_sub(1),
                Token::Op(o) if o == ";" && depth == 0 => {
                    statements.push(&self.tokens[begin..index]);
                    begin = index + 1;
                },
                _ => (),
            }
        }

        if begin < self.tokens.len() {
            statements.push(&self.tokens[begin..]);
        }
        statements
    }
}

/// A lexed script: its source, logical lines,
/// and the physical lines that begin inside a string literal.
#[derive(Debug, Clone)]
pub struct Script {
    pub source: Rc<Source>,
    pub lines: Vec<Line>,
    pub string_lines: BTreeSet<usize>,
}

impl Script {
    pub fn code(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter().filter(|l| l.is_code())
    }

    pub fn top_level(&self) -> impl Iterator<Item = &Line> {
        self.code().filter(|l| l.indent == 0)
    }

    /// Byte range covering the line and its trailing newline, if any.
    pub fn removal_range(&self, line: &Line) -> std::ops::Range<usize> {
        let contents = &self.source.contents;
        let end = if contents[line.end..].starts_with('\n') {
            line.end + 1
        } else {
            line.end
        };
        line.start..end
    }

    /// Prefixes every physical line with `width` spaces.
    /// Blank lines stay empty and lines that begin inside
    /// a multi-line string are left untouched, so string
    /// contents survive the move into a nested scope.
    pub fn indent(&self, width: usize) -> String {
        let prefix = " ".repeat(width);
        physical_lines(&self.source.contents)
            .enumerate()
            .map(|(index, line)| {
                if self.string_lines.contains(&index) {
                    line.to_string()
                } else if line.trim().is_empty() {
                    String::new()
                } else {
                    format!("{}{}", prefix, line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Physical lines of a text, ignoring the empty remainder after a final newline.
pub fn physical_lines(text: &str) -> impl Iterator<Item = &str> {
    text.strip_suffix('\n').unwrap_or(text).split('\n').filter({
        let empty = text.is_empty();
        move |_| !empty
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn physical_line_splitting() {
        assert_eq!(physical_lines("a\nb\n").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(physical_lines("a\n\nb").collect::<Vec<_>>(), vec!["a", "", "b"]);
        assert_eq!(physical_lines("").count(), 0);
        assert_eq!(physical_lines("\n").collect::<Vec<_>>(), vec![""]);
    }
}

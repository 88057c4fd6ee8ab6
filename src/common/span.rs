use std::{
    fmt::{self, Debug, Display, Formatter},
    rc::Rc,
};

use crate::common::source::Source;

/// A `Span` refers to a section of a source,
/// much like a `&str`, but with a reference to a `Source` rather than a `String`.
/// A `Span` is meant to be paired with other datastructures,
/// to be used during error reporting.
#[derive(Clone, Eq, PartialEq)]
pub struct Span {
    source: Rc<Source>,
    offset: usize,
    length: usize,
}

impl Span {
    /// Create a new `Span` from an offset with a length.
    /// All `Span`s have access to the `Source` from whence they came,
    /// So they can't be misinterpreted or miscombined.
    pub fn new(source: &Rc<Source>, offset: usize, length: usize) -> Span {
        Span {
            source: Rc::clone(source),
            offset,
            length,
        }
    }

    /// A `Span` that points at a specific point in the source.
    /// Has a length of `0`.
    pub fn point(source: &Rc<Source>, offset: usize) -> Span {
        Span::new(source, offset, 0)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Return the index of the end of the `Span`.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Creates a new `Span` which spans the space of the previous two.
    /// ```plain
    /// hello this is cool
    /// ^^^^^              | Span a
    ///            ^^      | Span b
    /// ^^^^^^^^^^^^^      | combined
    /// ```
    pub fn combine(a: &Span, b: &Span) -> Span {
        if a.source != b.source {
            panic!("Can't combine two Spans with separate sources");
        }

        let offset = a.offset.min(b.offset);
        let end = a.end().max(b.end());

        Span::new(&a.source, offset, end - offset)
    }

    /// Returns the contents of a `Span`.
    /// This indexes into the source file,
    /// so if the `Span` is along an invalid byte boundary
    /// the program will panic.
    pub fn contents(&self) -> &str {
        &self.source.contents[self.offset..self.end()]
    }

    pub fn path(&self) -> String {
        self.source.path.to_string_lossy().to_string()
    }

    /// Zero-based line the byte `index` falls on.
    pub fn line(&self, index: usize) -> usize {
        self.source.contents[..index].matches('\n').count()
    }

    /// Zero-based column, in chars, of the byte `index`.
    pub fn col(&self, index: usize) -> usize {
        let contents = &self.source.contents[..index];
        let start = contents.rfind('\n').map(|i| i + 1).unwrap_or(0);
        contents[start..].chars().count()
    }

    pub fn lines(&self) -> Vec<String> {
        let lines: Vec<&str> = self.source.contents.split('\n').collect();
        let start = self.line(self.offset);
        let end = self.line(self.end()).min(lines.len().saturating_sub(1));

        lines[start..=end.max(start)]
            .iter()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect()
    }

    pub fn format(&self) -> FormattedSpan {
        FormattedSpan {
            path: self.path(),
            start: self.line(self.offset),
            lines: self.lines(),
            start_col: self.col(self.offset),
            end_col: self.col(self.end()),
        }
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("contents", &self.contents())
            .field("start", &self.offset)
            .field("end", &self.end())
            .finish()
    }
}

impl Display for Span {
    /// Given a `Span`, `fmt` will print out where the `Span` occurs in its source.
    /// Single-line `Span`s:
    /// ```plain
    /// 12 | def broken(:
    ///    |            ^
    /// ```
    /// Multi-line `Span`s:
    /// ```plain
    /// 12 > x = (
    /// 13 >     1,
    /// 14 >     2,
    /// ```
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// Represents a formatted span, ready to be displayed.
/// Contains information about where the span is from,
/// and where in the text it starts and ends
/// relative to the lines in the source.
pub struct FormattedSpan {
    pub path: String,
    pub start: usize,
    pub lines: Vec<String>,
    pub start_col: usize,
    pub end_col: usize,
}

impl FormattedSpan {
    pub fn is_multiline(&self) -> bool {
        self.lines.len() != 1
    }

    pub fn gutter_padding(&self) -> usize {
        (self.start + self.lines.len()).to_string().len()
    }

    /// If a single line span, returns the number of carets between cols.
    pub fn carets(&self) -> Option<usize> {
        if self.is_multiline() {
            None
        } else {
            Some(self.end_col.saturating_sub(self.start_col).max(1))
        }
    }
}

impl Display for FormattedSpan {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let gutter = " ".repeat(self.gutter_padding());
        writeln!(f, "In {}:{}:{}", self.path, self.start + 1, self.start_col + 1)?;
        writeln!(f, "{} |", gutter)?;

        match self.carets() {
            Some(carets) => {
                let line_no = (self.start + 1).to_string();
                let padding = " ".repeat(self.gutter_padding() - line_no.len());
                writeln!(f, "{}{} | {}", padding, line_no, self.lines[0])?;
                writeln!(f, "{} | {}{}", gutter, " ".repeat(self.start_col), "^".repeat(carets))?;
            },
            None => {
                for (index, line) in self.lines.iter().enumerate() {
                    let line_no = (self.start + index + 1).to_string();
                    let padding = " ".repeat(self.gutter_padding() - line_no.len());
                    writeln!(f, "{}{} > {}", padding, line_no, line)?;
                }
            },
        }

        writeln!(f, "{} |", gutter)
    }
}

/// A wrapper for spanning types.
/// For example, a token can be spanned to indicate
/// where it was lexed from (a `Spanned<Token>`).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Spanned<T> {
    pub item: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    /// Takes a generic item, and wraps in in a `Span` to make it `Spanned`.
    pub fn new(item: T, span: Span) -> Spanned<T> {
        Spanned { item, span }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn combination() {
        let source = Source::source("heck, that's awesome");
        let a = Span::new(&source, 0, 5);
        let b = Span::new(&source, 11, 2);

        assert_eq!(Span::combine(&a, &b), Span::new(&source, 0, 13));
    }

    #[test]
    fn lines_and_columns() {
        let source = Source::source("first\nsecond line\nthird");
        let span = Span::new(&source, 13, 4);

        assert_eq!(span.contents(), "line");
        assert_eq!(span.line(span.offset()), 1);
        assert_eq!(span.col(span.offset()), 7);
        assert_eq!(span.lines(), vec!["second line".to_string()]);
    }

    #[test]
    fn single_line_format() {
        let source = Source::source("x = (1,\ny = 2");
        let span = Span::new(&source, 4, 1);
        let target = "In ./source:1:5
  |
1 | x = (1,
  |     ^
  |
";
        assert_eq!(format!("{}", span), target);
    }

    #[test]
    fn empty() {
        let source = Source::source("");
        let span = Span::point(&source, 0);
        format!("{}", span);
    }
}

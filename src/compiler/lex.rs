use std::{collections::BTreeSet, rc::Rc};

use crate::{
    common::{
        source::Source,
        span::{Span, Spanned},
    },
    compiler::syntax::{Note, Syntax},
    construct::{
        line::{Line, LineKind, Script},
        token::{Delim, Token},
    },
};

/// Longest first, so that `**=` is never read as `**` then `=`.
const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "->", ":=", "==", "!=", "<=", ">=", "+=", "-=", "*=",
    "/=", "%=", "&=", "|=", "^=", "@=", "**", "//", "<<", ">>", "+", "-", "*", "/", "%", "@",
    "&", "|", "^", "~", "<", ">", "=", ".", ",", ":", ";",
];

const STRING_PREFIXES: &[&str] = &["r", "u", "b", "f", "br", "rb", "fr", "rf"];

/// Splits a script into logical lines, the way the
/// target interpreter's tokenizer would.
/// Nothing is evaluated; the lexer only has to know enough
/// to find statement boundaries, block structure, and
/// the extent of string literals.
#[derive(Debug)]
pub struct Lexer {
    source: Rc<Source>,
    index: usize,
    physical: usize,
    nesting: Vec<Spanned<Delim>>,
    lines: Vec<Line>,
    string_lines: BTreeSet<usize>,
}

impl Lexer {
    /// Lexes a source file into a `Script` of logical lines.
    pub fn lex(source: Rc<Source>) -> Result<Script, Syntax> {
        // build a base lexer for this file
        let mut lexer = Lexer {
            source,
            index: 0,
            physical: 0,
            nesting: vec![],
            lines: vec![],
            string_lines: BTreeSet::new(),
        };

        while lexer.index < lexer.source.contents.len() {
            lexer.logical_line()?;
        }

        check_indentation(&lexer.source, &lexer.lines)?;

        Ok(Script {
            source: lexer.source,
            lines: lexer.lines,
            string_lines: lexer.string_lines,
        })
    }

    /// Returns all characters after the current index position.
    fn remaining(&self) -> &str {
        &self.source.contents[self.index..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += c.len_utf8();
        if c == '\n' {
            self.physical += 1;
        }
        Some(c)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(&self.source, start, self.index - start)
    }

    /// Consumes leading whitespace, returning its width.
    fn indentation(&mut self) -> usize {
        let mut width = 0;
        while let Some(c) = self.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.bump();
        }
        width
    }

    /// Eats everything up to, but not including, the next newline.
    fn skip_to_newline(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn logical_line(&mut self) -> Result<(), Syntax> {
        let start = self.index;
        let first = self.physical;
        let indent = self.indentation();

        let trivial = match self.peek() {
            None | Some('\n') | Some('\r') => Some(LineKind::Blank),
            Some('#') => Some(LineKind::Comment),
            _ => None,
        };

        if let Some(kind) = trivial {
            self.skip_to_newline();
            let end = self.index;
            self.bump();
            self.lines.push(Line {
                kind,
                indent,
                first,
                last: first,
                start,
                end,
                tokens: vec![],
            });
            return Ok(());
        }

        let mut tokens = vec![];
        let (end, last) = loop {
            match self.peek() {
                None => {
                    if let Some(open) = self.nesting.last() {
                        return Err(Syntax::error_with_note(
                            &format!("Unexpected end of file inside {}", open.item),
                            Note::new_with_hint(
                                &format!("add a closing `{}`", open.item.close()),
                                &open.span,
                            ),
                        ));
                    }
                    break (self.index, self.physical);
                },
                Some('\n') => {
                    if self.nesting.is_empty() {
                        let (end, last) = (self.index, self.physical);
                        self.bump();
                        break (end, last);
                    }
                    self.bump();
                },
                Some(' ') | Some('\t') | Some('\r') | Some('\x0c') => {
                    self.bump();
                },
                Some('#') => self.skip_to_newline(),
                Some('\\') => self.continuation()?,
                Some(c) => tokens.push(self.next_token(c)?),
            }
        };

        let kind = if tokens.is_empty() { LineKind::Blank } else { LineKind::Code };
        self.lines.push(Line {
            kind,
            indent,
            first,
            last,
            start,
            end,
            tokens,
        });
        Ok(())
    }

    /// Joins the next physical line after a trailing backslash.
    fn continuation(&mut self) -> Result<(), Syntax> {
        let start = self.index;
        self.bump();
        if self.peek() == Some('\r') {
            self.bump();
        }

        match self.peek() {
            Some('\n') => {
                self.bump();
                Ok(())
            },
            None => Err(Syntax::error(
                "Unexpected end of file after line continuation character",
                &self.span_from(start),
            )),
            Some(_) => Err(Syntax::error(
                "Unexpected character after line continuation character",
                &Span::new(&self.source, start, 1),
            )),
        }
    }

    fn next_token(&mut self, c: char) -> Result<Spanned<Token>, Syntax> {
        let start = self.index;

        let token = match c {
            '(' | '[' | '{' => self.open(c),
            ')' | ']' | '}' => self.close(c)?,
            '"' | '\'' => self.string(start)?,
            d if d.is_ascii_digit() => self.number(),
            '.' if self.peek_nth(1).map(|d| d.is_ascii_digit()).unwrap_or(false) => self.number(),
            n if n.is_alphabetic() || n == '_' => self.name()?,
            _ => self.operator(c)?,
        };

        Ok(Spanned::new(token, self.span_from(start)))
    }

    fn delim(c: char) -> Delim {
        match c {
            '(' | ')' => Delim::Paren,
            '[' | ']' => Delim::Square,
            _ => Delim::Curly,
        }
    }

    fn open(&mut self, c: char) -> Token {
        let delim = Lexer::delim(c);
        let span = Span::new(&self.source, self.index, 1);
        self.bump();
        self.nesting.push(Spanned::new(delim, span));
        Token::Open(delim)
    }

    fn close(&mut self, c: char) -> Result<Token, Syntax> {
        let delim = Lexer::delim(c);
        let here = Span::new(&self.source, self.index, 1);

        let opening = self.nesting.pop().ok_or_else(|| {
            Syntax::error(
                &format!("Closing {} does not have an opening {}", delim, delim),
                &here,
            )
        })?;

        if opening.item != delim {
            return Err(Syntax::error(
                &format!("Closing {} does not match the opening {}", delim, opening.item),
                &here,
            )
            .add_note(Note::new_with_hint("opened here", &opening.span)));
        }

        self.bump();
        Ok(Token::Close(delim))
    }

    fn name(&mut self) -> Result<Token, Syntax> {
        let start = self.index;
        while let Some(c) = self.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            self.bump();
        }

        let name = &self.source.contents[start..self.index];
        let prefixed = STRING_PREFIXES.contains(&name.to_ascii_lowercase().as_str());
        if prefixed && matches!(self.peek(), Some('"') | Some('\'')) {
            return self.string(start);
        }

        Ok(Token::Name(name.to_string()))
    }

    /// Expects the lexer to sit on the opening quote;
    /// `start` includes any prefix already consumed.
    fn string(&mut self, start: usize) -> Result<Token, Syntax> {
        let quote = match self.bump() {
            Some(q) => q,
            None => return Err(Syntax::error("Expected a string literal", &self.span_from(start))),
        };

        let doubled: String = [quote, quote].iter().collect();
        let triple = self.remaining().starts_with(&doubled);
        if triple {
            self.bump();
            self.bump();
        }

        loop {
            match self.bump() {
                None => {
                    return Err(Syntax::error_with_note(
                        "Unexpected end of file while reading string literal",
                        Note::new_with_hint(
                            &format!("this string is never closed with {}", quote),
                            &Span::new(&self.source, start, if triple { 3 } else { 1 }),
                        ),
                    ))
                },
                Some('\\') => match self.bump() {
                    Some('\n') => {
                        self.string_lines.insert(self.physical);
                    },
                    Some(_) => (),
                    None => continue,
                },
                Some('\n') if triple => {
                    self.string_lines.insert(self.physical);
                },
                Some('\n') => {
                    return Err(Syntax::error(
                        "Unterminated string literal",
                        &Span::new(&self.source, start, self.index - 1 - start),
                    ))
                },
                Some(c) if c == quote => {
                    if !triple {
                        break;
                    }
                    if self.remaining().starts_with(&doubled) {
                        self.bump();
                        self.bump();
                        break;
                    }
                },
                Some(_) => (),
            }
        }

        Ok(Token::Str(self.source.contents[start..self.index].to_string()))
    }

    fn number(&mut self) -> Token {
        let start = self.index;
        let lowered = self.remaining().get(..2).map(|s| s.to_ascii_lowercase());
        let hex = lowered.as_deref() == Some("0x");

        while let Some(c) = self.peek() {
            if !(c.is_alphanumeric() || c == '_' || c == '.') {
                break;
            }
            self.bump();
            let exponent = c == 'e' || c == 'E';
            if !hex && exponent && matches!(self.peek(), Some('+') | Some('-')) {
                self.bump();
            }
        }

        Token::Number(self.source.contents[start..self.index].to_string())
    }

    fn operator(&mut self, c: char) -> Result<Token, Syntax> {
        for op in OPERATORS {
            if self.remaining().starts_with(op) {
                self.index += op.len();
                return Ok(Token::Op(op.to_string()));
            }
        }

        Err(Syntax::error(
            &format!(
                "Hmm... The character `{}` is not recognized in this context - check for encoding issues or typos",
                c,
            ),
            &Span::new(&self.source, self.index, c.len_utf8()),
        ))
    }
}

/// Walks the code lines with a stack of open indentation levels,
/// rejecting the same layouts the interpreter would.
fn check_indentation(source: &Rc<Source>, lines: &[Line]) -> Result<(), Syntax> {
    let mut levels = vec![0];
    let mut previous: Option<&Line> = None;

    let first_span = |line: &Line| {
        line.tokens
            .first()
            .map(|t| t.span.clone())
            .unwrap_or_else(|| Span::point(source, line.start))
    };

    for line in lines.iter().filter(|l| l.is_code()) {
        let top = levels.last().copied().unwrap_or(0);
        let opened = previous.filter(|p| p.opens_block());

        if line.indent > top {
            if opened.is_none() {
                return Err(Syntax::error("Unexpected indent", &first_span(line)));
            }
            levels.push(line.indent);
        } else {
            if let Some(header) = opened {
                return Err(Syntax::error_with_note(
                    "Expected an indented block",
                    Note::new_with_hint("this statement needs a body", &first_span(header)),
                ));
            }
            while levels.len() > 1 && line.indent < levels.last().copied().unwrap_or(0) {
                levels.pop();
            }
            if levels.last().copied().unwrap_or(0) != line.indent {
                return Err(Syntax::error(
                    "Unindent does not match any outer indentation level",
                    &first_span(line),
                ));
            }
        }

        previous = Some(line);
    }

    match previous {
        Some(header) if header.opens_block() => Err(Syntax::error_with_note(
            "Expected an indented block",
            Note::new_with_hint("this statement needs a body", &first_span(header)),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn lex(s: &str) -> Result<Script, Syntax> {
        Lexer::lex(Source::source(s))
    }

    fn kinds(script: &Script) -> Vec<LineKind> {
        script.lines.iter().map(|l| l.kind).collect()
    }

    proptest! {
        #[test]
        fn doesnt_crash(s in "\\PC*") {
            let result = lex(&s);
            format!("{:?}", result);
        }

        #[test]
        fn balanced_brackets_lex(outer in any::<Delim>(), inner in any::<Delim>()) {
            let text = format!("x = {}1, {}2{}{}\n", outer.open(), inner.open(), inner.close(), outer.close());
            let script = lex(&text).unwrap();
            prop_assert_eq!(script.code().count(), 1);
        }

        #[test]
        fn lines_cover_every_physical_line(
            body in prop::collection::vec("[a-z]{1,6} = [0-9]{1,3}|# [a-z ]*|", 0..12)
        ) {
            let text = body.join("\n");
            let script = lex(&text).unwrap();
            let mut next = 0;
            for line in script.lines.iter() {
                prop_assert_eq!(line.first, next);
                next = line.last + 1;
            }
            prop_assert_eq!(next, crate::construct::line::physical_lines(&text).count());
        }
    }

    #[test]
    fn new_empty() {
        let script = lex("").unwrap();
        assert!(script.lines.is_empty());
    }

    #[test]
    fn logical_lines() {
        let script = lex("x = (1,\n     2)\n\n# note\ny = 3 \\\n    + 4\n").unwrap();
        assert_eq!(
            kinds(&script),
            vec![LineKind::Code, LineKind::Blank, LineKind::Comment, LineKind::Code]
        );
        assert_eq!((script.lines[0].first, script.lines[0].last), (0, 1));
        assert_eq!((script.lines[3].first, script.lines[3].last), (4, 5));
        assert_eq!(script.lines[3].text(&script.source), "y = 3 \\\n    + 4");
    }

    #[test]
    fn tokens() {
        let script = lex("async def run(hub, robot):\n    await robot.straight(-1.5e-3)\n").unwrap();
        let header = &script.lines[0];
        assert!(header.starts_with("async"));
        assert!(header.opens_block());
        assert_eq!(header.tokens[2].item, Token::Name("run".into()));
        assert_eq!(header.tokens[3].item, Token::Open(Delim::Paren));

        let body = &script.lines[1];
        assert_eq!(body.indent, 4);
        assert!(body.tokens.iter().any(|t| t.item == Token::Number("1.5e-3".into())));
    }

    #[test]
    fn strings_with_prefixes() {
        let script = lex("label = f\"run01:{name}\" + rb'\\x00'\n").unwrap();
        let strings: Vec<_> = script.lines[0]
            .tokens
            .iter()
            .filter_map(|t| match &t.item {
                Token::Str(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(strings, vec!["f\"run01:{name}\"", "rb'\\x00'"]);
    }

    #[test]
    fn triple_quoted_lines_are_marked() {
        let script = lex("def f():\n    \"\"\"\ndoc\n    \"\"\"\n    return 1\n").unwrap();
        assert_eq!(script.string_lines.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(script.code().count(), 3);
    }

    #[test]
    fn hash_inside_string_is_not_a_comment() {
        let script = lex("x = '# not a comment'\n").unwrap();
        assert_eq!(script.lines[0].tokens.len(), 3);
    }

    #[test]
    fn unclosed_string() {
        assert!(lex("x = 'asdf\ny = 2\n").is_err());
        assert!(lex("x = \"\"\"never closed\n").is_err());
    }

    #[test]
    fn brackets() {
        assert!(lex("x = (1, 2]\n").is_err());
        assert!(lex("x = 1)\n").is_err());
        let error = lex("x = [1,\n").unwrap_err();
        assert!(error.reason.contains("square brackets"));
    }

    #[test]
    fn indentation_errors() {
        assert_eq!(lex("x = 1\n    y = 2\n").unwrap_err().reason, "Unexpected indent");
        assert_eq!(
            lex("if x:\n        y = 1\n    z = 2\n").unwrap_err().reason,
            "Unindent does not match any outer indentation level"
        );
        assert_eq!(lex("def f():\nx = 1\n").unwrap_err().reason, "Expected an indented block");
        assert_eq!(lex("if __name__ == '__main__':\n").unwrap_err().reason, "Expected an indented block");
    }

    #[test]
    fn comments_do_not_affect_blocks() {
        lex("def f():\n# dedented comment\n    return 1\n").unwrap();
    }

    #[test]
    fn unknown_character() {
        let error = lex("x = $y\n").unwrap_err();
        assert!(error.reason.contains("`$`"));
    }
}

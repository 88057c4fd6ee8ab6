//! Text-level transforms applied to each file before it is spliced.
//!
//! Every transform works on the lexed `Script`, never on raw text,
//! so string literals and comments are never mistaken for code.
//! The transforms are chained by re-lexing the intermediate text;
//! `mission` and `dispatcher` run the full chains.

use std::rc::Rc;

use crate::{
    common::{source::Source, span::Spanned},
    compiler::{lex::Lexer, syntax::Syntax},
    construct::{
        line::{Line, LineKind, Script},
        link::LinkTable,
        patch::Patch,
        token::Token,
    },
};

/// The name of the module providing `initialize_robot`.
pub const SETUP_MODULE: &str = "setup";

/// A script split into the part that is merged ("library")
/// and the direct-execution blocks that are not ("entry").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sections {
    pub library: String,
    pub entry: Vec<String>,
}

/// The output of a full rewrite chain.
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub script: Script,
    pub entry: Vec<String>,
    /// Every name the setup module was imported as.
    pub aliases: Vec<String>,
}

impl Rewritten {
    pub fn text(&self) -> &str {
        &self.script.source.contents
    }

    /// The guard blocks, cleaned of setup imports and prefixes
    /// so they can run in the merged program.
    pub fn entry_script(&self) -> Result<Option<Script>, Syntax> {
        if self.entry.is_empty() {
            return Ok(None);
        }

        let script = Lexer::lex(Source::new(&self.entry.concat(), &self.script.source.path))?;
        let (text, found) = drop_setup_imports(&script);
        let mut aliases = self.aliases.clone();
        aliases.extend(found);

        let script = relex(&script.source, text)?;
        relex(&script.source, strip_aliases(&script, &aliases)).map(Some)
    }
}

/// Whether a line is the `if __name__ == "__main__":` guard.
/// Either quote style and the reversed comparison are accepted.
pub fn is_guard(line: &Line) -> bool {
    if !line.is_code() || line.indent != 0 || !line.starts_with("if") {
        return false;
    }

    let colon = match line.tokens.iter().position(|t| t.item.is_op(":")) {
        Some(colon) => colon,
        None => return false,
    };

    let condition: Vec<&Token> = line.tokens[1..colon].iter().map(|t| &t.item).collect();
    match condition.as_slice() {
        [left, eq, right] => {
            let main = |name: &Token, value: &Token| {
                name.is_name("__name__") && value.string_value() == Some("__main__")
            };
            eq.is_op("==") && (main(*left, *right) || main(*right, *left))
        },
        _ => false,
    }
}

/// Separates every top-level guard, the lines nested under it,
/// and its `elif`/`else` clauses from the rest of the script.
pub fn split_entry(script: &Script) -> Sections {
    let mut patch = Patch::new();
    let mut entry = vec![];
    let mut lines = script.lines.iter().peekable();

    while let Some(line) = lines.next() {
        if !is_guard(line) {
            continue;
        }

        let mut range = script.removal_range(line);
        while let Some(next) = lines.peek() {
            let nested = next.indent > line.indent;
            let inside = match next.kind {
                LineKind::Blank => true,
                LineKind::Comment => nested,
                LineKind::Code => {
                    nested
                        || next.indent == line.indent
                            && (next.starts_with("elif") || next.starts_with("else"))
                },
            };
            if !inside {
                break;
            }
            range.end = script.removal_range(next).end;
            lines.next();
        }

        entry.push(script.source.contents[range.clone()].to_string());
        patch.remove(range);
    }

    Sections {
        library: patch.apply(&script.source.contents),
        entry,
    }
}

/// Removes every guard block from a source.
pub fn strip_guard(source: Rc<Source>) -> Result<String, Syntax> {
    let script = Lexer::lex(source)?;
    Ok(split_entry(&script).library)
}

/// One `name.name as alias` item of an `import` statement.
struct ImportItem<'a> {
    path: Vec<&'a str>,
    alias: Option<&'a str>,
    start: usize,
    end: usize,
}

/// Parses `import a.b as c, d` into its items.
/// Returns `None` for anything that isn't a plain import statement.
fn import_items<'a>(statement: &'a [Spanned<Token>]) -> Option<Vec<ImportItem<'a>>> {
    let (first, rest) = statement.split_first()?;
    if !first.item.is_name("import") || rest.is_empty() {
        return None;
    }

    let mut items = vec![];
    for chunk in rest.split(|t| t.item.is_op(",")) {
        let (start, end) = (chunk.first()?.span.offset(), chunk.last()?.span.end());
        let (dotted, alias) = match chunk {
            [dotted @ .., as_, alias] if as_.item.is_name("as") => (dotted, Some(alias)),
            dotted => (dotted, None),
        };

        let mut path = vec![];
        for (index, token) in dotted.iter().enumerate() {
            match &token.item {
                Token::Name(n) if index % 2 == 0 => path.push(n.as_str()),
                Token::Op(o) if index % 2 == 1 && o == "." => (),
                _ => return None,
            }
        }
        if path.is_empty() {
            return None;
        }

        let alias = match alias {
            Some(token) => Some(token.item.identifier()?),
            None => None,
        };
        items.push(ImportItem { path, alias, start, end });
    }

    Some(items)
}

/// Removes a line. A nested line becomes `pass` at its
/// original indentation, so its block keeps a body.
fn remove_line(script: &Script, line: &Line, patch: &mut Patch) {
    if line.indent == 0 {
        patch.remove(script.removal_range(line));
    } else {
        let leading = line.leading(&script.source);
        patch.replace(line.start..line.end, format!("{}pass", leading));
    }
}

/// `from setup import name as alias` leaves `alias` unbound once the
/// import is gone; each such item becomes `alias = name`.
fn setup_renames(statement: &[Spanned<Token>]) -> Vec<String> {
    let index = match statement.iter().position(|t| t.item.is_name("import")) {
        Some(index) => index,
        None => return vec![],
    };
    let names: Vec<&Spanned<Token>> = statement[index + 1..]
        .iter()
        .filter(|t| !matches!(t.item, Token::Open(_) | Token::Close(_)))
        .collect();

    let mut renames = vec![];
    for item in names.split(|t| t.item.is_op(",")) {
        if let [name, as_, alias] = item {
            match (name.item.identifier(), alias.item.identifier()) {
                (Some(name), Some(alias)) if as_.item.is_name("as") && name != alias => {
                    renames.push(format!("{} = {}", alias, name));
                },
                _ => (),
            }
        }
    }
    renames
}

/// Drops imports of the setup module, whose capability the merged
/// output provides itself. Returns the new text and every name the
/// setup module was bound to.
pub fn drop_setup_imports(script: &Script) -> (String, Vec<String>) {
    let source = &script.source;
    let mut patch = Patch::new();
    let mut aliases: Vec<String> = vec![];

    for line in script.code() {
        let statements = line.statements();
        let statement = match statements.as_slice() {
            [statement] => *statement,
            _ => continue,
        };

        // from setup import initialize_robot
        if line.starts_with("from") {
            let from_setup = statement.get(1).map(|t| t.item.is_name(SETUP_MODULE)).unwrap_or(false);
            let next = statement.get(2).map(|t| &t.item);
            if from_setup && next.map(|t| t.is_name("import") || t.is_op(".")).unwrap_or(false) {
                let renames = setup_renames(statement);
                if renames.is_empty() {
                    remove_line(script, line, &mut patch);
                } else {
                    patch.replace(
                        line.start..line.end,
                        format!("{}{}", line.leading(source), renames.join("; ")),
                    );
                }
            }
            continue;
        }

        // import setup [as alias], other
        let items = match import_items(statement) {
            Some(items) => items,
            None => continue,
        };
        let (setup, kept): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|item| item.path[0] == SETUP_MODULE);
        if setup.is_empty() {
            continue;
        }

        for item in setup.iter() {
            let alias = item.alias.unwrap_or(SETUP_MODULE).to_string();
            if !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }

        if kept.is_empty() {
            remove_line(script, line, &mut patch);
        } else {
            let kept: Vec<&str> = kept.iter().map(|item| &source.contents[item.start..item.end]).collect();
            patch.replace(
                line.start..line.end,
                format!("{}import {}", line.leading(source), kept.join(", ")),
            );
        }
    }

    (patch.apply(&source.contents), aliases)
}

/// Links the dispatcher's mission imports against the run's bindings:
/// `import a.b.mission as alias` and `from a.b import mission as alias`
/// both become `alias = mission`, at the original indentation.
/// Imports of anything the table doesn't know are left untouched.
pub fn link_imports(script: &Script, table: &LinkTable) -> String {
    let source = &script.source;
    let mut patch = Patch::new();

    for line in script.code() {
        let statements = line.statements();
        let statement = match statements.as_slice() {
            [statement] => *statement,
            _ => continue,
        };

        let linked = if line.starts_with("from") {
            link_from(statement, table)
        } else {
            link_import(statement, table)
        };

        if let Some((alias, mission)) = linked {
            patch.replace(
                line.start..line.end,
                format!("{}{} = {}", line.leading(source), alias, mission),
            );
        }
    }

    patch.apply(&source.contents)
}

fn link_import<'a>(
    statement: &'a [Spanned<Token>],
    table: &'a LinkTable,
) -> Option<(&'a str, &'a str)> {
    match import_items(statement)?.as_slice() {
        [item] => Some((item.alias?, table.resolve(&item.path)?)),
        _ => None,
    }
}

fn link_from<'a>(statement: &'a [Spanned<Token>], table: &'a LinkTable) -> Option<(&'a str, &'a str)> {
    let index = statement.iter().position(|t| t.item.is_name("import"))?;
    let (module, tail) = (&statement[1..index], &statement[index + 1..]);

    let module_ok = !module.is_empty()
        && module.iter().all(|t| {
            matches!(t.item, Token::Name(_)) || t.item.is_op(".") || t.item.is_op("...")
        });
    if !module_ok {
        return None;
    }

    match tail {
        [mission, as_, alias] if as_.item.is_name("as") => {
            let mission = match &mission.item {
                Token::Name(mission) => mission.as_str(),
                _ => return None,
            };
            Some((alias.item.identifier()?, table.resolve(&[mission])?))
        },
        _ => None,
    }
}

/// Strips `alias.` wherever a setup alias is used as an attribute
/// prefix in code, leaving the bare attribute name.
pub fn strip_aliases(script: &Script, aliases: &[String]) -> String {
    let mut patch = Patch::new();

    for line in script.code() {
        for (index, pair) in line.tokens.windows(2).enumerate() {
            let prefixed = match &pair[0].item {
                Token::Name(name) => aliases.iter().any(|a| a == name),
                _ => false,
            };
            let attribute = index == 0 || !line.tokens[index - 1].item.is_op(".");
            if prefixed && attribute && pair[1].item.is_op(".") {
                patch.remove(pair[0].span.offset()..pair[1].span.end());
            }
        }
    }

    patch.apply(&script.source.contents)
}

fn relex(source: &Rc<Source>, text: String) -> Result<Script, Syntax> {
    Lexer::lex(Source::new(&text, &source.path))
}

/// A guard-stripped script, for files spliced without further rewriting.
pub fn library(source: Rc<Source>) -> Result<Script, Syntax> {
    let script = Lexer::lex(source)?;
    relex(&script.source, split_entry(&script).library)
}

/// The full chain for a mission file:
/// guard removal, setup import removal, setup prefix stripping.
pub fn mission(source: Rc<Source>) -> Result<Rewritten, Syntax> {
    let script = Lexer::lex(source)?;
    let sections = split_entry(&script);

    let script = relex(&script.source, sections.library)?;
    let (text, aliases) = drop_setup_imports(&script);
    let script = relex(&script.source, text)?;
    let script = relex(&script.source, strip_aliases(&script, &aliases))?;

    Ok(Rewritten {
        script,
        entry: sections.entry,
        aliases,
    })
}

/// The full chain for a dispatcher file: the mission chain,
/// plus linking its mission imports against `table`.
pub fn dispatcher(source: Rc<Source>, table: &LinkTable) -> Result<Rewritten, Syntax> {
    let script = Lexer::lex(source)?;
    let sections = split_entry(&script);

    let script = relex(&script.source, sections.library)?;
    let (text, aliases) = drop_setup_imports(&script);
    let script = relex(&script.source, text)?;
    let script = relex(&script.source, link_imports(&script, table))?;
    let script = relex(&script.source, strip_aliases(&script, &aliases))?;

    Ok(Rewritten {
        script,
        entry: sections.entry,
        aliases,
    })
}

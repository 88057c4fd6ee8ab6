//! Finds the names a mission file makes available to others:
//! its top-level definitions and simple assignments,
//! and every name it declares `global` anywhere in the file.

use std::collections::BTreeSet;

use crate::{
    common::span::Spanned,
    construct::{
        line::Script,
        token::Token,
    },
};

/// Top-level exports: functions, classes, and plain or annotated
/// assignments to a single name. Names starting with `_` are private.
/// The result is sorted and free of duplicates.
pub fn exports(script: &Script) -> Vec<String> {
    let mut names = BTreeSet::new();

    for line in script.top_level() {
        for statement in line.statements() {
            for name in defined(statement) {
                if !name.starts_with('_') {
                    names.insert(name.to_string());
                }
            }
        }
    }

    names.into_iter().collect()
}

/// Every name listed by a `global` statement, at any depth.
/// `global` is reserved, so each occurrence of the keyword
/// starts a declaration.
pub fn globals(script: &Script) -> Vec<String> {
    let mut names = BTreeSet::new();

    for line in script.code() {
        let mut tokens = line.tokens.iter().peekable();
        while let Some(token) = tokens.next() {
            if !token.item.is_name("global") {
                continue;
            }
            while let Some(next) = tokens.peek() {
                match &next.item {
                    Token::Op(o) if o == "," => (),
                    Token::Name(_) => {
                        if let Some(name) = next.item.identifier() {
                            names.insert(name.to_string());
                        }
                    },
                    _ => break,
                }
                tokens.next();
            }
        }
    }

    names.into_iter().collect()
}

/// The names a single top-level statement binds.
fn defined<'a>(statement: &'a [Spanned<Token>]) -> Vec<&'a str> {
    let items: Vec<&'a Token> = statement.iter().map(|t| &t.item).collect();

    match items.as_slice() {
        [Token::Name(def), name, ..] if def == "def" || def == "class" => {
            name.identifier().into_iter().collect()
        },
        [Token::Name(a), Token::Name(def), name, ..] if a == "async" && def == "def" => {
            name.identifier().into_iter().collect()
        },
        [name, Token::Op(colon), ..] if colon == ":" => name.identifier().into_iter().collect(),
        _ => assignment_targets(&items),
    }
}

/// Targets of `a = b = value`, keeping only the single-name ones.
fn assignment_targets<'a>(items: &[&'a Token]) -> Vec<&'a str> {
    let mut segments: Vec<&[&Token]> = vec![];
    let mut depth = 0usize;
    let mut begin = 0;

    for (index, token) in items.iter().enumerate() {
        match token {
            Token::Open(_) => depth += 1,
            Token::Close(_) => depth = depth.saturating_sub(1),
            Token::Op(o) if o == "=" && depth == 0 => {
                segments.push(&items[begin..index]);
                begin = index + 1;
            },
            _ => (),
        }
    }

    // everything before the last `=` is a target
    segments
        .into_iter()
        .filter_map(|segment| match segment {
            [single] => single.identifier(),
            _ => None,
        })
        .collect()
}

//! This module contains the composition pipeline.
//! Each stage turns one representation into another,
//! starting with `Source` (string + path):
//!
//! 1. Logical lines: `lex.rs`
//! 2. Exports and globals: `extract.rs`
//! 3. Guard, setup and import rewriting: `rewrite.rs`
//! 4. Mission namespaces: `bind.rs`
//! 5. Run factories: `block.rs`
//! 6. Whole programs: `multi.rs` (menu) and `flat.rs` (single run),
//!    the menu's fixed runtime living in `shell.rs`.
//!
//! Generated text is written through an `Emitter` (`emit.rs`).

pub mod lex;
pub mod syntax;

pub mod extract;
pub mod rewrite;

pub mod bind;
pub mod block;
pub mod emit;
pub mod flat;
pub mod multi;
pub mod shell;

pub use flat::Flat;
pub use lex::Lexer;
pub use multi::assemble;
pub use syntax::Syntax;

//! Intermediate representations shared by the pipeline stages:
//! tokens, logical lines, text patches and the mission link table.

pub mod line;
pub mod link;
pub mod patch;
pub mod token;

pub use line::{Line, LineKind, Script};
pub use link::{LinkTable, VecSet};
pub use patch::Patch;
pub use token::{is_identifier, Delim, Token, Tokens};

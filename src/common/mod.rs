//! Contains datastructures and utility functions
//! shared by the `compiler` and the `project` loader.
//!
//! - Source code representation and span annotations.

pub mod source;
pub mod span;

pub use source::Source;
pub use span::{Span, Spanned};

//! # Hubweave
//! Merges a robot project's mission files into a single program
//! for a hub that can't import across files.
//! If you're looking for the command line tool, see `hubweave-cli`.
//!
//! A project is a directory of numbered runs:
//!
//! ```text
//! robot/
//!   setup.py            optional, shared `initialize_robot`
//!   run01/
//!     m01_crane.py      missions, one namespace each
//!     m02_bridge.py
//!     main.py           dispatcher choosing a mission variant
//!   run02/
//!     ...
//! ```
//!
//! ## Building
//! ```ignore
//! use std::path::Path;
//! use hubweave::{compiler, project::Project};
//!
//! let project = Project::discover(Path::new("robot"), "setup.py")?;
//! let program = compiler::assemble(&project)?;
//! ```
//!
//! ## Overview of the pipeline
//! Every file is read into a `Source`, lexed into logical lines,
//! stripped of its entry guard and setup imports, then spliced:
//! missions into per-run factory functions, each followed by a
//! namespace binding, and the dispatcher last, its mission imports
//! linked against those bindings. The menu program adds a fixed
//! runtime shell; `runtime` holds a host-side model of that shell.

pub mod common;
pub mod compiler;
pub mod construct;
pub mod project;
pub mod runtime;

pub use common::Source;
pub use compiler::Syntax;
pub use project::{BuildError, Project};

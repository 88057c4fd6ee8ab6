use std::{fmt, path::PathBuf};

use crate::compiler::syntax::Syntax;

/// Everything that can stop a build.
/// Every variant names the path at fault; no output is
/// written once any of these has been raised.
#[derive(Debug)]
pub enum BuildError {
    /// A required file or directory is missing.
    NotFound { path: PathBuf, reason: String },
    /// The file exists but couldn't be read.
    Io { path: PathBuf, message: String },
    /// A source file couldn't be lexed.
    Syntax(Syntax),
    /// The file was read fine but can't be used as asked.
    Invalid { path: PathBuf, reason: String },
}

impl BuildError {
    pub fn not_found(path: impl Into<PathBuf>, reason: &str) -> BuildError {
        BuildError::NotFound {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> BuildError {
        BuildError::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }

    pub fn invalid(path: impl Into<PathBuf>, reason: &str) -> BuildError {
        BuildError::Invalid {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<Syntax> for BuildError {
    fn from(syntax: Syntax) -> BuildError {
        BuildError::Syntax(syntax)
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::NotFound { path, reason } => {
                write!(f, "{} in `{}`", reason, path.display())
            },
            BuildError::Io { path, message } => {
                write!(f, "Could not read `{}`: {}", path.display(), message)
            },
            BuildError::Syntax(syntax) => write!(f, "{}", syntax),
            BuildError::Invalid { path, reason } => {
                write!(f, "`{}`: {}", path.display(), reason)
            },
        }
    }
}

impl std::error::Error for BuildError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_the_path() {
        let error = BuildError::not_found("robot/run03", "No dispatcher file `main.py`");
        assert_eq!(error.to_string(), "No dispatcher file `main.py` in `robot/run03`");

        let error = BuildError::invalid("run01/8ball.py", "mission names must be identifiers");
        assert_eq!(error.to_string(), "`run01/8ball.py`: mission names must be identifiers");
    }
}

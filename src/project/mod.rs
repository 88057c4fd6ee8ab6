//! Finds and reads the files of a robot project:
//! numbered run directories, each holding mission files,
//! an optional setup snippet and a dispatcher.

pub mod error;
pub mod mission;
pub mod run;

use std::{
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

pub use error::BuildError;
pub use mission::MissionFile;
pub use run::{is_run_name, normalize_run_name, RunDirectory};

use crate::common::source::Source;

/// Reads the project-wide setup snippet, if there is one.
pub fn shared_setup(root: &Path, file: &str) -> Result<Option<Rc<Source>>, BuildError> {
    let path = root.join(file);
    if !path.is_file() {
        return Ok(None);
    }
    Source::path(&path)
        .map(Some)
        .map_err(|e| BuildError::io(&path, e))
}

#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    /// Sorted by directory name.
    pub runs: Vec<RunDirectory>,
    pub setup: Option<Rc<Source>>,
    /// Free-form project description for the output header.
    pub label: Option<String>,
}

impl Project {
    /// Loads every `run<digits>` directory directly under `root`.
    pub fn discover(root: &Path, setup: &str) -> Result<Project, BuildError> {
        let entries = fs::read_dir(root)
            .map_err(|_| BuildError::not_found(root, "No readable project directory"))?;

        let mut paths = vec![];
        for entry in entries {
            let path = entry.map_err(|e| BuildError::io(root, e))?.path();
            let named = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(is_run_name)
                .unwrap_or(false);
            if named && path.is_dir() {
                paths.push(path);
            }
        }

        if paths.is_empty() {
            return Err(BuildError::not_found(root, "No run directories (`run01`, `run02`, ...)"));
        }
        paths.sort();

        let runs = paths
            .iter()
            .map(|path| RunDirectory::load(path))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Project {
            root: root.to_owned(),
            runs,
            setup: shared_setup(root, setup)?,
            label: None,
        })
    }

    pub fn run_names(&self) -> Vec<&str> {
        self.runs.iter().map(|r| r.name.as_str()).collect()
    }

    /// Run keys follow name order; this reports when that
    /// differs from numeric order, e.g. `run10` before `run9`.
    pub fn ordering_warning(&self) -> Option<String> {
        let numbers: Vec<Option<u64>> = self.runs.iter().map(|r| r.number()).collect();
        let mut sorted = numbers.clone();
        sorted.sort();

        if numbers == sorted {
            return None;
        }
        Some(format!(
            "Run directories are ordered by name: {:?}; zero-pad their numbers to keep the menu in numeric order",
            self.run_names(),
        ))
    }
}

use std::{
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    common::source::Source,
    construct::link::LinkTable,
    project::{error::BuildError, mission::MissionFile},
};

pub const DISPATCHER: &str = "main";
pub const SETUP: &str = "setup";
pub const EXTENSION: &str = "py";
pub const RUN_PREFIX: &str = "run";

/// Whether a directory name has the `run<digits>` shape.
pub fn is_run_name(name: &str) -> bool {
    match name.strip_prefix(RUN_PREFIX) {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Accepts `run01`, `RUN1`, `01` or `1` and returns the zero-padded
/// directory name `run01`. Anything else is returned as given.
pub fn normalize_run_name(arg: &str) -> String {
    let text = arg.trim();
    let lower = text.to_ascii_lowercase();
    let digits = lower.strip_prefix(RUN_PREFIX).unwrap_or(&lower);

    match digits.parse::<u64>() {
        Ok(number) if digits.chars().all(|c| c.is_ascii_digit()) => {
            format!("{}{:02}", RUN_PREFIX, number)
        },
        _ => text.to_string(),
    }
}

fn read(path: &Path) -> Result<Rc<Source>, BuildError> {
    Source::path(path).map_err(|e| BuildError::io(path, e))
}

/// One numbered run: its missions, an optional setup snippet,
/// and the dispatcher choosing between the missions.
#[derive(Debug, Clone)]
pub struct RunDirectory {
    pub name: String,
    pub path: PathBuf,
    /// Sorted by file name.
    pub missions: Vec<MissionFile>,
    pub setup: Option<Rc<Source>>,
    pub dispatcher: Rc<Source>,
    /// Source files left out on purpose, e.g. `_helpers.py`.
    pub skipped: Vec<PathBuf>,
}

impl RunDirectory {
    /// Reads every file of a run directory.
    /// Fails if there is no mission or no dispatcher.
    pub fn load(path: &Path) -> Result<RunDirectory, BuildError> {
        let entries = fs::read_dir(path)
            .map_err(|_| BuildError::not_found(path, "No readable run directory"))?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
            .ok_or_else(|| BuildError::invalid(path, "run directories need a UTF-8 name"))?;

        let mut files = vec![];
        for entry in entries {
            let file = entry.map_err(|e| BuildError::io(path, e))?.path();
            let is_source = file.extension().map(|x| x == EXTENSION).unwrap_or(false);
            if file.is_file() && is_source {
                files.push(file);
            }
        }
        files.sort();

        let mut dispatcher = None;
        let mut setup = None;
        let mut missions = vec![];
        let mut skipped = vec![];

        for file in files {
            match file.file_stem().and_then(|s| s.to_str()) {
                Some(DISPATCHER) => dispatcher = Some(read(&file)?),
                Some(SETUP) => setup = Some(read(&file)?),
                Some(stem) if stem.starts_with('_') => skipped.push(file),
                _ => missions.push(MissionFile::read(&file)?),
            }
        }

        if missions.is_empty() {
            return Err(BuildError::not_found(path, "No mission files"));
        }

        let dispatcher = dispatcher.ok_or_else(|| {
            BuildError::not_found(path, &format!("No dispatcher file `{}.{}`", DISPATCHER, EXTENSION))
        })?;

        Ok(RunDirectory {
            name,
            path: path.to_owned(),
            missions,
            setup,
            dispatcher,
            skipped,
        })
    }

    /// The names the dispatcher's mission imports are linked against.
    pub fn link_table(&self) -> LinkTable {
        LinkTable::new(self.missions.iter().map(|m| m.name.clone()))
    }

    pub fn mission(&self, name: &str) -> Option<&MissionFile> {
        self.missions.iter().find(|m| m.name == name)
    }

    /// The union of every mission's declared globals, sorted.
    pub fn globals(&self) -> Vec<String> {
        let mut globals: Vec<String> = self
            .missions
            .iter()
            .flat_map(|m| m.globals.iter().cloned())
            .collect();
        globals.sort();
        globals.dedup();
        globals
    }

    /// The numeric suffix of the directory name.
    pub fn number(&self) -> Option<u64> {
        self.name.strip_prefix(RUN_PREFIX)?.parse().ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn run_names() {
        assert!(is_run_name("run01"));
        assert!(is_run_name("run7"));
        assert!(!is_run_name("run"));
        assert!(!is_run_name("run_template"));
        assert!(!is_run_name("runs"));
        assert!(!is_run_name("Run01"));
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_run_name("run01"), "run01");
        assert_eq!(normalize_run_name("RUN1"), "run01");
        assert_eq!(normalize_run_name("01"), "run01");
        assert_eq!(normalize_run_name(" 3 "), "run03");
        assert_eq!(normalize_run_name("12"), "run12");
        assert_eq!(normalize_run_name("runs/run02"), "runs/run02");
        assert_eq!(normalize_run_name("-1"), "-1");
    }
}

use std::{path::Path, rc::Rc};

use crate::{
    common::source::Source,
    compiler::{
        extract,
        rewrite::{self, Rewritten},
    },
    construct::token::is_identifier,
    project::error::BuildError,
};

/// One mission file, read and analysed once per build.
/// Its stem becomes the name its namespace is bound to.
#[derive(Debug, Clone)]
pub struct MissionFile {
    pub name: String,
    pub rewritten: Rewritten,
    /// Sorted, unique, public top-level names.
    pub exports: Vec<String>,
    /// Every name declared `global` anywhere in the file.
    pub globals: Vec<String>,
}

impl MissionFile {
    pub fn read(path: &Path) -> Result<MissionFile, BuildError> {
        let source = Source::path(path).map_err(|e| BuildError::io(path, e))?;
        MissionFile::analyze(source)
    }

    pub fn analyze(source: Rc<Source>) -> Result<MissionFile, BuildError> {
        let name = match source.stem() {
            Some(stem) if is_identifier(stem) => stem.to_string(),
            _ => {
                return Err(BuildError::invalid(
                    &source.path,
                    "mission file names must be valid identifiers to be bound",
                ))
            },
        };

        let rewritten = rewrite::mission(source)?;
        let exports = extract::exports(&rewritten.script);
        let globals = extract::globals(&rewritten.script);

        Ok(MissionFile {
            name,
            rewritten,
            exports,
            globals,
        })
    }

    /// Whether the file had a direct-execution guard.
    pub fn guarded(&self) -> bool {
        !self.rewritten.entry.is_empty()
    }

    pub fn exports(&self, name: &str) -> bool {
        self.exports.iter().any(|e| e == name)
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::*;

    fn mission(path: &str, text: &str) -> Result<MissionFile, BuildError> {
        MissionFile::analyze(Source::new(text, &PathBuf::from(path)))
    }

    #[test]
    fn analysis() {
        let text = "\
from pybricks.tools import wait
import setup
stop_logging = False

async def run(hub, robot, left_wheel, right_wheel, left_lift, right_lift):
    await robot.straight(200)

async def sensor_logger_task(hub, robot, left_wheel, right_wheel):
    global stop_logging
    while not stop_logging:
        await wait(200)

if __name__ == \"__main__\":
    from pybricks.tools import run_task
    run_task(run(*setup.initialize_robot()))
";
        let mission = mission("run01/m01.py", text).unwrap();
        assert_eq!(mission.name, "m01");
        assert_eq!(mission.exports, vec!["run", "sensor_logger_task", "stop_logging"]);
        assert_eq!(mission.globals, vec!["stop_logging"]);
        assert!(mission.guarded());
        assert!(mission.exports("run"));
        assert!(!mission.rewritten.text().contains("setup"));
    }

    #[test]
    fn rejects_unbindable_names() {
        let error = mission("run01/8ball.py", "x = 1\n").unwrap_err();
        assert!(matches!(error, BuildError::Invalid { .. }));
    }

    #[test]
    fn surfaces_syntax_errors() {
        let error = mission("run01/m02.py", "def run(:\n").unwrap_err();
        assert!(matches!(error, BuildError::Syntax(_)));
    }
}

//! Single-run assembly: one run directory as one flat script,
//! without factories or the menu. Used to try a run, or a single
//! mission of it, straight from the host.

use std::rc::Rc;

use crate::{
    common::source::Source,
    compiler::{bind, block, emit::Emitter, extract, shell},
    project::{error::BuildError, run::RunDirectory},
};

/// What to assemble, and how.
#[derive(Debug, Clone, Copy)]
pub struct Flat<'a> {
    pub run: &'a RunDirectory,
    /// Used when the run has no setup snippet of its own.
    pub shared_setup: Option<&'a Rc<Source>>,
    /// Forces this mission to be the active variant.
    pub mission: Option<&'a str>,
    pub label: Option<&'a str>,
}

impl<'a> Flat<'a> {
    pub fn new(run: &'a RunDirectory) -> Flat<'a> {
        Flat {
            run,
            shared_setup: None,
            mission: None,
            label: None,
        }
    }

    pub fn assemble(&self) -> Result<String, BuildError> {
        let run = self.run;
        if let Some(mission) = self.mission {
            if run.mission(mission).is_none() {
                return Err(BuildError::not_found(
                    &run.path,
                    &format!("No mission `{}` to force", mission),
                ));
            }
        }

        let mut emitter = Emitter::new();
        shell::header(
            &mut emitter,
            &format!("Single-run program for {}", run.name),
            self.label,
            &[run.name.as_str()],
        );
        let missions: Vec<&str> = run.missions.iter().map(|m| m.name.as_str()).collect();
        emitter.line(&format!("# Missions: {}", missions.join(", ")));
        if let Some(mission) = self.mission {
            emitter.line(&format!("# Forced mission: {}", mission));
        }
        emitter.blank();
        bind::namespace_class(&mut emitter);
        emitter.blank();

        block::mission_sections(&mut emitter, run);
        if let Some(setup) = run.setup.as_ref().or(self.shared_setup) {
            block::setup_section(&mut emitter, setup)?;
        }
        let dispatcher = block::dispatcher_section(&mut emitter, run)?;

        if let Some(mission) = self.mission {
            emitter.line("# ---- mission override ----");
            emitter.line(&format!("CURRENT_MISSION = \"{}\"", mission));
            emitter.line(&format!("ACTIVE_VARIANT = \"{}\"", mission));
            emitter.block("try:", |e| e.line(&format!("VARIANTS[\"{}\"] = {}", mission, mission)));
            emitter.block("except NameError:", |e| e.line("pass"));
        }

        emitter.line("# ---- entry ----");
        match dispatcher.entry_script()? {
            Some(entry) => emitter.script(&entry),
            None if extract::exports(&dispatcher.script).iter().any(|e| e == "main") => {
                emitter.block("if __name__ == \"__main__\":", |e| e.line("main()"));
            },
            None => {
                emitter.block("if __name__ == \"__main__\":", |e| {
                    e.line("from pybricks.tools import run_task");
                    e.line("run_task(run(*initialize_robot()))");
                });
            },
        }

        Ok(emitter.finish())
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::*;
    use crate::compiler::block::test::{run, DISPATCHER, LOGGING_MISSION};

    fn two_missions() -> RunDirectory {
        run(
            "run04",
            &[("m08.py", LOGGING_MISSION), ("m12.py", "IS_CURRENT = True\nasync def run(*h):\n    pass\n")],
            None,
            "\
import m08 as _variant_m08
import m12 as _variant_m12
import setup
VARIANTS = {\"m08\": _variant_m08, \"m12\": _variant_m12}
ACTIVE_VARIANT = \"m08\"

def main():
    hub = setup.initialize_robot()
",
        )
    }

    #[test]
    fn flat_layout() {
        let run = two_missions();
        let text = Flat::new(&run).assemble().unwrap();

        assert!(text.contains("# Missions: m08, m12\n"));
        assert!(text.contains("\nstop_logging = False\n"));
        assert!(text.contains("_variant_m12 = m12\n"));
        assert!(text.contains("    hub = initialize_robot()\n"));
        assert!(text.ends_with("# ---- entry ----\nif __name__ == \"__main__\":\n    main()\n"));
        assert!(!text.contains("def _make_"));
        assert!(!text.contains("CURRENT_MISSION"));
    }

    #[test]
    fn forced_mission() {
        let run = two_missions();
        let mut flat = Flat::new(&run);
        flat.mission = Some("m12");
        let text = flat.assemble().unwrap();

        assert!(text.contains("# Forced mission: m12\n"));
        assert!(text.contains(
            "CURRENT_MISSION = \"m12\"\nACTIVE_VARIANT = \"m12\"\ntry:\n    VARIANTS[\"m12\"] = m12\nexcept NameError:\n    pass\n"
        ));
        // every mission is still spliced
        assert!(text.contains("# ---- mission binding: m08 ----"));
    }

    #[test]
    fn unknown_forced_mission() {
        let run = two_missions();
        let mut flat = Flat::new(&run);
        flat.mission = Some("m99");
        assert!(matches!(flat.assemble(), Err(BuildError::NotFound { .. })));
    }

    #[test]
    fn keeps_the_dispatcher_guard() {
        let run = run("run01", &[("m01.py", LOGGING_MISSION)], None, DISPATCHER);
        let text = Flat::new(&run).assemble().unwrap();
        assert!(text.ends_with(
            "# ---- entry ----\nif __name__ == \"__main__\":\n    run_task(run(*initialize_robot()))\n"
        ));
    }

    #[test]
    fn shared_setup_fallback() {
        let run = run("run02", &[("m02.py", "async def run(*h):\n    pass\n")], None, "pass\n");
        let setup = Source::new("def initialize_robot():\n    return ()\n", &PathBuf::from("setup.py"));
        let mut flat = Flat::new(&run);
        flat.shared_setup = Some(&setup);
        let text = flat.assemble().unwrap();

        assert!(text.contains("# ---- setup ----\ndef initialize_robot():\n"));
        assert!(text.ends_with("    from pybricks.tools import run_task\n    run_task(run(*initialize_robot()))\n"));
    }
}

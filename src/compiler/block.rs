//! Builds one run directory into a factory function.
//! Calling the factory executes the run's spliced code in a fresh
//! scope and returns the `(setup, entry)` pair the menu launches.

use std::rc::Rc;

use crate::{
    common::source::Source,
    compiler::{
        bind,
        emit::Emitter,
        extract,
        rewrite::{self, Rewritten},
        syntax::Syntax,
    },
    project::run::RunDirectory,
    runtime::entry::GRACE_MS,
};

/// The run handles, in the order the setup call returns them.
pub const HANDLES: [&str; 6] = ["hub", "robot", "left_wheel", "right_wheel", "left_lift", "right_lift"];

/// How many handles a sensor logger takes.
pub const LOGGER_HANDLES: usize = 4;

pub const LOGGER: &str = "sensor_logger_task";
pub const STOP_FLAG: &str = "stop_logging";

pub fn factory_name(run: &RunDirectory) -> String {
    format!("_make_{}", run.name)
}

fn handles(count: usize) -> String {
    HANDLES[..count]
        .iter()
        .map(|h| format!("ctx.{}", h))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Splices each mission followed by its binding block.
pub fn mission_sections(emitter: &mut Emitter, run: &RunDirectory) {
    for mission in run.missions.iter() {
        if mission.globals.is_empty() {
            emitter.line(&format!("# ---- mission: {} ----", mission.name));
        } else {
            emitter.line(&format!(
                "# ---- mission: {} (globals: {}) ----",
                mission.name,
                mission.globals.join(", "),
            ));
        }
        emitter.script(&mission.rewritten.script);
        bind::binding(emitter, &mission.name, &mission.exports);
    }
}

/// Splices a setup snippet, minus its guard.
pub fn setup_section(emitter: &mut Emitter, setup: &Rc<Source>) -> Result<(), Syntax> {
    emitter.line("# ---- setup ----");
    emitter.script(&rewrite::library(Rc::clone(setup))?);
    Ok(())
}

/// Splices the dispatcher, its mission imports linked to the bindings above.
pub fn dispatcher_section(emitter: &mut Emitter, run: &RunDirectory) -> Result<Rewritten, Syntax> {
    let rewritten = rewrite::dispatcher(Rc::clone(&run.dispatcher), &run.link_table())?;
    emitter.line("# ---- main ----");
    emitter.script(&rewritten.script);
    Ok(rewritten)
}

/// Resolves the active variant when the entry starts:
/// the dispatcher's own table and names if it has them,
/// else the run's missions, the first being the default.
fn active_variant(emitter: &mut Emitter, run: &RunDirectory) {
    let names: Vec<&str> = run.missions.iter().map(|m| m.name.as_str()).collect();
    let table: Vec<String> = names.iter().map(|n| format!("\"{}\": {}", n, n)).collect();
    let default = names.first().copied().unwrap_or_default();

    emitter.line(&format!("_MISSIONS = {{{}}}", table.join(", ")));
    emitter.block("def _active_variant():", |e| {
        let fallbacks = [
            ("table", "VARIANTS", "_MISSIONS".to_string()),
            ("override", "CURRENT_MISSION", "None".to_string()),
            ("default", "ACTIVE_VARIANT", format!("\"{}\"", default)),
        ];
        for (local, name, fallback) in fallbacks.iter() {
            e.block("try:", |e| e.line(&format!("{} = {}", local, name)));
            e.block("except NameError:", |e| e.line(&format!("{} = {}", local, fallback)));
        }
        e.line("return _select_variant(table, override, default)");
    });
}

/// Where the stop flag a logger polls is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagScope {
    /// Declared `global` by a mission.
    Global,
    /// A top-level name of a mission, so a local of the factory.
    Factory,
    /// Only reachable as an attribute of the variant.
    Attribute,
}

impl FlagScope {
    fn of(run: &RunDirectory, globals: &[String]) -> FlagScope {
        if globals.iter().any(|g| g == STOP_FLAG) {
            FlagScope::Global
        } else if run.missions.iter().any(|m| m.exports(STOP_FLAG)) {
            FlagScope::Factory
        } else {
            FlagScope::Attribute
        }
    }
}

/// The entry point: the timed run, raced against or joined with
/// the variant's logger when it has one.
fn run_entry(emitter: &mut Emitter, flag: FlagScope) {
    emitter.block("async def _run_entry(ctx):", |e| {
        e.line("variant = _active_variant()");
        e.line(&format!("logger = getattr(variant, \"{}\", None)", LOGGER));
        e.line(&format!("has_stop_flag = hasattr(variant, \"{}\")", STOP_FLAG));
        e.blank();
        e.block("async def timed_run():", |e| {
            e.line(&format!("await run({})", handles(HANDLES.len())));
        });
        e.blank();

        let logger = format!("logger({})", handles(LOGGER_HANDLES));
        e.block("if logger is None:", |e| e.line("await timed_run()"));
        e.block("elif has_stop_flag:", |e| {
            e.block("async def wrapped_run():", |e| {
                e.line("await timed_run()");
                match flag {
                    FlagScope::Global => {
                        e.line(&format!("global {}", STOP_FLAG));
                        e.line(&format!("{} = True", STOP_FLAG));
                    },
                    FlagScope::Factory => {
                        e.line(&format!("nonlocal {}", STOP_FLAG));
                        e.line(&format!("{} = True", STOP_FLAG));
                        e.line(&format!("variant.{} = True", STOP_FLAG));
                    },
                    FlagScope::Attribute => e.line(&format!("variant.{} = True", STOP_FLAG)),
                }
                e.line(&format!("await wait({})", GRACE_MS));
            });
            e.line(&format!("await multitask({}, wrapped_run())", logger));
        });
        e.block("else:", |e| {
            e.line(&format!("await multitask({}, timed_run(), race=True)", logger));
        });
    });
}

/// Emits the whole factory function for one run.
pub fn factory(emitter: &mut Emitter, run: &RunDirectory) -> Result<(), Syntax> {
    let dispatcher_globals = extract::globals(&rewrite::library(Rc::clone(&run.dispatcher))?);
    let mut globals = run.globals();
    globals.extend(dispatcher_globals);
    globals.sort();
    globals.dedup();

    emitter.line(&format!("def {}():", factory_name(run)));
    emitter.enter_scope();
    emitter.line(&format!("# Auto-generated from {}", run.name));
    if !globals.is_empty() {
        emitter.line(&format!("global {}", globals.join(", ")));
    }

    mission_sections(emitter, run);
    if let Some(setup) = &run.setup {
        setup_section(emitter, setup)?;
    }
    dispatcher_section(emitter, run)?;

    emitter.line("# ---- run entry ----");
    active_variant(emitter, run);
    run_entry(emitter, FlagScope::of(run, &globals));
    emitter.line("return RunBundle(initialize_robot, _run_entry)");
    emitter.exit_scope();
    Ok(())
}

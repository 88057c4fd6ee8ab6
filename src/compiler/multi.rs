use crate::{
    compiler::{block, emit::Emitter, shell},
    project::{error::BuildError, Project},
};

/// Assembles every run of a project into one menu program.
/// Runs get keys `1..=N` in directory-name order.
pub fn assemble(project: &Project) -> Result<String, BuildError> {
    if project.runs.is_empty() {
        return Err(BuildError::not_found(&project.root, "No run directories"));
    }

    let mut emitter = Emitter::new();
    shell::header(
        &mut emitter,
        "Menu program: select a run on the hub",
        project.label.as_deref(),
        &project.run_names(),
    );
    shell::prelude(&mut emitter);

    if let Some(setup) = &project.setup {
        emitter.blank();
        emitter.blank();
        block::setup_section(&mut emitter, setup)?;
    }

    for run in project.runs.iter() {
        emitter.blank();
        emitter.blank();
        block::factory(&mut emitter, run)?;
    }

    emitter.blank();
    emitter.blank();
    shell::registry(&mut emitter, &project.runs);
    emitter.blank();
    emitter.blank();
    shell::runtime(&mut emitter);

    Ok(emitter.finish())
}

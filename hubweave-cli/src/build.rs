use std::{
    fs,
    path::{Path, PathBuf},
};

use hubweave::{compiler, Project};

use crate::{cli, manifest::Manifest, status::Status};

/// Writes a generated program, creating its directory if needed.
pub fn write(path: &Path, program: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Could not create `{}`: {}", parent.display(), e))?;
        }
    }
    fs::write(path, program).map_err(|e| format!("Could not write `{}`: {}", path.display(), e))
}

/// Lists a run's `_*.py` files, which no build splices in.
pub fn warn_skipped(run: &str, files: &[PathBuf]) {
    if files.is_empty() {
        return;
    }
    let names: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
    Status::skipped().report(&format!("{} private files in {}", names.len(), run), &names);
}

/// Assembles every run under `root` into one menu program at `output`.
pub fn build_menu(manifest: &Manifest, root: &Path, output: &Path) -> Result<(), String> {
    let mut project = Project::discover(root, &manifest.build.setup).map_err(|e| e.to_string())?;
    project.label = manifest.label();

    for run in project.runs.iter() {
        warn_skipped(&run.name, &run.skipped);
    }
    if let Some(warning) = project.ordering_warning() {
        Status::warn().log(&warning);
    }

    let program = compiler::assemble(&project).map_err(|e| e.to_string())?;
    write(output, &program)?;

    Status::generated().log(&format!(
        "{} with runs: {:?}",
        output.display(),
        project.run_names(),
    ));
    Ok(())
}

pub fn build(args: cli::Build) -> Result<(), String> {
    let (manifest, root) = Manifest::find(&args.project.path)?;
    let output = manifest.output(args.output, &root);
    build_menu(&manifest, &root, &output)
}

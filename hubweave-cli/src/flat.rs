use std::path::{Path, PathBuf};

use hubweave::{
    compiler::Flat,
    project::{normalize_run_name, shared_setup, RunDirectory},
};

use crate::{
    build::{warn_skipped, write},
    cli,
    manifest::Manifest,
    status::Status,
};

/// A run argument is either a directory or a run name under `root`.
pub fn run_dir(root: &Path, run: &str) -> PathBuf {
    let given = Path::new(run);
    if given.is_dir() {
        given.to_owned()
    } else {
        root.join(normalize_run_name(run))
    }
}

/// Assembles one run directory into a flat program at `output`,
/// optionally forcing one of its missions.
pub fn build_flat(
    manifest: &Manifest,
    root: &Path,
    dir: &Path,
    mission: Option<&str>,
    output: &Path,
) -> Result<(), String> {
    let run = RunDirectory::load(dir).map_err(|e| e.to_string())?;
    warn_skipped(&run.name, &run.skipped);

    let setup = shared_setup(root, &manifest.build.setup).map_err(|e| e.to_string())?;
    let label = manifest.label();

    let mut flat = Flat::new(&run);
    flat.shared_setup = setup.as_ref();
    flat.mission = mission;
    flat.label = label.as_deref();

    let program = flat.assemble().map_err(|e| e.to_string())?;
    write(output, &program)?;

    Status::generated().log(&format!("{} with runs: {:?}", output.display(), [&run.name]));
    if let Some(mission) = mission {
        Status::info().log(&format!("Mission `{}` is forced", mission));
    }
    Ok(())
}

pub fn flat(args: cli::Flat) -> Result<(), String> {
    let (manifest, root) = Manifest::find(&args.project)?;
    let dir = run_dir(&root, &args.run);
    let output = manifest.output(args.output, &root);
    build_flat(&manifest, &root, &dir, args.mission.as_deref(), &output)
}

use std::path::PathBuf;

use hubweave::Project;

use crate::{build::warn_skipped, manifest::Manifest, status::Status};

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

fn yes(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Prints what a build would see in each run directory.
pub fn inspect(path: PathBuf) -> Result<(), String> {
    let (manifest, root) = Manifest::find(&path)?;
    let project = Project::discover(&root, &manifest.build.setup).map_err(|e| e.to_string())?;

    if let Some(setup) = &project.setup {
        println!("shared setup: {}", setup.path.display());
    }
    for run in project.runs.iter() {
        println!("{} ({})", run.name, run.path.display());
        println!("  setup: {}", yes(run.setup.is_some()));
        for mission in run.missions.iter() {
            println!("  {}", mission.name);
            println!("    exports: {}", list(&mission.exports));
            println!("    globals: {}", list(&mission.globals));
            println!("    guard:   {}", yes(mission.guarded()));
        }
        warn_skipped(&run.name, &run.skipped);
    }

    if let Some(warning) = project.ordering_warning() {
        Status::warn().log(&warning);
    }
    Ok(())
}

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Command,
};

use hubweave::project::{is_run_name, run};

use crate::{build, cli, flat, manifest::Manifest, status::Status};

/// A mission file inside a run directory, as `(run directory, mission)`.
fn mission_in_run(file: &Path) -> Option<(PathBuf, String)> {
    let dir = file.parent()?;
    let run_name = dir.file_name()?.to_str()?;
    let stem = file.file_stem()?.to_str()?;
    let is_source = file.extension().map(|x| x == run::EXTENSION).unwrap_or(false);

    let reserved = stem == run::DISPATCHER || stem == run::SETUP || stem.starts_with('_');
    if is_run_name(run_name) && is_source && !reserved {
        Some((dir.to_owned(), stem.to_string()))
    } else {
        None
    }
}

fn missing(tool: &str) -> String {
    format!("The deployment tool `{}` could not be found; install it or set `deploy.tool`", tool)
}

/// Asks the tool whether it can upload without starting the program.
fn supports_no_start(tool: &str) -> Result<bool, String> {
    let output = Command::new(tool)
        .args(["run", "ble", "--help"])
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => missing(tool),
            _ => format!("Could not run `{}`: {}", tool, e),
        })?;

    let help = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );
    Ok(help.contains("--no-start"))
}

/// Sends one program file to the hub over Bluetooth.
fn send(tool: &str, file: &Path, hub: &str, start_now: bool) -> Result<(), String> {
    let mut command = Command::new(tool);
    command.args(["run", "ble"]);

    if !start_now {
        if supports_no_start(tool)? {
            command.arg("--no-start");
        } else {
            Status::warn().log(&format!(
                "`{}` does not support --no-start; the program starts right away",
                tool,
            ));
        }
    }
    command.arg(file).args(["--name", hub]);

    Status::info().log(&format!("Sending {} to \"{}\"", file.display(), hub));
    let status = command.status().map_err(|e| match e.kind() {
        ErrorKind::NotFound => missing(tool),
        _ => format!("Could not run `{}`: {}", tool, e),
    })?;

    if !status.success() {
        return Err(format!("`{}` failed ({})", tool, status));
    }
    Status::sent().log(&format!("{} to \"{}\"", file.display(), hub));
    Ok(())
}

pub fn deploy(args: cli::Deploy) -> Result<(), String> {
    let (manifest, root) = Manifest::find(&args.project.path)?;

    if let Some(id) = &args.run_id {
        Status::warn().log(&format!(
            "--run-id {} is deprecated and ignored; runs are picked on the hub",
            id,
        ));
    }

    let output = manifest.output(args.output, &root);
    let file = match args.run {
        None => {
            build::build_menu(&manifest, &root, &output)?;
            output
        },
        Some(target) if target.is_dir() => {
            flat::build_flat(&manifest, &root, &target, None, &output)?;
            output
        },
        Some(target) if target.is_file() => match mission_in_run(&target) {
            Some((dir, mission)) => {
                flat::build_flat(&manifest, &root, &dir, Some(&mission), &output)?;
                output
            },
            None => target,
        },
        Some(target) => {
            return Err(format!("`{}` is neither a run directory nor a file", target.display()));
        },
    };

    if args.build_only {
        Status::info().log("Built only; nothing was sent");
        return Ok(());
    }

    let hub = args.hub.unwrap_or_else(|| manifest.deploy.hub.clone());
    send(&manifest.deploy.tool, &file, &hub, args.start_now)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mission_files() {
        assert_eq!(
            mission_in_run(Path::new("robot/run02/m03.py")),
            Some((PathBuf::from("robot/run02"), "m03".to_string())),
        );
        assert_eq!(mission_in_run(Path::new("robot/run02/main.py")), None);
        assert_eq!(mission_in_run(Path::new("robot/run02/_notes.py")), None);
        assert_eq!(mission_in_run(Path::new("robot/hub_main.py")), None);
        assert_eq!(mission_in_run(Path::new("robot/run02/m03.txt")), None);
    }
}

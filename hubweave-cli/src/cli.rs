use std::{env::current_dir, ffi::OsStr, path::PathBuf};

use structopt::StructOpt;

/// `.` becomes the absolute working directory, so the manifest
/// search has parents to walk up through.
pub fn project_dir(path: &OsStr) -> PathBuf {
    if path == "." {
        current_dir().unwrap_or_else(|_| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}

#[derive(StructOpt, Debug)]
pub struct Project {
    #[structopt(default_value = ".", parse(from_os_str = project_dir))]
    pub path: PathBuf,
}

#[derive(StructOpt, Debug)]
pub struct Build {
    #[structopt(flatten)]
    pub project: Project,
    /// Where to write the program, instead of the manifest's `output`
    #[structopt(short, long, parse(from_os_str))]
    pub output: Option<PathBuf>,
}

#[derive(StructOpt, Debug)]
pub struct Flat {
    /// `run01`, `01`, `1`, or the path of a run directory
    pub run: String,
    /// Forces this mission to be the active one
    #[structopt(short, long)]
    pub mission: Option<String>,
    #[structopt(short, long, parse(from_os_str))]
    pub output: Option<PathBuf>,
    #[structopt(long, default_value = ".", parse(from_os_str = project_dir))]
    pub project: PathBuf,
}

#[derive(StructOpt, Debug)]
pub struct Deploy {
    #[structopt(flatten)]
    pub project: Project,
    #[structopt(short, long, parse(from_os_str))]
    pub output: Option<PathBuf>,
    /// Bluetooth name of the hub
    #[structopt(long)]
    pub hub: Option<String>,
    /// Starts the program as soon as it is uploaded
    #[structopt(long)]
    pub start_now: bool,
    /// Builds without sending anything
    #[structopt(long)]
    pub build_only: bool,
    /// A run directory, a mission file inside one, or any program file
    #[structopt(long, parse(from_os_str))]
    pub run: Option<PathBuf>,
    /// Deprecated: runs are picked on the hub
    #[structopt(long)]
    pub run_id: Option<String>,
}

#[derive(StructOpt, Debug)]
#[structopt(name = "Hubweave", bin_name = "hubweave", about)]
pub enum Hubweave {
    /// Builds every run into one menu program
    Build(Build),
    /// Builds a single run into a flat program
    Flat(Flat),
    /// Builds, then sends the program to the hub
    Deploy(Deploy),
    /// Lists the runs and missions of a project
    Inspect(Project),
    /// Writes a default manifest
    Init(Project),
}

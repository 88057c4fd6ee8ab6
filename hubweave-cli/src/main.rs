use std::process;

use structopt::StructOpt;

// argument parser and configuation
pub mod cli;
pub mod manifest;
pub mod status;

// command implementations
pub mod build;
pub mod deploy;
pub mod flat;
pub mod init;
pub mod inspect;

use crate::{cli::Hubweave, status::Status};

pub const MANIFEST: &str = "hubweave.toml";

fn main() {
    let subcommand = Hubweave::from_args();

    let result = match subcommand {
        Hubweave::Build(args) => build::build(args),
        Hubweave::Flat(args) => flat::flat(args),
        Hubweave::Deploy(args) => deploy::deploy(args),
        Hubweave::Inspect(project) => inspect::inspect(project.path),
        Hubweave::Init(project) => init::init(project.path),
    };

    if let Err(r) = result {
        Status::fatal().log(&r);
        process::exit(1);
    }
}

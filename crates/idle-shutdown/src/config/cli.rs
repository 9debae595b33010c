use std::path::PathBuf;

use clap::{Parser, Subcommand};
use utils::logging::LOG_PATH_ENV_VAR;
use utils::version;

use crate::config::check::CheckArgs;
use crate::config::run::RunArgs;

#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = LOG_PATH_ENV_VAR,
        value_hint = clap::ValueHint::DirPath,
        help = "Directory for daily rotated log files, in addition to stderr"
    )]
    pub log_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the GPUs and power off after a sustained idle period
    Run(RunArgs),
    /// Print the processes on every GPU and the current idle verdict
    Check(CheckArgs),
}

use std::time::Duration;

use clap::Parser;

use crate::config::parse_duration;
use crate::config::IgnoreArgs;

#[derive(Debug, Clone, Parser)]
pub struct RunArgs {
    #[command(flatten)]
    pub ignore: IgnoreArgs,

    #[arg(
        short = 'n',
        long,
        env = "GPU_IDLE_INTERVAL",
        default_value = "10s",
        value_parser = parse_duration,
        help = "Time between two GPU checks, e.g. 10s"
    )]
    pub interval: Duration,

    #[arg(
        short = 't',
        long,
        env = "GPU_IDLE_TIMEOUT",
        default_value = "15m",
        value_parser = parse_duration,
        help = "How long the GPUs may stay idle before the host is powered off, e.g. 15m"
    )]
    pub timeout: Duration,

    #[arg(
        long,
        env = "GPU_IDLE_DRY_RUN",
        help = "Log instead of powering off when the timeout is exceeded"
    )]
    pub dry_run: bool,
}

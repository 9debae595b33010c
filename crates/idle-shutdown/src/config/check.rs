use clap::Parser;

use crate::config::IgnoreArgs;

#[derive(Debug, Clone, Parser)]
pub struct CheckArgs {
    #[command(flatten)]
    pub ignore: IgnoreArgs,
}

//! Command layer - entry points for the CLI subcommands

pub mod check;
pub mod run;

pub use check::run_check;
pub use run::run_monitor;

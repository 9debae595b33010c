pub mod check;
pub mod cli;
pub mod run;

use std::time::Duration;

use clap::Args;
use error_stack::Report;

use crate::error::IdleError;
use crate::error::IdleResult;
use crate::matcher::IgnoreList;
use crate::matcher::PatternSyntax;

pub use check::CheckArgs;
pub use cli::*;
pub use run::RunArgs;

/// Ignore list options shared by every command.
#[derive(Debug, Clone, Args)]
pub struct IgnoreArgs {
    #[arg(
        short = 'i',
        long = "ignore",
        value_name = "PATTERN",
        env = "GPU_IDLE_IGNORE",
        value_delimiter = ',',
        help = "Process name that never counts as GPU work, e.g. Xorg; repeatable or comma list"
    )]
    pub patterns: Vec<String>,

    #[arg(
        long,
        value_enum,
        env = "GPU_IDLE_PATTERN_SYNTAX",
        default_value_t = PatternSyntax::Regex,
        help = "How ignore patterns are interpreted"
    )]
    pub pattern_syntax: PatternSyntax,
}

impl IgnoreArgs {
    pub fn compile(&self) -> IdleResult<IgnoreList> {
        IgnoreList::compile(&self.patterns, self.pattern_syntax)
    }
}

/// Immutable monitor settings, validated before the monitor starts.
#[derive(Debug)]
pub struct MonitorConfig {
    pub ignore: IgnoreList,
    pub interval: Duration,
    pub timeout: Duration,
}

impl TryFrom<&RunArgs> for MonitorConfig {
    type Error = Report<IdleError>;

    fn try_from(args: &RunArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            ignore: args.ignore.compile()?,
            interval: args.interval,
            timeout: args.timeout,
        })
    }
}

/// Parses a human readable, non-zero duration such as `10s` or `1h30m`.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let duration = humantime::parse_duration(value).map_err(|e| e.to_string())?;
    if duration.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    fn run_args(patterns: &[&str], pattern_syntax: PatternSyntax) -> RunArgs {
        RunArgs {
            ignore: IgnoreArgs {
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
                pattern_syntax,
            },
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(900),
            dry_run: false,
        }
    }

    #[test]
    fn parses_go_style_durations() {
        assert_eq!(parse_duration("10s"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_duration("15m"), Ok(Duration::from_secs(900)));
        assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ten seconds").is_err());
    }

    #[test]
    fn monitor_config_compiles_patterns() {
        let config = MonitorConfig::try_from(&run_args(&["Xorg"], PatternSyntax::Regex))
            .expect("valid pattern");

        assert!(config.ignore.is_ignored("/usr/lib/xorg/Xorg"));
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.timeout, Duration::from_secs(900));
    }

    #[test]
    fn monitor_config_rejects_malformed_pattern() {
        let err = MonitorConfig::try_from(&run_args(&["Xorg", "(gnome"], PatternSyntax::Regex))
            .expect_err("unbalanced group should be rejected");

        assert!(matches!(
            err.current_context(),
            IdleError::Pattern { pattern, .. } if pattern == "(gnome"
        ));
    }
}

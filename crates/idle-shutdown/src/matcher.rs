//! Process name matching for the ignore list.
//!
//! A process whose name matches any configured pattern never counts towards a
//! busy GPU. Patterns are compiled once, when the list is built, so a malformed
//! pattern is reported before any device is queried.

use clap::ValueEnum;
use derive_more::Display;
use error_stack::Report;
use regex::Regex;

use crate::error::IdleError;
use crate::error::IdleResult;

/// Decides whether a process name should be ignored.
pub trait NameMatcher {
    fn is_match(&self, name: &str) -> bool;
}

/// How ignore patterns are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Display)]
pub enum PatternSyntax {
    /// Unanchored regular expression; anchor with `^`/`$` for full matches
    #[default]
    #[display("regex")]
    Regex,
    /// Shell wildcard matched against the whole name
    #[display("glob")]
    Glob,
    /// Literal name
    #[display("exact")]
    Exact,
}

impl NameMatcher for Regex {
    fn is_match(&self, name: &str) -> bool {
        Regex::is_match(self, name)
    }
}

impl NameMatcher for glob::Pattern {
    fn is_match(&self, name: &str) -> bool {
        self.matches(name)
    }
}

/// Matches one literal process name.
#[derive(Debug, Clone)]
pub struct ExactName(pub String);

impl NameMatcher for ExactName {
    fn is_match(&self, name: &str) -> bool {
        self.0 == name
    }
}

/// Compiled ignore patterns; a name is ignored when any of them matches.
pub struct IgnoreList {
    patterns: Vec<String>,
    matchers: Vec<Box<dyn NameMatcher + Send + Sync>>,
}

impl IgnoreList {
    pub fn compile<S: AsRef<str>>(patterns: &[S], syntax: PatternSyntax) -> IdleResult<Self> {
        let mut matchers: Vec<Box<dyn NameMatcher + Send + Sync>> =
            Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let pattern = pattern.as_ref();
            let matcher: Box<dyn NameMatcher + Send + Sync> = match syntax {
                PatternSyntax::Regex => Box::new(
                    Regex::new(pattern).map_err(|e| invalid_pattern(pattern, e.to_string()))?,
                ),
                PatternSyntax::Glob => Box::new(
                    glob::Pattern::new(pattern)
                        .map_err(|e| invalid_pattern(pattern, e.to_string()))?,
                ),
                PatternSyntax::Exact => Box::new(ExactName(pattern.to_string())),
            };
            matchers.push(matcher);
        }

        Ok(Self {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            matchers,
        })
    }

    /// An ignore list that ignores nothing.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            matchers: Vec::new(),
        }
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.matchers.iter().any(|m| m.is_match(name))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl NameMatcher for IgnoreList {
    fn is_match(&self, name: &str) -> bool {
        self.is_ignored(name)
    }
}

impl std::fmt::Debug for IgnoreList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgnoreList")
            .field("patterns", &self.patterns)
            .finish()
    }
}

fn invalid_pattern(pattern: &str, reason: String) -> Report<IdleError> {
    Report::new(IdleError::Pattern {
        pattern: pattern.to_string(),
        reason,
    })
}

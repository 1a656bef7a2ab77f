//! Pipeline configuration, read once from the environment at startup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum proof age in seconds.
pub const DEFAULT_FRESHNESS_WINDOW_SECS: i64 = 600;

/// Default tolerance for timestamps ahead of the server clock.
pub const DEFAULT_MAX_CLOCK_SKEW_SECS: i64 = 60;

/// What to do when a reply target cannot be found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyPolicy {
    /// Refuse the submission.
    #[default]
    Reject,
    /// Log a warning and publish anyway.
    LogAndProceed,
}

impl ReplyPolicy {
    /// Configuration value.
    pub fn as_str(self) -> &'static str {
        match self {
            ReplyPolicy::Reject => "reject",
            ReplyPolicy::LogAndProceed => "log-and-proceed",
        }
    }
}

impl fmt::Display for ReplyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplyPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "reject" => Ok(ReplyPolicy::Reject),
            "log-and-proceed" | "log" => Ok(ReplyPolicy::LogAndProceed),
            other => Err(ConfigError::Invalid {
                var: "ANONCAST_REPLY_POLICY",
                value: other.to_string(),
            }),
        }
    }
}

/// Validation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Maximum age of a proof timestamp.
    pub freshness_window_secs: i64,
    /// How far ahead of the server clock a timestamp may be.
    pub max_clock_skew_secs: i64,
    /// Handling of unresolvable reply targets.
    pub reply_policy: ReplyPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: DEFAULT_FRESHNESS_WINDOW_SECS,
            max_clock_skew_secs: DEFAULT_MAX_CLOCK_SKEW_SECS,
            reply_policy: ReplyPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from environment variables.
    ///
    /// Variables:
    /// - `ANONCAST_FRESHNESS_WINDOW_SECS` (default: 600)
    /// - `ANONCAST_MAX_CLOCK_SKEW_SECS` (default: 60)
    /// - `ANONCAST_REPLY_POLICY` (`reject` | `log-and-proceed`, default: `reject`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            freshness_window_secs: env_secs(
                "ANONCAST_FRESHNESS_WINDOW_SECS",
                defaults.freshness_window_secs,
            )?,
            max_clock_skew_secs: env_secs(
                "ANONCAST_MAX_CLOCK_SKEW_SECS",
                defaults.max_clock_skew_secs,
            )?,
            reply_policy: match std::env::var("ANONCAST_REPLY_POLICY") {
                Ok(v) if !v.trim().is_empty() => v.parse()?,
                _ => defaults.reply_policy,
            },
        })
    }
}

fn env_secs(var: &'static str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => parse_secs(var, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_secs(var: &'static str, raw: &str) -> Result<i64, ConfigError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|v| *v >= 0)
        .ok_or_else(|| ConfigError::Invalid {
            var,
            value: raw.to_string(),
        })
}

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable holds an unusable value.
    #[error("invalid value for {var}: \"{value}\"")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Rejected value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.freshness_window_secs, 600);
        assert_eq!(cfg.max_clock_skew_secs, 60);
        assert_eq!(cfg.reply_policy, ReplyPolicy::Reject);
    }

    #[test]
    fn reply_policy_parses_variants() {
        assert_eq!("reject".parse::<ReplyPolicy>(), Ok(ReplyPolicy::Reject));
        assert_eq!(
            "LOG_AND_PROCEED".parse::<ReplyPolicy>(),
            Ok(ReplyPolicy::LogAndProceed)
        );
        assert!("ignore".parse::<ReplyPolicy>().is_err());
    }

    #[test]
    fn seconds_must_be_non_negative_integers() {
        assert_eq!(parse_secs("X", "120"), Ok(120));
        assert!(parse_secs("X", "-1").is_err());
        assert!(parse_secs("X", "ten").is_err());
    }
}

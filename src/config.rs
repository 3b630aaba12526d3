//! Tunables for archive behavior and restore pacing.
//!
//! Constructed once per process invocation (never a global singleton, per
//! the anti-singleton guidance) and threaded explicitly into every
//! component that needs it.

use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStrategy {
    OldestFirst,
}

impl Default for CleanupStrategy {
    fn default() -> Self {
        CleanupStrategy::OldestFirst
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub archive_enabled: bool,
    pub archive_max_sessions: u32,
    pub archive_auto_cleanup: bool,
    pub archive_cleanup_strategy: CleanupStrategy,
    pub delay_between_instructions: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_enabled: true,
            archive_max_sessions: 20,
            archive_auto_cleanup: true,
            archive_cleanup_strategy: CleanupStrategy::OldestFirst,
            delay_between_instructions: 0.4,
        }
    }
}

const ARCHIVE_MAX_SESSIONS_BOUNDS: (u32, u32) = (1, 1000);
const DELAY_BOUNDS: (f64, f64) = (0.0, 10.0);

/// A tunable that was present in the environment but out of bounds or
/// unparsable. The caller decides how to surface this (a `Message::warning`
/// on the eventual `OperationResult`, and a `tracing::warn!`).
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub var: &'static str,
    pub raw_value: String,
    pub reason: String,
}

impl Config {
    /// Loads defaults, then applies any valid environment overrides.
    /// Invalid overrides are reported as warnings and the default is kept.
    pub fn from_env() -> (Self, Vec<ConfigWarning>) {
        let mut config = Self::default();
        let mut warnings = Vec::new();

        apply_bool_override(
            &mut config.archive_enabled,
            "ARCHIVE_ENABLED",
            &mut warnings,
        );
        apply_bounded_override(
            &mut config.archive_max_sessions,
            "ARCHIVE_MAX_SESSIONS",
            ARCHIVE_MAX_SESSIONS_BOUNDS,
            &mut warnings,
        );
        apply_bool_override(
            &mut config.archive_auto_cleanup,
            "ARCHIVE_AUTO_CLEANUP",
            &mut warnings,
        );
        apply_bounded_override(
            &mut config.delay_between_instructions,
            "DELAY_BETWEEN_INSTRUCTIONS",
            DELAY_BOUNDS,
            &mut warnings,
        );

        for warning in &warnings {
            tracing::warn!(
                var = warning.var,
                raw_value = %warning.raw_value,
                reason = %warning.reason,
                "ignoring out-of-range environment override"
            );
        }

        (config, warnings)
    }

    /// Validates the bounds invariant that must hold regardless of source
    /// (defaults, env, or a future config file): used by the health check.
    pub fn validate_bounds(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let (lo, hi) = ARCHIVE_MAX_SESSIONS_BOUNDS;
        if self.archive_max_sessions < lo || self.archive_max_sessions > hi {
            problems.push(format!(
                "archive_max_sessions {} out of bounds [{lo},{hi}]",
                self.archive_max_sessions
            ));
        }
        let (lo, hi) = DELAY_BOUNDS;
        if self.delay_between_instructions < lo || self.delay_between_instructions > hi {
            problems.push(format!(
                "delay_between_instructions {} out of bounds [{lo},{hi}]",
                self.delay_between_instructions
            ));
        }
        problems
    }
}

fn apply_bool_override(slot: &mut bool, var: &'static str, warnings: &mut Vec<ConfigWarning>) {
    let Ok(raw) = env::var(var) else {
        return;
    };
    match parse_bool(&raw) {
        Some(value) => *slot = value,
        None => warnings.push(ConfigWarning {
            var,
            raw_value: raw,
            reason: "expected a boolean (true/false/1/0)".to_string(),
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn apply_bounded_override<T>(
    slot: &mut T,
    var: &'static str,
    bounds: (T, T),
    warnings: &mut Vec<ConfigWarning>,
) where
    T: FromStr + PartialOrd + Copy + std::fmt::Display,
{
    let Ok(raw) = env::var(var) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value >= bounds.0 && value <= bounds.1 => *slot = value,
        Ok(value) => warnings.push(ConfigWarning {
            var,
            raw_value: raw,
            reason: format!("{} out of bounds [{}, {}]", value, bounds.0, bounds.1),
        }),
        Err(_) => warnings.push(ConfigWarning {
            var,
            raw_value: raw,
            reason: "not a number".to_string(),
        }),
    }
}

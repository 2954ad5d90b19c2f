/*!
 * Harness Configuration
 *
 * Runtime configuration loaded from SEMTESTER_* environment variables
 */

use super::errors::{HarnessError, HarnessResult};
use crate::ipc::{OpenMode, SemaphoreSettings};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_CHILD_COUNT: &str = "SEMTESTER_CHILD_COUNT";
pub const ENV_SPAWN_DELAY_MS: &str = "SEMTESTER_SPAWN_DELAY_MS";
pub const ENV_HOLD_MS: &str = "SEMTESTER_HOLD_MS";
pub const ENV_SEM_NAME: &str = "SEMTESTER_SEM_NAME";
pub const ENV_SEM_MODE: &str = "SEMTESTER_SEM_MODE";
pub const ENV_SEM_VALUE: &str = "SEMTESTER_SEM_VALUE";
pub const ENV_SEM_OPEN: &str = "SEMTESTER_SEM_OPEN";
pub const ENV_REAP_CHILDREN: &str = "SEMTESTER_REAP_CHILDREN";

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Children forked by the root process
    pub child_count: u32,
    /// Wait after each fork in the parent
    pub spawn_delay: Duration,
    /// How long every process holds its semaphore handle
    pub hold: Duration,
    /// Named semaphore parameters
    pub semaphore: SemaphoreSettings,
    /// Whether the root waits for its children before exiting
    pub reap_children: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            child_count: 5,
            spawn_delay: Duration::from_secs(1),
            hold: Duration::from_secs(60),
            semaphore: SemaphoreSettings::default(),
            reap_children: false,
        }
    }
}

impl HarnessConfig {
    /// Load from the process environment, falling back to defaults
    pub fn from_env() -> HarnessResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> HarnessResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(count) = parse_var(&lookup, ENV_CHILD_COUNT)? {
            config.child_count = count;
        }
        if let Some(ms) = parse_var(&lookup, ENV_SPAWN_DELAY_MS)? {
            config.spawn_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, ENV_HOLD_MS)? {
            config.hold = Duration::from_millis(ms);
        }
        if let Some(name) = lookup(ENV_SEM_NAME) {
            config.semaphore.name = name;
        }
        if let Some(raw) = lookup(ENV_SEM_MODE) {
            config.semaphore.mode = u32::from_str_radix(raw.trim(), 8).map_err(|e| {
                HarnessError::Config(format!("{}={:?} is not an octal mode: {}", ENV_SEM_MODE, raw, e))
            })?;
        }
        if let Some(value) = parse_var(&lookup, ENV_SEM_VALUE)? {
            config.semaphore.initial_value = value;
        }
        if let Some(mode) = parse_var::<OpenMode, _>(&lookup, ENV_SEM_OPEN)? {
            config.semaphore.open_mode = mode;
        }
        if let Some(raw) = lookup(ENV_REAP_CHILDREN) {
            config.reap_children = parse_flag(ENV_REAP_CHILDREN, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_child_count(mut self, count: u32) -> Self {
        self.child_count = count;
        self
    }

    pub fn with_spawn_delay(mut self, delay: Duration) -> Self {
        self.spawn_delay = delay;
        self
    }

    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub fn with_semaphore(mut self, semaphore: SemaphoreSettings) -> Self {
        self.semaphore = semaphore;
        self
    }

    pub fn with_reap_children(mut self, reap: bool) -> Self {
        self.reap_children = reap;
        self
    }

    /// Reject values the OS would misinterpret rather than refuse
    pub fn validate(&self) -> HarnessResult<()> {
        if self.semaphore.name.is_empty() {
            return Err(HarnessError::Config("semaphore name is empty".into()));
        }
        if self.semaphore.name.contains('\0') {
            return Err(HarnessError::Config(
                "semaphore name contains a NUL byte".into(),
            ));
        }
        if self.semaphore.mode > 0o777 {
            return Err(HarnessError::Config(format!(
                "semaphore mode {:o} exceeds 777",
                self.semaphore.mode
            )));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> HarnessResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| HarnessError::Config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(None),
    }
}

fn parse_flag(key: &str, raw: &str) -> HarnessResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(HarnessError::Config(format!(
            "{}={:?} is not a boolean",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = HarnessConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.child_count, 5);
        assert_eq!(config.spawn_delay, Duration::from_secs(1));
        assert_eq!(config.hold, Duration::from_secs(60));
        assert_eq!(config.semaphore.mode, 0o660);
        assert_eq!(config.semaphore.initial_value, 1);
        assert!(!config.reap_children);
    }

    #[test]
    fn test_overrides() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            (ENV_CHILD_COUNT, "2"),
            (ENV_SPAWN_DELAY_MS, "10"),
            (ENV_HOLD_MS, "250"),
            (ENV_SEM_NAME, "/other"),
            (ENV_SEM_MODE, "600"),
            (ENV_SEM_VALUE, "3"),
            (ENV_SEM_OPEN, "exclusive"),
            (ENV_REAP_CHILDREN, "true"),
        ]))
        .unwrap();

        assert_eq!(config.child_count, 2);
        assert_eq!(config.spawn_delay, Duration::from_millis(10));
        assert_eq!(config.hold, Duration::from_millis(250));
        assert_eq!(config.semaphore.name, "/other");
        assert_eq!(config.semaphore.mode, 0o600);
        assert_eq!(config.semaphore.initial_value, 3);
        assert_eq!(config.semaphore.open_mode, OpenMode::Exclusive);
        assert!(config.reap_children);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad = [
            (ENV_CHILD_COUNT, "five"),
            (ENV_HOLD_MS, "-1"),
            (ENV_SEM_MODE, "999"),
            (ENV_SEM_MODE, "1777"),
            (ENV_SEM_OPEN, "sometimes"),
            (ENV_REAP_CHILDREN, "maybe"),
            (ENV_SEM_NAME, ""),
        ];

        for (key, value) in bad {
            let result = HarnessConfig::from_lookup(lookup_from(&[(key, value)]));
            assert!(
                matches!(result, Err(HarnessError::Config(_))),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }
}

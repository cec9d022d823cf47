// SPDX-License-Identifier: MIT
//
// Engine timing and queue configuration.

use std::env;
use std::time::Duration;

pub const TICK_US_VAR: &str = "N_TUI_TICK_US";
pub const DEBOUNCE_MS_VAR: &str = "N_TUI_DEBOUNCE_MS";
pub const EVENT_CAPACITY_VAR: &str = "N_TUI_EVENT_CAPACITY";

/// Timing for the render worker, the reload debouncer and the event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Render tick interval in microseconds. Default: 1000 (1 ms).
    pub tick_interval_us: u64,
    /// Quiet window before a reload runs, in milliseconds. Default: 100.
    pub debounce_ms: u64,
    /// Bound of the input event queue. Default: 10.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_us: 1000,
            debounce_ms: 100,
            event_capacity: 10,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `N_TUI_TICK_US`, `N_TUI_DEBOUNCE_MS` and
    /// `N_TUI_EVENT_CAPACITY`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    /// Unparseable and zero values keep the default.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            tick_interval_us: positive(&lookup, TICK_US_VAR).unwrap_or(defaults.tick_interval_us),
            debounce_ms: positive(&lookup, DEBOUNCE_MS_VAR).unwrap_or(defaults.debounce_ms),
            event_capacity: positive(&lookup, EVENT_CAPACITY_VAR).unwrap_or(defaults.event_capacity),
        }
    }

    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_micros(self.tick_interval_us)
    }

    #[must_use]
    pub const fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    lookup(key)
        .and_then(|value| value.trim().parse::<T>().ok())
        .filter(|value| *value > T::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        EngineConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
        assert_eq!(config.debounce_window(), Duration::from_millis(100));
        assert_eq!(config.event_capacity, 10);
    }

    #[test]
    fn no_vars_gives_defaults() {
        assert_eq!(from(&[]), EngineConfig::default());
    }

    #[test]
    fn vars_override() {
        let config = from(&[
            (TICK_US_VAR, "500"),
            (DEBOUNCE_MS_VAR, " 20 "),
            (EVENT_CAPACITY_VAR, "64"),
        ]);
        assert_eq!(config.tick_interval_us, 500);
        assert_eq!(config.debounce_ms, 20);
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn invalid_and_zero_fall_back() {
        let config = from(&[(TICK_US_VAR, "fast"), (EVENT_CAPACITY_VAR, "0"), (DEBOUNCE_MS_VAR, "-5")]);
        assert_eq!(config, EngineConfig::default());
    }
}

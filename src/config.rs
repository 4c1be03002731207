//! Tap configuration parameters
//!
//! All tunable parameters for the simulator.  Values come from a JSON
//! file (see [`JsonFileConfig`](crate::adapters::json_config::JsonFileConfig))
//! and command-line overrides; missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pour::PourProfile;
use crate::topics::TapTopics;

/// Core tap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    // --- Identity ---
    /// Tap identifier; scopes every topic.
    pub tap_id: String,
    /// Topic prefix, e.g. `tap` → `tap/{id}/cmd`.
    pub topic_prefix: String,

    // --- Pour ---
    /// Ordered weight increments (g) of one simulated pour.
    pub pour_profile: PourProfile,
    /// Delay between increments (milliseconds).
    pub pour_interval_ms: u32,

    // --- Event loop ---
    /// Upper bound on waiting for inbound messages per cycle (milliseconds).
    pub poll_timeout_ms: u32,
    /// Sleep between loop cycles (milliseconds).
    pub idle_sleep_ms: u32,
    /// Messages handled per cycle before the pour is advanced.
    pub max_drain_per_cycle: u16,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            tap_id: "1".into(),
            topic_prefix: "tap".into(),

            pour_profile: PourProfile::default(),
            pour_interval_ms: 500,

            poll_timeout_ms: 100,
            idle_sleep_ms: 50,
            max_drain_per_cycle: 16,
        }
    }
}

impl TapConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tap_id.is_empty() {
            return Err(ConfigError::ValidationFailed("tap_id must not be empty"));
        }
        if self.tap_id.contains(['/', '+', '#']) {
            return Err(ConfigError::ValidationFailed(
                "tap_id must not contain '/', '+' or '#'",
            ));
        }
        if self.topic_prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::ValidationFailed("topic_prefix must not be empty"));
        }
        if self.topic_prefix.contains(['+', '#']) {
            return Err(ConfigError::ValidationFailed(
                "topic_prefix must not contain wildcards",
            ));
        }
        if self.pour_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("pour_interval_ms must be at least 1"));
        }
        if self.poll_timeout_ms > 10_000 {
            return Err(ConfigError::ValidationFailed("poll_timeout_ms must be 0–10000"));
        }
        if self.idle_sleep_ms > 10_000 {
            return Err(ConfigError::ValidationFailed("idle_sleep_ms must be 0–10000"));
        }
        if self.max_drain_per_cycle == 0 {
            return Err(ConfigError::ValidationFailed("max_drain_per_cycle must be at least 1"));
        }
        // Profile contents are validated when the profile is built.
        TapTopics::from_config(self).map(|_| ())
    }
}

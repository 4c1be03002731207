//! Topic layout for one tap.
//!
//! ```text
//!  {prefix}/{id}/cmd          inbound   start | done | reset | display:<text>
//!  {prefix}/{id}/currentUser  inbound   user id at the head of the queue
//!  {prefix}/{id}/status       outbound  idle | pouring | stopped | done
//!  {prefix}/{id}/amount       outbound  cumulative grams, "0" when cleared
//! ```

use core::fmt::Write;

use crate::app::ports::{ConfigError, Topic};
use crate::config::TapConfig;

/// Where an inbound message should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundRoute {
    Command,
    CurrentUser,
    Other,
}

/// Fully expanded topic names for one tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapTopics {
    cmd: Topic,
    current_user: Topic,
    status: Topic,
    amount: Topic,
}

impl TapTopics {
    pub fn new(prefix: &str, tap_id: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.trim_end_matches('/');
        Ok(Self {
            cmd: build(prefix, tap_id, "cmd")?,
            current_user: build(prefix, tap_id, "currentUser")?,
            status: build(prefix, tap_id, "status")?,
            amount: build(prefix, tap_id, "amount")?,
        })
    }

    pub fn from_config(config: &TapConfig) -> Result<Self, ConfigError> {
        Self::new(&config.topic_prefix, &config.tap_id)
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Classify an inbound topic (exact match).
    pub fn route(&self, topic: &str) -> InboundRoute {
        if topic == self.cmd.as_str() {
            InboundRoute::Command
        } else if topic == self.current_user.as_str() {
            InboundRoute::CurrentUser
        } else {
            InboundRoute::Other
        }
    }
}

fn build(prefix: &str, tap_id: &str, leaf: &str) -> Result<Topic, ConfigError> {
    let mut topic = Topic::new();
    write!(topic, "{prefix}/{tap_id}/{leaf}")
        .map_err(|_| ConfigError::ValidationFailed("topic exceeds 96 bytes"))?;
    Ok(topic)
}

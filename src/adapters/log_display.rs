//! Display adapter that writes to the log.
//!
//! The simulator has no screen; text sent to `display:` shows up as a
//! log line instead.

use log::info;

use crate::app::ports::DisplayPort;

#[derive(Debug, Default)]
pub struct LogDisplay;

impl LogDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl DisplayPort for LogDisplay {
    fn show(&mut self, text: &str) {
        info!("Display: {}", text);
    }
}

//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements   | Connects to                      |
//! |----------------|--------------|----------------------------------|
//! | `console`      | MessageBus   | stdin lines in, stdout lines out |
//! | `json_config`  | ConfigPort   | JSON file on disk                |
//! | `log_display`  | DisplayPort  | Log output                       |
//! | `log_sink`     | EventSink    | Log output                       |
//! | `publisher`    | EventSink    | Status / amount topics           |
//! | `time`         | Clock        | `std::time::Instant`             |

pub mod console;
pub mod json_config;
pub mod log_display;
pub mod log_sink;
pub mod publisher;
pub mod time;

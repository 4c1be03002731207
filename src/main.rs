//! Tap simulator main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │  ConsoleBus     TopicPublisher   LogEventSink            │
//! │  (MessageBus)   (EventSink)      (EventSink)             │
//! │  SystemClock    LogDisplay       JsonFileConfig          │
//! │  (Clock)        (DisplayPort)    (ConfigPort)            │
//! │                                                          │
//! │  ──────────────── Port Trait Boundary ───────────────    │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │          TapService (pure logic)               │      │
//! │  │          FSM · PourSimulator                   │      │
//! │  └────────────────────────────────────────────────┘      │
//! │                                                          │
//! │  TapRuntime (cooperative drain / advance loop)           │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

use tapsim::adapters::console::ConsoleBus;
use tapsim::adapters::json_config::JsonFileConfig;
use tapsim::adapters::log_display::LogDisplay;
use tapsim::adapters::time::SystemClock;
use tapsim::config::TapConfig;
use tapsim::pour::PourProfile;
use tapsim::runtime::TapRuntime;

#[derive(Parser)]
#[command(name = "tapsim", version, about = "Networked beverage tap simulator")]
struct Cli {
    /// JSON configuration file; defaults apply when it does not exist.
    #[arg(long, default_value = "tapsim.json", env = "TAPSIM_CONFIG")]
    config: PathBuf,

    /// Tap identifier (overrides the config file).
    #[arg(long, env = "TAPSIM_ID")]
    id: Option<String>,

    /// Topic prefix (overrides the config file).
    #[arg(long, env = "TAPSIM_PREFIX")]
    prefix: Option<String>,

    /// Delay between pour increments in milliseconds.
    #[arg(long, env = "TAPSIM_INTERVAL_MS")]
    interval_ms: Option<u32>,

    /// Pour increments in grams, comma-separated.
    #[arg(long, env = "TAPSIM_PROFILE", value_delimiter = ',')]
    profile: Vec<f64>,

    /// Stop after this many milliseconds instead of waiting for end of input.
    #[arg(long, env = "TAPSIM_RUN_FOR_MS")]
    run_for_ms: Option<u64>,
}

impl Cli {
    fn apply(&self, config: &mut TapConfig) -> Result<()> {
        if let Some(id) = &self.id {
            config.tap_id.clone_from(id);
        }
        if let Some(prefix) = &self.prefix {
            config.topic_prefix.clone_from(prefix);
        }
        if let Some(ms) = self.interval_ms {
            config.pour_interval_ms = ms;
        }
        if !self.profile.is_empty() {
            config.pour_profile =
                PourProfile::new(&self.profile).context("invalid --profile")?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("tapsim v{}", env!("CARGO_PKG_VERSION"));

    let mut config = JsonFileConfig::new(&cli.config)
        .load_or_default()
        .with_context(|| format!("loading {}", cli.config.display()))?;
    cli.apply(&mut config)?;
    config.validate().context("invalid configuration")?;

    let mut runtime = TapRuntime::new(&config)?;
    let mut bus = ConsoleBus::spawn(runtime.topics().cmd()).context("starting console input")?;
    let clock = SystemClock::new();
    let mut display = LogDisplay::new();

    let shutdown = Arc::new(AtomicBool::new(false));
    if let Some(ms) = cli.run_for_ms {
        let flag = Arc::clone(&shutdown);
        std::thread::Builder::new()
            .name("run-timer".into())
            .spawn(move || {
                std::thread::sleep(Duration::from_millis(ms));
                flag.store(true, Ordering::Release);
            })
            .context("starting run timer")?;
    }

    info!(
        "Tap {} ready: {} increments every {} ms",
        config.tap_id,
        config.pour_profile.len(),
        config.pour_interval_ms
    );
    runtime.run(&mut bus, &clock, &mut display, &shutdown)?;
    Ok(())
}

//! Structured logging setup for dockgen
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the embedding application, which may use the helpers here.
//!
//! # Example
//!
//! ```no_run
//! use dockgen::util::logging;
//!
//! // Reads DOCKGEN_LOG_LEVEL and DOCKGEN_LOG_JSON
//! logging::init_from_env();
//!
//! tracing::info!(repository = "acme/shop", "Pipeline started");
//! ```

use crate::config::DockgenConfig;
use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Noisy HTTP stack targets capped at `warn` unless `RUST_LOG` says otherwise
const QUIET_TARGETS: [&str; 3] = ["h2", "hyper", "reqwest"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for `dockgen` targets
    pub level: Level,

    /// Emit one JSON object per event
    pub use_json: bool,

    /// Include the module target (e.g., dockgen::generation) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Include thread ID and name in logs
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with location and thread metadata
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            ..Default::default()
        }
    }

    /// Level taken from the application configuration, console output
    pub fn from_config(config: &DockgenConfig) -> Self {
        Self::with_level(parse_level(&config.log_level).unwrap_or(Level::INFO))
    }

    fn filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::from_default_env();

        if let Ok(directive) = format!("dockgen={}", self.level).parse::<Directive>() {
            filter = filter.add_directive(directive);
        }

        if env::var("RUST_LOG").is_err() {
            for target in QUIET_TARGETS {
                if let Ok(directive) = format!("{}=warn", target).parse::<Directive>() {
                    filter = filter.add_directive(directive);
                }
            }
        }

        filter
    }
}

/// Parses a level name, ignoring case
///
/// ```
/// use dockgen::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
/// assert_eq!(parse_level("verbose"), None);
/// ```
pub fn parse_level(level_str: &str) -> Option<Level> {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Installs the global subscriber.
///
/// Only the first call in a process has any effect. A subscriber installed
/// elsewhere beforehand is left in place.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.filter();

        let result = if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .try_init()
        };

        if let Err(e) = result {
            eprintln!("dockgen: logging not initialised: {}", e);
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Initializes logging from `DOCKGEN_LOG_LEVEL` and `DOCKGEN_LOG_JSON`
pub fn init_from_env() {
    init_logging(config_from_env());
}

fn config_from_env() -> LoggingConfig {
    let level = env::var("DOCKGEN_LOG_LEVEL")
        .ok()
        .and_then(|v| parse_level(&v))
        .unwrap_or(Level::INFO);

    let use_json = env::var("DOCKGEN_LOG_JSON")
        .ok()
        .and_then(|v| v.trim().parse::<bool>().ok())
        .unwrap_or(false);

    LoggingConfig {
        level,
        use_json,
        ..Default::default()
    }
}

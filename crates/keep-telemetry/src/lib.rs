//! # Keep Telemetry
//!
//! Structured logging for Keep services via `tracing-subscriber`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keep_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `KEEP_SERVICE_NAME` | `keep` | Service name in logs |
//! | `KEEP_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `KEEP_CONSOLE_OUTPUT` | `true` | Emit logs |
//! | `KEEP_JSON_LOGS` | `false` (`true` in containers) | JSON formatting |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging, init_test_logging};

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter did not parse.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A global subscriber is already installed.
    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

//! # Logging
//!
//! Console logging on the tracing ecosystem. Output goes to stdout so the
//! relay, monitor and edge processes behave the same under a process
//! supervisor or in a container.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the configured
//! level. `json` format emits one object per line for log shippers; the
//! default `pretty` format is human-readable and uses ANSI colors only on a
//! terminal.

use std::io::IsTerminal;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::Deserialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing(default_level: &str, format: LogFormat) {
    TRACING_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        let use_ansi = std::io::stdout().is_terminal();

        let console_layer = match format {
            LogFormat::Json => fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(false)
                .with_filter(filter)
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(use_ansi)
                .with_filter(filter)
                .boxed(),
        };

        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized");
        } else {
            tracing::debug!(?format, ansi_colors = use_ansi, "Console logging initialized");
        }
    });
}

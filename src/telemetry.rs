use tracing_subscriber::{EnvFilter, fmt};

use crate::config::TelemetryConfig;
use crate::errors::{AppError, AppResult};

// HTTP internals log every connection at debug.
const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn";

/// `RUST_LOG` wins over the configured level when set.
pub fn filter_for(cfg: &TelemetryConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(format!("{},{QUIET_DEPENDENCIES}", cfg.log_level))
        .unwrap_or_else(|_| EnvFilter::new(TelemetryConfig::default().log_level))
}

pub fn init(cfg: &TelemetryConfig) -> AppResult<()> {
    let builder = fmt::fmt().with_env_filter(filter_for(cfg)).with_target(false);
    let installed = if cfg.json {
        builder.json().with_ansi(false).with_current_span(true).try_init()
    } else {
        builder.compact().try_init()
    };
    installed.map_err(|e| AppError::Other(format!("tracing subscriber: {e}")))
}

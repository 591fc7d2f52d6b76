//! `tracing` subscriber setup for binaries and tests embedding worklink.
//!
//! Filtering comes from `WORKLINK_LOG` (standard `EnvFilter` directives),
//! falling back to `worklink=info,warn`, or `worklink=debug,info` when
//! `DEBUG` is set. The output format is `WORKLINK_LOG_FORMAT`, else the user
//! config's `log_format`, else compact.

use std::{env, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::model::ParseEnumError;

pub const LOG_ENV: &str = "WORKLINK_LOG";
pub const LOG_FORMAT_ENV: &str = "WORKLINK_LOG_FORMAT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(ParseEnumError {
                expected: "log format",
                got: s.to_string(),
            }),
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing(configured: Option<LogFormat>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(env::var_os("DEBUG").is_some())));
    let format = resolve_log_format(env::var(LOG_FORMAT_ENV).ok().as_deref(), configured);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = match format {
        LogFormat::Json => registry
            .with(tracing_fmt::layer().json().with_ansi(false))
            .try_init(),
        LogFormat::Compact => registry.with(tracing_fmt::layer().compact()).try_init(),
    };
}

const fn default_directives(debug: bool) -> &'static str {
    if debug {
        "worklink=debug,info"
    } else {
        "worklink=info,warn"
    }
}

/// An unparseable env value falls through to the configured format.
fn resolve_log_format(env_value: Option<&str>, configured: Option<LogFormat>) -> LogFormat {
    env_value
        .and_then(|raw| raw.parse().ok())
        .or(configured)
        .unwrap_or_default()
}

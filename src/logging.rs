// ── Leveled logging facade ────────────────────────────────────────────────────
//
// Six levels: trace, debug, info, warn, error, critical.  The first five are
// the `log` crate's macros; `critical!` is `error!` with a CRITICAL marker so
// it can be filtered on.  All take a format string with `{}` placeholders and
// positional arguments.
//
// The backend is `env_logger`, writing synchronously to stderr.  A process
// gets one global logger; once installed it stays for the life of the process.
// Library code only emits records and never installs a logger on its own.

use std::path::Path;
use std::sync::Once;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use log::{debug, error, info, trace, warn};

/// Log at error level with a `CRITICAL` marker.
///
/// ```
/// widebridge::critical!("lock table corrupted at slot {}", 3);
/// ```
#[macro_export]
macro_rules! critical {
    ($($arg:tt)+) => {
        $crate::__log::error!("CRITICAL: {}", ::std::format_args!($($arg)+))
    };
}

// ── Settings ──────────────────────────────────────────────────────────────────

/// Logger configuration.  Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Global maximum level.
    pub level: LevelFilter,
    /// Extra `env_logger` directives (`RUST_LOG` syntax), applied after
    /// `level`, e.g. `"widebridge::sync=trace"`.
    pub filters: Option<String>,
    /// Prefix each line with a timestamp.
    pub timestamps: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            filters: None,
            timestamps: true,
        }
    }
}

impl LogSettings {
    /// Parse settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Defaults, with `RUST_LOG` (if set and non-empty) as `filters`.
    pub fn from_env() -> Self {
        Self {
            filters: std::env::var("RUST_LOG").ok().filter(|s| !s.is_empty()),
            ..Self::default()
        }
    }
}

// ── Installation ──────────────────────────────────────────────────────────────

fn builder(settings: &LogSettings) -> env_logger::Builder {
    let mut b = env_logger::Builder::new();
    b.filter_level(settings.level);
    if let Some(filters) = settings.filters.as_deref() {
        b.parse_filters(filters);
    }
    if !settings.timestamps {
        b.format_timestamp(None);
    }
    b
}

/// Install the global logger.
///
/// Fails with [`InteropError::LoggerAlreadySet`] if this process already has
/// one (from an earlier call or from another crate).
///
/// [`InteropError::LoggerAlreadySet`]: crate::InteropError::LoggerAlreadySet
pub fn init(settings: &LogSettings) -> Result<()> {
    builder(settings).try_init()?;
    log::debug!("logger installed (level {})", settings.level);
    Ok(())
}

/// Install a logger configured from the environment, at most once.
///
/// Later calls do nothing.  If some other logger is already in place it is
/// left alone.
pub fn init_default() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if let Err(e) = init(&LogSettings::from_env()) {
            log::debug!("default logger not installed: {}", e);
        }
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────

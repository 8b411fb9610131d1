//! Store configuration loaded via OrthoConfig.
//!
//! Values come from `CAUSEWAY_*` environment variables; command-line flags
//! handled by the binary override them.

use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;

/// Data directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = "causeway-data";

/// Output style of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable multi-line output.
    #[default]
    Pretty,
}

/// A log format name that is neither `json` nor `pretty`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log format {value:?}; expected \"json\" or \"pretty\"")]
pub struct UnknownLogFormat {
    /// Rejected value.
    pub value: String,
}

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(UnknownLogFormat {
                value: value.to_owned(),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        })
    }
}

/// Configuration values controlling where and how the store runs.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CAUSEWAY")]
pub struct StoreSettings {
    /// Directory holding one JSON file per collection.
    pub data_dir: Option<String>,
    /// Keep everything in memory and persist nothing.
    #[ortho_config(default = false)]
    pub ephemeral: bool,
    /// `json` or `pretty`.
    pub log_format: Option<String>,
}

impl StoreSettings {
    /// Return the configured data directory, falling back to the default.
    pub fn data_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))
    }

    /// Return the configured log format, falling back to pretty output.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownLogFormat`] for any value other than `json` or
    /// `pretty`.
    pub fn log_format(&self) -> Result<LogFormat, UnknownLogFormat> {
        self.log_format
            .as_deref()
            .map_or(Ok(LogFormat::default()), LogFormat::from_str)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for store configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> StoreSettings {
        StoreSettings::load_from_iter([OsString::from("causeway")]).expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env([
            ("CAUSEWAY_DATA_DIR", None::<String>),
            ("CAUSEWAY_EPHEMERAL", None::<String>),
            ("CAUSEWAY_LOG_FORMAT", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert!(!settings.ephemeral);
        assert_eq!(settings.data_dir(), Utf8PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(settings.log_format(), Ok(LogFormat::Pretty));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("CAUSEWAY_DATA_DIR", Some("/tmp/causeway".to_owned())),
            ("CAUSEWAY_EPHEMERAL", Some("true".to_owned())),
            ("CAUSEWAY_LOG_FORMAT", Some("JSON".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert!(settings.ephemeral);
        assert_eq!(settings.data_dir(), Utf8PathBuf::from("/tmp/causeway"));
        assert_eq!(settings.log_format(), Ok(LogFormat::Json));
    }

    #[rstest]
    #[case("xml")]
    #[case("")]
    fn unknown_log_formats_are_rejected(#[case] value: &str) {
        let error = LogFormat::from_str(value).expect_err("unknown format");
        assert_eq!(error.value, value);
    }
}

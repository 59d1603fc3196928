use log::LevelFilter;
use simplelog::*;
use std::fs::File;
use std::path::PathBuf;

/// Logging configuration for the Plume TUI application
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Master switch to enable/disable all logging
    pub enabled: bool,
    /// Path to the log file
    pub log_file: PathBuf,
    /// Whether to clear the log file on startup
    pub clear_on_startup: bool,
    /// Feature flags for specific logging categories
    pub features: LogFeatures,
    /// Overall log level
    pub level: LevelFilter,
}

/// Feature flags for specific logging categories.
///
/// Each flag matches a log target. Library code logs with `target: "..."`
/// directly; disabled targets are filtered out when the logger is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFeatures {
    /// Requests sent by the API client
    pub api_calls: bool,
    /// Feed pages, cursors and filter changes
    pub pagination: bool,
    /// Optimistic like toggles
    pub likes: bool,
    /// Log key events
    pub key_events: bool,
    /// Log rendering operations
    pub rendering: bool,
    /// Log general debug messages
    pub general: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_file: PathBuf::from("plume_debug.log"),
            clear_on_startup: true,
            features: LogFeatures::default(),
            level: LevelFilter::Info,
        }
    }
}

impl Default for LogFeatures {
    fn default() -> Self {
        Self {
            api_calls: true,
            pagination: true,
            likes: true,
            key_events: false,
            rendering: false,
            general: true,
        }
    }
}

impl LogFeatures {
    fn all(enabled: bool) -> Self {
        Self {
            api_calls: enabled,
            pagination: enabled,
            likes: enabled,
            key_events: enabled,
            rendering: enabled,
            general: enabled,
        }
    }

    /// Targets whose feature flag is off
    pub fn disabled_targets(&self) -> Vec<&'static str> {
        [
            ("api_calls", self.api_calls),
            ("pagination", self.pagination),
            ("likes", self.likes),
            ("key_events", self.key_events),
            ("rendering", self.rendering),
            ("general", self.general),
        ]
        .into_iter()
        .filter(|(_, enabled)| !enabled)
        .map(|(target, _)| target)
        .collect()
    }
}

impl LogConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Only errors and warnings
    pub fn minimal() -> Self {
        Self {
            level: LevelFilter::Warn,
            features: LogFeatures::all(false),
            ..Default::default()
        }
    }

    /// Every category at trace level (`--verbose`)
    pub fn verbose() -> Self {
        Self {
            level: LevelFilter::Trace,
            features: LogFeatures::all(true),
            ..Default::default()
        }
    }

    pub fn with_log_file(mut self, log_file: impl Into<PathBuf>) -> Self {
        self.log_file = log_file.into();
        self
    }
}

/// Initialize the logging system with the given configuration.
///
/// The terminal owns stdout, so everything goes to the log file.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    if !config.enabled {
        let _ = WriteLogger::init(LevelFilter::Off, Config::default(), std::io::sink());
        return Ok(());
    }

    if config.clear_on_startup {
        let _ = File::create(&config.log_file)?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let mut builder = ConfigBuilder::new();
    builder.set_time_format_rfc3339();
    let builder = match builder.set_time_offset_to_local() {
        Ok(builder) => builder,
        Err(builder) => builder,
    };
    for target in config.features.disabled_targets() {
        builder.add_filter_ignore_str(target);
    }

    WriteLogger::init(config.level, builder.build(), log_file)?;

    log::info!(
        "Logging initialized: file={}, level={:?}",
        config.log_file.display(),
        config.level
    );
    log::debug!("Log features: {:?}", config.features);

    Ok(())
}

/// Macro for logging key events
#[macro_export]
macro_rules! log_key_event {
    ($config:expr, $($arg:tt)*) => {
        if $config.enabled && $config.features.key_events {
            log::debug!(target: "key_events", $($arg)*);
        }
    };
}

/// Macro for logging rendering operations
#[macro_export]
macro_rules! log_rendering {
    ($config:expr, $($arg:tt)*) => {
        if $config.enabled && $config.features.rendering {
            log::trace!(target: "rendering", $($arg)*);
        }
    };
}

/// Macro for logging pagination decisions made outside the feed loader
#[macro_export]
macro_rules! log_pagination {
    ($config:expr, $($arg:tt)*) => {
        if $config.enabled && $config.features.pagination {
            log::debug!(target: "pagination", $($arg)*);
        }
    };
}

/// Macro for general debug logging
#[macro_export]
macro_rules! log_debug {
    ($config:expr, $($arg:tt)*) => {
        if $config.enabled && $config.features.general {
            log::debug!(target: "general", $($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hides_noisy_targets() {
        let targets = LogConfig::default().features.disabled_targets();
        assert_eq!(targets, vec!["key_events", "rendering"]);
    }

    #[test]
    fn test_verbose_enables_everything() {
        let config = LogConfig::verbose();
        assert_eq!(config.level, LevelFilter::Trace);
        assert!(config.features.disabled_targets().is_empty());
    }

    #[test]
    fn test_minimal_only_warnings() {
        let config = LogConfig::minimal();
        assert_eq!(config.level, LevelFilter::Warn);
        assert_eq!(config.features.disabled_targets().len(), 6);
    }
}

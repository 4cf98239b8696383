//! Logging configuration for scoped-injector
//!
//! Every event the crate emits uses the `scoped_injector` target and is
//! recorded inside the span of the injector that produced it. This module
//! installs a `tracing-subscriber` to print them.
//!
//! # Features
//!
//! - `logging` - Emit events (default)
//! - `logging-json` - JSON structured output
//! - `logging-pretty` - Colorful multi-line output
//!
//! Without one of the two output features the `init*` functions do nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use scoped_injector::logging;
//!
//! // JSON if logging-json, pretty if logging-pretty
//! logging::init();
//!
//! // Or configure it
//! logging::builder()
//!     .trace()
//!     .injector_only()
//!     .compact()
//!     .init();
//!
//! // Or read SCOPED_INJECTOR_LOG, e.g. "trace" or "scoped_injector=debug,warn"
//! logging::LoggingBuilder::from_env().init();
//! ```

use tracing::Level;

/// Target of every event emitted by this crate
pub const TARGET: &str = "scoped_injector";

/// Environment variable read by [`LoggingBuilder::from_env`]
pub const ENV_VAR: &str = "SCOPED_INJECTOR_LOG";

/// Logging format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging
    #[default]
    Json,
    /// Pretty colorful output
    Pretty,
    /// Compact single-line output
    Compact,
}

/// Builder for logging configuration
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    directives: Option<String>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
    with_thread_names: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            directives: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
            with_thread_names: false,
        }
    }
}

impl LoggingBuilder {
    /// Create a new logging builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from [`ENV_VAR`].
    ///
    /// A bare level (`"trace"`, `"info"`, ...) sets the level. Anything else is
    /// taken as an `EnvFilter` directive string. Unset means defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_value(std::env::var(ENV_VAR).ok().as_deref())
    }

    fn with_env_value(mut self, value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return self;
        };
        match value.parse::<Level>() {
            Ok(level) => self.level = level,
            Err(_) => self.directives = Some(value.to_owned()),
        }
        self
    }

    /// Set the minimum log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set log level to TRACE (most verbose)
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Set log level to DEBUG
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    /// Set log level to INFO
    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    /// Set log level to WARN
    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    /// Filter to only show logs from a specific target
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show scoped-injector logs
    pub fn injector_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    /// Include file names in log output
    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    /// Include line numbers in log output
    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    /// Include thread IDs in log output
    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    /// Include thread names in log output
    pub fn with_thread_names(mut self) -> Self {
        self.with_thread_names = true;
        self
    }

    /// Use JSON structured logging format
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Use pretty colorful logging format
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Use compact single-line logging format
    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// The `EnvFilter` directive string this configuration installs.
    pub fn filter_directives(&self) -> String {
        match (&self.directives, self.target) {
            (Some(directives), _) => directives.clone(),
            (None, Some(target)) => format!("{}={}", target, self.level),
            (None, None) => self.level.to_string().to_lowercase(),
        }
    }

    /// Install the global subscriber.
    ///
    /// Returns `false` if a global subscriber was already installed.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) -> bool {
        use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

        type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

        let filter = EnvFilter::new(self.filter_directives());
        let base = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_thread_names(self.with_thread_names)
            .with_target(true);

        let layer: BoxedLayer = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => base.json().boxed(),
            // JSON output needs logging-json
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => base.boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
            LogFormat::Compact => base.compact().boxed(),
        };

        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
            .is_ok()
    }

    /// Initialize (no-op when subscriber features not available)
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) -> bool {
        false
    }
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with default settings
///
/// JSON if `logging-json` is enabled, otherwise pretty if `logging-pretty` is.
pub fn init() -> bool {
    if cfg!(feature = "logging-json") {
        init_json()
    } else {
        init_pretty()
    }
}

/// Initialize JSON structured logging at DEBUG
///
/// # Example output
/// ```json
/// {"timestamp":"2026-01-01T00:00:00.000Z","level":"DEBUG","fields":{"message":"Activating provider","provider":"Database"},"target":"scoped_injector"}
/// ```
pub fn init_json() -> bool {
    builder().json().debug().init()
}

/// Initialize pretty colorful logging at DEBUG
pub fn init_pretty() -> bool {
    builder().pretty().debug().init()
}

/// Initialize logging for scoped-injector events only
pub fn init_injector_only() -> bool {
    builder().injector_only().debug().init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = LoggingBuilder::default();
        assert_eq!(builder.level, Level::DEBUG);
        assert_eq!(builder.format, LogFormat::Json);
        assert!(builder.target.is_none());
        assert_eq!(builder.filter_directives(), "debug");
    }

    #[test]
    fn test_builder_chain() {
        let builder = LoggingBuilder::new()
            .trace()
            .pretty()
            .with_file()
            .with_line_number()
            .injector_only();

        assert_eq!(builder.level, Level::TRACE);
        assert_eq!(builder.format, LogFormat::Pretty);
        assert!(builder.with_file);
        assert!(builder.with_line_number);
        assert_eq!(builder.filter_directives(), "scoped_injector=TRACE");
    }

    #[test]
    fn test_env_value() {
        let level = LoggingBuilder::new().with_env_value(Some("warn"));
        assert_eq!(level.level, Level::WARN);
        assert!(level.directives.is_none());

        let directives = LoggingBuilder::new().with_env_value(Some("scoped_injector=trace,info"));
        assert_eq!(directives.filter_directives(), "scoped_injector=trace,info");

        let unset = LoggingBuilder::new().with_env_value(Some("  "));
        assert_eq!(unset.filter_directives(), "debug");
    }
}

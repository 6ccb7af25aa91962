// Logging setup.
// Installs a tracing subscriber whose verbosity follows GHSEARCH_LOG_LEVEL.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Verbosity accepted by `GHSEARCH_LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    None,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "ghsearch=debug",
            LogLevel::Info => "ghsearch=info",
            LogLevel::Warn => "ghsearch=warn",
            LogLevel::Error => "ghsearch=error",
            LogLevel::None => "off",
        }
    }

    /// Level from the environment; unknown values fall back to `Warn`.
    pub fn from_env() -> Self {
        std::env::var("GHSEARCH_LOG_LEVEL")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    /// Each `-v` raises verbosity one step above `self`.
    pub fn raised_by(self, steps: u8) -> Self {
        match (self, steps) {
            (level, 0) => level,
            (LogLevel::Debug, _) => LogLevel::Debug,
            (_, 1) => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "none" | "off" => Ok(LogLevel::None),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::new(level.directive());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("none".parse::<LogLevel>(), Ok(LogLevel::None));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_raised_by_verbosity() {
        assert_eq!(LogLevel::Warn.raised_by(0), LogLevel::Warn);
        assert_eq!(LogLevel::Warn.raised_by(1), LogLevel::Info);
        assert_eq!(LogLevel::Error.raised_by(3), LogLevel::Debug);
        assert_eq!(LogLevel::Debug.raised_by(1), LogLevel::Debug);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init(LogLevel::None);
        init(LogLevel::Debug);
    }
}

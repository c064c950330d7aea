//! Logging setup
//!
//! Human-readable or JSON output on stderr, filtered by `RUST_LOG` when set
//! and by the configured level otherwise.

use crate::config::LoggingConfig;
use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter for `config`
///
/// `RUST_LOG` takes precedence. A bare level such as `info` applies to this
/// crate only, so dependencies stay quiet.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directive = if config.level.contains('=') || config.level.contains(',') {
        config.level.clone()
    } else {
        format!("lexchat={}", config.level)
    };
    Ok(EnvFilter::try_new(directive)?)
}

/// Subscriber used while the configuration itself is being loaded
///
/// Plain output on stderr at the default level, so warnings raised before
/// [`init_logging`] runs are not lost. Install it with
/// [`tracing::subscriber::with_default`].
pub fn bootstrap_subscriber() -> Result<impl tracing::Subscriber + Send + Sync> {
    Ok(tracing_subscriber::registry()
        .with(env_filter(&LoggingConfig::default())?)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr)))
}

/// Initialize the global tracing subscriber
///
/// # Examples
///
/// ```no_run
/// use lexchat::config::LoggingConfig;
/// use lexchat::logging::init_logging;
///
/// init_logging(&LoggingConfig::default()).unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(config)?);

    if config.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing::level_filters::LevelFilter;

    #[test]
    #[serial]
    fn test_env_filter_scopes_bare_level_to_crate() {
        std::env::remove_var("RUST_LOG");
        let filter = env_filter(&LoggingConfig::default()).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    #[serial]
    fn test_env_filter_keeps_full_directives() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig {
            level: "lexchat=debug,reqwest=warn".to_string(),
            json: false,
        };
        let filter = env_filter(&config).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    #[serial]
    fn test_bootstrap_subscriber_enables_crate_warnings() {
        std::env::remove_var("RUST_LOG");
        let subscriber = bootstrap_subscriber().unwrap();
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "lexchat::config", tracing::Level::WARN));
            assert!(!tracing::enabled!(target: "lexchat::config", tracing::Level::DEBUG));
        });
    }

    #[test]
    #[serial]
    fn test_env_filter_rejects_invalid_level() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig {
            level: "lexchat=notalevel".to_string(),
            json: false,
        };
        assert!(env_filter(&config).is_err());
    }
}

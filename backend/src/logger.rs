use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Directive used when `RUST_LOG` is unset. Feed internals log their
/// per-frame detail at `debug`/`trace`, so `info` keeps only lifecycle events.
pub const DEFAULT_FILTER: &str = "info,tower_http=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `APP_ENV=production` selects JSON lines; anything else is human-readable.
    pub fn for_app_env(app_env: Option<&str>) -> Self {
        match app_env {
            Some(env) if env.eq_ignore_ascii_case("production") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

pub fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let base = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry.with(base.json().flatten_event(true)).init(),
        LogFormat::Pretty => registry.with(base.compact()).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_logs_json() {
        assert_eq!(LogFormat::for_app_env(Some("production")), LogFormat::Json);
        assert_eq!(LogFormat::for_app_env(Some("PRODUCTION")), LogFormat::Json);
    }

    #[test]
    fn everything_else_is_pretty() {
        assert_eq!(LogFormat::for_app_env(None), LogFormat::Pretty);
        assert_eq!(LogFormat::for_app_env(Some("dev")), LogFormat::Pretty);
    }
}

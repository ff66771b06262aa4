use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "league_standings=debug,info"
    } else {
        "warn"
    }
}

/// Install the global tracing subscriber. Logs go to stderr so they never mix
/// with standings printed on stdout. `LOG_FORMAT=json` switches to JSON lines.
pub fn init(verbose: bool) {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(verbose).into())
    };

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    let result = if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .try_init()
    };

    // Already installed (e.g. by a test harness); keep the existing one
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

//! Logging initialization.
//!
//! Uses `tracing-subscriber` with an `EnvFilter`. Log output goes to stderr;
//! stdout is reserved for sample output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// `level` is the default filter directive (e.g. "info", "debug",
/// "autolabel_core=trace"). `RUST_LOG` takes precedence when set.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` config section.
///
/// CLI flags only ever raise verbosity or switch to JSON.
pub fn init_from_config(
    config: &autolabel_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let level = effective_level(&config.logging.level, verbose_override);
    let json_format = json_logs_override || config.logging.format.eq_ignore_ascii_case("json");
    init(level, json_format);
}

/// `--verbose` raises anything quieter than debug to debug.
fn effective_level(configured: &str, verbose: bool) -> &str {
    let already_verbose = matches!(configured.to_ascii_lowercase().as_str(), "debug" | "trace");
    if verbose && !already_verbose {
        "debug"
    } else {
        configured
    }
}

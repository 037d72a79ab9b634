use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber; stdout is reserved for command output.
///
/// `-v`/`-vv` take precedence over `RUST_LOG`, which takes precedence over the
/// `warn` default.
pub fn init(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

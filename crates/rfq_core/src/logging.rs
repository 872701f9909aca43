use tracing_subscriber::EnvFilter;

/// Install the process-wide fmt subscriber on stderr.
///
/// Stdout stays reserved for answers so output can be piped. Calling this
/// twice is harmless; the second call keeps the first subscriber.
pub fn init(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber, writing to stderr so that stdout is left
/// to the console sink.
///
/// `levels` is an [`EnvFilter`](tracing_subscriber::EnvFilter) directive.
pub fn init(color: bool, json: bool, levels: &str) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(levels)
        .with_writer(std::io::stderr);

    // Ignore errors when setting, since tests can initialize this
    // multiple times.
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder.with_ansi(color).finish().try_init()
    };
}

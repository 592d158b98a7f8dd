use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Call once from the binary; library code only
/// emits events.
///
/// `RUST_LOG` wins when set. Otherwise `level` applies globally and this
/// crate logs at debug so state transitions are visible.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(level);
        if let Ok(directive) = "avatar_rig=debug".parse() {
            filter = filter.add_directive(directive);
        }
        filter
    });

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_ansi(true),
        )
        .try_init();

    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
        return;
    }

    tracing::info!("logging initialized with level: {}", level);
}

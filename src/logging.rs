use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "signalbourse=info,warn";
const VERBOSE_FILTER: &str = "signalbourse=debug,info";

/// Install the global subscriber: compact records on stderr, filtered by
/// `RUST_LOG` when set. Stdout stays reserved for command output.
///
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init();
}

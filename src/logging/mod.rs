// Tracing setup for the council binary
//
// Logs go to stderr so they never interleave with conversation output on
// stdout. `RUST_LOG` wins over the defaults below when it is set.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "council=info";
const VERBOSE_FILTER: &str = "council=debug";

/// Filter directive used when `RUST_LOG` is unset
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}

/// Install the global subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

//! Log output for the binary and for tests that want to see what the updater does.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use crate::error::{LexError, Result};

static INIT_ONCE: Once = Once::new();

/// Installs a stderr subscriber. `RUST_LOG` takes precedence over `filter`.
/// Only the first call has any effect.
pub fn init(filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(filter)
            .map_err(|e| LexError::Config(format!("invalid log filter '{filter}': {e}")))?,
    };
    INIT_ONCE.call_once(|| {
        // a subscriber installed elsewhere (e.g. by a test harness) is left in place
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
    Ok(())
}

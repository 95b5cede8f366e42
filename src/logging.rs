//! ## Logging Configuration
//!
//! Diagnostic logging is set up automatically at program startup using the `ctor` crate.
//! It is controlled by the `DEBUG_TAXI_ETL` environment variable:
//!
//! - **Disabled** (default): If the variable is unset, empty, or explicitly set to `"0"` or `"false"`,
//!   no subscriber is installed.
//! - **Enabled**: Any other value enables logging to standard error with a maximum level of `DEBUG`.
//!
//! The tagged status lines (`[INFO]`, `[WARN]`, `[PIPELINE]`) printed by the stages are not
//! part of this; see [`crate::status`].
//!
//! ### Usage Example
//!
//! ```sh
//! DEBUG_TAXI_ETL=true taxi-pipeline
//! ```

use ctor::ctor;
use tracing::Level;

/// Returns true if the given value of `DEBUG_TAXI_ETL` turns diagnostic logging on.
pub fn debug_enabled(value: Option<&str>) -> bool {
    value.map_or(false, |v| !(v == "0" || v == "false" || v.is_empty()))
}

#[ctor]
fn set_debug_level() {
    if debug_enabled(std::env::var("DEBUG_TAXI_ETL").ok().as_deref()) {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

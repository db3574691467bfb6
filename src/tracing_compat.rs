//! Optional tracing integration.
//!
//! With the `tracing-integration` feature (on by default) the usual level
//! macros are re-exported from `tracing`. Without it, the same names expand
//! to nothing, so call sites never need their own `cfg` gates.

#[cfg(feature = "tracing-integration")]
pub(crate) use tracing::{debug, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    macro_rules! trace {
        ($($arg:tt)*) => {
            ()
        };
    }
    macro_rules! debug {
        ($($arg:tt)*) => {
            ()
        };
    }
    macro_rules! info {
        ($($arg:tt)*) => {
            ()
        };
    }
    macro_rules! warn {
        ($($arg:tt)*) => {
            ()
        };
    }
    pub(crate) use {debug, info, trace, warn};
}

#[cfg(not(feature = "tracing-integration"))]
pub(crate) use noop::{debug, info, trace, warn};

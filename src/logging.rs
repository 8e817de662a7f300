//! Logging facade
//!
//! The router logs through these macros so the backend is picked by Cargo
//! feature instead of by call site:
//!
//! - `log` (default) forwards to the `log` crate
//! - `tracing` forwards to the `tracing` crate
//!
//! Enable exactly one of them. With neither enabled the macros expand to
//! nothing.
//!
//! ```ignore
//! use chain_router::{debug_log, warn_log};
//!
//! debug_log!("dispatching {}", path);
//! warn_log!("enter chain for '{}' failed: {}", pattern, error);
//! ```

/// Per-handler and per-match detail.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
    };
}

/// Dispatch decisions: matches, misses, halted chains.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    };
}

/// Listener lifecycle: subscribing and unsubscribing.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!($($arg)*);
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
    };
}

/// Chain failures that nobody subscribed to.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
    };
}

/// Error-level logging, for callers of the facade.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!($($arg)*);
        #[cfg(feature = "log")]
        ::log::error!($($arg)*);
    };
}

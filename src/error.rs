//! Error handling for the router
//!
//! Two families of errors exist:
//!
//! - [`RouterError`] is a configuration error raised while declaring routes.
//!   It is a programmer error and surfaces synchronously.
//! - [`NavigationError`] is what a handler hands to its continuation to abort
//!   the rest of its chain. The router wraps it in a [`ChainFailure`] and
//!   delivers it to the error sink registered with `Router::on_error`.

use crate::chain::ChainKind;
use std::fmt;
use std::rc::Rc;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors raised while configuring the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// A route pattern could not be compiled
    InvalidPattern { pattern: String, reason: String },

    /// Handlers were attached to a route after a later route was declared
    RouteOutOfFocus { pattern: String, focused: String },
}

impl RouterError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid route pattern '{}': {}", pattern, reason)
            }
            RouterError::RouteOutOfFocus { pattern, focused } => write!(
                f,
                "Cannot attach handlers to '{}': '{}' was declared after it",
                pattern, focused
            ),
        }
    }
}

impl std::error::Error for RouterError {}

// ============================================================================
// Navigation Errors
// ============================================================================

/// Errors a handler can pass to its continuation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// Work the handler depended on failed (a fetch, a lookup)
    Failed { message: String },

    /// The handler deliberately stopped the chain
    Aborted { reason: String },

    /// A newer navigation started before this chain could continue
    Superseded { generation: u64 },

    /// Custom error
    Custom { message: String },
}

impl NavigationError {
    /// Create a failure error
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Create an abort error
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Check whether the chain was cut short by a newer navigation
    pub fn is_superseded(&self) -> bool {
        matches!(self, NavigationError::Superseded { .. })
    }
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::Failed { message } => write!(f, "Navigation failed: {}", message),
            NavigationError::Aborted { reason } => write!(f, "Navigation aborted: {}", reason),
            NavigationError::Superseded { generation } => {
                write!(f, "Superseded by navigation #{}", generation)
            }
            NavigationError::Custom { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for NavigationError {}

impl From<String> for NavigationError {
    fn from(message: String) -> Self {
        Self::Custom { message }
    }
}

impl From<&str> for NavigationError {
    fn from(message: &str) -> Self {
        Self::Custom {
            message: message.to_string(),
        }
    }
}

// ============================================================================
// Chain Failures
// ============================================================================

/// A chain that stopped because one of its handlers failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainFailure {
    /// Which chain of the route failed
    pub kind: ChainKind,
    /// Pattern of the route owning the chain
    pub pattern: String,
    /// Path of the context the chain ran against
    pub path: String,
    /// The error handed to the continuation
    pub error: NavigationError,
}

impl fmt::Display for ChainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} chain of '{}' failed at {}: {}",
            self.kind, self.pattern, self.path, self.error
        )
    }
}

impl std::error::Error for ChainFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Callback receiving chain failures
pub type ErrorSink = Rc<dyn Fn(&ChainFailure)>;

// ============================================================================
// Tests
// ============================================================================

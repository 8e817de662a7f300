//! # chain-router
//!
//! A client-side navigation router built around handler chains:
//!
//! - **Path Matching** - `/users/:id` parameters and `*` wildcards, first
//!   declared match wins
//! - **Enter/Leave Chains** - ordered handlers per route, sharing one context
//! - **Continuations** - handlers hold a chain open until their `Next` fires,
//!   so asynchronous work fits between two handlers
//! - **History** - push/replace with attached state, back/forward following,
//!   link interception
//! - **Error Reporting** - chain failures go to an error sink or the log
//!
//! # Quick Start
//!
//! ```
//! use chain_router::{Context, MemoryEnvironment, Next, Router};
//!
//! struct User(String);
//!
//! let router = Router::new(MemoryEnvironment::new("/"));
//!
//! router
//!     .on("/users/:name")
//!     .enter(|ctx: &mut Context, next: Next| {
//!         let name = ctx.params["name"].to_string();
//!         ctx.insert(User(name));
//!         next.proceed();
//!     })
//!     .enter_sync(|ctx: &mut Context| {
//!         let user = ctx.get::<User>().unwrap();
//!         assert_eq!(user.0, "alice");
//!     });
//!
//! router.go("/users/alice");
//! assert_eq!(router.environment().current_path(), "/users/alice");
//! ```
//!
//! # Navigation
//!
//! ```
//! use chain_router::{HistoryState, Router};
//!
//! let router = Router::default();
//!
//! // Push a history entry and dispatch it
//! router.go("/profile");
//!
//! // Write history without dispatching
//! router.push_with_state("/draft", HistoryState::new().with("step", 2));
//! router.replace("/login");
//!
//! // Dispatch whatever the environment currently shows
//! router.start();
//! ```
//!
//! # Listening
//!
//! `listen` routes link clicks and follows back/forward events for as long as
//! the returned [`Listener`] lives:
//!
//! ```
//! use chain_router::{MemoryEnvironment, Router};
//!
//! let env = MemoryEnvironment::new("/");
//! let router = Router::new(env.clone());
//! router.on("/app/settings");
//!
//! let listener = router.listen_under("/app", true);
//! assert!(env.click("/app/settings").is_default_prevented());
//! assert!(!env.click("/elsewhere").is_default_prevented());
//!
//! drop(listener);
//! assert!(!env.click("/app/settings").is_default_prevented());
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging (mutually exclusive with `log`)
//! - `cache` (default) - LRU cache for path resolution

#![doc(html_root_url = "https://docs.rs/chain-router/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Cache (optional)
#[cfg(feature = "cache")]
pub mod cache;

// Matching
pub mod matcher;
pub mod params;

// Navigation state
pub mod context;
pub mod environment;
pub mod history;

// Chains and routing
pub mod chain;
pub mod config;
pub mod route;
pub mod router;

// Error handling
pub mod error;

// Re-export main types for convenient access
#[cfg(feature = "cache")]
pub use cache::{CacheStats, RouteCache};
pub use chain::{ChainKind, ChainStatus, Handler, HandlerChain, Next, Scheduler};
pub use config::{RouterConfig, UnmatchedPolicy};
pub use context::{Context, SharedContext};
pub use environment::{
    is_local, resolve_href, Environment, LinkClick, LinkClickCallback, MemoryEnvironment,
    PopState, PopStateCallback, Subscription,
};
pub use error::{ChainFailure, ErrorSink, NavigationError, RouterError};
pub use history::{History, HistoryEntry, HistoryState};
pub use matcher::{PathMatcher, Segment};
pub use params::{Capture, Params, QueryParams};
pub use route::{Route, RouteRef};
pub use router::{Listener, RouteBuilder, Router, WeakRouter};

//! Route definition

use crate::chain::{ChainKind, Handler, HandlerChain};
use crate::error::RouterError;
use crate::matcher::PathMatcher;
use crate::params::Params;
use std::rc::Rc;

/// Shared route handle.
///
/// The router, its cache and the inspection API all hand out `Rc<Route>`;
/// handlers attach through `&self`, so a shared route can still grow.
pub type RouteRef = Rc<Route>;

/// A compiled pattern plus the chains that run when it becomes, and stops
/// being, the current route
///
/// # Example
///
/// ```
/// use chain_router::{ChainKind, Context, Handler, Route};
///
/// let route = Route::declare("/users/:id").unwrap();
/// route.attach(ChainKind::Enter, Handler::sync(|ctx: &mut Context| {
///     assert!(ctx.params.contains("id"));
/// }));
///
/// assert_eq!(route.chain(ChainKind::Enter).len(), 1);
/// assert!(route.matches("/users/1").is_some());
/// ```
pub struct Route {
    matcher: PathMatcher,
    enter: HandlerChain,
    leave: HandlerChain,
}

impl Route {
    /// Compile `pattern` into a route with empty chains
    pub fn declare(pattern: &str) -> Result<Self, RouterError> {
        Ok(Self::with_matcher(PathMatcher::compile(pattern)?))
    }

    /// Build a route around an already compiled matcher
    pub fn with_matcher(matcher: PathMatcher) -> Self {
        Self {
            matcher,
            enter: HandlerChain::new(),
            leave: HandlerChain::new(),
        }
    }

    /// The source pattern
    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    /// The compiled matcher
    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    /// Match a path against this route
    pub fn matches(&self, path: &str) -> Option<Params> {
        self.matcher.extract(path)
    }

    /// Append a handler to one of the chains
    pub fn attach(&self, kind: ChainKind, handler: Handler) {
        self.chain(kind).push(handler);
    }

    /// The enter or the leave chain
    pub fn chain(&self, kind: ChainKind) -> &HandlerChain {
        match kind {
            ChainKind::Enter => &self.enter,
            ChainKind::Leave => &self.leave,
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern())
            .field("enter", &self.enter.len())
            .field("leave", &self.leave.len())
            .finish()
    }
}

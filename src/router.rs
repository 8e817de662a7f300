//! Router
//!
//! The [`Router`] owns an ordered list of routes, the current route and the
//! current context. Every transition goes through [`Router::dispatch`]:
//!
//! 1. a new [`Context`] is built for the path, linked to the current one as
//!    its previous context;
//! 2. the current route's leave chain runs against the previous context;
//! 3. routes are scanned in declaration order and the first match wins;
//! 4. the match becomes the current route and its enter chain runs against
//!    the new context.
//!
//! Navigations started while a chain is running (a redirect from inside a
//! handler, a back event fired by one) are queued and dispatched once the
//! running work returns. The chains they interrupt are halted.

use crate::chain::{ChainKind, Generation, Generations, Handler, Next, RunOptions, Scheduler};
use crate::config::{RouterConfig, UnmatchedPolicy};
use crate::context::{Context, SharedContext};
use crate::environment::{
    is_local, resolve_href, Environment, LinkClick, MemoryEnvironment, PopState, Subscription,
};
use crate::error::{ChainFailure, ErrorSink, RouterError};
use crate::history::HistoryState;
use crate::params::Params;
use crate::route::{Route, RouteRef};
use crate::{debug_log, info_log, trace_log};
use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, RouteCache};
#[cfg(feature = "cache")]
use std::num::NonZeroUsize;

// ============================================================================
// Router
// ============================================================================

struct RouterInner {
    env: Rc<dyn Environment>,
    config: RouterConfig,
    routes: RefCell<Vec<RouteRef>>,
    current_route: RefCell<Option<RouteRef>>,
    current_context: RefCell<Option<SharedContext>>,
    // Keeps the current context's `previous()` link alive
    previous_context: RefCell<Option<SharedContext>>,
    generations: Generations,
    scheduler: Scheduler,
    error_sink: RefCell<Option<ErrorSink>>,
    #[cfg(feature = "cache")]
    cache: Option<RefCell<RouteCache>>,
}

/// Navigation router
///
/// `Router` is a cheap handle; clones share the same routes and state.
///
/// # Example
///
/// ```
/// use chain_router::{Context, MemoryEnvironment, Router};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let router = Router::new(MemoryEnvironment::new("/"));
///
/// let log = seen.clone();
/// router
///     .on("/users/:id")
///     .enter_sync(move |ctx: &mut Context| {
///         log.borrow_mut().push(ctx.params["id"].to_string());
///     });
///
/// router.go("/users/42");
/// assert_eq!(*seen.borrow(), vec!["42"]);
/// ```
#[derive(Clone)]
pub struct Router {
    inner: Rc<RouterInner>,
}

impl Router {
    /// Create a router over `env` with the default configuration
    pub fn new(env: impl Environment + 'static) -> Self {
        Self::with_config(env, RouterConfig::default())
    }

    /// Create a router over `env`
    pub fn with_config(env: impl Environment + 'static, config: RouterConfig) -> Self {
        #[cfg(feature = "cache")]
        let cache = NonZeroUsize::new(config.cache_capacity)
            .map(|capacity| RefCell::new(RouteCache::new(capacity)));

        Self {
            inner: Rc::new(RouterInner {
                env: Rc::new(env),
                config,
                routes: RefCell::new(Vec::new()),
                current_route: RefCell::new(None),
                current_context: RefCell::new(None),
                previous_context: RefCell::new(None),
                generations: Generations::default(),
                scheduler: Scheduler::new(),
                error_sink: RefCell::new(None),
                #[cfg(feature = "cache")]
                cache,
            }),
        }
    }

    /// The environment the router navigates
    pub fn environment(&self) -> &dyn Environment {
        &*self.inner.env
    }

    /// The configuration the router was built with
    pub fn config(&self) -> &RouterConfig {
        &self.inner.config
    }

    /// A handle that does not keep the router alive
    ///
    /// Handlers that navigate should capture this rather than a clone: the
    /// router owns its routes and their handlers, so a captured `Router`
    /// forms a reference cycle and is never dropped.
    pub fn downgrade(&self) -> WeakRouter {
        WeakRouter {
            inner: Rc::downgrade(&self.inner),
        }
    }

    // ------------------------------------------------------------------------
    // Declaration
    // ------------------------------------------------------------------------

    /// Declare a route and return a builder to attach handlers to it
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid. Use `try_on` to handle the error.
    pub fn on(&self, pattern: &str) -> RouteBuilder {
        match self.try_on(pattern) {
            Ok(builder) => builder,
            Err(err) => panic!("{}", err),
        }
    }

    /// Declare a route, returning an error for invalid patterns
    pub fn try_on(&self, pattern: &str) -> Result<RouteBuilder, RouterError> {
        let route = Rc::new(Route::declare(pattern)?);
        self.add_route(route.clone());
        Ok(RouteBuilder {
            router: self.clone(),
            route,
        })
    }

    /// Declare a route with its enter handlers in one call
    pub fn on_with(
        &self,
        pattern: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> RouteBuilder {
        let builder = self.on(pattern);
        for handler in handlers {
            builder.route.attach(ChainKind::Enter, handler);
        }
        builder
    }

    /// Append an already built route
    pub fn add_route(&self, route: RouteRef) {
        debug_log!("Declaring route '{}'", route.pattern());
        self.inner.routes.borrow_mut().push(route);
        self.invalidate_cache();
    }

    /// Hand the router to a plugin
    ///
    /// Plugins are plain functions that declare routes or attach handlers.
    pub fn use_plugin(&self, plugin: impl FnOnce(&Router)) -> &Self {
        plugin(self);
        self
    }

    /// Receive every chain failure instead of having it logged
    pub fn on_error(&self, sink: impl Fn(&ChainFailure) + 'static) -> &Self {
        *self.inner.error_sink.borrow_mut() = Some(Rc::new(sink));
        self
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Transition to `path` without touching history
    ///
    /// Runs immediately, unless a chain is running; then the navigation is
    /// queued and the running chains are halted when they next advance.
    pub fn dispatch(&self, path: &str) -> &Self {
        // An ignored dispatch must not make running chains stale
        if self.inner.config.unmatched == UnmatchedPolicy::KeepCurrent
            && self.match_path(route_path(path)).is_none()
        {
            debug_log!("No route matched '{}', keeping current route", path);
            return self;
        }

        let generation = self.inner.generations.advance();
        trace_log!("Dispatch #{} requested for '{}'", generation.value(), path);

        let router = Rc::downgrade(&self.inner);
        let path = path.to_string();
        self.inner.scheduler.schedule(move || {
            if let Some(router) = upgrade(&router) {
                router.transition(&path, &generation);
            }
        });
        self
    }

    /// Push `path` to history and dispatch it
    pub fn go(&self, path: &str) -> &Self {
        self.go_with_state(path, HistoryState::new())
    }

    /// Push `path` with `state` to history and dispatch it
    pub fn go_with_state(&self, path: &str, state: HistoryState) -> &Self {
        self.push_with_state(path, state);
        self.dispatch(path)
    }

    /// Dispatch the environment's current location
    pub fn start(&self) -> &Self {
        let path = self.inner.env.current_path();
        self.dispatch(&path)
    }

    /// Push a history entry without dispatching
    pub fn push(&self, path: &str) -> &Self {
        self.push_with_state(path, HistoryState::new())
    }

    /// Push a history entry with state without dispatching
    pub fn push_with_state(&self, path: &str, state: HistoryState) -> &Self {
        trace_log!("Pushing '{}' to history", path);
        self.inner.env.push(path, &state);
        self
    }

    /// Replace the current history entry without dispatching
    pub fn replace(&self, path: &str) -> &Self {
        self.replace_with_state(path, HistoryState::new())
    }

    /// Replace the current history entry and its state without dispatching
    pub fn replace_with_state(&self, path: &str, state: HistoryState) -> &Self {
        trace_log!("Replacing history entry with '{}'", path);
        self.inner.env.replace(path, &state);
        self
    }

    // ------------------------------------------------------------------------
    // Listening
    // ------------------------------------------------------------------------

    /// Route every link click and follow back/forward events
    ///
    /// With `auto_start`, the current location is dispatched first. The
    /// subscriptions last as long as the returned [`Listener`].
    pub fn listen(&self, auto_start: bool) -> Listener {
        self.subscribe(None, auto_start)
    }

    /// Like [`listen`](Self::listen), but only route links whose path starts
    /// with `prefix`
    pub fn listen_under(&self, prefix: impl Into<String>, auto_start: bool) -> Listener {
        self.subscribe(Some(prefix.into()), auto_start)
    }

    fn subscribe(&self, prefix: Option<String>, auto_start: bool) -> Listener {
        info_log!(
            "Listening for navigation under '{}'",
            prefix.as_deref().unwrap_or("/")
        );

        if auto_start {
            self.start();
        }

        let router = Rc::downgrade(&self.inner);
        let link_clicks = self
            .inner
            .env
            .subscribe_link_clicks(Rc::new(move |click: &mut LinkClick| {
                if let Some(router) = upgrade(&router) {
                    router.follow_link(click, prefix.as_deref());
                }
            }));

        let router = Rc::downgrade(&self.inner);
        let pop_state = self
            .inner
            .env
            .subscribe_pop_state(Rc::new(move |event: &PopState| {
                if let Some(router) = upgrade(&router) {
                    router.follow_pop_state(event);
                }
            }));

        Listener {
            link_clicks,
            pop_state,
        }
    }

    fn follow_link(&self, click: &mut LinkClick, prefix: Option<&str>) {
        let Some(href) = click.href() else {
            return;
        };

        let url = match resolve_href(href, &self.inner.env.current_path()) {
            Ok(url) => url,
            Err(err) => {
                debug_log!("Ignoring link '{}': {}", href, err);
                return;
            }
        };

        if !is_local(&url) {
            trace_log!("Ignoring link to another origin: {}", url);
            return;
        }

        if let Some(prefix) = prefix {
            if !url.path().starts_with(prefix) {
                trace_log!("Ignoring link '{}' outside '{}'", url.path(), prefix);
                return;
            }
        }

        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        click.prevent_default();
        click.stop_propagation();
        self.go(&target);
    }

    fn follow_pop_state(&self, event: &PopState) {
        if event.state.is_some() {
            self.start();
            return;
        }

        // Entries the router never wrote get the current state attached
        let path = self.inner.env.current_path();
        let state = self.inner.env.state().unwrap_or_default();
        self.replace_with_state(&path, state);
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// The route entered last
    pub fn current_route(&self) -> Option<RouteRef> {
        self.inner.current_route.borrow().clone()
    }

    /// The context of the latest dispatch
    pub fn current_context(&self) -> Option<SharedContext> {
        self.inner.current_context.borrow().clone()
    }

    /// The route `path` would dispatch to, with its captures
    pub fn match_path(&self, path: &str) -> Option<(RouteRef, Params)> {
        let (index, params) = self.resolve(path)?;
        let route = self.inner.routes.borrow().get(index)?.clone();
        Some((route, params))
    }

    /// Declared routes in declaration order
    pub fn routes(&self) -> Vec<RouteRef> {
        self.inner.routes.borrow().clone()
    }

    /// Resolution cache statistics, if the cache is enabled
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> Option<CacheStats> {
        let cache = self.inner.cache.as_ref()?;
        let stats = cache.borrow().stats().clone();
        Some(stats)
    }

    // ------------------------------------------------------------------------
    // Transition
    // ------------------------------------------------------------------------

    fn transition(&self, path: &str, generation: &Generation) {
        if !generation.is_current() {
            debug_log!("Navigation to '{}' superseded before it started", path);
            return;
        }

        let inner = &self.inner;
        let mut context = Context::new(path, inner.env.state().unwrap_or_default());
        context.set_generation(generation.value());
        let previous = inner.current_context.borrow().clone();
        if let Some(previous) = &previous {
            context.set_previous(previous);
        }

        let matched = self.match_path(&context.path);
        if matched.is_none() && inner.config.unmatched == UnmatchedPolicy::KeepCurrent {
            debug_log!("No route matched '{}', keeping current route", context.path);
            return;
        }

        let context = context.into_shared();

        let leaving = inner.current_route.borrow().clone();
        if let (Some(route), Some(previous)) = (leaving, &previous) {
            route
                .chain(ChainKind::Leave)
                .launch(previous.clone(), self.run_options(ChainKind::Leave, &route, generation));

            if !generation.is_current() {
                // The route has been left; the queued navigation must not leave it again
                debug_log!("Leaving '{}' started a new navigation", route.pattern());
                *inner.current_route.borrow_mut() = None;
                return;
            }
        }

        *inner.previous_context.borrow_mut() = previous;
        *inner.current_context.borrow_mut() = Some(context.clone());

        match matched {
            Some((route, params)) => {
                debug_log!("'{}' matched route '{}'", path, route.pattern());
                context.borrow_mut().params = params;
                *inner.current_route.borrow_mut() = Some(route.clone());
                route
                    .chain(ChainKind::Enter)
                    .launch(context, self.run_options(ChainKind::Enter, &route, generation));
            }
            None => {
                debug_log!("No route matched '{}'", path);
            }
        }
    }

    fn run_options(&self, kind: ChainKind, route: &Route, generation: &Generation) -> RunOptions {
        RunOptions {
            kind,
            pattern: route.pattern().to_string(),
            generation: generation.clone(),
            drop_stale: self.inner.config.drop_stale_chains,
            on_error: self.inner.error_sink.borrow().clone(),
            scheduler: self.inner.scheduler.clone(),
        }
    }

    fn scan(&self, path: &str) -> Option<(usize, Params)> {
        self.inner
            .routes
            .borrow()
            .iter()
            .enumerate()
            .find_map(|(index, route)| route.matches(path).map(|params| (index, params)))
    }

    #[cfg(feature = "cache")]
    fn resolve(&self, path: &str) -> Option<(usize, Params)> {
        let Some(cache) = &self.inner.cache else {
            return self.scan(path);
        };

        let cached = cache.borrow_mut().get(path);
        match cached {
            Some(resolution) => resolution,
            None => {
                let resolution = self.scan(path);
                cache
                    .borrow_mut()
                    .set(path.to_string(), resolution.clone());
                resolution
            }
        }
    }

    #[cfg(not(feature = "cache"))]
    fn resolve(&self, path: &str) -> Option<(usize, Params)> {
        self.scan(path)
    }

    #[cfg(feature = "cache")]
    fn invalidate_cache(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.borrow_mut().clear();
        }
    }

    #[cfg(not(feature = "cache"))]
    fn invalidate_cache(&self) {}
}

fn route_path(path: &str) -> &str {
    path.split_once('?').map_or(path, |(path, _)| path)
}

fn upgrade(router: &Weak<RouterInner>) -> Option<Router> {
    router.upgrade().map(|inner| Router { inner })
}

impl Default for Router {
    fn default() -> Self {
        Self::new(MemoryEnvironment::default())
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.inner.routes.borrow().len())
            .field(
                "current_route",
                &self
                    .inner
                    .current_route
                    .borrow()
                    .as_ref()
                    .map(|route| route.pattern().to_string()),
            )
            .field("generation", &self.inner.generations.current())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Non-owning router handle returned by [`Router::downgrade`]
///
/// ```
/// use chain_router::{Context, Router};
///
/// let router = Router::default();
/// let redirect = router.downgrade();
/// router.on("/old").enter_sync(move |_ctx: &mut Context| {
///     if let Some(router) = redirect.upgrade() {
///         router.go("/new");
///     }
/// });
/// router.on("/new");
///
/// router.go("/old");
/// assert_eq!(router.current_route().unwrap().pattern(), "/new");
/// ```
#[derive(Clone)]
pub struct WeakRouter {
    inner: Weak<RouterInner>,
}

impl WeakRouter {
    /// The router, if it is still alive
    pub fn upgrade(&self) -> Option<Router> {
        upgrade(&self.inner)
    }
}

impl fmt::Debug for WeakRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRouter")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

// ============================================================================
// RouteBuilder
// ============================================================================

/// Attaches handlers to the route returned by [`Router::on`]
///
/// Dereferences to the [`Router`], so declarations and navigation chain:
///
/// ```
/// use chain_router::{Context, Next, Router};
///
/// let router = Router::default();
/// router
///     .on("/")
///     .enter(|_ctx: &mut Context, next: Next| next.proceed())
///     .leave_sync(|_ctx: &mut Context| {})
///     .on("/about")
///     .enter_sync(|_ctx: &mut Context| {});
///
/// assert_eq!(router.routes().len(), 2);
/// ```
///
/// Only the route declared last accepts handlers. Attaching through a
/// builder kept past a later declaration panics with
/// [`RouterError::RouteOutOfFocus`].
pub struct RouteBuilder {
    router: Router,
    route: RouteRef,
}

impl RouteBuilder {
    /// Append an enter handler that advances through its continuation
    pub fn enter<F>(self, handler: F) -> Self
    where
        F: Fn(&mut Context, Next) + 'static,
    {
        self.enter_handler(Handler::continued(handler))
    }

    /// Append an enter handler that advances as soon as it returns
    pub fn enter_sync<F>(self, handler: F) -> Self
    where
        F: Fn(&mut Context) + 'static,
    {
        self.enter_handler(Handler::sync(handler))
    }

    /// Append a leave handler that advances through its continuation
    pub fn leave<F>(self, handler: F) -> Self
    where
        F: Fn(&mut Context, Next) + 'static,
    {
        self.leave_handler(Handler::continued(handler))
    }

    /// Append a leave handler that advances as soon as it returns
    pub fn leave_sync<F>(self, handler: F) -> Self
    where
        F: Fn(&mut Context) + 'static,
    {
        self.leave_handler(Handler::sync(handler))
    }

    /// Append a prepared enter handler
    pub fn enter_handler(self, handler: Handler) -> Self {
        self.attach(ChainKind::Enter, handler)
    }

    /// Append a prepared leave handler
    pub fn leave_handler(self, handler: Handler) -> Self {
        self.attach(ChainKind::Leave, handler)
    }

    fn attach(self, kind: ChainKind, handler: Handler) -> Self {
        if let Err(err) = self.check_focus() {
            panic!("{}", err);
        }
        self.route.attach(kind, handler);
        self
    }

    fn check_focus(&self) -> Result<(), RouterError> {
        let routes = self.router.inner.routes.borrow();
        match routes.last() {
            Some(last) if !Rc::ptr_eq(last, &self.route) => Err(RouterError::RouteOutOfFocus {
                pattern: self.route.pattern().to_string(),
                focused: last.pattern().to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// The route being built
    pub fn route(&self) -> &RouteRef {
        &self.route
    }
}

impl Deref for RouteBuilder {
    type Target = Router;

    fn deref(&self) -> &Router {
        &self.router
    }
}

impl fmt::Debug for RouteBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteBuilder")
            .field("route", &self.route)
            .finish()
    }
}

// ============================================================================
// Listener
// ============================================================================

/// Keeps a router subscribed to link clicks and back/forward events
///
/// Dropping it unsubscribes both.
#[must_use = "dropping the listener unsubscribes the router"]
pub struct Listener {
    link_clicks: Subscription,
    pop_state: Subscription,
}

impl Listener {
    /// Stop listening
    pub fn stop(self) {
        info_log!("Listener stopped");
        self.link_clicks.cancel();
        self.pop_state.cancel();
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").finish_non_exhaustive()
    }
}

//! Handler chains
//!
//! A route owns two [`HandlerChain`]s: `enter` runs when the route becomes
//! current, `leave` when it stops being current. A chain runs its handlers in
//! the order they were added, against one shared [`Context`].
//!
//! Every handler declares how it advances:
//!
//! - [`Handler::sync`] handlers are plain functions of the context; the chain
//!   moves on as soon as they return.
//! - [`Handler::continued`] handlers also receive a [`Next`] continuation and
//!   the chain waits until it fires. Firing it with an error stops the chain.
//!   The continuation can be kept and fired later, e.g. when a fetch
//!   completes, which is how handlers hold a chain open across asynchronous
//!   work.
//!
//! ```
//! use chain_router::{ChainStatus, Context, Handler, HandlerChain, HistoryState};
//!
//! #[derive(Debug, PartialEq)]
//! struct User(String);
//!
//! let chain = HandlerChain::new();
//! chain.push(Handler::continued(|ctx: &mut Context, next| {
//!     ctx.insert(User("user".to_string()));
//!     next.proceed();
//! }));
//! chain.push(Handler::sync(|ctx: &mut Context| {
//!     assert_eq!(ctx.get::<User>(), Some(&User("user".to_string())));
//! }));
//!
//! let ctx = Context::new("/route", HistoryState::new()).into_shared();
//! assert_eq!(chain.run(ctx), ChainStatus::Completed);
//! ```

use crate::context::{Context, SharedContext};
use crate::error::{ChainFailure, ErrorSink, NavigationError};
use crate::{debug_log, trace_log, warn_log};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

// ============================================================================
// Handlers
// ============================================================================

/// Which of a route's two chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainKind {
    /// Runs when the route becomes current
    Enter,
    /// Runs when the route stops being current
    Leave,
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainKind::Enter => f.write_str("enter"),
            ChainKind::Leave => f.write_str("leave"),
        }
    }
}

/// A step of a handler chain
#[derive(Clone)]
pub enum Handler {
    /// Runs and lets the chain advance immediately
    Sync(Rc<dyn Fn(&mut Context)>),
    /// Runs and holds the chain until its continuation fires
    Continued(Rc<dyn Fn(&mut Context, Next)>),
}

impl Handler {
    /// A handler that never suspends the chain
    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(&mut Context) + 'static,
    {
        Handler::Sync(Rc::new(handler))
    }

    /// A handler that advances the chain by firing its [`Next`]
    pub fn continued<F>(handler: F) -> Self
    where
        F: Fn(&mut Context, Next) + 'static,
    {
        Handler::Continued(Rc::new(handler))
    }

    /// Whether the chain advances without waiting for a continuation
    pub fn is_sync(&self) -> bool {
        matches!(self, Handler::Sync(_))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Sync(_) => f.write_str("Handler::Sync"),
            Handler::Continued(_) => f.write_str("Handler::Continued"),
        }
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Serializes chain work on a single thread.
///
/// Work submitted while other work is running (a navigation started from
/// inside a handler, a continuation fired from inside another chain) is
/// queued and runs once the running work returns. This keeps a context from
/// being entered twice at the same time.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

#[derive(Default)]
struct SchedulerInner {
    depth: Cell<usize>,
    queue: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

struct BusyGuard {
    inner: Rc<SchedulerInner>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.inner.depth.set(self.inner.depth.get() - 1);
    }
}

impl Scheduler {
    /// Create an idle scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether work is currently running
    pub fn is_busy(&self) -> bool {
        self.inner.depth.get() > 0
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Run `task` now if idle, otherwise once the running work returns
    pub fn schedule(&self, task: impl FnOnce() + 'static) {
        if self.is_busy() {
            trace_log!("scheduler busy, queueing task");
            self.inner.queue.borrow_mut().push_back(Box::new(task));
            return;
        }

        {
            let _busy = self.enter();
            task();
        }
        self.drain();
    }

    fn enter(&self) -> BusyGuard {
        self.inner.depth.set(self.inner.depth.get() + 1);
        BusyGuard {
            inner: self.inner.clone(),
        }
    }

    fn drain(&self) {
        if self.is_busy() {
            return;
        }
        loop {
            let Some(task) = self.inner.queue.borrow_mut().pop_front() else {
                break;
            };
            let _busy = self.enter();
            task();
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("busy", &self.is_busy())
            .field("pending", &self.pending())
            .finish()
    }
}

// ============================================================================
// Generations
// ============================================================================

/// Monotonic navigation counter shared by a router and its chain runs
#[derive(Debug, Clone, Default)]
pub(crate) struct Generations {
    counter: Rc<Cell<u64>>,
}

impl Generations {
    /// Start a new generation, making every earlier one stale
    pub(crate) fn advance(&self) -> Generation {
        let issued = self.counter.get() + 1;
        self.counter.set(issued);
        Generation {
            issued,
            counter: self.counter.clone(),
        }
    }

    pub(crate) fn current(&self) -> u64 {
        self.counter.get()
    }
}

/// The generation a chain run belongs to
#[derive(Debug, Clone)]
pub(crate) struct Generation {
    issued: u64,
    counter: Rc<Cell<u64>>,
}

impl Generation {
    pub(crate) fn value(&self) -> u64 {
        self.issued
    }

    pub(crate) fn is_current(&self) -> bool {
        self.counter.get() == self.issued
    }
}

// ============================================================================
// Chains
// ============================================================================

/// Where a chain stood when control returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStatus {
    /// Every handler ran
    Completed,
    /// A handler holds the chain open until its continuation fires
    Suspended,
    /// A handler failed, or the chain was superseded by a newer navigation
    Failed(NavigationError),
}

/// Settings for one run of a chain
#[derive(Clone)]
pub(crate) struct RunOptions {
    pub(crate) kind: ChainKind,
    pub(crate) pattern: String,
    pub(crate) generation: Generation,
    pub(crate) drop_stale: bool,
    pub(crate) on_error: Option<ErrorSink>,
    pub(crate) scheduler: Scheduler,
}

/// Ordered list of handlers
#[derive(Default)]
pub struct HandlerChain {
    handlers: RefCell<Vec<Handler>>,
}

impl HandlerChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler
    pub fn push(&self, handler: Handler) {
        self.handlers.borrow_mut().push(handler);
    }

    /// Number of handlers
    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Check if the chain has no handlers
    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    /// Run the chain on its own, outside any router
    ///
    /// Returns once the chain completes, fails, or suspends. Failures are
    /// logged.
    pub fn run(&self, context: SharedContext) -> ChainStatus {
        let scheduler = Scheduler::new();
        let options = RunOptions {
            kind: ChainKind::Enter,
            pattern: String::new(),
            generation: Generations::default().advance(),
            drop_stale: false,
            on_error: None,
            scheduler: scheduler.clone(),
        };

        let status = Rc::new(RefCell::new(None));
        let slot = status.clone();
        let run = self.prepare(context, options);
        scheduler.schedule(move || {
            *slot.borrow_mut() = Some(run.drive());
        });
        status.take().unwrap_or(ChainStatus::Suspended)
    }

    /// Start a run inline; the caller is already inside scheduled work
    pub(crate) fn launch(&self, context: SharedContext, options: RunOptions) -> ChainStatus {
        self.prepare(context, options).drive()
    }

    fn prepare(&self, context: SharedContext, options: RunOptions) -> Rc<ChainRun> {
        Rc::new(ChainRun {
            handlers: self.handlers.borrow().clone(),
            context,
            cursor: Cell::new(0),
            in_handler: Cell::new(false),
            signal: RefCell::new(None),
            outcome: RefCell::new(None),
            options,
        })
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.handlers.borrow().iter()).finish()
    }
}

/// One execution of a chain.
///
/// Holds a snapshot of the handlers, so handlers appended while it runs only
/// take effect on the next run.
struct ChainRun {
    handlers: Vec<Handler>,
    context: SharedContext,
    cursor: Cell<usize>,
    in_handler: Cell<bool>,
    signal: RefCell<Option<Result<(), NavigationError>>>,
    outcome: RefCell<Option<Result<(), NavigationError>>>,
    options: RunOptions,
}

impl ChainRun {
    /// Run handlers until the chain ends or a handler suspends it
    fn drive(self: &Rc<Self>) -> ChainStatus {
        loop {
            if self.superseded() {
                break;
            }

            let index = self.cursor.get();
            let Some(handler) = self.handlers.get(index).cloned() else {
                self.complete(Ok(()));
                break;
            };
            self.cursor.set(index + 1);

            trace_log!(
                "{} chain of '{}': handler {}/{}",
                self.options.kind,
                self.options.pattern,
                index + 1,
                self.handlers.len()
            );

            match handler {
                Handler::Sync(handler) => handler(&mut self.context.borrow_mut()),
                Handler::Continued(handler) => {
                    let next = Next {
                        run: self.clone(),
                        fired: false,
                    };
                    self.in_handler.set(true);
                    handler(&mut self.context.borrow_mut(), next);
                    self.in_handler.set(false);

                    let signal = self.signal.borrow_mut().take();
                    match signal {
                        Some(Ok(())) => {}
                        Some(Err(error)) => {
                            self.complete(Err(error));
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
        self.status()
    }

    /// Continue after a continuation fired outside its handler
    fn resume(self: &Rc<Self>, result: Result<(), NavigationError>) {
        if self.outcome.borrow().is_some() || self.superseded() {
            return;
        }

        match result {
            Ok(()) => {
                self.drive();
            }
            Err(error) => self.complete(Err(error)),
        }
    }

    /// Halt the run if a newer navigation started since it was launched
    fn superseded(&self) -> bool {
        if !self.options.drop_stale || self.options.generation.is_current() {
            return false;
        }

        debug_log!(
            "{} chain of '{}' superseded by a newer navigation, halting",
            self.options.kind,
            self.options.pattern
        );
        *self.outcome.borrow_mut() = Some(Err(NavigationError::Superseded {
            generation: self.options.generation.value(),
        }));
        true
    }

    fn complete(&self, result: Result<(), NavigationError>) {
        if let Err(error) = &result {
            let failure = ChainFailure {
                kind: self.options.kind,
                pattern: self.options.pattern.clone(),
                path: self.context.borrow().path.clone(),
                error: error.clone(),
            };
            match &self.options.on_error {
                Some(sink) => sink(&failure),
                None => {
                    warn_log!("{}", failure);
                }
            }
        }
        *self.outcome.borrow_mut() = Some(result);
    }

    fn status(&self) -> ChainStatus {
        match &*self.outcome.borrow() {
            None => ChainStatus::Suspended,
            Some(Ok(())) => ChainStatus::Completed,
            Some(Err(error)) => ChainStatus::Failed(error.clone()),
        }
    }
}

// ============================================================================
// Next
// ============================================================================

/// Continuation handed to [`Handler::continued`] handlers.
///
/// Firing it advances the chain ([`proceed`](Self::proceed)) or stops it
/// ([`fail`](Self::fail)). It fires at most once, since firing consumes it.
/// Dropping it without firing leaves the chain halted where it is.
#[must_use = "the chain waits until the continuation fires"]
pub struct Next {
    run: Rc<ChainRun>,
    fired: bool,
}

impl Next {
    /// Advance to the next handler
    pub fn proceed(self) {
        self.finish(Ok(()));
    }

    /// Stop the chain with an error
    pub fn fail(self, error: impl Into<NavigationError>) {
        self.finish(Err(error.into()));
    }

    /// Advance or stop depending on `result`
    pub fn finish(mut self, result: Result<(), NavigationError>) {
        self.fired = true;
        let run = self.run.clone();

        if run.in_handler.get() {
            *run.signal.borrow_mut() = Some(result);
            return;
        }

        let scheduler = run.options.scheduler.clone();
        scheduler.schedule(move || run.resume(result));
    }

    /// The context the chain runs against, for work that outlives the
    /// handler call
    ///
    /// While the handler itself is running, use the `&mut Context` it was
    /// given; the shared context is borrowed for the duration of the call.
    pub fn context(&self) -> SharedContext {
        self.run.context.clone()
    }

    /// Whether a newer navigation started after this chain
    pub fn is_stale(&self) -> bool {
        !self.run.options.generation.is_current()
    }

    /// Sequence number of the navigation this chain belongs to
    pub fn generation(&self) -> u64 {
        self.run.options.generation.value()
    }
}

impl Drop for Next {
    fn drop(&mut self) {
        if !self.fired && self.run.outcome.borrow().is_none() {
            debug_log!(
                "continuation of {} chain '{}' dropped without firing, chain halted",
                self.run.options.kind,
                self.run.options.pattern
            );
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("kind", &self.run.options.kind)
            .field("pattern", &self.run.options.pattern)
            .field("generation", &self.generation())
            .finish()
    }
}

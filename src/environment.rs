//! The platform the router runs on
//!
//! The router never touches a browser directly. Everything it needs from the
//! outside world (the current location, the history store, link clicks and
//! back/forward events) comes through the [`Environment`] trait, handed to
//! `Router::new`. [`MemoryEnvironment`] implements it in memory, which is what
//! tests and non-browser hosts use.

use crate::history::{History, HistoryEntry, HistoryState};
use crate::trace_log;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use url::Url;

// ============================================================================
// Events
// ============================================================================

/// A back/forward navigation reported by the environment
#[derive(Debug, Clone, PartialEq)]
pub struct PopState {
    /// State of the entry that became current, if the router wrote one
    pub state: Option<HistoryState>,
}

/// A click on a link, delivered before the platform follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkClick {
    href: Option<String>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl LinkClick {
    /// Create a click on a link with the given `href` attribute
    pub fn new(href: Option<String>) -> Self {
        Self {
            href,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// The resolved `href`, `None` when the anchor has no `href` attribute
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Keep the platform from following the link
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Keep other listeners from seeing the click
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Whether a listener prevented the default navigation
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Whether a listener stopped propagation
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Listener for back/forward events
pub type PopStateCallback = Rc<dyn Fn(&PopState)>;

/// Listener for link clicks
pub type LinkClickCallback = Rc<dyn Fn(&mut LinkClick)>;

// ============================================================================
// Subscription
// ============================================================================

/// Keeps an event listener registered until dropped
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Create a subscription that runs `unsubscribe` when dropped
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription with nothing to release
    pub fn noop() -> Self {
        Self { unsubscribe: None }
    }

    /// Unregister now
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Everything the router consumes from its host platform.
///
/// Implementations wrap the browser (`window.location`, `history`, delegated
/// anchor clicks, `popstate`) or stand in for it.
pub trait Environment {
    /// Path and query of the active location, e.g. `/users?page=2`
    fn current_path(&self) -> String;

    /// State stored with the current history entry
    fn state(&self) -> Option<HistoryState>;

    /// Add a history entry
    fn push(&self, path: &str, state: &HistoryState);

    /// Overwrite the current history entry
    fn replace(&self, path: &str, state: &HistoryState);

    /// Step back one entry; implementations report it through pop-state
    /// listeners
    fn back(&self);

    /// Listen for back/forward navigation
    fn subscribe_pop_state(&self, callback: PopStateCallback) -> Subscription;

    /// Listen for clicks on links
    fn subscribe_link_clicks(&self, callback: LinkClickCallback) -> Subscription;
}

const LOCAL_ORIGIN: &str = "http://localhost/";

/// Resolve `href` the way a browser resolves an anchor relative to the page
/// at `current_path`
pub fn resolve_href(href: &str, current_path: &str) -> Result<Url, url::ParseError> {
    match Url::parse(href) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(LOCAL_ORIGIN)?.join(current_path)?.join(href)
        }
        Err(err) => Err(err),
    }
}

/// Whether a url returned by [`resolve_href`] points into the application
/// rather than to another origin
pub fn is_local(url: &Url) -> bool {
    Url::parse(LOCAL_ORIGIN).is_ok_and(|base| base.origin() == url.origin())
}

// ============================================================================
// MemoryEnvironment
// ============================================================================

struct Listeners<T> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, T)>>,
}

impl<T: Clone> Listeners<T> {
    fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        }
    }

    fn add(&self, callback: T) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, callback));
        id
    }

    fn remove(&self, id: u64) {
        self.entries.borrow_mut().retain(|(entry, _)| *entry != id);
    }

    /// Copy of the listeners, so callbacks can subscribe or unsubscribe
    /// while being notified
    fn snapshot(&self) -> Vec<T> {
        self.entries
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

struct MemoryInner {
    history: RefCell<History>,
    pop_listeners: Listeners<PopStateCallback>,
    link_listeners: Listeners<LinkClickCallback>,
}

/// An [`Environment`] that keeps its history in memory.
///
/// Cloning yields another handle to the same history, so a test can keep one
/// handle while the router owns the other.
///
/// ```
/// use chain_router::{Environment, HistoryState, MemoryEnvironment};
///
/// let env = MemoryEnvironment::new("/");
/// env.push("/push", &HistoryState::new().with("state", "push"));
///
/// assert_eq!(env.current_path(), "/push");
/// assert_eq!(env.state().unwrap().get_str("state"), Some("push"));
/// ```
#[derive(Clone)]
pub struct MemoryEnvironment {
    inner: Rc<MemoryInner>,
}

impl MemoryEnvironment {
    /// Create an environment whose location starts at `initial_path`
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self::with_history(History::new(initial_path))
    }

    /// Create an environment around an existing history
    pub fn with_history(history: History) -> Self {
        Self {
            inner: Rc::new(MemoryInner {
                history: RefCell::new(history),
                pop_listeners: Listeners::new(),
                link_listeners: Listeners::new(),
            }),
        }
    }

    /// Step forward one entry, notifying pop-state listeners
    pub fn forward(&self) {
        let event = self
            .inner
            .history
            .borrow_mut()
            .forward()
            .map(|entry| PopState {
                state: entry.state.clone(),
            });
        if let Some(event) = event {
            self.emit_pop_state(&event);
        }
    }

    /// Deliver a click on a link with the given `href` to the listeners and
    /// return it, so callers can see whether it was intercepted
    pub fn click(&self, href: impl Into<String>) -> LinkClick {
        self.click_link(LinkClick::new(Some(href.into())))
    }

    /// Deliver an arbitrary click, e.g. one on an anchor without `href`
    pub fn click_link(&self, mut click: LinkClick) -> LinkClick {
        for callback in self.inner.link_listeners.snapshot() {
            if click.is_propagation_stopped() {
                break;
            }
            callback(&mut click);
        }
        click
    }

    /// The current history entry
    pub fn current_entry(&self) -> HistoryEntry {
        self.inner.history.borrow().current_entry().clone()
    }

    /// Number of history entries
    pub fn history_len(&self) -> usize {
        self.inner.history.borrow().len()
    }

    /// Number of registered pop-state listeners
    pub fn pop_state_listeners(&self) -> usize {
        self.inner.pop_listeners.len()
    }

    /// Number of registered link-click listeners
    pub fn link_click_listeners(&self) -> usize {
        self.inner.link_listeners.len()
    }

    fn emit_pop_state(&self, event: &PopState) {
        for callback in self.inner.pop_listeners.snapshot() {
            callback(event);
        }
    }
}

impl Default for MemoryEnvironment {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Environment for MemoryEnvironment {
    fn current_path(&self) -> String {
        self.inner.history.borrow().current_path().to_string()
    }

    fn state(&self) -> Option<HistoryState> {
        self.inner.history.borrow().current_entry().state.clone()
    }

    fn push(&self, path: &str, state: &HistoryState) {
        trace_log!("history push {}", path);
        self.inner.history.borrow_mut().push(path, state.clone());
    }

    fn replace(&self, path: &str, state: &HistoryState) {
        trace_log!("history replace {}", path);
        self.inner.history.borrow_mut().replace(path, state.clone());
    }

    fn back(&self) {
        let event = self
            .inner
            .history
            .borrow_mut()
            .back()
            .map(|entry| PopState {
                state: entry.state.clone(),
            });
        if let Some(event) = event {
            self.emit_pop_state(&event);
        }
    }

    fn subscribe_pop_state(&self, callback: PopStateCallback) -> Subscription {
        let id = self.inner.pop_listeners.add(callback);
        let weak: Weak<MemoryInner> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.pop_listeners.remove(id);
            }
        })
    }

    fn subscribe_link_clicks(&self, callback: LinkClickCallback) -> Subscription {
        let id = self.inner.link_listeners.add(callback);
        let weak: Weak<MemoryInner> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.link_listeners.remove(id);
            }
        })
    }
}

impl fmt::Debug for MemoryEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryEnvironment")
            .field("current_path", &self.current_path())
            .field("history_len", &self.history_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_replace_roundtrip() {
        let env = MemoryEnvironment::new("/");

        env.push("/push", &HistoryState::new().with("state", "push"));
        assert_eq!(env.current_path(), "/push");
        assert_eq!(env.state().unwrap().get_str("state"), Some("push"));
        assert_eq!(env.history_len(), 2);

        env.replace("/replace", &HistoryState::new());
        assert_eq!(env.current_path(), "/replace");
        assert!(env.state().unwrap().is_empty());
        assert_eq!(env.history_len(), 2);
    }

    #[test]
    fn test_back_and_forward_emit_pop_state() {
        let env = MemoryEnvironment::new("/");
        env.push("/one", &HistoryState::new());
        env.push("/two", &HistoryState::new().with("n", 2));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = env.subscribe_pop_state(Rc::new(move |event: &PopState| {
            sink.borrow_mut().push(event.state.clone());
        }));

        env.back();
        env.back();
        env.back();
        env.forward();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], Some(HistoryState::new()));
        assert_eq!(seen[1], None);
        assert_eq!(env.current_path(), "/one");
    }

    #[test]
    fn test_dropping_subscription_unregisters() {
        let env = MemoryEnvironment::new("/");
        let subscription = env.subscribe_link_clicks(Rc::new(|click: &mut LinkClick| {
            click.prevent_default();
        }));
        assert_eq!(env.link_click_listeners(), 1);
        assert!(env.click("/a").is_default_prevented());

        subscription.cancel();
        assert_eq!(env.link_click_listeners(), 0);
        assert!(!env.click("/a").is_default_prevented());
    }

    #[test]
    fn test_stop_propagation_skips_later_listeners() {
        let env = MemoryEnvironment::new("/");
        let _first = env.subscribe_link_clicks(Rc::new(|click: &mut LinkClick| {
            click.stop_propagation();
        }));
        let _second = env.subscribe_link_clicks(Rc::new(|click: &mut LinkClick| {
            click.prevent_default();
        }));

        let click = env.click("/a");
        assert!(click.is_propagation_stopped());
        assert!(!click.is_default_prevented());
    }

    #[test]
    fn test_resolve_href() {
        let url = resolve_href("http://example.com/users/1?tab=posts", "/").unwrap();
        assert_eq!(url.path(), "/users/1");
        assert_eq!(url.query(), Some("tab=posts"));

        let url = resolve_href("settings", "/users/1").unwrap();
        assert_eq!(url.path(), "/users/settings");

        let url = resolve_href("/about", "/users/1").unwrap();
        assert_eq!(url.path(), "/about");
    }

    #[test]
    fn test_is_local() {
        assert!(is_local(&resolve_href("/about", "/").unwrap()));
        assert!(is_local(&resolve_href("http://localhost/x", "/").unwrap()));
        assert!(!is_local(&resolve_href("https://example.com/x", "/").unwrap()));
    }
}

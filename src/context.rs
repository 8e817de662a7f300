//! Per-navigation context
//!
//! Every dispatch builds exactly one [`Context`]. The handlers of a chain all
//! receive the same context, so it doubles as scratch space: values one
//! handler stores with [`Context::insert`] are visible to the handlers that
//! run after it.

use crate::history::HistoryState;
use crate::params::{Params, QueryParams};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// A context shared between the router and the chains running against it
pub type SharedContext = Rc<RefCell<Context>>;

/// State of a single navigation.
///
/// # Example
///
/// ```
/// use chain_router::{Context, HistoryState};
///
/// let ctx = Context::new("/route?key=value", HistoryState::new());
///
/// assert_eq!(ctx.path, "/route");
/// assert_eq!(ctx.query.get("key"), Some("value"));
/// assert!(ctx.params.is_empty());
/// assert!(ctx.previous().is_none());
/// ```
pub struct Context {
    /// Path without its query string
    pub path: String,
    /// Captures of the matched route; empty until a route matches
    pub params: Params,
    /// Decoded query string
    pub query: QueryParams,
    /// History state at the time of the navigation
    pub state: HistoryState,
    previous: Option<Weak<RefCell<Context>>>,
    generation: u64,
    extensions: HashMap<TypeId, Box<dyn Any>>,
}

impl Context {
    /// Create a context for `path`, which may carry a query string
    pub fn new(path: &str, state: HistoryState) -> Self {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, QueryParams::from_query_string(query)),
            None => (path, QueryParams::new()),
        };

        Self {
            path: path.to_string(),
            params: Params::new(),
            query,
            state,
            previous: None,
            generation: 0,
            extensions: HashMap::new(),
        }
    }

    /// The context of the navigation before this one, while it is still
    /// alive
    ///
    /// The router keeps the current and the previous context alive; older
    /// ones are released.
    pub fn previous(&self) -> Option<SharedContext> {
        self.previous.as_ref()?.upgrade()
    }

    pub(crate) fn set_previous(&mut self, previous: &SharedContext) {
        self.previous = Some(Rc::downgrade(previous));
    }

    /// Sequence number of the dispatch that created this context
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Wrap into a [`SharedContext`]
    pub fn into_shared(self) -> SharedContext {
        Rc::new(RefCell::new(self))
    }

    // ------------------------------------------------------------------------
    // Scratch space
    // ------------------------------------------------------------------------

    /// Store a value for later handlers, returning the one it replaces
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.extensions
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast().ok().map(|boxed| *boxed))
    }

    /// Get a value stored by an earlier handler
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.extensions.get(&TypeId::of::<T>())?.downcast_ref()
    }

    /// Get a stored value mutably
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.extensions.get_mut(&TypeId::of::<T>())?.downcast_mut()
    }

    /// Remove a stored value
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast().ok().map(|boxed| *boxed))
    }

    /// Check whether a value of type `T` is stored
    pub fn contains<T: 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.path)
            .field("params", &self.params)
            .field("query", &self.query)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct User(&'static str);

    #[test]
    fn test_query_is_split_off() {
        let ctx = Context::new("/route?key=value&other=a%20b", HistoryState::new());

        assert_eq!(ctx.path, "/route");
        assert_eq!(ctx.query.get("key"), Some("value"));
        assert_eq!(ctx.query.get("other"), Some("a b"));
    }

    #[test]
    fn test_path_without_query() {
        let ctx = Context::new("/route", HistoryState::new());
        assert_eq!(ctx.path, "/route");
        assert!(ctx.query.is_empty());
    }

    #[test]
    fn test_state_is_kept() {
        let ctx = Context::new("/", HistoryState::new().with("from", "link"));
        assert_eq!(ctx.state.get_str("from"), Some("link"));
    }

    #[test]
    fn test_scratch_space() {
        let mut ctx = Context::new("/", HistoryState::new());

        assert_eq!(ctx.insert(User("user")), None);
        assert_eq!(ctx.get::<User>(), Some(&User("user")));

        ctx.get_mut::<User>().unwrap().0 = "not_user";
        assert_eq!(ctx.insert(User("third")), Some(User("not_user")));

        assert!(ctx.contains::<User>());
        assert_eq!(ctx.remove::<User>(), Some(User("third")));
        assert!(ctx.get::<User>().is_none());
    }

    #[test]
    fn test_previous_is_weak() {
        let first = Context::new("/one", HistoryState::new()).into_shared();
        let second = Context::new("/two", HistoryState::new()).into_shared();
        second.borrow_mut().set_previous(&first);

        let previous = second.borrow().previous().unwrap();
        assert!(Rc::ptr_eq(&previous, &first));
        drop(previous);

        drop(first);
        assert!(second.borrow().previous().is_none());
    }
}

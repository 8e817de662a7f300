//! History entries and state
//!
//! [`HistoryState`] is the mapping a navigation stores alongside its path,
//! surfaced to handlers as `Context::state`. [`History`] is an in-memory
//! stack of entries with browser semantics: pushing truncates the forward
//! entries, replacing overwrites the current one.

use serde_json::{Map, Value};

/// State data for history entries
///
/// Can hold any JSON value per key, mirroring what a browser's structured
/// clone of `history.state` allows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryState {
    data: Map<String, Value>,
}

impl HistoryState {
    /// Create new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Get a string value
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key)?.as_str()
    }

    /// Remove a value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Check if state is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Underlying map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }
}

impl From<Map<String, Value>> for HistoryState {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

impl From<HistoryState> for Value {
    fn from(state: HistoryState) -> Self {
        Value::Object(state.data)
    }
}

/// Navigation history entry
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Path for this history entry, query included
    pub path: String,
    /// State stored with the entry; `None` for entries the router never wrote
    pub state: Option<HistoryState>,
}

impl HistoryEntry {
    /// Create a new history entry
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: None,
        }
    }

    /// Create with state
    pub fn with_state(path: impl Into<String>, state: HistoryState) -> Self {
        Self {
            path: path.into(),
            state: Some(state),
        }
    }
}

/// Navigation history stack
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    current: usize,
    /// Maximum history size (0 = unlimited)
    max_size: usize,
}

impl History {
    const DEFAULT_MAX_SIZE: usize = 1000;

    /// Create a new history with initial path
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self::with_max_size(initial_path, Self::DEFAULT_MAX_SIZE)
    }

    /// Create with custom max size
    pub fn with_max_size(initial_path: impl Into<String>, max_size: usize) -> Self {
        Self {
            entries: vec![HistoryEntry::new(initial_path)],
            current: 0,
            max_size,
        }
    }

    /// Get current path
    pub fn current_path(&self) -> &str {
        &self.entries[self.current].path
    }

    /// Get current entry
    pub fn current_entry(&self) -> &HistoryEntry {
        &self.entries[self.current]
    }

    /// Push a new entry, dropping any forward history
    pub fn push(&mut self, path: impl Into<String>, state: HistoryState) {
        self.entries.truncate(self.current + 1);
        self.entries.push(HistoryEntry::with_state(path, state));
        self.current += 1;
        self.enforce_size_limit();
    }

    /// Replace current entry
    pub fn replace(&mut self, path: impl Into<String>, state: HistoryState) {
        self.entries[self.current] = HistoryEntry::with_state(path, state);
    }

    /// Step back, returning the entry that became current
    pub fn back(&mut self) -> Option<&HistoryEntry> {
        if !self.can_go_back() {
            return None;
        }
        self.current -= 1;
        Some(self.current_entry())
    }

    /// Step forward, returning the entry that became current
    pub fn forward(&mut self) -> Option<&HistoryEntry> {
        if !self.can_go_forward() {
            return None;
        }
        self.current += 1;
        Some(self.current_entry())
    }

    /// Check if can go back
    pub fn can_go_back(&self) -> bool {
        self.current > 0
    }

    /// Check if can go forward
    pub fn can_go_forward(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    /// Get history length
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a history keeps at least its current entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get all entries
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Get current index
    pub fn current_index(&self) -> usize {
        self.current
    }

    fn enforce_size_limit(&mut self) {
        if self.max_size > 0 && self.entries.len() > self.max_size {
            let excess = self.entries.len() - self.max_size;
            self.entries.drain(0..excess);
            self.current = self.current.saturating_sub(excess);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_creation() {
        let history = History::new("/");
        assert_eq!(history.current_path(), "/");
        assert_eq!(history.len(), 1);
        assert!(history.current_entry().state.is_none());
        assert!(!history.can_go_back());
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_push_stores_state() {
        let mut history = History::new("/");
        history.push("/push", HistoryState::new().with("state", "push"));

        let entry = history.current_entry();
        assert_eq!(entry.path, "/push");
        assert_eq!(
            entry.state.as_ref().and_then(|s| s.get_str("state")),
            Some("push")
        );
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_replace_overwrites_current_entry() {
        let mut history = History::new("/");
        history.push("/page1", HistoryState::new());
        history.replace("/page2", HistoryState::new().with("k", 1));

        assert_eq!(history.current_path(), "/page2");
        assert_eq!(history.len(), 2);
        assert_eq!(history.back().map(|e| e.path.as_str()), Some("/"));
    }

    #[test]
    fn test_back_forward_and_truncation() {
        let mut history = History::new("/");
        history.push("/page1", HistoryState::new());
        history.push("/page2", HistoryState::new());

        history.back();
        assert_eq!(history.current_path(), "/page1");
        assert!(history.can_go_forward());

        history.push("/page3", HistoryState::new());
        assert_eq!(history.len(), 3);
        assert!(!history.can_go_forward());
        assert!(history.forward().is_none());
    }

    #[test]
    fn test_history_max_size() {
        let mut history = History::with_max_size("/", 3);
        for path in ["/page1", "/page2", "/page3", "/page4"] {
            history.push(path, HistoryState::new());
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.current_path(), "/page4");
        assert_eq!(history.current_index(), 2);
        assert_eq!(history.entries()[0].path, "/page2");
    }

    #[test]
    fn test_state_values() {
        let mut state = HistoryState::new().with("scrollY", 120).with("tab", "posts");
        state.set("flags", json!({ "dirty": true }));

        assert_eq!(state.get("scrollY"), Some(&json!(120)));
        assert_eq!(state.get_str("tab"), Some("posts"));
        assert_eq!(state.get("flags"), Some(&json!({ "dirty": true })));
        assert_eq!(state.remove("tab"), Some(json!("posts")));
        assert_eq!(Value::from(state.clone())["scrollY"], json!(120));
        assert!(!state.is_empty());
    }
}

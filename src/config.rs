//! Router configuration

/// What a dispatch does when no route matches its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedPolicy {
    /// Run the current route's leave chain and make the unmatched context
    /// current; the current route itself stays as it was
    #[default]
    LeaveAnyway,
    /// Ignore the dispatch: no chain runs and no router state changes
    KeepCurrent,
}

/// Router configuration
///
/// # Example
///
/// ```
/// use chain_router::{RouterConfig, UnmatchedPolicy};
///
/// let config = RouterConfig::new()
///     .unmatched(UnmatchedPolicy::KeepCurrent)
///     .drop_stale_chains(false)
///     .cache_capacity(64);
///
/// assert_eq!(config.unmatched, UnmatchedPolicy::KeepCurrent);
/// assert!(!config.drop_stale_chains);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Behavior of dispatches no route matches
    pub unmatched: UnmatchedPolicy,
    /// Halt chains that resume after a newer navigation started
    pub drop_stale_chains: bool,
    /// Entries kept by the path resolution cache (0 disables it)
    pub cache_capacity: usize,
}

impl RouterConfig {
    const DEFAULT_CACHE_CAPACITY: usize = 1000;

    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unmatched policy
    pub fn unmatched(mut self, policy: UnmatchedPolicy) -> Self {
        self.unmatched = policy;
        self
    }

    /// Set whether stale chains are halted
    pub fn drop_stale_chains(mut self, drop: bool) -> Self {
        self.drop_stale_chains = drop;
        self
    }

    /// Set the resolution cache capacity
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            unmatched: UnmatchedPolicy::default(),
            drop_stale_chains: true,
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();

        assert_eq!(config.unmatched, UnmatchedPolicy::LeaveAnyway);
        assert!(config.drop_stale_chains);
        assert_eq!(config.cache_capacity, 1000);
    }

    #[test]
    fn test_builder() {
        let config = RouterConfig::new().cache_capacity(0);
        assert_eq!(config.cache_capacity, 0);
        assert_eq!(config.unmatched, UnmatchedPolicy::LeaveAnyway);
    }
}

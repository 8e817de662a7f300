//! Path parameters and query strings
//!
//! [`Params`] holds the captures a matcher extracted from a path, in pattern
//! order. Named captures (`:id`) can be looked up by position or by name,
//! wildcard captures (`*`) only by position. [`QueryParams`] is the decoded
//! form of the part of a path after `?`.

use std::collections::HashMap;
use std::ops::Index;
use url::form_urlencoded;

/// A single value captured from a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Parameter name, `None` for wildcard captures
    pub name: Option<String>,
    /// Captured text, never decoded or coerced
    pub value: String,
}

/// Route parameters extracted from path segments
///
/// # Example
///
/// ```
/// use chain_router::PathMatcher;
///
/// let matcher = PathMatcher::compile("/route/:param/*").unwrap();
/// let params = matcher.extract("/route/param/asterisk").unwrap();
///
/// assert_eq!(params.len(), 2);
/// assert_eq!(&params[0], "param");
/// assert_eq!(&params["param"], "param");
/// assert_eq!(&params[1], "asterisk");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    captures: Vec<Capture>,
}

impl Params {
    /// Create new empty params
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a capture
    pub fn push(&mut self, name: Option<String>, value: impl Into<String>) {
        self.captures.push(Capture {
            name,
            value: value.into(),
        });
    }

    /// Get a capture by position
    pub fn get(&self, index: usize) -> Option<&str> {
        self.captures.get(index).map(|c| c.value.as_str())
    }

    /// Get a named capture
    ///
    /// Wildcard captures have no name and are never returned here.
    pub fn named(&self, name: &str) -> Option<&str> {
        self.captures
            .iter()
            .find(|c| c.name.as_deref() == Some(name))
            .map(|c| c.value.as_str())
    }

    /// Get a named capture and parse it as a specific type
    ///
    /// Returns `None` if the parameter doesn't exist or cannot be parsed.
    pub fn get_as<T>(&self, name: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.named(name)?.parse().ok()
    }

    /// Check if a named capture exists
    pub fn contains(&self, name: &str) -> bool {
        self.named(name).is_some()
    }

    /// Iterate over captures in pattern order
    pub fn iter(&self) -> impl Iterator<Item = &Capture> {
        self.captures.iter()
    }

    /// Captured values in pattern order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.captures.iter().map(|c| c.value.as_str())
    }

    /// Check if there are no captures
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Number of captures, named and wildcard
    pub fn len(&self) -> usize {
        self.captures.len()
    }
}

impl Index<usize> for Params {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.captures[index].value
    }
}

impl Index<&str> for Params {
    type Output = str;

    fn index(&self, name: &str) -> &str {
        self.named(name)
            .unwrap_or_else(|| panic!("no route parameter named '{}'", name))
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Capture;
    type IntoIter = std::slice::Iter<'a, Capture>;

    fn into_iter(self) -> Self::IntoIter {
        self.captures.iter()
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters parsed from URL query string
///
/// Supports multiple values for the same key; [`get`](Self::get) returns the
/// first one.
///
/// # Example
///
/// ```
/// use chain_router::QueryParams;
///
/// let query = QueryParams::from_query_string("page=1&q=hello%20world&tag=a&tag=b");
///
/// assert_eq!(query.get("page"), Some("1"));
/// assert_eq!(query.get("q"), Some("hello world"));
/// assert_eq!(query.get_as::<u32>("page"), Some(1));
/// assert_eq!(query.get_all("tag").len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: HashMap<String, Vec<String>>,
}

impl QueryParams {
    /// Create new empty query params
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a query string (without the leading `?`)
    pub fn from_query_string(query: &str) -> Self {
        let mut params: HashMap<String, Vec<String>> = HashMap::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }

        Self { params }
    }

    /// Get first value for a parameter
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key)?.first().map(String::as_str)
    }

    /// Get all values for a parameter, empty if absent
    pub fn get_all(&self, key: &str) -> &[String] {
        self.params.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get parameter as a specific type
    ///
    /// Returns the first value parsed as type T.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(key)?.parse().ok()
    }

    /// Insert a parameter
    ///
    /// If the key already exists, the value is appended to the list.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.entry(key.into()).or_default().push(value.into());
    }

    /// Check if parameter exists
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Encode back into a query string
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.params {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }

    /// Check if parameters are empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get number of unique parameter keys
    pub fn len(&self) -> usize {
        self.params.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Params {
        let mut params = Params::new();
        params.push(Some("user".to_string()), "alice");
        params.push(None, "docs/readme.md");
        params.push(Some("id".to_string()), "42");
        params
    }

    #[test]
    fn test_positional_and_named_access() {
        let params = sample();

        assert_eq!(params.len(), 3);
        assert_eq!(params.get(0), Some("alice"));
        assert_eq!(params.named("user"), Some("alice"));
        assert_eq!(&params[1], "docs/readme.md");
        assert_eq!(&params["id"], "42");
        assert_eq!(params.get(3), None);
    }

    #[test]
    fn test_wildcards_have_no_name() {
        let params = sample();
        let unnamed: Vec<_> = params.iter().filter(|c| c.name.is_none()).collect();

        assert_eq!(unnamed.len(), 1);
        assert!(!params.contains("*"));
    }

    #[test]
    fn test_get_as() {
        let params = sample();

        assert_eq!(params.get_as::<u32>("id"), Some(42));
        assert_eq!(params.get_as::<u32>("user"), None);
        assert_eq!(params.get_as::<u32>("missing"), None);
    }

    #[test]
    #[should_panic(expected = "no route parameter named 'missing'")]
    fn test_index_by_missing_name_panics() {
        let params = sample();
        let _ = &params["missing"];
    }

    #[test]
    fn test_values_keep_pattern_order() {
        let values: Vec<_> = sample().values().map(str::to_string).collect();
        assert_eq!(values, vec!["alice", "docs/readme.md", "42"]);
    }

    #[test]
    fn test_query_params_basic() {
        let query = QueryParams::from_query_string("key=value&sort=name");

        assert_eq!(query.get("key"), Some("value"));
        assert_eq!(query.get("sort"), Some("name"));
        assert_eq!(query.get("missing"), None);
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn test_query_params_decoding() {
        let query = QueryParams::from_query_string("q=caf%C3%A9+au+lait&a%26b=1");

        assert_eq!(query.get("q"), Some("café au lait"));
        assert_eq!(query.get("a&b"), Some("1"));
    }

    #[test]
    fn test_query_params_multiple_values() {
        let query = QueryParams::from_query_string("tag=rust&tag=wasm");

        assert_eq!(query.get_all("tag"), ["rust", "wasm"]);
        assert_eq!(query.get("tag"), Some("rust"));
        assert!(query.get_all("missing").is_empty());
    }

    #[test]
    fn test_query_params_bare_key() {
        let query = QueryParams::from_query_string("debug");
        assert_eq!(query.get("debug"), Some(""));
    }

    #[test]
    fn test_to_query_string() {
        let mut query = QueryParams::new();
        query.insert("q", "hello world");

        assert_eq!(query.to_query_string(), "q=hello+world");
    }

    #[test]
    fn test_empty_query_string() {
        let query = QueryParams::from_query_string("");
        assert!(query.is_empty());
    }
}

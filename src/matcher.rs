//! Path pattern compilation and matching
//!
//! A pattern is a `/`-delimited list of segments:
//!
//! - `users` is a literal and must match exactly
//! - `:id` is a named parameter capturing one non-empty segment
//! - `*` is a wildcard capturing as much of the path as it can, `/` included,
//!   while still letting the rest of the pattern match
//!
//! Matching is anchored at both ends: `/users/:id` does not match
//! `/users/1/posts`. Unless the matcher is strict, a path with a trailing
//! slash that fails to match is retried without it.

use crate::error::RouterError;
use crate::params::Params;
use crate::trace_log;
use std::collections::HashSet;

/// A single segment in a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text that must match exactly
    Literal(String),
    /// Named parameter capturing one segment
    Param(String),
    /// Wildcard capturing one or more segments
    Wildcard,
}

impl Segment {
    /// Parse a segment from string
    ///
    /// Examples:
    /// - "users" -> Literal("users")
    /// - ":id" -> Param("id")
    /// - "*" -> Wildcard
    fn parse(pattern: &str, raw: &str) -> Result<Self, RouterError> {
        if raw == "*" {
            return Ok(Segment::Wildcard);
        }

        let Some(name) = raw.strip_prefix(':') else {
            return Ok(Segment::Literal(raw.to_string()));
        };

        if name.is_empty() {
            return Err(RouterError::invalid_pattern(
                pattern,
                "parameter name cannot be empty",
            ));
        }

        if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(RouterError::invalid_pattern(
                pattern,
                format!(
                    "parameter '{}' must contain only alphanumeric characters and underscores",
                    name
                ),
            ));
        }

        Ok(Segment::Param(name.to_string()))
    }

    fn captures(&self) -> bool {
        !matches!(self, Segment::Literal(_))
    }
}

/// Compiled form of a route pattern
///
/// # Example
///
/// ```
/// use chain_router::PathMatcher;
///
/// let matcher = PathMatcher::compile("/route/:one/:two").unwrap();
///
/// assert!(matcher.test("/route/1/2"));
/// assert!(!matcher.test("/route/1"));
///
/// let params = matcher.extract("/route/1/2").unwrap();
/// assert_eq!(params.named("one"), Some("1"));
/// assert_eq!(params.get(1), Some("2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatcher {
    pattern: String,
    segments: Vec<Segment>,
    strict: bool,
}

impl PathMatcher {
    /// Compile a pattern, tolerating one trailing slash on matched paths
    pub fn compile(pattern: &str) -> Result<Self, RouterError> {
        Self::build(pattern, false)
    }

    /// Compile a pattern that matches trailing slashes literally
    pub fn compile_strict(pattern: &str) -> Result<Self, RouterError> {
        Self::build(pattern, true)
    }

    fn build(pattern: &str, strict: bool) -> Result<Self, RouterError> {
        let segments = pattern
            .split('/')
            .map(|raw| Segment::parse(pattern, raw))
            .collect::<Result<Vec<_>, _>>()?;

        let mut names = HashSet::new();
        for segment in &segments {
            if let Segment::Param(name) = segment {
                if !names.insert(name.as_str()) {
                    return Err(RouterError::invalid_pattern(
                        pattern,
                        format!("duplicate parameter '{}'", name),
                    ));
                }
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            strict,
        })
    }

    /// The source pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Compiled segments, in pattern order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the captures this matcher produces, `None` for wildcards
    pub fn capture_names(&self) -> impl Iterator<Item = Option<&str>> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Literal(_) => None,
            Segment::Param(name) => Some(Some(name.as_str())),
            Segment::Wildcard => Some(None),
        })
    }

    /// Whether trailing slashes are matched literally
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Check whether a path matches
    pub fn test(&self, path: &str) -> bool {
        self.extract(path).is_some()
    }

    /// Match a path and return its captures in pattern order
    pub fn extract(&self, path: &str) -> Option<Params> {
        if let Some(params) = self.extract_exact(path) {
            return Some(params);
        }

        if self.strict || path.len() <= 1 {
            return None;
        }

        let trimmed = path.strip_suffix('/')?;
        self.extract_exact(trimmed)
    }

    fn extract_exact(&self, path: &str) -> Option<Params> {
        let pieces: Vec<&str> = path.split('/').collect();
        let mut spans = Vec::with_capacity(self.segments.len());

        if !match_from(&self.segments, &pieces, 0, &mut spans) {
            return None;
        }

        trace_log!("'{}' matched '{}'", path, self.pattern);

        let mut params = Params::new();
        let capturing = self.segments.iter().filter(|s| s.captures());
        for (segment, (start, end)) in capturing.zip(spans) {
            let value = pieces[start..end].join("/");
            match segment {
                Segment::Param(name) => params.push(Some(name.clone()), value),
                _ => params.push(None, value),
            }
        }
        Some(params)
    }
}

/// Match `segments` against `pieces[at..]`, recording capture spans
///
/// Every segment consumes at least one piece, which bounds how much a
/// wildcard may take. Wildcards try their longest span first.
fn match_from(
    segments: &[Segment],
    pieces: &[&str],
    at: usize,
    spans: &mut Vec<(usize, usize)>,
) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return at == pieces.len();
    };

    let remaining = pieces.len() - at;
    if remaining < segments.len() {
        return false;
    }

    match segment {
        Segment::Literal(expected) => {
            pieces[at] == expected && match_from(rest, pieces, at + 1, spans)
        }
        Segment::Param(_) => {
            if pieces[at].is_empty() {
                return false;
            }
            spans.push((at, at + 1));
            if match_from(rest, pieces, at + 1, spans) {
                return true;
            }
            spans.pop();
            false
        }
        Segment::Wildcard => {
            let longest = remaining - rest.len();
            for take in (1..=longest).rev() {
                spans.push((at, at + take));
                if match_from(rest, pieces, at + take, spans) {
                    return true;
                }
                spans.pop();
            }
            false
        }
    }
}

//! Route paths.

use std::fmt;

/// A navigation path such as `/login` or `/(tabs)/settings`.
///
/// The empty route stands for "router not mounted yet".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Route {
    path: String,
}

impl Route {
    /// Create a route, normalising slashes.
    pub fn new(path: impl AsRef<str>) -> Self {
        let segments: Vec<&str> = path
            .as_ref()
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            path: format!("/{}", segments.join("/")),
        }
    }

    /// The route of a router that has not mounted yet.
    pub fn unmounted() -> Self {
        Self::default()
    }

    /// Check if the router has mounted.
    pub fn is_mounted(&self) -> bool {
        !self.path.is_empty()
    }

    /// Full path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path segments, without slashes.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }

    /// First path segment, e.g. `login` or `(tabs)`.
    pub fn root_segment(&self) -> Option<&str> {
        self.segments().next()
    }

    /// Check if both routes share a root segment.
    pub fn same_root(&self, other: &Route) -> bool {
        self.is_mounted() && other.is_mounted() && self.root_segment() == other.root_segment()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mounted() {
            f.write_str(&self.path)
        } else {
            f.write_str("<unmounted>")
        }
    }
}

impl From<&str> for Route {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

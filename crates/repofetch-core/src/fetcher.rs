//! Ordered source locations searched for package links.
//!
//! Direct repositories always precede indexes. Resolution code searches the
//! set front to back, so construction order is part of the contract.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Runs of separators collapsed during project name normalization.
static NAME_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").unwrap());

/// Normalize a project name the way simple indexes key their pages.
///
/// ```
/// use repofetch::fetcher::normalize_project_name;
///
/// assert_eq!(normalize_project_name("Foo.Bar__baz"), "foo-bar-baz");
/// ```
pub fn normalize_project_name(name: &str) -> String {
    NAME_SEPARATORS
        .replace_all(name.trim(), "-")
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// A flat location listing artifacts directly.
    Direct,
    /// A simple package index with one page per project.
    Index,
}

impl std::fmt::Display for FetcherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetcherKind::Direct => write!(f, "direct"),
            FetcherKind::Index => write!(f, "index"),
        }
    }
}

/// A named source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fetcher {
    pub kind: FetcherKind,
    pub base_url: String,
}

impl Fetcher {
    pub fn direct(base_url: impl Into<String>) -> Self {
        Self {
            kind: FetcherKind::Direct,
            base_url: base_url.into(),
        }
    }

    pub fn index(base_url: impl Into<String>) -> Self {
        Self {
            kind: FetcherKind::Index,
            base_url: base_url.into(),
        }
    }

    /// Locations to search for `project` at this source.
    pub fn urls(&self, project: &str) -> Vec<String> {
        match self.kind {
            FetcherKind::Direct => vec![self.base_url.clone()],
            FetcherKind::Index => {
                let mut base = self.base_url.clone();
                if !base.ends_with('/') {
                    base.push('/');
                }
                vec![format!("{}{}/", base, normalize_project_name(project))]
            }
        }
    }
}

impl std::fmt::Display for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind, self.base_url)
    }
}

/// Ordered collection of fetchers: direct repositories, then indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetcherSet {
    fetchers: Vec<Fetcher>,
}

impl FetcherSet {
    /// Build the set from configuration lists, preserving each list's order.
    pub fn new<R, I>(repos: R, indexes: I) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let fetchers = repos
            .into_iter()
            .map(Fetcher::direct)
            .chain(indexes.into_iter().map(Fetcher::index))
            .collect();
        Self { fetchers }
    }

    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fetcher> {
        self.fetchers.iter()
    }

    pub fn as_slice(&self) -> &[Fetcher] {
        &self.fetchers
    }

    pub fn directs(&self) -> impl Iterator<Item = &Fetcher> {
        self.iter().filter(|f| f.kind == FetcherKind::Direct)
    }

    pub fn indexes(&self) -> impl Iterator<Item = &Fetcher> {
        self.iter().filter(|f| f.kind == FetcherKind::Index)
    }

    /// Every location to search for `project`, in search order.
    pub fn urls_for(&self, project: &str) -> Vec<String> {
        self.iter().flat_map(|f| f.urls(project)).collect()
    }
}

impl<'a> IntoIterator for &'a FetcherSet {
    type Item = &'a Fetcher;
    type IntoIter = std::slice::Iter<'a, Fetcher>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directs_precede_indexes() {
        let set = FetcherSet::new(["r1", "r2"], ["i1"]);
        assert_eq!(
            set.as_slice(),
            &[
                Fetcher::direct("r1"),
                Fetcher::direct("r2"),
                Fetcher::index("i1"),
            ]
        );
        assert_eq!(set.directs().count(), 2);
        assert_eq!(set.indexes().count(), 1);
    }

    #[test]
    fn test_empty_configuration() {
        let set = FetcherSet::new(Vec::<String>::new(), Vec::<String>::new());
        assert!(set.is_empty());
        assert!(set.urls_for("anything").is_empty());
    }

    #[test]
    fn test_malformed_urls_kept_verbatim() {
        let set = FetcherSet::new(["not a url"], ["::"]);
        assert_eq!(set.as_slice()[0].base_url, "not a url");
        assert_eq!(set.as_slice()[1].base_url, "::");
    }

    #[test]
    fn test_index_urls_normalize_project() {
        let index = Fetcher::index("https://pypi.org/simple");
        assert_eq!(
            index.urls("Django_REST.framework"),
            vec!["https://pypi.org/simple/django-rest-framework/"]
        );

        let direct = Fetcher::direct("https://wheels.example.com/");
        assert_eq!(direct.urls("requests"), vec!["https://wheels.example.com/"]);
    }

    #[test]
    fn test_urls_for_follows_search_order() {
        let set = FetcherSet::new(["https://r/"], ["https://i/simple/"]);
        assert_eq!(
            set.urls_for("Pkg"),
            vec!["https://r/".to_string(), "https://i/simple/pkg/".to_string()]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Fetcher::index("https://i/").to_string(), "index(https://i/)");
    }
}

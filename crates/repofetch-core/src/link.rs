//! Link values: a local file path or a remote URL.

use crate::{FetchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Identifier for content to fetch.
///
/// A link is local iff it carries a filesystem path; local links keep a
/// `file://` form of that path as their URL. Remote URLs are kept as given
/// and are only validated when a request is made.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Link {
    url: String,
    local_path: Option<PathBuf>,
}

impl Link {
    /// Create a remote link. The URL is opaque until it is fetched.
    pub fn remote(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(FetchError::config("remote link requires a non-empty URL"));
        }
        Ok(Self {
            url,
            local_path: None,
        })
    }

    /// Create a link to a local file.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let url = Url::from_file_path(&path)
            .map(String::from)
            .unwrap_or_else(|_| format!("file:{}", path.display()));
        Self {
            url,
            local_path: Some(path),
        }
    }

    /// Interpret user-supplied text as a link.
    ///
    /// `file://` URLs and anything without a URL scheme become local links;
    /// every other URL becomes a remote link.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FetchError::config("empty link"));
        }

        match Url::parse(text) {
            // Single-letter schemes are Windows drive letters, not URLs.
            Ok(url) if url.scheme().len() > 1 => Self::wrap(url),
            _ => Ok(Self::local(text)),
        }
    }

    /// Build a link from a URL reached by resolution.
    pub fn wrap(url: Url) -> Result<Self> {
        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| FetchError::config(format!("not a local file URL: {}", url)))?;
            return Ok(Self {
                url: url.into(),
                local_path: Some(path),
            });
        }
        Self::remote(String::from(url))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_local(&self) -> bool {
        self.local_path.is_some()
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    /// Last path segment of the link, if it has one.
    pub fn filename(&self) -> Option<String> {
        if let Some(path) = &self.local_path {
            return path.file_name().map(|n| n.to_string_lossy().into_owned());
        }
        match Url::parse(&self.url) {
            Ok(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            Err(_) => self
                .url
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl TryFrom<String> for Link {
    type Error = FetchError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Link> for String {
    fn from(link: Link) -> Self {
        link.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_link() {
        let link = Link::parse("https://files.example.com/pkg-1.0.tar.gz").unwrap();
        assert!(!link.is_local());
        assert_eq!(link.local_path(), None);
        assert_eq!(link.url(), "https://files.example.com/pkg-1.0.tar.gz");
        assert_eq!(link.filename().as_deref(), Some("pkg-1.0.tar.gz"));
    }

    #[test]
    fn test_file_url_is_local() {
        let link = Link::parse("file:///tmp/wheels/pkg-1.0-py3-none-any.whl").unwrap();
        assert!(link.is_local());
        assert_eq!(
            link.local_path(),
            Some(Path::new("/tmp/wheels/pkg-1.0-py3-none-any.whl"))
        );
        assert_eq!(link.filename().as_deref(), Some("pkg-1.0-py3-none-any.whl"));
    }

    #[test]
    fn test_bare_path_is_local() {
        let link = Link::parse("/var/cache/pkg.tar.gz").unwrap();
        assert!(link.is_local());
        assert_eq!(link.url(), "file:///var/cache/pkg.tar.gz");

        let relative = Link::parse("dist/pkg.tar.gz").unwrap();
        assert!(relative.is_local());
        assert_eq!(relative.local_path(), Some(Path::new("dist/pkg.tar.gz")));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(Link::parse("   ").is_err());
        assert!(Link::remote("").is_err());
    }

    #[test]
    fn test_wrap_resolved_url() {
        let url = Url::parse("https://cdn.example.com/a/b.whl?sig=1").unwrap();
        let link = Link::wrap(url).unwrap();
        assert!(!link.is_local());
        assert_eq!(link.filename().as_deref(), Some("b.whl"));
    }

    #[test]
    fn test_serde_as_string() {
        let link = Link::parse("https://example.com/simple/").unwrap();
        let json = serde_json::to_string(&link).unwrap();
        assert_eq!(json, "\"https://example.com/simple/\"");

        let back: Link = serde_json::from_str("\"/opt/pkgs/x.zip\"").unwrap();
        assert!(back.is_local());
    }
}

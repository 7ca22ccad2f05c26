//! Configuration-scoped repository state.
//!
//! [`Repositories`] owns one set of [`RepoOptions`] and lazily builds the
//! values derived from them. Each derived value is constructed at most once,
//! even under concurrent first use, and every caller observes the same
//! instance afterwards.

use crate::config::RepoOptions;
use crate::fetcher::FetcherSet;
use crate::network::{HttpLinkClient, NetworkSession, RetryPolicy};
use crate::Result;
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;
use tracing::debug;

/// Repositories, indexes and the network session shared by fetches.
#[derive(Debug)]
pub struct Repositories {
    options: RepoOptions,
    policy: RetryPolicy,
    fetchers: OnceLock<FetcherSet>,
    session: OnceCell<Arc<NetworkSession>>,
}

impl Repositories {
    /// Create a scope from options. Fails only if the retry settings are invalid.
    pub fn new(options: RepoOptions) -> Result<Self> {
        let policy = options.retry_policy()?;
        Ok(Self::with_policy(options, policy))
    }

    /// Create a scope with an explicit retry policy, ignoring the retry fields
    /// of `options`.
    pub fn with_policy(options: RepoOptions, policy: RetryPolicy) -> Self {
        Self {
            options,
            policy,
            fetchers: OnceLock::new(),
            session: OnceCell::new(),
        }
    }

    pub fn options(&self) -> &RepoOptions {
        &self.options
    }

    pub fn repos(&self) -> &[String] {
        &self.options.repos
    }

    pub fn indexes(&self) -> &[String] {
        &self.options.indexes
    }

    pub fn trust_env(&self) -> bool {
        self.options.trust_env
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetchers for this scope, direct repositories first.
    pub fn fetchers(&self) -> &FetcherSet {
        self.fetchers.get_or_init(|| {
            debug!(
                "Building fetchers from {} repos and {} indexes",
                self.options.repos.len(),
                self.options.indexes.len()
            );
            FetcherSet::new(
                self.options.repos.iter().cloned(),
                self.options.indexes.iter().cloned(),
            )
        })
    }

    /// The shared network session, built on first use.
    pub async fn network_session(&self) -> Result<Arc<NetworkSession>> {
        self.session
            .get_or_try_init(|| async {
                NetworkSession::new(
                    self.options.trust_env,
                    self.options.verify,
                    self.policy.clone(),
                )
                .map(Arc::new)
            })
            .await
            .cloned()
    }

    /// A link client over the shared session.
    pub async fn link_client(&self) -> Result<HttpLinkClient> {
        Ok(HttpLinkClient::new(self.network_session().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::Fetcher;

    fn scope(repos: &[&str], indexes: &[&str]) -> Repositories {
        Repositories::new(RepoOptions {
            repos: repos.iter().map(|s| s.to_string()).collect(),
            indexes: indexes.iter().map(|s| s.to_string()).collect(),
            ..RepoOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn test_fetchers_built_once() {
        let repos = scope(&["r1", "r2"], &["i1"]);
        let first = repos.fetchers();
        let second = repos.fetchers();
        assert!(std::ptr::eq(first, second));
        assert_eq!(
            first.as_slice(),
            &[
                Fetcher::direct("r1"),
                Fetcher::direct("r2"),
                Fetcher::index("i1"),
            ]
        );
    }

    #[test]
    fn test_default_scope_searches_pypi() {
        let repos = Repositories::new(RepoOptions::default()).unwrap();
        assert!(repos.repos().is_empty());
        assert_eq!(repos.indexes(), ["https://pypi.org/simple/"]);
        assert!(!repos.trust_env());
    }

    #[tokio::test]
    async fn test_session_is_cached() {
        let repos = scope(&[], &[]);
        let first = repos.network_session().await.unwrap();
        let second = repos.network_session().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.policy(), repos.retry_policy());
    }

    #[tokio::test]
    async fn test_link_clients_share_session() {
        let repos = scope(&[], &[]);
        let a = repos.link_client().await.unwrap();
        let b = repos.link_client().await.unwrap();
        assert!(Arc::ptr_eq(a.session(), b.session()));
    }
}

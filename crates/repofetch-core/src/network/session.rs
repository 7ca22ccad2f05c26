//! HTTP session with a connection-retrying transport.
//!
//! One session is built per configuration scope and shared by every fetch.
//! The wrapped [`reqwest::Client`] owns a connection pool and is safe for
//! concurrent requests. Connection failures (including connect timeouts) are
//! retried here for both `http` and `https`; read timeouts are left to the
//! caller.

use crate::config::NetworkConfig;
use crate::network::retry::{retry_async, RetryPolicy, RetryStats};
use crate::{FetchError, Result};
use reqwest::{redirect, Client, RequestBuilder, Response};
use tracing::{debug, info};

/// Whether a transport error is a read timeout on an established connection.
pub fn is_read_timeout(err: &reqwest::Error) -> bool {
    err.is_timeout() && !err.is_connect()
}

/// Whether a transport error happened while establishing the connection.
pub fn is_connect_failure(err: &reqwest::Error) -> bool {
    err.is_connect()
}

/// Configured HTTP session shared by link operations.
#[derive(Debug)]
pub struct NetworkSession {
    client: Client,
    trust_env: bool,
    verify: bool,
    policy: RetryPolicy,
}

impl NetworkSession {
    /// Build a session. Proxy settings from the environment are honored only
    /// when `trust_env` is set.
    pub fn new(trust_env: bool, verify: bool, policy: RetryPolicy) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(NetworkConfig::USER_AGENT)
            .connect_timeout(policy.connect_timeout())
            .read_timeout(policy.read_timeout())
            .redirect(redirect::Policy::limited(NetworkConfig::MAX_REDIRECTS))
            .danger_accept_invalid_certs(!verify);

        if !trust_env {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(|e| FetchError::Session {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(e),
        })?;

        info!(
            "Created network session (trust_env={}, verify={}, max_retries={})",
            trust_env,
            verify,
            policy.max_retries()
        );

        Ok(Self {
            client,
            trust_env,
            verify,
            policy,
        })
    }

    /// Get a reference to the underlying reqwest client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn trust_env(&self) -> bool {
        self.trust_env
    }

    pub fn verify(&self) -> bool {
        self.verify
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send a request, retrying connection failures up to the policy budget.
    ///
    /// `request` is called once per attempt to build a fresh request.
    pub async fn execute<F>(
        &self,
        url: &str,
        request: F,
    ) -> (std::result::Result<Response, reqwest::Error>, RetryStats)
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let config = self.policy.connect_retry_config();
        let label = format!("Connecting to {}", url);

        retry_async(
            &config,
            &label,
            || {
                debug!("Sending request to {}", url);
                request(&self.client).send()
            },
            is_connect_failure,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_session_keeps_configuration() {
        let policy = RetryPolicy::new().with_max_retries(2);
        let session = NetworkSession::new(true, false, policy.clone()).unwrap();
        assert!(session.trust_env());
        assert!(!session.verify());
        assert_eq!(session.policy(), &policy);
    }

    #[tokio::test]
    async fn test_connection_refused_is_retried_in_transport() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{}/", port);

        let policy = RetryPolicy::new()
            .with_max_retries(2)
            .with_connect_backoff(Duration::from_millis(5), Duration::from_millis(20))
            .with_jitter(false);
        let session = NetworkSession::new(false, true, policy).unwrap();

        let (result, stats) = session.execute(&url, |client| client.get(&url)).await;
        let err = result.unwrap_err();
        assert!(is_connect_failure(&err));
        assert!(!is_read_timeout(&err));
        assert_eq!(stats.attempts, 3);
        assert!(stats.exhausted);
    }
}

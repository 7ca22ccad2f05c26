//! Network layer for link fetching.
//!
//! This module provides:
//! - Bounded retry with optional backoff and retry statistics
//! - An HTTP session whose transport retries connection failures
//! - The `LinkClient` operations (`open`, `resolve`) built on the session

mod client;
mod retry;
mod session;

pub use client::{HttpLinkClient, LinkClient, LinkReader};
pub use retry::{retry_async, RetryConfig, RetryPolicy, RetryStats};
pub use session::{is_connect_failure, is_read_timeout, NetworkSession};

//! repofetch - retry-aware link fetching for package repositories.
//!
//! Given a list of direct repositories and package indexes, this crate builds
//! the ordered set of fetchers to search and a shared HTTP session, and
//! exposes link operations on top of it:
//!
//! - `open` streams the content behind a link, reading local paths directly
//!   and retrying remote GETs that stall past the read timeout
//! - `resolve` follows redirects to a link's canonical URL
//!
//! # Example
//!
//! ```rust,ignore
//! use repofetch::{Link, LinkClient, RepoOptions, Repositories};
//!
//! #[tokio::main]
//! async fn main() -> repofetch::Result<()> {
//!     let repos = Repositories::new(RepoOptions::default())?;
//!     for url in repos.fetchers().urls_for("requests") {
//!         println!("search {}", url);
//!     }
//!
//!     let client = repos.link_client().await?;
//!     let link = Link::parse("https://example.com/pkg-1.0.tar.gz")?;
//!     let canonical = client.resolve(&link).await?;
//!     let bytes = client.open(&canonical).await?.read_to_end().await?;
//!     println!("{} bytes", bytes.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fetcher;
pub mod link;
pub mod network;
pub mod repos;

pub use config::{NetworkConfig, RepoOptions};
pub use error::{FetchError, Result};
pub use fetcher::{Fetcher, FetcherKind, FetcherSet};
pub use link::Link;
pub use network::{
    HttpLinkClient, LinkClient, LinkReader, NetworkSession, RetryPolicy, RetryStats,
};
pub use repos::Repositories;

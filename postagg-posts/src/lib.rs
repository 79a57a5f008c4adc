#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! Blog post aggregation for [Postagg](../postagg/index.html).
//!
//! A request flows through this crate in a single pass:
//!
//! 1. [`AggregationRequest::validate`] checks the raw query parameters.
//! 2. [`Aggregator::aggregate`] asks a [`PostSource`] for the posts of every
//!    tag and merges them, keeping the first post seen for each identifier.
//! 3. [`Aggregation::sorted`] orders the merged posts.
//! 4. [`PostsResponse`] serializes the result.

mod aggregate;
mod domain;
mod request;
mod response;
mod sort;

use async_trait::async_trait;
use thiserror::Error;

pub use crate::aggregate::{
    merge_first_seen, Aggregation, Aggregator, DEFAULT_MAX_CONCURRENT_FETCHES,
};
pub use crate::domain::Post;
pub use crate::request::{split_tags, AggregationRequest, Direction, SortBy, ValidationError};
pub use crate::response::PostsResponse;
pub use crate::sort::sort_posts;

/// The posts an upstream returned for one tag, along with related metadata.
#[derive(Clone, Debug)]
pub struct SourceResponse {
    /// The relation of this response to the cache it came from, if any.
    pub cache_status: CacheStatus,

    /// The posts, in the order the upstream listed them.
    pub posts: Vec<Post>,
}

impl SourceResponse {
    /// Create a new response containing the given posts, not related to any cache.
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            cache_status: CacheStatus::NoCache,
        }
    }

    /// Change the cache status of this response.
    pub fn with_cache_status(mut self, cache_status: CacheStatus) -> Self {
        self.cache_status = cache_status;
        self
    }
}

/// The relation between an object and a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The object was pulled fresh from the cache.
    Hit,
    /// The object was not available from the cache, and was fetched.
    Miss,
    /// No cache was consulted for this response.
    NoCache,
    /// The response is made of posts from multiple sources that have varying cache status.
    Mixed,
}

impl CacheStatus {
    /// Combine the statuses of two responses that are merged into one.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (a, CacheStatus::NoCache) | (CacheStatus::NoCache, a) => a,
            _ => CacheStatus::Mixed,
        }
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::NoCache => "no-cache",
            CacheStatus::Mixed => "mixed",
        })
    }
}

/// A backend that can list the posts carrying a tag.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// An operator-visible name for this post source.
    fn name(&self) -> String;

    /// A key that identifies the upstream resource holding the posts for
    /// `tag`. Two tags with the same key must produce the same posts.
    ///
    /// Sources backed by HTTP should return the full request URL.
    fn cache_key(&self, tag: &str) -> String {
        format!("{}:{}", self.name(), tag)
    }

    /// List the posts carrying `tag`, in upstream order.
    async fn posts_for_tag(&self, tag: &str) -> Result<SourceResponse, SourceError>;
}

/// Errors that may occur while setting up a post source.
#[derive(Debug, Error)]
#[allow(missing_docs, clippy::missing_docs_in_private_items)]
pub enum SetupError {
    #[error("This post source cannot be used with the current configuration")]
    InvalidConfiguration(#[source] anyhow::Error),

    #[error("There was a network error while setting up this post source")]
    Network(#[source] anyhow::Error),
}

/// Errors that may occur while listing posts.
#[derive(Debug, Error)]
#[allow(missing_docs, clippy::missing_docs_in_private_items)]
pub enum SourceError {
    #[error("There was a network error while fetching posts: {0}")]
    Network(#[source] anyhow::Error),

    #[error("The upstream answered with status {0}")]
    Status(u16),

    #[error("The upstream response was not in the expected format: {0}")]
    Format(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::{CacheStatus, PostSource, SourceError, SourceResponse};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct NamedSource;

    #[async_trait]
    impl PostSource for NamedSource {
        fn name(&self) -> String {
            "named".to_string()
        }

        async fn posts_for_tag(&self, _tag: &str) -> Result<SourceResponse, SourceError> {
            unimplemented!()
        }
    }

    #[test]
    fn default_cache_key_includes_name_and_tag() {
        assert_eq!(NamedSource.cache_key("tech"), "named:tech");
        assert_ne!(NamedSource.cache_key("tech"), NamedSource.cache_key("history"));
    }

    #[test]
    fn cache_status_combines() {
        use CacheStatus::*;
        assert_eq!(Hit.combine(Hit), Hit);
        assert_eq!(Miss.combine(NoCache), Miss);
        assert_eq!(NoCache.combine(Hit), Hit);
        assert_eq!(Hit.combine(Miss), Mixed);
        assert_eq!(Mixed.combine(Hit), Mixed);
    }

    #[test]
    fn cache_status_displays_as_header_value() {
        assert_eq!(CacheStatus::NoCache.to_string(), "no-cache");
        assert_eq!(CacheStatus::Hit.to_string(), "hit");
    }
}

//! Merging the posts of several tags into one deduplicated collection.

use crate::{
    sort_posts, AggregationRequest, CacheStatus, Direction, Post, PostSource, SortBy, SourceError,
    SourceResponse,
};
use futures::{stream, StreamExt, TryStreamExt};
use std::{collections::HashSet, sync::Arc};

/// How many tags are fetched at once unless configured otherwise.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Drives a [`PostSource`] once per requested tag and merges the results.
#[derive(Clone)]
pub struct Aggregator {
    /// Where posts come from.
    source: Arc<dyn PostSource>,

    /// The most tags fetched at the same time for one request.
    max_concurrent_fetches: usize,
}

/// The merged posts of an aggregation, before sorting.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// The deduplicated posts, in tag order, then upstream order.
    pub posts: Vec<Post>,

    /// The cache status of all the upstream responses, combined.
    pub cache_status: CacheStatus,
}

impl Aggregator {
    /// Create an aggregator that reads from `source`.
    pub fn new(source: Box<dyn PostSource>) -> Self {
        Self {
            source: Arc::from(source),
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    /// Limit how many tags of one request are fetched at the same time. A
    /// limit of zero is treated as one.
    #[must_use]
    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit.max(1);
        self
    }

    /// The name of the post source this aggregator reads from.
    pub fn source_name(&self) -> String {
        self.source.name()
    }

    /// Fetch the posts of every tag of `request` and merge them.
    ///
    /// Up to `max_concurrent_fetches` tags are queried at once. Responses are
    /// merged in the order the tags were submitted, so the result does not
    /// depend on which response arrives first.
    ///
    /// # Errors
    /// The first error returned by the post source. One failing tag fails the
    /// whole aggregation.
    pub async fn aggregate(&self, request: &AggregationRequest) -> Result<Aggregation, SourceError> {
        let responses: Vec<SourceResponse> = stream::iter(request.tags())
            .map(|tag| self.source.posts_for_tag(tag))
            .buffered(self.max_concurrent_fetches)
            .try_collect()
            .await?;

        let cache_status = responses
            .iter()
            .map(|response| response.cache_status)
            .reduce(CacheStatus::combine)
            .unwrap_or(CacheStatus::NoCache);
        let fetched: usize = responses.iter().map(|response| response.posts.len()).sum();

        let posts = merge_first_seen(responses.into_iter().map(|response| response.posts));
        tracing::debug!(
            r#type = "posts.aggregate",
            tags = request.tags().len(),
            fetched,
            unique = posts.len(),
            %cache_status,
            "Merged upstream posts"
        );

        Ok(Aggregation {
            posts,
            cache_status,
        })
    }
}

impl Aggregation {
    /// Order the merged posts, consuming the aggregation.
    #[must_use]
    pub fn sorted(mut self, sort_by: SortBy, direction: Direction) -> Self {
        sort_posts(&mut self.posts, sort_by, direction);
        self
    }
}

/// Concatenate `pages` in order, keeping only the first post seen for each
/// identifier.
pub fn merge_first_seen<I>(pages: I) -> Vec<Post>
where
    I: IntoIterator<Item = Vec<Post>>,
{
    let mut seen = HashSet::new();
    pages
        .into_iter()
        .flatten()
        .filter(|post| seen.insert(post.id))
        .collect()
}

//! The JSON document returned for an aggregation.

use crate::Post;
use serde::Serialize;

/// The body of a successful aggregation: `{"posts": [...]}`.
///
/// Posts serialize their fields as `author`, `authorId`, `id`, `likes`,
/// `popularity`, `reads`, `tags`, in that order.
#[derive(Debug, Serialize)]
pub struct PostsResponse<'a> {
    /// The sorted posts.
    pub posts: &'a [Post],
}

impl<'a> PostsResponse<'a> {
    /// Wrap `posts` for serialization.
    pub fn new(posts: &'a [Post]) -> Self {
        Self { posts }
    }
}

//! Canned upstream responses for the mock upstream server.

use httpmock::{Method::GET, Mock, MockServer};
use serde_json::{json, Value};

/// A post in the upstream's JSON format.
///
/// Reads and popularity are derived from `id` so that every sort key is
/// distinct from the others.
pub fn post_json(id: i64, likes: i64, tags: &[&str]) -> Value {
    json!({
        "author": format!("Author {}", id),
        "authorId": id % 7,
        "id": id,
        "likes": likes,
        "popularity": (id % 10) as f64 / 10.0,
        "reads": 1000 - id * 3,
        "tags": tags,
    })
}

/// Make the upstream answer `GET /posts?tag=<tag>` with `posts`.
pub async fn mock_tag<'a>(upstream: &'a MockServer, tag: &str, posts: Vec<Value>) -> Mock<'a> {
    upstream
        .mock_async(|when, then| {
            when.method(GET).path("/posts").query_param("tag", tag);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "posts": posts }));
        })
        .await
}

//! Datatypes to represent the domain of Postagg.

use fake::{
    faker::{lorem::en::Words, name::en::Name},
    Fake,
};
use serde::{Deserialize, Serialize};

/// A blog post, as listed by the upstream API.
///
/// Field order matters: it is the order fields are serialized in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// The name of the author.
    pub author: String,

    /// The upstream identifier of the author.
    pub author_id: i64,

    /// The upstream identifier of the post. Unique within an aggregation.
    pub id: i64,

    /// How many likes the post has.
    pub likes: i64,

    /// The popularity score of the post, usually between 0 and 1.
    pub popularity: f64,

    /// How many times the post has been read.
    pub reads: i64,

    /// The tags the post is filed under.
    pub tags: Vec<String>,
}

impl<F> fake::Dummy<F> for Post {
    fn dummy_with_rng<R: rand::Rng + ?Sized>(_config: &F, rng: &mut R) -> Self {
        Self {
            author: Name().fake_with_rng(rng),
            author_id: rng.gen_range(1..100),
            id: rng.gen_range(1..10_000),
            likes: rng.gen_range(0..2_000),
            popularity: f64::from(rng.gen_range(0_u32..=100)) / 100.0,
            reads: rng.gen_range(0..100_000),
            tags: Words(1..4).fake_with_rng::<Vec<String>, R>(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Post;
    use fake::{Fake, Faker};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn deserializes_upstream_records_ignoring_unknown_fields() {
        let post: Post = serde_json::from_value(json!({
            "author": "Rylee Paul",
            "authorId": 9,
            "id": 1,
            "likes": 960,
            "popularity": 0.13,
            "reads": 50361,
            "tags": ["tech", "health"],
            "title": "not part of the model"
        }))
        .expect("valid post");

        assert_eq!(
            post,
            Post {
                author: "Rylee Paul".to_string(),
                author_id: 9,
                id: 1,
                likes: 960,
                popularity: 0.13,
                reads: 50361,
                tags: vec!["tech".to_string(), "health".to_string()],
            }
        );
    }

    #[test]
    fn missing_fields_are_rejected() {
        let result: Result<Post, _> = serde_json::from_value(json!({
            "author": "Rylee Paul",
            "id": 1,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn dummy_posts_have_valid_metrics() {
        for _ in 0..50 {
            let post: Post = Faker.fake();
            assert!(post.likes >= 0);
            assert!(post.reads >= 0);
            assert!((0.0..=1.0).contains(&post.popularity));
            assert!(!post.tags.is_empty());
        }
    }
}

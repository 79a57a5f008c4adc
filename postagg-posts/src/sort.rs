//! Ordering of aggregated posts.

use crate::{Direction, Post, SortBy};
use std::cmp::Ordering;

impl SortBy {
    /// Compare two posts by this field, in ascending order.
    pub fn compare(self, a: &Post, b: &Post) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Reads => a.reads.cmp(&b.reads),
            Self::Likes => a.likes.cmp(&b.likes),
            Self::Popularity => a.popularity.total_cmp(&b.popularity),
        }
    }
}

/// Sort `posts` in place by `sort_by`, in `direction`.
///
/// The sort is stable in both directions: posts with equal keys keep their
/// relative order.
pub fn sort_posts(posts: &mut [Post], sort_by: SortBy, direction: Direction) {
    posts.sort_by(|a, b| {
        let ordering = sort_by.compare(a, b);
        match direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::sort_posts;
    use crate::{Direction, Post, SortBy};
    use fake::{Fake, Faker};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn post(id: i64, likes: i64) -> Post {
        Post {
            id,
            likes,
            ..Faker.fake()
        }
    }

    fn ids(posts: &[Post]) -> Vec<i64> {
        posts.iter().map(|p| p.id).collect()
    }

    #[test]
    fn likes_descending_keeps_ties_in_merge_order() {
        let mut posts = vec![post(1, 5), post(2, 20), post(3, 3), post(4, 20)];
        sort_posts(&mut posts, SortBy::Likes, Direction::Desc);
        assert_eq!(ids(&posts), vec![2, 4, 1, 3]);
    }

    #[test]
    fn likes_ascending_keeps_ties_in_merge_order() {
        let mut posts = vec![post(4, 20), post(1, 5), post(2, 20), post(3, 3)];
        sort_posts(&mut posts, SortBy::Likes, Direction::Asc);
        assert_eq!(ids(&posts), vec![3, 1, 4, 2]);
    }

    #[test]
    fn popularity_sorts_by_float_value() {
        let mut posts: Vec<Post> = [(1, 0.5), (2, 0.05), (3, 0.95)]
            .iter()
            .map(|&(id, popularity)| Post {
                id,
                popularity,
                ..Faker.fake()
            })
            .collect();
        sort_posts(&mut posts, SortBy::Popularity, Direction::Asc);
        assert_eq!(ids(&posts), vec![2, 1, 3]);
    }

    /// The key a post is sorted by, as a float so every field compares alike.
    fn key(post: &Post, sort_by: SortBy) -> f64 {
        match sort_by {
            SortBy::Id => post.id as f64,
            SortBy::Reads => post.reads as f64,
            SortBy::Likes => post.likes as f64,
            SortBy::Popularity => post.popularity,
        }
    }

    fn any_sort_by() -> impl Strategy<Value = SortBy> {
        prop_oneof![
            Just(SortBy::Id),
            Just(SortBy::Reads),
            Just(SortBy::Likes),
            Just(SortBy::Popularity),
        ]
    }

    fn any_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![Just(Direction::Asc), Just(Direction::Desc)]
    }

    fn any_posts() -> impl Strategy<Value = Vec<Post>> {
        prop::collection::vec((0_i64..20, 0_i64..20, 0_i64..20, 0_u32..20), 0..40).prop_map(
            |rows| {
                rows.into_iter()
                    .enumerate()
                    .map(|(index, (author_id, likes, reads, popularity))| Post {
                        author: format!("author {}", author_id),
                        author_id,
                        id: index as i64,
                        likes,
                        popularity: f64::from(popularity) / 20.0,
                        reads,
                        tags: vec!["tech".to_string()],
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn sorted_posts_are_monotonic(
            mut posts in any_posts(),
            sort_by in any_sort_by(),
            direction in any_direction(),
        ) {
            let original_len = posts.len();
            sort_posts(&mut posts, sort_by, direction);
            prop_assert_eq!(posts.len(), original_len);

            for pair in posts.windows(2) {
                let (a, b) = (key(&pair[0], sort_by), key(&pair[1], sort_by));
                match direction {
                    Direction::Asc => prop_assert!(a <= b),
                    Direction::Desc => prop_assert!(a >= b),
                }
            }
        }

        #[test]
        fn equal_keys_keep_their_original_order(
            mut posts in any_posts(),
            sort_by in any_sort_by(),
            direction in any_direction(),
        ) {
            // Identifiers are assigned in original order, so ties must have
            // increasing identifiers after sorting.
            sort_posts(&mut posts, sort_by, direction);
            for pair in posts.windows(2) {
                if key(&pair[0], sort_by) == key(&pair[1], sort_by) {
                    prop_assert!(pair[0].id < pair[1].id);
                }
            }
        }
    }
}

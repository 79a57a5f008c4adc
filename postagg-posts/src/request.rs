//! Validation of the raw query parameters of an aggregation.

use std::{fmt, str::FromStr};
use thiserror::Error;

/// The reasons a set of query parameters can be rejected.
///
/// Only the first failing check is reported, in the order of the variants below.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// No tags were given, or the first tag is empty.
    #[error("Tags parameter is required")]
    TagsRequired,

    /// `sortBy` names a field posts cannot be sorted by.
    #[error("sortBy parameter is invalid")]
    InvalidSortBy,

    /// `direction` is neither `asc` nor `desc`.
    #[error("direction parameter is invalid")]
    InvalidDirection,
}

/// The field posts are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// The post identifier.
    #[default]
    Id,
    /// The number of reads.
    Reads,
    /// The number of likes.
    Likes,
    /// The popularity score.
    Popularity,
}

impl FromStr for SortBy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "reads" => Ok(Self::Reads),
            "likes" => Ok(Self::Likes),
            "popularity" => Ok(Self::Popularity),
            _ => Err(ValidationError::InvalidSortBy),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Id => "id",
            Self::Reads => "reads",
            Self::Likes => "likes",
            Self::Popularity => "popularity",
        })
    }
}

/// The direction posts are ordered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl FromStr for Direction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ValidationError::InvalidDirection),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// Split the comma separated `tags` query parameter into its parts.
///
/// Empty parts are kept, so that `""` becomes `[""]`, which validation rejects.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(ToOwned::to_owned).collect()
}

/// A validated request to aggregate posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationRequest {
    /// The tags to query, non-empty, without duplicates, in submission order.
    tags: Vec<String>,
    /// The field to sort by.
    sort_by: SortBy,
    /// The direction to sort in.
    direction: Direction,
}

impl AggregationRequest {
    /// Check raw query parameters and build a request from them.
    ///
    /// The tags are checked first, then `sort_by`, then `direction`, and the
    /// first failure is returned. Once valid, empty tags are dropped and repeated
    /// tags are collapsed to their first occurrence.
    ///
    /// # Errors
    /// The [`ValidationError`] of the first failing check.
    pub fn validate(
        tags: Vec<String>,
        sort_by: &str,
        direction: &str,
    ) -> Result<Self, ValidationError> {
        match tags.first() {
            Some(first) if !first.is_empty() => {}
            _ => return Err(ValidationError::TagsRequired),
        }
        let sort_by = sort_by.parse()?;
        let direction = direction.parse()?;

        let mut unique_tags: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !tag.is_empty() && !unique_tags.contains(&tag) {
                unique_tags.push(tag);
            }
        }

        Ok(Self {
            tags: unique_tags,
            sort_by,
            direction,
        })
    }

    /// The tags to query, in submission order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// The field to sort by.
    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    /// The direction to sort in.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::{split_tags, AggregationRequest, Direction, SortBy, ValidationError};
    use parameterized::parameterized;
    use pretty_assertions::assert_eq;

    fn tags(raw: &str) -> Vec<String> {
        split_tags(raw)
    }

    #[test]
    fn empty_tags_parameter_splits_to_one_empty_tag() {
        assert_eq!(split_tags(""), vec![String::new()]);
        assert_eq!(split_tags("tech,history"), vec!["tech", "history"]);
    }

    #[parameterized(
        raw_tags = { "", "", ",tech", "tech", "tech", "tech" },
        sort_by = { "id", "nothing", "likes", "nothing", "likes", "nothing" },
        direction = { "asc", "none", "desc", "none", "none", "asc" },
        expected = {
            ValidationError::TagsRequired,
            ValidationError::TagsRequired,
            ValidationError::TagsRequired,
            ValidationError::InvalidSortBy,
            ValidationError::InvalidDirection,
            ValidationError::InvalidSortBy,
        }
    )]
    fn first_failing_check_is_reported(
        raw_tags: &str,
        sort_by: &str,
        direction: &str,
        expected: ValidationError,
    ) {
        pretty_assertions::assert_eq!(
            AggregationRequest::validate(tags(raw_tags), sort_by, direction),
            Err(expected)
        );
    }

    #[test]
    fn empty_tag_list_is_rejected() {
        assert_eq!(
            AggregationRequest::validate(vec![], "id", "asc"),
            Err(ValidationError::TagsRequired)
        );
    }

    #[parameterized(
        sort_by = { "id", "reads", "likes", "popularity" },
        expected = { SortBy::Id, SortBy::Reads, SortBy::Likes, SortBy::Popularity }
    )]
    fn every_sort_field_is_accepted(sort_by: &str, expected: SortBy) {
        let request = AggregationRequest::validate(tags("tech"), sort_by, "desc")
            .expect("valid request");
        pretty_assertions::assert_eq!(request.sort_by(), expected);
        pretty_assertions::assert_eq!(request.direction(), Direction::Desc);
        pretty_assertions::assert_eq!(request.sort_by().to_string(), sort_by);
    }

    #[test]
    fn sort_fields_are_case_sensitive() {
        assert_eq!(
            AggregationRequest::validate(tags("tech"), "Likes", "asc"),
            Err(ValidationError::InvalidSortBy)
        );
        assert_eq!(
            AggregationRequest::validate(tags("tech"), "likes", "ASC"),
            Err(ValidationError::InvalidDirection)
        );
    }

    #[test]
    fn tags_are_normalized_in_submission_order() {
        let request = AggregationRequest::validate(tags("tech,,history,tech"), "id", "asc")
            .expect("valid request");
        assert_eq!(request.tags().to_vec(), vec!["tech", "history"]);
    }

    #[test]
    fn error_messages_are_human_readable() {
        assert_eq!(
            ValidationError::TagsRequired.to_string(),
            "Tags parameter is required"
        );
        assert_eq!(
            ValidationError::InvalidSortBy.to_string(),
            "sortBy parameter is invalid"
        );
        assert_eq!(
            ValidationError::InvalidDirection.to_string(),
            "direction parameter is invalid"
        );
    }

    #[test]
    fn defaults_match_query_defaults() {
        assert_eq!(SortBy::default(), SortBy::Id);
        assert_eq!(Direction::default(), Direction::Asc);
    }
}

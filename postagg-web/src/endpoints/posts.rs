//! Web handlers for the posts aggregation API.

use crate::errors::HandlerError;
use actix_web::{
    get,
    web::{self, Data},
    HttpResponse,
};
use cadence::{Histogrammed, StatsdClient};
use postagg_posts::{split_tags, AggregationRequest, Aggregator, PostsResponse};

/// The header reporting how the upstream responses relate to the cache.
const CACHE_HEADER: &str = "X-Cache";

/// The raw query parameters of a posts request, before validation.
#[derive(Debug, PartialEq, Eq)]
pub struct PostsQuery {
    /// Comma separated tags.
    tags: String,

    /// The field to sort by.
    sort_by: String,

    /// `asc` or `desc`.
    direction: String,
}

impl PostsQuery {
    /// Pick the parameters out of the decoded query string pairs.
    ///
    /// A repeated key keeps its first value, and unknown keys are ignored.
    /// Absent parameters get their defaults: no tags, `id` and `asc`.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut tags = None;
        let mut sort_by = None;
        let mut direction = None;

        for (key, value) in pairs {
            let slot = match key.as_str() {
                "tags" => &mut tags,
                "sortBy" => &mut sort_by,
                "direction" => &mut direction,
                _ => continue,
            };
            slot.get_or_insert(value);
        }

        Self {
            tags: tags.unwrap_or_default(),
            sort_by: sort_by.unwrap_or_else(|| "id".to_string()),
            direction: direction.unwrap_or_else(|| "asc".to_string()),
        }
    }
}

/// List the deduplicated, sorted posts of every requested tag.
#[get("/posts")]
#[tracing::instrument(skip(query, aggregator, metrics_client))]
pub async fn posts(
    query: web::Query<Vec<(String, String)>>,
    aggregator: Data<Aggregator>,
    metrics_client: Data<StatsdClient>,
) -> Result<HttpResponse, HandlerError> {
    let PostsQuery {
        tags,
        sort_by,
        direction,
    } = PostsQuery::from_pairs(query.into_inner());
    tracing::debug!(
        r#type = "web.posts.request",
        %tags,
        %sort_by,
        %direction,
        "Handling posts request"
    );

    let request = AggregationRequest::validate(split_tags(&tags), &sort_by, &direction)
        .map_err(|error| {
            tracing::info!(r#type = "web.posts.invalid", %error, "Rejected posts request");
            error
        })?;

    let aggregation = aggregator
        .aggregate(&request)
        .await
        .map_err(|error| {
            tracing::error!(
                r#type = "web.posts.upstream-error",
                %error,
                source = %aggregator.source_name(),
                "Error aggregating posts"
            );
            error
        })?
        .sorted(request.sort_by(), request.direction());

    metrics_client
        .histogram("posts.response-size", aggregation.posts.len() as u64)
        .ok();

    Ok(HttpResponse::Ok()
        .insert_header((CACHE_HEADER, aggregation.cache_status.to_string()))
        .json(PostsResponse::new(&aggregation.posts)))
}

#[cfg(test)]
mod tests {
    use super::{posts, PostsQuery};
    use actix_web::{http::StatusCode, test, web::Data, App};
    use async_trait::async_trait;
    use cadence::{NopMetricSink, StatsdClient};
    use postagg_posts::{Aggregator, Post, PostSource, SourceError, SourceResponse};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    /// Answers `tech` and `history` from fixed pages, and fails every other tag.
    struct FixedSource;

    fn post(id: i64, likes: i64, tag: &str) -> Post {
        Post {
            author: format!("author {}", id),
            author_id: id * 10,
            id,
            likes,
            popularity: 0.5,
            reads: 100 * id,
            tags: vec![tag.to_string()],
        }
    }

    #[async_trait]
    impl PostSource for FixedSource {
        fn name(&self) -> String {
            "fixed".to_string()
        }

        async fn posts_for_tag(&self, tag: &str) -> Result<SourceResponse, SourceError> {
            match tag {
                "tech" => Ok(SourceResponse::new(vec![
                    post(1, 5, "tech"),
                    post(2, 20, "tech"),
                    post(3, 3, "tech"),
                    post(4, 20, "tech"),
                ])),
                "history" => Ok(SourceResponse::new(vec![
                    post(4, 20, "history"),
                    post(5, 1, "history"),
                ])),
                _ => Err(SourceError::Status(500)),
            }
        }
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(Aggregator::new(Box::new(FixedSource))))
                .app_data(Data::new(StatsdClient::from_sink("", NopMetricSink)))
                .service(posts),
        )
        .await;
        let request = test::TestRequest::get().uri(uri).to_request();
        let response = test::call_service(&app, request).await;
        let status = response.status();
        let body: Value = test::read_body_json(response).await;
        (status, body)
    }

    fn ids(body: &Value) -> Vec<i64> {
        body["posts"]
            .as_array()
            .expect("posts array")
            .iter()
            .map(|post| post["id"].as_i64().expect("numeric id"))
            .collect()
    }

    #[actix_rt::test]
    async fn missing_tags_are_rejected() {
        let (status, body) = get("/posts").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Tags parameter is required" }));
    }

    #[actix_rt::test]
    async fn empty_tags_win_over_other_invalid_parameters() {
        let (status, body) = get("/posts?tags=&sortBy=nothing&direction=none").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Tags parameter is required" }));
    }

    #[actix_rt::test]
    async fn invalid_direction_is_rejected() {
        let (status, body) = get("/posts?tags=tech&direction=sideways").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "direction parameter is invalid" }));
    }

    #[actix_rt::test]
    async fn defaults_sort_by_id_ascending() {
        let (status, body) = get("/posts?tags=history,tech").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![1, 2, 3, 4, 5]);
        assert_eq!(body["posts"][3]["tags"], json!(["history"]));
    }

    #[actix_rt::test]
    async fn likes_descending_keeps_ties_in_merge_order() {
        let (status, body) = get("/posts?tags=tech&sortBy=likes&direction=desc").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![2, 4, 1, 3]);
    }

    #[::core::prelude::v1::test]
    fn repeated_keys_keep_their_first_value() {
        let pairs = vec![
            ("sortBy".to_string(), "likes".to_string()),
            ("tags".to_string(), "tech".to_string()),
            ("sortBy".to_string(), "id".to_string()),
            ("page".to_string(), "2".to_string()),
            ("tags".to_string(), "history".to_string()),
        ];

        assert_eq!(
            PostsQuery::from_pairs(pairs),
            PostsQuery {
                tags: "tech".to_string(),
                sort_by: "likes".to_string(),
                direction: "asc".to_string(),
            }
        );
    }

    #[actix_rt::test]
    async fn repeated_tags_use_the_first_value() {
        let (status, body) = get("/posts?tags=tech&tags=history").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![1, 2, 3, 4]);
    }

    #[actix_rt::test]
    async fn repeated_sort_parameters_use_the_first_value() {
        let (status, body) =
            get("/posts?tags=tech&sortBy=likes&sortBy=id&direction=desc&direction=asc").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![2, 4, 1, 3]);
    }

    #[actix_rt::test]
    async fn repeated_invalid_parameters_still_answer_json() {
        let (status, body) = get("/posts?tags=tech&sortBy=author&sortBy=id").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "sortBy parameter is invalid" }));
    }

    #[actix_rt::test]
    async fn upstream_failures_are_bad_gateway() {
        let (status, body) = get("/posts?tags=tech,science").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({ "error": "Upstream post source is unavailable" }));
    }
}

//! Tests of the `/api/posts` aggregation endpoint against a mock upstream.
#![cfg(test)]

use crate::{mock_tag, post_json, postagg_test, TestingTools};
use anyhow::Result;
use httpmock::Method::GET;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::{json, Value};

/// The identifiers of the posts in a posts document, in order.
fn ids(body: &Value) -> Vec<i64> {
    body["posts"]
        .as_array()
        .expect("posts array")
        .iter()
        .map(|post| post["id"].as_i64().expect("numeric id"))
        .collect()
}

#[actix_rt::test]
async fn missing_tags_are_a_bad_request() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            let any_tag = upstream_mock
                .mock_async(|when, then| {
                    when.method(GET).path("/posts");
                    then.status(200).json_body(json!({ "posts": [] }));
                })
                .await;

            let response = test_client
                .get("/api/posts?sortBy=nothing&direction=none")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                response.json::<Value>().await?,
                json!({ "error": "Tags parameter is required" })
            );
            assert_eq!(any_tag.hits_async().await, 0);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn invalid_sort_by_is_a_bad_request() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools { test_client, .. }| async move {
            let response = test_client
                .get("/api/posts?tags=tech&sortBy=author")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                response.json::<Value>().await?,
                json!({ "error": "sortBy parameter is invalid" })
            );

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn invalid_direction_is_a_bad_request() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools { test_client, .. }| async move {
            let response = test_client
                .get("/api/posts?tags=tech&sortBy=likes&direction=up")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                response.json::<Value>().await?,
                json!({ "error": "direction parameter is invalid" })
            );

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn likes_descending_keeps_ties_in_upstream_order() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            let tech = mock_tag(
                &upstream_mock,
                "tech",
                vec![
                    post_json(1, 5, &["tech"]),
                    post_json(2, 20, &["tech"]),
                    post_json(3, 3, &["tech"]),
                    post_json(4, 20, &["tech"]),
                ],
            )
            .await;

            let response = test_client
                .get("/api/posts?tags=tech&sortBy=likes&direction=desc")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = response.json().await?;
            assert_eq!(ids(&body), vec![2, 4, 1, 3]);
            tech.assert_async().await;

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn repeated_query_keys_use_their_first_value() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            let tech = mock_tag(
                &upstream_mock,
                "tech",
                vec![post_json(1, 5, &["tech"]), post_json(2, 20, &["tech"])],
            )
            .await;
            let history =
                mock_tag(&upstream_mock, "history", vec![post_json(9, 90, &["history"])]).await;

            let response = test_client
                .get("/api/posts?tags=tech&tags=history&sortBy=likes&sortBy=id&direction=desc")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = response.json().await?;
            assert_eq!(ids(&body), vec![2, 1]);
            tech.assert_async().await;
            assert_eq!(history.hits_async().await, 0);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn shared_posts_appear_once_with_the_first_tag_data() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            mock_tag(
                &upstream_mock,
                "tech",
                vec![post_json(1, 10, &["tech"]), post_json(7, 70, &["tech"])],
            )
            .await;
            mock_tag(
                &upstream_mock,
                "history",
                vec![post_json(7, 71, &["history"]), post_json(9, 90, &["history"])],
            )
            .await;

            let response = test_client.get("/api/posts?tags=tech,history").send().await?;

            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = response.json().await?;
            assert_eq!(ids(&body), vec![1, 7, 9]);
            assert_eq!(body["posts"][1]["likes"], json!(70));
            assert_eq!(body["posts"][1]["tags"], json!(["tech"]));

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn posts_keep_the_documented_field_order() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            mock_tag(&upstream_mock, "tech", vec![post_json(2, 469, &["tech"])]).await;

            let response = test_client.get("/api/posts?tags=tech").send().await?;

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.text().await?,
                r#"{"posts":[{"author":"Author 2","authorId":2,"id":2,"likes":469,"popularity":0.2,"reads":994,"tags":["tech"]}]}"#
            );

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn repeated_requests_are_identical() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            mock_tag(
                &upstream_mock,
                "tech",
                (1..=6).map(|id| post_json(id, id % 3, &["tech"])).collect(),
            )
            .await;

            let path = "/api/posts?tags=tech&sortBy=likes&direction=asc";
            let first = test_client.get(path).send().await?.text().await?;
            let second = test_client.get(path).send().await?.text().await?;

            assert_eq!(first, second);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn upstream_errors_are_a_bad_gateway() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            mock_tag(&upstream_mock, "tech", vec![post_json(1, 1, &["tech"])]).await;
            upstream_mock
                .mock_async(|when, then| {
                    when.method(GET).path("/posts").query_param("tag", "science");
                    then.status(503);
                })
                .await;

            let response = test_client.get("/api/posts?tags=tech,science").send().await?;

            assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
            assert_eq!(
                response.json::<Value>().await?,
                json!({ "error": "Upstream post source is unavailable" })
            );

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn malformed_upstream_bodies_are_a_bad_gateway() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            upstream_mock
                .mock_async(|when, then| {
                    when.method(GET).path("/posts");
                    then.status(200).json_body(json!({ "items": [] }));
                })
                .await;

            let response = test_client.get("/api/posts?tags=tech").send().await?;

            assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn posts_requests_are_measured() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools {
             test_client,
             upstream_mock,
             mut metrics_watcher,
             ..
         }| async move {
            mock_tag(
                &upstream_mock,
                "tech",
                vec![post_json(1, 1, &["tech"]), post_json(2, 2, &["tech"])],
            )
            .await;

            let response = test_client.get("/api/posts?tags=tech").send().await?;

            assert_eq!(response.status(), StatusCode::OK);
            assert!(metrics_watcher.has_histogram("posts.response-size", 2.0));
            assert_eq!(metrics_watcher.counter_total("upstream.request"), 1.0);
            assert!(metrics_watcher.has_timer("request.duration"));

            Ok(())
        },
    )
    .await
}

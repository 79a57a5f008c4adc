//! Tests of the in-memory cache of upstream responses.
#![cfg(test)]

use crate::{mock_tag, post_json, postagg_test, TestingTools};
use anyhow::Result;
use httpmock::Method::GET;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use std::time::Duration;

#[actix_rt::test]
async fn repeated_tags_are_served_from_the_cache() -> Result<()> {
    postagg_test(
        |settings| {
            settings.memory_cache.enabled = true;
            settings.memory_cache.default_ttl = None;
        },
        |TestingTools {
             test_client,
             upstream_mock,
             mut metrics_watcher,
             ..
         }| async move {
            let tech = mock_tag(&upstream_mock, "tech", vec![post_json(1, 1, &["tech"])]).await;

            let first = test_client.get("/api/posts?tags=tech").send().await?;
            let second = test_client.get("/api/posts?tags=tech&sortBy=likes").send().await?;

            assert_eq!(first.status(), StatusCode::OK);
            assert_eq!(first.headers()["x-cache"], "miss");
            assert_eq!(second.status(), StatusCode::OK);
            assert_eq!(second.headers()["x-cache"], "hit");
            assert_eq!(tech.hits_async().await, 1);
            assert_eq!(metrics_watcher.counter_total("cache.hit"), 1.0);
            assert_eq!(metrics_watcher.counter_total("cache.miss"), 1.0);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn partially_cached_aggregations_are_mixed() -> Result<()> {
    postagg_test(
        |settings| settings.memory_cache.enabled = true,
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            mock_tag(&upstream_mock, "tech", vec![post_json(1, 1, &["tech"])]).await;
            mock_tag(&upstream_mock, "history", vec![post_json(2, 2, &["history"])]).await;

            test_client.get("/api/posts?tags=tech").send().await?;
            let response = test_client.get("/api/posts?tags=tech,history").send().await?;

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()["x-cache"], "mixed");

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn disabled_cache_always_asks_the_upstream() -> Result<()> {
    postagg_test(
        |settings| settings.memory_cache.enabled = false,
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            let tech = mock_tag(&upstream_mock, "tech", vec![post_json(1, 1, &["tech"])]).await;

            for _ in 0..3 {
                let response = test_client.get("/api/posts?tags=tech").send().await?;
                assert_eq!(response.headers()["x-cache"], "no-cache");
            }

            assert_eq!(tech.hits_async().await, 3);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn expired_entries_are_fetched_again() -> Result<()> {
    postagg_test(
        |settings| {
            settings.memory_cache.enabled = true;
            settings.memory_cache.default_ttl = Some(Duration::ZERO);
        },
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            let tech = mock_tag(&upstream_mock, "tech", vec![post_json(1, 1, &["tech"])]).await;

            test_client.get("/api/posts?tags=tech").send().await?;
            let second = test_client.get("/api/posts?tags=tech").send().await?;

            assert_eq!(second.headers()["x-cache"], "miss");
            assert_eq!(tech.hits_async().await, 2);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn upstream_errors_are_not_cached() -> Result<()> {
    postagg_test(
        |settings| settings.memory_cache.enabled = true,
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            let failing = upstream_mock
                .mock_async(|when, then| {
                    when.method(GET).path("/posts").query_param("tag", "tech");
                    then.status(500);
                })
                .await;

            for _ in 0..2 {
                let response = test_client.get("/api/posts?tags=tech").send().await?;
                assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
            }

            assert_eq!(failing.hits_async().await, 2);

            Ok(())
        },
    )
    .await
}

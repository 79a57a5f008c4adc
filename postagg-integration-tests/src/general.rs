//! Tests Postagg's landing page and liveness endpoint.
#![cfg(test)]

use crate::{postagg_test, TestingTools};
use anyhow::Result;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;

#[actix_rt::test]
async fn root_of_services_describes_the_service() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools { test_client, .. }| async move {
            let response = test_client.get("/").send().await?;

            assert_eq!(response.status(), StatusCode::OK);
            assert!(response
                .headers()
                .get("content-type")
                .map_or(false, |value| value.as_bytes().starts_with(b"text/plain")));
            assert!(response.text().await?.starts_with("Postagg aggregates blog posts"));

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn ping_answers_with_the_exact_body() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools { test_client, .. }| async move {
            let response = test_client.get("/api/ping").send().await?;

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.text().await?, r#"{"success": true}"#);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn unknown_paths_are_not_found() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools { test_client, .. }| async move {
            let response = test_client.get("/api/nothing-here").send().await?;

            assert_eq!(response.status(), StatusCode::NOT_FOUND);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn cors_is_permissive() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools { test_client, .. }| async move {
            let response = test_client
                .get("/api/ping")
                .header("Origin", "https://blog.example.com")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response
                    .headers()
                    .get("access-control-allow-origin")
                    .map(|value| value.to_str().unwrap().to_string()),
                Some("https://blog.example.com".to_string())
            );

            Ok(())
        },
    )
    .await
}

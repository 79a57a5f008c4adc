//! Tests of the `/api/tests` self-test endpoint.
#![cfg(test)]

use crate::{mock_tag, post_json, postagg_test, TestingTools};
use anyhow::Result;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::Value;

/// The case names, in the order they are reported.
const CASE_NAMES: [&str; 12] = [
    "No tags",
    "Invalid sortBy",
    "Invalid direction",
    "Api ping",
    "Ascending order popularity",
    "Descending order popularity",
    "Descending order id",
    "Descending order reads",
    "Descending order likes",
    "Tags tech",
    "Tags history",
    "Tags tech & history",
];

/// Get the self-test report as text and as JSON.
async fn report(test_client: &crate::TestReqwestClient) -> Result<(String, Value)> {
    let response = test_client.get("/api/tests").send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    let text = response.text().await?;
    let value = serde_json::from_str(&text)?;
    Ok((text, value))
}

#[actix_rt::test]
async fn every_case_passes_against_a_healthy_upstream() -> Result<()> {
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
                vec![
                    post_json(1, 10, &["tech"]),
                    post_json(4, 40, &["tech", "history"]),
                    post_json(8, 40, &["science", "tech"]),
                ],
            )
            .await;
            mock_tag(
                &upstream_mock,
                "history",
                vec![
                    post_json(4, 40, &["tech", "history"]),
                    post_json(5, 5, &["history"]),
                ],
            )
            .await;

            let (text, report) = report(&test_client).await?;

            for name in CASE_NAMES {
                assert_eq!(report[name], "Passed", "case {:?} in {}", name, text);
            }
            assert_eq!(report.as_object().map(|cases| cases.len()), Some(12));

            // The report lists the cases in run order.
            let positions: Vec<usize> = CASE_NAMES
                .iter()
                .map(|name| text.find(&format!("{:?}", name)).expect("case is reported"))
                .collect();
            assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn a_failing_upstream_fails_only_the_cases_that_need_it() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools {
             test_client,
             upstream_mock,
             ..
         }| async move {
            mock_tag(&upstream_mock, "tech", vec![post_json(1, 10, &["tech"])]).await;

            let (text, report) = report(&test_client).await?;

            for name in CASE_NAMES {
                let expected = match name {
                    "Tags history" | "Tags tech & history" => "Failed",
                    _ => "Passed",
                };
                assert_eq!(report[name], expected, "case {:?} in {}", name, text);
            }

            Ok(())
        },
    )
    .await
}

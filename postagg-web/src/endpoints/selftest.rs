//! A self-test that drives the public API of a running instance over HTTP and
//! reports which documented behaviors hold.

use crate::endpoints::ping::PING_BODY;
use actix_web::{get, web::Data, HttpResponse};
use anyhow::{anyhow, Context, Result};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::time::Duration;

/// The outcome of one self-test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// The response matched the expectation.
    Passed,
    /// The response did not match, or could not be obtained.
    Failed,
}

/// What a case expects of the response it gets.
#[derive(Debug)]
enum Check {
    /// A 400 with an `error` member.
    Rejected,
    /// The exact ping body.
    Ping,
    /// Posts whose `key` never decreases.
    Ascending(&'static str),
    /// Posts whose `key` never increases.
    Descending(&'static str),
    /// Posts that each carry at least one of the tags.
    TaggedWith(&'static [&'static str]),
}

/// A named request and its expectation.
#[derive(Debug)]
struct Case {
    /// The name the outcome is reported under.
    name: &'static str,
    /// Path and query, relative to the base URL.
    path: &'static str,
    /// What the response must look like.
    check: Check,
}

/// The cases, in the order they run and are reported.
const CASES: &[Case] = &[
    Case {
        name: "No tags",
        path: "/api/posts?tags=&sortBy=popularity&direction=desc",
        check: Check::Rejected,
    },
    Case {
        name: "Invalid sortBy",
        path: "/api/posts?tags=tech&sortBy=nothing&direction=desc",
        check: Check::Rejected,
    },
    Case {
        name: "Invalid direction",
        path: "/api/posts?tags=tech&sortBy=popularity&direction=none",
        check: Check::Rejected,
    },
    Case {
        name: "Api ping",
        path: "/api/ping",
        check: Check::Ping,
    },
    Case {
        name: "Ascending order popularity",
        path: "/api/posts?tags=tech&sortBy=popularity&direction=asc",
        check: Check::Ascending("popularity"),
    },
    Case {
        name: "Descending order popularity",
        path: "/api/posts?tags=tech&sortBy=popularity&direction=desc",
        check: Check::Descending("popularity"),
    },
    Case {
        name: "Descending order id",
        path: "/api/posts?tags=tech&sortBy=id&direction=desc",
        check: Check::Descending("id"),
    },
    Case {
        name: "Descending order reads",
        path: "/api/posts?tags=tech&sortBy=reads&direction=desc",
        check: Check::Descending("reads"),
    },
    Case {
        name: "Descending order likes",
        path: "/api/posts?tags=tech&sortBy=likes&direction=desc",
        check: Check::Descending("likes"),
    },
    Case {
        name: "Tags tech",
        path: "/api/posts?tags=tech&sortBy=likes&direction=desc",
        check: Check::TaggedWith(&["tech"]),
    },
    Case {
        name: "Tags history",
        path: "/api/posts?tags=history&sortBy=likes&direction=desc",
        check: Check::TaggedWith(&["history"]),
    },
    Case {
        name: "Tags tech & history",
        path: "/api/posts?tags=tech,history&sortBy=likes&direction=desc",
        check: Check::TaggedWith(&["tech", "history"]),
    },
];

impl Check {
    /// Decide whether a response with `status` and `body` satisfies this check.
    ///
    /// # Errors
    /// If the body is not the JSON document the check needs.
    fn evaluate(&self, status: u16, body: &str) -> Result<bool> {
        match self {
            Self::Rejected => {
                let document: Value = serde_json::from_str(body)?;
                Ok(status == 400 && document.get("error").is_some())
            }
            Self::Ping => Ok(status == 200 && body == PING_BODY),
            Self::Ascending(key) => {
                let keys = sort_keys(body, key)?;
                Ok(status == 200 && keys.windows(2).all(|pair| pair[0] <= pair[1]))
            }
            Self::Descending(key) => {
                let keys = sort_keys(body, key)?;
                Ok(status == 200 && keys.windows(2).all(|pair| pair[0] >= pair[1]))
            }
            Self::TaggedWith(tags) => {
                let posts = posts_of(body)?;
                Ok(status == 200
                    && posts.iter().all(|post| {
                        post["tags"].as_array().map_or(false, |post_tags| {
                            post_tags
                                .iter()
                                .filter_map(Value::as_str)
                                .any(|tag| tags.iter().any(|wanted| *wanted == tag))
                        })
                    }))
            }
        }
    }
}

/// The `posts` array of a posts document.
fn posts_of(body: &str) -> Result<Vec<Value>> {
    let mut document: Value = serde_json::from_str(body)?;
    match document.get_mut("posts").map(Value::take) {
        Some(Value::Array(posts)) => Ok(posts),
        _ => Err(anyhow!("The body has no posts list")),
    }
}

/// The numeric `key` of each post of a posts document, in order.
fn sort_keys(body: &str, key: &str) -> Result<Vec<f64>> {
    posts_of(body)?
        .iter()
        .map(|post| {
            post[key]
                .as_f64()
                .ok_or_else(|| anyhow!("A post has no numeric {}", key))
        })
        .collect()
}

/// The outcome of every case, serialized as a JSON object in run order.
#[derive(Debug)]
pub struct SelfTestReport {
    /// Case names and their verdicts.
    outcomes: Vec<(&'static str, Verdict)>,
}

impl SelfTestReport {
    /// Case names and their verdicts, in run order.
    pub fn outcomes(&self) -> &[(&'static str, Verdict)] {
        &self.outcomes
    }

    /// The number of cases that passed.
    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, verdict)| *verdict == Verdict::Passed)
            .count()
    }
}

impl Serialize for SelfTestReport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.outcomes.iter().map(|(name, verdict)| (name, verdict)))
    }
}

/// An HTTP client that runs the self-test cases against a base URL.
pub struct SelfTest {
    /// The client to send the cases with.
    client: reqwest::Client,
    /// Where the instance under test listens, such as `http://127.0.0.1:8000`.
    base_url: String,
}

impl SelfTest {
    /// Create a self-test that targets `base_url`, giving up on each request
    /// after `timeout`.
    ///
    /// # Errors
    /// If the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Unable to create the self-test client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The URL the cases are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run every case in order. A case that cannot complete fails alone.
    pub async fn run(&self) -> SelfTestReport {
        let mut outcomes = Vec::with_capacity(CASES.len());
        for case in CASES {
            let verdict = match self.run_case(case).await {
                Ok(true) => Verdict::Passed,
                Ok(false) => {
                    tracing::warn!(
                        r#type = "web.selftest.failed",
                        case = case.name,
                        "Self-test case failed"
                    );
                    Verdict::Failed
                }
                Err(error) => {
                    tracing::warn!(
                        r#type = "web.selftest.error",
                        case = case.name,
                        ?error,
                        "Self-test case could not complete"
                    );
                    Verdict::Failed
                }
            };
            outcomes.push((case.name, verdict));
        }
        SelfTestReport { outcomes }
    }

    /// Send the request of `case` and check the response.
    async fn run_case(&self, case: &Case) -> Result<bool> {
        let url = format!("{}{}", self.base_url, case.path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Requesting {}", url))?;
        let status = response.status().as_u16();
        let body = response.text().await.context("Reading the response body")?;
        case.check.evaluate(status, &body)
    }
}

/// Run the self-test against this instance and report each case.
#[get("/tests")]
pub async fn self_test(self_test: Data<SelfTest>) -> HttpResponse {
    let report = self_test.run().await;
    tracing::info!(
        r#type = "web.selftest.report",
        passed = report.passed(),
        total = report.outcomes().len(),
        "Self-test finished"
    );
    HttpResponse::Ok().json(report)
}

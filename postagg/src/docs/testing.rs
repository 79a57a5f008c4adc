//! # Testing strategies
//!
//! There are two major testing strategies used in this repository: unit tests,
//! and integration tests.
//!
//! Unit tests appear close to the code they are testing, in `#[cfg(test)]`
//! modules. This is suitable for testing complex behavior at a small scale,
//! with fine grained control over the inputs. The sort order of posts is also
//! checked with [`proptest`](https://docs.rs/proptest) against generated
//! inputs, and the upstream client is tested against an
//! [`httpmock`](https://docs.rs/httpmock) server.
//!
//! Many behaviors are difficult to test as unit tests, especially details like
//! the URLs we expose via the web service. To test these parts of Postagg, we
//! have [`postagg-integration-tests`][test-crate], which starts an instance of
//! Postagg against a mock upstream. HTTP requests can then be made to that
//! server in order to test its behavior.
//!
//! [test-crate]: ../../../postagg_integration_tests/
//!
//! ```ignore
//! #[actix_rt::test]
//! async fn ping_works() {
//!     postagg_test(
//!         |_| (),
//!         |TestingTools { test_client, .. }| async move {
//!             let response = test_client
//!                 .get("/api/ping")
//!                 .send()
//!                 .await
//!                 .expect("failed to execute request");
//!
//!             assert_eq!(response.status(), StatusCode::OK);
//!             assert_eq!(response.text().await.unwrap(), r#"{"success": true}"#);
//!         },
//!     )
//!     .await
//! }
//! ```
//!
//! For more details, see the documentation of the `postagg-integration-tests`
//! crate.

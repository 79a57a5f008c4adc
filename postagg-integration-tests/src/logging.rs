//! Tests that Postagg logs behave as expected.
//!
//! Only setup logs are checked here. Request logs are written from the server
//! worker threads, which the test subscriber does not see.
#![cfg(test)]

use crate::{postagg_test, TestingTools};
use anyhow::Result;
use tracing::Level;

#[actix_rt::test]
async fn source_setup_is_logged() -> Result<()> {
    postagg_test(
        |settings| settings.memory_cache.enabled = true,
        |TestingTools {
             mut log_watcher, ..
         }| async move {
            assert!(log_watcher.has_type("web.configuring-sources"));
            assert!(log_watcher.has(|event| {
                event.event_type() == Some("web.configured-sources")
                    && event.level == Level::INFO
                    && event.field_contains("source", "memory-cache(UpstreamClient)")
            }));

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn self_test_target_is_logged() -> Result<()> {
    postagg_test(
        |_| (),
        |TestingTools {
             mut log_watcher, ..
         }| async move {
            assert!(log_watcher.has(|event| {
                event.event_type() == Some("web.selftest.configured")
                    && event.field_contains("base_url", "http://127.0.0.1:")
            }));

            Ok(())
        },
    )
    .await
}

//! Tools to assemble the post source the aggregator reads from.

use anyhow::Result;
use cadence::StatsdClient;
use postagg_cache::MemoryCacheSource;
use postagg_posts::{Aggregator, PostSource};
use postagg_settings::Settings;
use postagg_upstream::UpstreamClient;

/// Build the upstream client, wrapped in a memory cache if enabled.
pub fn make_source_tree(
    settings: &Settings,
    metrics_client: &StatsdClient,
) -> Result<Box<dyn PostSource>> {
    let _setup_span = tracing::info_span!("post_source_setup").entered();
    tracing::info!(r#type = "web.configuring-sources", "Setting up post sources");

    let mut source: Box<dyn PostSource> =
        UpstreamClient::new_boxed(&settings.upstream, metrics_client.clone())?;

    if settings.memory_cache.enabled {
        source =
            MemoryCacheSource::new_boxed(&settings.memory_cache, source, metrics_client.clone());
    }

    tracing::info!(
        r#type = "web.configured-sources",
        source = %source.name(),
        "Post sources ready"
    );
    Ok(source)
}

/// Build the aggregator shared by every worker.
pub fn make_aggregator(settings: &Settings, metrics_client: &StatsdClient) -> Result<Aggregator> {
    Ok(Aggregator::new(make_source_tree(settings, metrics_client)?)
        .with_max_concurrent_fetches(settings.upstream.max_concurrent_fetches))
}

#[cfg(test)]
mod tests {
    use super::make_source_tree;
    use anyhow::Result;
    use cadence::{NopMetricSink, StatsdClient};
    use postagg_settings::Settings;
    use pretty_assertions::assert_eq;

    #[test]
    fn sources_with_cache() -> Result<()> {
        let settings = Settings::load_for_tests(|settings| settings.memory_cache.enabled = true);
        let metrics_client = StatsdClient::from_sink("postagg-test", NopMetricSink);
        let source = make_source_tree(&settings, &metrics_client)?;
        assert_eq!(source.name(), "memory-cache(UpstreamClient)");
        Ok(())
    }

    #[test]
    fn sources_without_cache() -> Result<()> {
        let settings = Settings::load_for_tests(|settings| settings.memory_cache.enabled = false);
        let metrics_client = StatsdClient::from_sink("postagg-test", NopMetricSink);
        let source = make_source_tree(&settings, &metrics_client)?;
        assert_eq!(source.name(), "UpstreamClient");
        Ok(())
    }

    #[test]
    fn invalid_upstream_urls_fail_setup() {
        let settings = Settings::load_for_tests(|settings| {
            settings.upstream.base_url = "not a url".to_string();
        });
        let metrics_client = StatsdClient::from_sink("postagg-test", NopMetricSink);
        assert!(make_source_tree(&settings, &metrics_client).is_err());
    }
}

//! A post source that queries the upstream search-by-tag API.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use cadence::{CountedExt, StatsdClient};
use postagg_posts::{Post, PostSource, SetupError, SourceError, SourceResponse};
use postagg_settings::UpstreamSettings;
use reqwest::Url;
use serde::Deserialize;

/// The body the upstream answers with.
#[derive(Debug, Deserialize)]
struct UpstreamPage {
    /// The posts carrying the queried tag.
    posts: Vec<Post>,
}

/// A post source that issues one `GET <base_url>?tag=<tag>` per tag.
pub struct UpstreamClient {
    /// The HTTP client to query the upstream with.
    client: reqwest::Client,
    /// The endpoint to query, without the `tag` parameter.
    base_url: Url,
    /// The client to report metrics to.
    metrics_client: StatsdClient,
}

impl UpstreamClient {
    /// Create an `UpstreamClient` from settings.
    ///
    /// # Errors
    /// If the base URL is not a valid URL, or if the HTTP client cannot be built.
    pub fn new_boxed(
        settings: &UpstreamSettings,
        metrics_client: StatsdClient,
    ) -> Result<Box<Self>, SetupError> {
        let base_url = Url::parse(&settings.base_url)
            .with_context(|| format!("Invalid upstream URL {:?}", settings.base_url))
            .map_err(SetupError::InvalidConfiguration)?;

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.timeout)
            .user_agent(&settings.user_agent)
            .build()
            .context("Unable to create the Reqwest client")
            .map_err(SetupError::Network)?;

        Ok(Box::new(Self {
            client,
            base_url,
            metrics_client,
        }))
    }

    /// The URL listing the posts for `tag`.
    pub fn url_for(&self, tag: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("tag", tag);
        url
    }

    /// Fetch and parse one page of posts.
    async fn fetch(&self, url: Url) -> Result<Vec<Post>, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| {
                SourceError::Network(anyhow!(error).context("Couldn't reach upstream"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| {
                SourceError::Network(anyhow!(error).context("Reading the upstream body"))
            })?;

        let page: UpstreamPage = serde_json::from_slice(&body).map_err(|error| {
            SourceError::Format(anyhow!("Failed to parse the JSON response: {}", error))
        })?;

        Ok(page.posts)
    }
}

#[async_trait]
impl PostSource for UpstreamClient {
    fn name(&self) -> String {
        "UpstreamClient".to_owned()
    }

    fn cache_key(&self, tag: &str) -> String {
        self.url_for(tag).to_string()
    }

    async fn posts_for_tag(&self, tag: &str) -> Result<SourceResponse, SourceError> {
        let url = self.url_for(tag);
        tracing::debug!(r#type = "upstream.fetch", %url, "Fetching posts from upstream");
        self.metrics_client.incr("upstream.request").ok();

        match self.fetch(url).await {
            Ok(posts) => {
                tracing::debug!(
                    r#type = "upstream.fetched",
                    %tag,
                    post_count = posts.len(),
                    "Fetched posts from upstream"
                );
                Ok(SourceResponse::new(posts))
            }
            Err(error) => {
                tracing::warn!(r#type = "upstream.error", %tag, %error, "Upstream request failed");
                self.metrics_client.incr("upstream.error").ok();
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UpstreamClient;
    use cadence::{NopMetricSink, StatsdClient};
    use httpmock::{Method::GET, MockServer};
    use postagg_posts::{CacheStatus, PostSource, SetupError, SourceError};
    use postagg_settings::UpstreamSettings;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn settings(base_url: String) -> UpstreamSettings {
        UpstreamSettings {
            base_url,
            timeout: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(1),
            user_agent: "postagg-tests".to_string(),
            max_concurrent_fetches: 4,
        }
    }

    fn client(server: &MockServer) -> Box<UpstreamClient> {
        UpstreamClient::new_boxed(
            &settings(server.url("/posts")),
            StatsdClient::from_sink("", NopMetricSink),
        )
        .expect("client builds")
    }

    fn post_json(id: i64, tag: &str) -> serde_json::Value {
        json!({
            "author": "Trevon Rodriguez",
            "authorId": 5,
            "id": id,
            "likes": 31 * id,
            "popularity": 0.7,
            "reads": 1000 + id,
            "tags": [tag],
        })
    }

    #[tokio::test]
    async fn fetches_posts_for_a_tag_in_upstream_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/posts").query_param("tag", "tech");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(json!({ "posts": [post_json(3, "tech"), post_json(1, "tech")] }));
            })
            .await;

        let response = client(&server)
            .posts_for_tag("tech")
            .await
            .expect("fetch succeeds");

        mock.assert_async().await;
        assert_eq!(response.cache_status, CacheStatus::NoCache);
        assert_eq!(
            response.posts.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![3, 1]
        );
        assert_eq!(response.posts[0].likes, 93);
    }

    #[tokio::test]
    async fn tags_are_url_encoded() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/posts")
                    .query_param("tag", "science & fiction");
                then.status(200).json_body(json!({ "posts": [] }));
            })
            .await;

        let client = client(&server);
        assert!(client.cache_key("science & fiction").ends_with("tag=science+%26+fiction"));
        let response = client
            .posts_for_tag("science & fiction")
            .await
            .expect("fetch succeeds");

        mock.assert_async().await;
        assert!(response.posts.is_empty());
    }

    #[tokio::test]
    async fn error_statuses_are_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/posts");
                then.status(503);
            })
            .await;

        let result = client(&server).posts_for_tag("tech").await;

        assert!(matches!(result, Err(SourceError::Status(503))));
    }

    #[tokio::test]
    async fn bodies_that_are_not_json_are_format_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/posts");
                then.status(200).body("<html>oops</html>");
            })
            .await;

        let result = client(&server).posts_for_tag("tech").await;

        assert!(matches!(result, Err(SourceError::Format(_))));
    }

    #[tokio::test]
    async fn bodies_without_posts_are_format_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/posts");
                then.status(200).json_body(json!({ "error": "tag parameter is required" }));
            })
            .await;

        let result = client(&server).posts_for_tag("tech").await;

        assert!(matches!(result, Err(SourceError::Format(_))));
    }

    #[tokio::test]
    async fn slow_upstreams_time_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/posts");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .json_body(json!({ "posts": [] }));
            })
            .await;

        let result = client(&server).posts_for_tag("tech").await;

        assert!(matches!(result, Err(SourceError::Network(_))));
    }

    #[test]
    fn invalid_base_urls_are_configuration_errors() {
        let result = UpstreamClient::new_boxed(
            &settings("not a url".to_string()),
            StatsdClient::from_sink("", NopMetricSink),
        );
        assert!(matches!(result, Err(SetupError::InvalidConfiguration(_))));
    }
}

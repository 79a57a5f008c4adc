// Only overview documentation that is not relevant to one of the more specific
// crates should go here.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! A web API that aggregates blog posts from an upstream search-by-tag API.
//!
//! Postagg is split into several subcrates that work in collaboration.
//!
//! - [postagg-cache](../postagg_cache/index.html)
//! - [postagg-integration-tests](../postagg_integration_tests/index.html)
//! - [postagg-posts](../postagg_posts/index.html)
//! - [postagg-settings](../postagg_settings/index.html)
//! - [postagg-upstream](../postagg_upstream/index.html)
//! - [postagg-web](../postagg_web/index.html)

mod docs;

use anyhow::{Context, Result};
use cadence::{QueuingMetricSink, StatsdClient, UdpMetricSink};
use postagg_settings::{LogFormat, Settings};
use std::net::{TcpListener, UdpSocket};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Primary entry point
#[actix_rt::main]
async fn main() -> Result<()> {
    let settings = postagg_settings::Settings::load().context("Loading settings")?;
    init_logging(&settings).context("Initializing logging")?;
    let metrics_client = init_metrics(&settings).context("Initializing metrics")?;
    let listener = TcpListener::bind(settings.http.listen).context("Binding port")?;

    tracing::info!(
        r#type = "app.starting",
        env = %settings.env,
        address = %settings.http.listen,
        "Starting Postagg"
    );

    postagg_web::run(listener, metrics_client, settings)
        .context("Starting postagg-web server")?
        .await
        .context("Running postagg-web server")?;

    Ok(())
}

/// Set up logging for Postagg, based on settings and the `RUST_LOG` environment variable.
fn init_logging(settings: &Settings) -> Result<()> {
    LogTracer::init()?;
    let env_filter: EnvFilter = (&settings.logging.levels).into();
    let registry = tracing_subscriber::registry().with(env_filter);

    match settings.logging.format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().pretty()),
        )?,
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().json()),
        )?,
        LogFormat::Compact => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().compact()),
        )?,
    };

    Ok(())
}

/// Set up a statsd client that sends metrics over UDP from a background queue.
fn init_metrics(settings: &Settings) -> Result<StatsdClient> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("Binding metrics socket")?;
    socket
        .set_nonblocking(true)
        .context("Configuring metrics socket")?;

    let sink_address = (settings.metrics.sink_host.as_str(), settings.metrics.sink_port);
    let udp_sink = UdpMetricSink::from(sink_address, socket).context("Creating metrics sink")?;
    let queuing_sink =
        QueuingMetricSink::with_capacity(udp_sink, settings.metrics.max_queue_size_kb * 1024);

    Ok(StatsdClient::builder("postagg", queuing_sink)
        .with_error_handler(|error| {
            tracing::warn!(r#type = "app.metrics-error", %error, "Could not send metric");
        })
        .build())
}

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! Web server for [Postagg](../postagg/index.html)'s public API.

mod dockerflow;
mod endpoints;
mod errors;
mod logging;
mod middleware;
mod sources;

pub use crate::endpoints::{SelfTest, SelfTestReport, Verdict};

use actix_cors::Cors;
use actix_web::{
    dev::Server,
    get,
    web::{self, Data},
    App, HttpResponse, HttpServer,
};
use anyhow::{Context, Result};
use cadence::StatsdClient;
use postagg_settings::Settings;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener};
use tracing_actix_web::TracingLogger;

use crate::logging::PostaggRootSpanBuilder;

/// Run the web server
///
/// The returned server is a `Future` that must either be `.await`ed, or run it
/// as a background task using `tokio::spawn`.
///
/// Most of the details from `settings` will be respected, except for those that
/// go into building the listener (the host and port). If you want to respect the
/// settings specified in that object, you must include them in the construction
/// of `listener`.
///
/// # Errors
///
/// Returns an error if the post sources cannot be configured, or if the server
/// cannot be started on the provided listener.
///
/// # Examples
///
/// Run the server in the foreground. This will only return if there is an error
/// that causes the server to shut down. This is used to run Postagg as a service,
/// such as in production.
///
/// ```no_run
/// # actix_rt::System::new().block_on(async {
/// let listener = std::net::TcpListener::bind("127.0.0.1:8080")
///     .expect("Failed to bind port");
/// let settings = postagg_settings::Settings::load()
///     .expect("Failed to load settings");
/// let metrics_client = cadence::StatsdClient::from_sink("postagg", cadence::NopMetricSink);
/// postagg_web::run(listener, metrics_client, settings)
///     .expect("Failed to start server")
///     .await
///     .expect("Fatal error while running server");
/// # })
/// ```
pub fn run(
    listener: TcpListener,
    metrics_client: StatsdClient,
    settings: Settings,
) -> Result<Server> {
    let num_workers = settings.http.workers;

    let aggregator = sources::make_aggregator(&settings, &metrics_client)
        .context("Setting up post sources")?;

    let self_test_base = match &settings.selftest.base_url {
        Some(base_url) => base_url.clone(),
        None => format!(
            "http://{}",
            loopback_address(listener.local_addr().context("Reading listener address")?)
        ),
    };
    let self_test = SelfTest::new(
        &self_test_base,
        settings.upstream.timeout + settings.upstream.connect_timeout,
    )?;
    tracing::debug!(
        r#type = "web.selftest.configured",
        base_url = %self_test.base_url(),
        "Self-test target configured"
    );

    let aggregator = Data::new(aggregator);
    let self_test = Data::new(self_test);
    let metrics_client = Data::new(metrics_client);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(aggregator.clone())
            .app_data(self_test.clone())
            .app_data(metrics_client.clone())
            .wrap(middleware::Metrics)
            .wrap(TracingLogger::<PostaggRootSpanBuilder>::new())
            .wrap(Cors::permissive())
            // The core functionality of Postagg
            .service(web::scope("/api").configure(endpoints::configure))
            .service(root_info)
            // Add the behavior necessary to satisfy Dockerflow.
            .service(web::scope("").configure(dockerflow::configure))
    })
    .listen(listener)
    .context("Listening for connections")?;

    if let Some(n) = num_workers {
        server = server.workers(n);
    }

    Ok(server.run())
}

/// The address to reach a listener bound to `address` from this host.
///
/// Unspecified addresses such as `0.0.0.0` are swapped for loopback.
fn loopback_address(mut address: SocketAddr) -> SocketAddr {
    match address.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => address.set_ip(Ipv4Addr::LOCALHOST.into()),
        IpAddr::V6(ip) if ip.is_unspecified() => address.set_ip(Ipv6Addr::LOCALHOST.into()),
        _ => {}
    }
    address
}

/// The root view, to provide information about what this service is.
#[get("/")]
async fn root_info() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body(
        "Postagg aggregates blog posts by tag. Try /api/posts?tags=tech,history&sortBy=likes&direction=desc",
    )
}

#[cfg(test)]
mod tests {
    use super::loopback_address;
    use pretty_assertions::assert_eq;
    use std::net::SocketAddr;

    #[test]
    fn unspecified_addresses_become_loopback() {
        let v4: SocketAddr = "0.0.0.0:8000".parse().unwrap();
        let v6: SocketAddr = "[::]:8000".parse().unwrap();
        let bound: SocketAddr = "10.1.2.3:8000".parse().unwrap();

        assert_eq!(loopback_address(v4).to_string(), "127.0.0.1:8000");
        assert_eq!(loopback_address(v6).to_string(), "[::1]:8000");
        assert_eq!(loopback_address(bound), bound);
    }
}

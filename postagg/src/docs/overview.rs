//! # High level overview of Postagg
//!
//! This project is structured as a [Cargo Workspace][] that contains one crate
//! for each broad area of behavior for Postagg. The crates can be built and
//! tested individually or as a group.
//!
//! [Cargo Workspace]: https://doc.rust-lang.org/book/ch14-03-cargo-workspaces.html
//!
//! This is a brief overview of the crates found in the repository. For more
//! details, see the specific crate docs.
//!
//! ## [`postagg`](../)
//!
//! The main application, and the only *binary* crate in the repository. It
//! loads settings, sets up logging and metrics, and starts the web server.
//!
//! ## [`postagg-settings`](../../postagg_settings/index.html)
//!
//! This defines and documents the settings of the application. These settings
//! are loaded by the binary crate and passed into the other crates to
//! configure them.
//!
//! ## [`postagg-web`](../../postagg_web/index.html)
//!
//! This crate provides the HTTP API: the posts, ping and self-test endpoints,
//! plus the Dockerflow endpoints used to operate the service.
//!
//! ## [`postagg-posts`](../../postagg_posts/index.html)
//!
//! This is the *domain* crate. It defines posts, request validation, the
//! `PostSource` trait, and the merge and sort steps of an aggregation.
//!
//! ## [`postagg-upstream`](../../postagg_upstream/index.html)
//!
//! A `PostSource` that queries the upstream search-by-tag API over HTTP.
//!
//! ## [`postagg-cache`](../../postagg_cache/index.html)
//!
//! A `PostSource` that wraps another one and keeps its responses in memory.
//!
//! ## [`postagg-integration-tests`](../../postagg_integration_tests/index.html)
//!
//! A separate test system. It brings the other crates together like `postagg`
//! does, but against a mock upstream, and exercises the service as a whole
//! through its HTTP API.

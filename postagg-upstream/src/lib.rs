#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! The HTTP client for the upstream blog post search API.

mod client;

pub use crate::client::UpstreamClient;

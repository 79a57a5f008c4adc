//! Helpers shared by the integration tests.

pub mod logging;
pub mod metrics;
pub mod test_tools;
pub mod upstream;

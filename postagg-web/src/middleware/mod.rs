//! Middlewares specific to Postagg.

mod metrics;

pub use self::metrics::Metrics;

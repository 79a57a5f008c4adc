//! Handlers for the `/api` scope.

mod ping;
mod posts;
mod selftest;

pub use self::selftest::{SelfTest, SelfTestReport, Verdict};

use actix_web::web::ServiceConfig;

/// Configure the routes of the `/api` scope.
pub fn configure(config: &mut ServiceConfig) {
    config
        .service(posts::posts)
        .service(ping::ping)
        .service(selftest::self_test);
}

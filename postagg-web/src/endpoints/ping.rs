//! The liveness endpoint of the public API.

use actix_web::{get, http::header::ContentType, HttpResponse};

/// The exact body of a ping response. Clients compare it byte for byte.
pub(crate) const PING_BODY: &str = r#"{"success": true}"#;

/// Answer that the service is up.
#[get("/ping")]
pub async fn ping() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(PING_BODY)
}

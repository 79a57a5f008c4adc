//! Any errors that postagg-web might generate, and supporting implementations.

use std::error::Error;
use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use backtrace::Backtrace;
use postagg_posts::{SourceError, ValidationError};
use serde_json::json;
use thiserror::Error;

/// The Standard Error for most of Postagg
pub struct HandlerError {
    /// The wrapped error value.
    kind: HandlerErrorKind,
    /// The backtrace related to the wrapped error.
    pub(crate) backtrace: Backtrace,
}

/// An error that happened in a web handler.
#[derive(Error, Debug)]
pub enum HandlerErrorKind {
    /// A generic error, when there is nothing more specific to say.
    #[error("Internal error")]
    Internal,

    /// The query parameters of the request were rejected.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The upstream post source failed. The details are logged, not returned.
    #[error("Upstream post source is unavailable")]
    Upstream(#[from] SourceError),
}

impl HandlerErrorKind {
    /// Convert the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Build an HTTP response reporting the error, as `{"error": "<message>"}`.
    pub fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl HandlerError {
    /// Access the wrapped error.
    pub fn kind(&self) -> &HandlerErrorKind {
        &self.kind
    }

    /// Get an `HandlerError` representing an `Internal` error.
    pub fn internal() -> Self {
        HandlerErrorKind::Internal.into()
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.kind.source()
    }
}

impl<T> From<T> for HandlerError
where
    HandlerErrorKind: From<T>,
{
    fn from(item: T) -> Self {
        HandlerError {
            kind: HandlerErrorKind::from(item),
            backtrace: Backtrace::new(),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        // Name the debug struct `HandlerError/<kind>` so that log searches can
        // tell the different errors apart.
        fmt.debug_struct(&format!("HandlerError/{:?}", &self.kind))
            .field("kind", &self.kind)
            .field("backtrace", &self.backtrace)
            .finish()
    }
}

impl ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    fn error_response(&self) -> HttpResponse {
        self.kind().error_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{HandlerError, HandlerErrorKind};
    use actix_web::{body::to_bytes, http::StatusCode, ResponseError};
    use anyhow::anyhow;
    use postagg_posts::{SourceError, ValidationError};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    async fn body_of(error: HandlerError) -> Value {
        let bytes = to_bytes(error.error_response().into_body())
            .await
            .expect("readable body");
        serde_json::from_slice(&bytes).expect("JSON body")
    }

    #[actix_rt::test]
    async fn validation_errors_are_bad_requests() {
        let error: HandlerError = ValidationError::InvalidSortBy.into();

        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_of(error).await,
            json!({ "error": "sortBy parameter is invalid" })
        );
    }

    #[actix_rt::test]
    async fn upstream_errors_hide_their_details() {
        let error: HandlerError =
            SourceError::Network(anyhow!("connection refused to 10.0.0.3")).into();

        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_of(error).await,
            json!({ "error": "Upstream post source is unavailable" })
        );
    }

    #[actix_rt::test]
    async fn internal_errors_are_server_errors() {
        let error = HandlerError::internal();

        assert!(matches!(error.kind(), HandlerErrorKind::Internal));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(error).await, json!({ "error": "Internal error" }));
    }

    #[test]
    fn debug_output_names_the_kind() {
        let error: HandlerError = ValidationError::TagsRequired.into();
        assert!(format!("{:?}", error).starts_with("HandlerError/Validation(TagsRequired)"));
    }
}

//! Helper types and traits for cleaner route handlers.
//!
//! Provides an extension trait for converting `Result` types into
//! HTTP-appropriate error responses, reducing boilerplate in routes.

use axum::http::StatusCode;
use tracing::error;

/// Standard result type for route handlers.
pub type RouteResult<T> = Result<T, (StatusCode, String)>;

/// Extension trait for converting `Result<T, E>` to `RouteResult<T>`.
pub trait ResultExt<T, E: std::fmt::Display> {
    /// Logs the error and converts it to 500 Internal Server Error.
    fn or_internal_error(self) -> RouteResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn or_internal_error(self) -> RouteResult<T> {
        self.map_err(|e| {
            error!("Request failed: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_internal_error() {
        let result: Result<(), String> = Err("boom".to_string());
        assert_eq!(
            result.or_internal_error(),
            Err((StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()))
        );

        let ok: Result<u8, String> = Ok(1);
        assert_eq!(ok.or_internal_error(), Ok(1));
    }
}

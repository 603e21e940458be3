use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway error type
///
/// Only two error kinds exist at this boundary: a denied request and a
/// route table that cannot be assembled. Failures inside the wrapped
/// handlers are never caught or transformed here.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Request denied by one of the authorization filters.
    #[error("unauthorized")]
    Unauthorized,

    /// A declared route cannot be classified. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::FORBIDDEN,
            GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            // Uniform, non-descriptive denial: the body must not reveal
            // which admission check failed.
            GatewayError::Unauthorized => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            GatewayError::Config(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_forbidden() {
        assert_eq!(
            GatewayError::Unauthorized.status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn config_error_is_internal() {
        assert_eq!(
            GatewayError::Config("bad route".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

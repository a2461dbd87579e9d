use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::token::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing token")]
    MissingToken,

    #[error("Token rejected: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Upstream unreachable: {host} - {reason}")]
    UpstreamUnreachable { host: String, reason: String },

    #[error("Upstream returned HTTP {status} from {host}")]
    UpstreamStatus { host: String, status: StatusCode },

    #[error("Failed to rewrite playlist: {0}")]
    RewriteFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable identifier for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken(TokenError::Malformed(_)) => "MALFORMED_TOKEN",
            Self::InvalidToken(TokenError::InvalidSignature) => "INVALID_SIGNATURE",
            Self::InvalidToken(TokenError::Expired(_)) => "EXPIRED_TOKEN",
            Self::InvalidToken(TokenError::InvalidUrl(_)) => "INVALID_TOKEN_URL",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::UpstreamUnreachable { .. } => "UPSTREAM_UNREACHABLE",
            Self::UpstreamStatus { .. } => "UPSTREAM_ERROR",
            Self::RewriteFailure(_) => "REWRITE_FAILURE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken(_) => StatusCode::FORBIDDEN,
            Self::UpstreamStatus { status, .. } => *status,
            Self::InvalidUrl(_)
            | Self::UpstreamUnreachable { .. }
            | Self::RewriteFailure(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the client. Token failures share one message so callers
    /// cannot tell which check failed.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingToken => "Missing token",
            Self::InvalidToken(_) => "Invalid or expired token",
            Self::UpstreamStatus { .. } => "Upstream error",
            Self::InvalidUrl(_)
            | Self::UpstreamUnreachable { .. }
            | Self::RewriteFailure(_)
            | Self::Internal(_) => "Error fetching video",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        } else {
            tracing::warn!(code = self.error_code(), "{}", self);
        }

        (
            status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )],
            self.public_message(),
        )
            .into_response()
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::UpstreamUnreachable {
            host: e
                .url()
                .and_then(|u| u.host_str())
                .unwrap_or_default()
                .to_string(),
            reason: e.without_url().to_string(),
        }
    }
}

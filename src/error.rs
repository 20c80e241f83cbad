//! Error and control-flow signals raised while serving a call.
//!
//! Every way a call can end other than a normal return is a [`CallError`] variant. Handlers,
//! validators and the dispatcher itself all speak this one type, and the dispatcher maps it to
//! a status with a single exhaustive `match`.
//!
//! | Variant | Status |
//! |---|---|
//! | `NotFound`, `MethodNotFound` | 404 |
//! | `Validation` | 400 unless a status is carried |
//! | `AccessDenied` | 401 / 403 |
//! | `Redirect` | 3xx, 302 by default |
//! | `Stop` | caller specified |
//! | `BodyRead` | 408 |
//! | `Unhandled` | 500 |

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Result type of a handler method body.
///
/// `Ok(Some(value))` becomes the response body (200 unless the handler set a status),
/// `Ok(None)` produces an empty response (204 unless the handler set a status).
pub type HandlerResult = Result<Option<Value>, CallError>;

/// A terminal signal for the current call.
#[derive(Debug, Error)]
pub enum CallError {
    /// No namespace/class matched the path, or the positional arguments do not fit the method.
    #[error("{0}")]
    NotFound(String),

    /// The class exists but does not implement the requested method (or version).
    #[error("{class} does not implement {method}")]
    MethodNotFound { class: String, method: String },

    /// Send the client elsewhere.
    #[error("redirect to {location}")]
    Redirect { location: String, status: StatusCode },

    /// Finish the call right now with this status and optional body.
    #[error("call stopped with status {status}")]
    Stop {
        status: StatusCode,
        body: Option<Value>,
    },

    /// Credentials were missing or rejected. `scheme` names the attempted auth scheme and
    /// becomes the `WWW-Authenticate` challenge.
    #[error("{message}")]
    AccessDenied {
        status: StatusCode,
        scheme: Option<String>,
        message: String,
    },

    /// A parameter or the request body failed validation.
    #[error("{message}")]
    Validation { status: StatusCode, message: String },

    /// Reading the request body failed at the I/O layer.
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] std::io::Error),

    /// Anything else, including a panic in handler code.
    #[error(transparent)]
    Unhandled(#[from] anyhow::Error),
}

impl CallError {
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        CallError::NotFound(message.into())
    }

    /// 302 redirect to `location`.
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::redirect_with(StatusCode::FOUND, location)
    }

    #[must_use]
    pub fn redirect_with(status: StatusCode, location: impl Into<String>) -> Self {
        CallError::Redirect {
            location: location.into(),
            status,
        }
    }

    #[must_use]
    pub fn stop(status: StatusCode, body: Option<Value>) -> Self {
        CallError::Stop { status, body }
    }

    /// 401 carrying the auth scheme the client should retry with.
    #[must_use]
    pub fn access_denied(scheme: impl Into<String>, message: impl Into<String>) -> Self {
        CallError::AccessDenied {
            status: StatusCode::UNAUTHORIZED,
            scheme: Some(scheme.into()),
            message: message.into(),
        }
    }

    /// 403 without a challenge.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        CallError::AccessDenied {
            status: StatusCode::FORBIDDEN,
            scheme: None,
            message: message.into(),
        }
    }

    /// 400 validation failure.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::validation_with(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn validation_with(status: StatusCode, message: impl Into<String>) -> Self {
        CallError::Validation {
            status,
            message: message.into(),
        }
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            CallError::NotFound(_) | CallError::MethodNotFound { .. } => StatusCode::NOT_FOUND,
            CallError::Redirect { status, .. }
            | CallError::Stop { status, .. }
            | CallError::AccessDenied { status, .. }
            | CallError::Validation { status, .. } => *status,
            CallError::BodyRead(_) => StatusCode::REQUEST_TIMEOUT,
            CallError::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for the errors that end up as a 500 and reach the error hook.
    #[inline]
    #[must_use]
    pub fn is_unhandled(&self) -> bool {
        matches!(self, CallError::Unhandled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            CallError::not_found("nope").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CallError::MethodNotFound {
                class: "Bar".into(),
                method: "POST".into()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CallError::redirect("http://example.com").status_code(),
            StatusCode::FOUND
        );
        assert_eq!(
            CallError::stop(StatusCode::RESET_CONTENT, None).status_code(),
            StatusCode::RESET_CONTENT
        );
        assert_eq!(
            CallError::access_denied("Basic", "nope").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            CallError::forbidden("nope").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            CallError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow client");
        assert_eq!(
            CallError::BodyRead(io).status_code(),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            CallError::from(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_anyhow_question_mark() {
        fn handler() -> HandlerResult {
            let n: i64 = "x".parse().map_err(anyhow::Error::from)?;
            Ok(Some(Value::from(n)))
        }
        let err = handler().unwrap_err();
        assert!(err.is_unhandled());
    }

    #[test]
    fn test_display() {
        let err = CallError::MethodNotFound {
            class: "Bar".into(),
            method: "POST_v2".into(),
        };
        assert_eq!(err.to_string(), "Bar does not implement POST_v2");
    }
}

use crate::error::CallError;
use crate::params::{CallArgs, Validator};
use crate::transport::Request;
use std::sync::Arc;
use tracing::debug;

type PairCheck = Arc<dyn Fn(&Request, &str, &str) -> bool + Send + Sync>;
type TokenCheck = Arc<dyn Fn(&Request, &str) -> bool + Send + Sync>;
type RequestCheck = Arc<dyn Fn(&Request, &CallArgs) -> Result<bool, CallError> + Send + Sync>;

fn denied(scheme: &str, message: &str) -> CallError {
    debug!(scheme = %scheme, reason = %message, "Access denied");
    CallError::access_denied(scheme, message)
}

/// HTTP basic authentication.
#[derive(Clone)]
pub struct BasicAuth {
    check: PairCheck,
}

impl BasicAuth {
    /// `check(request, username, password)` decides whether the credentials are valid.
    #[must_use]
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Request, &str, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
        }
    }
}

impl Validator for BasicAuth {
    fn apply(&self, request: &Request, _args: &mut CallArgs) -> Result<(), CallError> {
        let Some((username, password)) = request.auth_basic() else {
            return Err(denied("Basic", "basic authorization required"));
        };
        if (self.check)(request, &username, &password) {
            Ok(())
        } else {
            Err(denied("Basic", "invalid username or password"))
        }
    }
}

/// OAuth 2.0 bearer token.
#[derive(Clone)]
pub struct TokenAuth {
    check: TokenCheck,
}

impl TokenAuth {
    /// `check(request, token)` decides whether the access token is valid.
    #[must_use]
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Request, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
        }
    }
}

impl Validator for TokenAuth {
    fn apply(&self, request: &Request, _args: &mut CallArgs) -> Result<(), CallError> {
        let Some(token) = request.access_token() else {
            return Err(denied("Bearer", "access token required"));
        };
        if (self.check)(request, &token) {
            Ok(())
        } else {
            Err(denied("Bearer", "invalid access token"))
        }
    }
}

/// OAuth 2.0 client credentials.
#[derive(Clone)]
pub struct ClientAuth {
    check: PairCheck,
}

impl ClientAuth {
    /// `check(request, client_id, client_secret)` decides whether the client is valid.
    #[must_use]
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Request, &str, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
        }
    }
}

impl Validator for ClientAuth {
    fn apply(&self, request: &Request, _args: &mut CallArgs) -> Result<(), CallError> {
        match request.client_tokens() {
            Some((id, secret)) if !id.is_empty() && !secret.is_empty() => {
                if (self.check)(request, &id, &secret) {
                    Ok(())
                } else {
                    Err(denied("Basic", "invalid client credentials"))
                }
            }
            _ => Err(denied("Basic", "client id and secret required")),
        }
    }
}

/// Authentication with a caller supplied scheme and check.
#[derive(Clone)]
pub struct CustomAuth {
    scheme: String,
    check: RequestCheck,
}

impl CustomAuth {
    #[must_use]
    pub fn new<F>(scheme: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Request, &CallArgs) -> bool + Send + Sync + 'static,
    {
        Self::try_new(scheme, move |req, args| Ok(check(req, args)))
    }

    /// Like [`new`](Self::new) but the check may fail with its own error. An `AccessDenied`
    /// from the check is passed through untouched; any other error is reported as access
    /// denied for this scheme.
    #[must_use]
    pub fn try_new<F>(scheme: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Request, &CallArgs) -> Result<bool, CallError> + Send + Sync + 'static,
    {
        Self {
            scheme: scheme.into(),
            check: Arc::new(check),
        }
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

impl Validator for CustomAuth {
    fn apply(&self, request: &Request, args: &mut CallArgs) -> Result<(), CallError> {
        match (self.check)(request, args) {
            Ok(true) => Ok(()),
            Ok(false) => Err(denied(&self.scheme, "access denied")),
            Err(err @ CallError::AccessDenied { .. }) => Err(err),
            Err(err) => Err(denied(&self.scheme, &err.to_string())),
        }
    }
}

use super::Request;
use http::header::{
    HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
    ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
};
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;

/// Preflight answers are cacheable for an hour.
const CORS_MAX_AGE_SECS: &str = "3600";

/// The response being assembled for one call.
#[derive(Debug, Clone, Default)]
pub struct Response {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Option<Value>,
}

impl Response {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit status, if the handler set one.
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// The status to send: the explicit one, else 200 with a body and 204 without.
    #[must_use]
    pub fn code(&self) -> StatusCode {
        self.status.unwrap_or(if self.body.is_some() {
            StatusCode::OK
        } else {
            StatusCode::NO_CONTENT
        })
    }

    /// True for any code below 400.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code().as_u16() < 400
    }

    #[inline]
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set (replace) a header.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    #[inline]
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn set_body(&mut self, body: Option<Value>) {
        self.body = body;
    }

    /// Echo the request's CORS headers back.
    ///
    /// Any request with an `Origin` gets `Access-Control-Allow-Origin` and
    /// `Access-Control-Allow-Credentials`. Preflight requests (`OPTIONS`) additionally get the
    /// requested methods and headers allowed, plus `Access-Control-Max-Age`.
    pub fn set_cors_headers(&mut self, request: &Request) {
        let headers = request.headers();
        if let Some(origin) = headers.get(ORIGIN) {
            self.headers
                .insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            self.headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }

        if *request.method() == Method::OPTIONS {
            if let Some(method) = headers.get(ACCESS_CONTROL_REQUEST_METHOD) {
                self.headers
                    .insert(ACCESS_CONTROL_ALLOW_METHODS, method.clone());
            }
            if let Some(req_headers) = headers.get(ACCESS_CONTROL_REQUEST_HEADERS) {
                self.headers
                    .insert(ACCESS_CONTROL_ALLOW_HEADERS, req_headers.clone());
            }
            self.headers.insert(
                ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from_static(CORS_MAX_AGE_SECS),
            );
        }
    }

    /// Split into `(code, headers, body)`.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Option<Value>) {
        (self.code(), self.headers, self.body)
    }
}

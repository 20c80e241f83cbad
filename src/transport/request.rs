use crate::accept::AcceptHeader;
use crate::error::CallError;
use base64::Engine;
use http::header::{HeaderName, HeaderValue, ACCEPT, ACCEPT_CHARSET, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, Method};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::io::{Cursor, Read};
use tracing::{debug, warn};

static BEARER_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)^Bearer\s+(\S+)$").ok());
static BASIC_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)^Basic\s+(\S+)$").ok());

/// Addresses that are never the public client address: self-identification, private
/// ranges, link local, documentation, broadcast, multicast and loopback (v4 and v6).
static NON_PUBLIC_IP_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:0\.|10\.|169\.254|172\.(?:1[6-9]|2[0-9]|3[0-1])\.|192\.0\.2\.|192\.168|255\.{3}|2001:db8|fc00:|fe80:|ff00:|127\.|::1)",
    )
    .ok()
});

/// Headers that may carry the client address chain, most authoritative first.
const IP_HEADERS: [&str; 9] = [
    "x-forwarded-for",
    "client-ip",
    "x-real-ip",
    "x-forwarded",
    "x-cluster-client-ip",
    "forwarded-for",
    "forwarded",
    "via",
    "remote-addr",
];

type BodyInput = Box<dyn Read + Send>;

/// A normalized HTTP request.
pub struct Request {
    method: Method,
    path: String,
    path_args: Vec<String>,
    headers: HeaderMap,
    query: Map<String, Value>,
    remote_addr: Option<String>,
    body_input: Option<BodyInput>,
    body_raw: Option<Vec<u8>>,
    body: Option<Value>,
    body_kwargs: Map<String, Value>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("remote_addr", &self.remote_addr)
            .field("body_pending", &self.body_input.is_some())
            .field("body_kwargs", &self.body_kwargs)
            .finish()
    }
}

impl Request {
    /// Start building a request from a method and a request target (`/path?query`).
    #[must_use]
    pub fn builder(method: Method, target: &str) -> RequestBuilder {
        RequestBuilder::new(method, target)
    }

    #[inline]
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Case-insensitive method check.
    #[must_use]
    pub fn is_method(&self, method: &str) -> bool {
        self.method.as_str().eq_ignore_ascii_case(method)
    }

    /// The path without the query string.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Non-empty, percent-decoded path segments.
    #[inline]
    #[must_use]
    pub fn path_args(&self) -> &[String] {
        &self.path_args
    }

    #[inline]
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string. Non-visible-ASCII values are treated as absent.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Query string parameters.
    #[inline]
    #[must_use]
    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    /// Body parameters. Empty until [`load_body`](Self::load_body) ran, and for bodies that
    /// are not a JSON object or a form.
    #[inline]
    #[must_use]
    pub fn body_kwargs(&self) -> &Map<String, Value> {
        &self.body_kwargs
    }

    /// The decoded body: the JSON document, or the form as an object.
    #[inline]
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// The raw body bytes once loaded.
    #[must_use]
    pub fn body_raw(&self) -> Option<&[u8]> {
        self.body_raw.as_deref()
    }

    /// Query and body parameters merged; body values win on collision.
    #[must_use]
    pub fn kwargs(&self) -> Map<String, Value> {
        let mut merged = self.query.clone();
        for (k, v) in &self.body_kwargs {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Read and decode the body, once.
    ///
    /// I/O failures become [`CallError::BodyRead`] (408); a malformed JSON document is a
    /// validation error (400). Other content types keep only the raw bytes.
    pub fn load_body(&mut self) -> Result<(), CallError> {
        let Some(mut input) = self.body_input.take() else {
            return Ok(());
        };

        let mut buf = Vec::new();
        input.read_to_end(&mut buf).map_err(CallError::BodyRead)?;
        if buf.is_empty() {
            return Ok(());
        }

        let content_type = self.content_type().unwrap_or_default();
        if content_type.contains("json") {
            let doc: Value = serde_json::from_slice(&buf).map_err(|e| {
                debug!(error = %e, "Malformed JSON body");
                CallError::validation(format!("malformed JSON body: {e}"))
            })?;
            if let Value::Object(map) = &doc {
                self.body_kwargs = map.clone();
            }
            self.body = Some(doc);
        } else if content_type == "application/x-www-form-urlencoded" {
            self.body_kwargs = parse_form(&buf);
            self.body = Some(Value::Object(self.body_kwargs.clone()));
        }
        self.body_raw = Some(buf);
        Ok(())
    }

    /// Lowercased media type of the `Content-Type` header, without parameters.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.header(CONTENT_TYPE.as_str()).map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// The `charset` parameter of the `Content-Type` header.
    #[must_use]
    pub fn charset(&self) -> Option<String> {
        let ct = self.header(CONTENT_TYPE.as_str())?;
        AcceptHeader::parse(ct)
            .first()
            .and_then(|m| m.param("charset"))
            .map(str::to_string)
    }

    /// The first charset of the `Accept-Charset` header.
    #[must_use]
    pub fn accept_charset(&self) -> Option<&str> {
        let value = self.header(ACCEPT_CHARSET.as_str())?;
        let first = value.split_whitespace().next()?;
        first
            .split([';', ','])
            .next()
            .filter(|s| !s.is_empty())
    }

    /// The parsed `Accept` header (empty when absent).
    #[must_use]
    pub fn accept(&self) -> AcceptHeader {
        self.header(ACCEPT.as_str())
            .map(AcceptHeader::parse)
            .unwrap_or_default()
    }

    /// API version requested through the `Accept` header for `content_type`.
    #[must_use]
    pub fn version(&self, content_type: &str) -> Option<String> {
        self.accept().version(content_type).map(str::to_string)
    }

    /// Token of an `Authorization: Bearer <token>` header.
    #[must_use]
    pub fn auth_bearer(&self) -> Option<&str> {
        let header = self.header(AUTHORIZATION.as_str())?;
        let re = BEARER_RE.as_ref()?;
        re.captures(header.trim())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// `(username, password)` of an `Authorization: Basic <base64>` header.
    #[must_use]
    pub fn auth_basic(&self) -> Option<(String, String)> {
        let header = self.header(AUTHORIZATION.as_str())?;
        let re = BASIC_RE.as_ref()?;
        let encoded = re.captures(header.trim())?.get(1)?.as_str();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, pass) = decoded.split_once(':')?;
        Some((user.to_string(), pass.to_string()))
    }

    /// OAuth 2.0 access token: bearer header, then `access_token` in the query, then in the
    /// body.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.auth_bearer()
            .map(str::to_string)
            .or_else(|| string_param(&self.query, "access_token"))
            .or_else(|| string_param(&self.body_kwargs, "access_token"))
    }

    /// OAuth 2.0 client credentials: basic auth header, then `client_id`/`client_secret` in
    /// the query, then in the body.
    #[must_use]
    pub fn client_tokens(&self) -> Option<(String, String)> {
        if let Some(creds) = self.auth_basic() {
            return Some(creds);
        }
        [&self.query, &self.body_kwargs].into_iter().find_map(|src| {
            let id = string_param(src, "client_id");
            let secret = string_param(src, "client_secret");
            match (id, secret) {
                (None, None) => None,
                (id, secret) => Some((id.unwrap_or_default(), secret.unwrap_or_default())),
            }
        })
    }

    /// Every address found in the forwarding headers plus the peer address, in order.
    #[must_use]
    pub fn ips(&self) -> Vec<String> {
        let mut ips: Vec<String> = IP_HEADERS
            .iter()
            .filter_map(|name| self.header(name))
            .flat_map(|v| v.split(','))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if let Some(addr) = &self.remote_addr {
            ips.push(addr.clone());
        }
        ips
    }

    /// The first public address of [`ips`](Self::ips).
    #[must_use]
    pub fn ip(&self) -> Option<String> {
        let re = NON_PUBLIC_IP_RE.as_ref()?;
        self.ips()
            .into_iter()
            .find(|ip| !ip.contains(char::is_whitespace) && !re.is_match(ip))
    }

    /// Address of the connected peer, as reported by the adapter.
    #[must_use]
    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }
}

/// First non-empty string under `key`; arrays yield their first string.
fn string_param(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Insert `value` under `key`, turning repeated keys into an array.
fn push_param(map: &mut Map<String, Value>, key: String, value: String) {
    match map.get_mut(&key) {
        Some(Value::Array(items)) => items.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
        None => {
            map.insert(key, Value::String(value));
        }
    }
}

/// Decode an `application/x-www-form-urlencoded` document.
fn parse_form(input: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in url::form_urlencoded::parse(input) {
        push_param(&mut map, k.into_owned(), v.into_owned());
    }
    map
}

/// Builder for [`Request`], used by adapters and tests.
pub struct RequestBuilder {
    method: Method,
    target: String,
    headers: HeaderMap,
    remote_addr: Option<String>,
    body_input: Option<BodyInput>,
}

impl RequestBuilder {
    fn new(method: Method, target: &str) -> Self {
        Self {
            method,
            target: target.to_string(),
            headers: HeaderMap::new(),
            remote_addr: None,
            body_input: None,
        }
    }

    /// Append a header. Invalid names or values are logged and skipped.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid request header"),
        }
        self
    }

    /// Replace all headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// In-memory body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body_input = Some(Box::new(Cursor::new(body.into())));
        self
    }

    /// Streaming body; read on the first [`Request::load_body`].
    #[must_use]
    pub fn body_reader(mut self, reader: impl Read + Send + 'static) -> Self {
        self.body_input = Some(Box::new(reader));
        self
    }

    /// JSON body with a matching `Content-Type`.
    #[must_use]
    pub fn json(self, body: &Value) -> Self {
        self.header(CONTENT_TYPE.as_str(), "application/json")
            .body(body.to_string())
    }

    #[must_use]
    pub fn build(self) -> Request {
        let (path, query_str) = match self.target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (self.target.as_str(), ""),
        };

        let path_args = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                urlencoding::decode(s)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            })
            .collect();

        Request {
            method: self.method,
            path: path.to_string(),
            path_args,
            headers: self.headers,
            query: parse_form(query_str.as_bytes()),
            remote_addr: self.remote_addr,
            body_input: self.body_input,
            body_raw: None,
            body: None,
            body_kwargs: Map::new(),
        }
    }
}

use crate::error::CallError;
use crate::params::{CallArgs, Validator};
use crate::transport::Request;
use dashmap::DashMap;
use http::StatusCode;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

type KeyFn = Arc<dyn Fn(&Request) -> Option<String> + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: usize,
}

/// Fixed-window call limit per client.
///
/// Calls are counted per key, by default the client [`ip`](Request::ip) followed by the
/// request path. Once a key has made `limit` calls inside one `ttl` window, further calls
/// fail with 429 until the window ends. Requests that yield no key are not limited.
///
/// Clones share their counters, so one `RateLimit` can guard several methods as a single
/// budget.
#[derive(Clone)]
pub struct RateLimit {
    limit: usize,
    ttl: Duration,
    key: KeyFn,
    windows: Arc<DashMap<String, Window>>,
}

impl RateLimit {
    #[must_use]
    pub fn new(limit: usize, ttl: Duration) -> Self {
        Self {
            limit,
            ttl,
            key: Arc::new(|req: &Request| req.ip().map(|ip| format!("{ip}{}", req.path()))),
            windows: Arc::new(DashMap::new()),
        }
    }

    /// Count calls under the key `f` returns instead of IP and path.
    #[must_use]
    pub fn key_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
    {
        self.key = Arc::new(f);
        self
    }

    #[inline]
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every window that has ended. Keys otherwise stay in memory until they call again.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, window| now.duration_since(window.started) < self.ttl);
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

impl fmt::Debug for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimit")
            .field("limit", &self.limit)
            .field("ttl", &self.ttl)
            .field("tracked", &self.windows.len())
            .finish()
    }
}

impl Validator for RateLimit {
    fn apply(&self, request: &Request, _args: &mut CallArgs) -> Result<(), CallError> {
        let Some(key) = (self.key)(request) else {
            return Ok(());
        };

        let now = Instant::now();
        let mut window = self.windows.entry(key).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now.duration_since(window.started) >= self.ttl {
            *window = Window {
                started: now,
                hits: 0,
            };
        }
        window.hits = window.hits.saturating_add(1);

        if window.hits > self.limit {
            warn!(
                key = %window.key(),
                hits = window.hits,
                limit = self.limit,
                "Rate limit exceeded"
            );
            return Err(CallError::validation_with(
                StatusCode::TOO_MANY_REQUESTS,
                "too many requests",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use std::thread;

    fn from(ip: &str, path: &str) -> Request {
        Request::builder(Method::GET, path)
            .header("x-forwarded-for", ip)
            .build()
    }

    #[test]
    fn test_throttle() {
        let foo_limit = RateLimit::new(3, Duration::from_millis(200));
        let bar_limit = RateLimit::new(10, Duration::from_millis(200));
        let mut args = CallArgs::default();
        let foo = from("76.0.0.1", "/foo");
        let bar = from("76.0.0.1", "/bar");

        for _ in 0..3 {
            assert!(foo_limit.apply(&foo, &mut args).is_ok());
        }
        for _ in 0..2 {
            let err = foo_limit.apply(&foo, &mut args).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        }

        // another path has its own budget
        for _ in 0..10 {
            assert!(bar_limit.apply(&bar, &mut args).is_ok());
        }
        assert!(bar_limit.apply(&bar, &mut args).is_err());

        thread::sleep(Duration::from_millis(250));
        for _ in 0..3 {
            assert!(foo_limit.apply(&foo, &mut args).is_ok());
        }
        assert!(foo_limit.apply(&foo, &mut args).is_err());
    }

    #[test]
    fn test_keyed_on_ip_and_path() {
        let limit = RateLimit::new(1, Duration::from_secs(60));
        let mut args = CallArgs::default();

        assert!(limit.apply(&from("76.0.0.1", "/foo"), &mut args).is_ok());
        assert!(limit.apply(&from("76.0.0.1", "/foo"), &mut args).is_err());
        assert!(limit.apply(&from("76.0.0.2", "/foo"), &mut args).is_ok());
        assert!(limit.apply(&from("76.0.0.1", "/che"), &mut args).is_ok());
        assert_eq!(limit.tracked(), 3);
    }

    #[test]
    fn test_no_key_is_not_limited() {
        let limit = RateLimit::new(1, Duration::from_secs(60));
        let mut args = CallArgs::default();
        // private addresses are not a client ip
        let req = from("10.0.0.1", "/foo");
        for _ in 0..5 {
            assert!(limit.apply(&req, &mut args).is_ok());
        }
        assert_eq!(limit.tracked(), 0);
    }

    #[test]
    fn test_custom_key_and_shared_clones() {
        let limit = RateLimit::new(2, Duration::from_secs(60))
            .key_with(|req| req.header("x-api-key").map(str::to_string));
        let other = limit.clone();
        let mut args = CallArgs::default();
        let req = Request::builder(Method::GET, "/foo")
            .header("x-api-key", "k1")
            .build();

        assert!(limit.apply(&req, &mut args).is_ok());
        assert!(other.apply(&req, &mut args).is_ok());
        assert!(limit.apply(&req, &mut args).is_err());
    }

    #[test]
    fn test_purge_expired() {
        let limit = RateLimit::new(1, Duration::from_millis(20));
        let mut args = CallArgs::default();
        limit.apply(&from("76.0.0.1", "/foo"), &mut args).unwrap();
        limit.apply(&from("76.0.0.2", "/foo"), &mut args).unwrap();
        assert_eq!(limit.tracked(), 2);

        thread::sleep(Duration::from_millis(40));
        limit.purge_expired();
        assert_eq!(limit.tracked(), 0);
    }
}

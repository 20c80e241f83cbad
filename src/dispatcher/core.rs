use crate::config::{DispatchConfig, DEFAULT_REQUEST_ID_HEADER};
use crate::controller::{ControllerClass, MethodInvoker};
use crate::error::{CallError, HandlerResult};
use crate::ids::CallId;
use crate::params::{CallArgs, Validator};
use crate::router::{title_case, NamespaceSource, Router, RoutingTable};
use crate::transport::{Request, Response};
use arc_swap::ArcSwap;
use http::header::{HeaderName, HeaderValue, LOCATION, WWW_AUTHENTICATE};
use http::{HeaderMap, Method, StatusCode};
use serde_json::{json, Value};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

/// Called for every call that ends in a 500, with the original error and the request.
pub type ErrorHook = Arc<dyn Fn(&CallError, &Request) + Send + Sync>;

const GENERIC_ERROR_MESSAGE: &str = "Internal Server Error";

/// Everything an adapter needs to write the response.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub call_id: CallId,
}

impl CallOutcome {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_u16() < 400
    }

    /// The body serialized as JSON text.
    #[must_use]
    pub fn body_string(&self) -> Option<String> {
        self.body.as_ref().map(Value::to_string)
    }

    /// The `errmsg` of an error body.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.get("errmsg"))
            .and_then(Value::as_str)
    }
}

/// Resolves, validates and invokes one call per [`handle`](Dispatcher::handle).
pub struct Dispatcher {
    router: ArcSwap<Router>,
    config: DispatchConfig,
    error_hook: Option<ErrorHook>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router.load_full())
            .field("config", &self.config)
            .field("error_hook", &self.error_hook.is_some())
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(table: RoutingTable) -> Self {
        Self::with_config(table, DispatchConfig::default())
    }

    /// Dispatcher configured from `ENDPOINTS_*` environment variables.
    #[must_use]
    pub fn from_env(table: RoutingTable) -> Self {
        Self::with_config(table, DispatchConfig::from_env())
    }

    #[must_use]
    pub fn with_config(table: RoutingTable, config: DispatchConfig) -> Self {
        Self::with_source(Arc::new(table), config)
    }

    /// Dispatcher over any namespace source.
    #[must_use]
    pub fn with_source(source: Arc<dyn NamespaceSource>, config: DispatchConfig) -> Self {
        let router = Router::new(source, config.default_class.as_str());
        info!(
            content_type = %config.content_type,
            default_class = %router.default_class(),
            expose_errors = config.expose_errors,
            "Dispatcher ready"
        );
        Self {
            router: ArcSwap::from_pointee(router),
            config,
            error_hook: None,
        }
    }

    /// Builder-style [`set_content_type`](Self::set_content_type).
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.set_content_type(content_type);
        self
    }

    /// Media type used to filter the `Accept` header for a version token.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.config.content_type = content_type.into();
    }

    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Observe unhandled errors. The hook cannot change the outcome.
    pub fn set_error_hook<F>(&mut self, hook: F)
    where
        F: Fn(&CallError, &Request) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
    }

    /// Atomically replace the routing table. Calls already in flight finish on the old one.
    pub fn swap_routes(&self, table: RoutingTable) {
        let router = Router::new(Arc::new(table), self.config.default_class.as_str());
        self.router.store(Arc::new(router));
        info!("Routing table swapped");
    }

    /// The router currently in use.
    #[must_use]
    pub fn router(&self) -> Arc<Router> {
        self.router.load_full()
    }

    /// Serve one request. Every failure is folded into the outcome.
    pub fn handle(&self, mut request: Request) -> CallOutcome {
        let started = Instant::now();
        let call_id = CallId::from_header_or_new(request.header(&self.config.request_id_header));
        let span = info_span!(
            "call",
            call_id = %call_id,
            method = %request.method(),
            path = %request.path()
        );
        let _guard = span.enter();

        let router = self.router.load_full();
        let mut response = Response::new();
        let mut cors = false;

        let (status, mut headers, body) =
            match self.run(&router, &mut request, &mut response, &mut cors) {
                Ok(body) => {
                    if body.is_some() {
                        response.set_body(body);
                    }
                    response.into_parts()
                }
                Err(err) => self.error_parts(err, &request, cors),
            };

        self.echo_call_id(&mut headers, call_id);

        info!(
            status = status.as_u16(),
            duration_us = started.elapsed().as_micros() as u64,
            "Call complete"
        );

        CallOutcome {
            status,
            headers,
            body,
            call_id,
        }
    }

    fn run(
        &self,
        router: &Router,
        request: &mut Request,
        response: &mut Response,
        cors: &mut bool,
    ) -> HandlerResult {
        let route = router.resolve(request.path_args())?;
        let class = &route.class;
        *cors = class.is_cors();

        let version = request.version(&self.config.content_type);
        let method = request.method().as_str().to_ascii_uppercase();
        let selected = select_method(class, &method, version.as_deref()).map(Arc::clone);
        let invoker = match selected {
            Some(invoker) => invoker,
            None if *cors && *request.method() == Method::OPTIONS => {
                debug!(class = %route.class_name, "Answering CORS preflight");
                response.set_cors_headers(request);
                return Ok(None);
            }
            None => {
                let method = match version {
                    Some(v) => format!("{method}_{v}"),
                    None => method,
                };
                return Err(CallError::MethodNotFound {
                    class: route.class_name.clone(),
                    method,
                });
            }
        };

        let arity = invoker.arity();
        if !arity.accepts(route.remaining_args.len()) {
            debug!(
                class = %route.class_name,
                expected = %arity,
                got = route.remaining_args.len(),
                "Positional arguments do not fit"
            );
            return Err(CallError::not_found(format!(
                "{} takes {} positional argument(s), got {}",
                route.class_name,
                arity,
                route.remaining_args.len()
            )));
        }

        request.load_body()?;
        if *cors {
            response.set_cors_headers(request);
        }

        let request: &Request = request;
        let args = CallArgs::from_request(request, route.remaining_args);
        debug!(
            class = %route.class_name,
            module_path = %route.module_path,
            args = args.args.len(),
            kwargs = args.kwargs.len(),
            "Invoking handler"
        );

        invoke_guarded(class, invoker.as_ref(), request, response, args)
    }

    fn error_parts(
        &self,
        err: CallError,
        request: &Request,
        cors: bool,
    ) -> (StatusCode, HeaderMap, Option<Value>) {
        let mut response = Response::new();
        if cors {
            response.set_cors_headers(request);
        }
        let status = err.status_code();
        response.set_status(status);

        if err.is_unhandled() {
            error!(status = status.as_u16(), error = %err, "Unhandled error");
            if let Some(hook) = &self.error_hook {
                hook(&err, request);
            }
        } else {
            debug!(status = status.as_u16(), error = %err, "Call ended early");
        }

        match err {
            CallError::Redirect { location, .. } => match HeaderValue::from_str(&location) {
                Ok(value) => response.set_header(LOCATION, value),
                Err(_) => warn!(location = %location, "Redirect location is not a valid header"),
            },
            CallError::Stop { body, .. } => response.set_body(body),
            CallError::AccessDenied {
                scheme, message, ..
            } => {
                if let Some(scheme) = scheme.filter(|s| !s.is_empty()) {
                    if let Ok(value) = HeaderValue::from_str(&title_case(&scheme)) {
                        response.set_header(WWW_AUTHENTICATE, value);
                    }
                }
                response.set_body(Some(json!({ "errmsg": message })));
            }
            CallError::Unhandled(inner) => {
                let message = if self.config.expose_errors {
                    inner.to_string()
                } else {
                    GENERIC_ERROR_MESSAGE.to_string()
                };
                response.set_body(Some(json!({ "errmsg": message })));
            }
            other @ (CallError::NotFound(_)
            | CallError::MethodNotFound { .. }
            | CallError::Validation { .. }
            | CallError::BodyRead(_)) => {
                response.set_body(Some(json!({ "errmsg": other.to_string() })));
            }
        }

        response.into_parts()
    }

    fn echo_call_id(&self, headers: &mut HeaderMap, call_id: CallId) {
        let name = HeaderName::from_bytes(self.config.request_id_header.as_bytes())
            .unwrap_or_else(|_| HeaderName::from_static(DEFAULT_REQUEST_ID_HEADER));
        if let Ok(value) = HeaderValue::from_str(&call_id.to_string()) {
            headers.insert(name, value);
        }
    }
}

/// `METHOD_version` when a version was negotiated and the class has it, else `METHOD`.
fn select_method<'a>(
    class: &'a ControllerClass,
    method: &str,
    version: Option<&str>,
) -> Option<&'a Arc<dyn MethodInvoker>> {
    if let Some(version) = version {
        let versioned = format!("{method}_{version}");
        if let Some(invoker) = class.method(&versioned) {
            debug!(method = %versioned, "Selected versioned method");
            return Some(invoker);
        }
    }
    class.method(method)
}

/// Build the per-request state, run the validators in order, then the body. A panic anywhere
/// in there becomes an unhandled error.
fn invoke_guarded(
    class: &ControllerClass,
    invoker: &dyn MethodInvoker,
    request: &Request,
    response: &mut Response,
    mut args: CallArgs,
) -> HandlerResult {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut state = class.new_state(request);
        for validator in invoker.validators() {
            validator.apply(request, &mut args)?;
        }
        invoker.invoke(state.as_mut(), request, response, args)
    }));

    match result {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(class = %class.name(), panic_message = %message, "Handler panicked");
            Err(CallError::Unhandled(anyhow::anyhow!(
                "handler panicked: {message}"
            )))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

use crate::error::{CallError, HandlerResult};
use crate::params::{CallArgs, ParamSpec, Validator};
use crate::transport::{Request, Response};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// What a handler body sees for one call.
pub struct Controller<'a, S = ()> {
    pub request: &'a Request,
    /// Status and headers set here survive a normal return. They are discarded when the call
    /// ends with an error.
    pub response: &'a mut Response,
    pub state: &'a mut S,
}

impl<S> Controller<'_, S> {
    #[inline]
    pub fn state(&mut self) -> &mut S {
        &mut *self.state
    }
}

type Body<S> = Arc<dyn Fn(&mut Controller<'_, S>, CallArgs) -> HandlerResult + Send + Sync>;
type StateFactory = Arc<dyn Fn(&Request) -> Box<dyn Any + Send> + Send + Sync>;

/// Accepted number of positional arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgArity {
    pub min: usize,
    /// `None` is unbounded.
    pub max: Option<usize>,
}

impl ArgArity {
    pub const ANY: ArgArity = ArgArity { min: 0, max: None };

    #[inline]
    #[must_use]
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl Default for ArgArity {
    fn default() -> Self {
        Self::ANY
    }
}

impl fmt::Display for ArgArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{}..={}", self.min, max),
            None => write!(f, "{}..", self.min),
        }
    }
}

/// A handler body with its validators and positional arity.
pub struct HandlerMethod<S = ()> {
    body: Body<S>,
    validators: Vec<Arc<dyn Validator>>,
    arity: ArgArity,
}

impl<S> Clone for HandlerMethod<S> {
    fn clone(&self) -> Self {
        Self {
            body: Arc::clone(&self.body),
            validators: self.validators.clone(),
            arity: self.arity,
        }
    }
}

impl<S> HandlerMethod<S> {
    #[must_use]
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&mut Controller<'_, S>, CallArgs) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            body: Arc::new(body),
            validators: Vec::new(),
            arity: ArgArity::ANY,
        }
    }

    /// Append a validator; validators run in the order they were added.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Append a parameter spec.
    #[must_use]
    pub fn param(self, spec: ParamSpec) -> Self {
        self.validator(spec)
    }

    /// Exactly `count` positional arguments.
    #[must_use]
    pub fn positional(mut self, count: usize) -> Self {
        self.arity = ArgArity {
            min: count,
            max: Some(count),
        };
        self
    }

    /// Between `min` and `max` positional arguments (`None` for no upper bound).
    #[must_use]
    pub fn args(mut self, min: usize, max: Option<usize>) -> Self {
        self.arity = ArgArity { min, max };
        self
    }

    #[inline]
    #[must_use]
    pub fn arity(&self) -> ArgArity {
        self.arity
    }
}

/// Type-erased handler method, as stored on a class.
pub(crate) trait MethodInvoker: Send + Sync {
    fn arity(&self) -> ArgArity;

    fn validators(&self) -> &[Arc<dyn Validator>];

    fn invoke(
        &self,
        state: &mut (dyn Any + Send),
        request: &Request,
        response: &mut Response,
        args: CallArgs,
    ) -> HandlerResult;
}

impl<S: Send + 'static> MethodInvoker for HandlerMethod<S> {
    fn arity(&self) -> ArgArity {
        self.arity
    }

    fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    fn invoke(
        &self,
        state: &mut (dyn Any + Send),
        request: &Request,
        response: &mut Response,
        args: CallArgs,
    ) -> HandlerResult {
        let state = state.downcast_mut::<S>().ok_or_else(|| {
            CallError::Unhandled(anyhow::anyhow!(
                "controller state is not a {}",
                std::any::type_name::<S>()
            ))
        })?;
        let mut controller = Controller {
            request,
            response,
            state,
        };
        (self.body)(&mut controller, args)
    }
}

/// A routable controller class.
pub struct ControllerClass {
    name: String,
    methods: HashMap<String, Arc<dyn MethodInvoker>>,
    state_factory: StateFactory,
    cors: bool,
}

impl fmt::Debug for ControllerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerClass")
            .field("name", &self.name)
            .field("methods", &self.method_names())
            .field("cors", &self.cors)
            .finish()
    }
}

impl ControllerClass {
    /// A stateless class.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ClassBuilder<()> {
        ClassBuilder::new(name.into(), Arc::new(|_req: &Request| Box::new(()) as Box<dyn Any + Send>))
    }

    /// A class whose handlers share a value built fresh for every request.
    #[must_use]
    pub fn with_state<S, F>(name: impl Into<String>, factory: F) -> ClassBuilder<S>
    where
        S: Send + 'static,
        F: Fn(&Request) -> S + Send + Sync + 'static,
    {
        ClassBuilder::new(
            name.into(),
            Arc::new(move |req: &Request| Box::new(factory(req)) as Box<dyn Any + Send>),
        )
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Method names, sorted.
    #[must_use]
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[inline]
    #[must_use]
    pub fn is_cors(&self) -> bool {
        self.cors
    }

    pub(crate) fn method(&self, name: &str) -> Option<&Arc<dyn MethodInvoker>> {
        self.methods.get(name)
    }

    pub(crate) fn new_state(&self, request: &Request) -> Box<dyn Any + Send> {
        (self.state_factory)(request)
    }
}

/// Builder returned by [`ControllerClass::builder`] and [`ControllerClass::with_state`].
pub struct ClassBuilder<S> {
    name: String,
    methods: HashMap<String, Arc<dyn MethodInvoker>>,
    state_factory: StateFactory,
    cors: bool,
    _state: PhantomData<fn() -> S>,
}

impl<S: Send + 'static> ClassBuilder<S> {
    fn new(name: String, state_factory: StateFactory) -> Self {
        Self {
            name,
            methods: HashMap::new(),
            state_factory,
            cors: false,
            _state: PhantomData,
        }
    }

    /// Register a handler method under `name` (`GET`, `POST_v2`, ...). A second
    /// registration under the same name replaces the first.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, method: HandlerMethod<S>) -> Self {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// Register a bare handler body without validators.
    #[must_use]
    pub fn handle<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Controller<'_, S>, CallArgs) -> HandlerResult + Send + Sync + 'static,
    {
        self.method(name, HandlerMethod::new(body))
    }

    /// Echo CORS headers and answer `OPTIONS` preflights.
    #[must_use]
    pub fn cors(mut self) -> Self {
        self.cors = true;
        self
    }

    #[must_use]
    pub fn build(self) -> ControllerClass {
        ControllerClass {
            name: self.name,
            methods: self.methods,
            state_factory: self.state_factory,
            cors: self.cors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;

    #[test]
    fn test_arity() {
        assert!(ArgArity::ANY.accepts(0));
        assert!(ArgArity::ANY.accepts(9));
        let exact = ArgArity {
            min: 1,
            max: Some(1),
        };
        assert!(!exact.accepts(0));
        assert!(exact.accepts(1));
        assert!(!exact.accepts(2));
        assert_eq!(exact.to_string(), "1");
        assert_eq!(ArgArity { min: 1, max: None }.to_string(), "1..");
    }

    #[test]
    fn test_builder() {
        let class = ControllerClass::builder("Bar")
            .handle("GET", |_ctl, _args| Ok(None))
            .handle("POST_v1", |_ctl, _args| Ok(None))
            .cors()
            .build();
        assert_eq!(class.name(), "Bar");
        assert_eq!(class.method_names(), ["GET", "POST_v1"]);
        assert!(class.is_cors());
        assert!(!class.has_method("POST"));
    }

    #[test]
    fn test_state_is_fresh_per_invocation() {
        let class = ControllerClass::with_state("Counter", |_req| Vec::<i64>::new())
            .handle("GET", |ctl, _args| {
                ctl.state().push(1);
                Ok(Some(json!(ctl.state.len())))
            })
            .build();

        let req = Request::builder(Method::GET, "/").build();
        for _ in 0..2 {
            let mut state = class.new_state(&req);
            let mut resp = Response::new();
            let method = class.method("GET").unwrap();
            let out = method
                .invoke(state.as_mut(), &req, &mut resp, CallArgs::default())
                .unwrap();
            assert_eq!(out, Some(json!(1)));
        }
    }
}

//! Request routing over a segment trie.
//!
//! A [`Router`] maps `(method, pattern)` pairs to handlers. Patterns are
//! cleaned like filesystem paths and split on `/`; each component is either a
//! literal, a `:name` variable matching one component, or a trailing `*name`
//! variable matching the rest of the path.
//!
//! | Pattern                        | Matches                    | Captured                        |
//! |--------------------------------|----------------------------|---------------------------------|
//! | `/users`                       | `/users`, `/users/`        | *(none)*                        |
//! | `/users/:userID/posts/:postID` | `/users/1234/posts/123`    | `:userID=1234`, `:postID=123`   |
//! | `/static/*filepath`            | `/static/js/jquery.js`     | `*filepath=js/jquery.js`        |
//!
//! Patterns match whole paths, never prefixes. At every step a literal edge
//! wins over the variable edge, and the walk never backtracks, so the result
//! does not depend on registration order. Ambiguous registrations (two
//! different variable names at one position, or the same method twice on one
//! pattern) are rejected when they are made.
//!
//! Captured variables are appended to the request's query string under their
//! prefixed names, where handlers read them with
//! [`Request::query_param`](crate::http::Request::query_param). The original
//! query can be recovered with [`strip_vars`].
//!
//! Registration takes `&mut self` and routing takes `&self`: build the router
//! on one thread, then share it (for example in an `Arc`) to serve.

mod error;
pub mod global;
mod handler;
mod pattern;
mod trie;
mod vars;

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, error, warn};

pub use self::error::RouteError;
pub use self::handler::{BoxFuture, Handler, IntoHandler, PanicHook, into_handler};
pub use self::vars::{append_var, escape, strip_vars};

use self::handler::panic_message;
use self::pattern::{Segment, clean_path, compile, split_path};
use self::trie::{Node, Walk};
use crate::http::{Method, Request, Response, StatusCode};

/// Outcome of matching a method and path against the registered routes.
pub enum Lookup<'a> {
    /// A handler is registered for this method and path.
    Found {
        handler: &'a Handler,
        /// `(prefixed name, value)` pairs in path order.
        vars: Vec<(&'a str, String)>,
    },
    /// No pattern matches the path.
    NotFound,
    /// A pattern matches, but not for this method. Carries the methods that
    /// are registered for it, in registration order.
    MethodNotAllowed(Vec<&'a Method>),
}

/// A trie-based HTTP request router.
///
/// # Examples
///
/// ```rust,no_run
/// use segroute::{Method, Response, Router, StatusCode};
///
/// let mut router = Router::new();
///
/// router.get("/", |_req| async { Response::new(StatusCode::Ok).body("home") });
/// router.handle_named(
///     Method::Get,
///     "/users/:userID/posts/:postID",
///     "post",
///     |req: segroute::Request| async move {
///         let user = req.query_param(":userID").unwrap_or_default().to_owned();
///         Response::new(StatusCode::Ok).body(user)
///     },
/// );
/// router.get("/static/*filepath", |_req| async { Response::new(StatusCode::Ok) });
///
/// assert_eq!(router.url("post", &["1234", "123"]), "/users/1234/posts/123");
/// ```
#[derive(Default)]
pub struct Router {
    root: Node,
    names: HashMap<String, String>,
    routes: usize,
    not_found: Option<Handler>,
    method_not_allowed: Option<Handler>,
    panic_hook: Option<PanicHook>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` requests matching `pattern`, with an
    /// optional name for [`url`](Self::url).
    ///
    /// This is the fallible form every other registration method goes
    /// through. A rejected registration leaves the router unchanged.
    ///
    /// # Errors
    ///
    /// - [`RouteError::InvalidPattern`]: the pattern is empty, or a suffix
    ///   variable is not its last segment.
    /// - [`RouteError::InvalidHandler`]: `handler` is `None`.
    /// - [`RouteError::DuplicateName`]: `name` is already taken.
    /// - [`RouteError::ConflictingVariable`]: a different variable name is
    ///   already registered at one of the pattern's positions.
    /// - [`RouteError::ConflictingMethod`]: `method` is already registered
    ///   for an equivalent pattern (`/foo` and `/foo/` are equivalent).
    pub fn try_insert(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Option<Handler>,
        name: Option<&str>,
    ) -> Result<&mut Self, RouteError> {
        let segments = compile(pattern)?;

        let Some(handler) = handler else {
            return Err(RouteError::InvalidHandler {
                method,
                pattern: pattern.to_owned(),
            });
        };

        if let Some(name) = name {
            if self.names.contains_key(name) {
                return Err(RouteError::DuplicateName {
                    name: name.to_owned(),
                });
            }
        }

        self.root
            .insert(pattern, &segments, method.clone(), handler)?;

        if let Some(name) = name {
            self.names.insert(name.to_owned(), pattern.to_owned());
        }
        self.routes += 1;

        debug!(method = %method, pattern, name = ?name, "route registered");
        Ok(self)
    }

    /// Fallible form of [`handle`](Self::handle).
    pub fn try_handle(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl IntoHandler,
    ) -> Result<&mut Self, RouteError> {
        self.try_insert(method, pattern, Some(into_handler(handler)), None)
    }

    /// Registers `handler` for `method` requests matching `pattern`.
    ///
    /// # Panics
    ///
    /// On any [`RouteError`]; see [`try_insert`](Self::try_insert).
    pub fn handle(&mut self, method: Method, pattern: &str, handler: impl IntoHandler) -> &mut Self {
        self.register(method, pattern, into_handler(handler), None)
    }

    /// Like [`handle`](Self::handle), and records the pattern under `name`.
    pub fn handle_named(
        &mut self,
        method: Method,
        pattern: &str,
        name: &str,
        handler: impl IntoHandler,
    ) -> &mut Self {
        self.register(method, pattern, into_handler(handler), Some(name))
    }

    pub fn get(&mut self, pattern: &str, handler: impl IntoHandler) -> &mut Self {
        self.handle(Method::Get, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl IntoHandler) -> &mut Self {
        self.handle(Method::Post, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl IntoHandler) -> &mut Self {
        self.handle(Method::Put, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl IntoHandler) -> &mut Self {
        self.handle(Method::Delete, pattern, handler)
    }

    pub fn options(&mut self, pattern: &str, handler: impl IntoHandler) -> &mut Self {
        self.handle(Method::Options, pattern, handler)
    }

    /// [`get`](Self::get) with a name for [`url`](Self::url).
    pub fn get_named(&mut self, pattern: &str, name: &str, handler: impl IntoHandler) -> &mut Self {
        self.handle_named(Method::Get, pattern, name, handler)
    }

    pub fn post_named(
        &mut self,
        pattern: &str,
        name: &str,
        handler: impl IntoHandler,
    ) -> &mut Self {
        self.handle_named(Method::Post, pattern, name, handler)
    }

    pub fn put_named(&mut self, pattern: &str, name: &str, handler: impl IntoHandler) -> &mut Self {
        self.handle_named(Method::Put, pattern, name, handler)
    }

    pub fn delete_named(
        &mut self,
        pattern: &str,
        name: &str,
        handler: impl IntoHandler,
    ) -> &mut Self {
        self.handle_named(Method::Delete, pattern, name, handler)
    }

    pub fn options_named(
        &mut self,
        pattern: &str,
        name: &str,
        handler: impl IntoHandler,
    ) -> &mut Self {
        self.handle_named(Method::Options, pattern, name, handler)
    }

    /// Replaces the default `404` response.
    pub fn not_found(&mut self, handler: impl IntoHandler) -> &mut Self {
        self.not_found = Some(into_handler(handler));
        self
    }

    /// Replaces the default `405` response.
    ///
    /// The `Allow` header listing the registered methods is added to whatever
    /// the handler returns, unless it already set one.
    pub fn method_not_allowed(&mut self, handler: impl IntoHandler) -> &mut Self {
        self.method_not_allowed = Some(into_handler(handler));
        self
    }

    /// Installs an observer for panics raised by handlers.
    ///
    /// Without one, a panicking handler unwinds out of [`route`](Self::route)
    /// into the caller, which for [`Server`](crate::Server) ends only the
    /// connection task that was serving the request.
    ///
    /// ```rust,no_run
    /// use segroute::{Response, Router, StatusCode};
    ///
    /// let mut router = Router::new();
    /// router.on_panic(|req, _payload| {
    ///     tracing::error!(path = req.path(), "handler panicked");
    ///     Response::new(StatusCode::InternalServerError)
    /// });
    /// ```
    pub fn on_panic<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Request, Box<dyn Any + Send>) -> Response + Send + Sync + 'static,
    {
        self.panic_hook = Some(Arc::new(hook));
        self
    }

    /// Number of registered `(method, pattern)` pairs.
    pub fn len(&self) -> usize {
        self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }

    /// Returns the pattern registered under `name`, as it was given.
    pub fn pattern(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    /// Builds a path that matches the pattern registered as `name`.
    ///
    /// Arguments fill the pattern's variables left to right, verbatim; the
    /// result is cleaned like any other path.
    ///
    /// # Errors
    ///
    /// [`RouteError::UnknownName`], or [`RouteError::TooFewArguments`] /
    /// [`RouteError::TooManyArguments`] when `args.len()` differs from the
    /// number of variables in the pattern.
    pub fn try_url(&self, name: &str, args: &[&str]) -> Result<String, RouteError> {
        let pattern = self
            .names
            .get(name)
            .ok_or_else(|| RouteError::UnknownName {
                name: name.to_owned(),
            })?;
        let segments = compile(pattern)?;

        let expected = segments.iter().filter(|s| s.is_variable()).count();
        if args.len() < expected {
            return Err(RouteError::TooFewArguments {
                pattern: pattern.clone(),
                expected,
                got: args.len(),
            });
        }
        if args.len() > expected {
            return Err(RouteError::TooManyArguments {
                pattern: pattern.clone(),
                expected,
                got: args.len(),
            });
        }

        let mut args = args.iter();
        let parts: Vec<&str> = segments
            .iter()
            .filter_map(|segment| match *segment {
                Segment::Literal(part) => Some(part),
                Segment::Single(_) | Segment::Suffix(_) => args.next().copied(),
            })
            .collect();

        Ok(clean_path(&parts.join("/")))
    }

    /// Builds a path for the pattern registered as `name`.
    ///
    /// # Panics
    ///
    /// On any error from [`try_url`](Self::try_url).
    pub fn url(&self, name: &str, args: &[&str]) -> String {
        match self.try_url(name, args) {
            Ok(url) => url,
            Err(e) => panic!("{e}"),
        }
    }

    /// Matches `method` and `path` without touching any request.
    pub fn find<'a>(&'a self, method: &Method, path: &str) -> Lookup<'a> {
        let parts = split_path(path);
        let Some(Walk { node, vars }) = self.root.walk(&parts) else {
            return Lookup::NotFound;
        };
        if !node.is_terminal() {
            return Lookup::NotFound;
        }
        match node.handler(method) {
            Some(handler) => Lookup::Found { handler, vars },
            None => Lookup::MethodNotAllowed(node.methods().collect()),
        }
    }

    /// Dispatches `request` and returns the response.
    ///
    /// On a match, captured variables are appended to the request's query
    /// string before the handler runs. Otherwise the `404` or `405` hook (or
    /// its default) answers. Handlers and hooks run behind the panic hook
    /// when one is installed.
    pub async fn route(&self, mut request: Request) -> Response {
        match self.find(request.method(), request.path()) {
            Lookup::Found { handler, vars } => {
                debug!(
                    method = %request.method(),
                    path = request.path(),
                    vars = vars.len(),
                    "route matched"
                );
                inject_vars(&mut request, &vars);
                self.call(handler, request).await
            }
            Lookup::NotFound => {
                debug!(method = %request.method(), path = request.path(), "no route matched");
                match &self.not_found {
                    Some(handler) => self.call(handler, request).await,
                    None => Response::new(StatusCode::NotFound).body("404 page not found\n"),
                }
            }
            Lookup::MethodNotAllowed(methods) => {
                let allow = methods
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                warn!(
                    method = %request.method(),
                    path = request.path(),
                    allow = allow.as_str(),
                    "method not allowed"
                );
                let mut response = match &self.method_not_allowed {
                    Some(handler) => self.call(handler, request).await,
                    None => Response::new(StatusCode::MethodNotAllowed)
                        .body("405 method not allowed\n"),
                };
                if !response.headers().contains("allow") {
                    response.set_header("Allow", allow);
                }
                response
            }
        }
    }

    fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Handler,
        name: Option<&str>,
    ) -> &mut Self {
        if let Err(e) = self.try_insert(method, pattern, Some(handler), name) {
            panic!("{e}");
        }
        self
    }

    async fn call(&self, handler: &Handler, request: Request) -> Response {
        let Some(hook) = &self.panic_hook else {
            return handler(request).await;
        };

        let snapshot = request.clone();
        // The async block moves the call itself inside the barrier, so a
        // handler that panics before returning its future is caught too.
        let outcome = AssertUnwindSafe(async move { handler(request).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(response) => response,
            Err(payload) => {
                error!(
                    method = %snapshot.method(),
                    path = snapshot.path(),
                    panic = panic_message(payload.as_ref()),
                    "handler panicked"
                );
                hook(&snapshot, payload)
            }
        }
    }
}

// All pairs land in one query update, in path order.
fn inject_vars(request: &mut Request, vars: &[(&str, String)]) {
    if vars.is_empty() {
        return;
    }
    let mut query = request.query_string().to_owned();
    for (name, value) in vars {
        query = append_var(&query, name, value);
    }
    request.set_query_string(query);
}

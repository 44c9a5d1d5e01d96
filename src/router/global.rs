//! A process-wide default router.
//!
//! Build a [`Router`] as usual, then [`install`] it once. From then on it is
//! read-only and reachable from anywhere through [`router`], [`url`] and
//! [`route`]. There is no way to register routes on the installed instance.
//!
//! ```rust,no_run
//! use segroute::router::global;
//! use segroute::{Method, Response, Router, StatusCode};
//!
//! let mut router = Router::new();
//! router.handle_named(Method::Get, "/users/:userID", "user", |_req| async {
//!     Response::new(StatusCode::Ok)
//! });
//! if global::install(router).is_err() {
//!     panic!("default router installed twice");
//! }
//!
//! assert_eq!(global::url("user", &["42"]), "/users/42");
//! ```

use std::sync::OnceLock;

use super::{RouteError, Router};
use crate::http::{Request, Response, StatusCode};

static DEFAULT: OnceLock<Router> = OnceLock::new();

/// Installs `router` as the default. Hands it back if one is already installed.
pub fn install(router: Router) -> Result<(), Router> {
    DEFAULT.set(router)?;
    tracing::debug!(routes = DEFAULT.get().map_or(0, Router::len), "default router installed");
    Ok(())
}

/// The installed default router, if any.
pub fn router() -> Option<&'static Router> {
    DEFAULT.get()
}

/// [`Router::try_url`] on the default router.
///
/// Reports [`RouteError::UnknownName`] when nothing is installed.
pub fn try_url(name: &str, args: &[&str]) -> Result<String, RouteError> {
    match router() {
        Some(router) => router.try_url(name, args),
        None => Err(RouteError::UnknownName {
            name: name.to_owned(),
        }),
    }
}

/// [`Router::url`] on the default router.
///
/// # Panics
///
/// When [`try_url`] fails.
pub fn url(name: &str, args: &[&str]) -> String {
    match try_url(name, args) {
        Ok(url) => url,
        Err(e) => panic!("{e}"),
    }
}

/// [`Router::route`] on the default router; `404` when none is installed.
pub async fn route(request: Request) -> Response {
    match router() {
        Some(router) => router.route(request).await,
        None => Response::new(StatusCode::NotFound).body("404 page not found\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    // The only test in the crate that installs a default router.
    #[tokio::test]
    async fn installed_router_serves_and_builds_urls() {
        let mut default = Router::new();
        default.handle_named(Method::Get, "/users/:userID", "user", |req: Request| async move {
            let id = req.query_param(":userID").unwrap_or_default().to_owned();
            Response::new(StatusCode::Ok).body(id)
        });
        assert!(install(default).is_ok());
        assert!(install(Router::new()).is_err());

        assert_eq!(router().map(Router::len), Some(1));
        assert_eq!(url("user", &["42"]), "/users/42");
        assert!(matches!(
            try_url("missing", &[]),
            Err(RouteError::UnknownName { .. })
        ));

        let res = route(Request::new(Method::Get, "/users/42")).await;
        assert_eq!(res.body_text(), "42");
        let res = route(Request::new(Method::Get, "/nowhere")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }
}

//! # segroute
//!
//! A segment-trie HTTP request router.
//!
//! Routes are `(method, pattern)` pairs. A pattern is a path whose components
//! are literals, `:name` variables matching one component, or a final `*name`
//! variable matching the rest of the path. Matching prefers literals, never
//! backtracks, and ignores registration order; conflicting registrations are
//! rejected up front. Captured variables reach the handler through the
//! request's query string, and named patterns can be turned back into URLs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use segroute::{Method, Request, Response, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!     router.get("/", |_req| async { Response::new(StatusCode::Ok).body("home") });
//!     router.handle_named(
//!         Method::Get,
//!         "/users/:userID",
//!         "user",
//!         |req: Request| async move {
//!             let id = req.query_param(":userID").unwrap_or_default().to_owned();
//!             Response::new(StatusCode::Ok).body(id)
//!         },
//!     );
//!     router.get("/static/*filepath", |req: Request| async move {
//!         let file = req.query_param("*filepath").unwrap_or_default().to_owned();
//!         Response::new(StatusCode::Ok).body(file)
//!     });
//!
//!     println!("user 42 lives at {}", router.url("user", &["42"]));
//!     Server::bind("127.0.0.1:8080").await?.serve(router).await?;
//!     Ok(())
//! }
//! ```

pub mod http;
pub mod router;
pub mod server;

pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::{Lookup, RouteError, Router, strip_vars};
pub use server::{Server, ServerError};

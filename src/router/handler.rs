use std::any::Any;
use std::pin::Pin;
use std::sync::Arc;

use crate::http::{Request, Response};

/// The boxed future every handler resolves through.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Type-erased async request handler.
///
/// Stored behind an [`Arc`] so one handler can sit at several trie nodes and
/// be shared by every connection task. Build one from a closure with
/// [`into_handler`], or let the registration methods do it.
pub type Handler = Arc<dyn Fn(Request) -> BoxFuture + Send + Sync + 'static>;

/// Observer for panics raised while a request is being handled.
///
/// Receives a snapshot of the request (with captured variables already in its
/// query) and the panic payload, and produces the response to send instead.
pub type PanicHook = Arc<dyn Fn(&Request, Box<dyn Any + Send>) -> Response + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Implemented for every `Fn(Request) -> impl Future<Output = Response>` that
/// is `Send + Sync + 'static`.
pub trait IntoHandler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        Box::pin((self)(req))
    }
}

/// Erases a handler function into a [`Handler`].
pub fn into_handler(handler: impl IntoHandler) -> Handler {
    Arc::new(move |req| handler.call(req))
}

/// Renders a panic payload for logging.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

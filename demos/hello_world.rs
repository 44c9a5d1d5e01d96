//! Serves a handful of routes on 127.0.0.1:8080.
//!
//! ```text
//! RUST_LOG=segroute=debug cargo run --example hello_world
//! curl -i localhost:8080/users/1234/posts/123
//! curl -i -X DELETE localhost:8080/signin
//! ```

use segroute::router::strip_vars;
use segroute::{Request, Response, Router, Server, StatusCode};
use tracing_subscriber::EnvFilter;

async fn get_post(req: Request) -> Response {
    let user = req.query_param(":userID").unwrap_or_default();
    let post = req.query_param(":postID").unwrap_or_default();
    let original = strip_vars(req.query_string());
    Response::new(StatusCode::Ok).body(format!(
        "user {user}, post {post}, original query {original:?}\n"
    ))
}

async fn get_static(req: Request) -> Response {
    let file = req.query_param("*filepath").unwrap_or_default();
    Response::new(StatusCode::Ok).body(format!("static file {file}\n"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut router = Router::new();
    router
        .get("/", |_req| async { Response::new(StatusCode::Ok).body("home\n") })
        .get("/static/*filepath", get_static)
        .get("/signin", |_req| async { Response::new(StatusCode::Ok).body("sign in\n") })
        .post("/signin", |_req| async { Response::new(StatusCode::SeeOther) })
        .get_named("/users/:userID/posts/:postID", "post", get_post);

    router
        .not_found(|_req| async {
            Response::new(StatusCode::NotFound)
                .header("Content-Type", "application/json")
                .body(r#"{"error":404}"#)
        })
        .on_panic(|req, payload| {
            let msg = payload
                .downcast_ref::<&str>()
                .copied()
                .unwrap_or("unknown panic");
            tracing::error!(path = req.path(), panic = msg, "recovered");
            Response::new(StatusCode::InternalServerError).body("internal error\n")
        });

    let link = router.url("post", &["1234", "123"]);
    tracing::info!(%link, "try the named route");

    Server::bind("127.0.0.1:8080").await?.serve(router).await?;
    Ok(())
}

use bytes::Bytes;
use chainroute::{handlers, Flow, RequestContext, RequestInfo, RouteError, Router, Server};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Response, StatusCode};
use std::fmt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Define an app state to share it across the route handlers and middlewares.
#[derive(Clone)]
struct State {
    greeting: &'static str,
}

#[derive(Debug)]
struct Unauthorized;

impl fmt::Display for Unauthorized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("missing or invalid authorization header")
    }
}

impl std::error::Error for Unauthorized {}

fn text(body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::new(Full::new(body.into()))
}

// A middleware which logs an http request.
async fn logger(ctx: RequestContext<Incoming>) -> Result<Flow<Incoming>, RouteError> {
    tracing::info!(remote_addr = ?ctx.remote_addr(), method = %ctx.method(), url = %ctx.original_url(), "request");
    Ok(ctx.next())
}

async fn home_handler(ctx: RequestContext<Incoming>) -> Result<Flow<Incoming>, RouteError> {
    let greeting = ctx.data::<State>().map(|state| state.greeting).unwrap_or("Hello");
    let body = format!("{} from the home page", greeting);
    Ok(ctx.respond(text(body)))
}

async fn user_handler(ctx: RequestContext<Incoming>) -> Result<Flow<Incoming>, RouteError> {
    let body = format!("Hello {}", ctx.param("userId").unwrap_or("stranger"));
    Ok(ctx.respond(text(body)))
}

// Rejects the request unless it carries a bearer token.
async fn require_auth(ctx: RequestContext<Incoming>) -> Result<Flow<Incoming>, RouteError> {
    let authorized = ctx
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|val| val.to_str().ok())
        .map_or(false, |val| val.starts_with("Bearer "));

    if authorized {
        Ok(ctx.next())
    } else {
        Err(Unauthorized.into())
    }
}

async fn load_report(mut ctx: RequestContext<Incoming>) -> Result<Flow<Incoming>, RouteError> {
    let id = ctx.param("reportId").unwrap_or_default().to_owned();
    ctx.set_local(format!("report #{}", id));
    Ok(ctx.next())
}

async fn show_report(ctx: RequestContext<Incoming>) -> Result<Flow<Incoming>, RouteError> {
    let report = ctx.local::<String>().cloned().unwrap_or_default();
    let body = format!("{} (mounted at {})", report, ctx.base_url());
    Ok(ctx.respond(text(body)))
}

fn admin_router() -> chainroute::Result<Router<Incoming, RouteError>> {
    Router::builder()
        .data(State { greeting: "Welcome back" })
        .get("/", home_handler)
        .add("GET", "/reports/:reportId", handlers![load_report, show_report])
        .build()
}

async fn error_handler(err: RouteError, info: RequestInfo) -> Response<Full<Bytes>> {
    let status = if err.is::<Unauthorized>() {
        StatusCode::UNAUTHORIZED
    } else {
        tracing::error!(error = %err, uri = %info.uri(), "request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let mut res = text(format!("Something went wrong: {}", err));
    *res.status_mut() = status;
    res
}

fn router() -> chainroute::Result<Router<Incoming, RouteError>> {
    Router::builder()
        .data(State { greeting: "Hello" })
        .middleware(logger)
        .get("/", home_handler)
        .get("/users/:userId", user_handler)
        .mount("/admin", handlers![require_auth])
        .scope("/admin", admin_router()?)
        .err_handler_with_info(error_handler)
        .build()
}

#[tokio::main]
async fn main() -> chainroute::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "chainroute=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server = Server::bind("127.0.0.1:3000", router()?).await?;
    tracing::info!(address = %server.local_addr()?, "App is running");

    server
        .serve_with_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "couldn't listen for shutdown signal");
            }
        })
        .await
}

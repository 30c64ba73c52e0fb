//! `chainroute` is a small, composable HTTP router for [hyper](https://hyper.rs/) built around ordered handler chains.
//!
//! Its core features:
//!
//! - Middlewares and route handlers are the same thing: a function that takes the [`RequestContext`] and either passes
//!   it on, responds or fails.
//! - Routes are matched in registration order with `:param`, `:optional?` and `*wildcard` segments, or with a
//!   user-supplied [`Regex`](https://docs.rs/regex/1/regex/struct.Regex.html).
//! - Prefix-scoped middlewares and mountable sub-routers that see the path relative to their mount point.
//! - One error handler and one no-match handler for the whole tree. Panicking handlers are treated like failing ones.
//! - Route lookup without dispatch, through [`Router::find`].
//!
//! ## Basic Example
//!
//! ```no_run
//! use chainroute::{Flow, RequestContext, RequestInfo, RouteError, Router, Server};
//! use http_body_util::Full;
//! use hyper::body::{Bytes, Incoming};
//! use hyper::{Response, StatusCode};
//! use std::convert::Infallible;
//!
//! // Define an app state to share it across the route handlers and middlewares.
//! #[derive(Clone)]
//! struct State(u64);
//!
//! // A handler for "/" page.
//! async fn home_handler(ctx: RequestContext<Incoming>) -> Result<Flow<Incoming>, Infallible> {
//!     // Access the app state.
//!     let state = ctx.data::<State>().unwrap();
//!     println!("State value: {}", state.0);
//!
//!     Ok(ctx.respond(Response::new(Full::new(Bytes::from("Home page")))))
//! }
//!
//! // A handler for "/users/:userId" page.
//! async fn user_handler(ctx: RequestContext<Incoming>) -> Result<Flow<Incoming>, Infallible> {
//!     let body = format!("Hello {}", ctx.param("userId").unwrap());
//!     Ok(ctx.respond(Response::new(Full::new(Bytes::from(body)))))
//! }
//!
//! // A middleware which logs an http request and passes it on.
//! async fn logger(ctx: RequestContext<Incoming>) -> Result<Flow<Incoming>, Infallible> {
//!     println!("{:?} {} {}", ctx.remote_addr(), ctx.method(), ctx.path());
//!     Ok(ctx.next())
//! }
//!
//! // Define an error handler function which will accept the `RouteError`
//! // and the request information and generates an appropriate response.
//! async fn error_handler(err: RouteError, _: RequestInfo) -> Response<Full<Bytes>> {
//!     let mut res = Response::new(Full::new(Bytes::from(format!("Something went wrong: {}", err))));
//!     *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
//!     res
//! }
//!
//! // Create a `Router<Incoming, Infallible>` for request body type `hyper::body::Incoming`
//! // and for handler error type `Infallible`.
//! fn router() -> Router<Incoming, Infallible> {
//!     Router::builder()
//!         .data(State(100))
//!         .middleware(logger)
//!         .get("/", home_handler)
//!         .get("/users/:userId", user_handler)
//!         .err_handler_with_info(error_handler)
//!         .build()
//!         .unwrap()
//! }
//!
//! #[tokio::main]
//! async fn main() -> chainroute::Result<()> {
//!     Server::bind("127.0.0.1:3001", router()).await?.serve().await
//! }
//! ```
//!
//! ## Routing
//!
//! ### Route Handlers
//!
//! A handler receives the [`RequestContext`] and returns `Result<Flow<B>, E>`:
//!
//! - `Ok(ctx.next())` passes the request to the next handler;
//! - `Ok(ctx.respond(res))` ends the request with `res`;
//! - `Err(e)` aborts the request and hands `e` to the error handler.
//!
//! A route may run several handlers in a row, see [`RouterBuilder::add`] and the [`handlers!`] macro.
//!
//! ### Route Paths
//!
//! ```
//! # use chainroute::{Flow, RequestContext, Router};
//! # use std::convert::Infallible;
//! # async fn handler(ctx: RequestContext<()>) -> Result<Flow<()>, Infallible> { Ok(ctx.next()) }
//! # fn run() -> Router<(), Infallible> {
//! let router = Router::builder()
//!     // Literal paths. A trailing slash in the request is ignored.
//!     .get("/about", handler)
//!     // A named segment, available as `ctx.param("id")`.
//!     .get("/users/:id", handler)
//!     // An optional last segment: matches `/posts` and `/posts/7`.
//!     .get("/posts/:page?", handler)
//!     // The rest of the path, available as `ctx.param("path")`. `*` alone is named `wild`.
//!     .get("/static/*path", handler)
//!     // A regex with named groups.
//!     .get(regex::Regex::new(r"^/v(?P<version>\d+)/status$").unwrap(), handler)
//!     .build()
//!     .unwrap();
//! # router
//! # }
//! # run();
//! ```
//!
//! Lookup is first-match: a route registered earlier wins over a more specific one registered later.
//!
//! #### Handle 404 Pages
//!
//! Requests nobody answered go to the no-match handler, `404 Not Found` by default.
//!
//! ```
//! # use chainroute::{RequestInfo, Router};
//! # use http_body_util::Full;
//! # use hyper::{body::Bytes, Response, StatusCode};
//! # use std::convert::Infallible;
//! # fn run() -> Router<(), Infallible> {
//! let router = Router::builder()
//!     .no_match_handler(|info: RequestInfo| async move {
//!         let mut res = Response::new(Full::new(Bytes::from(format!("{} not here", info.uri().path()))));
//!         *res.status_mut() = StatusCode::NOT_FOUND;
//!         res
//!     })
//!     .build()
//!     .unwrap();
//! # router
//! # }
//! # run();
//! ```
//!
//! ### Scoping/Mounting Router
//!
//! [`RouterBuilder::scope`] mounts a sub-router at a prefix and [`RouterBuilder::mount`] runs middlewares only under
//! a prefix. Both see the path with the prefix stripped, and `:param` segments in the prefix are merged into the
//! route parameters.
//!
//! ```
//! # use chainroute::{Flow, RequestContext, Router};
//! # use http_body_util::Full;
//! # use hyper::{body::Bytes, Response};
//! # use std::convert::Infallible;
//! async fn show_post(ctx: RequestContext<()>) -> Result<Flow<()>, Infallible> {
//!     // `/users/7/posts/3` gives user 7 and post 3.
//!     let body = format!("{} {}", ctx.param("userId").unwrap(), ctx.param("postId").unwrap());
//!     Ok(ctx.respond(Response::new(Full::new(Bytes::from(body)))))
//! }
//!
//! # fn run() -> Router<(), Infallible> {
//! let posts = Router::builder().get("/posts/:postId", show_post).build().unwrap();
//! let router = Router::builder().scope("/users/:userId", posts).build().unwrap();
//! # router
//! # }
//! # run();
//! ```
//!
//! ## Data and State Sharing
//!
//! Values registered with [`RouterBuilder::data`] are readable from every handler through [`RequestContext::data`].
//! Values one handler wants to hand to a later one go through [`RequestContext::set_local`].
//!
//! ## Error Handling
//!
//! Any handler may fail with its error type `E`, and any panic inside a handler is turned into
//! [`Error::HandlerPanicked`]. Either way the rest of the chain is skipped and the root router's error handler answers
//! the request, `500 Internal Server Error` by default.
//!
//! ```
//! # use chainroute::{RouteError, Router};
//! # use http_body_util::Full;
//! # use hyper::{body::Bytes, Response, StatusCode};
//! async fn error_handler(err: RouteError) -> Response<Full<Bytes>> {
//!     let mut res = Response::new(Full::new(Bytes::from(format!("Something went wrong: {}", err))));
//!     *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
//!     res
//! }
//!
//! # fn run() -> Router<(), std::io::Error> {
//! let router = Router::builder().err_handler(error_handler).build().unwrap();
//! # router
//! # }
//! # run();
//! ```

pub use self::error::{Error, RouteError};
pub use self::middleware::{handler, BoxedHandler, Flow, Handler, HandlerReturn};
pub use self::regex_generator::Pattern;
pub use self::route::Route;
pub use self::router::{Found, Router, RouterBuilder};
pub use self::server::Server;
pub use self::service::{RequestService, RequestServiceBuilder, RouterService};
pub use self::types::{RequestContext, RequestInfo, RouteParams};

mod data_map;
mod error;
mod helpers;
mod middleware;
mod regex_generator;
mod route;
mod router;
mod server;
mod service;
mod types;

/// A Result type often returned from methods that can have `chainroute` errors.
pub type Result<T> = std::result::Result<T, RouteError>;

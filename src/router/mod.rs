use crate::data_map::{DataMap, SharedData};
use crate::helpers;
use crate::middleware::{self, BoxedHandler, ChainOutcome};
use crate::regex_generator::Matcher;
use crate::route::{Route, RouteTable};
use crate::types::{RequestContext, RequestInfo, RouteParams};
use crate::RouteError;
use futures::future::BoxFuture;
use http::{Method, Request};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;
use std::sync::Arc;

pub use self::builder::RouterBuilder;
pub(crate) use self::policy::Policy;

mod builder;
mod policy;

/// Represents a modular, lightweight and mountable router type.
///
/// A router consists of some global middlewares, prefix-scoped middlewares and sub-routers (mounts), routes and,
/// for the root router, an error handler and a no-match handler to handle the requests nobody answered.
///
/// Every request runs through the router the same way:
///
/// 1. the global middlewares, in registration order;
/// 2. every mount whose prefix matches the path, in registration order, with the prefix stripped from the path
///    the mount sees. A scoped router runs the same steps on the rebased path;
/// 3. the first route, in registration order, whose method and pattern accept the request.
///
/// The first handler that responds ends the request. A handler that fails sends its error to the error handler
/// and nothing else runs. If everything passes the request on, the no-match handler answers it.
///
/// This `Router<B, E>` type accepts two type parameters: `B` and `E`.
///
/// * The `B` represents the request body type the handlers receive, e.g. [`hyper::body::Incoming`](https://docs.rs/hyper/1/hyper/body/struct.Incoming.html)
///   when serving real connections.
/// * The `E` represents any error type which will be used by route handlers and the middlewares. This error type must
///   be convertible into a boxed [std::error::Error](https://doc.rust-lang.org/std/error/trait.Error.html).
///
/// A router is immutable once built. A sub-router is moved into its parent by [`scope`](./struct.RouterBuilder.html#method.scope),
/// so the same router can't be mounted twice.
///
/// # Examples
///
/// ```
/// use chainroute::{Flow, RequestContext, Router};
/// use http_body_util::Full;
/// use hyper::{body::Bytes, Response};
/// use std::convert::Infallible;
///
/// async fn home_handler(ctx: RequestContext<()>) -> Result<Flow<()>, Infallible> {
///     Ok(ctx.respond(Response::new(Full::new(Bytes::from("home")))))
/// }
///
/// fn run() -> Router<(), Infallible> {
///     let router = Router::builder().get("/", home_handler).build().unwrap();
///     router
/// }
/// # run();
/// ```
pub struct Router<B, E> {
    middlewares: Vec<BoxedHandler<B, E>>,
    mounts: Vec<Mount<B, E>>,
    table: RouteTable<B, E>,
    policy: Policy,
    data: Option<Arc<DataMap>>,
}

pub(crate) enum MountTarget<B, E> {
    Handlers(Vec<BoxedHandler<B, E>>),
    Router(Box<Router<B, E>>),
}

pub(crate) struct Mount<B, E> {
    matcher: Matcher,
    target: MountTarget<B, E>,
}

/// What a router did with a request it was given.
pub(crate) enum Dispatched<B> {
    Responded(Response<Full<Bytes>>),
    NotHandled(RequestContext<B>),
}

/// A route table hit, as returned by [`Router::find`](./struct.Router.html#method.find).
pub struct Found<'a, B, E> {
    /// Parameters captured by the route pattern.
    pub params: RouteParams,
    /// The route's handler chain, in registration order.
    pub handlers: &'a [BoxedHandler<B, E>],
}

impl<B, E> Debug for Found<'_, B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{ params: {:?}, handlers: {} }}", self.params, self.handlers.len())
    }
}

impl<B, E> Router<B, E> {
    pub(crate) fn new(
        middlewares: Vec<BoxedHandler<B, E>>,
        mounts: Vec<Mount<B, E>>,
        table: RouteTable<B, E>,
        policy: Policy,
        data: DataMap,
    ) -> Self {
        Router {
            middlewares,
            mounts,
            table,
            policy,
            data: if data.is_empty() { None } else { Some(Arc::new(data)) },
        }
    }

    /// Return a [RouterBuilder](./struct.RouterBuilder.html) instance to build a `Router`.
    pub fn builder() -> RouterBuilder<B, E> {
        RouterBuilder::new()
    }

    /// The routes registered directly on this router, in registration order.
    pub fn routes(&self) -> &[Route<B, E>] {
        self.table.routes()
    }

    /// Looks `method` and `path` up in this router's route table without running anything.
    ///
    /// Returns the same parameters and handler chain a dispatch would use once the request reaches the route table.
    /// Mounts are not consulted. The path is normalized like a request path, but not percent-decoded.
    ///
    /// # Examples
    ///
    /// ```
    /// use chainroute::{Flow, RequestContext, Router};
    /// use http::Method;
    /// use std::convert::Infallible;
    ///
    /// let router: Router<(), Infallible> = Router::builder()
    ///     .get("/users/:id", |ctx: RequestContext<()>| async move { Ok(ctx.next()) })
    ///     .build()
    ///     .unwrap();
    ///
    /// let found = router.find(&Method::GET, "/users/42").unwrap();
    /// assert_eq!(found.params.get("id").map(String::as_str), Some("42"));
    /// assert_eq!(found.handlers.len(), 1);
    /// assert!(router.find(&Method::GET, "/users/").is_none());
    /// ```
    pub fn find(&self, method: &Method, path: &str) -> Option<Found<'_, B, E>> {
        let path = helpers::normalize_path(path);
        self.table.lookup(method, &path).map(|(route, params)| Found {
            params,
            handlers: route.handlers(),
        })
    }
}

impl<B, E> Router<B, E>
where
    B: Send + 'static,
    E: Into<RouteError> + 'static,
{
    /// Runs a request through the router and returns the response to send.
    ///
    /// Handler failures never surface here: they go to the error handler. `Err` is only returned when the error
    /// handler itself fails, in which case the connection should be dropped.
    pub async fn dispatch(&self, req: Request<B>) -> crate::Result<Response<Full<Bytes>>> {
        self.dispatch_from(req, None).await
    }

    pub(crate) async fn dispatch_from(
        &self,
        req: Request<B>,
        remote_addr: Option<SocketAddr>,
    ) -> crate::Result<Response<Full<Bytes>>> {
        let mut shared = SharedData::default();
        if let Some(ref data) = self.data {
            shared.push(data.clone());
        }

        let req_info = RequestInfo::new_from_req(&req, remote_addr, shared.clone());

        let target_path = match helpers::percent_decode_request_path(req.uri().path()) {
            Ok(path) => helpers::normalize_path(&path),
            Err(err) => return self.policy.on_error(err, req_info).await,
        };

        tracing::debug!(method = %req.method(), path = %target_path, "dispatching request");

        let ctx = RequestContext::new(req, target_path, remote_addr, shared);

        match self.process(ctx).await {
            Ok(Dispatched::Responded(res)) => Ok(res),
            Ok(Dispatched::NotHandled(ctx)) => {
                tracing::debug!(method = %ctx.method(), path = %ctx.path(), "no route matched");
                drop(ctx);
                self.policy.on_no_match(req_info).await
            }
            Err(err) => self.policy.on_error(err, req_info).await,
        }
    }

    fn process(&self, ctx: RequestContext<B>) -> BoxFuture<'_, crate::Result<Dispatched<B>>> {
        Box::pin(async move {
            let mut ctx = match middleware::run(&self.middlewares, ctx).await {
                ChainOutcome::Completed(res) => return Ok(Dispatched::Responded(res)),
                ChainOutcome::Aborted(err) => return Err(err),
                ChainOutcome::Exhausted(ctx) => ctx,
            };

            for mount in self.mounts.iter() {
                let (consumed, params) = match mount.matcher.prefix_captures(ctx.path()) {
                    Some(hit) => hit,
                    None => continue,
                };

                tracing::trace!(prefix = %mount.matcher.source(), path = %ctx.path(), "entering mount");
                let state = ctx.enter_mount(consumed, params);

                let dispatched = match mount.target {
                    MountTarget::Handlers(ref handlers) => match middleware::run(handlers, ctx).await {
                        ChainOutcome::Completed(res) => Dispatched::Responded(res),
                        ChainOutcome::Exhausted(ctx) => Dispatched::NotHandled(ctx),
                        ChainOutcome::Aborted(err) => return Err(err),
                    },
                    MountTarget::Router(ref router) => {
                        if let Some(ref data) = router.data {
                            ctx.shared.push(data.clone());
                        }
                        router.process(ctx).await?
                    }
                };

                ctx = match dispatched {
                    Dispatched::Responded(res) => return Ok(Dispatched::Responded(res)),
                    Dispatched::NotHandled(mut ctx) => {
                        ctx.leave_mount(state);
                        ctx
                    }
                };
            }

            let method = ctx.method().clone();
            let (route, params) = match self.table.lookup(&method, ctx.path()) {
                Some(hit) => hit,
                None => return Ok(Dispatched::NotHandled(ctx)),
            };

            tracing::trace!(route = %route.path(), params = %params, "route matched");
            ctx.merge_params(params);

            match middleware::run(route.handlers(), ctx).await {
                ChainOutcome::Completed(res) => Ok(Dispatched::Responded(res)),
                ChainOutcome::Exhausted(ctx) => Ok(Dispatched::NotHandled(ctx)),
                ChainOutcome::Aborted(err) => Err(err),
            }
        })
    }
}

impl<B, E> Debug for Mount<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.target {
            MountTarget::Handlers(ref handlers) => {
                write!(f, "{{ prefix: {:?}, handlers: {} }}", self.matcher, handlers.len())
            }
            MountTarget::Router(ref router) => write!(f, "{{ prefix: {:?}, router: {:?} }}", self.matcher, router),
        }
    }
}

impl<B, E> Debug for Router<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ middlewares: {}, mounts: {:?}, routes: {:?} }}",
            self.middlewares.len(),
            self.mounts,
            self.table
        )
    }
}

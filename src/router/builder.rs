use super::policy::{ErrHandler, Policy, PolicyReturn};
use super::{Mount, MountTarget, Router};
use crate::data_map::DataMap;
use crate::middleware::{handler as handler_fn, BoxedHandler, Flow};
use crate::regex_generator::{generate_prefix_match_regex, Pattern};
use crate::route::RouteTable;
use crate::types::{RequestContext, RequestInfo};
use crate::{Error, RouteError};
use http::Method;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;

/// Builder for the [Router](./struct.Router.html) type.
///
/// This `RouterBuilder<B, E>` type accepts two type parameters: `B` and `E`.
///
/// * The `B` represents the request body type the handlers receive.
/// * The `E` represents any error type which will be used by route handlers and the middlewares. This error type must
///   be convertible into a boxed [std::error::Error](https://doc.rust-lang.org/std/error/trait.Error.html).
///
/// A registration that fails, e.g. because of a malformed route pattern, is skipped and its error is logged and kept.
/// Everything registered before and after it still takes effect. [`build`](#method.build) returns the first kept
/// error, while [`build_skipping_invalid`](#method.build_skipping_invalid) builds the router from the valid entries
/// and hands the errors back.
///
/// # Examples
///
/// ```
/// use chainroute::{Flow, RequestContext, Router, RouterBuilder};
/// use http_body_util::Full;
/// use hyper::{body::Bytes, Response};
///
/// async fn file_download_handler(ctx: RequestContext<()>) -> Result<Flow<()>, hyper::Error> {
///     Ok(ctx.respond(Response::new(Full::new(Bytes::from("file")))))
/// }
///
/// fn run() -> Router<(), hyper::Error> {
///     let router = Router::builder()
///         // Specify the handlers.
///         .get("/file/*", file_download_handler)
///         // Create the `Router` instance.
///         .build()
///         .unwrap();
///     router
/// }
/// # run();
/// ```
pub struct RouterBuilder<B, E> {
    inner: BuilderInner<B, E>,
    errors: Vec<RouteError>,
}

struct BuilderInner<B, E> {
    middlewares: Vec<BoxedHandler<B, E>>,
    mounts: Vec<Mount<B, E>>,
    table: RouteTable<B, E>,
    policy: Policy,
    data: DataMap,
}

impl<B, E> RouterBuilder<B, E> {
    /// Creates a new RouterBuilder instance with default options.
    pub fn new() -> RouterBuilder<B, E> {
        RouterBuilder::default()
    }

    /// Creates a new [Router](./struct.Router.html) instance from the added configuration.
    ///
    /// Fails with the first registration error, if any registration failed.
    pub fn build(self) -> crate::Result<Router<B, E>> {
        let (router, errors) = self.build_skipping_invalid();
        match errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(router),
        }
    }

    /// Creates a new [Router](./struct.Router.html) instance from the registrations that succeeded, along with the
    /// errors of those that didn't, in registration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use chainroute::{Flow, RequestContext, Router};
    /// use hyper::Method;
    /// use std::convert::Infallible;
    ///
    /// async fn ok(ctx: RequestContext<()>) -> Result<Flow<()>, Infallible> {
    ///     Ok(ctx.next())
    /// }
    ///
    /// let (router, errors) = Router::<(), Infallible>::builder()
    ///     .get("/ok", ok)
    ///     .get("/bad/:id/:id", ok)
    ///     .build_skipping_invalid();
    ///
    /// assert_eq!(errors.len(), 1);
    /// assert!(router.find(&Method::GET, "/ok").is_some());
    /// ```
    pub fn build_skipping_invalid(self) -> (Router<B, E>, Vec<RouteError>) {
        let inner = self.inner;
        let router = Router::new(inner.middlewares, inner.mounts, inner.table, inner.policy, inner.data);
        (router, self.errors)
    }

    /// The errors of the registrations that failed so far.
    pub fn errors(&self) -> &[RouteError] {
        &self.errors
    }

    fn register<F>(mut self, func: F) -> Self
    where
        F: FnOnce(&mut BuilderInner<B, E>) -> crate::Result<()>,
    {
        if let Err(err) = func(&mut self.inner) {
            tracing::error!(error = %err, "registration failed");
            self.errors.push(err);
        }
        self
    }
}

impl<B, E> RouterBuilder<B, E>
where
    B: Send + 'static,
    E: Into<RouteError> + 'static,
{
    /// Adds a new route with `GET` method and the handler at the specified path.
    ///
    /// # Examples
    ///
    /// ```
    /// use chainroute::{Flow, RequestContext, Router};
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Response};
    /// use std::convert::Infallible;
    ///
    /// fn run() -> Router<(), Infallible> {
    ///     let router = Router::builder()
    ///         .get("/", |ctx: RequestContext<()>| async move {
    ///             Ok(ctx.respond(Response::new(Full::new(Bytes::from("Hello world!")))))
    ///         })
    ///         .build()
    ///         .unwrap();
    ///     router
    /// }
    /// # run();
    /// ```
    pub fn get<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<Pattern>,
        H: Fn(RequestContext<B>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Flow<B>, E>> + Send + 'static,
    {
        self.add_route(Some(Method::GET), path, vec![handler_fn(handler)])
    }

    /// Adds a new route with `POST` method and the handler at the specified path.
    pub fn post<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<Pattern>,
        H: Fn(RequestContext<B>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Flow<B>, E>> + Send + 'static,
    {
        self.add_route(Some(Method::POST), path, vec![handler_fn(handler)])
    }

    /// Adds a new route with `PUT` method and the handler at the specified path.
    pub fn put<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<Pattern>,
        H: Fn(RequestContext<B>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Flow<B>, E>> + Send + 'static,
    {
        self.add_route(Some(Method::PUT), path, vec![handler_fn(handler)])
    }

    /// Adds a new route with `DELETE` method and the handler at the specified path.
    pub fn delete<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<Pattern>,
        H: Fn(RequestContext<B>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Flow<B>, E>> + Send + 'static,
    {
        self.add_route(Some(Method::DELETE), path, vec![handler_fn(handler)])
    }

    /// Adds a new route with `PATCH` method and the handler at the specified path.
    pub fn patch<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<Pattern>,
        H: Fn(RequestContext<B>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Flow<B>, E>> + Send + 'static,
    {
        self.add_route(Some(Method::PATCH), path, vec![handler_fn(handler)])
    }

    /// Adds a new route with `HEAD` method and the handler at the specified path.
    ///
    /// Without an explicit `HEAD` route, `HEAD` requests are answered by the matching `GET` route
    /// unless [`head_fallback`](#method.head_fallback) is turned off.
    pub fn head<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<Pattern>,
        H: Fn(RequestContext<B>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Flow<B>, E>> + Send + 'static,
    {
        self.add_route(Some(Method::HEAD), path, vec![handler_fn(handler)])
    }

    /// Adds a new route with `OPTIONS` method and the handler at the specified path.
    pub fn options<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<Pattern>,
        H: Fn(RequestContext<B>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Flow<B>, E>> + Send + 'static,
    {
        self.add_route(Some(Method::OPTIONS), path, vec![handler_fn(handler)])
    }

    /// Adds a new route which answers every method at the specified path.
    ///
    /// It takes part in first-match lookup like any other route, so register it after the more specific ones.
    ///
    /// # Examples
    ///
    /// ```
    /// use chainroute::{Flow, RequestContext, Router};
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Response, StatusCode};
    /// use std::convert::Infallible;
    ///
    /// fn run() -> Router<(), Infallible> {
    ///     let router = Router::builder()
    ///         .get("/users", |ctx: RequestContext<()>| async move {
    ///             Ok(ctx.respond(Response::new(Full::new(Bytes::from("User List")))))
    ///         })
    ///         .all("/*", |ctx: RequestContext<()>| async move {
    ///             let mut res = Response::new(Full::new(Bytes::from("NOT FOUND")));
    ///             *res.status_mut() = StatusCode::NOT_FOUND;
    ///             Ok(ctx.respond(res))
    ///         })
    ///         .build()
    ///         .unwrap();
    ///     router
    /// }
    /// # run();
    /// ```
    pub fn all<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<Pattern>,
        H: Fn(RequestContext<B>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Flow<B>, E>> + Send + 'static,
    {
        self.add_route(None, path, vec![handler_fn(handler)])
    }

    /// Adds a route for `method` at `path` that runs a chain of handlers in order.
    ///
    /// `method` must be an uppercase HTTP method name such as `"GET"` or `"PURGE"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chainroute::{handlers, Flow, RequestContext, Router};
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Response};
    /// use std::convert::Infallible;
    ///
    /// async fn log(ctx: RequestContext<()>) -> Result<Flow<()>, Infallible> {
    ///     println!("{} {}", ctx.method(), ctx.path());
    ///     Ok(ctx.next())
    /// }
    ///
    /// async fn update(ctx: RequestContext<()>) -> Result<Flow<()>, Infallible> {
    ///     Ok(ctx.respond(Response::new(Full::new(Bytes::from("updated")))))
    /// }
    ///
    /// let router: Router<(), Infallible> = Router::builder().add("PUT", "/c", handlers![log, update]).build().unwrap();
    /// assert!(Router::<(), Infallible>::builder().add("put", "/c", handlers![update]).build().is_err());
    /// ```
    pub fn add<P>(self, method: &str, path: P, handlers: Vec<BoxedHandler<B, E>>) -> Self
    where
        P: Into<Pattern>,
    {
        match parse_method(method) {
            Ok(method) => self.add_route(Some(method), path, handlers),
            Err(err) => self.register(move |_| Err(err)),
        }
    }

    fn add_route<P: Into<Pattern>>(self, method: Option<Method>, path: P, handlers: Vec<BoxedHandler<B, E>>) -> Self {
        let pattern = path.into();
        self.register(move |inner| inner.table.register(method, &pattern, handlers))
    }

    /// Adds a global middleware. It runs for every request, before any mount or route, in registration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use chainroute::{RequestContext, Router};
    /// use std::convert::Infallible;
    ///
    /// fn run() -> Router<(), Infallible> {
    ///     let router = Router::builder()
    ///         .middleware(|ctx: RequestContext<()>| async move {
    ///             println!("{} {}", ctx.method(), ctx.original_url());
    ///             Ok(ctx.next())
    ///         })
    ///         .build()
    ///         .unwrap();
    ///     router
    /// }
    /// # run();
    /// ```
    pub fn middleware<H, R>(self, handler: H) -> Self
    where
        H: Fn(RequestContext<B>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Flow<B>, E>> + Send + 'static,
    {
        self.middlewares(vec![handler_fn(handler)])
    }

    /// Adds already boxed global middlewares, in order.
    pub fn middlewares(self, handlers: Vec<BoxedHandler<B, E>>) -> Self {
        self.register(move |inner| {
            inner.middlewares.extend(handlers);
            Ok(())
        })
    }

    /// Adds middlewares that only run when the request path starts with `prefix`.
    ///
    /// The prefix matches whole segments: `/admin` matches `/admin` and `/admin/users` but not `/administrator`.
    /// While they run the prefix is stripped from [`RequestContext::path`](./struct.RequestContext.html#method.path),
    /// and `:name` segments in the prefix are added to the route parameters. If they all pass the request on,
    /// the router carries on with the next mount and then the routes, with the original path.
    pub fn mount<P>(self, prefix: P, handlers: Vec<BoxedHandler<B, E>>) -> Self
    where
        P: Into<Pattern>,
    {
        let prefix = prefix.into();
        self.register(move |inner| {
            let matcher = generate_prefix_match_regex(&prefix)?;
            inner.mounts.push(Mount {
                matcher,
                target: MountTarget::Handlers(handlers),
            });
            Ok(())
        })
    }

    /// Mounts a sub-router at `prefix`.
    ///
    /// Requests whose path starts with `prefix` go through the sub-router with the prefix stripped; parameters
    /// captured by the prefix and by the sub-router's routes are merged into the same map. If the sub-router
    /// doesn't answer, the parent carries on. The sub-router's own error and no-match handlers are not used;
    /// the root router's handle everything.
    ///
    /// # Examples
    ///
    /// ```
    /// use chainroute::{Flow, RequestContext, Router};
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Response};
    /// use std::convert::Infallible;
    ///
    /// fn api_router() -> Router<(), Infallible> {
    ///     Router::builder()
    ///         .get("/books", |ctx: RequestContext<()>| async move {
    ///             Ok(ctx.respond(Response::new(Full::new(Bytes::from("List of books")))))
    ///         })
    ///         .get("/books/:bookId", |ctx: RequestContext<()>| async move {
    ///             let body = format!("Show book: {}", ctx.param("bookId").unwrap());
    ///             Ok(ctx.respond(Response::new(Full::new(Bytes::from(body)))))
    ///         })
    ///         .build()
    ///         .unwrap()
    /// }
    ///
    /// fn run() -> Router<(), Infallible> {
    ///     let router = Router::builder()
    ///         // Mounts the API router at "/api" path .
    ///         .scope("/api", api_router())
    ///         .build()
    ///         .unwrap();
    ///     router
    /// }
    /// # run();
    /// ```
    pub fn scope<P>(self, prefix: P, router: Router<B, E>) -> Self
    where
        P: Into<Pattern>,
    {
        let prefix = prefix.into();
        self.register(move |inner| {
            let matcher = generate_prefix_match_regex(&prefix)?;
            if router.policy.has_custom_handlers() {
                tracing::debug!(prefix = %prefix.as_str(), "scoped router's error and no-match handlers will be ignored");
            }
            inner.mounts.push(Mount {
                matcher,
                target: MountTarget::Router(Box::new(router)),
            });
            Ok(())
        })
    }

    /// Shares `data` with every handler of this router and of its sub-routers, through
    /// [`RequestContext::data`](./struct.RequestContext.html#method.data). A sub-router's data shadows the same
    /// type in its parents. Only one value per type is kept.
    pub fn data<T: Clone + Send + Sync + 'static>(self, data: T) -> Self {
        self.register(move |inner| {
            inner.data.insert(data);
            Ok(())
        })
    }

    /// Controls whether `HEAD` requests without a matching `HEAD` route are answered by the `GET` route. On by default.
    pub fn head_fallback(self, enabled: bool) -> Self {
        self.register(move |inner| {
            inner.table.set_head_fallback(enabled);
            Ok(())
        })
    }

    /// Adds a handler to handle any error raised by the routes or any middlewares.
    ///
    /// Without one, a failed request is answered with `500 Internal Server Error`.
    pub fn err_handler<H, R>(self, handler: H) -> Self
    where
        H: Fn(RouteError) -> R + Send + Sync + 'static,
        R: Future<Output = Response<Full<Bytes>>> + Send + 'static,
    {
        let handler = ErrHandler::WithoutInfo(Box::new(move |err: RouteError| -> PolicyReturn {
            Box::pin(handler(err))
        }));
        self.register(move |inner| {
            inner.policy.err_handler = Some(handler);
            Ok(())
        })
    }

    /// Adds a handler to handle any error raised by the routes or any middlewares, with access to the request info.
    pub fn err_handler_with_info<H, R>(self, handler: H) -> Self
    where
        H: Fn(RouteError, RequestInfo) -> R + Send + Sync + 'static,
        R: Future<Output = Response<Full<Bytes>>> + Send + 'static,
    {
        let handler = ErrHandler::WithInfo(Box::new(move |err: RouteError, req_info: RequestInfo| -> PolicyReturn {
            Box::pin(handler(err, req_info))
        }));
        self.register(move |inner| {
            inner.policy.err_handler = Some(handler);
            Ok(())
        })
    }

    /// Adds a handler for requests that no middleware or route answered.
    ///
    /// Without one, such requests get `404 Not Found`.
    pub fn no_match_handler<H, R>(self, handler: H) -> Self
    where
        H: Fn(RequestInfo) -> R + Send + Sync + 'static,
        R: Future<Output = Response<Full<Bytes>>> + Send + 'static,
    {
        self.register(move |inner| {
            inner.policy.no_match_handler = Some(Box::new(move |req_info: RequestInfo| -> PolicyReturn {
                Box::pin(handler(req_info))
            }));
            Ok(())
        })
    }
}

fn parse_method(method: &str) -> crate::Result<Method> {
    if method.is_empty() || method.bytes().any(|b| b.is_ascii_lowercase()) {
        return Err(Error::InvalidMethod(method.to_owned()).into());
    }

    Method::from_bytes(method.as_bytes()).map_err(|_| Error::InvalidMethod(method.to_owned()).into())
}

impl<B, E> Default for RouterBuilder<B, E> {
    fn default() -> RouterBuilder<B, E> {
        RouterBuilder {
            inner: BuilderInner {
                middlewares: Vec::new(),
                mounts: Vec::new(),
                table: RouteTable::new(),
                policy: Policy::default(),
                data: DataMap::new(),
            },
            errors: Vec::new(),
        }
    }
}

impl<B, E> Debug for RouterBuilder<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ middlewares: {}, mounts: {:?}, routes: {:?}, errors: {} }}",
            self.inner.middlewares.len(),
            self.inner.mounts,
            self.inner.table,
            self.errors.len()
        )
    }
}

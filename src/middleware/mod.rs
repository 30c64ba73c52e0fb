use crate::types::RequestContext;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub(crate) use self::chain::{run, ChainOutcome};

mod chain;

/// The future a [`Handler`] returns.
pub type HandlerReturn<B, E> = Pin<Box<dyn Future<Output = Result<Flow<B>, E>> + Send + 'static>>;

/// A shareable, type-erased handler as stored in route and middleware chains.
pub type BoxedHandler<B, E> = Arc<dyn Handler<B, E>>;

/// What a handler decided to do with the request.
///
/// Returning `Ok(Flow::Next(ctx))` hands the request to the next handler in the chain,
/// `Ok(Flow::Respond(res))` ends the chain with a response and `Err(e)` aborts the chain
/// and sends `e` to the error handler. No later handler runs after `Respond` or `Err`.
pub enum Flow<B> {
    /// Continue with the next handler.
    Next(RequestContext<B>),

    /// Stop and send this response.
    Respond(Response<Full<Bytes>>),
}

impl<B> Flow<B> {
    /// Shorthand for `Flow::Respond`.
    pub fn respond(res: Response<Full<Bytes>>) -> Flow<B> {
        Flow::Respond(res)
    }
}

impl<B> Debug for Flow<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Next(ctx) => f.debug_tuple("Next").field(ctx).finish(),
            Flow::Respond(res) => f.debug_tuple("Respond").field(&res.status()).finish(),
        }
    }
}

/// A route handler or middleware.
///
/// Both are the same thing here: something that takes the [`RequestContext`] and either passes it on,
/// responds, or fails. Any `Fn(RequestContext<B>) -> impl Future<Output = Result<Flow<B>, E>>` is a handler;
/// types that need their own state can implement the trait directly.
///
/// The chain doesn't advance until the returned future resolves, so a handler may await anything
/// before deciding. A future that never resolves stalls its request; timeouts are up to the transport.
///
/// # Examples
///
/// ```
/// use chainroute::{BoxedHandler, Flow, Handler, HandlerReturn, RequestContext, Router};
/// use std::sync::Arc;
///
/// struct RequireHeader(&'static str);
///
/// impl<B: Send + 'static> Handler<B, String> for RequireHeader {
///     fn invoke(&self, ctx: RequestContext<B>) -> HandlerReturn<B, String> {
///         let name = self.0;
///         Box::pin(async move {
///             if ctx.headers().contains_key(name) {
///                 Ok(ctx.next())
///             } else {
///                 Err(format!("missing header {}", name))
///             }
///         })
///     }
/// }
///
/// let auth: BoxedHandler<(), String> = Arc::new(RequireHeader("authorization"));
/// let router: Router<(), String> = Router::builder().mount("/admin", vec![auth]).build().unwrap();
/// ```
pub trait Handler<B, E>: Send + Sync + 'static {
    fn invoke(&self, ctx: RequestContext<B>) -> HandlerReturn<B, E>;
}

impl<B, E, H, R> Handler<B, E> for H
where
    H: Fn(RequestContext<B>) -> R + Send + Sync + 'static,
    R: Future<Output = Result<Flow<B>, E>> + Send + 'static,
{
    fn invoke(&self, ctx: RequestContext<B>) -> HandlerReturn<B, E> {
        Box::pin(self(ctx))
    }
}

/// Boxes a handler function or closure so it can go into a multi-handler chain.
///
/// See also the [`handlers!`](./macro.handlers.html) macro.
pub fn handler<B, E, H, R>(handler: H) -> BoxedHandler<B, E>
where
    H: Fn(RequestContext<B>) -> R + Send + Sync + 'static,
    R: Future<Output = Result<Flow<B>, E>> + Send + 'static,
{
    Arc::new(handler)
}

/// Builds a `Vec` of boxed handlers from handler functions or closures, in order.
///
/// # Examples
///
/// ```
/// use chainroute::{handlers, RequestContext, Flow, Router};
/// use std::convert::Infallible;
///
/// async fn load_user(mut ctx: RequestContext<()>) -> Result<Flow<()>, Infallible> {
///     let id = ctx.param("id").unwrap_or_default().to_owned();
///     ctx.set_local(id);
///     Ok(ctx.next())
/// }
///
/// async fn show_user(ctx: RequestContext<()>) -> Result<Flow<()>, Infallible> {
///     let id = ctx.local::<String>().cloned().unwrap_or_default();
///     Ok(Flow::respond(hyper::Response::new(id.into())))
/// }
///
/// let router: Router<(), Infallible> = Router::builder()
///     .add("GET", "/users/:id", handlers![load_user, show_user])
///     .build()
///     .unwrap();
/// ```
#[macro_export]
macro_rules! handlers {
    ($($h:expr),+ $(,)?) => {
        vec![$($crate::handler($h)),+]
    };
}

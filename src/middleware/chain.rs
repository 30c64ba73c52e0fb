use super::{BoxedHandler, Flow, Handler};
use crate::helpers;
use crate::types::RequestContext;
use crate::{Error, RouteError};
use futures::FutureExt;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::panic::{self, AssertUnwindSafe};

/// How a chain run ended.
pub(crate) enum ChainOutcome<B> {
    /// A handler responded.
    Completed(Response<Full<Bytes>>),
    /// Every handler passed the request on and none responded.
    Exhausted(RequestContext<B>),
    /// A handler failed or panicked. Nothing after it ran.
    Aborted(RouteError),
}

/// Runs `handlers` one at a time, in order, threading the context through them.
///
/// Dropping the returned future cancels the run; no further handler is invoked.
pub(crate) async fn run<B, E>(handlers: &[BoxedHandler<B, E>], mut ctx: RequestContext<B>) -> ChainOutcome<B>
where
    B: Send + 'static,
    E: Into<RouteError> + 'static,
{
    for (idx, handler) in handlers.iter().enumerate() {
        match invoke(handler.as_ref(), ctx).await {
            Ok(Flow::Next(next)) => ctx = next,
            Ok(Flow::Respond(res)) => {
                tracing::trace!(index = idx, status = %res.status(), "handler responded");
                return ChainOutcome::Completed(res);
            }
            Err(err) => {
                tracing::warn!(index = idx, error = %err, "handler aborted the chain");
                return ChainOutcome::Aborted(err);
            }
        }
    }

    ChainOutcome::Exhausted(ctx)
}

async fn invoke<B, E>(handler: &dyn Handler<B, E>, ctx: RequestContext<B>) -> crate::Result<Flow<B>>
where
    B: Send + 'static,
    E: Into<RouteError> + 'static,
{
    // A panic while building the future counts the same as one while polling it.
    let fut = match panic::catch_unwind(AssertUnwindSafe(move || handler.invoke(ctx))) {
        Ok(fut) => fut,
        Err(payload) => return Err(Error::HandlerPanicked(helpers::panic_message(payload)).into()),
    };

    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res.map_err(Into::into),
        Err(payload) => Err(Error::HandlerPanicked(helpers::panic_message(payload)).into()),
    }
}

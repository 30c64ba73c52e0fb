use crate::helpers;
use crate::types::RequestInfo;
use crate::{Error, RouteError};
use futures::FutureExt;
use http::header::{self, HeaderValue};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;

pub(crate) type PolicyReturn = Pin<Box<dyn Future<Output = Response<Full<Bytes>>> + Send + 'static>>;

pub(crate) type ErrHandlerWithoutInfo = Box<dyn Fn(RouteError) -> PolicyReturn + Send + Sync + 'static>;
pub(crate) type ErrHandlerWithInfo = Box<dyn Fn(RouteError, RequestInfo) -> PolicyReturn + Send + Sync + 'static>;
pub(crate) type NoMatchHandler = Box<dyn Fn(RequestInfo) -> PolicyReturn + Send + Sync + 'static>;

pub(crate) enum ErrHandler {
    WithoutInfo(ErrHandlerWithoutInfo),
    WithInfo(ErrHandlerWithInfo),
}

/// What the root router does with requests nobody answered and with chains that failed.
#[derive(Default)]
pub(crate) struct Policy {
    pub(crate) err_handler: Option<ErrHandler>,
    pub(crate) no_match_handler: Option<NoMatchHandler>,
}

impl Policy {
    pub(crate) fn has_custom_handlers(&self) -> bool {
        self.err_handler.is_some() || self.no_match_handler.is_some()
    }

    /// Runs the no-match handler. A panic in it is handed to the error handler like any handler failure.
    pub(crate) async fn on_no_match(&self, req_info: RequestInfo) -> crate::Result<Response<Full<Bytes>>> {
        let handler = match self.no_match_handler {
            Some(ref handler) => handler,
            None => return Ok(plain_response(StatusCode::NOT_FOUND)),
        };

        let outcome = AssertUnwindSafe(async { handler(req_info.clone()).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(res) => Ok(res),
            Err(payload) => {
                let err = Error::HandlerPanicked(helpers::panic_message(payload));
                self.on_error(err.into(), req_info).await
            }
        }
    }

    /// Runs the error handler. If it panics the request can't be answered and the error goes back to the transport.
    pub(crate) async fn on_error(&self, err: RouteError, req_info: RequestInfo) -> crate::Result<Response<Full<Bytes>>> {
        let handler = match self.err_handler {
            Some(ref handler) => handler,
            None => {
                tracing::debug!(error = %err, "responding with the default error response");
                return Ok(plain_response(StatusCode::INTERNAL_SERVER_ERROR));
            }
        };

        let outcome = AssertUnwindSafe(async move {
            match handler {
                ErrHandler::WithoutInfo(handler) => handler(err).await,
                ErrHandler::WithInfo(handler) => handler(err, req_info).await,
            }
        })
        .catch_unwind()
        .await;

        outcome.map_err(|payload| {
            let msg = helpers::panic_message(payload);
            tracing::error!(panic = %msg, "error handler failed");
            Error::ErrorPolicyFailed(msg).into()
        })
    }
}

fn plain_response(status: StatusCode) -> Response<Full<Bytes>> {
    let reason = status.canonical_reason().unwrap_or("");
    let mut res = Response::new(Full::new(Bytes::from(reason)));
    *res.status_mut() = status;
    res.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_map::SharedData;
    use http::Request;
    use http_body_util::BodyExt;

    fn info() -> RequestInfo {
        let req = Request::builder().uri("/missing").body(()).unwrap();
        RequestInfo::new_from_req(&req, None, SharedData::default())
    }

    async fn text(res: Response<Full<Bytes>>) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn should_default_to_not_found_and_internal_error() {
        let policy = Policy::default();

        let res = policy.on_no_match(info()).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(text(res).await, "Not Found");

        let res = policy.on_error("boom".into(), info()).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text(res).await, "Internal Server Error");
    }

    async fn broken_handler() -> Response<Full<Bytes>> {
        panic!("broken")
    }

    async fn lost_handler() -> Response<Full<Bytes>> {
        panic!("lost")
    }

    #[tokio::test]
    async fn should_fail_request_when_error_handler_panics() {
        let policy = Policy {
            err_handler: Some(ErrHandler::WithoutInfo(Box::new(|_: RouteError| Box::pin(broken_handler()) as PolicyReturn))),
            no_match_handler: None,
        };

        let err = policy.on_error("boom".into(), info()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::ErrorPolicyFailed(_))));
    }

    #[tokio::test]
    async fn should_route_no_match_panics_to_error_handler() {
        let policy = Policy {
            err_handler: Some(ErrHandler::WithoutInfo(Box::new(|err: RouteError| {
                Box::pin(async move { Response::new(Full::new(Bytes::from(err.to_string()))) }) as PolicyReturn
            }))),
            no_match_handler: Some(Box::new(|_: RequestInfo| Box::pin(lost_handler()) as PolicyReturn)),
        };

        let res = policy.on_no_match(info()).await.unwrap();
        assert_eq!(text(res).await, "handler panicked: lost");
    }
}

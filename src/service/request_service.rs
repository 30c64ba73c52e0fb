use crate::router::Router;
use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{service::Service, Request, Response};
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

/// A per-connection [`Service`](https://docs.rs/hyper/1/hyper/service/trait.Service.html) that runs every request
/// of that connection through the router.
///
/// It's created by [`RouterService`](./struct.RouterService.html) or [`RequestServiceBuilder`](./struct.RequestServiceBuilder.html)
/// and remembers the peer address, so handlers can read it from
/// [`RequestContext::remote_addr`](./struct.RequestContext.html#method.remote_addr).
pub struct RequestService<B, E> {
    pub(crate) router: Arc<Router<B, E>>,
    pub(crate) remote_addr: Option<SocketAddr>,
}

impl<B, E> Service<Request<B>> for RequestService<B, E>
where
    B: Send + 'static,
    E: Into<RouteError> + 'static,
{
    type Response = Response<Full<Bytes>>;
    type Error = RouteError;
    #[allow(clippy::type_complexity)]
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let router = self.router.clone();
        let remote_addr = self.remote_addr;

        Box::pin(async move { router.dispatch_from(req, remote_addr).await })
    }
}

impl<B, E> Clone for RequestService<B, E> {
    fn clone(&self) -> Self {
        RequestService {
            router: self.router.clone(),
            remote_addr: self.remote_addr,
        }
    }
}

impl<B, E> Debug for RequestService<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{ remote_addr: {:?}, router: {:?} }}", self.remote_addr, self.router)
    }
}

/// Shares one built router between any number of [`RequestService`](./struct.RequestService.html)s.
pub struct RequestServiceBuilder<B, E> {
    router: Arc<Router<B, E>>,
}

impl<B, E> RequestServiceBuilder<B, E> {
    pub fn new(router: Router<B, E>) -> Self {
        RequestServiceBuilder {
            router: Arc::new(router),
        }
    }

    /// Creates the service for one connection. `remote_addr` is `None` when the peer address is unknown.
    pub fn build(&self, remote_addr: Option<SocketAddr>) -> RequestService<B, E> {
        RequestService {
            router: self.router.clone(),
            remote_addr,
        }
    }
}

impl<B, E> Debug for RequestServiceBuilder<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{ router: {:?} }}", self.router)
    }
}

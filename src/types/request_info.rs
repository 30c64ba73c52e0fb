use crate::data_map::SharedData;
use http::{HeaderMap, Method, Request, Uri, Version};
use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;
use std::sync::Arc;

/// Represents some information for the incoming request.
///
/// It's used to access request information e.g. headers, method, uri etc. in the error handler and the no-match handler,
/// where the request itself has already been consumed by the chain.
#[derive(Clone)]
pub struct RequestInfo {
    inner: Arc<RequestInfoInner>,
}

struct RequestInfoInner {
    headers: HeaderMap,
    method: Method,
    uri: Uri,
    version: Version,
    remote_addr: Option<SocketAddr>,
    shared: SharedData,
}

impl RequestInfo {
    pub(crate) fn new_from_req<B>(req: &Request<B>, remote_addr: Option<SocketAddr>, shared: SharedData) -> Self {
        let inner = RequestInfoInner {
            headers: req.headers().clone(),
            method: req.method().clone(),
            uri: req.uri().clone(),
            version: req.version(),
            remote_addr,
            shared,
        };

        RequestInfo { inner: Arc::new(inner) }
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Returns the request method type.
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// Returns the request uri.
    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version
    }

    /// Returns the peer address when the request came in through a [`RouterService`](./struct.RouterService.html).
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.inner.remote_addr
    }

    /// Access data which was shared by the root router via `RouterBuilder::data`.
    pub fn data<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.inner.shared.get::<T>()
    }
}

impl Debug for RequestInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestInfo")
            .field("method", &self.inner.method)
            .field("uri", &self.inner.uri)
            .field("version", &self.inner.version)
            .field("headers", &self.inner.headers)
            .finish()
    }
}

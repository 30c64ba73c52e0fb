use crate::data_map::SharedData;
use crate::helpers;
use crate::middleware::Flow;
use crate::types::RouteParams;
use http::{Extensions, HeaderMap, Method, Request, Uri};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;

/// The per-request state handed from one handler to the next.
///
/// It owns the incoming [`Request`] and everything the router learned about it while matching: the route parameters,
/// the path still left to match below the current mount, the raw query string and the shared router data.
/// Handlers pass it along by returning [`ctx.next()`](#method.next), or finish the chain with [`respond`](#method.respond).
pub struct RequestContext<B> {
    req: Request<B>,
    original_url: String,
    path: String,
    base_url: String,
    params: RouteParams,
    search: Option<String>,
    remote_addr: Option<SocketAddr>,
    pub(crate) shared: SharedData,
}

impl<B> RequestContext<B> {
    pub(crate) fn new(req: Request<B>, path: String, remote_addr: Option<SocketAddr>, shared: SharedData) -> Self {
        let original_url = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| req.uri().path().to_owned());
        let search = req.uri().query().map(ToOwned::to_owned);

        RequestContext {
            req,
            original_url,
            path,
            base_url: String::new(),
            params: RouteParams::new(),
            search,
            remote_addr,
            shared,
        }
    }

    /// Passes the request on to the next handler in the chain.
    pub fn next(self) -> Flow<B> {
        Flow::Next(self)
    }

    /// Ends the chain with the given response.
    pub fn respond(self, res: Response<Full<Bytes>>) -> Flow<B> {
        Flow::Respond(res)
    }

    /// The URL as received from the client, path and query, before any mount prefix was stripped.
    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    /// The percent-decoded path relative to the router currently handling the request.
    ///
    /// Inside a router scoped at `/api`, a request for `/api/items` sees `/items` here.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The mount prefixes consumed so far, joined. Empty at the root router.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The raw query string without the leading `?`, if the request had one.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// All route parameters captured so far, including those of enclosing mounts.
    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    /// Returns the value of a single route parameter.
    pub fn param<P: AsRef<str>>(&self, param_name: P) -> Option<&str> {
        self.params.get(param_name).map(String::as_str)
    }

    /// The peer address when the request came in through a [`RouterService`](./struct.RouterService.html).
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Access data shared with `RouterBuilder::data`. A sub-router's data shadows its parents'.
    pub fn data<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.shared.get::<T>()
    }

    /// Stores a request-local value for later handlers in the chain, e.g. a parsed body or the authenticated user.
    pub fn set_local<T: Clone + Send + Sync + 'static>(&mut self, val: T) -> Option<T> {
        self.req.extensions_mut().insert(val)
    }

    /// Reads a request-local value stored by an earlier handler.
    pub fn local<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.req.extensions().get::<T>()
    }

    pub fn method(&self) -> &Method {
        self.req.method()
    }

    pub fn uri(&self) -> &Uri {
        self.req.uri()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.req.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.req.headers_mut()
    }

    pub fn extensions(&self) -> &Extensions {
        self.req.extensions()
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        self.req.extensions_mut()
    }

    pub fn request(&self) -> &Request<B> {
        &self.req
    }

    pub fn request_mut(&mut self) -> &mut Request<B> {
        &mut self.req
    }

    /// Gives up the context and returns the underlying request, e.g. to take its body.
    pub fn into_request(self) -> Request<B> {
        self.req
    }

    /// Enters a mount: strips `consumed` bytes off the path and merges the prefix's parameters.
    ///
    /// Returns what [`leave_mount`](#method.leave_mount) needs to undo it.
    pub(crate) fn enter_mount(&mut self, consumed: usize, params: RouteParams) -> MountState {
        let state = MountState {
            path: self.path.clone(),
            base_url: self.base_url.clone(),
            params: self.params.clone(),
            shared_len: self.shared.len(),
        };

        let (prefix, rest) = self.path.split_at(consumed);
        let rest = helpers::normalize_path(rest);
        self.base_url = helpers::join_paths(&self.base_url, prefix);
        self.path = rest;
        self.params.extend(params);

        state
    }

    pub(crate) fn leave_mount(&mut self, state: MountState) {
        self.path = state.path;
        self.base_url = state.base_url;
        self.params = state.params;
        self.shared.truncate(state.shared_len);
    }

    pub(crate) fn merge_params(&mut self, params: RouteParams) {
        self.params.extend(params);
    }
}

/// What a context looked like before it entered a mount.
pub(crate) struct MountState {
    path: String,
    base_url: String,
    params: RouteParams,
    shared_len: usize,
}

impl<B> Debug for RequestContext<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", self.req.method())
            .field("original_url", &self.original_url)
            .field("path", &self.path)
            .field("base_url", &self.base_url)
            .field("params", &self.params)
            .field("search", &self.search)
            .finish()
    }
}

use crate::router::Router;
use crate::service::request_service::{RequestService, RequestServiceBuilder};
use crate::RouteError;
use hyper::service::Service;
use std::convert::Infallible;
use std::fmt::{self, Debug, Formatter};
use std::future::{ready, Ready};
use tokio::net::TcpStream;

/// A [`Service`](https://docs.rs/hyper/1/hyper/service/trait.Service.html) that hands out one
/// [`RequestService`](./struct.RequestService.html) per accepted connection.
///
/// This `RouterService<B, E>` type accepts two type parameters: `B` and `E`.
///
/// * The `B` represents the request body type, [`hyper::body::Incoming`](https://docs.rs/hyper/1/hyper/body/struct.Incoming.html)
///   for connections served by hyper.
/// * The `E` represents any error type which will be used by route handlers and the middlewares. This error type must
///   be convertible into a boxed [std::error::Error](https://doc.rust-lang.org/std/error/trait.Error.html).
///
/// Use it with your own accept loop, or let [`Server`](./struct.Server.html) run one.
///
/// # Examples
///
/// ```no_run
/// use chainroute::{Flow, RequestContext, Router, RouterService};
/// use http_body_util::Full;
/// use hyper::body::{Bytes, Incoming};
/// use hyper::service::Service;
/// use hyper::Response;
/// use hyper_util::rt::{TokioExecutor, TokioIo};
/// use hyper_util::server::conn::auto::Builder;
/// use std::convert::Infallible;
/// use std::sync::Arc;
/// use tokio::net::TcpListener;
///
/// async fn home(ctx: RequestContext<Incoming>) -> Result<Flow<Incoming>, Infallible> {
///     Ok(ctx.respond(Response::new(Full::new(Bytes::from("Home page")))))
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     let router: Router<Incoming, Infallible> = Router::builder().get("/", home).build()?;
///
///     // Create a Service from the router above to handle incoming requests.
///     let service = Arc::new(RouterService::new(router));
///
///     let listener = TcpListener::bind("127.0.0.1:3001").await?;
///
///     loop {
///         let (stream, _) = listener.accept().await?;
///         let router_service = service.clone();
///
///         tokio::spawn(async move {
///             // Get the request service for this connection.
///             let request_service = router_service.call(&stream).await.unwrap();
///
///             let io = TokioIo::new(stream);
///             let builder = Builder::new(TokioExecutor::new());
///             if let Err(err) = builder.serve_connection(io, request_service).await {
///                 eprintln!("Error serving connection: {:?}", err);
///             }
///         });
///     }
/// }
/// ```
pub struct RouterService<B, E> {
    builder: RequestServiceBuilder<B, E>,
}

impl<B, E> RouterService<B, E> {
    /// Creates a new service with the provided router.
    pub fn new(router: Router<B, E>) -> RouterService<B, E> {
        RouterService {
            builder: RequestServiceBuilder::new(router),
        }
    }
}

impl<B, E> Service<&TcpStream> for RouterService<B, E>
where
    B: Send + 'static,
    E: Into<RouteError> + 'static,
{
    type Response = RequestService<B, E>;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn call(&self, conn: &TcpStream) -> Self::Future {
        let remote_addr = match conn.peer_addr() {
            Ok(addr) => Some(addr),
            Err(err) => {
                tracing::debug!(error = %err, "couldn't read peer address");
                None
            }
        };

        ready(Ok(self.builder.build(remote_addr)))
    }
}

impl<B, E> Debug for RouterService<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{ builder: {:?} }}", self.builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Neither the body nor the error type implements `Debug`.
    struct Body;
    struct Failure;

    #[test]
    fn should_format_without_debug_body_or_error_types() {
        let router: Router<Body, Failure> = Router::builder().build().unwrap();
        let service = RouterService::new(router);

        let out = format!("{:?}", service);
        assert!(out.starts_with("{ builder: { router: "), "unexpected output {}", out);
    }
}

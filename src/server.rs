use crate::router::Router;
use crate::service::RouterService;
use crate::{Error, RouteError};
use hyper::body::Incoming;
use hyper::service::Service;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

/// A small accept loop that serves a [`Router`](./struct.Router.html) over HTTP/1 and HTTP/2.
///
/// Every accepted connection is served on its own tokio task. Use [`RouterService`](./struct.RouterService.html)
/// directly when you need your own loop.
///
/// # Examples
///
/// ```no_run
/// use chainroute::{Flow, RequestContext, Router, Server};
/// use http_body_util::Full;
/// use hyper::body::{Bytes, Incoming};
/// use hyper::Response;
/// use std::convert::Infallible;
///
/// #[tokio::main]
/// async fn main() -> chainroute::Result<()> {
///     let router: Router<Incoming, Infallible> = Router::builder()
///         .get("/", |ctx: RequestContext<Incoming>| async move {
///             Ok(ctx.respond(Response::new(Full::new(Bytes::from("Home page")))))
///         })
///         .build()?;
///
///     Server::bind("127.0.0.1:3001", router)
///         .await?
///         .serve_with_shutdown(async {
///             let _ = tokio::signal::ctrl_c().await;
///         })
///         .await
/// }
/// ```
pub struct Server<E> {
    listener: TcpListener,
    service: Arc<RouterService<Incoming, E>>,
}

impl<E> Server<E>
where
    E: Into<RouteError> + 'static,
{
    /// Serves `router` on an already bound listener.
    pub fn from_listener(listener: TcpListener, router: Router<Incoming, E>) -> Server<E> {
        Server {
            listener,
            service: Arc::new(RouterService::new(router)),
        }
    }

    /// Binds a listener to `addr` and serves `router` on it.
    pub async fn bind<A: ToSocketAddrs>(addr: A, router: Router<Incoming, E>) -> crate::Result<Server<E>> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| Error::Transport(format!("couldn't bind listener: {}", err)))?;

        Ok(Server::from_listener(listener, router))
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> crate::Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|err| Error::Transport(err.to_string()).into())
    }

    /// Serves connections until the process exits.
    pub async fn serve(self) -> crate::Result<()> {
        self.serve_with_shutdown(futures::future::pending()).await
    }

    /// Serves connections until `signal` resolves.
    ///
    /// No new connection is accepted after that. Connections already accepted keep running on their own tasks.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> crate::Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = &mut signal => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => self.spawn_connection(stream).await,
                    Err(err) => tracing::error!(error = %err, "error accepting connection"),
                },
            }
        }

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }

    async fn spawn_connection(&self, stream: TcpStream) {
        let request_service = match self.service.call(&stream).await {
            Ok(service) => service,
            Err(never) => match never {},
        };

        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let builder = Builder::new(TokioExecutor::new());
            if let Err(err) = builder.serve_connection(io, request_service).await {
                tracing::error!(error = %err, "error serving connection");
            }
        });
    }
}

impl<E> std::fmt::Debug for Server<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ listener: {:?}, service: {:?} }}", self.listener, self.service)
    }
}

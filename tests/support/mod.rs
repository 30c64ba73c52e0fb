#![allow(dead_code)]

use chainroute::{RouteError, Router, Server};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot::{self, Sender};
use tokio::task::JoinHandle;

pub struct Serve {
    addr: SocketAddr,
    tx: Sender<()>,
    handle: JoinHandle<chainroute::Result<()>>,
}

impl Serve {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn new_request(&self, method: &str, route: &str) -> http::request::Builder {
        Request::builder()
            .method(method.to_ascii_uppercase().as_str())
            .uri(format!("http://{}{}", self.addr(), route))
    }

    pub async fn send(&self, req: Request<Full<Bytes>>) -> Response<Incoming> {
        let client = Client::builder(TokioExecutor::new()).build_http::<Full<Bytes>>();
        client.request(req).await.unwrap()
    }

    pub async fn get(&self, route: &str) -> Response<Incoming> {
        let req = self.new_request("GET", route).body(Full::new(Bytes::new())).unwrap();
        self.send(req).await
    }

    pub async fn shutdown(self) {
        self.tx.send(()).unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

pub async fn serve<E>(router: Router<Incoming, E>) -> Serve
where
    E: Into<RouteError> + 'static,
{
    // Bind a TCP listener to an available port.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::from_listener(listener, router);
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(server.serve_with_shutdown(async move {
        let _ = rx.await;
    }));

    Serve { addr, tx, handle }
}

pub async fn into_text<B>(body: B) -> String
where
    B: hyper::body::Body<Data = Bytes> + Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    String::from_utf8_lossy(&body.collect().await.unwrap().to_bytes()).to_string()
}

//! The transport used when no inner service is supplied.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tower::Service;

/// Plain HTTP/1 client transport backed by `hyper-util`'s pooled client.
///
/// Cloning is cheap and clones share the connection pool. Requests are
/// executed on the tokio runtime the caller is running on.
#[derive(Clone, Debug)]
pub struct DefaultTransport {
    client: Client<HttpConnector, Body>,
}

impl DefaultTransport {
    /// Build a client with its own connection pool.
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }
}

impl Default for DefaultTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for DefaultTransport {
    type Response = Response<Body>;
    type Error = hyper_util::client::legacy::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let future = self.client.request(request);
        Box::pin(async move {
            let response = future.await?;
            Ok(response.map(Body::new))
        })
    }
}

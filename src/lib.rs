//! # httplog
//!
//! A Tower middleware for HTTP clients that logs every outgoing request and
//! every incoming response, then hands the response back untouched.
//!
//! ## Features
//!
//! - **Pass-through**: requests and responses are never modified, and the
//!   inner transport's errors are returned as they are
//! - **Configurable body logging**: headers are always logged, bodies only on request
//! - **Replay-safe**: bodies read for logging are replayed, so callers can still
//!   consume them in full
//! - **Pluggable**: any [`Logger`] (including plain closures) and any Tower
//!   service as the inner transport
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::body::Body;
//! use axum::http::Request;
//! use httplog::{DefaultTransport, HttpLogConfig, HttpLogLayer};
//! use tower::{ServiceBuilder, ServiceExt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     tracing_subscriber::fmt().with_writer(std::io::stderr).init();
//!
//!     let client = ServiceBuilder::new()
//!         .layer(HttpLogLayer::new(HttpLogConfig { log_body: true }))
//!         .service(DefaultTransport::new());
//!
//!     let request = Request::get("http://localhost:3000/hello").body(Body::empty())?;
//!     let response = client.oneshot(request).await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Loggers
//!
//! Every line goes through a [`Logger`]. Closures implement it directly:
//!
//! ```rust
//! use httplog::{HttpLogConfig, HttpLogLayer};
//!
//! let layer = HttpLogLayer::new(HttpLogConfig::default())
//!     .with_logger(|line: &str| eprintln!("{line}"));
//! ```
//!
//! ## Error Handling
//!
//! A request that cannot be dumped (its body fails to read) is rejected with
//! [`Error::DumpRequest`] before anything is sent. A response that cannot be
//! dumped is only logged: the call still succeeds.

use axum::{
    body::Body,
    http::{Request, Response},
};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

pub mod body_wrapper;

pub mod dump;
use dump::{dump_request, dump_response};

pub mod error;
pub use error::{DumpError, Error};

pub mod logger;
pub use logger::{Logger, TracingLogger};

pub mod transport;
pub use transport::DefaultTransport;

/// Prefix of every line handed to the [`Logger`].
pub const LOG_PREFIX: &str = "httplog: ";

/// Configuration for the logging transport.
///
/// # Examples
///
/// ```rust
/// use httplog::HttpLogConfig;
///
/// // Headers only
/// let config = HttpLogConfig::default();
/// assert!(!config.log_body);
///
/// // Headers and bodies
/// let config = HttpLogConfig { log_body: true };
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HttpLogConfig {
    /// Whether request and response bodies are included in the logged dumps
    pub log_body: bool,
}

/// Tower layer that wraps a client transport in an [`HttpLog`].
///
/// The logger is shared by all services the layer produces.
///
/// # Examples
///
/// ```rust
/// use httplog::{DefaultTransport, HttpLogConfig, HttpLogLayer};
/// use tower::ServiceBuilder;
///
/// let client = ServiceBuilder::new()
///     .layer(HttpLogLayer::new(HttpLogConfig::default()))
///     .service(DefaultTransport::new());
/// ```
#[derive(Debug)]
pub struct HttpLogLayer<L = TracingLogger> {
    config: HttpLogConfig,
    logger: Arc<L>,
}

impl HttpLogLayer<TracingLogger> {
    /// Create a layer that logs through [`TracingLogger`].
    pub fn new(config: HttpLogConfig) -> Self {
        Self {
            config,
            logger: Arc::new(TracingLogger),
        }
    }
}

impl Default for HttpLogLayer<TracingLogger> {
    fn default() -> Self {
        Self::new(HttpLogConfig::default())
    }
}

impl<L: Logger> HttpLogLayer<L> {
    /// Replace the logger.
    pub fn with_logger<L2: Logger>(self, logger: L2) -> HttpLogLayer<L2> {
        HttpLogLayer {
            config: self.config,
            logger: Arc::new(logger),
        }
    }

    /// The configuration handed to every service this layer builds.
    pub fn config(&self) -> &HttpLogConfig {
        &self.config
    }
}

impl<L> Clone for HttpLogLayer<L> {
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            logger: self.logger.clone(),
        }
    }
}

impl<S, L> Layer<S> for HttpLogLayer<L> {
    type Service = HttpLog<S, L>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpLog {
            inner,
            config: self.config,
            logger: self.logger.clone(),
        }
    }
}

/// Client transport that logs each request and response around an inner transport.
///
/// Per call, in order:
///
/// 1. the request is dumped and logged; if the dump fails the failure is
///    logged and returned as [`Error::DumpRequest`] without calling the inner
///    transport
/// 2. the inner transport is called
/// 3. a transport error is logged and returned as [`Error::Transport`]
/// 4. the response is dumped and logged; a failed response dump is logged
///    but the response is still returned
///
/// Each call emits at most two lines, all prefixed with [`LOG_PREFIX`].
/// Nothing else is written anywhere.
///
/// Readiness failures of the inner transport surface from `poll_ready` as
/// [`Error::Transport`] and are not logged: no request exists yet, so there
/// is no round trip to report.
///
/// Usually built through [`HttpLogLayer`]; [`HttpLog::default`] gives a
/// ready-to-use client over [`DefaultTransport`] logging through
/// [`TracingLogger`].
#[derive(Debug)]
pub struct HttpLog<S, L = TracingLogger> {
    inner: S,
    config: HttpLogConfig,
    logger: Arc<L>,
}

impl<S> HttpLog<S, TracingLogger> {
    /// Wrap `inner`, logging through [`TracingLogger`].
    pub fn new(inner: S, config: HttpLogConfig) -> Self {
        Self {
            inner,
            config,
            logger: Arc::new(TracingLogger),
        }
    }
}

impl Default for HttpLog<DefaultTransport, TracingLogger> {
    fn default() -> Self {
        Self::new(DefaultTransport::new(), HttpLogConfig::default())
    }
}

impl<S, L: Logger> HttpLog<S, L> {
    /// Replace the logger, keeping the inner transport and configuration.
    pub fn with_logger<L2: Logger>(self, logger: L2) -> HttpLog<S, L2> {
        HttpLog {
            inner: self.inner,
            config: self.config,
            logger: Arc::new(logger),
        }
    }

    /// Borrow the inner transport.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Unwrap the inner transport.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Clone, L> Clone for HttpLog<S, L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: self.config,
            logger: self.logger.clone(),
        }
    }
}

impl<S, L> Service<Request<Body>> for HttpLog<S, L>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
    L: Logger,
{
    type Response = Response<Body>;
    type Error = Error<S::Error>;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Error::Transport)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        // The clone may not be ready; keep it and move the driven one into the future
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let log_body = self.config.log_body;
        let logger = self.logger.clone();

        Box::pin(async move {
            match dump_request(&mut request, log_body).await {
                Ok(dump) => logger.log(&format!("{LOG_PREFIX}{}", String::from_utf8_lossy(&dump))),
                Err(e) => {
                    logger.log(&format!("{LOG_PREFIX}dump request: {e}"));
                    return Err(Error::DumpRequest(e));
                }
            }

            let mut response = match inner.call(request).await {
                Ok(response) => response,
                Err(e) => {
                    logger.log(&format!("{LOG_PREFIX}roundtrip error: {e}"));
                    return Err(Error::Transport(e));
                }
            };

            // Unlike the request side, a failed response dump never fails the call
            match dump_response(&mut response, log_body).await {
                Ok(dump) => logger.log(&format!("{LOG_PREFIX}{}", String::from_utf8_lossy(&dump))),
                Err(e) => logger.log(&format!("{LOG_PREFIX}dump response: {e}")),
            }

            Ok(response)
        })
    }
}

use axum::{
    body::{Body, Bytes},
    http::Request,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use futures::stream;
use http_body_util::BodyExt;
use httplog::{DefaultTransport, HttpLog, HttpLogConfig, HttpLogLayer};
use std::{net::SocketAddr, time::Duration};
use tokio::{net::TcpListener, time::sleep};
use tower::{Layer, ServiceBuilder, ServiceExt};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

// Handlers for the local server the demo client talks to
async fn hello_handler() -> impl IntoResponse {
    sleep(Duration::from_millis(20)).await; // Simulate some work
    "Hello, World!"
}

async fn echo_handler(body: Bytes) -> impl IntoResponse {
    format!("Echo: {}", String::from_utf8_lossy(&body))
}

async fn streaming_handler() -> impl IntoResponse {
    let stream = stream::iter((0..3).map(|n| {
        Ok::<_, std::convert::Infallible>(Bytes::from(format!("chunk-{n}\n")))
    }));

    Response::builder()
        .header("content-type", "text/plain")
        .body(Body::from_stream(stream))
        .unwrap()
}

async fn serve() -> anyhow::Result<SocketAddr> {
    let app = Router::new()
        .route("/hello", get(hello_handler))
        .route("/echo", post(echo_handler))
        .route("/streaming", get(streaming_handler))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "demo server stopped");
        }
    });
    Ok(addr)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // httplog lines go to stderr; raise to RUST_LOG=debug to also see the server side
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("httplog=info,demo=info")),
        )
        .init();

    let addr = serve().await?;
    info!("Demo server listening on http://{addr}");

    // Headers only, default tracing logger, default transport
    let client = HttpLog::default();
    let response = client
        .oneshot(Request::get(format!("http://{addr}/hello")).body(Body::empty())?)
        .await?;
    info!(status = %response.status(), "GET /hello done");

    // Bodies included, layered onto an explicit transport
    let client = ServiceBuilder::new()
        .layer(HttpLogLayer::new(HttpLogConfig { log_body: true }))
        .service(DefaultTransport::new());

    let payload = serde_json::json!({ "message": "Hello from client" });
    let request = Request::post(format!("http://{addr}/echo"))
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))?;
    let response = client.clone().oneshot(request).await?;
    let body = response.into_body().collect().await?.to_bytes();
    info!(body = %String::from_utf8_lossy(&body), "POST /echo done");

    let response = client
        .oneshot(Request::get(format!("http://{addr}/streaming")).body(Body::empty())?)
        .await?;
    let body = response.into_body().collect().await?.to_bytes();
    info!(bytes = body.len(), "GET /streaming done");

    // Any closure can be the logger
    let client = HttpLogLayer::new(HttpLogConfig::default())
        .with_logger(|line: &str| println!("{line}"))
        .layer(DefaultTransport::new());
    client
        .oneshot(Request::get(format!("http://{addr}/missing")).body(Body::empty())?)
        .await?;

    Ok(())
}

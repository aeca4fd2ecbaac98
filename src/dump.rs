//! Wire-format-like text renderings of requests and responses.
//!
//! The output mirrors what an HTTP/1 peer would see on the wire: a start line,
//! the header block and, optionally, the body. Header names come out the way
//! [`axum::http::HeaderMap`] stores them (lowercase), sorted by name.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, Method, Request, Response, Version};
use bytes::{BufMut, BytesMut};

use crate::body_wrapper::buffer_body;
use crate::error::DumpError;

/// Headers written separately (or not at all) in a request dump.
const REQUEST_EXCLUDED: [HeaderName; 3] = [header::HOST, header::TRANSFER_ENCODING, header::TRAILER];

/// Renders `req` as text.
///
/// The request line and headers are always included. When `include_body` is
/// set the body is read into memory, appended to the dump, and the request's
/// body is replaced with an identical copy so it can still be sent. Without
/// `include_body` the body is left alone.
///
/// Fails only when reading the body fails.
///
/// # Examples
///
/// ```rust
/// use axum::body::Body;
/// use axum::http::Request;
/// use httplog::dump::dump_request;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut req = Request::get("http://example.test/search?q=rust")
///     .header("accept", "text/html")
///     .body(Body::empty())?;
///
/// let dump = dump_request(&mut req, false).await?;
/// assert_eq!(
///     dump,
///     "GET /search?q=rust HTTP/1.1\r\nhost: example.test\r\naccept: text/html\r\n\r\n"
/// );
/// # Ok(())
/// # }
/// ```
pub async fn dump_request(req: &mut Request<Body>, include_body: bool) -> Result<Bytes, DumpError> {
    let mut out = BytesMut::new();

    out.put_slice(req.method().as_str().as_bytes());
    out.put_u8(b' ');
    out.put_slice(request_target(req).as_bytes());
    out.put_u8(b' ');
    out.put_slice(version_str(req.version()).as_bytes());
    out.put_slice(b"\r\n");

    let host = req
        .headers()
        .get(header::HOST)
        .map(|v| v.as_bytes().to_vec())
        .or_else(|| req.uri().authority().map(|a| a.as_str().as_bytes().to_vec()));
    if let Some(host) = host {
        out.put_slice(b"host: ");
        out.put_slice(&host);
        out.put_slice(b"\r\n");
    }

    write_headers(&mut out, req.headers(), &REQUEST_EXCLUDED);
    out.put_slice(b"\r\n");

    if include_body {
        let (replay, captured) = buffer_body(std::mem::take(req.body_mut())).await;
        *req.body_mut() = replay;
        out.put_slice(&captured?);
    }

    Ok(out.freeze())
}

/// Renders `res` as text.
///
/// The status line and headers are always included. When `include_body` is
/// set the body is read into memory and the response's body is replaced with
/// an identical copy, so the caller can still read all of it. If reading
/// fails the replacement body yields the data read so far and then the same
/// error, and the failure is returned.
///
/// # Examples
///
/// ```rust
/// use axum::body::Body;
/// use axum::http::Response;
/// use http_body_util::BodyExt;
/// use httplog::dump::dump_response;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut res = Response::builder()
///     .status(200)
///     .header("x", "1")
///     .body(Body::from("hello"))?;
///
/// let dump = dump_response(&mut res, true).await?;
/// assert_eq!(dump, "HTTP/1.1 200 OK\r\nx: 1\r\n\r\nhello");
///
/// // The body is still there for the caller
/// assert_eq!(res.into_body().collect().await?.to_bytes(), "hello");
/// # Ok(())
/// # }
/// ```
pub async fn dump_response(res: &mut Response<Body>, include_body: bool) -> Result<Bytes, DumpError> {
    let mut out = BytesMut::new();

    out.put_slice(version_str(res.version()).as_bytes());
    out.put_u8(b' ');
    out.put_slice(res.status().as_str().as_bytes());
    if let Some(reason) = res.status().canonical_reason() {
        out.put_u8(b' ');
        out.put_slice(reason.as_bytes());
    }
    out.put_slice(b"\r\n");

    write_headers(&mut out, res.headers(), &[]);
    out.put_slice(b"\r\n");

    if include_body {
        let (replay, captured) = buffer_body(std::mem::take(res.body_mut())).await;
        *res.body_mut() = replay;
        out.put_slice(&captured?);
    }

    Ok(out.freeze())
}

/// Path and query for origin-form requests, the authority for `CONNECT`.
fn request_target(req: &Request<Body>) -> String {
    let uri = req.uri();
    if req.method() == Method::CONNECT {
        if let Some(authority) = uri.authority() {
            return authority.to_string();
        }
    }
    match uri.path_and_query().map(|pq| pq.as_str()) {
        Some(pq) if !pq.is_empty() && pq != "*" && !pq.starts_with('/') => format!("/{pq}"),
        Some(pq) if !pq.is_empty() => pq.to_string(),
        _ => "/".to_string(),
    }
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

/// Writes one `name: value` line per header value, names sorted, skipping `excluded`.
fn write_headers(out: &mut BytesMut, headers: &HeaderMap, excluded: &[HeaderName]) {
    let mut names: Vec<&HeaderName> = headers.keys().filter(|name| !excluded.contains(name)).collect();
    names.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    for name in names {
        for value in headers.get_all(name) {
            out.put_slice(name.as_str().as_bytes());
            out.put_slice(b": ");
            out.put_slice(value.as_bytes());
            out.put_slice(b"\r\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode};
    use futures::stream;
    use http_body_util::BodyExt;

    fn text(dump: &Bytes) -> String {
        String::from_utf8_lossy(dump).into_owned()
    }

    #[tokio::test]
    async fn test_request_line_and_host_from_uri() {
        let mut req = Request::get("http://example.test/").body(Body::empty()).unwrap();
        let dump = dump_request(&mut req, false).await.unwrap();
        assert_eq!(text(&dump), "GET / HTTP/1.1\r\nhost: example.test\r\n\r\n");
    }

    #[tokio::test]
    async fn test_explicit_host_header_wins() {
        let mut req = Request::get("http://10.0.0.1:8080/status")
            .header("host", "api.example.test")
            .body(Body::empty())
            .unwrap();
        let dump = text(&dump_request(&mut req, false).await.unwrap());
        assert!(dump.starts_with("GET /status HTTP/1.1\r\nhost: api.example.test\r\n"));
        assert_eq!(dump.matches("host:").count(), 1);
    }

    #[tokio::test]
    async fn test_headers_sorted_and_repeated() {
        let mut req = Request::post("/upload")
            .header("x-trace", "b")
            .header("accept", "*/*")
            .header("x-trace", "a")
            .header("transfer-encoding", "chunked")
            .body(Body::empty())
            .unwrap();
        let dump = text(&dump_request(&mut req, false).await.unwrap());
        assert_eq!(
            dump,
            "POST /upload HTTP/1.1\r\naccept: */*\r\nx-trace: b\r\nx-trace: a\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_connect_uses_authority() {
        let mut req = Request::connect("proxy.example.test:443").body(Body::empty()).unwrap();
        let dump = text(&dump_request(&mut req, false).await.unwrap());
        assert!(dump.starts_with("CONNECT proxy.example.test:443 HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn test_request_body_included_and_replayed() {
        let mut req = Request::post("http://example.test/echo")
            .body(Body::from("ping"))
            .unwrap();
        let dump = text(&dump_request(&mut req, true).await.unwrap());
        assert!(dump.ends_with("\r\n\r\nping"));

        let body = req.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "ping");
    }

    #[tokio::test]
    async fn test_request_body_untouched_without_flag() {
        let mut req = Request::post("http://example.test/echo")
            .body(Body::from("ping"))
            .unwrap();
        let dump = text(&dump_request(&mut req, false).await.unwrap());
        assert!(!dump.contains("ping"));

        let body = req.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "ping");
    }

    #[tokio::test]
    async fn test_request_body_error_fails_dump() {
        let chunks = stream::iter(vec![Err::<Bytes, _>(std::io::Error::other("unreadable"))]);
        let mut req = Request::post("http://example.test/")
            .body(Body::from_stream(chunks))
            .unwrap();
        let err = dump_request(&mut req, true).await.unwrap_err();
        assert!(err.to_string().contains("unreadable"));
    }

    #[tokio::test]
    async fn test_response_status_line() {
        let mut res = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .version(Version::HTTP_2)
            .body(Body::empty())
            .unwrap();
        let dump = text(&dump_response(&mut res, false).await.unwrap());
        assert_eq!(dump, "HTTP/2.0 404 Not Found\r\n\r\n");
    }

    #[tokio::test]
    async fn test_response_unknown_status_has_no_reason() {
        let mut res = Response::builder().status(599).body(Body::empty()).unwrap();
        let dump = text(&dump_response(&mut res, false).await.unwrap());
        assert_eq!(dump, "HTTP/1.1 599\r\n\r\n");
    }

    #[tokio::test]
    async fn test_response_body_error_keeps_body_readable_up_to_failure() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from("hel")),
            Err(std::io::Error::other("truncated")),
        ]);
        let mut res = Response::new(Body::from_stream(chunks));
        let err = dump_response(&mut res, true).await.unwrap_err();
        assert!(err.to_string().contains("truncated"));

        let mut body = res.into_body();
        let first = body.frame().await.unwrap().unwrap();
        assert_eq!(first.into_data().unwrap(), "hel");
        assert!(body.frame().await.unwrap().is_err());
    }
}

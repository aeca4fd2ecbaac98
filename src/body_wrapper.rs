//! Body buffering and replay utilities.
//!
//! Dumping a body means reading it, but the caller (or the inner transport)
//! still needs to read it afterwards. This module reads a body into memory and
//! hands back a replacement body that yields exactly what the original did.

use axum::body::{Body, Bytes};
use axum::http::HeaderMap;
use bytes::BytesMut;
use futures::stream;
use http_body_util::{BodyExt, StreamBody};
use http_body::Frame;

use crate::error::DumpError;

/// Reads `body` to the end and returns a replayable copy together with the bytes read.
///
/// The returned body always mirrors the original:
/// - on success it yields the same data, followed by the trailers if there were any
/// - on a read error it yields the data read so far, then the original error
///
/// In the error case the second element carries the error text, so the caller
/// can report the failure while the body still surfaces it to whoever reads it.
///
/// # Examples
///
/// ```rust
/// use axum::body::Body;
/// use http_body_util::BodyExt;
/// use httplog::body_wrapper::buffer_body;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (replay, captured) = buffer_body(Body::from("Hello, World!")).await;
/// assert_eq!(captured?, "Hello, World!");
///
/// // The replacement body can still be read in full
/// let collected = replay.collect().await?.to_bytes();
/// assert_eq!(collected, "Hello, World!");
/// # Ok(())
/// # }
/// ```
pub async fn buffer_body(mut body: Body) -> (Body, Result<Bytes, DumpError>) {
    let mut data = BytesMut::new();
    let mut trailers: Option<HeaderMap> = None;

    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => match frame.into_data() {
                Ok(chunk) => data.extend_from_slice(&chunk),
                Err(frame) => {
                    if let Ok(map) = frame.into_trailers() {
                        match trailers.as_mut() {
                            Some(existing) => append_trailers(existing, map),
                            None => trailers = Some(map),
                        }
                    }
                }
            },
            Err(e) => {
                let err = DumpError::Body(e.to_string());
                let data = data.freeze();
                let mut frames = Vec::with_capacity(2);
                if !data.is_empty() {
                    frames.push(Ok(Frame::data(data)));
                }
                frames.push(Err(e));
                return (replay(frames), Err(err));
            }
        }
    }

    let data = data.freeze();
    let body = match trailers {
        None => Body::from(data.clone()),
        Some(trailers) => replay(vec![Ok(Frame::data(data.clone())), Ok(Frame::trailers(trailers))]),
    };
    (body, Ok(data))
}

/// Appends every value of `more`; repeated names keep the earlier values.
fn append_trailers(existing: &mut HeaderMap, more: HeaderMap) {
    // `None` keys continue the previous name
    let mut name = None;
    for (key, value) in more {
        if let Some(key) = key {
            name = Some(key);
        }
        if let Some(name) = &name {
            existing.append(name.clone(), value);
        }
    }
}

fn replay(frames: Vec<Result<Frame<Bytes>, axum::Error>>) -> Body {
    Body::new(StreamBody::new(stream::iter(frames)))
}

//! Error types returned by the logging transport and the dump helpers.

/// Failure to render a request or response as text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DumpError {
    /// The body stream yielded an error while it was being buffered.
    #[error("reading body: {0}")]
    Body(String),
}

/// Error returned by [`HttpLog`](crate::HttpLog).
///
/// A failed request dump is the only failure the decorator introduces itself.
/// Everything the inner transport reports is passed through untouched in
/// [`Error::Transport`].
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    /// The request could not be dumped; the inner transport was never called.
    #[error("dump request: {0}")]
    DumpRequest(#[source] DumpError),
    /// The inner transport failed.
    #[error(transparent)]
    Transport(E),
}

impl<E> Error<E> {
    /// Returns the inner transport's error, if that is where the failure came from.
    pub fn into_transport(self) -> Option<E> {
        match self {
            Error::Transport(e) => Some(e),
            Error::DumpRequest(_) => None,
        }
    }

    /// Whether the call was rejected before reaching the inner transport.
    pub fn is_dump_request(&self) -> bool {
        matches!(self, Error::DumpRequest(_))
    }
}

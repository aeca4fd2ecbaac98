//! The logging capability used by [`HttpLog`](crate::HttpLog).
//!
//! A [`Logger`] receives finished log lines. Any `Fn(&str)` closure that is
//! `Send + Sync` is a logger, and [`TracingLogger`] is used when none is given.

use tracing::info;

/// Receives the lines produced by the logging transport.
///
/// One transport value is shared by every concurrent call made through it, so
/// implementations are invoked concurrently and must tolerate that.
///
/// # Examples
///
/// ```rust
/// use httplog::Logger;
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Default)]
/// struct Collect(Arc<Mutex<Vec<String>>>);
///
/// impl Logger for Collect {
///     fn log(&self, line: &str) {
///         self.0.lock().unwrap().push(line.to_owned());
///     }
/// }
///
/// // Closures work too
/// fn takes_logger<L: Logger>(_logger: L) {}
/// takes_logger(|line: &str| eprintln!("{line}"));
/// takes_logger(Collect::default());
/// ```
pub trait Logger: Send + Sync + 'static {
    /// Handle one complete log line, already prefixed with `httplog: `.
    fn log(&self, line: &str);
}

impl<F> Logger for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn log(&self, line: &str) {
        self(line)
    }
}

/// Default [`Logger`]: emits every line as a `tracing` INFO event.
///
/// Events use the `httplog` target, so they can be filtered with e.g.
/// `RUST_LOG=httplog=info`. Where they end up is decided by the installed
/// subscriber.
///
/// # Examples
///
/// ```rust,no_run
/// use httplog::{HttpLogConfig, HttpLogLayer, TracingLogger};
///
/// tracing_subscriber::fmt().with_writer(std::io::stderr).init();
///
/// // Same as HttpLogLayer::new(config)
/// let layer = HttpLogLayer::new(HttpLogConfig::default()).with_logger(TracingLogger);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, line: &str) {
        info!(target: "httplog", "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_logger() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let logger = move |line: &str| sink.lock().unwrap().push(line.to_owned());

        logger.log("httplog: one");
        Logger::log(&logger, "httplog: two");

        assert_eq!(*lines.lock().unwrap(), vec!["httplog: one", "httplog: two"]);
    }

    #[test]
    fn test_tracing_logger_without_subscriber() {
        // No subscriber installed: the event is dropped, nothing panics
        TracingLogger.log("httplog: GET / HTTP/1.1");
    }
}

//! # Request/Response Tracing
//!
//! `tower_http::trace::TraceLayer` for structured request logging.

/// Each request gets a span with method, URI and status code.
pub fn layer() -> tower_http::trace::TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
> {
    tower_http::trace::TraceLayer::new_for_http()
}

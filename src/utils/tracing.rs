//! Span helpers for calls leaving the process.

/// Create a span for external HTTP service calls.
///
/// # Example
/// ```ignore
/// let span = external_http_span!("curator", "POST", "/generate-quiz");
/// ```
#[macro_export]
macro_rules! external_http_span {
    ($service:expr, $method:expr, $path:expr) => {
        tracing::info_span!(
            "http.client",
            service.name = $service,
            http.method = $method,
            http.url = $path,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
            error.message = tracing::field::Empty
        )
    };
}

/// Record an error on the current span.
pub fn record_error(error: &dyn std::fmt::Display) {
    let span = tracing::Span::current();
    span.record("otel.status_code", "ERROR");
    span.record("error.message", error.to_string().as_str());
}

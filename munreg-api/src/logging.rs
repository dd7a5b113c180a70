//! One-line request log for `/api` calls.
//!
//! Format: `{METHOD} {path} {status} in {ms}ms :: {json body}`, cut to
//! [`LOG_LINE_LIMIT`] characters. Only small bodies of known length are read
//! back for the log; everything else passes through untouched.

use std::time::Instant;

use axum::{
    body::{self, Body, HttpBody},
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use munreg_core::constants::{LOG_BODY_BUFFER_LIMIT, LOG_LINE_LIMIT};

/// Builds the log line. Lines over the limit keep `LOG_LINE_LIMIT - 1`
/// characters followed by `…`.
pub fn format_log_line(
    method: &str,
    path: &str,
    status: u16,
    elapsed_ms: u128,
    body: Option<&str>,
) -> String {
    let mut line = format!("{} {} {} in {}ms", method, path, status, elapsed_ms);
    if let Some(body) = body.filter(|b| !b.is_empty()) {
        line.push_str(" :: ");
        line.push_str(body);
    }

    if line.chars().count() > LOG_LINE_LIMIT {
        let mut cut: String = line.chars().take(LOG_LINE_LIMIT - 1).collect();
        cut.push('…');
        cut
    } else {
        line
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

/// Middleware logging every `/api` request with its JSON response body.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if !path.starts_with("/api") {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_millis();
    let status = response.status();

    if !is_json(&response) {
        info!("{}", format_log_line(method.as_str(), &path, status.as_u16(), elapsed, None));
        return response;
    }

    let (parts, body) = response.into_parts();
    let small = matches!(
        body.size_hint().exact(),
        Some(len) if len as usize <= LOG_BODY_BUFFER_LIMIT
    );
    if !small {
        info!("{}", format_log_line(method.as_str(), &path, status.as_u16(), elapsed, None));
        return Response::from_parts(parts, body);
    }

    let bytes = match body::to_bytes(body, LOG_BODY_BUFFER_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // The status is already decided; keep it even without the body
            warn!(
                error = %e,
                %path,
                status = status.as_u16(),
                "Could not read response body for logging"
            );
            return Response::from_parts(parts, Body::empty());
        }
    };

    let text = String::from_utf8_lossy(&bytes);
    info!(
        "{}",
        format_log_line(method.as_str(), &path, status.as_u16(), elapsed, Some(&text))
    );

    Response::from_parts(parts, Body::from(bytes))
}

//! Error page layers
//!
//! Two paths lead to an error page:
//!
//! - a handler panics: [`CatchPanicLayer`] catches the unwind and
//!   [`PanicToReport`] turns it into a bare 500 response carrying the
//!   [`Uncaught`] error as an extension;
//! - a handler returns [`AppError`], whose response carries the same
//!   extension.
//!
//! The outer [`report_uncaught`] middleware remembers the request, looks for
//! the extension on the way out and replaces the response with the page
//! rendered by the dispatcher on tokio's blocking pool.

use std::any::Any;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use crashpage_core::{CapturedError, ErrorReporter, ExecutionMode, Output, RequestInfo};
use hyper::ext::ReasonPhrase;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};
use tracing::warn;

/// Headers whose values never appear on an error page
const REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "proxy-authorization"];

/// An error that escaped a handler, waiting to be rendered
#[derive(Debug, Clone)]
pub struct Uncaught(pub CapturedError);

/// Response for a caught handler panic
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicToReport;

impl ResponseForPanic for PanicToReport {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let error = ErrorReporter::capture_panic(err.as_ref());
        uncaught_response(error)
    }
}

/// Error type for handlers that want failures reported as error pages.
///
/// Any [`std::error::Error`] converts into it with `?`, recording where the
/// conversion happened.
#[derive(Debug)]
pub struct AppError(CapturedError);

impl AppError {
    /// Wrap an already captured error
    pub fn new(error: CapturedError) -> Self {
        Self(error)
    }

    /// The captured error
    pub fn error(&self) -> &CapturedError {
        &self.0
    }
}

impl<E> From<E> for AppError
where
    E: std::error::Error + 'static,
{
    #[track_caller]
    fn from(err: E) -> Self {
        Self(CapturedError::from_error(&err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        uncaught_response(self.0)
    }
}

fn uncaught_response(error: CapturedError) -> Response {
    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response.extensions_mut().insert(Uncaught(error));
    response
}

/// Route panics and [`AppError`]s of `router` to error pages
pub fn error_pages<S>(router: Router<S>, reporter: Arc<ErrorReporter>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(PanicToReport))
        .layer(middleware::from_fn_with_state(reporter, report_uncaught))
}

/// Replace responses carrying an [`Uncaught`] error with the error page
pub async fn report_uncaught(
    State(reporter): State<Arc<ErrorReporter>>,
    request: Request,
    next: Next,
) -> Response {
    let info = request_info(&request);
    let mut response = next.run(request).await;

    let Some(Uncaught(error)) = response.extensions_mut().remove::<Uncaught>() else {
        return response;
    };

    // Rendering reads source files for the excerpts.
    let rendered =
        tokio::task::spawn_blocking(move || error_page(&reporter, error, Some(&info))).await;
    rendered.unwrap_or_else(|err| {
        warn!(error = %err, "error page task failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

/// Render the error page for `error` as a response
pub fn error_page(
    reporter: &ErrorReporter,
    error: CapturedError,
    request: Option<&RequestInfo>,
) -> Response {
    let mut output = Output::new(Vec::new());
    reporter
        .dispatcher(&output)
        .handle_uncaught(error, ExecutionMode::Networked, &mut output, request);

    let status = output.status();
    let body = output.into_inner().unwrap_or_else(|err| {
        warn!(error = %err, "failed to collect error page");
        Vec::new()
    });

    let mut response = Response::new(Body::from(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    if let Some(status) = status {
        *response.status_mut() =
            StatusCode::from_u16(status.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match ReasonPhrase::try_from(status.reason.as_bytes()) {
            Ok(reason) => {
                response.extensions_mut().insert(reason);
            }
            Err(_) => warn!(reason = status.reason, "invalid reason phrase"),
        }
    }
    response
}

/// What the error page shows about the request
pub fn request_info(request: &Request) -> RequestInfo {
    let headers = request
        .headers()
        .iter()
        .map(|(name, value)| {
            let value = if REDACTED_HEADERS.contains(&name.as_str()) {
                "[redacted]".to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.to_string(), value)
        })
        .collect();

    RequestInfo {
        method: request.method().to_string(),
        uri: request.uri().to_string(),
        headers,
    }
}

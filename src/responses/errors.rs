use crate::errors::ServerError;
use crate::templates::{components::error_fragment, pages::error_page};
use astra::{Body, Response, ResponseBuilder};
use maud::Markup;
use tracing::{error, warn};

pub type ResultResp = Result<Response, ServerError>;

/// Convert a ServerError into an HTML response with the matching status.
///
/// htmx requests get an inline fragment so the form on the page survives.
pub fn error_to_response(err: ServerError, htmx: bool) -> Response {
    let status = err.status_code();
    if status >= 500 {
        error!(status, error = %err, "request failed");
    } else {
        warn!(status, error = %err, "request rejected");
    }

    let message = err.user_message();
    let markup = if htmx {
        error_fragment(&message)
    } else {
        error_page(status, &message)
    };
    render(status, markup)
}

fn render(status: u16, markup: Markup) -> Response {
    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Body::from(markup.into_string()))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}

//! Not-Found and error responses
//!
//! Both follow the same three levels: a literal body, a callback that may write the
//! response itself or return a body, or the default text.

use hyper::StatusCode;

use super::RequestContext;
use crate::config::{ErrorHandler, NotFoundHandler, Responder};
use crate::error::ServeError;
use crate::http::{send_page, ResponseSink};
use crate::logger;

pub const NOT_FOUND_BODY: &str = "Not Found";
pub const ERROR_BODY: &str = "Internal Server Error";

/// Answer with 404 according to the configured handler.
pub fn respond_not_found(handler: &NotFoundHandler, ctx: &RequestContext, sink: &ResponseSink) {
    preset_status(sink, StatusCode::NOT_FOUND);
    let body = match handler {
        Responder::Default => Some(NOT_FOUND_BODY.to_string()),
        Responder::Literal(body) => Some(body.clone()),
        Responder::Callback(callback) => callback(ctx, sink),
    };
    finish(sink, StatusCode::NOT_FOUND, body);
}

/// Answer with 500 according to the configured handler.
pub fn respond_error(
    handler: &ErrorHandler,
    err: &ServeError,
    ctx: &RequestContext,
    sink: &ResponseSink,
) {
    logger::log_error(&format!("{} {} -> {err}", ctx.method, ctx.path));
    preset_status(sink, StatusCode::INTERNAL_SERVER_ERROR);
    let body = match handler {
        Responder::Default => Some(ERROR_BODY.to_string()),
        Responder::Literal(body) => Some(body.clone()),
        Responder::Callback(callback) => callback(err, ctx, sink),
    };
    finish(sink, StatusCode::INTERNAL_SERVER_ERROR, body);
}

/// Status a callback that writes nothing still answers with; it may override it.
fn preset_status(sink: &ResponseSink, status: StatusCode) {
    if sink.set_status(status).is_err() {
        logger::log_warning(&format!(
            "Response already ended before the {} page",
            status.as_u16()
        ));
    }
}

fn finish(sink: &ResponseSink, status: StatusCode, body: Option<String>) {
    // `None` means the callback already wrote the response
    let Some(body) = body else {
        return;
    };
    if let Err(e) = send_page(sink, status, body) {
        logger::log_warning(&format!("Could not send {} page: {e}", status.as_u16()));
    }
}

use actix_web::{HttpRequest, HttpResponse};

use crate::error::NewsletterError;

/// CORS preflight. Answered before any storage work.
#[tracing::instrument(name = "Preflight handler")]
pub async fn handle_preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

#[tracing::instrument(
    name = "Rejecting an unsupported method",
    skip(req),
    fields(method = %req.method())
)]
pub async fn handle_unsupported_method(req: HttpRequest) -> Result<HttpResponse, NewsletterError> {
    tracing::warn!("Unsupported HTTP method {}", req.method());

    Err(NewsletterError::MethodNotAllowed(req.method().to_string()))
}

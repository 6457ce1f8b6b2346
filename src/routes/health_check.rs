use actix_web::{HttpRequest, HttpResponse, Responder};

/// Liveness probe, answers without touching the database
#[tracing::instrument(name = "Health Check handler", skip(_req))]
pub async fn health_check(_req: HttpRequest) -> impl Responder {
    HttpResponse::Ok()
}

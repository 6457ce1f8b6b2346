use actix_web::{web, HttpRequest, HttpResponse};
use sqlx::PgPool;

use crate::{
    domain::{client_ip::ClientIp, new_subscriber::NewSubscriber},
    error::NewsletterError,
    storage::{self, DatabaseTarget},
};

#[derive(serde::Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: &'static str,
    pub subscriber_id: i64,
}

#[tracing::instrument(
    name = "Creating a new subscriber handler",
    skip(req, body, db_pool, db_target),
    fields(
        subscriber_email = tracing::field::Empty,
        subscriber_id = tracing::field::Empty
    )
)]
pub async fn handle_subscribe(
    req: HttpRequest,
    body: Result<web::Bytes, actix_web::Error>,
    db_pool: web::Data<PgPool>,
    db_target: web::Data<DatabaseTarget>,
) -> Result<HttpResponse, NewsletterError> {
    // Oversized or unreadable payloads are answered with the JSON envelope as well
    let body = body.map_err(|err| {
        tracing::warn!("Failed to read the request body: {}", err);
        NewsletterError::InvalidInput(format!("invalid request body: {}", err))
    })?;
    let mut conn = storage::open_connection(&db_pool, &db_target).await?;

    let new_subscriber =
        NewSubscriber::parse(&body, ClientIp::from_request(&req)).map_err(|err| {
            tracing::warn!("Validation error: {}", err);
            err
        })?;
    tracing::Span::current().record(
        "subscriber_email",
        tracing::field::display(&new_subscriber.email),
    );

    if storage::find_subscriber_id(&mut conn, new_subscriber.email.as_ref())
        .await?
        .is_some()
    {
        tracing::info!("Email {} is already subscribed", new_subscriber.email);
        return Err(NewsletterError::Conflict("already subscribed".into()));
    }

    // A concurrent request can insert the same email between the check above and this insert.
    // The unique constraint rejects the loser, which is reported as a conflict too.
    let subscriber_id = storage::insert_subscriber(&mut conn, &new_subscriber)
        .await
        .map_err(|err| {
            if storage::is_unique_violation(&err) {
                NewsletterError::Conflict("already subscribed".into())
            } else {
                NewsletterError::Storage(err)
            }
        })?;
    tracing::Span::current().record("subscriber_id", subscriber_id);

    tracing::info!(
        "Newsletter subscription: email = {}, ip = {}, id = {}",
        new_subscriber.email,
        new_subscriber.ip_address.as_ref(),
        subscriber_id
    );

    Ok(HttpResponse::Ok().json(SubscribeResponse {
        success: true,
        message: "subscribed successfully",
        subscriber_id,
    }))
}

use actix_web::{web, HttpRequest, HttpResponse};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;

use crate::{
    domain::{
        stats::{SubscriberStats, RECENT_SUBSCRIBERS_LIMIT},
        subscriber::Subscriber,
    },
    error::NewsletterError,
    routes::{export_csv, MessageResponse},
    storage::{self, DatabaseTarget},
};

/// What a GET request asks for, decided from its query string alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    List,
    ExportCsv,
    Stats,
    Delete(i64),
    Check,
    Invalid,
}

impl AdminAction {
    /// Selectors are checked in a fixed order; the first one that matches wins.
    pub fn from_query(query: &HashMap<String, String>) -> AdminAction {
        if query.get("admin").map(String::as_str) == Some("view") {
            return AdminAction::List;
        }
        if query.get("export").map(String::as_str) == Some("csv") {
            return AdminAction::ExportCsv;
        }
        if query.contains_key("stats") {
            return AdminAction::Stats;
        }
        if query.contains_key("delete") {
            if let Some(id) = query.get("id").filter(|id| !id.is_empty()) {
                return AdminAction::Delete(coerce_id(id));
            }
        }
        if query.contains_key("check") {
            return AdminAction::Check;
        }

        AdminAction::Invalid
    }
}

/// Lenient integer parsing: optional sign and leading digits, anything else is 0.
pub fn coerce_id(raw: &str) -> i64 {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let digits: String = digits.chars().take_while(char::is_ascii_digit).collect();

    match digits.parse::<i64>() {
        Ok(id) if negative => -id,
        Ok(id) => id,
        Err(_) => 0,
    }
}

#[derive(serde::Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub emails: Vec<Subscriber>,
    pub total: usize,
}

#[derive(serde::Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: SubscriberStats,
}

#[derive(serde::Serialize)]
pub struct ServerInfo {
    pub runtime_version: String,
    pub database_version: String,
    pub database: String,
    pub host: String,
}

#[derive(serde::Serialize)]
pub struct CheckResponse {
    pub success: bool,
    pub message: &'static str,
    pub server_info: ServerInfo,
}

#[tracing::instrument(
    name = "Newsletter admin handler",
    skip(req, db_pool, db_target),
    fields(query = %req.query_string())
)]
pub async fn handle_admin(
    req: HttpRequest,
    db_pool: web::Data<PgPool>,
    db_target: web::Data<DatabaseTarget>,
) -> Result<HttpResponse, NewsletterError> {
    let mut conn = storage::open_connection(&db_pool, &db_target).await?;

    let query = web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map_err(|err| NewsletterError::InvalidInput(format!("invalid query string: {}", err)))?;

    match AdminAction::from_query(&query) {
        AdminAction::List => list(&mut conn).await,
        AdminAction::ExportCsv => export_csv(&mut conn).await,
        AdminAction::Stats => stats(&mut conn).await,
        AdminAction::Delete(id) => delete(&mut conn, id).await,
        AdminAction::Check => check(&mut conn, &db_target).await,
        AdminAction::Invalid => Err(NewsletterError::InvalidInput(
            "invalid GET parameters, use ?check for testing".into(),
        )),
    }
}

async fn list(conn: &mut PgConnection) -> Result<HttpResponse, NewsletterError> {
    let emails = storage::list_subscribers(conn).await?;

    Ok(HttpResponse::Ok().json(ListResponse {
        success: true,
        total: emails.len(),
        emails,
    }))
}

async fn stats(conn: &mut PgConnection) -> Result<HttpResponse, NewsletterError> {
    let counts = storage::count_subscribers(conn).await?;
    let recent = storage::list_subscriber_summaries(conn, Some(RECENT_SUBSCRIBERS_LIMIT)).await?;

    Ok(HttpResponse::Ok().json(StatsResponse {
        success: true,
        stats: SubscriberStats::new(counts, recent),
    }))
}

async fn delete(conn: &mut PgConnection, id: i64) -> Result<HttpResponse, NewsletterError> {
    if storage::delete_subscriber(conn, id).await? == 0 {
        tracing::info!("No subscriber with id {} to delete", id);
        return Err(NewsletterError::NotFound("subscriber not found".into()));
    }

    tracing::info!("Subscriber {} deleted", id);

    Ok(HttpResponse::Ok().json(MessageResponse {
        success: true,
        message: "deleted successfully",
    }))
}

async fn check(
    conn: &mut PgConnection,
    db_target: &DatabaseTarget,
) -> Result<HttpResponse, NewsletterError> {
    let database_version = storage::server_version(conn).await?;

    Ok(HttpResponse::Ok().json(CheckResponse {
        success: true,
        message: "API is working",
        server_info: ServerInfo {
            runtime_version: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            database_version,
            database: db_target.database.clone(),
            host: db_target.host.clone(),
        },
    }))
}

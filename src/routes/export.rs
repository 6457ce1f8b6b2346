use actix_web::{http::header, HttpResponse};
use chrono::Utc;
use sqlx::PgConnection;
use std::borrow::Cow;

use crate::{domain::subscriber::SubscriberSummary, error::NewsletterError, storage};

const CSV_DELIMITER: &str = ";";
const CSV_HEADER: [&str; 2] = ["Email", "Data Abonarii"];
const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[tracing::instrument(name = "Exporting subscribers as CSV", skip(conn))]
pub async fn export_csv(conn: &mut PgConnection) -> Result<HttpResponse, NewsletterError> {
    let subscribers = storage::list_subscriber_summaries(conn, None).await?;
    let filename = format!(
        "newsletter_subscribers_{}.csv",
        Utc::now().format("%Y-%m-%d")
    );

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", filename),
        ))
        .body(render_csv(&subscribers)))
}

/// Semicolon separated, header first, one line per subscriber in the given order.
pub fn render_csv(subscribers: &[SubscriberSummary]) -> String {
    let mut csv = csv_line(&CSV_HEADER);

    for subscriber in subscribers {
        let created_at = subscriber.created_at.format(CREATED_AT_FORMAT).to_string();
        csv.push_str(&csv_line(&[subscriber.email.as_str(), created_at.as_str()]));
    }

    csv
}

fn csv_line(fields: &[&str]) -> String {
    let mut line = fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(CSV_DELIMITER);
    line.push('\n');
    line
}

/// Quotes a field only when it holds the delimiter, a quote or a line break.
fn csv_field(field: &str) -> Cow<'_, str> {
    let needs_quotes = field.contains(CSV_DELIMITER) || field.contains(&['"', '\n', '\r'][..]);

    if needs_quotes {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

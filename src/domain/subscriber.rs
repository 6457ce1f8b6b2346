use chrono::{DateTime, Utc};

/// A full row of `newsletter_emails`.
#[derive(Debug, serde::Serialize, sqlx::FromRow)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub ip_address: Option<String>,
}

/// The columns shown in exports and in the recent subscribers list.
#[derive(Debug, serde::Serialize, sqlx::FromRow)]
pub struct SubscriberSummary {
    pub email: String,
    pub created_at: DateTime<Utc>,
}

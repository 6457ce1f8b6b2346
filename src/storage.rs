use sqlx::pool::PoolConnection;
use sqlx::{Connection, PgConnection, PgPool, Postgres};

use crate::domain::new_subscriber::NewSubscriber;
use crate::domain::stats::SubscriberCounts;
use crate::domain::subscriber::{Subscriber, SubscriberSummary};
use crate::error::NewsletterError;

const UNIQUE_VIOLATION: &str = "23505";
// Advisory lock held while the table is created, so parallel bootstraps run one at a time
const SCHEMA_LOCK_KEY: i64 = 0x6e65_7773_6c65_7474;

/// Non-secret description of the configured database, reported back when bootstrapping fails.
#[derive(Debug, Clone)]
pub struct DatabaseTarget {
    pub host: String,
    pub database: String,
}

/// Acquires the connection a request works with and makes sure the table exists.
///
/// The connection goes back to the pool when the returned value is dropped, so every
/// early return in a handler releases it.
#[tracing::instrument(name = "Opening a storage connection", skip(db_pool, target))]
pub async fn open_connection(
    db_pool: &PgPool,
    target: &DatabaseTarget,
) -> Result<PoolConnection<Postgres>, NewsletterError> {
    let bootstrap_error = |source: sqlx::Error| {
        tracing::error!(
            host = %target.host,
            database = %target.database,
            "Database connection error: {:?}",
            source
        );
        NewsletterError::Bootstrap {
            source,
            host: target.host.clone(),
            database: target.database.clone(),
        }
    };

    let mut conn = db_pool.acquire().await.map_err(bootstrap_error)?;
    ensure_schema(&mut conn).await.map_err(bootstrap_error)?;

    Ok(conn)
}

#[tracing::instrument(name = "Ensuring the newsletter_emails table exists", skip(conn))]
pub async fn ensure_schema(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    let mut transaction = conn.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *transaction)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS newsletter_emails (
            id BIGSERIAL PRIMARY KEY,
            email VARCHAR(255) UNIQUE NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            ip_address VARCHAR(45)
        )
        "#,
    )
    .execute(&mut *transaction)
    .await?;

    transaction.commit().await
}

#[tracing::instrument(name = "Looking up a subscriber by email", skip(conn))]
pub async fn find_subscriber_id(
    conn: &mut PgConnection,
    email: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM newsletter_emails WHERE email = $1")
        .bind(email)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            err
        })
}

#[tracing::instrument(
    name = "Insert a new subscriber into the database",
    skip(new_subscriber, conn),
    fields(
        subscriber_email = %new_subscriber.email,
        ip_address = %new_subscriber.ip_address.as_ref()
    )
)]
pub async fn insert_subscriber(
    conn: &mut PgConnection,
    new_subscriber: &NewSubscriber,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO newsletter_emails (email, ip_address)
        VALUES ($1, $2)
        RETURNING id
        "#,
    )
    .bind(new_subscriber.email.as_ref())
    .bind(new_subscriber.ip_address.as_ref())
    .fetch_one(&mut *conn)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })
}

#[tracing::instrument(name = "Listing all subscribers", skip(conn))]
pub async fn list_subscribers(conn: &mut PgConnection) -> Result<Vec<Subscriber>, sqlx::Error> {
    sqlx::query_as::<_, Subscriber>(
        r#"
        SELECT id, email, created_at, ip_address
        FROM newsletter_emails
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })
}

/// Newest first. `limit` of `None` returns every row.
#[tracing::instrument(name = "Listing subscriber summaries", skip(conn))]
pub async fn list_subscriber_summaries(
    conn: &mut PgConnection,
    limit: Option<i64>,
) -> Result<Vec<SubscriberSummary>, sqlx::Error> {
    sqlx::query_as::<_, SubscriberSummary>(
        r#"
        SELECT email, created_at
        FROM newsletter_emails
        ORDER BY created_at DESC, id DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(&mut *conn)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })
}

/// All three counts come from one snapshot so `this_week <= this_month <= total` holds.
#[tracing::instrument(name = "Counting subscribers", skip(conn))]
pub async fn count_subscribers(conn: &mut PgConnection) -> Result<SubscriberCounts, sqlx::Error> {
    sqlx::query_as::<_, SubscriberCounts>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE created_at >= now() - INTERVAL '7 days') AS this_week,
            COUNT(*) FILTER (WHERE created_at >= now() - INTERVAL '30 days') AS this_month
        FROM newsletter_emails
        "#,
    )
    .fetch_one(&mut *conn)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })
}

/// Returns how many rows were removed: 1 when the id existed, 0 otherwise.
#[tracing::instrument(name = "Deleting a subscriber", skip(conn))]
pub async fn delete_subscriber(conn: &mut PgConnection, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM newsletter_emails WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            err
        })?;

    Ok(result.rows_affected())
}

#[tracing::instrument(name = "Fetching the database server version", skip(conn))]
pub async fn server_version(conn: &mut PgConnection) -> Result<String, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT current_setting('server_version')")
        .fetch_one(&mut *conn)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            err
        })
}

/// True when the database rejected a write because of a unique constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

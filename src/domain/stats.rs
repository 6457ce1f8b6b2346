use crate::domain::subscriber::SubscriberSummary;

pub const RECENT_SUBSCRIBERS_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct SubscriberCounts {
    pub total: i64,
    pub this_week: i64,
    pub this_month: i64,
}

#[derive(Debug, serde::Serialize)]
pub struct SubscriberStats {
    pub total_subscribers: i64,
    pub this_week: i64,
    pub this_month: i64,
    pub growth_rate: f64,
    pub recent_subscribers: Vec<SubscriberSummary>,
}

impl SubscriberStats {
    pub fn new(counts: SubscriberCounts, recent_subscribers: Vec<SubscriberSummary>) -> Self {
        Self {
            total_subscribers: counts.total,
            this_week: counts.this_week,
            this_month: counts.this_month,
            growth_rate: growth_rate(counts.this_week, counts.total),
            recent_subscribers,
        }
    }
}

/// Share of all subscribers who joined this week, as a percentage with two decimals.
pub fn growth_rate(this_week: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }

    let rate = this_week as f64 / total as f64 * 100.0;

    (rate * 100.0).round() / 100.0
}

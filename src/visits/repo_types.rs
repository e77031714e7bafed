use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Visit record in the ledger. Never mutated after insert.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Visit {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub visited_at: OffsetDateTime,
    pub note: Option<String>,
    #[serde(skip_serializing)]
    pub scan_id: Option<String>, // idempotency key supplied by the scanner
}

#[derive(Debug, Clone)]
pub struct NewVisit {
    pub user_id: Uuid,
    pub note: Option<String>,
    pub scan_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppendOutcome {
    pub visit: Visit,
    pub total: i64,
    pub duplicate: bool, // scan_id was already recorded; nothing appended
}

#[derive(Debug, Clone, FromRow)]
pub struct VisitSummary {
    pub user_id: Uuid,
    pub visits_count: i64,
    pub last_visit: Option<OffsetDateTime>,
}

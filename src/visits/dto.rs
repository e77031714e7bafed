use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{rewards::dto::ProgressView, visits::repo_types::Visit};

/// Request body sent by the staff scanner.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub qr_token: Option<String>,
    pub scan_id: Option<String>, // idempotency key for one physical tap
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanClient {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub message: String,
    pub visits: i64,
    pub reward: Option<String>,
    pub progress: ProgressView,
    pub duplicate: bool,
    pub client: ScanClient,
}

#[derive(Debug, Serialize)]
pub struct VisitView {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub note: Option<String>,
}

impl From<Visit> for VisitView {
    fn from(v: Visit) -> Self {
        Self {
            id: v.id,
            date: v.visited_at,
            note: v.note,
        }
    }
}

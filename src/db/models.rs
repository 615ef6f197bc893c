use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a persisted assessment row, mirroring the wire strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::InProgress => "in-progress",
            RunStatus::Completed => "completed",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

/// One assessment row as stored in the `assessments` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub id: String,
    pub teacher_name: String,
    pub teacher_email: Option<String>,
    pub institution: String,
    pub subject: String,
    pub duration_minutes: u32,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub snapshot_count: u64,
    pub overall_score: f64,
    pub eligibility: Option<String>,
}

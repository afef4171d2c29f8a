//! Training job records linking a (project, dataset) pair to a remote job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// At most one row exists per `(project_id, dataset_id)`; `job_id` is set at
/// most once and then reused for every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingJob {
    pub id: i64,
    pub project_id: i64,
    pub dataset_id: i64,
    /// Remote scheduler job identifier.
    pub job_id: Option<i64>,
    /// Caller-supplied parameters, stored verbatim.
    pub parameters: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

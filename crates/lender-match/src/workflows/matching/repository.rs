use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationId, MatchingResult};
use super::evaluation::LenderPolicy;

/// Stored outcome of one complete matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingRecord {
    pub application: Application,
    pub results: Vec<MatchingResult>,
    pub evaluated_at: DateTime<Utc>,
}

impl MatchingRecord {
    pub fn application_id(&self) -> &ApplicationId {
        &self.application.application_id
    }

    pub fn eligible_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.is_eligible())
            .count()
    }
}

/// Read side of the lender policy store.
pub trait PolicyRepository: Send + Sync {
    /// Active policies as of the call. Callers hold the returned `Arc`s for a whole run,
    /// so later edits to the repository never leak into it.
    fn active_policies(&self) -> Result<Vec<Arc<LenderPolicy>>, RepositoryError>;
}

/// Result persistence keyed by application id.
pub trait ResultStore: Send + Sync {
    /// Idempotent: storing the same application again replaces the earlier record.
    fn store(&self, record: MatchingRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<MatchingRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::repository::{NewSubmission, StoreError, SubmissionRecord, SubmissionStore};

/// Store kept in process memory, for tests and local dry runs.
#[derive(Debug, Clone)]
pub struct InMemorySubmissionStore {
    rows: Arc<Mutex<Vec<SubmissionRecord>>>,
    reachable: bool,
    accept_inserts: bool,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            reachable: true,
            accept_inserts: true,
        }
    }

    /// Every call fails as if the database timed out.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Connects fine but refuses every insert.
    pub fn rejecting_inserts() -> Self {
        Self {
            accept_inserts: false,
            ..Self::new()
        }
    }

    pub async fn records(&self) -> Vec<SubmissionRecord> {
        self.rows.lock().await.clone()
    }
}

impl Default for InMemorySubmissionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn check_connection(&self) -> Result<(), StoreError> {
        if self.reachable {
            Ok(())
        } else {
            Err(StoreError::from(sqlx::Error::PoolTimedOut))
        }
    }

    async fn insert_submission(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionRecord, StoreError> {
        self.check_connection().await?;
        if !self.accept_inserts {
            return Err(StoreError::from(sqlx::Error::Protocol(
                "insert rejected".to_string(),
            )));
        }

        let mut rows = self.rows.lock().await;
        let id = rows.len() as i64 + 1;
        let record = SubmissionRecord::from_new(id, submission, Utc::now().to_rfc3339());
        rows.push(record.clone());
        Ok(record)
    }
}

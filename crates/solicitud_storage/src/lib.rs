pub mod memory;
pub mod repository;

pub use memory::InMemorySubmissionStore;
pub use repository::{
    NewSubmission, SqliteSubmissionStore, StorageConfig, StoreError, SubmissionRecord,
    SubmissionStore,
};

pub mod folio;
pub mod response;
pub mod slot;
pub mod submission;

pub use folio::{Folio, FolioOutOfRange, FOLIO_MAX, FOLIO_MIN};
pub use response::SubmissionResponse;
pub use slot::{DocumentSlot, SlotKind};
pub use submission::{
    Applicant, StagedDocument, Submission, SubmissionDraft, ValidationError, FIELD_EMAIL,
    FIELD_NOMBRE,
};

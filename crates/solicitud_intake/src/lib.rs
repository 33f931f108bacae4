pub mod app;
pub mod error;
pub mod form;
pub mod notifications;
pub mod submit;

pub use app::{build_router, AppState, IntakeConfig, DEFAULT_MAX_UPLOAD_BYTES, SUBMIT_PATH};
pub use error::{IntakeError, CONNECTIVITY_MESSAGE, INTERNAL_MESSAGE};
pub use form::render_intake_form;

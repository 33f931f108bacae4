use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use solicitud_contract::{SubmissionResponse, ValidationError};
use solicitud_mailer::MailError;
use solicitud_storage::StoreError;
use solicitud_uploads::UploadError;
use thiserror::Error;
use tracing::{error, warn};

pub const CONNECTIVITY_MESSAGE: &str =
    "Error de conexión con la base de datos. Inténtelo de nuevo más tarde.";
pub const INTERNAL_MESSAGE: &str = "Error interno del servidor";

/// Everything that can end a submission early. Only the public message
/// reaches the client; the full error is logged.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("database unreachable: {0}")]
    Connectivity(#[source] StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntakeError {
    pub fn status(&self) -> StatusCode {
        match self {
            IntakeError::Validation(_) => StatusCode::BAD_REQUEST,
            IntakeError::Connectivity(_) | IntakeError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            IntakeError::Validation(reason) => reason.to_string(),
            IntakeError::Connectivity(_) => CONNECTIVITY_MESSAGE.to_string(),
            IntakeError::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl From<StoreError> for IntakeError {
    fn from(error: StoreError) -> Self {
        if error.is_connectivity() {
            IntakeError::Connectivity(error)
        } else {
            IntakeError::Internal(error.into())
        }
    }
}

impl From<MailError> for IntakeError {
    fn from(error: MailError) -> Self {
        IntakeError::Internal(error.into())
    }
}

impl From<UploadError> for IntakeError {
    fn from(error: UploadError) -> Self {
        IntakeError::Internal(error.into())
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        match &self {
            IntakeError::Validation(reason) => {
                warn!(reason = %reason, "submission rejected");
            }
            IntakeError::Connectivity(err) => {
                error!(error = %err, "submission failed: database unreachable");
            }
            IntakeError::Internal(err) => {
                error!(error = %format!("{err:#}"), "submission failed");
            }
        }
        (
            self.status(),
            Json(SubmissionResponse::rejected(self.public_message())),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{IntakeError, CONNECTIVITY_MESSAGE, INTERNAL_MESSAGE};
    use axum::http::StatusCode;
    use solicitud_contract::ValidationError;
    use solicitud_mailer::MailError;
    use solicitud_storage::{InMemorySubmissionStore, SubmissionStore};

    #[test]
    fn validation_errors_are_bad_requests_with_their_message() {
        let err = IntakeError::from(ValidationError::MissingFields);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Todos los campos son obligatorios");
    }

    #[tokio::test]
    async fn store_timeouts_become_connectivity_errors() {
        let timeout = InMemorySubmissionStore::unreachable()
            .check_connection()
            .await
            .expect_err("unreachable store");
        let err = IntakeError::from(timeout);
        assert!(matches!(err, IntakeError::Connectivity(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), CONNECTIVITY_MESSAGE);
    }

    #[test]
    fn mail_failures_stay_generic() {
        let err = IntakeError::from(MailError::Transport("554 rejected by relay".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), INTERNAL_MESSAGE);
        assert!(!err.public_message().contains("554"));
    }
}

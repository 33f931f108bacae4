use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use solicitud_contract::{
    DocumentSlot, Folio, StagedDocument, Submission, SubmissionDraft, ValidationError,
};
use solicitud_storage::NewSubmission;
use solicitud_uploads::StagedUploads;
use tracing::{debug, error, info};

use crate::app::AppState;
use crate::error::IntakeError;
use crate::notifications::{admin_mail, applicant_mail};

const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// Reads the whole multipart body, streaming file parts into `uploads`, and
/// validates the result.
pub async fn read_submission(
    mut multipart: Multipart,
    uploads: &mut StagedUploads,
) -> Result<Submission, IntakeError> {
    let mut draft = SubmissionDraft::new();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(original_name) = field.file_name().map(str::to_owned) else {
            let value = field.text().await.map_err(multipart_error)?;
            if !draft.set_text(&name, value) {
                debug!(field = %name, "ignoring unknown text field");
            }
            continue;
        };

        // An empty file input still posts a file part, with `filename=""`.
        if original_name.is_empty() {
            continue;
        }

        let slot = DocumentSlot::from_field_name(&name)
            .ok_or_else(|| ValidationError::UnexpectedFile(name.clone()))?;
        if draft.has_document(slot) {
            return Err(ValidationError::DuplicateFile(name).into());
        }

        let content_type = field
            .content_type()
            .unwrap_or(UNKNOWN_CONTENT_TYPE)
            .to_string();

        let mut staged = uploads.create().await?;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            staged.write_chunk(&chunk).await?;
        }
        let (path, size) = staged.finish().await?;

        debug!(field = %name, size, content_type = %content_type, "file part staged");
        draft.attach(StagedDocument {
            slot,
            original_name,
            content_type,
            path,
            size,
        })?;
    }

    Ok(draft.validate()?)
}

/// Runs the side effects for a validated submission: connectivity check,
/// admin mail, applicant mail, then the insert.
///
/// The mails and the insert are not atomic. When the insert fails the
/// applicant has already been told about a folio that was never stored.
pub async fn record_submission(
    state: &AppState,
    submission: &Submission,
    folio: Folio,
) -> Result<(), IntakeError> {
    state.store.check_connection().await?;

    let admin = admin_mail(&state.config.admin_email, submission, folio);
    state.mailer.send(&admin).await?;
    info!(folio = %folio, "admin notification sent");

    let applicant = applicant_mail(submission, folio);
    state.mailer.send(&applicant).await?;
    info!(folio = %folio, "applicant confirmation sent");

    let row = NewSubmission::from_submission(submission, folio);
    match state.store.insert_submission(&row).await {
        Ok(record) => {
            info!(folio = %folio, id = record.id, "submission recorded");
            Ok(())
        }
        Err(err) => {
            error!(
                folio = %folio,
                email = %submission.applicant.email,
                error = %err,
                "notifications already sent for a submission that was not persisted"
            );
            Err(err.into())
        }
    }
}

fn multipart_error(err: MultipartError) -> IntakeError {
    debug!(error = %err, "unreadable multipart body");
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::PayloadTooLarge.into()
    } else {
        ValidationError::MalformedBody.into()
    }
}

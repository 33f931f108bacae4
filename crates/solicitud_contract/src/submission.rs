use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slot::{DocumentSlot, SlotKind};

pub const FIELD_NOMBRE: &str = "nombre";
pub const FIELD_EMAIL: &str = "email";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Todos los campos son obligatorios")]
    MissingFields,
    #[error("Las fotografías deben ser imágenes (JPEG o PNG)")]
    InvalidImageType,
    #[error("El acta de nacimiento y el oficio de solicitud deben ser archivos PDF")]
    InvalidDocumentType,
    #[error("Solo se permite un archivo por campo ({0})")]
    DuplicateFile(String),
    #[error("Campo de archivo no reconocido: {0}")]
    UnexpectedFile(String),
    #[error("Los archivos exceden el tamaño máximo permitido")]
    PayloadTooLarge,
    #[error("La solicitud no pudo ser procesada")]
    MalformedBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub nombre: String,
    pub email: String,
}

/// A file part already written to temporary storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedDocument {
    pub slot: DocumentSlot,
    pub original_name: String,
    pub content_type: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Form state accumulated while the multipart body is being read.
#[derive(Debug, Clone, Default)]
pub struct SubmissionDraft {
    nombre: Option<String>,
    email: Option<String>,
    documents: BTreeMap<DocumentSlot, StagedDocument>,
}

impl SubmissionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a text field. Returns `false` for fields the form does not
    /// define; those are ignored.
    pub fn set_text(&mut self, field: &str, value: String) -> bool {
        match field {
            FIELD_NOMBRE => self.nombre = Some(value),
            FIELD_EMAIL => self.email = Some(value),
            _ => return false,
        }
        true
    }

    pub fn attach(&mut self, document: StagedDocument) -> Result<(), ValidationError> {
        if self.documents.contains_key(&document.slot) {
            return Err(ValidationError::DuplicateFile(
                document.slot.field_name().to_string(),
            ));
        }
        self.documents.insert(document.slot, document);
        Ok(())
    }

    pub fn has_document(&self, slot: DocumentSlot) -> bool {
        self.documents.contains_key(&slot)
    }

    /// Presence first, then image types, then PDF types.
    pub fn validate(mut self) -> Result<Submission, ValidationError> {
        let nombre = non_blank(self.nombre.take());
        let email = non_blank(self.email.take());
        let (Some(nombre), Some(email)) = (nombre, email) else {
            return Err(ValidationError::MissingFields);
        };

        let mut take = |slot: DocumentSlot| {
            self.documents
                .remove(&slot)
                .ok_or(ValidationError::MissingFields)
        };
        let selfie = take(DocumentSlot::FotoSelfie)?;
        let identificacion = take(DocumentSlot::Identificacion)?;
        let acta_nacimiento = take(DocumentSlot::ActaNacimiento)?;
        let oficio_solicitud = take(DocumentSlot::OficioSolicitud)?;

        let submission = Submission {
            applicant: Applicant { nombre, email },
            selfie,
            identificacion,
            acta_nacimiento,
            oficio_solicitud,
        };

        if !submission.kind_matches(SlotKind::Image) {
            return Err(ValidationError::InvalidImageType);
        }
        if !submission.kind_matches(SlotKind::Pdf) {
            return Err(ValidationError::InvalidDocumentType);
        }
        Ok(submission)
    }
}

/// A complete, type-checked submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub applicant: Applicant,
    pub selfie: StagedDocument,
    pub identificacion: StagedDocument,
    pub acta_nacimiento: StagedDocument,
    pub oficio_solicitud: StagedDocument,
}

impl Submission {
    pub fn document(&self, slot: DocumentSlot) -> &StagedDocument {
        match slot {
            DocumentSlot::FotoSelfie => &self.selfie,
            DocumentSlot::Identificacion => &self.identificacion,
            DocumentSlot::ActaNacimiento => &self.acta_nacimiento,
            DocumentSlot::OficioSolicitud => &self.oficio_solicitud,
        }
    }

    /// Documents in form order.
    pub fn documents(&self) -> [&StagedDocument; 4] {
        DocumentSlot::ALL.map(|slot| self.document(slot))
    }

    fn kind_matches(&self, kind: SlotKind) -> bool {
        self.documents()
            .into_iter()
            .filter(|doc| doc.slot.kind() == kind)
            .all(|doc| kind.accepts(&doc.content_type))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

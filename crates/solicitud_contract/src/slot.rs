use mime::Mime;
use serde::{Deserialize, Serialize};

/// One of the four file parts a submission must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentSlot {
    FotoSelfie,
    Identificacion,
    ActaNacimiento,
    OficioSolicitud,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Image,
    Pdf,
}

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 4] = [
        DocumentSlot::FotoSelfie,
        DocumentSlot::Identificacion,
        DocumentSlot::ActaNacimiento,
        DocumentSlot::OficioSolicitud,
    ];

    /// Multipart field name the form posts this slot under.
    pub fn field_name(self) -> &'static str {
        match self {
            DocumentSlot::FotoSelfie => "fotoSelfie",
            DocumentSlot::Identificacion => "identificacion",
            DocumentSlot::ActaNacimiento => "actaNacimiento",
            DocumentSlot::OficioSolicitud => "oficioSolicitud",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.field_name() == name)
    }

    /// Label used when listing the attachments in the admin notification.
    pub fn label(self) -> &'static str {
        match self {
            DocumentSlot::FotoSelfie => "Fotografía (selfie)",
            DocumentSlot::Identificacion => "Identificación",
            DocumentSlot::ActaNacimiento => "Acta de nacimiento",
            DocumentSlot::OficioSolicitud => "Oficio de solicitud",
        }
    }

    pub fn form_label(self) -> &'static str {
        match self {
            DocumentSlot::Identificacion => "Fotografía de identificación",
            other => other.label(),
        }
    }

    pub fn kind(self) -> SlotKind {
        match self {
            DocumentSlot::FotoSelfie | DocumentSlot::Identificacion => SlotKind::Image,
            DocumentSlot::ActaNacimiento | DocumentSlot::OficioSolicitud => SlotKind::Pdf,
        }
    }
}

impl SlotKind {
    /// Checks the client-declared content type of a part. Only the essence
    /// (`type/subtype`) is compared; parameters are ignored.
    pub fn accepts(self, content_type: &str) -> bool {
        let Ok(parsed) = content_type.trim().parse::<Mime>() else {
            return false;
        };
        let essence = parsed.essence_str();
        self.accepted_types()
            .iter()
            .any(|accepted| accepted.essence_str().eq_ignore_ascii_case(essence))
    }

    pub fn accepted_types(self) -> Vec<Mime> {
        match self {
            SlotKind::Image => vec![mime::IMAGE_JPEG, mime::IMAGE_PNG],
            SlotKind::Pdf => vec![mime::APPLICATION_PDF],
        }
    }

    /// Value for the HTML `accept` attribute. A hint for the file picker only.
    pub fn accept_hint(self) -> &'static str {
        match self {
            SlotKind::Image => "image/*",
            SlotKind::Pdf => "application/pdf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentSlot, SlotKind};

    #[test]
    fn field_names_resolve_back_to_slots() {
        for slot in DocumentSlot::ALL {
            assert_eq!(DocumentSlot::from_field_name(slot.field_name()), Some(slot));
        }
        assert_eq!(DocumentSlot::from_field_name("foto"), None);
        assert_eq!(DocumentSlot::from_field_name("FotoSelfie"), None);
    }

    #[test]
    fn images_accept_jpeg_and_png_only() {
        assert!(SlotKind::Image.accepts("image/jpeg"));
        assert!(SlotKind::Image.accepts("image/png"));
        assert!(SlotKind::Image.accepts("IMAGE/PNG"));
        assert!(!SlotKind::Image.accepts("image/gif"));
        assert!(!SlotKind::Image.accepts("application/pdf"));
        assert!(!SlotKind::Image.accepts(""));
    }

    #[test]
    fn documents_accept_pdf_with_parameters() {
        assert!(SlotKind::Pdf.accepts("application/pdf"));
        assert!(SlotKind::Pdf.accepts("application/pdf; name=\"acta.pdf\""));
        assert!(!SlotKind::Pdf.accepts("image/jpeg"));
        assert!(!SlotKind::Pdf.accepts("application/octet-stream"));
        assert!(!SlotKind::Pdf.accepts("not a mime"));
    }

    #[test]
    fn slot_kinds_split_images_from_documents() {
        assert_eq!(DocumentSlot::FotoSelfie.kind(), SlotKind::Image);
        assert_eq!(DocumentSlot::Identificacion.kind(), SlotKind::Image);
        assert_eq!(DocumentSlot::ActaNacimiento.kind(), SlotKind::Pdf);
        assert_eq!(DocumentSlot::OficioSolicitud.kind(), SlotKind::Pdf);
    }
}

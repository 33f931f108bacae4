use solicitud_contract::{DocumentSlot, Folio, StagedDocument, Submission};
use solicitud_mailer::{MailAttachment, OutgoingMail};

/// Notification for the office inbox, carrying all four documents.
pub fn admin_mail(admin_email: &str, submission: &Submission, folio: Folio) -> OutgoingMail {
    let applicant = &submission.applicant;
    let nombre = escape_html(&applicant.nombre);
    let email = escape_html(&applicant.email);

    let items: String = submission
        .documents()
        .iter()
        .map(|doc| {
            format!(
                "<li>{}: {}</li>\n",
                doc.slot.label(),
                escape_html(&attachment_name(doc))
            )
        })
        .collect();

    OutgoingMail {
        to: admin_email.to_string(),
        subject: format!("Solicitud recibida con Folio: {folio}"),
        text: format!(
            "Se ha recibido una nueva solicitud:\n\nNombre: {}\nEmail: {}\nFolio: {folio}",
            applicant.nombre, applicant.email
        ),
        html: format!(
            "<h1>Solicitud recibida con Folio: {folio}</h1>\n\
             <p><strong>Nombre:</strong> {nombre}</p>\n\
             <p><strong>Email:</strong> {email}</p>\n\
             <p><strong>Folio:</strong> {folio}</p>\n\
             <p>Archivos adjuntos:</p>\n\
             <ul>\n{items}</ul>\n"
        ),
        attachments: submission
            .documents()
            .iter()
            .map(|doc| MailAttachment {
                filename: attachment_name(doc),
                content_type: doc.content_type.clone(),
                path: doc.path.clone(),
            })
            .collect(),
    }
}

/// Confirmation for the applicant. No attachments.
pub fn applicant_mail(submission: &Submission, folio: Folio) -> OutgoingMail {
    let applicant = &submission.applicant;
    let nombre = escape_html(&applicant.nombre);

    OutgoingMail {
        to: applicant.email.clone(),
        subject: format!("Tu solicitud ha sido recibida con el Folio: {folio}"),
        text: format!(
            "Estimado {},\n\nHemos recibido su solicitud. Su folio es: {folio}. \
             Le recordamos que dicha solicitud será atendida a la brevedad posible.\n\n\
             Gracias por su paciencia.",
            applicant.nombre
        ),
        html: format!(
            "<h1>Tu solicitud ha sido recibida</h1>\n\
             <p>Estimado {nombre},</p>\n\
             <p>Hemos recibido su solicitud. Su folio es: <strong>{folio}</strong>.</p>\n\
             <p>Le recordamos que dicha solicitud será atendida a la brevedad posible.</p>\n\
             <p>Gracias por su paciencia.</p>\n"
        ),
        attachments: Vec::new(),
    }
}

// Browsers may post a part without a usable file name.
fn attachment_name(doc: &StagedDocument) -> String {
    let name = doc.original_name.trim();
    if name.is_empty() {
        default_name(doc.slot).to_string()
    } else {
        name.to_string()
    }
}

fn default_name(slot: DocumentSlot) -> &'static str {
    match slot {
        DocumentSlot::FotoSelfie => "fotoSelfie",
        DocumentSlot::Identificacion => "identificacion",
        DocumentSlot::ActaNacimiento => "actaNacimiento.pdf",
        DocumentSlot::OficioSolicitud => "oficioSolicitud.pdf",
    }
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

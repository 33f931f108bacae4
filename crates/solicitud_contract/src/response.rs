use serde::{Deserialize, Serialize};

use crate::folio::Folio;

/// JSON body returned by `POST /submit`, on success and on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folio: Option<Folio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubmissionResponse {
    pub fn accepted(folio: Folio) -> Self {
        Self {
            success: true,
            folio: Some(folio),
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            folio: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SubmissionResponse;
    use crate::folio::Folio;
    use serde_json::json;

    #[test]
    fn success_body_carries_only_the_folio() {
        let folio = Folio::new(123_456).expect("folio");
        let body = serde_json::to_value(SubmissionResponse::accepted(folio)).expect("json");
        assert_eq!(body, json!({ "success": true, "folio": 123456 }));
    }

    #[test]
    fn failure_body_carries_only_the_message() {
        let body = serde_json::to_value(SubmissionResponse::rejected("Error interno del servidor"))
            .expect("json");
        assert_eq!(
            body,
            json!({ "success": false, "message": "Error interno del servidor" })
        );
    }
}

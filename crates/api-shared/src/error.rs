use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// JSON body of every error response.
///
/// `errors` is present only for validation failures and maps each offending field to its
/// messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(message: impl Into<String>, errors: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            message: message.into(),
            errors: Some(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_errors_omit_field_map() {
        let json = serde_json::to_value(ErrorBody::new("unit A1 is already occupied")).unwrap();
        assert_eq!(json, serde_json::json!({"message": "unit A1 is already occupied"}));
    }
}

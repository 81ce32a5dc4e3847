use serde::{Deserialize, Serialize};

/// A saving tip. Tips are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Tip {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: crate::utils::generate_id(),
            text: text.into(),
            category: None,
        }
    }
}

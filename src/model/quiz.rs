use serde::{Deserialize, Serialize};

/// Whether an item is a need or a want.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizAnswer {
    Need,
    Want,
}

serde_plain::derive_display_from_serialize!(QuizAnswer);
serde_plain::derive_fromstr_from_deserialize!(QuizAnswer);

/// A need-or-want question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizItem {
    pub id: String,
    pub prompt: String,
    pub answer: QuizAnswer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizItem {
    pub fn new(prompt: impl Into<String>, answer: QuizAnswer, explanation: Option<String>) -> Self {
        Self {
            id: crate::utils::generate_id(),
            prompt: prompt.into(),
            answer,
            explanation,
        }
    }
}

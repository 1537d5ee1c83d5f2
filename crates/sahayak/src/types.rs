use serde::{Deserialize, Serialize};

/// Marker prefix distinguishing raw retrieved context (needs an external
/// formatting pass) from final answer text on the wire.
pub const SEMANTIC_SENTINEL: &str = "RAG::";

/// Fixed literal returned when no data source can answer a question.
pub const NO_ANSWER_TEXT: &str = "Information not available.";

/// Outcome of routing one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    /// Final natural-language text assembled directly from structured data.
    /// Returned to the caller as-is, no further processing.
    Structured { text: String },
    /// Concatenated policy passages that still need the downstream
    /// formatter. Never shown to the end user unformatted.
    Semantic { context: String },
    /// Nothing matched.
    NoAnswer,
}

impl Answer {
    pub fn structured(text: impl Into<String>) -> Self {
        Self::Structured { text: text.into() }
    }

    /// Wire representation consumed by external callers: structured answers
    /// verbatim, semantic answers behind the sentinel, no-answer as the
    /// fixed literal.
    pub fn to_wire(&self) -> String {
        match self {
            Self::Structured { text } => text.clone(),
            Self::Semantic { context } => format!("{}{}", SEMANTIC_SENTINEL, context),
            Self::NoAnswer => NO_ANSWER_TEXT.to_string(),
        }
    }

    pub fn is_no_answer(&self) -> bool {
        matches!(self, Self::NoAnswer)
    }
}

/// A single policy passage returned by the similarity index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyHit {
    pub id: String,
    pub text: String,
    pub source: String,
    pub heading: String,
    pub score: f32,
}

/// `ask()` result: the answer plus routing metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedReply {
    pub answer: Answer,
    /// Name of the rule that produced the answer, `None` for the catch-all.
    pub rule: Option<&'static str>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_tags_semantic_answers() {
        let answer = Answer::Semantic {
            context: "Employees get 20 leave days.".to_string(),
        };
        assert_eq!(answer.to_wire(), "RAG::Employees get 20 leave days.");
    }

    #[test]
    fn wire_format_passes_structured_through() {
        let answer = Answer::structured("There are 15 employees.");
        assert_eq!(answer.to_wire(), "There are 15 employees.");
    }

    #[test]
    fn wire_format_uses_fixed_no_answer_literal() {
        assert_eq!(Answer::NoAnswer.to_wire(), "Information not available.");
    }
}

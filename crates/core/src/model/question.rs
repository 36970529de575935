use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("category cannot be empty")]
    EmptyCategory,

    #[error("prompt cannot be empty")]
    EmptyPrompt,

    #[error("{field} needs at least 2 items, got {len}")]
    TooFewItems { field: &'static str, len: usize },

    #[error("{field} index {index} is out of range for {len} items")]
    IndexOutOfRange {
        field: &'static str,
        index: usize,
        len: usize,
    },

    #[error("correct order cannot be empty")]
    EmptyOrder,

    #[error("correct text cannot be empty")]
    EmptyCorrectText,
}

//
// ─── ENUMS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == raw)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` discriminant of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    OrderSteps,
    MatchItems,
    FillInTheBlank,
}

impl QuestionType {
    pub const ALL: [QuestionType; 5] = [
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::OrderSteps,
        QuestionType::MatchItems,
        QuestionType::FillInTheBlank,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple-choice",
            Self::TrueFalse => "true-false",
            Self::OrderSteps => "order-steps",
            Self::MatchItems => "match-items",
            Self::FillInTheBlank => "fill-in-the-blank",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── VARIANT PAYLOADS ──────────────────────────────────────────────────────────
//

/// One row of a match-items question. Pair `i`'s `left` matches pair `i`'s `right`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

impl MatchPair {
    #[must_use]
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Accepted answer text for a fill-in-the-blank question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectText {
    One(String),
    AnyOf(Vec<String>),
}

impl CorrectText {
    /// Iterates every acceptable spelling.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            CorrectText::One(text) => std::slice::from_ref(text),
            CorrectText::AnyOf(texts) => texts,
        };
        slice.iter().map(String::as_str)
    }
}

/// Variant-specific part of a question, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum QuestionKind {
    MultipleChoice {
        question: String,
        options: Vec<String>,
        correct_answer: usize,
    },
    TrueFalse {
        statement: String,
        correct_answer: bool,
    },
    OrderSteps {
        question: String,
        steps: Vec<String>,
        correct_order: Vec<usize>,
    },
    MatchItems {
        question: String,
        pairs: Vec<MatchPair>,
    },
    FillInTheBlank {
        question: String,
        correct_text: CorrectText,
    },
}

impl QuestionKind {
    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        match self {
            Self::MultipleChoice { .. } => QuestionType::MultipleChoice,
            Self::TrueFalse { .. } => QuestionType::TrueFalse,
            Self::OrderSteps { .. } => QuestionType::OrderSteps,
            Self::MatchItems { .. } => QuestionType::MatchItems,
            Self::FillInTheBlank { .. } => QuestionType::FillInTheBlank,
        }
    }

    /// User-facing prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        match self {
            Self::MultipleChoice { question, .. }
            | Self::OrderSteps { question, .. }
            | Self::MatchItems { question, .. }
            | Self::FillInTheBlank { question, .. } => question,
            Self::TrueFalse { statement, .. } => statement,
        }
    }

    fn check(&self) -> Result<(), QuestionError> {
        if self.prompt().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        match self {
            Self::MultipleChoice {
                options,
                correct_answer,
                ..
            } => {
                at_least_two("options", options.len())?;
                in_range("correctAnswer", *correct_answer, options.len())
            }
            Self::TrueFalse { .. } => Ok(()),
            Self::OrderSteps {
                steps,
                correct_order,
                ..
            } => {
                at_least_two("steps", steps.len())?;
                if correct_order.is_empty() {
                    return Err(QuestionError::EmptyOrder);
                }
                correct_order
                    .iter()
                    .try_for_each(|&index| in_range("correctOrder", index, steps.len()))
            }
            Self::MatchItems { pairs, .. } => at_least_two("pairs", pairs.len()),
            Self::FillInTheBlank { correct_text, .. } => {
                let mut candidates = correct_text.candidates().peekable();
                if candidates.peek().is_none() || candidates.any(|c| c.trim().is_empty()) {
                    return Err(QuestionError::EmptyCorrectText);
                }
                Ok(())
            }
        }
    }
}

fn at_least_two(field: &'static str, len: usize) -> Result<(), QuestionError> {
    if len < 2 {
        return Err(QuestionError::TooFewItems { field, len });
    }
    Ok(())
}

fn in_range(field: &'static str, index: usize, len: usize) -> Result<(), QuestionError> {
    if index >= len {
        return Err(QuestionError::IndexOutOfRange { field, index, len });
    }
    Ok(())
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A question in the pool: common metadata plus one of five variants.
///
/// The variant is fixed at construction; there is no setter for `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    category: String,
    difficulty: Difficulty,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
    #[serde(flatten)]
    kind: QuestionKind,
}

impl Question {
    /// Build a question authored in-process.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the id, category or prompt is empty, a
    /// sequence is too short, or an answer index points outside its sequence.
    pub fn new(
        id: QuestionId,
        category: impl Into<String>,
        difficulty: Difficulty,
        kind: QuestionKind,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuestionError> {
        let category = category.into();
        if id.is_empty() {
            return Err(QuestionError::EmptyId);
        }
        if category.trim().is_empty() {
            return Err(QuestionError::EmptyCategory);
        }
        kind.check()?;

        Ok(Self {
            id,
            category,
            difficulty,
            created_at,
            updated_at: None,
            explanation: None,
            kind,
        })
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        let explanation = explanation.into();
        self.explanation = (!explanation.trim().is_empty()).then_some(explanation);
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        self.kind.prompt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn true_false() -> Question {
        Question::new(
            QuestionId::new("tf-1"),
            "Biology",
            Difficulty::Easy,
            QuestionKind::TrueFalse {
                statement: "Cells have membranes.".into(),
                correct_answer: true,
            },
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn prompt_reads_statement_for_true_false() {
        assert_eq!(true_false().prompt(), "Cells have membranes.");
    }

    #[test]
    fn prompt_reads_question_for_other_variants() {
        let kind = QuestionKind::FillInTheBlank {
            question: "Capital of France?".into(),
            correct_text: CorrectText::One("Paris".into()),
        };
        assert_eq!(kind.prompt(), "Capital of France?");
        assert_eq!(kind.question_type(), QuestionType::FillInTheBlank);
    }

    #[test]
    fn new_rejects_out_of_range_answer() {
        let err = Question::new(
            QuestionId::new("mc"),
            "Math",
            Difficulty::Medium,
            QuestionKind::MultipleChoice {
                question: "2 + 2?".into(),
                options: vec!["3".into(), "4".into()],
                correct_answer: 2,
            },
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            QuestionError::IndexOutOfRange {
                field: "correctAnswer",
                index: 2,
                len: 2
            }
        );
    }

    #[test]
    fn new_rejects_blank_correct_text_alternative() {
        let err = Question::new(
            QuestionId::new("fb"),
            "Geo",
            Difficulty::Easy,
            QuestionKind::FillInTheBlank {
                question: "Largest city?".into(),
                correct_text: CorrectText::AnyOf(vec!["NYC".into(), "  ".into()]),
            },
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyCorrectText);
    }

    #[test]
    fn serializes_to_import_shape() {
        let question = true_false().with_explanation("Every cell has one.");
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "tf-1",
                "type": "true-false",
                "category": "Biology",
                "difficulty": "easy",
                "createdAt": 1_700_000_000_000_i64,
                "statement": "Cells have membranes.",
                "correctAnswer": true,
                "explanation": "Every cell has one."
            })
        );
    }

    #[test]
    fn deserializes_fill_in_the_blank_alternatives() {
        let question: Question = serde_json::from_value(json!({
            "id": "5",
            "type": "fill-in-the-blank",
            "category": "Geography",
            "difficulty": "hard",
            "createdAt": 0,
            "question": "Which city is called the Big Apple?",
            "correctText": ["NYC", "New York"]
        }))
        .unwrap();

        assert_eq!(question.question_type(), QuestionType::FillInTheBlank);
        assert_eq!(question.explanation(), None);
        let QuestionKind::FillInTheBlank { correct_text, .. } = question.kind() else {
            panic!("expected fill-in-the-blank");
        };
        assert_eq!(correct_text.candidates().collect::<Vec<_>>(), vec!["NYC", "New York"]);
    }
}

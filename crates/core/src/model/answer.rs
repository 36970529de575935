use serde::{Deserialize, Serialize};

/// A left/right index pairing chosen in a match-items question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSelection {
    pub left: usize,
    pub right: usize,
}

/// Raw answer produced by the question renderer.
///
/// The shape depends on the question type: an option index, a boolean, a
/// step-index sequence, a list of index pairings, or free text. A shape that
/// does not fit the question simply scores as incorrect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Index(i64),
    Text(String),
    Sequence(Vec<i64>),
    Matches(Vec<MatchSelection>),
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<usize> for AnswerValue {
    fn from(value: usize) -> Self {
        Self::Index(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<usize>> for AnswerValue {
    fn from(value: Vec<usize>) -> Self {
        Self::Sequence(
            value
                .into_iter()
                .map(|i| i64::try_from(i).unwrap_or(i64::MAX))
                .collect(),
        )
    }
}

impl From<Vec<MatchSelection>> for AnswerValue {
    fn from(value: Vec<MatchSelection>) -> Self {
        Self::Matches(value)
    }
}

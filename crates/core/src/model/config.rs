use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ConfigId;
use crate::model::question::{Difficulty, Question};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("session name cannot be empty")]
    EmptyName,

    #[error("questions per session must be > 0")]
    InvalidQuestionsPerSession,
}

/// Reusable filter, size and ordering parameters for building a session.
///
/// Sessions copy the config id they were built from; editing a saved config
/// never reaches back into a running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    id: ConfigId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty_filter: Option<Difficulty>,
    questions_per_session: u32,
    randomize_questions: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
}

impl SessionConfig {
    /// Create a config with no filters and fixed ordering.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyName` for a blank name and
    /// `ConfigError::InvalidQuestionsPerSession` when the size is zero.
    pub fn new(
        id: ConfigId,
        name: impl Into<String>,
        questions_per_session: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            id,
            name: name.into(),
            category_filter: None,
            difficulty_filter: None,
            questions_per_session,
            randomize_questions: false,
            created_at,
        };
        config.validate()?;
        Ok(config)
    }

    /// Re-check invariants, e.g. after loading from storage.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SessionConfig::new`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.questions_per_session == 0 {
            return Err(ConfigError::InvalidQuestionsPerSession);
        }
        Ok(())
    }

    /// Restrict to one category. A blank category means "all categories".
    #[must_use]
    pub fn with_category_filter(mut self, category: Option<String>) -> Self {
        self.category_filter = category.filter(|c| !c.is_empty());
        self
    }

    #[must_use]
    pub fn with_difficulty_filter(mut self, difficulty: Option<Difficulty>) -> Self {
        self.difficulty_filter = difficulty;
        self
    }

    #[must_use]
    pub fn with_randomize_questions(mut self, randomize: bool) -> Self {
        self.randomize_questions = randomize;
        self
    }

    #[must_use]
    pub fn id(&self) -> &ConfigId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn category_filter(&self) -> Option<&str> {
        self.category_filter.as_deref()
    }

    #[must_use]
    pub fn difficulty_filter(&self) -> Option<Difficulty> {
        self.difficulty_filter
    }

    #[must_use]
    pub fn questions_per_session(&self) -> u32 {
        self.questions_per_session
    }

    #[must_use]
    pub fn randomize_questions(&self) -> bool {
        self.randomize_questions
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True when the question passes both the category and difficulty filters.
    #[must_use]
    pub fn matches(&self, question: &Question) -> bool {
        self.category_filter
            .as_deref()
            .is_none_or(|category| question.category() == category)
            && self
                .difficulty_filter
                .is_none_or(|difficulty| question.difficulty() == difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, QuestionKind};
    use crate::time::fixed_now;
    use serde_json::json;

    fn question(category: &str, difficulty: Difficulty) -> Question {
        Question::new(
            QuestionId::new("q"),
            category,
            difficulty,
            QuestionKind::TrueFalse {
                statement: "S".into(),
                correct_answer: false,
            },
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_zero_questions_per_session() {
        let err = SessionConfig::new(ConfigId::new("c"), "Daily", 0, fixed_now()).unwrap_err();
        assert_eq!(err, ConfigError::InvalidQuestionsPerSession);
    }

    #[test]
    fn rejects_blank_name() {
        let err = SessionConfig::new(ConfigId::new("c"), "   ", 5, fixed_now()).unwrap_err();
        assert_eq!(err, ConfigError::EmptyName);
    }

    #[test]
    fn blank_category_filter_is_dropped() {
        let config = SessionConfig::new(ConfigId::new("c"), "All", 5, fixed_now())
            .unwrap()
            .with_category_filter(Some(String::new()));
        assert_eq!(config.category_filter(), None);
    }

    #[test]
    fn matches_applies_both_filters() {
        let config = SessionConfig::new(ConfigId::new("c"), "Bio hard", 5, fixed_now())
            .unwrap()
            .with_category_filter(Some("Biology".into()))
            .with_difficulty_filter(Some(Difficulty::Hard));

        assert!(config.matches(&question("Biology", Difficulty::Hard)));
        assert!(!config.matches(&question("Biology", Difficulty::Easy)));
        assert!(!config.matches(&question("History", Difficulty::Hard)));
    }

    #[test]
    fn round_trips_persisted_shape() {
        let raw = json!({
            "id": "cfg-1",
            "name": "Quick bio",
            "categoryFilter": "Biology",
            "questionsPerSession": 10,
            "randomizeQuestions": true,
            "createdAt": 1_700_000_000_000_i64
        });
        let config: SessionConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(config.category_filter(), Some("Biology"));
        assert_eq!(config.difficulty_filter(), None);
        assert_eq!(config.created_at(), fixed_now());
        assert_eq!(serde_json::to_value(&config).unwrap(), raw);
    }
}

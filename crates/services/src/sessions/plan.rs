use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use quiz_core::model::{Question, QuestionId, QuizSession, SessionConfig, SessionId};

/// Builds a quiz session from the pool according to a config.
///
/// Selection order: explicit ids (which bypass the filters) or the category
/// and difficulty filters, then truncation to `questions_per_session`, then an
/// optional shuffle of the kept subset.
pub struct SessionBuilder<'a> {
    config: &'a SessionConfig,
    explicit_ids: Option<HashSet<&'a QuestionId>>,
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(config: &'a SessionConfig) -> Self {
        Self {
            config,
            explicit_ids: None,
        }
    }

    /// Restrict the session to these ids, ignoring the config filters.
    ///
    /// An empty list leaves the filters in charge.
    #[must_use]
    pub fn with_question_ids(mut self, ids: &'a [QuestionId]) -> Self {
        self.explicit_ids = (!ids.is_empty()).then(|| ids.iter().collect());
        self
    }

    /// The questions a session would contain, before any shuffle.
    #[must_use]
    pub fn select(&self, pool: &[Question]) -> Vec<Question> {
        let limit = usize::try_from(self.config.questions_per_session()).unwrap_or(usize::MAX);
        pool.iter()
            .filter(|question| match &self.explicit_ids {
                Some(ids) => ids.contains(question.id()),
                None => self.config.matches(question),
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// Build a session using the thread-local RNG for shuffling.
    #[must_use]
    pub fn build(self, pool: &[Question], started_at: DateTime<Utc>) -> QuizSession {
        self.build_with_rng(pool, started_at, &mut rand::rng())
    }

    /// Build a session with a caller-supplied RNG.
    #[must_use]
    pub fn build_with_rng<R: Rng + ?Sized>(
        self,
        pool: &[Question],
        started_at: DateTime<Utc>,
        rng: &mut R,
    ) -> QuizSession {
        let mut questions = self.select(pool);
        if self.config.randomize_questions() {
            questions.as_mut_slice().shuffle(rng);
        }

        QuizSession::new(
            SessionId::generate(),
            self.config.id().clone(),
            questions,
            started_at,
        )
    }
}

/// Number of pool questions passing the config filters, ignoring the size cap.
#[must_use]
pub fn available_count(pool: &[Question], config: &SessionConfig) -> usize {
    pool.iter().filter(|q| config.matches(q)).count()
}

/// Distinct categories in first-seen order.
#[must_use]
pub fn categories(pool: &[Question]) -> Vec<&str> {
    let mut seen = HashSet::new();
    pool.iter()
        .map(Question::category)
        .filter(|category| seen.insert(*category))
        .collect()
}

use serde::Serialize;
use std::fmt;

use quiz_core::model::{QuestionId, QuizSession};

use super::progress::rounded_percent;

/// Headline band for a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreBand {
    Perfect,
    Excellent,
    Good,
    KeepPracticing,
}

impl ScoreBand {
    #[must_use]
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            100.. => Self::Perfect,
            80..=99 => Self::Excellent,
            60..=79 => Self::Good,
            _ => Self::KeepPracticing,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect Score!",
            Self::Excellent => "Excellent!",
            Self::Good => "Good Job!",
            Self::KeepPracticing => "Keep Practicing!",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// One row of the results listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultItem {
    pub question_id: QuestionId,
    pub category: String,
    pub prompt: String,
    pub explanation: Option<String>,
}

/// Scored summary of a session for the results screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResults {
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub percentage: u8,
    pub band: ScoreBand,
    pub correct_items: Vec<ResultItem>,
    pub incorrect_items: Vec<ResultItem>,
}

impl SessionResults {
    /// Summarise a session. Items follow session order, not answer order.
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        let total = session.len();
        let correct = session.correct_answers().len();
        let incorrect = session.incorrect_answers().len();
        let percentage = rounded_percent(correct, total);

        let items_in = |ids: &[QuestionId]| -> Vec<ResultItem> {
            session
                .questions()
                .iter()
                .filter(|q| ids.contains(q.id()))
                .map(|q| ResultItem {
                    question_id: q.id().clone(),
                    category: q.category().to_owned(),
                    prompt: q.prompt().to_owned(),
                    explanation: q.explanation().map(str::to_owned),
                })
                .collect()
        };

        Self {
            total,
            correct,
            incorrect,
            percentage,
            band: ScoreBand::from_percentage(percentage),
            correct_items: items_in(session.correct_answers()),
            incorrect_items: items_in(session.incorrect_answers()),
        }
    }

    /// Ids to feed back into a "retry failed" session.
    #[must_use]
    pub fn failed_ids(&self) -> Vec<QuestionId> {
        self.incorrect_items
            .iter()
            .map(|item| item.question_id.clone())
            .collect()
    }
}

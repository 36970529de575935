use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::evaluate::is_correct;
use crate::model::answer::AnswerValue;
use crate::model::ids::{ConfigId, QuestionId, SessionId};
use crate::model::question::Question;

/// Whether a session still accepts navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

/// Outcome of recording one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    pub is_correct: bool,
    /// False when the question had already been answered; score and the
    /// correct/incorrect lists keep the first verdict.
    pub first_answer: bool,
}

/// One attempt at an ordered subset of the pool.
///
/// The question list is fixed at creation. After that the session only moves
/// through navigation (`advance`, `retreat`, `complete`) and
/// `record_answer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSession {
    id: SessionId,
    config_id: ConfigId,
    questions: Vec<Question>,
    current_question_index: usize,
    score: u32,
    answers: HashMap<QuestionId, AnswerValue>,
    correct_answers: Vec<QuestionId>,
    incorrect_answers: Vec<QuestionId>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    started_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a fresh session over an already selected question list.
    #[must_use]
    pub fn new(
        id: SessionId,
        config_id: ConfigId,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            config_id,
            questions,
            current_question_index: 0,
            score: 0,
            answers: HashMap::new(),
            correct_answers: Vec::new(),
            incorrect_answers: Vec::new(),
            started_at,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn config_id(&self) -> &ConfigId {
        &self.config_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn answers(&self) -> &HashMap<QuestionId, AnswerValue> {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, id: &QuestionId) -> Option<&AnswerValue> {
        self.answers.get(id)
    }

    #[must_use]
    pub fn is_answered(&self, id: &QuestionId) -> bool {
        self.answers.contains_key(id)
    }

    #[must_use]
    pub fn correct_answers(&self) -> &[QuestionId] {
        &self.correct_answers
    }

    #[must_use]
    pub fn incorrect_answers(&self) -> &[QuestionId] {
        &self.incorrect_answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        if self.is_complete() {
            SessionStatus::Completed
        } else {
            SessionStatus::InProgress
        }
    }

    /// Move to the next question, or mark the session completed when already
    /// on the last one. Completion is stamped once; later calls keep the
    /// original `completed_at`.
    pub fn advance(&mut self, now: DateTime<Utc>) {
        let next = self.current_question_index + 1;
        if next < self.questions.len() {
            self.current_question_index = next;
        } else {
            self.mark_completed(now);
        }
    }

    /// Step back one question, stopping at the first.
    pub fn retreat(&mut self) {
        self.current_question_index = self.current_question_index.saturating_sub(1);
    }

    /// Finish early, whatever the current position.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.mark_completed(now);
    }

    fn mark_completed(&mut self, now: DateTime<Utc>) {
        if self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
    }

    /// Score an answer for a question of this session.
    ///
    /// Returns `None` when the id is not part of the session. The raw answer
    /// always replaces any previous one; score and the correct/incorrect
    /// lists only change on the first answer for a given question.
    pub fn record_answer(
        &mut self,
        question_id: &QuestionId,
        answer: AnswerValue,
    ) -> Option<AnswerOutcome> {
        let question = self.question(question_id)?;
        let correct = is_correct(question, &answer);
        let first_answer = !self.correct_answers.contains(question_id)
            && !self.incorrect_answers.contains(question_id);

        self.answers.insert(question_id.clone(), answer);
        if first_answer {
            if correct {
                self.score = self.score.saturating_add(1);
                self.correct_answers.push(question_id.clone());
            } else {
                self.incorrect_answers.push(question_id.clone());
            }
        }

        Some(AnswerOutcome {
            question_id: question_id.clone(),
            is_correct: correct,
            first_answer,
        })
    }
}

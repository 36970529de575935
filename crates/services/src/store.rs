use rand::Rng;
use serde_json::Value;
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{
    AnswerOutcome, AnswerValue, ConfigId, Difficulty, Question, QuestionId, QuizSession,
    SessionConfig,
};
use quiz_core::validate_questions_json;
use storage::json::{discard, keys, load_or, save};
use storage::repository::KeyValueStore;

use crate::error::{ImportError, StoreError};
use crate::sessions::{SessionBuilder, SessionProgress, SessionResults, available_count, categories};

/// Fields a user picks when saving a new session config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSessionConfig {
    pub name: String,
    pub category_filter: Option<String>,
    pub difficulty_filter: Option<Difficulty>,
    pub questions_per_session: u32,
    pub randomize_questions: bool,
}

/// Counts reported after a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub replaced: usize,
}

/// Application state for the quiz trainer.
///
/// Holds the question pool, saved configs and the running session. Pool and
/// config mutations rewrite their whole document through the key-value store;
/// persistence failures are logged and never surface to the caller. Session
/// state lives only in memory.
pub struct QuizStore {
    clock: Clock,
    kv: Arc<dyn KeyValueStore>,
    questions: Vec<Question>,
    available_sessions: Vec<SessionConfig>,
    current_session: Option<QuizSession>,
    current_session_config: Option<SessionConfig>,
}

impl QuizStore {
    /// Create an empty store. Call [`QuizStore::load_initial_data`] to read
    /// persisted state.
    #[must_use]
    pub fn new(clock: Clock, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            clock,
            kv,
            questions: Vec::new(),
            available_sessions: Vec::new(),
            current_session: None,
            current_session_config: None,
        }
    }

    /// Create a store and load the persisted pool and configs.
    pub async fn load(clock: Clock, kv: Arc<dyn KeyValueStore>) -> Self {
        let mut store = Self::new(clock, kv);
        store.load_initial_data().await;
        store
    }

    /// Replace in-memory pool and configs with what is persisted.
    ///
    /// Absent or corrupt documents load as empty. Saved configs are read one
    /// by one; an entry that does not parse or breaks its invariants is
    /// dropped without losing the others.
    pub async fn load_initial_data(&mut self) {
        self.questions = load_or(self.kv.as_ref(), keys::QUESTIONS, Vec::new()).await;

        let entries: Vec<Value> =
            load_or(self.kv.as_ref(), keys::SESSION_CONFIGS, Vec::new()).await;
        self.available_sessions = entries
            .into_iter()
            .enumerate()
            .filter_map(|(position, entry)| parse_config(position, entry))
            .collect();

        tracing::debug!(
            questions = self.questions.len(),
            configs = self.available_sessions.len(),
            "loaded persisted state"
        );
    }

    // ─── Getters ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn available_sessions(&self) -> &[SessionConfig] {
        &self.available_sessions
    }

    #[must_use]
    pub fn current_session(&self) -> Option<&QuizSession> {
        self.current_session.as_ref()
    }

    #[must_use]
    pub fn current_session_config(&self) -> Option<&SessionConfig> {
        self.current_session_config.as_ref()
    }

    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        categories(&self.questions)
    }

    #[must_use]
    pub fn available_count(&self, config: &SessionConfig) -> usize {
        available_count(&self.questions, config)
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        self.current_session.as_ref().map(SessionProgress::of)
    }

    #[must_use]
    pub fn results(&self) -> Option<SessionResults> {
        self.current_session
            .as_ref()
            .map(SessionResults::from_session)
    }

    // ─── Pool ────────────────────────────────────────────────────────────────

    /// Replace the whole pool.
    pub async fn set_questions(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.persist_questions().await;
    }

    /// Add questions to the pool. A question whose id is already pooled
    /// replaces the existing entry in place; the rest are appended.
    pub async fn add_questions(&mut self, questions: Vec<Question>) -> ImportSummary {
        let mut summary = ImportSummary {
            added: 0,
            replaced: 0,
        };
        for question in questions {
            match self.questions.iter_mut().find(|q| q.id() == question.id()) {
                Some(existing) => {
                    *existing = question;
                    summary.replaced += 1;
                }
                None => {
                    self.questions.push(question);
                    summary.added += 1;
                }
            }
        }
        self.persist_questions().await;
        summary
    }

    /// Empty the pool and delete its persisted document.
    pub async fn clear_questions(&mut self) {
        self.questions.clear();
        discard(self.kv.as_ref(), keys::QUESTIONS).await;
    }

    /// Validate a JSON question set and add it to the pool.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Rejected` with every validation message when any
    /// element is invalid; the pool is left untouched.
    pub async fn import_json(&mut self, text: &str) -> Result<ImportSummary, ImportError> {
        let questions = validate_questions_json(text, self.clock.now())
            .into_result()
            .map_err(|errors| {
                tracing::info!(errors = errors.len(), "question import rejected");
                ImportError::Rejected { errors }
            })?;

        let summary = self.add_questions(questions).await;
        tracing::info!(
            added = summary.added,
            replaced = summary.replaced,
            "questions imported"
        );
        Ok(summary)
    }

    async fn persist_questions(&self) {
        save(self.kv.as_ref(), keys::QUESTIONS, &self.questions).await;
    }

    // ─── Sessions ────────────────────────────────────────────────────────────

    /// Start a session from `config`, replacing any current session.
    ///
    /// A non-empty `question_ids` restricts the session to those ids and
    /// bypasses the config filters.
    pub fn start_session(
        &mut self,
        config: SessionConfig,
        question_ids: Option<&[QuestionId]>,
    ) -> &QuizSession {
        self.start_session_with_rng(config, question_ids, &mut rand::rng())
    }

    /// [`QuizStore::start_session`] with a caller-supplied RNG.
    pub fn start_session_with_rng<R: Rng + ?Sized>(
        &mut self,
        config: SessionConfig,
        question_ids: Option<&[QuestionId]>,
        rng: &mut R,
    ) -> &QuizSession {
        let mut builder = SessionBuilder::new(&config);
        if let Some(ids) = question_ids {
            builder = builder.with_question_ids(ids);
        }
        let session = builder.build_with_rng(&self.questions, self.clock.now(), rng);

        tracing::info!(
            session_id = %session.id(),
            config_id = %config.id(),
            questions = session.len(),
            "session started"
        );
        self.current_session_config = Some(config);
        self.current_session.insert(session)
    }

    /// Start a fresh session with the current config.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoConfig` when no config is selected.
    pub fn retry_all(&mut self) -> Result<&QuizSession, StoreError> {
        let config = self
            .current_session_config
            .clone()
            .ok_or(StoreError::NoConfig)?;
        Ok(self.start_session(config, None))
    }

    /// Start a session containing only the questions answered incorrectly
    /// in the current session.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoActiveSession` without a session,
    /// `StoreError::NoConfig` without a config, and
    /// `StoreError::NothingToRetry` when every answer was correct.
    pub fn retry_failed(&mut self) -> Result<&QuizSession, StoreError> {
        let failed = self
            .current_session
            .as_ref()
            .ok_or(StoreError::NoActiveSession)?
            .incorrect_answers()
            .to_vec();
        if failed.is_empty() {
            return Err(StoreError::NothingToRetry);
        }
        let config = self
            .current_session_config
            .clone()
            .ok_or(StoreError::NoConfig)?;
        Ok(self.start_session(config, Some(&failed)))
    }

    /// Move forward, completing the session from the last question.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoActiveSession` when no session is running.
    pub fn next_question(&mut self) -> Result<(), StoreError> {
        let now = self.clock.now();
        let session = self.session_mut()?;
        session.advance(now);
        tracing::debug!(
            index = session.current_question_index(),
            completed = session.is_complete(),
            "advanced"
        );
        Ok(())
    }

    /// Step back one question.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoActiveSession` when no session is running.
    pub fn previous_question(&mut self) -> Result<(), StoreError> {
        let session = self.session_mut()?;
        session.retreat();
        tracing::debug!(index = session.current_question_index(), "retreated");
        Ok(())
    }

    /// Record an answer for a question of the current session.
    ///
    /// Returns `Ok(None)` when the id is not part of the session.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoActiveSession` when no session is running.
    pub fn answer_question(
        &mut self,
        question_id: &QuestionId,
        answer: AnswerValue,
    ) -> Result<Option<AnswerOutcome>, StoreError> {
        let session = self.session_mut()?;
        let outcome = session.record_answer(question_id, answer);
        match &outcome {
            Some(outcome) => tracing::debug!(
                question_id = %outcome.question_id,
                correct = outcome.is_correct,
                first_answer = outcome.first_answer,
                "answer recorded"
            ),
            None => tracing::debug!(%question_id, "answer for unknown question ignored"),
        }
        Ok(outcome)
    }

    /// Finish the current session early.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoActiveSession` when no session is running.
    pub fn end_session(&mut self) -> Result<(), StoreError> {
        let now = self.clock.now();
        let session = self.session_mut()?;
        session.complete(now);
        tracing::info!(session_id = %session.id(), score = session.score(), "session ended");
        Ok(())
    }

    fn session_mut(&mut self) -> Result<&mut QuizSession, StoreError> {
        self.current_session
            .as_mut()
            .ok_or(StoreError::NoActiveSession)
    }

    // ─── Saved configs ───────────────────────────────────────────────────────

    /// Validate and save a new config with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` when the name is blank or the size is zero.
    pub async fn create_session_config(
        &mut self,
        draft: NewSessionConfig,
    ) -> Result<SessionConfig, StoreError> {
        let config = SessionConfig::new(
            ConfigId::generate(),
            draft.name,
            draft.questions_per_session,
            self.clock.now(),
        )?
        .with_category_filter(draft.category_filter)
        .with_difficulty_filter(draft.difficulty_filter)
        .with_randomize_questions(draft.randomize_questions);

        self.available_sessions.push(config.clone());
        self.persist_configs().await;
        tracing::info!(config_id = %config.id(), name = config.name(), "session config created");
        Ok(config)
    }

    /// Remove a saved config. Returns whether anything was removed.
    pub async fn delete_session_config(&mut self, id: &ConfigId) -> bool {
        let before = self.available_sessions.len();
        self.available_sessions.retain(|config| config.id() != id);
        let removed = self.available_sessions.len() != before;
        if removed {
            self.persist_configs().await;
        }
        removed
    }

    /// Select a saved config as the current one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UnknownConfig` when no saved config has this id.
    pub fn load_session_config(&mut self, id: &ConfigId) -> Result<&SessionConfig, StoreError> {
        let config = self
            .available_sessions
            .iter()
            .find(|config| config.id() == id)
            .cloned()
            .ok_or_else(|| StoreError::UnknownConfig(id.clone()))?;
        Ok(self.current_session_config.insert(config))
    }

    /// Write the current config into the saved list, replacing a saved
    /// config with the same id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoConfig` when no config is selected, or
    /// `StoreError::Config` when it breaks its invariants.
    pub async fn save_session_config(&mut self) -> Result<(), StoreError> {
        let config = self
            .current_session_config
            .clone()
            .ok_or(StoreError::NoConfig)?;
        config.validate()?;

        match self
            .available_sessions
            .iter_mut()
            .find(|saved| saved.id() == config.id())
        {
            Some(saved) => *saved = config,
            None => self.available_sessions.push(config),
        }
        self.persist_configs().await;
        Ok(())
    }

    async fn persist_configs(&self) {
        save(self.kv.as_ref(), keys::SESSION_CONFIGS, &self.available_sessions).await;
    }
}

fn parse_config(position: usize, entry: Value) -> Option<SessionConfig> {
    let config = match serde_json::from_value::<SessionConfig>(entry) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(position, error = %err, "dropping unreadable session config");
            return None;
        }
    };
    match config.validate() {
        Ok(()) => Some(config),
        Err(err) => {
            tracing::warn!(config_id = %config.id(), error = %err, "dropping invalid session config");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quiz_core::model::QuestionKind;
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryStore;

    fn build_question(id: &str, category: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            category,
            Difficulty::Easy,
            QuestionKind::MultipleChoice {
                question: format!("Prompt {id}"),
                options: vec!["right".into(), "wrong".into()],
                correct_answer: 0,
            },
            fixed_now(),
        )
        .unwrap()
    }

    fn build_config(count: u32) -> SessionConfig {
        SessionConfig::new(ConfigId::new("cfg"), "Daily", count, fixed_now()).unwrap()
    }

    fn new_store() -> (QuizStore, InMemoryStore) {
        let kv = InMemoryStore::new();
        (QuizStore::new(fixed_clock(), Arc::new(kv.clone())), kv)
    }

    #[tokio::test]
    async fn add_questions_replaces_matching_ids_in_place() {
        let (mut store, _) = new_store();
        store
            .set_questions(vec![build_question("a", "X"), build_question("b", "X")])
            .await;

        let summary = store
            .add_questions(vec![build_question("b", "Y"), build_question("c", "Y")])
            .await;

        assert_eq!(summary, ImportSummary { added: 1, replaced: 1 });
        let ids: Vec<&str> = store.questions().iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.questions()[1].category(), "Y");
    }

    #[tokio::test]
    async fn rejected_import_leaves_pool_untouched() {
        let (mut store, kv) = new_store();
        store.set_questions(vec![build_question("a", "X")]).await;

        let err = store.import_json("[{\"id\": 1}]").await.unwrap_err();

        assert!(!err.errors().is_empty());
        assert_eq!(store.questions().len(), 1);
        let reloaded = QuizStore::load(fixed_clock(), Arc::new(kv)).await;
        assert_eq!(reloaded.questions().len(), 1);
    }

    #[test]
    fn session_ops_require_an_active_session() {
        let (mut store, _) = new_store();
        assert_eq!(store.next_question(), Err(StoreError::NoActiveSession));
        assert_eq!(store.previous_question(), Err(StoreError::NoActiveSession));
        assert_eq!(store.end_session(), Err(StoreError::NoActiveSession));
        assert_eq!(
            store.answer_question(&QuestionId::new("a"), AnswerValue::Index(0)),
            Err(StoreError::NoActiveSession)
        );
        assert_eq!(store.retry_all().err(), Some(StoreError::NoConfig));
    }

    #[tokio::test]
    async fn answering_an_unknown_question_is_a_no_op() {
        let (mut store, _) = new_store();
        store.set_questions(vec![build_question("a", "X")]).await;
        store.start_session(build_config(5), None);

        let outcome = store
            .answer_question(&QuestionId::new("missing"), AnswerValue::Index(0))
            .unwrap();

        assert_eq!(outcome, None);
        let session = store.current_session().unwrap();
        assert_eq!(session.score(), 0);
        assert!(session.answers().is_empty());
    }

    #[tokio::test]
    async fn retry_failed_restarts_with_incorrect_questions_only() {
        let (mut store, _) = new_store();
        store
            .set_questions(vec![
                build_question("a", "X"),
                build_question("b", "X"),
                build_question("c", "X"),
            ])
            .await;
        store.start_session(build_config(3), None);
        store
            .answer_question(&QuestionId::new("a"), AnswerValue::Index(1))
            .unwrap();
        store
            .answer_question(&QuestionId::new("b"), AnswerValue::Index(0))
            .unwrap();
        store
            .answer_question(&QuestionId::new("c"), AnswerValue::Index(1))
            .unwrap();
        store.end_session().unwrap();

        let retry = store.retry_failed().unwrap();
        let ids: Vec<&str> = retry.questions().iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(!retry.is_complete());
    }

    #[tokio::test]
    async fn retry_failed_without_mistakes_is_refused() {
        let (mut store, _) = new_store();
        store.set_questions(vec![build_question("a", "X")]).await;
        store.start_session(build_config(1), None);
        store
            .answer_question(&QuestionId::new("a"), AnswerValue::Index(0))
            .unwrap();

        assert_eq!(store.retry_failed().err(), Some(StoreError::NothingToRetry));
    }

    #[tokio::test]
    async fn saved_configs_survive_a_reload() {
        let (mut store, kv) = new_store();
        let created = store
            .create_session_config(NewSessionConfig {
                name: "Biology drill".into(),
                category_filter: Some("Biology".into()),
                difficulty_filter: None,
                questions_per_session: 10,
                randomize_questions: true,
            })
            .await
            .unwrap();

        let mut reloaded = QuizStore::load(fixed_clock(), Arc::new(kv.clone())).await;
        assert_eq!(reloaded.available_sessions(), &[created.clone()][..]);

        let selected = reloaded.load_session_config(created.id()).unwrap();
        assert_eq!(selected.name(), "Biology drill");

        assert!(reloaded.delete_session_config(created.id()).await);
        assert!(!reloaded.delete_session_config(created.id()).await);
        let after_delete = QuizStore::load(fixed_clock(), Arc::new(kv)).await;
        assert!(after_delete.available_sessions().is_empty());
    }

    #[tokio::test]
    async fn create_session_config_rejects_blank_names() {
        let (mut store, _) = new_store();
        let err = store
            .create_session_config(NewSessionConfig {
                name: "  ".into(),
                category_filter: None,
                difficulty_filter: None,
                questions_per_session: 5,
                randomize_questions: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
        assert!(store.available_sessions().is_empty());
    }

    #[tokio::test]
    async fn save_session_config_adds_the_current_config() {
        let (mut store, _) = new_store();
        assert_eq!(store.save_session_config().await, Err(StoreError::NoConfig));

        store.start_session(build_config(2), None);
        store.save_session_config().await.unwrap();
        store.save_session_config().await.unwrap();

        assert_eq!(store.available_sessions().len(), 1);
        assert_eq!(store.available_sessions()[0].id(), &ConfigId::new("cfg"));
    }

    #[tokio::test]
    async fn clear_questions_removes_the_persisted_pool() {
        let (mut store, kv) = new_store();
        store.set_questions(vec![build_question("a", "X")]).await;
        store.clear_questions().await;

        assert!(store.questions().is_empty());
        assert_eq!(kv.get(keys::QUESTIONS).await.unwrap(), None);
    }
}

use serde::Serialize;

use quiz_core::model::QuizSession;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    /// 1-based position of the current question; 0 for an empty session.
    pub position: usize,
    /// Position as a rounded percentage of the total.
    pub percent: u8,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn of(session: &QuizSession) -> Self {
        let total = session.len();
        let position = if total == 0 {
            0
        } else {
            session.current_question_index() + 1
        };
        Self {
            total,
            answered: session.answers().len(),
            position,
            percent: rounded_percent(position, total),
            is_complete: session.is_complete(),
        }
    }
}

/// `part / whole` as a whole percentage, rounding half up. Zero when `whole` is zero.
pub(crate) fn rounded_percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let scaled = (part.min(whole) * 200 + whole) / (whole * 2);
    u8::try_from(scaled).unwrap_or(100)
}

//! Validation of untrusted question-set imports.
//!
//! Input is parsed JSON of unknown shape. Every element is checked on its
//! own and all problems are collected; the batch is accepted only when no
//! element produced an error.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::model::{Difficulty, Question, QuestionType};

/// Outcome of validating a question set.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    errors: Vec<String>,
    questions: Option<Vec<Question>>,
}

impl ValidationReport {
    fn rejected(errors: Vec<String>) -> Self {
        Self {
            errors,
            questions: None,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages in discovery order; empty when valid.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// The parsed questions in input order; `None` unless valid.
    #[must_use]
    pub fn questions(&self) -> Option<&[Question]> {
        self.questions.as_deref()
    }

    /// Consume the report, yielding either the questions or the errors.
    ///
    /// # Errors
    ///
    /// Returns the collected error messages when the set was rejected.
    pub fn into_result(self) -> Result<Vec<Question>, Vec<String>> {
        match self.questions {
            Some(questions) if self.errors.is_empty() => Ok(questions),
            _ => Err(self.errors),
        }
    }
}

/// Parse JSON text and validate it as a question set.
///
/// Malformed JSON is reported as a single top-level error.
#[must_use]
pub fn validate_questions_json(text: &str, imported_at: DateTime<Utc>) -> ValidationReport {
    match serde_json::from_str::<Value>(text) {
        Ok(raw) => validate_questions(&raw, imported_at),
        Err(err) => ValidationReport::rejected(vec![format!("Invalid JSON: {err}")]),
    }
}

/// Validate already-parsed JSON as a question set.
///
/// Questions without a millisecond `createdAt` are stamped with `imported_at`.
#[must_use]
pub fn validate_questions(raw: &Value, imported_at: DateTime<Utc>) -> ValidationReport {
    let Value::Array(items) = raw else {
        return ValidationReport::rejected(vec!["JSON must be an array of questions".into()]);
    };
    if items.is_empty() {
        return ValidationReport::rejected(vec!["JSON array cannot be empty".into()]);
    }

    let mut errors = Vec::new();
    let mut questions = Vec::with_capacity(items.len());
    let mut seen_ids: HashMap<&str, usize> = HashMap::new();

    for (index, item) in items.iter().enumerate() {
        let position = index + 1;
        let mut item_errors = check_question(item);

        if let Some(id) = item.get("id").and_then(Value::as_str) {
            if let Some(first) = seen_ids.get(id) {
                item_errors.push(format!(
                    "Duplicate \"id\" (already used by question {first})"
                ));
            } else {
                seen_ids.insert(id, position);
            }
        }

        if item_errors.is_empty() {
            match to_question(item, imported_at) {
                Ok(question) => questions.push(question),
                Err(err) => item_errors.push(err.to_string()),
            }
        }

        if !item_errors.is_empty() {
            errors.push(format!("Question {position}: {}", item_errors.join(", ")));
        }
    }

    if errors.is_empty() {
        ValidationReport {
            errors,
            questions: Some(questions),
        }
    } else {
        ValidationReport::rejected(errors)
    }
}

/// Optional metadata never rejects an element: an unusable `createdAt` is
/// restamped with `imported_at`, an unusable `updatedAt` or `explanation` is
/// dropped.
fn to_question(item: &Value, imported_at: DateTime<Utc>) -> Result<Question, serde_json::Error> {
    let mut item = item.clone();
    if let Value::Object(fields) = &mut item {
        if !fields.get("createdAt").is_some_and(Value::is_i64) {
            fields.insert(
                "createdAt".into(),
                Value::from(imported_at.timestamp_millis()),
            );
        }
        if fields.get("updatedAt").is_some_and(|v| !v.is_i64()) {
            fields.remove("updatedAt");
        }
        if fields.get("explanation").is_some_and(|v| !v.is_string()) {
            fields.remove("explanation");
        }
    }
    serde_json::from_value(item)
}

fn check_question(item: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Value::Object(q) = item else {
        errors.push("Question must be an object".into());
        return errors;
    };

    if !is_non_empty_str(q, "id") {
        errors.push(r#"Missing or invalid "id" (must be string)"#.into());
    }

    let question_type = match q.get("type") {
        Some(Value::String(raw)) => {
            let parsed = QuestionType::parse(raw);
            if parsed.is_none() {
                errors.push(
                    r#"Missing or invalid "type" (must be: multiple-choice, true-false, order-steps, match-items, fill-in-the-blank)"#
                        .into(),
                );
            }
            parsed
        }
        _ => {
            errors.push(r#"Missing or invalid "type" (must be a string)"#.into());
            None
        }
    };

    if !is_non_empty_str(q, "category") {
        errors.push(r#"Missing or invalid "category" (must be string)"#.into());
    }

    let difficulty_ok = q
        .get("difficulty")
        .and_then(Value::as_str)
        .and_then(Difficulty::parse)
        .is_some();
    if !difficulty_ok {
        errors.push(r#"Missing or invalid "difficulty" (must be: easy, medium, hard)"#.into());
    }

    match question_type {
        Some(QuestionType::MultipleChoice) => check_multiple_choice(q, &mut errors),
        Some(QuestionType::TrueFalse) => check_true_false(q, &mut errors),
        Some(QuestionType::OrderSteps) => check_order_steps(q, &mut errors),
        Some(QuestionType::MatchItems) => check_match_items(q, &mut errors),
        Some(QuestionType::FillInTheBlank) => check_fill_in_the_blank(q, &mut errors),
        None => {}
    }

    errors
}

fn is_non_empty_str(q: &Map<String, Value>, field: &str) -> bool {
    matches!(q.get(field), Some(Value::String(s)) if !s.is_empty())
}

fn as_index(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|v| usize::try_from(v).ok())
}

fn check_prompt(q: &Map<String, Value>, errors: &mut Vec<String>) {
    if !is_non_empty_str(q, "question") {
        errors.push(r#"Missing or invalid "question" (must be string)"#.into());
    }
}

/// Checks `field` is an array of at least two strings and returns its length.
fn check_string_list(
    q: &Map<String, Value>,
    field: &str,
    item_label: &str,
    errors: &mut Vec<String>,
) -> Option<usize> {
    match q.get(field) {
        Some(Value::Array(items)) if items.len() >= 2 => {
            for (idx, item) in items.iter().enumerate() {
                if !item.is_string() {
                    errors.push(format!("{item_label} {idx} must be a string"));
                }
            }
            Some(items.len())
        }
        _ => {
            errors.push(format!(
                r#"Missing or invalid "{field}" (must be array with at least 2 items)"#
            ));
            None
        }
    }
}

fn check_multiple_choice(q: &Map<String, Value>, errors: &mut Vec<String>) {
    check_prompt(q, errors);
    let options = check_string_list(q, "options", "Option", errors);

    let answer = q.get("correctAnswer").and_then(as_index);
    let in_bounds = match (answer, options) {
        (Some(answer), Some(len)) => answer < len,
        (Some(_), None) => true,
        (None, _) => false,
    };
    if !in_bounds {
        errors.push(r#"Missing or invalid "correctAnswer" (must be valid option index)"#.into());
    }
}

fn check_true_false(q: &Map<String, Value>, errors: &mut Vec<String>) {
    if !is_non_empty_str(q, "statement") {
        errors.push(r#"Missing or invalid "statement" (must be string)"#.into());
    }
    if !matches!(q.get("correctAnswer"), Some(Value::Bool(_))) {
        errors.push(r#"Missing or invalid "correctAnswer" (must be boolean)"#.into());
    }
}

fn check_order_steps(q: &Map<String, Value>, errors: &mut Vec<String>) {
    check_prompt(q, errors);
    let steps = check_string_list(q, "steps", "Step", errors);

    match q.get("correctOrder") {
        Some(Value::Array(order)) if !order.is_empty() => {
            for (position, entry) in order.iter().enumerate() {
                let valid = match (as_index(entry), steps) {
                    (Some(index), Some(len)) => index < len,
                    (Some(_), None) => true,
                    (None, _) => false,
                };
                if !valid {
                    errors.push(format!(
                        r#"Invalid "correctOrder" entry at position {position} (must be a step index)"#
                    ));
                }
            }
        }
        _ => errors.push(r#"Missing or invalid "correctOrder" (must be array of indices)"#.into()),
    }
}

fn check_match_items(q: &Map<String, Value>, errors: &mut Vec<String>) {
    check_prompt(q, errors);

    let pairs = q.get("pairs").and_then(Value::as_array);
    if pairs.is_none_or(|pairs| pairs.len() < 2) {
        errors.push(r#"Missing or invalid "pairs" (must be array with at least 2 items)"#.into());
    }

    for (idx, pair) in pairs.into_iter().flatten().enumerate() {
        let Value::Object(pair) = pair else {
            errors.push(format!(r#"Pair {idx} must be an object with "left" and "right""#));
            continue;
        };
        for side in ["left", "right"] {
            if !pair.get(side).is_some_and(Value::is_string) {
                errors.push(format!(
                    r#"Pair {idx} missing or invalid "{side}" (must be string)"#
                ));
            }
        }
    }
}

fn check_fill_in_the_blank(q: &Map<String, Value>, errors: &mut Vec<String>) {
    check_prompt(q, errors);

    let invalid = r#"Invalid "correctText" (must be a non-empty string or an array of non-empty strings)"#;
    match q.get("correctText") {
        None | Some(Value::Null) => errors.push(r#"Missing "correctText""#.into()),
        Some(Value::String(text)) if text.is_empty() => {
            errors.push(r#"Missing "correctText""#.into());
        }
        Some(Value::String(text)) => {
            if text.trim().is_empty() {
                errors.push(invalid.into());
            }
        }
        Some(Value::Array(items)) if items.is_empty() => {
            errors.push(r#""correctText" array cannot be empty"#.into());
        }
        Some(Value::Array(items)) => {
            let all_filled = items
                .iter()
                .all(|item| item.as_str().is_some_and(|s| !s.trim().is_empty()));
            if !all_filled {
                errors.push(invalid.into());
            }
        }
        Some(_) => errors.push(invalid.into()),
    }
}

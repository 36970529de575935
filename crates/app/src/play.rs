//! Interactive terminal session over a `QuizStore`.

use std::io::{self, BufRead, Write};

use quiz_core::model::{AnswerValue, MatchPair, MatchSelection, Question, QuestionKind};
use services::{QuizStore, StoreError};

const HELP: &str = "Commands: :prev, :skip, :end";

/// Parse one typed line into an answer for `kind`. Numbers are 1-based and
/// match-item letters refer to [`right_display_order`].
pub fn parse_answer(kind: &QuestionKind, input: &str) -> Option<AnswerValue> {
    let input = input.trim();
    match kind {
        QuestionKind::MultipleChoice { options, .. } => {
            let index = parse_position(input, options.len())?;
            i64::try_from(index).ok().map(AnswerValue::Index)
        }
        QuestionKind::TrueFalse { .. } => match input.to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" => Some(AnswerValue::Bool(true)),
            "f" | "false" | "n" | "no" => Some(AnswerValue::Bool(false)),
            _ => None,
        },
        QuestionKind::OrderSteps { steps, .. } => {
            let order = input
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(|part| parse_position(part, steps.len()).and_then(|i| i64::try_from(i).ok()))
                .collect::<Option<Vec<_>>>()?;
            (order.len() == steps.len()).then_some(AnswerValue::Sequence(order))
        }
        QuestionKind::MatchItems { pairs, .. } => {
            let display = right_display_order(pairs);
            let letters: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
            if letters.len() != pairs.len() {
                return None;
            }
            letters
                .into_iter()
                .enumerate()
                .map(|(left, letter)| {
                    let slot = letter_slot(letter)?;
                    let right = *display.get(slot)?;
                    Some(MatchSelection { left, right })
                })
                .collect::<Option<Vec<_>>>()
                .map(AnswerValue::Matches)
        }
        QuestionKind::FillInTheBlank { .. } => {
            (!input.is_empty()).then(|| AnswerValue::Text(input.to_owned()))
        }
    }
}

/// Pair indexes ordered by their right-hand text, for lettered display.
pub fn right_display_order(pairs: &[MatchPair]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..pairs.len()).collect();
    order.sort_by(|&a, &b| pairs[a].right.cmp(&pairs[b].right));
    order
}

fn parse_position(raw: &str, len: usize) -> Option<usize> {
    let position: usize = raw.trim().parse().ok()?;
    (1..=len).contains(&position).then(|| position - 1)
}

fn letter_slot(letter: char) -> Option<usize> {
    let letter = letter.to_ascii_lowercase();
    letter
        .is_ascii_lowercase()
        .then(|| usize::from(letter as u8 - b'a'))
}

fn slot_letter(slot: usize) -> char {
    u8::try_from(slot)
        .ok()
        .and_then(|slot| b'a'.checked_add(slot))
        .map_or('?', char::from)
}

fn render_question(
    out: &mut impl Write,
    question: &Question,
    position: usize,
    total: usize,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "[{position}/{total}] {} · {} · {}",
        question.category(),
        question.difficulty(),
        question.question_type()
    )?;
    writeln!(out, "{}", question.prompt())?;
    match question.kind() {
        QuestionKind::MultipleChoice { options, .. } => {
            for (i, option) in options.iter().enumerate() {
                writeln!(out, "  {}. {option}", i + 1)?;
            }
            writeln!(out, "Answer with the option number.")
        }
        QuestionKind::TrueFalse { .. } => writeln!(out, "Answer true or false."),
        QuestionKind::OrderSteps { steps, .. } => {
            for (i, step) in steps.iter().enumerate() {
                writeln!(out, "  {}. {step}", i + 1)?;
            }
            writeln!(out, "List the step numbers in the right order.")
        }
        QuestionKind::MatchItems { pairs, .. } => {
            for (i, pair) in pairs.iter().enumerate() {
                writeln!(out, "  {}. {}", i + 1, pair.left)?;
            }
            for (slot, &pair) in right_display_order(pairs).iter().enumerate() {
                writeln!(out, "  {}) {}", slot_letter(slot), pairs[pair].right)?;
            }
            writeln!(out, "Give one letter per numbered item, e.g. \"bac\".")
        }
        QuestionKind::FillInTheBlank { .. } => writeln!(out, "Type the missing text."),
    }
}

/// Run the current session to completion, reading answers from `input`.
///
/// # Errors
///
/// Returns an error if reading or writing the terminal fails, or if no
/// session is active.
pub fn run(
    store: &mut QuizStore,
    mut input: impl BufRead,
    mut out: impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(out, "{HELP}")?;

    loop {
        let session = store.current_session().ok_or(StoreError::NoActiveSession)?;
        if session.is_complete() {
            break;
        }
        let Some(question) = session.current_question().cloned() else {
            break;
        };
        let total = session.len();
        let position = session.current_question_index() + 1;
        let already = session.answer_for(question.id()).is_some();

        render_question(&mut out, &question, position, total)?;
        if already {
            writeln!(out, "(already answered; a new answer does not change the score)")?;
        }
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            store.end_session()?;
            break;
        }

        match line.trim() {
            ":prev" => store.previous_question()?,
            ":skip" => store.next_question()?,
            ":end" => store.end_session()?,
            raw => match parse_answer(question.kind(), raw) {
                Some(answer) => {
                    if let Some(outcome) = store.answer_question(question.id(), answer)? {
                        writeln!(
                            out,
                            "{}",
                            if outcome.is_correct { "Correct!" } else { "Incorrect." }
                        )?;
                        if let Some(explanation) = question.explanation() {
                            writeln!(out, "{explanation}")?;
                        }
                    }
                    store.next_question()?;
                }
                None => writeln!(out, "Could not read that answer. {HELP}")?,
            },
        }
    }

    if let Some(results) = store.results() {
        writeln!(out)?;
        writeln!(out, "{}", results.band)?;
        writeln!(
            out,
            "{} of {} correct ({}%)",
            results.correct, results.total, results.percentage
        )?;
        for item in &results.incorrect_items {
            writeln!(out, "  missed: {}", item.prompt)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{ConfigId, Difficulty, QuestionId, SessionConfig};
    use quiz_core::time::{fixed_clock, fixed_now};
    use std::sync::Arc;
    use storage::InMemoryStore;

    fn match_kind() -> QuestionKind {
        QuestionKind::MatchItems {
            question: "Match".into(),
            pairs: vec![
                MatchPair::new("Dog", "Woof"),
                MatchPair::new("Cat", "Meow"),
                MatchPair::new("Cow", "Moo"),
            ],
        }
    }

    #[test]
    fn parses_one_based_positions() {
        let kind = QuestionKind::MultipleChoice {
            question: "Q".into(),
            options: vec!["a".into(), "b".into()],
            correct_answer: 1,
        };
        assert_eq!(parse_answer(&kind, "2"), Some(AnswerValue::Index(1)));
        assert_eq!(parse_answer(&kind, "0"), None);
        assert_eq!(parse_answer(&kind, "3"), None);

        let order = QuestionKind::OrderSteps {
            question: "Q".into(),
            steps: vec!["x".into(), "y".into(), "z".into()],
            correct_order: vec![2, 0, 1],
        };
        assert_eq!(
            parse_answer(&order, "3, 1 2"),
            Some(AnswerValue::Sequence(vec![2, 0, 1]))
        );
        assert_eq!(parse_answer(&order, "3 1"), None);
    }

    #[test]
    fn match_letters_follow_sorted_right_column() {
        let kind = match_kind();
        let QuestionKind::MatchItems { pairs, .. } = &kind else {
            unreachable!()
        };
        // Meow, Moo, Woof
        assert_eq!(right_display_order(pairs), vec![1, 2, 0]);

        let answer = parse_answer(&kind, "c a b").unwrap();
        assert_eq!(
            answer,
            AnswerValue::Matches(vec![
                MatchSelection { left: 0, right: 0 },
                MatchSelection { left: 1, right: 1 },
                MatchSelection { left: 2, right: 2 },
            ])
        );
        assert_eq!(parse_answer(&kind, "cz b"), None);
    }

    #[test]
    fn true_false_and_text_answers() {
        let tf = QuestionKind::TrueFalse {
            statement: "S".into(),
            correct_answer: false,
        };
        assert_eq!(parse_answer(&tf, " No "), Some(AnswerValue::Bool(false)));
        assert_eq!(parse_answer(&tf, "maybe"), None);

        let blank = QuestionKind::FillInTheBlank {
            question: "Q".into(),
            correct_text: quiz_core::model::CorrectText::One("Paris".into()),
        };
        assert_eq!(parse_answer(&blank, "   "), None);
        assert_eq!(
            parse_answer(&blank, " paris "),
            Some(AnswerValue::Text("paris".into()))
        );
    }

    #[tokio::test]
    async fn scripted_session_prints_results() {
        let mut store = QuizStore::new(fixed_clock(), Arc::new(InMemoryStore::new()));
        let questions = ["a", "b"]
            .iter()
            .map(|id| {
                Question::new(
                    QuestionId::new(*id),
                    "Trivia",
                    Difficulty::Easy,
                    QuestionKind::TrueFalse {
                        statement: format!("Statement {id}"),
                        correct_answer: true,
                    },
                    fixed_now(),
                )
                .unwrap()
            })
            .collect();
        store.set_questions(questions).await;
        let config = SessionConfig::new(ConfigId::new("c"), "All", 10, fixed_now()).unwrap();
        store.start_session(config, None);

        let mut out = Vec::new();
        run(&mut store, "t\nwat\nf\n".as_bytes(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Could not read that answer."));
        assert!(text.contains("1 of 2 correct (50%)"));
        assert!(text.contains("missed: Statement b"));
        assert!(store.current_session().unwrap().is_complete());
    }
}

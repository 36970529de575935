use crate::model::{AnswerValue, CorrectText, MatchPair, MatchSelection, Question, QuestionKind};

/// Characters dropped from fill-in-the-blank text before comparison.
const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')',
];

/// Decide whether `answer` is correct for `question`.
///
/// Answers whose shape does not fit the question type are incorrect; this
/// never fails.
///
/// # Examples
///
/// ```
/// # use quiz_core::model::{AnswerValue, CorrectText, Difficulty, Question, QuestionId, QuestionKind};
/// # use quiz_core::time::fixed_now;
/// # use quiz_core::is_correct;
/// let question = Question::new(
///     QuestionId::new("capital"),
///     "Geography",
///     Difficulty::Easy,
///     QuestionKind::FillInTheBlank {
///         question: "Capital of France?".into(),
///         correct_text: CorrectText::One("Paris".into()),
///     },
///     fixed_now(),
/// )
/// .unwrap();
///
/// assert!(is_correct(&question, &AnswerValue::from("  paris!")));
/// assert!(!is_correct(&question, &AnswerValue::from("pariss")));
/// ```
#[must_use]
pub fn is_correct(question: &Question, answer: &AnswerValue) -> bool {
    match question.kind() {
        QuestionKind::MultipleChoice { correct_answer, .. } => match answer {
            AnswerValue::Index(index) => {
                usize::try_from(*index).is_ok_and(|index| index == *correct_answer)
            }
            _ => false,
        },
        QuestionKind::TrueFalse { correct_answer, .. } => {
            matches!(answer, AnswerValue::Bool(value) if value == correct_answer)
        }
        QuestionKind::OrderSteps { correct_order, .. } => match answer {
            AnswerValue::Sequence(order) => {
                order.len() == correct_order.len()
                    && order
                        .iter()
                        .zip(correct_order)
                        .all(|(given, &expected)| usize::try_from(*given) == Ok(expected))
            }
            _ => false,
        },
        QuestionKind::MatchItems { pairs, .. } => match answer {
            AnswerValue::Matches(selections) => matches_pairs(pairs, selections),
            // `[]` on the wire parses as an empty sequence, not as matches.
            AnswerValue::Sequence(order) if order.is_empty() => true,
            _ => false,
        },
        QuestionKind::FillInTheBlank { correct_text, .. } => match answer {
            AnswerValue::Text(text) => text_matches(correct_text, text),
            _ => false,
        },
    }
}

/// Every selection must point a left index at a pair whose right-hand text is
/// the same as the left pair's own right-hand text. With unique right texts
/// this means `left == right`. An empty selection holds vacuously.
fn matches_pairs(pairs: &[MatchPair], selections: &[MatchSelection]) -> bool {
    selections.iter().all(|selection| {
        match (pairs.get(selection.left), pairs.get(selection.right)) {
            (Some(left), Some(right)) => left.right == right.right,
            _ => false,
        }
    })
}

fn text_matches(correct_text: &CorrectText, answer: &str) -> bool {
    let answer = normalize_text(answer);
    correct_text
        .candidates()
        .any(|candidate| normalize_text(candidate) == answer)
}

/// Lower-case, trim, then strip the punctuation set.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .trim()
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, QuestionId};
    use crate::time::fixed_now;

    fn build(kind: QuestionKind) -> Question {
        Question::new(
            QuestionId::new("q"),
            "Test",
            Difficulty::Medium,
            kind,
            fixed_now(),
        )
        .unwrap()
    }

    fn multiple_choice() -> Question {
        build(QuestionKind::MultipleChoice {
            question: "Powerhouse of the cell?".into(),
            options: vec![
                "Nucleus".into(),
                "Mitochondria".into(),
                "Ribosome".into(),
            ],
            correct_answer: 1,
        })
    }

    fn order_steps() -> Question {
        build(QuestionKind::OrderSteps {
            question: "Order the phases".into(),
            steps: vec!["C".into(), "A".into(), "B".into()],
            correct_order: vec![1, 2, 0],
        })
    }

    fn match_items() -> Question {
        build(QuestionKind::MatchItems {
            question: "Match organelles".into(),
            pairs: vec![
                MatchPair::new("Nucleus", "DNA storage"),
                MatchPair::new("Ribosome", "Protein synthesis"),
                MatchPair::new("Chloroplast", "Photosynthesis"),
            ],
        })
    }

    fn fill_in(correct_text: CorrectText) -> Question {
        build(QuestionKind::FillInTheBlank {
            question: "Name it".into(),
            correct_text,
        })
    }

    #[test]
    fn multiple_choice_requires_exact_index() {
        let q = multiple_choice();
        assert!(is_correct(&q, &AnswerValue::Index(1)));
        assert!(!is_correct(&q, &AnswerValue::Index(0)));
        assert!(!is_correct(&q, &AnswerValue::Index(2)));
        assert!(!is_correct(&q, &AnswerValue::Index(-1)));
        assert!(!is_correct(&q, &AnswerValue::Text("1".into())));
    }

    #[test]
    fn true_false_compares_booleans() {
        let q = build(QuestionKind::TrueFalse {
            statement: "Water boils at 100C at sea level".into(),
            correct_answer: true,
        });
        assert!(is_correct(&q, &AnswerValue::Bool(true)));
        assert!(!is_correct(&q, &AnswerValue::Bool(false)));
        assert!(!is_correct(&q, &AnswerValue::Index(1)));
    }

    #[test]
    fn order_steps_requires_same_sequence() {
        let q = order_steps();
        assert!(is_correct(&q, &AnswerValue::Sequence(vec![1, 2, 0])));
        assert!(!is_correct(&q, &AnswerValue::Sequence(vec![1, 0, 2])));
        assert!(!is_correct(&q, &AnswerValue::Sequence(vec![1, 2])));
        assert!(!is_correct(&q, &AnswerValue::Sequence(vec![1, 2, 0, 0])));
    }

    #[test]
    fn order_steps_rejects_every_other_permutation() {
        let q = order_steps();
        let permutations = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for perm in permutations {
            assert!(!is_correct(&q, &AnswerValue::Sequence(perm.to_vec())), "{perm:?}");
        }
    }

    #[test]
    fn match_items_accepts_identity_pairing() {
        let q = match_items();
        let answer = AnswerValue::Matches(
            (0..3).map(|i| MatchSelection { left: i, right: i }).collect(),
        );
        assert!(is_correct(&q, &answer));
    }

    #[test]
    fn match_items_rejects_swapped_pairing() {
        let q = match_items();
        let answer = AnswerValue::Matches(vec![
            MatchSelection { left: 0, right: 1 },
            MatchSelection { left: 1, right: 0 },
            MatchSelection { left: 2, right: 2 },
        ]);
        assert!(!is_correct(&q, &answer));
    }

    #[test]
    fn match_items_compares_right_text_not_index() {
        let q = build(QuestionKind::MatchItems {
            question: "Match the mammals".into(),
            pairs: vec![
                MatchPair::new("Whale", "Mammal"),
                MatchPair::new("Bat", "Mammal"),
            ],
        });
        let answer = AnswerValue::Matches(vec![
            MatchSelection { left: 0, right: 1 },
            MatchSelection { left: 1, right: 0 },
        ]);
        assert!(is_correct(&q, &answer));
    }

    #[test]
    fn match_items_fails_closed_on_out_of_range() {
        let q = match_items();
        assert!(!is_correct(
            &q,
            &AnswerValue::Matches(vec![MatchSelection { left: 7, right: 9 }])
        ));
        assert!(!is_correct(
            &q,
            &AnswerValue::Matches(vec![
                MatchSelection { left: 0, right: 0 },
                MatchSelection { left: 1, right: 5 },
            ])
        ));
        assert!(!is_correct(&q, &AnswerValue::Sequence(vec![0, 1])));
    }

    #[test]
    fn match_items_empty_selection_holds_vacuously() {
        let q = match_items();
        assert!(is_correct(&q, &AnswerValue::Matches(Vec::new())));

        let from_wire: AnswerValue = serde_json::from_str("[]").unwrap();
        assert_eq!(from_wire, AnswerValue::Sequence(Vec::new()));
        assert!(is_correct(&q, &from_wire));
    }

    #[test]
    fn fill_in_ignores_case_whitespace_and_punctuation() {
        let q = fill_in(CorrectText::One("Paris".into()));
        assert!(is_correct(&q, &AnswerValue::from("  paris!")));
        assert!(is_correct(&q, &AnswerValue::from("PARIS.")));
        assert!(!is_correct(&q, &AnswerValue::from("pariss")));
        assert!(!is_correct(&q, &AnswerValue::Index(0)));
    }

    #[test]
    fn fill_in_accepts_any_alternative() {
        let q = fill_in(CorrectText::AnyOf(vec!["NYC".into(), "New York".into()]));
        assert!(is_correct(&q, &AnswerValue::from("new york")));
        assert!(is_correct(&q, &AnswerValue::from("n.y.c")));
        assert!(!is_correct(&q, &AnswerValue::from("Boston")));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let q = multiple_choice();
        let answer = AnswerValue::Index(1);
        assert_eq!(is_correct(&q, &answer), is_correct(&q, &answer));
    }

    #[test]
    fn normalize_strips_listed_punctuation_only() {
        assert_eq!(normalize_text(" Hello, World! "), "hello world");
        assert_eq!(normalize_text("a-b_c(d)"), "abcd");
        assert_eq!(normalize_text("why?"), "why?");
    }
}

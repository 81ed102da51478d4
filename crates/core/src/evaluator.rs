use crate::model::{AnswerKey, Question, Verdict, letter_to_index};

/// Decides whether a submitted value answers a question correctly.
///
/// `submitted` is the raw value collected from the user:
///
/// * `choice` - the text of the picked option (matched by value, then by position)
/// * `true_false` - one of the sentinel symbols `√` / `×`
/// * `fill` - free text, compared to the expected text after trimming both sides
/// * `short_answer` - anything; self-assessed, so always reported correct
///
/// No case folding or punctuation normalization is applied.
///
/// # Examples
///
/// ```
/// # use quiz_core::evaluator::evaluate;
/// # use quiz_core::model::{QuestionDraft, QuestionId};
/// let question = QuestionDraft {
///     kind: "choice".into(),
///     prompt: "Which keyword removes duplicates?".into(),
///     options: vec!["UNIQUE".into(), "DISTINCT".into()],
///     answer: "B".into(),
///     ..QuestionDraft::default()
/// }
/// .validate()
/// .unwrap()
/// .assign_id(QuestionId::new(1));
///
/// assert!(evaluate(&question, "DISTINCT"));
/// assert!(!evaluate(&question, "UNIQUE"));
/// ```
#[must_use]
pub fn evaluate(question: &Question, submitted: &str) -> bool {
    match question.key() {
        AnswerKey::Choice { options, letter } => {
            let Some(expected) = letter_to_index(letter) else {
                return false;
            };
            options
                .iter()
                .position(|option| option == submitted)
                .is_some_and(|picked| picked == expected)
        }
        AnswerKey::TrueFalse(verdict) => Verdict::from_symbol(submitted) == Some(*verdict),
        AnswerKey::Fill(expected) => submitted.trim() == expected.trim(),
        AnswerKey::ShortAnswer(_) => true,
    }
}

use serde::Serialize;
use thiserror::Error;

/// Number of answer options offered for every question.
pub const OPTIONS_COUNT: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("max sum must be at least 2, got {0}")]
    MaxSumTooSmall(u32),

    #[error("option {0} appears more than once")]
    DuplicateOption(u32),

    #[error("right answer {0} is not among the options")]
    RightAnswerMissing(u32),

    #[error("{visible} + {answer} does not equal {sum}")]
    WrongCompletion { visible: u32, answer: u32, sum: u32 },
}

/// One "visible number + ? = sum" prompt with its answer options.
///
/// Questions are immutable; a session replaces the current question rather
/// than mutating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    sum: u32,
    visible_number: u32,
    options: [u32; OPTIONS_COUNT],
    right_answer: u32,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuestionError` if the options are not pairwise distinct, do not
    /// contain `right_answer`, or `visible_number + right_answer != sum`.
    pub fn new(
        sum: u32,
        visible_number: u32,
        options: [u32; OPTIONS_COUNT],
        right_answer: u32,
    ) -> Result<Self, QuestionError> {
        if visible_number.checked_add(right_answer) != Some(sum) {
            return Err(QuestionError::WrongCompletion {
                visible: visible_number,
                answer: right_answer,
                sum,
            });
        }
        for (idx, option) in options.iter().enumerate() {
            if options[idx + 1..].contains(option) {
                return Err(QuestionError::DuplicateOption(*option));
            }
        }
        if !options.contains(&right_answer) {
            return Err(QuestionError::RightAnswerMissing(right_answer));
        }

        Ok(Self {
            sum,
            visible_number,
            options,
            right_answer,
        })
    }

    #[must_use]
    pub fn sum(&self) -> u32 {
        self.sum
    }

    #[must_use]
    pub fn visible_number(&self) -> u32 {
        self.visible_number
    }

    #[must_use]
    pub fn options(&self) -> &[u32; OPTIONS_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn right_answer(&self) -> u32 {
        self.right_answer
    }

    #[must_use]
    pub fn is_right(&self, value: u32) -> bool {
        value == self.right_answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_question() {
        let question = Question::new(9, 4, [0, 5, 2, 7, 1, 3], 5).unwrap();
        assert!(question.is_right(5));
        assert!(!question.is_right(4));
        assert_eq!(question.options().len(), OPTIONS_COUNT);
    }

    #[test]
    fn rejects_broken_invariants() {
        assert_eq!(
            Question::new(9, 4, [0, 5, 5, 7, 1, 3], 5).unwrap_err(),
            QuestionError::DuplicateOption(5)
        );
        assert_eq!(
            Question::new(9, 4, [0, 6, 2, 7, 1, 3], 5).unwrap_err(),
            QuestionError::RightAnswerMissing(5)
        );
        assert!(matches!(
            Question::new(9, 3, [0, 5, 2, 7, 1, 3], 5).unwrap_err(),
            QuestionError::WrongCompletion { .. }
        ));
    }
}

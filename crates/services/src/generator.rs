use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use quiz_core::model::{MIN_SUM_VALUE, OPTIONS_COUNT, Question, QuestionError};

/// Anything that can hand a session its next question.
pub trait QuestionSource: Send {
    /// # Errors
    ///
    /// Returns `QuestionError` if no valid question exists for `max_sum`.
    fn next_question(&mut self, max_sum: u32) -> Result<Question, QuestionError>;
}

/// Uniform random question generator.
///
/// Draws the visible number from `[1, max_sum - 1]`, the sum from
/// `[visible, max_sum]`, and five distinct distractors from `[0, upper]`
/// where `upper = max(max_sum, OPTIONS_COUNT - 1)`, so tiny bounds still
/// yield six distinct options.
pub struct QuestionGenerator {
    rng: StdRng,
}

impl QuestionGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Reproducible generator for tests and replays.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate one question for the given sum bound.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::MaxSumTooSmall` if `max_sum < 2`.
    pub fn generate(&mut self, max_sum: u32) -> Result<Question, QuestionError> {
        if max_sum < MIN_SUM_VALUE {
            return Err(QuestionError::MaxSumTooSmall(max_sum));
        }

        let visible_number = self.rng.random_range(1..max_sum);
        let sum = self.rng.random_range(visible_number..=max_sum);
        let right_answer = sum - visible_number;

        let upper = max_sum.max(OPTIONS_COUNT as u32 - 1);
        let mut options = [right_answer; OPTIONS_COUNT];
        let mut filled = 1;
        while filled < OPTIONS_COUNT {
            let candidate = self.rng.random_range(0..=upper);
            if !options[..filled].contains(&candidate) {
                options[filled] = candidate;
                filled += 1;
            }
        }
        options.shuffle(&mut self.rng);

        Question::new(sum, visible_number, options, right_answer)
    }
}

impl Default for QuestionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionSource for QuestionGenerator {
    fn next_question(&mut self, max_sum: u32) -> Result<Question, QuestionError> {
        self.generate(max_sum)
    }
}

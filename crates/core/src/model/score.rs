use serde::Serialize;

/// Running tally of answers within one session.
///
/// Counts only grow; a fresh tracker is the only way to reset them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreTracker {
    correct_count: u32,
    total_count: u32,
}

impl ScoreTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every answer counts toward the total; only right ones toward `correct_count`.
    pub fn record_answer(&mut self, is_correct: bool) {
        self.total_count = self.total_count.saturating_add(1);
        if is_correct {
            self.correct_count = self.correct_count.saturating_add(1);
        }
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// Floor of `correct / total * 100`, or 0 before the first answer.
    #[must_use]
    pub fn percent_correct(&self) -> u8 {
        percent_of(self.correct_count, self.total_count)
    }

    #[must_use]
    pub fn meets_count_threshold(&self, min: u32) -> bool {
        self.correct_count >= min
    }

    #[must_use]
    pub fn meets_percent_threshold(&self, min: u8) -> bool {
        self.percent_correct() >= min
    }
}

pub(crate) fn percent_of(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = u64::from(correct.min(total)) * 100 / u64::from(total);
    u8::try_from(percent).unwrap_or(100)
}

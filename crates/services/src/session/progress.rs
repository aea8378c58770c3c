use serde::Serialize;

use quiz_core::model::{GameSettings, ScoreTracker};

/// Aggregated view of session progress, useful for UI.
///
/// Every field is derived from the same score snapshot, so observers never
/// see a count that disagrees with its flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub correct_count: u32,
    pub total_count: u32,
    pub percent_correct: u8,
    pub min_count: u32,
    pub min_percent: u8,
    /// `"{correct}/{min_required}"`
    pub progress_label: String,
    pub enough_count: bool,
    pub enough_percent: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn derive(score: &ScoreTracker, settings: &GameSettings) -> Self {
        let min_count = settings.min_count_right_answers();
        let min_percent = settings.min_percent_right_answers();
        Self {
            correct_count: score.correct_count(),
            total_count: score.total_count(),
            percent_correct: score.percent_correct(),
            min_count,
            min_percent,
            progress_label: format!("{}/{}", score.correct_count(), min_count),
            enough_count: score.meets_count_threshold(min_count),
            enough_percent: score.meets_percent_threshold(min_percent),
        }
    }
}

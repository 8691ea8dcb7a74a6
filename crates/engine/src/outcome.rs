//! Outcome matching — did a forecast name the realized outcome?
//!
//! Two judgments exist side by side:
//! - [`is_prediction_correct`]: strict boolean used for win-rate math. Binary
//!   "yes"/"no" outcomes require exact equality; free-text outcomes match by
//!   substring inclusion in either direction.
//! - [`judge_outcome`]: tri-state verdict used for badges. It stays
//!   undetermined while the real outcome is unknown and only checks that the
//!   prediction contains the real outcome.

use serde::{Deserialize, Serialize};

/// Placeholder stored when a market resolved without a readable outcome
pub const UNKNOWN_OUTCOME: &str = "Unknown";
/// Placeholder stored when the resolution scraper failed
pub const PARSE_ERROR_OUTCOME: &str = "Parse Error";

/// True when `real` carries an actual resolution
pub fn is_resolved(real: Option<&str>) -> bool {
    matches!(real, Some(r) if !r.is_empty() && r != UNKNOWN_OUTCOME && r != PARSE_ERROR_OUTCOME)
}

/// Strict correctness check. Blank input on either side is never correct.
pub fn is_prediction_correct(prediction: Option<&str>, real: Option<&str>) -> bool {
    let (Some(prediction), Some(real)) = (prediction, real) else {
        return false;
    };
    let prediction = prediction.trim().to_lowercase();
    let real = real.trim().to_lowercase();
    if prediction.is_empty() || real.is_empty() {
        return false;
    }

    // "yes" must not match a free-text answer that merely contains it
    if real == "yes" || real == "no" {
        return prediction == real;
    }

    prediction.contains(&real) || real.contains(&prediction)
}

/// Badge verdict for a single forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Incorrect,
    Undetermined,
}

/// Lenient tri-state judgment: prediction contains real, case-insensitive.
pub fn judge_outcome(prediction: Option<&str>, real: Option<&str>) -> Verdict {
    let Some(prediction) = prediction.filter(|p| !p.is_empty()) else {
        return Verdict::Undetermined;
    };
    if !is_resolved(real) {
        return Verdict::Undetermined;
    }
    let real = real.unwrap_or_default().to_lowercase();

    if prediction.to_lowercase().contains(&real) {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_outcomes_need_exact_match() {
        assert!(is_prediction_correct(Some("Yes"), Some("Yes")));
        assert!(!is_prediction_correct(Some("Yes"), Some("No")));
        assert!(is_prediction_correct(Some("Yes"), Some("yes")));
        assert!(is_prediction_correct(Some("  no "), Some("No")));
        // free text containing "yes" is not a yes
        assert!(!is_prediction_correct(Some("yes, probably"), Some("Yes")));
    }

    #[test]
    fn test_blank_inputs_are_incorrect() {
        assert!(!is_prediction_correct(Some(""), Some("Yes")));
        assert!(!is_prediction_correct(Some("Yes"), None));
        assert!(!is_prediction_correct(None, Some("Trump")));
        assert!(!is_prediction_correct(Some("Trump"), Some("   ")));
    }

    #[test]
    fn test_free_text_matches_either_direction() {
        assert!(is_prediction_correct(Some("Trump will win big"), Some("Trump")));
        assert!(is_prediction_correct(Some("Trump"), Some("Donald Trump")));
        assert!(!is_prediction_correct(Some("Harris"), Some("Trump")));
    }

    #[test]
    fn test_judge_outcome_undetermined_cases() {
        assert_eq!(judge_outcome(Some("Yes"), None), Verdict::Undetermined);
        assert_eq!(judge_outcome(Some("Yes"), Some("Unknown")), Verdict::Undetermined);
        assert_eq!(judge_outcome(Some("Yes"), Some("Parse Error")), Verdict::Undetermined);
        assert_eq!(judge_outcome(None, Some("Yes")), Verdict::Undetermined);
        assert_eq!(judge_outcome(Some(""), Some("Yes")), Verdict::Undetermined);
    }

    #[test]
    fn test_judge_outcome_is_one_directional_substring() {
        assert_eq!(judge_outcome(Some("Yes"), Some("yes")), Verdict::Correct);
        assert_eq!(judge_outcome(Some("No"), Some("Yes")), Verdict::Incorrect);
        // lenient: free text containing "yes" counts for the badge
        assert_eq!(judge_outcome(Some("yes, probably"), Some("Yes")), Verdict::Correct);
        // prediction shorter than real does not match
        assert_eq!(judge_outcome(Some("Trump"), Some("Donald Trump")), Verdict::Incorrect);
    }
}

//! Hourly activity profiles — chance that a tracked handle posts in each hour
//!
//! Hours are Beijing time. The clock is a flat +8h shift from UTC with no
//! timezone database, which is exact for Asia/Shanghai (no DST).

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use persistence::repository::ActivityProfileRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

pub type ActivityProfileRow = ActivityProfileRecord;

pub const HOURS_PER_DAY: usize = 24;
pub const BEIJING_OFFSET_HOURS: i64 = 8;
pub const DEFAULT_HANDLES: [&str; 2] = ["@cz_binance", "@heyibinance"];

/// Which kind of tweets a profile counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    #[default]
    All,
    Post,
    Retweet,
}

impl ActivityCategory {
    /// Value stored in the `category` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Post => "post",
            Self::Retweet => "retweet",
        }
    }
}

impl FromStr for ActivityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "post" => Ok(Self::Post),
            "retweet" => Ok(Self::Retweet),
            other => Err(format!("unknown category '{other}' (expected all, post, retweet)")),
        }
    }
}

/// One hour of the chart: handle -> probability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourBucket {
    pub hour: u32,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// Always exactly 24 buckets, index == hour
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ActivityProfileSeries(Vec<HourBucket>);

impl ActivityProfileSeries {
    fn zeroed(handles: &[String]) -> Self {
        let template: BTreeMap<String, f64> = handles.iter().map(|h| (h.clone(), 0.0)).collect();
        Self(
            (0..HOURS_PER_DAY as u32)
                .map(|hour| HourBucket {
                    hour,
                    values: template.clone(),
                })
                .collect(),
        )
    }

    pub fn buckets(&self) -> &[HourBucket] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Probability for `handle` at `hour`, 0 when absent
    pub fn value(&self, hour: usize, handle: &str) -> f64 {
        self.0
            .get(hour)
            .and_then(|b| b.values.get(handle))
            .copied()
            .unwrap_or(0.0)
    }

    /// Probability now and in the following hour (wrapping at midnight)
    pub fn point(&self, handle: &str, current_hour: u32) -> HourPoint {
        let current = current_hour as usize % HOURS_PER_DAY;
        HourPoint {
            current: self.value(current, handle),
            next: self.value((current + 1) % HOURS_PER_DAY, handle),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourPoint {
    pub current: f64,
    pub next: f64,
}

/// Densify sparse rows. Out-of-range hours, untracked handles and
/// non-finite probabilities are ignored; duplicates are last-write-wins.
pub fn reduce_profiles(rows: &[ActivityProfileRow], handles: &[String]) -> ActivityProfileSeries {
    let mut series = ActivityProfileSeries::zeroed(handles);

    for row in rows {
        if !(0..HOURS_PER_DAY as i64).contains(&row.hour) || !row.probability.is_finite() {
            continue;
        }
        if let Some(slot) = series.0[row.hour as usize].values.get_mut(&row.handle) {
            *slot = row.probability;
        }
    }

    series
}

/// Beijing wall clock in storage conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeijingClock {
    pub hour: u32,
    /// 0 = Monday … 6 = Sunday
    pub day_of_week: u32,
    /// e.g. "2026/1/12 23:06"
    pub display: String,
}

pub fn beijing_clock(now: DateTime<Utc>) -> BeijingClock {
    let local = now.naive_utc() + Duration::hours(BEIJING_OFFSET_HOURS);
    // Sunday-based weekday to Monday-based storage index
    let sunday_based = local.weekday().num_days_from_sunday();

    BeijingClock {
        hour: local.hour(),
        day_of_week: (sunday_based + 6) % 7,
        display: local.format("%Y/%-m/%-d %H:%M").to_string(),
    }
}

/// Everything the speech probability page shows
#[derive(Debug, Clone, Serialize)]
pub struct SpeechProbability {
    pub category: ActivityCategory,
    pub clock: BeijingClock,
    pub series: ActivityProfileSeries,
    pub points: BTreeMap<String, HourPoint>,
}

/// `rows` should already be filtered to `clock.day_of_week`; rows of any
/// other category are ignored
pub fn speech_probability(
    rows: &[ActivityProfileRow],
    handles: &[String],
    category: ActivityCategory,
    clock: BeijingClock,
) -> SpeechProbability {
    let matching: Vec<ActivityProfileRow> = rows
        .iter()
        .filter(|r| r.category == category.as_str())
        .cloned()
        .collect();
    let series = reduce_profiles(&matching, handles);
    let points = handles
        .iter()
        .map(|h| (h.clone(), series.point(h, clock.hour)))
        .collect();

    SpeechProbability {
        category,
        clock,
        series,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(handle: &str, hour: i64, p: f64) -> ActivityProfileRow {
        ActivityProfileRow {
            handle: handle.into(),
            hour,
            day_of_week: 0,
            category: "all".into(),
            probability: p,
        }
    }

    fn handles() -> Vec<String> {
        vec!["@a".to_string(), "@b".to_string()]
    }

    #[test]
    fn test_sparse_rows_densify_to_24_hours() {
        let series = reduce_profiles(&[row("@a", 5, 0.3)], &handles());
        assert_eq!(series.len(), 24);
        for (i, bucket) in series.buckets().iter().enumerate() {
            assert_eq!(bucket.hour as usize, i);
            let expected_a = if i == 5 { 0.3 } else { 0.0 };
            assert_eq!(bucket.values["@a"], expected_a);
            assert_eq!(bucket.values["@b"], 0.0);
        }
    }

    #[test]
    fn test_empty_input_still_24_hours() {
        let series = reduce_profiles(&[], &[]);
        assert_eq!(series.len(), 24);
        assert!(series.buckets().iter().all(|b| b.values.is_empty()));
    }

    #[test]
    fn test_ignores_bad_rows_and_last_write_wins() {
        let rows = [
            row("@a", 24, 0.9),
            row("@a", -1, 0.9),
            row("@z", 3, 0.9),
            row("@b", 3, f64::NAN),
            row("@a", 7, 0.1),
            row("@a", 7, 0.2),
        ];
        let series = reduce_profiles(&rows, &handles());
        assert_eq!(series.len(), 24);
        assert_eq!(series.value(7, "@a"), 0.2);
        assert_eq!(series.value(3, "@b"), 0.0);
        assert!(!series.buckets()[3].values.contains_key("@z"));
    }

    #[test]
    fn test_point_wraps_past_midnight() {
        let series = reduce_profiles(&[row("@a", 23, 0.4), row("@a", 0, 0.6)], &handles());
        let point = series.point("@a", 23);
        assert_eq!(point, HourPoint { current: 0.4, next: 0.6 });
        assert_eq!(series.point("@missing", 23), HourPoint { current: 0.0, next: 0.0 });
    }

    #[test]
    fn test_beijing_clock_shift_and_weekday() {
        // Sunday 2026-01-11 20:30 UTC is Monday 04:30 in Beijing
        let now = Utc.with_ymd_and_hms(2026, 1, 11, 20, 30, 0).unwrap();
        let clock = beijing_clock(now);
        assert_eq!(clock.hour, 4);
        assert_eq!(clock.day_of_week, 0);
        assert_eq!(clock.display, "2026/1/12 04:30");

        // Saturday 2026-01-10 12:00 UTC is Saturday 20:00 in Beijing
        let clock = beijing_clock(Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap());
        assert_eq!(clock.hour, 20);
        assert_eq!(clock.day_of_week, 5);
    }

    #[test]
    fn test_speech_probability_points() {
        let clock = BeijingClock {
            hour: 5,
            day_of_week: 2,
            display: String::new(),
        };
        let view = speech_probability(
            &[row("@a", 5, 0.3), row("@b", 6, 0.8)],
            &handles(),
            ActivityCategory::All,
            clock,
        );
        assert_eq!(view.points["@a"], HourPoint { current: 0.3, next: 0.0 });
        assert_eq!(view.points["@b"], HourPoint { current: 0.0, next: 0.8 });
    }

    #[test]
    fn test_speech_probability_keeps_one_category() {
        let mut post = row("@a", 5, 0.9);
        post.category = "post".into();
        let mut retweet = row("@a", 5, 0.05);
        retweet.category = "retweet".into();
        let rows = [row("@a", 5, 0.3), post, retweet];
        let clock = BeijingClock {
            hour: 5,
            day_of_week: 2,
            display: String::new(),
        };

        let all = speech_probability(&rows, &handles(), ActivityCategory::All, clock.clone());
        assert_eq!(all.series.value(5, "@a"), 0.3);
        let post = speech_probability(&rows, &handles(), ActivityCategory::Post, clock);
        assert_eq!(post.points["@a"].current, 0.9);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Retweet".parse::<ActivityCategory>(), Ok(ActivityCategory::Retweet));
        assert_eq!(ActivityCategory::default().as_str(), "all");
        assert!("replies".parse::<ActivityCategory>().is_err());
    }
}

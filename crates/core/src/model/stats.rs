use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-category answer counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryStats {
    pub total: u32,
    pub correct: u32,
}

impl CategoryStats {
    pub fn record(&mut self, correct: bool) {
        self.total = self.total.saturating_add(1);
        if correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        accuracy_percent(self.correct, self.total)
    }
}

/// Aggregate answer statistics, owned and maintained by the question store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total_answered: u32,
    #[serde(default)]
    pub correct_answered: u32,
    #[serde(default)]
    pub wrong_count: u32,
    #[serde(default)]
    pub cat_stats: BTreeMap<String, CategoryStats>,
}

/// One row of the per-category breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAccuracy {
    pub category: String,
    pub total: u32,
    pub correct: u32,
    pub percent: u32,
}

impl Stats {
    /// Overall accuracy rounded to a whole percent; 0 when nothing was answered.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        accuracy_percent(self.correct_answered, self.total_answered)
    }

    #[must_use]
    pub fn category_breakdown(&self) -> Vec<CategoryAccuracy> {
        self.cat_stats
            .iter()
            .map(|(category, stats)| CategoryAccuracy {
                category: category.clone(),
                total: stats.total,
                correct: stats.correct,
                percent: stats.accuracy_percent(),
            })
            .collect()
    }
}

/// `correct / total` as a rounded whole percent; 0 when `total` is 0.
#[must_use]
pub fn accuracy_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let ratio = f64::from(correct) / f64::from(total);
    // ratio is clamped to [0, 1] so the cast cannot truncate
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = (ratio.clamp(0.0, 1.0) * 100.0).round() as u32;
    percent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_guards_division_by_zero() {
        assert_eq!(Stats::default().accuracy_percent(), 0);
        assert_eq!(CategoryStats::default().accuracy_percent(), 0);
    }

    #[test]
    fn accuracy_rounds_to_nearest_percent() {
        let stats = Stats {
            total_answered: 3,
            correct_answered: 2,
            ..Stats::default()
        };
        assert_eq!(stats.accuracy_percent(), 67);
    }

    #[test]
    fn breakdown_is_sorted_by_category() {
        let mut stats = Stats::default();
        stats.cat_stats.entry("Views".into()).or_default().record(true);
        stats.cat_stats.entry("Indexes".into()).or_default().record(false);
        stats.cat_stats.entry("Indexes".into()).or_default().record(true);

        let rows = stats.category_breakdown();
        assert_eq!(rows[0].category, "Indexes");
        assert_eq!(rows[0].percent, 50);
        assert_eq!(rows[1].category, "Views");
        assert_eq!(rows[1].percent, 100);
    }

    #[test]
    fn decodes_store_payload_with_missing_fields() {
        let stats: Stats = serde_json::from_str(r#"{"total_answered": 4}"#).unwrap();
        assert_eq!(stats.total_answered, 4);
        assert!(stats.cat_stats.is_empty());
    }
}

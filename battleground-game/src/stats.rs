//! The four bounded player statistics and their derived metrics.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{BALANCE_GREAT_BELOW, BALANCE_PIVOT, INITIAL_STAT, STAT_MAX, STAT_MIN};

/// Identifies one of the four player statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatField {
    Gpa,
    Money,
    Stress,
    Social,
}

impl StatField {
    /// Every field in display order.
    pub const ALL: [Self; 4] = [Self::Gpa, Self::Money, Self::Stress, Self::Social];

    /// Uppercase label used in story log lines and lock reasons.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gpa => "GPA",
            Self::Money => "MONEY",
            Self::Stress => "STRESS",
            Self::Social => "SOCIAL",
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Gpa => "gpa",
            Self::Money => "money",
            Self::Stress => "stress",
            Self::Social => "social",
        }
    }
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Player statistics, each held within `STAT_MIN..=STAT_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawStats")]
pub struct Stats {
    pub gpa: i32,
    pub money: i32,
    pub stress: i32,
    pub social: i32,
}

/// Unchecked stats as they appear in saves; clamped on the way in.
#[derive(Deserialize)]
struct RawStats {
    gpa: i32,
    money: i32,
    stress: i32,
    social: i32,
}

impl From<RawStats> for Stats {
    fn from(raw: RawStats) -> Self {
        Self::new(raw.gpa, raw.money, raw.stress, raw.social)
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            gpa: INITIAL_STAT,
            money: INITIAL_STAT,
            stress: INITIAL_STAT,
            social: INITIAL_STAT,
        }
    }
}

impl Stats {
    /// Build a stat vector, clamping every field into range.
    #[must_use]
    pub fn new(gpa: i32, money: i32, stress: i32, social: i32) -> Self {
        Self {
            gpa,
            money,
            stress,
            social,
        }
        .clamped()
    }

    pub fn clamp(&mut self) {
        self.gpa = self.gpa.clamp(STAT_MIN, STAT_MAX);
        self.money = self.money.clamp(STAT_MIN, STAT_MAX);
        self.stress = self.stress.clamp(STAT_MIN, STAT_MAX);
        self.social = self.social.clamp(STAT_MIN, STAT_MAX);
    }

    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.clamp();
        self
    }

    #[must_use]
    pub const fn get(&self, field: StatField) -> i32 {
        match field {
            StatField::Gpa => self.gpa,
            StatField::Money => self.money,
            StatField::Stress => self.stress,
            StatField::Social => self.social,
        }
    }

    pub const fn get_mut(&mut self, field: StatField) -> &mut i32 {
        match field {
            StatField::Gpa => &mut self.gpa,
            StatField::Money => &mut self.money,
            StatField::Stress => &mut self.stress,
            StatField::Social => &mut self.social,
        }
    }

    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        StatField::ALL
            .iter()
            .all(|field| (STAT_MIN..=STAT_MAX).contains(&self.get(*field)))
    }

    /// Sum of all four fields.
    #[must_use]
    pub const fn total(&self) -> i32 {
        self.gpa + self.money + self.stress + self.social
    }

    /// Distance of every field from the midpoint, summed.
    #[must_use]
    pub fn balance(&self) -> i32 {
        StatField::ALL
            .iter()
            .map(|field| (self.get(*field) - BALANCE_PIVOT).abs())
            .sum()
    }

    #[must_use]
    pub fn balance_rating(&self) -> BalanceRating {
        if self.balance() < BALANCE_GREAT_BELOW {
            BalanceRating::Great
        } else {
            BalanceRating::NeedsWork
        }
    }

    /// Per-field change needed to go from `self` to `after`.
    #[must_use]
    pub const fn diff(&self, after: &Self) -> StatDelta {
        StatDelta {
            gpa: after.gpa - self.gpa,
            money: after.money - self.money,
            stress: after.stress - self.stress,
            social: after.social - self.social,
        }
    }
}

/// Coarse rating of how evenly the stats are spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceRating {
    Great,
    NeedsWork,
}

impl fmt::Display for BalanceRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Great => f.write_str("Great!"),
            Self::NeedsWork => f.write_str("Needs Work"),
        }
    }
}

/// Signed per-field difference between two stat vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatDelta {
    pub gpa: i32,
    pub money: i32,
    pub stress: i32,
    pub social: i32,
}

impl StatDelta {
    #[must_use]
    pub const fn get(&self, field: StatField) -> i32 {
        match field {
            StatField::Gpa => self.gpa,
            StatField::Money => self.money,
            StatField::Stress => self.stress,
            StatField::Social => self.social,
        }
    }

    /// Nonzero entries in display order.
    #[must_use]
    pub fn changes(&self) -> Vec<(StatField, i32)> {
        StatField::ALL
            .iter()
            .map(|field| (*field, self.get(*field)))
            .filter(|(_, value)| *value != 0)
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes().is_empty()
    }
}

impl fmt::Display for StatDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .changes()
            .into_iter()
            .map(|(field, value)| format!("{} {value:+}", field.label()))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialized_stats_are_clamped() {
        let stats: Stats =
            serde_json::from_str(r#"{ "gpa": 250, "money": -40, "stress": 100, "social": 0 }"#)
                .unwrap();
        assert_eq!(stats, Stats::new(100, 0, 100, 0));
        assert!(stats.is_within_bounds());
    }

    #[test]
    fn default_stats_start_at_midpoint() {
        let stats = Stats::default();
        assert_eq!(stats, Stats::new(50, 50, 50, 50));
        assert_eq!(stats.total(), 200);
        assert_eq!(stats.balance(), 0);
        assert_eq!(stats.balance_rating(), BalanceRating::Great);
    }

    #[test]
    fn clamp_pins_every_field_into_range() {
        let mut stats = Stats {
            gpa: -12,
            money: 140,
            stress: 100,
            social: 0,
        };
        stats.clamp();
        assert_eq!(stats, Stats::new(0, 100, 100, 0));
        assert!(stats.is_within_bounds());
    }

    #[test]
    fn balance_rating_flags_lopsided_stats() {
        let stats = Stats::new(90, 10, 50, 50);
        assert_eq!(stats.balance(), 80);
        assert_eq!(stats.balance_rating(), BalanceRating::NeedsWork);
        assert_eq!(stats.balance_rating().to_string(), "Needs Work");
    }

    #[test]
    fn diff_reports_only_nonzero_fields() {
        let before = Stats::default();
        let after = Stats::new(60, 50, 55, 50);
        let delta = before.diff(&after);
        assert_eq!(
            delta.changes(),
            vec![(StatField::Gpa, 10), (StatField::Stress, 5)]
        );
        assert_eq!(delta.to_string(), "GPA +10, STRESS +5");
        assert!(before.diff(&before).is_empty());
    }

    #[test]
    fn negative_deltas_render_with_minus_sign() {
        let delta = StatDelta {
            money: -20,
            social: 3,
            ..StatDelta::default()
        };
        assert_eq!(delta.to_string(), "MONEY -20, SOCIAL +3");
    }

    #[test]
    fn get_mut_targets_the_requested_field() {
        let mut stats = Stats::default();
        *stats.get_mut(StatField::Social) += 7;
        assert_eq!(stats.get(StatField::Social), 57);
        assert_eq!(StatField::Social.key(), "social");
    }
}

//! Availability gating for choices.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::constants::GENERIC_LOCK_REASON;
use crate::stats::{StatField, Stats};

type PredicateFn = dyn Fn(&Stats) -> bool + Send + Sync;

/// Opaque stat predicate for requirements that thresholds cannot express.
///
/// Predicates only exist in code-built catalogs; they never serialize.
#[derive(Clone)]
pub struct StatPredicate(Arc<PredicateFn>);

impl StatPredicate {
    pub fn new(predicate: impl Fn(&Stats) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    #[must_use]
    pub fn test(&self, stats: &Stats) -> bool {
        (self.0)(stats)
    }
}

impl fmt::Debug for StatPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StatPredicate(..)")
    }
}

impl PartialEq for StatPredicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Condition a choice imposes on the current stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Every listed field must be at or above its minimum.
    Threshold(BTreeMap<StatField, i32>),
    #[serde(skip)]
    Predicate(StatPredicate),
}

/// A threshold field that the current stats fall short of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmetThreshold {
    pub field: StatField,
    pub current: i32,
    pub required: i32,
}

impl fmt::Display for UnmetThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}/{}", self.field.label(), self.current, self.required)
    }
}

impl Requirement {
    /// Build a threshold requirement from `(field, minimum)` pairs.
    pub fn threshold(minimums: impl IntoIterator<Item = (StatField, i32)>) -> Self {
        Self::Threshold(minimums.into_iter().collect())
    }

    pub fn predicate(predicate: impl Fn(&Stats) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(StatPredicate::new(predicate))
    }

    /// Threshold fields not met by `stats`; always empty for predicates.
    #[must_use]
    pub fn unmet(&self, stats: &Stats) -> Vec<UnmetThreshold> {
        match self {
            Self::Threshold(minimums) => minimums
                .iter()
                .filter(|(field, required)| stats.get(**field) < **required)
                .map(|(field, required)| UnmetThreshold {
                    field: *field,
                    current: stats.get(*field),
                    required: *required,
                })
                .collect(),
            Self::Predicate(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn is_met(&self, stats: &Stats) -> bool {
        match self {
            Self::Threshold(_) => self.unmet(stats).is_empty(),
            Self::Predicate(predicate) => predicate.test(stats),
        }
    }
}

/// Outcome of evaluating a requirement against current stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementCheck {
    pub can_play: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RequirementCheck {
    #[must_use]
    pub const fn playable() -> Self {
        Self {
            can_play: true,
            reason: None,
        }
    }

    #[must_use]
    pub fn locked(reason: impl Into<String>) -> Self {
        Self {
            can_play: false,
            reason: Some(reason.into()),
        }
    }
}

/// Evaluate an optional requirement.
///
/// `lock_reason` overrides the generated explanation when the
/// requirement is unmet.
#[must_use]
pub fn check_requirement(
    requirement: Option<&Requirement>,
    lock_reason: Option<&str>,
    stats: &Stats,
) -> RequirementCheck {
    let Some(requirement) = requirement else {
        return RequirementCheck::playable();
    };
    match requirement {
        Requirement::Threshold(_) => {
            let unmet = requirement.unmet(stats);
            if unmet.is_empty() {
                return RequirementCheck::playable();
            }
            let reason = lock_reason.map_or_else(
                || {
                    unmet
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                },
                str::to_string,
            );
            RequirementCheck::locked(reason)
        }
        Requirement::Predicate(predicate) => {
            if predicate.test(stats) {
                RequirementCheck::playable()
            } else {
                RequirementCheck::locked(lock_reason.unwrap_or(GENERIC_LOCK_REASON))
            }
        }
    }
}

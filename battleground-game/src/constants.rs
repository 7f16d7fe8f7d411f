//! Centralized balance and tuning constants for Bachelors Battleground.
//!
//! Numeric rules for stats, the story log, and exams live here so that
//! gameplay can only be adjusted via reviewed code changes. Content
//! numbers (per-card deltas) belong to the catalog, not to this file.

// Persistence -------------------------------------------------------------
/// Fixed key under which the progression state is persisted.
pub const STORAGE_KEY: &str = "bachelors-battleground-game";

// Stats -------------------------------------------------------------------
pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;
pub const INITIAL_STAT: i32 = 50;
pub(crate) const BALANCE_PIVOT: i32 = 50;
pub(crate) const BALANCE_GREAT_BELOW: i32 = 50;

// Story log ---------------------------------------------------------------
pub const MAX_STORY_LOG_ITEMS: usize = 10;

// Calendar ----------------------------------------------------------------
pub const FIRST_SEMESTER: u32 = 1;
pub const FIRST_MONTH: u32 = 1;

// Exams -------------------------------------------------------------------
pub(crate) const EXAM_PASSING_GPA: f64 = 40.0;
pub(crate) const EXAM_STRESS_PENALTY_MULTIPLIER: f64 = 0.1;
pub(crate) const EXAM_STRESS_PENALTY_CAP: f64 = 15.0;
pub(crate) const EXAM_EXCELLENT_GPA: f64 = 80.0;
pub(crate) const EXAM_GOOD_GPA: f64 = 65.0;
pub(crate) const EXAM_AVERAGE_GPA: f64 = 50.0;
pub(crate) const EXAM_POOR_GPA: f64 = 40.0;

// Requirements ------------------------------------------------------------
pub(crate) const GENERIC_LOCK_REASON: &str = "Requirements not met";

//! Semester exam resolution
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    EXAM_AVERAGE_GPA, EXAM_EXCELLENT_GPA, EXAM_GOOD_GPA, EXAM_PASSING_GPA, EXAM_POOR_GPA,
    EXAM_STRESS_PENALTY_CAP, EXAM_STRESS_PENALTY_MULTIPLIER,
};
use crate::numbers::usize_to_f64;
use crate::stats::Stats;

/// Tuning for exam scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamConfig {
    pub passing_gpa: f64,
    pub stress_penalty_multiplier: f64,
    pub stress_penalty_cap: f64,
    pub thresholds: PerformanceThresholds,
}

/// Minimum final GPA for each passing tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceThresholds {
    pub excellent: f64,
    pub good: f64,
    pub average: f64,
    pub poor: f64,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            passing_gpa: EXAM_PASSING_GPA,
            stress_penalty_multiplier: EXAM_STRESS_PENALTY_MULTIPLIER,
            stress_penalty_cap: EXAM_STRESS_PENALTY_CAP,
            thresholds: PerformanceThresholds {
                excellent: EXAM_EXCELLENT_GPA,
                good: EXAM_GOOD_GPA,
                average: EXAM_AVERAGE_GPA,
                poor: EXAM_POOR_GPA,
            },
        }
    }
}

/// Performance band, ordered worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Performance {
    /// Final GPA below the passing line
    Failed,
    Poor,
    Average,
    Good,
    Excellent,
}

impl Performance {
    #[must_use]
    pub fn from_final_gpa(final_gpa: f64, thresholds: &PerformanceThresholds) -> Self {
        if final_gpa >= thresholds.excellent {
            Self::Excellent
        } else if final_gpa >= thresholds.good {
            Self::Good
        } else if final_gpa >= thresholds.average {
            Self::Average
        } else if final_gpa >= thresholds.poor {
            Self::Poor
        } else {
            Self::Failed
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Excellent => "🎉",
            Self::Good => "✅",
            Self::Average => "📚",
            Self::Poor => "⚠️",
            Self::Failed => "❌",
        }
    }

    #[must_use]
    pub fn flavor_text(self, final_gpa: f64) -> String {
        match self {
            Self::Excellent => format!(
                "Outstanding! You aced the exams with a {final_gpa:.1} GPA! Your dedication paid off."
            ),
            Self::Good => format!(
                "Great job! You passed with a solid {final_gpa:.1} GPA. Keep up the good work!"
            ),
            Self::Average => format!(
                "You passed with a {final_gpa:.1} GPA. Room for improvement, but you're on track."
            ),
            Self::Poor => format!(
                "Barely passed with {final_gpa:.1} GPA. Time to focus more on studies."
            ),
            Self::Failed => format!(
                "Failed with {final_gpa:.1} GPA. You need to retake this semester or reconsider your approach."
            ),
        }
    }
}

impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::Average => write!(f, "average"),
            Self::Poor => write!(f, "poor"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Immutable record of one semester's exam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub semester: u32,
    pub final_stats: Stats,
    pub average_gpa: f64,
    pub stress_penalty: f64,
    pub final_gpa: f64,
    pub passed: bool,
    pub performance: Performance,
    pub flavor_text: String,
    pub timestamp: u64,
}

impl ExamResult {
    /// One-line summary used in the story log.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Semester {} exams: {:.1} GPA ({}) - {}",
            self.semester,
            self.final_gpa,
            self.performance.to_string().to_uppercase(),
            if self.passed { "passed" } else { "failed" }
        )
    }
}

/// Average GPA across the semester's samples, or the current GPA when
/// nothing was sampled.
#[must_use]
pub fn average_gpa(stats: &Stats, samples: &[Stats]) -> f64 {
    if samples.is_empty() {
        return f64::from(stats.gpa);
    }
    let sum: f64 = samples.iter().map(|sample| f64::from(sample.gpa)).sum();
    sum / usize_to_f64(samples.len())
}

/// Linear stress penalty, capped.
#[must_use]
pub fn stress_penalty(stress: i32, cfg: &ExamConfig) -> f64 {
    (f64::from(stress) * cfg.stress_penalty_multiplier).min(cfg.stress_penalty_cap)
}

/// Compute an exam result from the current stats and semester samples.
///
/// Has no effect on game state; the session commits the result.
#[must_use]
pub fn calculate_exam_result(
    stats: &Stats,
    semester: u32,
    samples: &[Stats],
    cfg: &ExamConfig,
    timestamp: u64,
) -> ExamResult {
    let average_gpa = average_gpa(stats, samples);
    let stress_penalty = stress_penalty(stats.stress, cfg);
    let final_gpa = (average_gpa - stress_penalty).max(0.0);
    let passed = final_gpa >= cfg.passing_gpa;
    let performance = Performance::from_final_gpa(final_gpa, &cfg.thresholds);

    ExamResult {
        semester,
        final_stats: *stats,
        average_gpa,
        stress_penalty,
        final_gpa,
        passed,
        performance,
        flavor_text: performance.flavor_text(final_gpa),
        timestamp,
    }
}

//! Persisted progression state.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

use crate::constants::{FIRST_MONTH, FIRST_SEMESTER};
use crate::exam::ExamResult;
use crate::stats::Stats;

/// How the campaign ended, if it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    Ongoing,
    /// Every semester finished
    CompletedSuccess,
    /// An exam was failed
    CompletedFailure,
}

impl Outcome {
    #[must_use]
    pub const fn is_complete(self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

/// Coarse state-machine position derived from [`GameState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    InProgress,
    ExamPending,
    Complete(Outcome),
}

/// One narrative log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryEntry {
    pub id: u64,
    pub message: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub stats: Stats,
    pub current_semester: u32,
    pub current_month: u32,
    /// Choice ids resolved in the current period only
    #[serde(default)]
    pub completed_cards: BTreeSet<String>,
    #[serde(default)]
    pub story_log: VecDeque<StoryEntry>,
    #[serde(default)]
    pub outcome: Outcome,
    #[serde(default)]
    pub exam_results: Vec<ExamResult>,
    #[serde(default)]
    pub pending_exam_result: Option<ExamResult>,
    /// Stat snapshots taken after each resolved choice this semester
    #[serde(default)]
    pub semester_samples: Vec<Stats>,
    #[serde(default)]
    pub next_log_id: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            stats: Stats::default(),
            current_semester: FIRST_SEMESTER,
            current_month: FIRST_MONTH,
            completed_cards: BTreeSet::new(),
            story_log: VecDeque::new(),
            outcome: Outcome::Ongoing,
            exam_results: Vec::new(),
            pending_exam_result: None,
            semester_samples: Vec::new(),
            next_log_id: 0,
        }
    }
}

impl GameState {
    #[must_use]
    pub const fn is_game_complete(&self) -> bool {
        self.outcome.is_complete()
    }

    /// True while an exam result waits for the player's acknowledgement.
    #[must_use]
    pub const fn show_exam_modal(&self) -> bool {
        self.pending_exam_result.is_some()
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        if self.outcome.is_complete() {
            Phase::Complete(self.outcome)
        } else if self.pending_exam_result.is_some() {
            Phase::ExamPending
        } else {
            Phase::InProgress
        }
    }

    #[must_use]
    pub fn is_resolved(&self, id: &str) -> bool {
        self.completed_cards.contains(id)
    }

    #[must_use]
    pub fn has_exam_for(&self, semester: u32) -> bool {
        self.exam_results
            .iter()
            .any(|result| result.semester == semester)
    }

    #[must_use]
    pub fn latest_exam(&self) -> Option<&ExamResult> {
        self.exam_results.last()
    }

    /// Append a log line, discarding the oldest entries beyond `max_items`.
    pub fn push_log(&mut self, message: impl Into<String>, timestamp: u64, max_items: usize) {
        // Saves may omit the counter; never reuse an id already in the log.
        let id = self.story_log.back().map_or(self.next_log_id, |last| {
            self.next_log_id.max(last.id.saturating_add(1))
        });
        let entry = StoryEntry {
            id,
            message: message.into(),
            timestamp,
        };
        self.next_log_id = id.saturating_add(1);
        self.story_log.push_back(entry);
        while self.story_log.len() > max_items {
            self.story_log.pop_front();
        }
    }

    /// Move to `month` within the current semester.
    pub fn enter_month(&mut self, month: u32) {
        self.current_month = month;
        self.completed_cards.clear();
    }

    /// Move to month one of `semester`, dropping per-semester samples.
    pub fn enter_semester(&mut self, semester: u32) {
        self.current_semester = semester;
        self.current_month = FIRST_MONTH;
        self.completed_cards.clear();
        self.semester_samples.clear();
    }

    pub const fn finish(&mut self, outcome: Outcome) {
        self.outcome = outcome;
    }
}

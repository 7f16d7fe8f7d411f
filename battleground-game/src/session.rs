use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::constants::{FIRST_SEMESTER, MAX_STORY_LOG_ITEMS};
use crate::data::{Catalog, Choice, ChoiceKind, ExamChapter, Month, Semester};
use crate::exam::{ExamConfig, ExamResult, calculate_exam_result};
use crate::requirement::RequirementCheck;
use crate::state::{GameState, Outcome, Phase};
use crate::stats::StatDelta;

/// Engine tunables that are not content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_max_log_items")]
    pub max_log_items: usize,
    #[serde(default)]
    pub exam: ExamConfig,
}

impl SessionConfig {
    const fn default_max_log_items() -> usize {
        MAX_STORY_LOG_ITEMS
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_log_items: Self::default_max_log_items(),
            exam: ExamConfig::default(),
        }
    }
}

/// A request to change progression state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ResolveChoice(String),
    AdvanceMonth,
    AdvanceSemester,
    TriggerExam,
    CompleteExam,
    Reset,
}

/// Why a transition left the state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    GameOver,
    ExamPending,
    /// The current semester or month is absent from the catalog
    MissingPeriod,
    UnknownChoice,
    AlreadyResolved,
    Locked(String),
}

/// Result of [`GameSession::resolve_choice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Applied { kind: ChoiceKind, delta: StatDelta },
    Ignored(IgnoreReason),
}

impl Resolution {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Result of advancing the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Month { semester: u32, month: u32 },
    Semester(u32),
    Completed,
    Ignored(IgnoreReason),
}

impl Advance {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        !matches!(self, Self::Ignored(_))
    }
}

/// A remaining choice in the current period with its lock status.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailableChoice<'a> {
    pub kind: ChoiceKind,
    pub choice: &'a Choice,
    pub check: RequirementCheck,
}

/// Owns one player's progression state and drives its transitions.
#[derive(Debug, Clone)]
pub struct GameSession {
    state: GameState,
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl GameSession {
    /// Fresh game over `catalog` with default config and wall-clock time.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::from_state(
            GameState::default(),
            catalog,
            SessionConfig::default(),
            Arc::new(SystemClock),
        )
    }

    /// Bind an existing state (for example a loaded save) to a catalog.
    #[must_use]
    pub fn from_state(
        state: GameState,
        catalog: Arc<Catalog>,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state,
            catalog,
            clock,
            config,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Read-only snapshot for rendering.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Consume the session, returning the underlying game state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    #[must_use]
    pub fn current_semester(&self) -> Option<&Semester> {
        self.catalog.semester(self.state.current_semester)
    }

    #[must_use]
    pub fn current_month(&self) -> Option<&Month> {
        self.catalog
            .month(self.state.current_semester, self.state.current_month)
    }

    #[must_use]
    pub fn exam_chapter(&self) -> Option<&ExamChapter> {
        self.catalog.exam_chapter(self.state.current_semester)
    }

    /// Unresolved cards and events of the current month, with lock status.
    ///
    /// Empty unless the game is in progress.
    #[must_use]
    pub fn available_choices(&self) -> Vec<AvailableChoice<'_>> {
        if self.phase() != Phase::InProgress {
            return Vec::new();
        }
        let Some(month) = self.current_month() else {
            return Vec::new();
        };
        month
            .choices()
            .filter(|(_, choice)| !self.state.is_resolved(&choice.id))
            .map(|(kind, choice)| AvailableChoice {
                kind,
                choice,
                check: choice.check(&self.state.stats),
            })
            .collect()
    }

    /// Whether the caller should run the exam instead of advancing.
    ///
    /// True on the final month of an exam semester that has not been
    /// examined yet.
    #[must_use]
    pub fn exam_due(&self) -> bool {
        if self.phase() != Phase::InProgress {
            return false;
        }
        self.current_semester().is_some_and(|semester| {
            semester.exam_period
                && self.state.current_month == semester.month_count()
                && !self.state.has_exam_for(semester.number)
        })
    }

    /// Dispatch a command, returning whether state changed.
    pub fn apply(&mut self, command: &Command) -> bool {
        match command {
            Command::ResolveChoice(id) => self.resolve_choice(id).is_applied(),
            Command::AdvanceMonth => self.advance_month().is_applied(),
            Command::AdvanceSemester => self.advance_semester().is_applied(),
            Command::TriggerExam => self.trigger_exam(),
            Command::CompleteExam => self.complete_exam().is_some(),
            Command::Reset => {
                self.reset_game();
                true
            }
        }
    }

    /// Play a card or event from the current month.
    ///
    /// Unknown, already-resolved, and locked choices are ignored. A
    /// `next_semester` branch takes precedence over `next_month`.
    pub fn resolve_choice(&mut self, id: &str) -> Resolution {
        if let Some(reason) = self.blocked() {
            return ignored_choice(id, reason);
        }
        let catalog = Arc::clone(&self.catalog);
        let Some(month) = catalog.month(self.state.current_semester, self.state.current_month)
        else {
            return ignored_choice(id, IgnoreReason::MissingPeriod);
        };
        let Some((kind, choice)) = month.find(id) else {
            return ignored_choice(id, IgnoreReason::UnknownChoice);
        };
        if self.state.is_resolved(id) {
            return ignored_choice(id, IgnoreReason::AlreadyResolved);
        }
        let check = choice.check(&self.state.stats);
        if !check.can_play {
            return ignored_choice(
                id,
                IgnoreReason::Locked(check.reason.unwrap_or_default()),
            );
        }

        let before = self.state.stats;
        let after = choice.effect.apply(&before);
        let delta = before.diff(&after);
        log::trace!("{} '{}' moved stats {before:?} -> {after:?}", kind, choice.name);
        self.state.stats = after;
        self.state.completed_cards.insert(choice.id.clone());
        self.state.semester_samples.push(after);

        let changes = if delta.is_empty() {
            String::from("no change")
        } else {
            delta.to_string()
        };
        self.push_log(format!(
            "Semester {}, Month {}: {kind} \"{}\" ({changes})",
            self.state.current_semester, self.state.current_month, choice.name
        ));

        self.follow_branch(choice);
        Resolution::Applied { kind, delta }
    }

    /// Move to the next month, wrapping into the next semester.
    pub fn advance_month(&mut self) -> Advance {
        if let Some(reason) = self.blocked() {
            return ignored_advance(reason);
        }
        let Some(month_count) = self.current_semester().map(Semester::month_count) else {
            return ignored_advance(IgnoreReason::MissingPeriod);
        };
        let next = self.state.current_month.saturating_add(1);
        if next <= month_count {
            self.state.enter_month(next);
            Advance::Month {
                semester: self.state.current_semester,
                month: next,
            }
        } else {
            self.enter_next_semester()
        }
    }

    /// Skip to month one of the next semester.
    pub fn advance_semester(&mut self) -> Advance {
        if let Some(reason) = self.blocked() {
            return ignored_advance(reason);
        }
        self.enter_next_semester()
    }

    /// Compute the current semester's exam and hold it for acknowledgement.
    ///
    /// Averages GPA over the semester's samples, falling back to the
    /// current GPA when nothing was played this semester.
    pub fn trigger_exam(&mut self) -> bool {
        if let Some(reason) = self.blocked() {
            log::debug!("exam trigger ignored: {reason:?}");
            return false;
        }
        let result = calculate_exam_result(
            &self.state.stats,
            self.state.current_semester,
            &self.state.semester_samples,
            &self.config.exam,
            self.clock.now_millis(),
        );
        log::info!(
            "semester {} exam computed: final gpa {:.1} ({})",
            result.semester,
            result.final_gpa,
            result.performance
        );
        self.state.pending_exam_result = Some(result);
        true
    }

    /// Acknowledge the pending exam, committing its consequences.
    ///
    /// A failed exam ends the game; a pass advances to the next semester
    /// or, after the last one, completes it.
    pub fn complete_exam(&mut self) -> Option<ExamResult> {
        if self.state.is_game_complete() {
            return None;
        }
        let result = self.state.pending_exam_result.take()?;
        self.push_log(result.summary());
        self.state.exam_results.push(result.clone());

        if !result.passed {
            self.finish(Outcome::CompletedFailure);
        } else if self.state.current_semester >= self.catalog.last_semester() {
            self.finish(Outcome::CompletedSuccess);
        } else {
            let next = self.state.current_semester.saturating_add(1);
            self.state.enter_semester(next);
            log::info!("entered semester {next}");
        }
        Some(result)
    }

    /// Discard all progress, including exam history.
    pub fn reset_game(&mut self) {
        self.state = GameState::default();
        log::info!("game reset");
    }

    fn blocked(&self) -> Option<IgnoreReason> {
        match self.state.phase() {
            Phase::InProgress => None,
            Phase::ExamPending => Some(IgnoreReason::ExamPending),
            Phase::Complete(_) => Some(IgnoreReason::GameOver),
        }
    }

    fn follow_branch(&mut self, choice: &Choice) {
        if let Some(semester) = choice.next_semester {
            self.jump_to_semester(semester);
        } else if let Some(month) = choice.next_month {
            if self.current_semester().and_then(|s| s.month(month)).is_some() {
                self.state.enter_month(month);
            } else {
                log::debug!("choice '{}' branches to missing month {month}", choice.id);
            }
        }
    }

    fn jump_to_semester(&mut self, semester: u32) {
        if semester > self.catalog.last_semester() {
            self.state.completed_cards.clear();
            self.finish(Outcome::CompletedSuccess);
        } else {
            self.state.enter_semester(semester.max(FIRST_SEMESTER));
            log::info!("branched to semester {semester}");
        }
    }

    fn enter_next_semester(&mut self) -> Advance {
        let next = self.state.current_semester.saturating_add(1);
        if next > self.catalog.last_semester() {
            self.state.completed_cards.clear();
            self.finish(Outcome::CompletedSuccess);
            Advance::Completed
        } else {
            self.state.enter_semester(next);
            log::info!("entered semester {next}");
            Advance::Semester(next)
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.state.finish(outcome);
        let message = match outcome {
            Outcome::CompletedSuccess => "Graduated! Every semester is behind you.",
            Outcome::CompletedFailure => "Academic dismissal. The campaign is over.",
            Outcome::Ongoing => return,
        };
        self.push_log(message);
        log::info!("game finished: {outcome:?}");
    }

    fn push_log(&mut self, message: impl Into<String>) {
        let timestamp = self.clock.now_millis();
        self.state
            .push_log(message, timestamp, self.config.max_log_items);
    }
}

fn ignored_choice(id: &str, reason: IgnoreReason) -> Resolution {
    log::debug!("choice '{id}' ignored: {reason:?}");
    Resolution::Ignored(reason)
}

fn ignored_advance(reason: IgnoreReason) -> Advance {
    log::debug!("advance ignored: {reason:?}");
    Advance::Ignored(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::data::{Category, Effect};
    use crate::requirement::Requirement;
    use crate::stats::{StatField, Stats};

    fn month(number: u32, cards: Vec<Choice>, events: Vec<Choice>) -> Month {
        Month {
            number,
            name: format!("Month {number}"),
            desc: String::new(),
            cards,
            events,
        }
    }

    fn semester(number: u32, months: Vec<Month>) -> Semester {
        Semester {
            number,
            title: format!("Semester {number}"),
            desc: String::new(),
            months,
            exam_period: true,
            exam_chapter: None,
        }
    }

    fn effect(gpa: i32, money: i32, stress: i32, social: i32) -> Effect {
        Effect {
            gpa,
            money,
            stress,
            social,
        }
    }

    fn fixture_catalog() -> Catalog {
        let s1 = semester(
            1,
            vec![
                month(
                    1,
                    vec![
                        Choice::new("study", "Study Hard", Category::Study, effect(10, 0, 5, 0)),
                        Choice::new("party", "Party", Category::Life, effect(-5, -5, -10, 10)),
                    ],
                    vec![
                        Choice::new("festival", "College Festival", Category::Life, effect(0, -5, -10, 15)),
                    ],
                ),
                month(
                    2,
                    vec![
                        Choice::new("abroad", "Exchange Program", Category::Life, effect(10, 0, 15, 20))
                            .with_next_semester(3),
                        Choice::new("honors", "Honors Seminar", Category::Study, effect(5, 0, 5, 0))
                            .with_requirement(Requirement::threshold([(StatField::Gpa, 70)])),
                        Choice::new("retake", "Retake Quiz", Category::Study, effect(3, 0, 0, 0))
                            .with_next_month(1),
                    ],
                    Vec::new(),
                ),
            ],
        );
        let s2 = semester(2, vec![month(1, vec![], vec![]), month(2, vec![], vec![])]);
        let s3 = semester(3, vec![month(1, vec![], vec![]), month(2, vec![], vec![])]);
        Catalog::from_semesters(vec![s1, s2, s3]).unwrap()
    }

    fn session() -> GameSession {
        GameSession::new(Arc::new(fixture_catalog())).with_clock(Arc::new(FixedClock(1_000)))
    }

    #[test]
    fn resolving_applies_effect_and_logs_delta() {
        let mut session = session();
        let resolution = session.resolve_choice("study");
        assert!(resolution.is_applied());
        assert_eq!(session.state().stats, Stats::new(60, 50, 55, 50));
        assert_eq!(session.state().story_log.len(), 1);
        let message = &session.state().story_log[0].message;
        assert!(message.contains("GPA +10"));
        assert!(message.contains("STRESS +5"));
        assert!(message.starts_with("Semester 1, Month 1: Card \"Study Hard\""));
        assert_eq!(session.state().story_log[0].timestamp, 1_000);
    }

    #[test]
    fn second_resolution_in_same_period_is_ignored() {
        let mut session = session();
        session.resolve_choice("study");
        let snapshot = session.state().clone();
        assert_eq!(
            session.resolve_choice("study"),
            Resolution::Ignored(IgnoreReason::AlreadyResolved)
        );
        assert_eq!(session.state(), &snapshot);
    }

    #[test]
    fn unknown_or_foreign_ids_are_ignored() {
        let mut session = session();
        assert_eq!(
            session.resolve_choice("abroad"),
            Resolution::Ignored(IgnoreReason::UnknownChoice)
        );
        assert_eq!(session.state(), &GameState::default());
    }

    #[test]
    fn locked_choice_never_changes_state() {
        let mut session = session();
        session.advance_month();
        let snapshot = session.state().clone();
        let resolution = session.resolve_choice("honors");
        assert_eq!(
            resolution,
            Resolution::Ignored(IgnoreReason::Locked("GPA: 50/70".to_string()))
        );
        assert_eq!(session.state(), &snapshot);
    }

    #[test]
    fn events_are_logged_as_events() {
        let mut session = session();
        let resolution = session.resolve_choice("festival");
        assert!(matches!(
            resolution,
            Resolution::Applied {
                kind: ChoiceKind::Event,
                ..
            }
        ));
        assert!(session.state().story_log[0].message.contains("Event \"College Festival\""));
    }

    #[test]
    fn semester_branch_resets_month_and_resolved_set() {
        let mut session = session();
        session.advance_month();
        session.resolve_choice("abroad");
        let state = session.state();
        assert_eq!((state.current_semester, state.current_month), (3, 1));
        assert!(state.completed_cards.is_empty());
        assert!(state.semester_samples.is_empty());
    }

    #[test]
    fn month_branch_clears_resolved_set() {
        let mut session = session();
        session.resolve_choice("study");
        session.advance_month();
        session.resolve_choice("retake");
        let state = session.state();
        assert_eq!((state.current_semester, state.current_month), (1, 1));
        assert!(state.completed_cards.is_empty());
        assert!(session.resolve_choice("study").is_applied());
    }

    #[test]
    fn exhausting_a_month_does_not_auto_advance() {
        let mut session = session();
        for id in ["study", "party", "festival"] {
            assert!(session.resolve_choice(id).is_applied());
        }
        assert_eq!(session.state().current_month, 1);
        assert!(session.available_choices().is_empty());
    }

    #[test]
    fn available_choices_annotate_locks() {
        let mut session = session();
        session.advance_month();
        let available = session.available_choices();
        assert_eq!(available.len(), 3);
        let honors = available
            .iter()
            .find(|entry| entry.choice.id == "honors")
            .unwrap();
        assert!(!honors.check.can_play);
        assert_eq!(honors.kind, ChoiceKind::Card);
    }

    #[test]
    fn advance_month_wraps_and_completes() {
        let mut session = session();
        assert_eq!(
            session.advance_month(),
            Advance::Month {
                semester: 1,
                month: 2
            }
        );
        assert_eq!(session.advance_month(), Advance::Semester(2));
        assert_eq!(session.advance_semester(), Advance::Semester(3));
        session.advance_month();
        assert_eq!(session.advance_month(), Advance::Completed);
        assert_eq!(session.state().outcome, Outcome::CompletedSuccess);
        assert_eq!(
            session.advance_month(),
            Advance::Ignored(IgnoreReason::GameOver)
        );
    }

    #[test]
    fn exam_due_only_on_final_unexamined_month() {
        let mut session = session();
        assert!(!session.exam_due());
        session.advance_month();
        assert!(session.exam_due());
        assert!(session.trigger_exam());
        assert!(!session.exam_due());
        assert_eq!(session.phase(), Phase::ExamPending);
    }

    #[test]
    fn pending_exam_blocks_other_transitions() {
        let mut session = session();
        session.trigger_exam();
        assert!(!session.trigger_exam());
        assert_eq!(
            session.resolve_choice("study"),
            Resolution::Ignored(IgnoreReason::ExamPending)
        );
        assert_eq!(
            session.advance_month(),
            Advance::Ignored(IgnoreReason::ExamPending)
        );
        assert!(session.available_choices().is_empty());
    }

    #[test]
    fn passing_exam_moves_to_next_semester() {
        let mut session = session();
        session.resolve_choice("study");
        session.advance_month();
        assert!(session.trigger_exam());
        let pending = session.state().pending_exam_result.clone().unwrap();
        assert!((pending.average_gpa - 60.0).abs() < 1e-9);
        let result = session.complete_exam().unwrap();
        assert!(result.passed);
        let state = session.state();
        assert_eq!((state.current_semester, state.current_month), (2, 1));
        assert_eq!(state.exam_results.len(), 1);
        assert!(!state.show_exam_modal());
        assert!(state.story_log.back().unwrap().message.contains("exams"));
    }

    #[test]
    fn failing_exam_ends_game_in_place() {
        let mut session = GameSession::from_state(
            GameState {
                stats: Stats::new(30, 50, 100, 50),
                ..GameState::default()
            },
            Arc::new(fixture_catalog()),
            SessionConfig::default(),
            Arc::new(FixedClock(5)),
        );
        session.trigger_exam();
        let result = session.complete_exam().unwrap();
        assert!(!result.passed);
        let state = session.state();
        assert_eq!(state.outcome, Outcome::CompletedFailure);
        assert!(state.is_game_complete());
        assert_eq!(state.current_semester, 1);
        assert!(session.complete_exam().is_none());
    }

    #[test]
    fn passing_final_semester_completes_successfully() {
        let mut session = session();
        session.advance_semester();
        session.advance_semester();
        session.trigger_exam();
        session.complete_exam();
        assert_eq!(session.state().outcome, Outcome::CompletedSuccess);
        assert_eq!(session.state().current_semester, 3);
    }

    #[test]
    fn complete_exam_without_pending_is_noop() {
        let mut session = session();
        assert!(session.complete_exam().is_none());
        assert_eq!(session.state(), &GameState::default());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut session = session();
        session.resolve_choice("study");
        session.trigger_exam();
        session.complete_exam();
        assert!(session.apply(&Command::Reset));
        assert_eq!(session.state(), &GameState::default());
    }

    #[test]
    fn log_is_bounded_by_config() {
        let mut session = session().with_config(SessionConfig {
            max_log_items: 2,
            ..SessionConfig::default()
        });
        for id in ["study", "party", "festival"] {
            session.resolve_choice(id);
        }
        let log = &session.state().story_log;
        assert_eq!(log.len(), 2);
        assert!(log[0].message.contains("Party"));
        assert!(log[1].message.contains("College Festival"));
    }

    #[test]
    fn commands_round_trip_through_json() {
        let command = Command::ResolveChoice("study".to_string());
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r#"{"resolve_choice":"study"}"#);
        let parsed: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, command);

        let mut session = session();
        assert!(session.apply(&parsed));
        assert!(!session.apply(&parsed));
    }

    #[test]
    fn missing_month_data_is_ignored() {
        let mut session = GameSession::from_state(
            GameState {
                current_semester: 9,
                ..GameState::default()
            },
            Arc::new(fixture_catalog()),
            SessionConfig::default(),
            Arc::new(FixedClock(0)),
        );
        assert_eq!(
            session.resolve_choice("study"),
            Resolution::Ignored(IgnoreReason::MissingPeriod)
        );
        assert_eq!(
            session.advance_month(),
            Advance::Ignored(IgnoreReason::MissingPeriod)
        );
        assert!(session.available_choices().is_empty());
    }
}

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use battleground_game::numbers::usize_to_f64;
use battleground_game::{
    AvailableChoice, Catalog, Command, DataLoader, FixedClock, GameSession, GameState, Outcome,
    Performance, SessionConfig, StaticCatalogLoader, Stats,
};
use serde::Serialize;

use super::policy::{GameplayStrategy, PlayerPolicy};

/// Upper bound on commands per run; a campaign that needs more is stuck.
const MAX_STEPS: usize = 2_000;
/// Fixed timestamp so that identical runs serialize identically.
const RUN_CLOCK_MILLIS: u64 = 1_700_000_000_000;

/// Per-exam line recorded in a run summary.
#[derive(Debug, Clone, Serialize)]
pub struct ExamLine {
    pub semester: u32,
    pub final_gpa: f64,
    pub performance: Performance,
    pub passed: bool,
}

/// Everything observed during one automated playthrough.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub strategy: GameplayStrategy,
    pub seed: u64,
    pub steps: usize,
    pub choices_played: usize,
    pub outcome: Outcome,
    pub final_stats: Stats,
    pub exams: Vec<ExamLine>,
    pub violations: Vec<String>,
    #[serde(skip)]
    pub final_state: GameState,
}

impl RunSummary {
    #[must_use]
    pub const fn graduated(&self) -> bool {
        matches!(self.outcome, Outcome::CompletedSuccess)
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.outcome.is_complete()
    }
}

/// Drives sessions over a shared catalog with a pluggable policy.
#[derive(Debug, Clone)]
pub struct Simulator {
    catalog: Arc<Catalog>,
    config: SessionConfig,
    verbose: bool,
}

impl Simulator {
    #[must_use]
    pub const fn new(catalog: Arc<Catalog>, config: SessionConfig, verbose: bool) -> Self {
        Self {
            catalog,
            config,
            verbose,
        }
    }

    /// Simulator over the catalog bundled with the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled content fails to load.
    pub fn bundled(verbose: bool) -> Result<Self> {
        let loader = StaticCatalogLoader;
        let catalog = loader
            .load_catalog()
            .context("bundled catalog failed to load")?;
        let config = loader
            .load_config("session")
            .context("bundled session config failed to load")?;
        Ok(Self::new(Arc::new(catalog), config, verbose))
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Play one campaign to completion.
    #[must_use]
    pub fn run(&self, strategy: GameplayStrategy, seed: u64) -> RunSummary {
        let mut policy = strategy.create_policy(seed);
        let mut session = GameSession::from_state(
            GameState::default(),
            Arc::clone(&self.catalog),
            self.config.clone(),
            Arc::new(FixedClock(RUN_CLOCK_MILLIS)),
        );
        let mut violations = Vec::new();
        let mut choices_played = 0;
        let mut steps = 0;

        while steps < MAX_STEPS && !session.state().is_game_complete() {
            let command = self.next_command(&session, policy.as_mut());
            if matches!(command, Command::ResolveChoice(_)) {
                choices_played += 1;
            }
            if !session.apply(&command) {
                violations.push(format!("step {steps}: {command:?} was ignored"));
                break;
            }
            steps += 1;
            if let Err(err) = check_invariants(&session) {
                violations.push(format!("step {steps}: {err}"));
            }
        }

        if session.state().is_game_complete() {
            if let Err(err) = check_terminal(&mut session) {
                violations.push(err.to_string());
            }
        } else {
            violations.push(format!("campaign did not finish within {MAX_STEPS} steps"));
        }

        let state = session.into_state();
        log::debug!(
            "{strategy} seed {seed}: {:?} after {steps} steps",
            state.outcome
        );
        RunSummary {
            strategy,
            seed,
            steps,
            choices_played,
            outcome: state.outcome,
            final_stats: state.stats,
            exams: state
                .exam_results
                .iter()
                .map(|result| ExamLine {
                    semester: result.semester,
                    final_gpa: result.final_gpa,
                    performance: result.performance,
                    passed: result.passed,
                })
                .collect(),
            violations,
            final_state: state,
        }
    }

    fn next_command(&self, session: &GameSession, policy: &mut dyn PlayerPolicy) -> Command {
        if session.state().show_exam_modal() {
            return Command::CompleteExam;
        }
        let playable: Vec<AvailableChoice<'_>> = session
            .available_choices()
            .into_iter()
            .filter(|available| available.check.can_play)
            .collect();
        if let Some(decision) = policy.pick_choice(session.state(), &playable) {
            if self.verbose {
                println!(
                    "  [{}] S{}M{} -> {} ({})",
                    policy.name(),
                    session.state().current_semester,
                    session.state().current_month,
                    decision.choice_id,
                    decision.rationale.as_deref().unwrap_or("-")
                );
            }
            return Command::ResolveChoice(decision.choice_id);
        }
        if session.exam_due() {
            Command::TriggerExam
        } else {
            Command::AdvanceMonth
        }
    }
}

fn check_invariants(session: &GameSession) -> Result<()> {
    let state = session.state();
    if !state.stats.is_within_bounds() {
        bail!("stats out of bounds: {:?}", state.stats);
    }
    if state.story_log.len() > session.config().max_log_items {
        bail!("story log holds {} entries", state.story_log.len());
    }
    if let Some(id) = state
        .completed_cards
        .iter()
        .find(|id| session.current_month().is_none_or(|month| month.find(id).is_none()))
    {
        bail!("resolved id `{id}` is not part of the current month");
    }
    Ok(())
}

/// Finished campaigns must ignore every command except reset.
fn check_terminal(session: &mut GameSession) -> Result<()> {
    let snapshot = session.state().clone();
    for command in [
        Command::AdvanceMonth,
        Command::AdvanceSemester,
        Command::TriggerExam,
        Command::CompleteExam,
    ] {
        if session.apply(&command) {
            bail!("{command:?} changed a finished game");
        }
    }
    if session.state() != &snapshot {
        bail!("finished game state drifted");
    }
    let last_passed = snapshot.latest_exam().is_none_or(|exam| exam.passed);
    match snapshot.outcome {
        Outcome::CompletedFailure if last_passed => {
            bail!("dismissed without a failed exam")
        }
        Outcome::CompletedSuccess if !last_passed => {
            bail!("graduated after a failed exam")
        }
        _ => Ok(()),
    }
}

/// Aggregate of all runs for one strategy.
#[derive(Debug, Clone, Serialize)]
pub struct PolicySummary {
    pub strategy: GameplayStrategy,
    pub runs: usize,
    pub graduated: usize,
    pub dismissed: usize,
    pub mean_exam_gpa: Option<f64>,
    pub mean_choices: f64,
    pub violations: Vec<String>,
}

impl PolicySummary {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn graduation_rate(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            ratio(self.graduated, self.runs) * 100.0
        }
    }
}

/// Fold run summaries into one row per strategy, in first-seen order.
#[must_use]
pub fn summarize(runs: &[RunSummary]) -> Vec<PolicySummary> {
    let mut order: Vec<GameplayStrategy> = Vec::new();
    for run in runs {
        if !order.contains(&run.strategy) {
            order.push(run.strategy);
        }
    }

    order
        .into_iter()
        .map(|strategy| {
            let mine: Vec<&RunSummary> =
                runs.iter().filter(|run| run.strategy == strategy).collect();
            let exam_gpas: Vec<f64> = mine
                .iter()
                .flat_map(|run| run.exams.iter().map(|exam| exam.final_gpa))
                .collect();
            let mean_exam_gpa = (!exam_gpas.is_empty())
                .then(|| exam_gpas.iter().sum::<f64>() / usize_to_f64(exam_gpas.len()));
            let choices: usize = mine.iter().map(|run| run.choices_played).sum();
            PolicySummary {
                strategy,
                runs: mine.len(),
                graduated: mine.iter().filter(|run| run.graduated()).count(),
                dismissed: mine
                    .iter()
                    .filter(|run| run.outcome == Outcome::CompletedFailure)
                    .count(),
                mean_exam_gpa,
                mean_choices: if mine.is_empty() {
                    0.0
                } else {
                    ratio(choices, mine.len())
                },
                violations: mine
                    .iter()
                    .flat_map(|run| {
                        run.violations
                            .iter()
                            .map(move |v| format!("seed {}: {v}", run.seed))
                    })
                    .collect(),
            }
        })
        .collect()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    usize_to_f64(numerator) / usize_to_f64(denominator)
}

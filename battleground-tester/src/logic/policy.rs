use std::fmt;

use battleground_game::{AvailableChoice, Effect, GameState};
use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub choice_id: String,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(choice_id: impl Into<String>, rationale: Option<String>) -> Self {
        Self {
            choice_id: choice_id.into(),
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select one of the playable choices, or `None` to move on.
    ///
    /// Only choices whose requirement check passed are offered.
    fn pick_choice(
        &mut self,
        state: &GameState,
        choices: &[AvailableChoice<'_>],
    ) -> Option<PolicyDecision>;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GameplayStrategy {
    /// Plays every card it can, in catalog order
    Eager,
    /// Chases GPA and avoids stress
    Scholar,
    /// Keeps all four stats near the middle
    Balanced,
    /// Chases social and ignores grades
    Socialite,
    /// Never plays a card
    Idle,
    /// Seeded random play
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 6] = [
        Self::Eager,
        Self::Scholar,
        Self::Balanced,
        Self::Socialite,
        Self::Idle,
        Self::Random,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Eager => "Eager",
            Self::Scholar => "Scholar",
            Self::Balanced => "Balanced",
            Self::Socialite => "Socialite",
            Self::Idle => "Idle",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Eager => Box::new(EagerPolicy),
            Self::Scholar => Box::new(ScholarPolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Socialite => Box::new(SocialitePolicy),
            Self::Idle => Box::new(IdlePolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct EagerPolicy;
struct ScholarPolicy;
struct BalancedPolicy;
struct SocialitePolicy;
struct IdlePolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
    play_chance: f64,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            play_chance: 0.7,
        }
    }
}

impl PlayerPolicy for EagerPolicy {
    fn name(&self) -> &'static str {
        "Eager"
    }

    fn pick_choice(
        &mut self,
        _state: &GameState,
        choices: &[AvailableChoice<'_>],
    ) -> Option<PolicyDecision> {
        choices
            .first()
            .map(|available| PolicyDecision::new(&available.choice.id, None))
    }
}

impl PlayerPolicy for ScholarPolicy {
    fn name(&self) -> &'static str {
        "Scholar"
    }

    fn pick_choice(
        &mut self,
        _state: &GameState,
        choices: &[AvailableChoice<'_>],
    ) -> Option<PolicyDecision> {
        best_positive(choices, |available| scholar_score(&available.choice.effect))
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_choice(
        &mut self,
        state: &GameState,
        choices: &[AvailableChoice<'_>],
    ) -> Option<PolicyDecision> {
        let current = state.stats.balance();
        best_positive(choices, |available| {
            let projected = available.choice.effect.apply(&state.stats);
            current - projected.balance()
        })
    }
}

impl PlayerPolicy for SocialitePolicy {
    fn name(&self) -> &'static str {
        "Socialite"
    }

    fn pick_choice(
        &mut self,
        _state: &GameState,
        choices: &[AvailableChoice<'_>],
    ) -> Option<PolicyDecision> {
        best_positive(choices, |available| {
            let effect = &available.choice.effect;
            effect.social * 2 - effect.stress.max(0)
        })
    }
}

impl PlayerPolicy for IdlePolicy {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn pick_choice(
        &mut self,
        _state: &GameState,
        _choices: &[AvailableChoice<'_>],
    ) -> Option<PolicyDecision> {
        None
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_choice(
        &mut self,
        _state: &GameState,
        choices: &[AvailableChoice<'_>],
    ) -> Option<PolicyDecision> {
        if choices.is_empty() || self.rng.gen_range(0.0..1.0) >= self.play_chance {
            return None;
        }
        let idx = self.rng.gen_range(0..choices.len());
        Some(PolicyDecision::new(
            &choices[idx].choice.id,
            Some(format!("roll {idx} of {}", choices.len())),
        ))
    }
}

fn scholar_score(effect: &Effect) -> i32 {
    effect.gpa * 3 - effect.stress.max(0) * 2 + effect.money.min(0) / 2
}

/// Highest-scoring choice, provided its score is positive.
fn best_positive<F>(choices: &[AvailableChoice<'_>], score: F) -> Option<PolicyDecision>
where
    F: Fn(&AvailableChoice<'_>) -> i32,
{
    choices
        .iter()
        .map(|available| (available, score(available)))
        .filter(|(_, score)| *score > 0)
        .max_by_key(|(_, score)| *score)
        .map(|(available, score)| {
            PolicyDecision::new(&available.choice.id, Some(format!("score {score}")))
        })
}

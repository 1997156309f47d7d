//! Condition selection for new trials.

use super::Condition;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chooses the condition shown in a new trial.
pub trait ConditionSelector: Send {
    /// Draw the condition for the next trial.
    fn select_condition(&mut self) -> Condition;
}

/// Independent uniform draws over [`Condition::ALL`].
///
/// Exposure is not balanced: each trial has equal probability per
/// condition, and nothing looks at earlier draws.
#[derive(Debug, Clone)]
pub struct RandomSelector<R = StdRng> {
    rng: R,
}

impl RandomSelector<StdRng> {
    /// Seed from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sequence for reproducible runs.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomSelector<R> {
    /// Use a caller-supplied generator.
    #[must_use]
    pub const fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> ConditionSelector for RandomSelector<R> {
    fn select_condition(&mut self) -> Condition {
        Condition::ALL[self.rng.gen_range(0..Condition::ALL.len())]
    }
}

/// Replays a fixed sequence of conditions, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceSelector {
    sequence: Vec<Condition>,
    next: usize,
}

impl SequenceSelector {
    /// Cycle through `sequence`; an empty sequence cycles [`Condition::ALL`].
    #[must_use]
    pub fn new(sequence: Vec<Condition>) -> Self {
        let sequence = if sequence.is_empty() {
            Condition::ALL.to_vec()
        } else {
            sequence
        };
        Self { sequence, next: 0 }
    }
}

impl ConditionSelector for SequenceSelector {
    fn select_condition(&mut self) -> Condition {
        let condition = self.sequence[self.next % self.sequence.len()];
        self.next += 1;
        condition
    }
}

//! Tabular Markov decision processes.
//!
//! [`Mdp`] is the read-only view both the exact solver and the sampling
//! oracle work from. [`FlatMdp`] stores dense tables; the R-max model
//! implements the same trait over learned counts.
mod error;
mod flat;
mod oracle;

pub use error::ModelError;
pub use flat::FlatMdp;
pub use oracle::MdpOracle;

use crate::*;

/// A finite MDP with known tables.
pub trait Mdp: Send + Sync + 'static {
    fn states(&self) -> usize;
    fn actions(&self) -> usize;
    fn gamma(&self) -> Utility;
    /// Probability of landing in `next` after `action` in `state`.
    fn transition(&self, state: State, action: Action, next: State) -> Probability;
    /// Expected immediate reward of `action` in `state`.
    fn reward(&self, state: State, action: Action) -> Utility;
    /// Absorbing states end the episode and are worth nothing.
    fn terminal(&self, state: State) -> bool;

    /// `(min, max)` immediate reward over non-terminal states.
    fn reward_range(&self) -> (Utility, Utility) {
        (0..self.states())
            .filter(|s| !self.terminal(*s))
            .flat_map(|s| (0..self.actions()).map(move |a| (s, a)))
            .map(|(s, a)| self.reward(s, a))
            .fold((Utility::INFINITY, Utility::NEG_INFINITY), |(lo, hi), r| {
                (lo.min(r), hi.max(r))
            })
    }

    /// Global bounds on any discounted return, `R/(1 − γ)` at either end.
    /// Zero is always included since an episode may end immediately.
    fn value_bounds(&self) -> (Utility, Utility) {
        assert!(self.gamma() < 1., "undiscounted models need explicit value bounds");
        let (lo, hi) = self.reward_range();
        let horizon = 1. / (1. - self.gamma());
        (lo.min(0.) * horizon, hi.max(0.) * horizon)
    }

    /// Search scalars for planning in this model.
    fn problem(&self) -> Problem {
        let (vmin, vmax) = self.value_bounds();
        Problem {
            actions: self.actions(),
            gamma: self.gamma(),
            vmin,
            vmax,
        }
    }
}

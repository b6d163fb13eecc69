//! Optimistic model learning.
//!
//! [`Rmax`] is a tabular model built from observed transitions. A
//! state-action pair becomes known after a fixed number of observations and
//! is frozen at its empirical estimate; until then it is modeled as a
//! self-loop paying the largest possible reward, so any planner working
//! from the model is drawn toward what it has not tried yet.
mod agent;

pub use agent::RmaxAgent;

use crate::*;

/// Empirical model of one known state-action pair.
#[derive(Debug, Clone, PartialEq)]
struct Estimate {
    transition: Vec<Probability>,
    reward: Utility,
}

/// Counting model over `states` real states plus one absorbing state that
/// stands for the end of an episode.
#[derive(Debug, Clone)]
pub struct Rmax {
    gamma: Utility,
    rmax: Utility,
    threshold: usize,
    actions: usize,
    visits: Vec<Vec<usize>>,
    arrivals: Vec<Vec<Vec<usize>>>,
    payoffs: Vec<Vec<Utility>>,
    known: Vec<Vec<Option<Estimate>>>,
}

impl Rmax {
    /// `rmax` is the largest immediate reward the environment can pay;
    /// `threshold` the observations needed before a pair is trusted.
    pub fn new(
        states: usize,
        actions: usize,
        gamma: Utility,
        rmax: Utility,
        threshold: usize,
    ) -> Self {
        assert!(states > 0 && actions > 0, "model needs states and actions");
        assert!(gamma > 0. && gamma < 1., "discount {} outside (0, 1)", gamma);
        assert!(threshold > 0, "known threshold must be positive");
        Self {
            gamma,
            rmax,
            threshold,
            actions,
            visits: vec![vec![0; actions]; states],
            arrivals: vec![vec![vec![0; states + 1]; actions]; states],
            payoffs: vec![vec![0.; actions]; states],
            known: vec![vec![None; actions]; states],
        }
    }

    /// The absorbing state reached when an episode ends.
    pub fn end(&self) -> State {
        self.visits.len()
    }
    pub fn threshold(&self) -> usize {
        self.threshold
    }
    pub fn count(&self, state: State, action: Action) -> usize {
        self.visits[state][action]
    }
    pub fn known(&self, state: State, action: Action) -> bool {
        self.known[state][action].is_some()
    }

    /// Record `state -action-> next` paying `reward`.
    /// Returns `true` exactly when this observation makes the pair known.
    pub fn observe(&mut self, state: State, action: Action, next: State, reward: Utility) -> bool {
        assert!(next < self.end(), "next state {} out of range", next);
        self.record(state, action, next, reward)
    }
    /// Record an action that ended the episode.
    pub fn observe_terminal(&mut self, state: State, action: Action, reward: Utility) -> bool {
        self.record(state, action, self.end(), reward)
    }

    fn record(&mut self, state: State, action: Action, next: State, reward: Utility) -> bool {
        self.visits[state][action] += 1;
        self.arrivals[state][action][next] += 1;
        self.payoffs[state][action] += reward;
        let learned = self.visits[state][action] == self.threshold;
        if learned {
            self.resolve(state, action);
        }
        learned
    }

    fn resolve(&mut self, state: State, action: Action) {
        let n = self.visits[state][action] as Utility;
        let estimate = Estimate {
            transition: self.arrivals[state][action]
                .iter()
                .map(|c| *c as Probability / n)
                .collect(),
            reward: self.payoffs[state][action] / n,
        };
        log::debug!("learned s{} a{}: reward {:.4}", state, action, estimate.reward);
        self.known[state][action] = Some(estimate);
    }
}

impl Mdp for Rmax {
    fn states(&self) -> usize {
        self.end() + 1
    }
    fn actions(&self) -> usize {
        self.actions
    }
    fn gamma(&self) -> Utility {
        self.gamma
    }
    fn transition(&self, state: State, action: Action, next: State) -> Probability {
        if state == self.end() {
            return if next == state { 1. } else { 0. };
        }
        match self.known[state][action] {
            Some(ref estimate) => estimate.transition[next],
            None if next == state => 1.,
            None => 0.,
        }
    }
    fn reward(&self, state: State, action: Action) -> Utility {
        if state == self.end() {
            return 0.;
        }
        match self.known[state][action] {
            Some(ref estimate) => estimate.reward,
            None => self.rmax,
        }
    }
    fn terminal(&self, state: State) -> bool {
        state == self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_pairs_loop_at_rmax() {
        let model = Rmax::new(3, 2, 0.9, 2., RMAX_THRESHOLD);
        assert_eq!(model.states(), 4);
        assert_eq!(model.transition(1, 0, 1), 1.);
        assert_eq!(model.transition(1, 0, 2), 0.);
        assert_eq!(model.reward(1, 1), 2.);
        assert!(model.terminal(model.end()));
        assert!(!model.terminal(0));
    }

    #[test]
    fn learns_exactly_at_threshold() {
        let mut model = Rmax::new(2, 1, 0.9, 1., 3);
        assert!(!model.observe(0, 0, 1, 0.));
        assert!(!model.observe(0, 0, 1, 0.));
        assert!(!model.known(0, 0));
        assert!(model.observe(0, 0, 1, 0.));
        assert!(model.known(0, 0));
        assert!(!model.observe(0, 0, 0, 0.));
        assert_eq!(model.count(0, 0), 4);
    }

    #[test]
    fn resolves_empirical_estimate() {
        let mut model = Rmax::new(3, 1, 0.9, 10., 3);
        model.observe(0, 0, 1, 1.);
        model.observe(0, 0, 1, 1.);
        model.observe(0, 0, 2, 3.);
        assert!((model.transition(0, 0, 1) - 2. / 3.).abs() < 1e-12);
        assert!((model.transition(0, 0, 2) - 1. / 3.).abs() < 1e-12);
        assert_eq!(model.transition(0, 0, 0), 0.);
        assert!((model.reward(0, 0) - 5. / 3.).abs() < 1e-12);
    }

    #[test]
    fn estimate_is_frozen_once_known() {
        let mut model = Rmax::new(2, 1, 0.9, 10., 1);
        model.observe(0, 0, 1, 1.);
        model.observe(0, 0, 0, 7.);
        assert_eq!(model.transition(0, 0, 1), 1.);
        assert_eq!(model.reward(0, 0), 1.);
    }

    #[test]
    fn episode_ends_flow_to_absorbing_state() {
        let mut model = Rmax::new(2, 1, 0.9, 1., 2);
        model.observe(0, 0, 1, 0.);
        assert!(model.observe_terminal(0, 0, 1.));
        let end = model.end();
        assert_eq!(model.transition(0, 0, end), 0.5);
        assert_eq!(model.reward(0, 0), 0.5);
        assert_eq!(model.reward(end, 0), 0.);
    }

    #[test]
    fn untried_model_is_maximally_optimistic() {
        let model = Rmax::new(3, 2, 0.9, 1., RMAX_THRESHOLD);
        let qt = solve(&model);
        assert!((0..3).all(|s| (qt.v(s) - 10.).abs() < 1e-3));
        assert_eq!(qt.v(model.end()), 0.);
        let (vmin, vmax) = model.value_bounds();
        assert_eq!(vmin, 0.);
        assert!((vmax - 10.).abs() < 1e-9);
    }
}

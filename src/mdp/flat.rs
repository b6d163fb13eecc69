use super::Mdp;
use super::ModelError;
use crate::*;
use serde::Deserialize;
use serde::Serialize;

/// Dense tabular MDP.
///
/// `transitions[s][a][n]` is `T(s, a, n)`, `rewards[s][a]` is `R(s, a)`.
/// Rows of terminal states are ignored and may be left empty of mass;
/// every other row must sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatMdp {
    gamma: Utility,
    transitions: Vec<Vec<Vec<Probability>>>,
    rewards: Vec<Vec<Utility>>,
    #[serde(default)]
    terminals: Vec<State>,
}

impl FlatMdp {
    pub fn new(
        gamma: Utility,
        transitions: Vec<Vec<Vec<Probability>>>,
        rewards: Vec<Vec<Utility>>,
        terminals: Vec<State>,
    ) -> Result<Self, ModelError> {
        let mdp = Self {
            gamma,
            transitions,
            rewards,
            terminals,
        };
        mdp.validate()?;
        Ok(mdp)
    }

    /// Deterministic model from a successor table `next[s][a]`.
    pub fn deterministic(
        gamma: Utility,
        next: Vec<Vec<State>>,
        rewards: Vec<Vec<Utility>>,
        terminals: Vec<State>,
    ) -> Result<Self, ModelError> {
        let n = next.len();
        let transitions = next
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&target| (0..n).map(|s| if s == target { 1. } else { 0. }).collect())
                    .collect()
            })
            .collect();
        Self::new(gamma, transitions, rewards, terminals)
    }

    /// A slippery corridor of `length` states.
    ///
    /// Action 0 walks right with probability 0.9 (slipping in place
    /// otherwise) and pays 1 only when taken at the far end, where it stays.
    /// Action 1 gives up, returning to the start for a 0.05 consolation.
    /// Patience wins whenever the discount is not too steep.
    pub fn chain(length: usize, gamma: Utility) -> Self {
        assert!(length > 1, "chain needs at least two states");
        let last = length - 1;
        let transitions = (0..length)
            .map(|s| {
                let walk = (0..length)
                    .map(|n| match (s == last, n) {
                        (true, n) if n == last => 1.,
                        (true, _) => 0.,
                        (false, n) if n == s + 1 => 0.9,
                        (false, n) if n == s => 0.1,
                        _ => 0.,
                    })
                    .collect::<Vec<_>>();
                let reset = (0..length).map(|n| if n == 0 { 1. } else { 0. }).collect();
                vec![walk, reset]
            })
            .collect();
        let rewards = (0..length)
            .map(|s| vec![if s == last { 1. } else { 0. }, 0.05])
            .collect();
        Self::new(gamma, transitions, rewards, vec![]).expect("chain is well formed")
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let states = self.transitions.len();
        let actions = self.rewards.first().map_or(0, Vec::len);
        if states == 0 || actions == 0 {
            return Err(ModelError::Empty);
        }
        if !(self.gamma > 0. && self.gamma < 1.) {
            return Err(ModelError::Discount(self.gamma));
        }
        if self.rewards.len() != states || self.rewards.iter().any(|r| r.len() != actions) {
            return Err(ModelError::Shape("reward"));
        }
        if self
            .transitions
            .iter()
            .any(|t| t.len() != actions || t.iter().any(|row| row.len() != states))
        {
            return Err(ModelError::Shape("transition"));
        }
        if let Some(&s) = self.terminals.iter().find(|&&s| s >= states) {
            return Err(ModelError::Terminal(s));
        }
        for state in (0..states).filter(|s| !self.terminals.contains(s)) {
            for action in 0..actions {
                let ref row = self.transitions[state][action];
                let mass = row.iter().sum::<Probability>();
                if row.iter().any(|p| *p < 0.) || (mass - 1.).abs() > ROW_TOLERANCE {
                    return Err(ModelError::Row {
                        state,
                        action,
                        mass,
                    });
                }
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for FlatMdp {
    type Err = ModelError;
    fn from_str(json: &str) -> Result<Self, Self::Err> {
        let mdp = serde_json::from_str::<Self>(json)?;
        mdp.validate()?;
        Ok(mdp)
    }
}

impl Mdp for FlatMdp {
    fn states(&self) -> usize {
        self.transitions.len()
    }
    fn actions(&self) -> usize {
        self.rewards[0].len()
    }
    fn gamma(&self) -> Utility {
        self.gamma
    }
    fn transition(&self, state: State, action: Action, next: State) -> Probability {
        self.transitions[state][action][next]
    }
    fn reward(&self, state: State, action: Action) -> Utility {
        self.rewards[state][action]
    }
    fn terminal(&self, state: State) -> bool {
        self.terminals.contains(&state)
    }
}

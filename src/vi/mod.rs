//! Exact value iteration over a fully known tabular model.
//!
//! This is the non-sampling fallback: it sweeps every state-action pair
//! with a full Bellman backup until the largest change falls below a
//! threshold. Tests use it as ground truth for the sampling planner.
use crate::*;

/// Action values for every state of a tabular model.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    q: Vec<Vec<Utility>>,
}

impl QTable {
    pub fn new(states: usize, actions: usize) -> Self {
        Self {
            q: vec![vec![0.; actions]; states],
        }
    }
    pub fn q(&self, state: State, action: Action) -> Utility {
        self.q[state][action]
    }
    pub fn set(&mut self, state: State, action: Action, value: Utility) {
        self.q[state][action] = value;
    }
    /// Greedy state value.
    pub fn v(&self, state: State) -> Utility {
        self.q[state]
            .iter()
            .copied()
            .fold(Utility::NEG_INFINITY, Utility::max)
    }
    /// Greedy action, first index among ties.
    pub fn policy(&self, state: State) -> Action {
        self.q[state]
            .iter()
            .enumerate()
            .fold((0, Utility::NEG_INFINITY), |(best, top), (a, &q)| {
                if q > top { (a, q) } else { (best, top) }
            })
            .0
    }
}

impl<M> From<&M> for QTable
where
    M: Mdp,
{
    fn from(mdp: &M) -> Self {
        Self::new(mdp.states(), mdp.actions())
    }
}

/// Value of landing in `state`: zero once absorbed.
fn value<M>(qt: &QTable, mdp: &M, state: State) -> Utility
where
    M: Mdp,
{
    if mdp.terminal(state) { 0. } else { qt.v(state) }
}

/// One Bellman backup of `Q(s, a)`. Returns the absolute change.
pub fn backup<M>(qt: &mut QTable, mdp: &M, state: State, action: Action) -> Utility
where
    M: Mdp,
{
    let future = (0..mdp.states())
        .map(|n| mdp.transition(state, action, n) * value(qt, mdp, n))
        .sum::<Utility>();
    let q = mdp.reward(state, action) + mdp.gamma() * future;
    let error = (q - qt.q(state, action)).abs();
    qt.set(state, action, q);
    error
}

/// Sweep until the largest backup error drops below `epsilon`.
/// Returns the number of sweeps performed.
pub fn value_iteration<M>(qt: &mut QTable, mdp: &M, epsilon: Utility) -> usize
where
    M: Mdp,
{
    let mut sweeps = 0;
    loop {
        sweeps += 1;
        let mut error = 0.;
        for state in (0..mdp.states()).filter(|s| !mdp.terminal(*s)) {
            for action in 0..mdp.actions() {
                error = Utility::max(error, backup(qt, mdp, state, action));
            }
        }
        log::trace!("value iteration sweep {} error {:.2e}", sweeps, error);
        if error < epsilon {
            return sweeps;
        }
    }
}

/// Converged action values of `mdp`.
pub fn solve<M>(mdp: &M) -> QTable
where
    M: Mdp,
{
    let mut qt = QTable::from(mdp);
    let sweeps = value_iteration(&mut qt, mdp, VI_EPSILON);
    log::debug!("value iteration converged after {} sweeps", sweeps);
    qt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_step_corridor() {
        // 0 -a0 (+1)-> 1 -a0 (+5)-> 2 (terminal); a1 quits to 2 for +2
        let mdp = FlatMdp::deterministic(
            0.9,
            vec![vec![1, 2], vec![2, 2], vec![2, 2]],
            vec![vec![1., 2.], vec![5., 2.], vec![0., 0.]],
            vec![2],
        )
        .expect("valid corridor");
        let qt = solve(&mdp);
        assert!((qt.v(1) - 5.0).abs() < 1e-9);
        assert!((qt.q(0, 0) - 5.5).abs() < 1e-9);
        assert!((qt.q(0, 1) - 2.0).abs() < 1e-9);
        assert_eq!(qt.policy(0), 0);
    }

    #[test]
    fn self_loop_matches_geometric_series() {
        let mdp = FlatMdp::deterministic(0.5, vec![vec![0]], vec![vec![1.]], vec![])
            .expect("valid loop");
        let mut qt = QTable::from(&mdp);
        let sweeps = value_iteration(&mut qt, &mdp, 1e-9);
        assert!(sweeps > 10);
        assert!((qt.v(0) - 2.).abs() < 1e-8);
    }

    #[test]
    fn backup_reports_change() {
        let mdp = FlatMdp::deterministic(0.5, vec![vec![0]], vec![vec![1.]], vec![])
            .expect("valid loop");
        let ref mut qt = QTable::from(&mdp);
        assert_eq!(backup(qt, &mdp, 0, 0), 1.);
        assert_eq!(backup(qt, &mdp, 0, 0), 0.5);
    }

    #[test]
    fn policy_prefers_first_among_ties() {
        let mut qt = QTable::new(1, 3);
        qt.set(0, 1, 2.);
        qt.set(0, 2, 2.);
        assert_eq!(qt.policy(0), 1);
    }
}

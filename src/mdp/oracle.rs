use super::Mdp;
use crate::*;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::SmallRng;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

/// Generative view of a tabular MDP positioned at one state.
///
/// Identity is the state index alone: two oracles over the same model at
/// the same state share a search node.
pub struct MdpOracle<M>
where
    M: Mdp,
{
    mdp: Arc<M>,
    state: State,
}

impl<M> MdpOracle<M>
where
    M: Mdp,
{
    pub fn new(mdp: Arc<M>, state: State) -> Self {
        assert!(state < mdp.states(), "state {} out of range", state);
        Self { mdp, state }
    }
    /// Same model, different state.
    pub fn teleport(&self, state: State) -> Self {
        Self::new(self.mdp.clone(), state)
    }
    pub fn state(&self) -> State {
        self.state
    }
    pub fn mdp(&self) -> &Arc<M> {
        &self.mdp
    }
}

impl<M> Oracle for MdpOracle<M>
where
    M: Mdp,
{
    /// `n ~ T(s, a, ·)` with reward `R(s, a)`. A row with no mass has no successor.
    fn next(&self, action: Action, rng: &mut SmallRng) -> Option<(Self, Utility)> {
        let weights = (0..self.mdp.states()).map(|n| self.mdp.transition(self.state, action, n));
        let next = WeightedIndex::new(weights).ok()?.sample(rng);
        Some((self.teleport(next), self.mdp.reward(self.state, action)))
    }
    fn terminal(&self) -> bool {
        self.mdp.terminal(self.state)
    }
}

impl<M> Clone for MdpOracle<M>
where
    M: Mdp,
{
    fn clone(&self) -> Self {
        Self {
            mdp: self.mdp.clone(),
            state: self.state,
        }
    }
}

impl<M> PartialEq for MdpOracle<M>
where
    M: Mdp,
{
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}
impl<M> Eq for MdpOracle<M> where M: Mdp {}

impl<M> Hash for MdpOracle<M>
where
    M: Mdp,
{
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.state.hash(state);
    }
}

impl<M> std::fmt::Debug for MdpOracle<M>
where
    M: Mdp,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MdpOracle").field(&self.state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatMdp;
    use rand::SeedableRng;

    #[test]
    fn identity_ignores_model_handle() {
        let a = MdpOracle::new(Arc::new(FlatMdp::chain(3, 0.9)), 1);
        let b = MdpOracle::new(Arc::new(FlatMdp::chain(3, 0.9)), 1);
        assert_eq!(a, b);
        assert_ne!(a, b.teleport(2));
    }

    #[test]
    fn samples_follow_transition_support() {
        let oracle = MdpOracle::new(Arc::new(FlatMdp::chain(4, 0.9)), 1);
        let ref mut rng = SmallRng::seed_from_u64(7);
        let samples = (0..512)
            .map(|_| oracle.next(0, rng).expect("row has mass"))
            .collect::<Vec<_>>();
        assert!(samples.iter().all(|(n, r)| (n.state() == 1 || n.state() == 2) && *r == 0.));
        let stays = samples.iter().filter(|(n, _)| n.state() == 1).count();
        assert!(stays > 20 && stays < 100, "slip rate ~0.1, got {}/512", stays);
    }

    #[test]
    fn massless_row_has_no_successor() {
        let transitions = vec![vec![vec![0., 1.]], vec![vec![0., 0.]]];
        let mdp = FlatMdp::new(0.9, transitions, vec![vec![1.], vec![0.]], vec![1])
            .expect("terminal row is ignored");
        let oracle = MdpOracle::new(Arc::new(mdp), 1);
        assert!(oracle.terminal());
        assert!(oracle.next(0, &mut SmallRng::seed_from_u64(0)).is_none());
    }
}

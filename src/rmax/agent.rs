use super::Rmax;
use crate::*;
use std::sync::Arc;

/// Model-based learner: R-max optimism planned with sparse sampling.
///
/// The planner searches a frozen snapshot of the model. Whenever an
/// observation makes a new pair known, the snapshot and the whole search
/// tree are thrown away and rebuilt, since every bound in the tree may
/// depend on the pair that just changed.
pub struct RmaxAgent {
    model: Rmax,
    settings: Settings,
    seed: u64,
    oracle: MdpOracle<Rmax>,
    planner: Planner<MdpOracle<Rmax>>,
    last: Option<(State, Action)>,
    fresh: bool,
}

impl RmaxAgent {
    pub fn new(model: Rmax, settings: Settings) -> Self {
        let snapshot = Arc::new(model.clone());
        Self {
            planner: Planner::new(snapshot.problem(), settings),
            oracle: MdpOracle::new(snapshot, 0),
            model,
            settings,
            seed: SEARCH_SEED,
            last: None,
            fresh: true,
        }
    }
    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.forget();
        self
    }

    pub fn model(&self) -> &Rmax {
        &self.model
    }
    pub fn planner(&self) -> &Planner<MdpOracle<Rmax>> {
        &self.planner
    }

    /// First action of an episode.
    pub fn start(&mut self, state: State) -> Action {
        self.fresh = true;
        self.act(state)
    }

    /// Learn from the last transition, then act from `state`.
    pub fn step(&mut self, reward: Utility, state: State) -> Action {
        if let Some((s, a)) = self.last {
            if self.model.observe(s, a, state, reward) {
                self.forget();
            }
        }
        self.act(state)
    }

    /// Learn from the transition that ended the episode.
    pub fn end(&mut self, reward: Utility) {
        if let Some((s, a)) = self.last.take() {
            if self.model.observe_terminal(s, a, reward) {
                self.forget();
            }
        }
    }

    fn act(&mut self, state: State) -> Action {
        let root = self.oracle.teleport(state);
        let action = match std::mem::replace(&mut self.fresh, false) {
            true => self.planner.start(root),
            false => self.planner.step(root),
        };
        self.last = Some((state, action));
        action
    }

    /// Replan from scratch against the current model.
    fn forget(&mut self) {
        let snapshot = Arc::new(self.model.clone());
        let problem = snapshot.problem();
        log::debug!(
            "model changed, rebuilding search over V ∈ [{:.4}, {:.4}]",
            problem.vmin,
            problem.vmax
        );
        self.oracle = MdpOracle::new(snapshot, self.oracle.state());
        self.planner = Planner::new(problem, self.settings).seeded(self.seed);
        self.fresh = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            depth: 4,
            trajectories: 20,
            budget: 0,
            search: Config {
                width: 1,
                ..Config::default()
            },
            ..Settings::default()
        }
    }

    #[test]
    fn steps_accumulate_while_nothing_is_learned() {
        let mut agent = RmaxAgent::new(Rmax::new(3, 2, 0.9, 1., 3), settings());
        agent.start(0);
        assert_eq!(agent.planner().steps(), 0);
        agent.step(0., 1);
        agent.step(0., 2);
        assert_eq!(agent.planner().steps(), 2);
    }

    #[test]
    fn learning_rebuilds_the_planner() {
        let mut agent = RmaxAgent::new(Rmax::new(3, 2, 0.9, 1., 1), settings());
        let action = agent.start(0);
        agent.step(0., 1);
        assert!(agent.model().known(0, action));
        assert_eq!(agent.planner().steps(), 0);
    }

    #[test]
    fn episode_end_is_observed() {
        let mut agent = RmaxAgent::new(Rmax::new(2, 2, 0.9, 1., 1), settings());
        let action = agent.start(1);
        agent.end(0.25);
        let model = agent.model();
        assert!(model.known(1, action));
        assert_eq!(model.transition(1, action, model.end()), 1.);
        assert_eq!(model.reward(1, action), 0.25);
        agent.end(1.);
        assert_eq!(agent.model().count(1, action), 1);
    }

    #[test]
    fn known_poor_action_is_avoided() {
        // trying an action once reveals it pays nothing and ends the
        // episode; the untried one still promises rmax forever
        let mut agent = RmaxAgent::new(Rmax::new(1, 2, 0.9, 1., 1), settings());
        let tried = agent.start(0);
        agent.end(0.);
        assert_eq!(agent.start(0), 1 - tried);
    }
}

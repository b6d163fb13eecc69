//! Per-episode planning loop.
//!
//! A [`Planner`] owns one [`Searcher`] for the length of an episode. Each
//! real decision plans from the node at the current step depth, so the
//! subtree grown below the previous root is reused, and then discards the
//! depth it just left.
mod settings;

pub use settings::Settings;

use crate::*;
use std::sync::Arc;

pub struct Planner<O>
where
    O: Oracle,
{
    settings: Settings,
    problem: Problem,
    seed: u64,
    searcher: Searcher<O>,
    steps: Depth,
    root: Option<Arc<Node<O>>>,
}

impl<O> Planner<O>
where
    O: Oracle,
{
    pub fn new(problem: Problem, settings: Settings) -> Self {
        Self {
            settings,
            problem,
            seed: SEARCH_SEED,
            searcher: Searcher::new(problem, settings.search),
            steps: 0,
            root: None,
        }
    }
    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.searcher = Searcher::new(self.problem, self.settings.search).seeded(seed);
        self
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    pub fn searcher(&self) -> &Searcher<O> {
        &self.searcher
    }
    /// Real-world steps taken since the episode started.
    pub fn steps(&self) -> Depth {
        self.steps
    }
    /// Root of the most recent decision.
    pub fn root(&self) -> Option<&Arc<Node<O>>> {
        self.root.as_ref()
    }

    /// Drop the whole tree and start over with an empty searcher.
    pub fn reset(&mut self) {
        self.root = None;
        self.searcher = Searcher::new(self.problem, self.settings.search).seeded(self.seed);
    }

    /// Sample trajectories from `root` until the trajectory count or the
    /// expansion budget runs out. Returns the root node and samples drawn.
    pub fn plan(&self, root: O) -> (Arc<Node<O>>, usize) {
        let node = self.searcher.node(self.steps, root);
        let mut expanded = 0;
        for _ in 0..self.settings.trajectories {
            expanded += self.searcher.run_trajectory(&node, self.settings.depth);
            if self.settings.exhausted(expanded) {
                break;
            }
        }
        (node, expanded)
    }

    /// [`Planner::plan`] with trajectories run in parallel batches, one
    /// per rayon thread, checking the budget between batches.
    #[cfg(feature = "server")]
    pub fn plan_parallel(&self, root: O) -> (Arc<Node<O>>, usize) {
        let node = self.searcher.node(self.steps, root);
        let batch = rayon::current_num_threads().max(1);
        let mut expanded = 0;
        let mut remaining = self.settings.trajectories;
        while remaining > 0 && !self.settings.exhausted(expanded) {
            let count = remaining.min(batch);
            expanded += self.searcher.run_trajectories(&node, self.settings.depth, count);
            remaining -= count;
        }
        (node, expanded)
    }

    fn search(&self, root: O) -> (Arc<Node<O>>, usize) {
        #[cfg(feature = "server")]
        if self.settings.parallel {
            return self.plan_parallel(root);
        }
        self.plan(root)
    }

    /// First decision of an episode.
    pub fn start(&mut self, root: O) -> Action {
        self.steps = 0;
        self.decide(root)
    }
    /// Every later decision.
    pub fn step(&mut self, root: O) -> Action {
        self.steps += 1;
        self.decide(root)
    }

    fn decide(&mut self, root: O) -> Action {
        if self.settings.replan {
            self.reset();
        }
        let (node, expanded) = self.search(root);
        let action = self.searcher.action(&node);
        log::info!(
            "step {:<4} action {:<3} V ∈ [{:>+9.4}, {:>+9.4}] samples {}",
            self.steps,
            action,
            node.vlower(),
            node.vupper(),
            expanded,
        );
        if !self.settings.search.shallow {
            self.searcher.clear_level(self.steps);
        }
        self.root = Some(node);
        action
    }
}

use super::bound::Bound;
use super::config::Config;
use super::config::Problem;
use super::node::Node;
use crate::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Sender;

/// One depth bucket of the memo table.
type Level<O> = Mutex<HashMap<O, Arc<Node<O>>>>;

/// Owns the memo table and runs trajectories through it.
///
/// Nodes are memoized by `(depth, oracle)` so that repeated outcomes and
/// repeated planning calls within an episode share work. Each depth bucket
/// has its own mutex and node creation happens under it, so concurrent
/// trajectories racing on an unseen oracle still end up with one node.
///
/// # Path score
///
/// With early termination enabled, a descent stops once its accumulated
/// log path likelihood drops below the score at which the *previous*
/// trajectory ended. The threshold is whatever the last trajectory reached,
/// not the best one seen, so it can rise after a poor trajectory and cut
/// the next good one short.
pub struct Searcher<O>
where
    O: Oracle,
{
    config: Config,
    problem: Problem,
    seed: u64,
    counter: AtomicUsize,
    levels: Mutex<BTreeMap<Depth, Arc<Level<O>>>>,
    last: Bound,
}

impl<O> Searcher<O>
where
    O: Oracle,
{
    pub fn new(problem: Problem, config: Config) -> Self {
        problem.validate();
        assert!(config.width > 0, "sampling width must be positive");
        Self {
            config,
            problem,
            seed: SEARCH_SEED,
            counter: AtomicUsize::new(0),
            levels: Mutex::new(BTreeMap::new()),
            last: Bound::new(0.),
        }
    }
    /// Reseed every sampling stream this searcher hands out.
    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
    pub fn problem(&self) -> &Problem {
        &self.problem
    }
    pub fn seed(&self) -> u64 {
        self.seed
    }
    /// End path score of the most recently completed trajectory.
    pub fn last_path_score(&self) -> Utility {
        self.last.get()
    }

    /// deterministic sampling streams, one per (node, salt).
    /// expansion uses salt 0, backups use the node's visit count.
    pub(crate) fn rng(&self, id: usize, salt: u64) -> SmallRng {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hash;
        use std::hash::Hasher;
        let ref mut hasher = DefaultHasher::new();
        self.seed.hash(hasher);
        id.hash(hasher);
        salt.hash(hasher);
        SmallRng::seed_from_u64(hasher.finish())
    }

    fn spawn(&self, depth: Depth, oracle: O) -> Arc<Node<O>> {
        let id = self.counter.fetch_add(1, Ordering::Relaxed);
        Arc::new(Node::new(id, depth, oracle, &self.problem))
    }
    fn level(&self, depth: Depth) -> Arc<Level<O>> {
        self.levels
            .lock()
            .expect("memo table lock poisoned")
            .entry(depth)
            .or_default()
            .clone()
    }
}

// memo table
impl<O> Searcher<O>
where
    O: Oracle,
{
    /// The node for `oracle` at `depth`, created on first request.
    ///
    /// Without memoization every call builds a fresh node. In shallow mode
    /// every depth maps to bucket 0.
    pub fn node(&self, depth: Depth, oracle: O) -> Arc<Node<O>> {
        if !self.config.memoize {
            return self.spawn(depth, oracle);
        }
        let depth = if self.config.shallow { 0 } else { depth };
        self.level(depth)
            .lock()
            .expect("memo level lock poisoned")
            .entry(oracle)
            .or_insert_with_key(|oracle| self.spawn(depth, oracle.clone()))
            .clone()
    }

    /// Forget every node memoized at `depth`. Called once the episode has
    /// moved past that depth and its nodes can never be revisited.
    pub fn clear_level(&self, depth: Depth) {
        let removed = self
            .levels
            .lock()
            .expect("memo table lock poisoned")
            .remove(&depth);
        if let Some(level) = removed {
            let nodes = level
                .lock()
                .expect("memo level lock poisoned")
                .drain()
                .map(|(_, node)| node)
                .collect::<Vec<_>>();
            log::debug!("cleared level {} ({} nodes)", depth, nodes.len());
            if self.config.shallow {
                nodes.iter().for_each(|node| node.release());
            }
        }
    }

    /// Number of depth buckets currently held.
    pub fn levels(&self) -> usize {
        self.levels.lock().expect("memo table lock poisoned").len()
    }
    /// Number of nodes memoized at `depth`.
    pub fn population(&self, depth: Depth) -> usize {
        self.levels
            .lock()
            .expect("memo table lock poisoned")
            .get(&depth)
            .map_or(0, |level| level.lock().expect("memo level lock poisoned").len())
    }
}

// trajectories
impl<O> Searcher<O>
where
    O: Oracle,
{
    /// Run one trajectory of at most `length` steps from `node`.
    ///
    /// Returns the number of successor samples drawn by the expansions it
    /// performed (`C × actions` each), so callers can meter a budget.
    pub fn run_trajectory(&self, node: &Arc<Node<O>>, length: usize) -> usize {
        let (expanded, score) = self.descend(node, length, 0, 0.);
        self.last.set(score);
        expanded
    }

    /// Same descent as [`Searcher::run_trajectory`], then signal completion
    /// with the expansion count. The end path score is discarded, so the
    /// early termination threshold is left as it was. A dropped receiver is
    /// not an error.
    pub fn run_trajectory_notify(
        &self,
        node: &Arc<Node<O>>,
        length: usize,
        notify: Sender<usize>,
    ) {
        let (expanded, _) = self.descend(node, length, 0, 0.);
        let _ = notify.send(expanded);
    }

    /// Run `count` trajectories in parallel on the rayon pool.
    #[cfg(feature = "server")]
    pub fn run_trajectories(&self, node: &Arc<Node<O>>, length: usize, count: usize) -> usize {
        use rayon::iter::IntoParallelIterator;
        use rayon::iter::ParallelIterator;
        (0..count)
            .into_par_iter()
            .map(|_| self.run_trajectory(node, length))
            .sum()
    }

    /// returns (samples drawn, path score where the descent stopped)
    fn descend(
        &self,
        node: &Arc<Node<O>>,
        length: usize,
        depth: Depth,
        score: Utility,
    ) -> (usize, Utility) {
        if node.terminal() {
            log::trace!("{:>3} T node {}", depth, node.id());
            return (0, score);
        }
        if length == 0 {
            if self.config.zero_at_horizon {
                node.flatten();
            }
            log::trace!("{:>3} D node {}", depth, node.id());
            return (0, score);
        }
        if let Some(cap) = self.config.cap() {
            if node.visits() >= cap {
                log::trace!("{:>3} M node {}", depth, node.id());
                return (0, score);
            }
        }
        if self.config.early_termination && score < self.last_path_score() {
            log::trace!("{:>3} E node {} score {:.4}", depth, node.id(), score);
            return (0, score);
        }
        node.visit();
        let mut expanded = 0;
        if node.is_leaf() {
            match node.expand(self) {
                None => return (0, score),
                Some(samples) => expanded += samples,
            }
        }
        let action = node.best_action();
        let (child, count) = node.most_uncertain(action);
        let width = self.config.width;
        let step = self.problem.gamma.ln() + (count as Utility).ln() - (width as Utility).ln();
        log::trace!(
            "{:>3} > node {} a{} → node {} ({}/{})",
            depth,
            node.id(),
            action,
            child.id(),
            count,
            width
        );
        let (below, end) = self.descend(&child, length - 1, depth + 1, score + step);
        node.backup(self);
        (expanded + below, end)
    }

    /// Current recommendation at `node`.
    pub fn action(&self, node: &Node<O>) -> Action {
        node.best_action()
    }
    /// Upper bounds on every action's value at `node`.
    pub fn qupper(&self, node: &Node<O>) -> Vec<Utility> {
        node.qupper()
    }
}

impl<O> Drop for Searcher<O>
where
    O: Oracle,
{
    fn drop(&mut self) {
        if let Ok(levels) = self.levels.get_mut() {
            levels
                .values()
                .filter_map(|level| level.lock().ok())
                .for_each(|level| level.values().for_each(|node| node.release()));
        }
    }
}

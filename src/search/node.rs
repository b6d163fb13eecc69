use super::bound::Bound;
use super::branch::Branch;
use super::branch::Branches;
use super::searcher::Searcher;
use crate::*;
use rand::Rng;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

/// A vertex of the sparse sampling tree.
///
/// One node exists per distinct `(depth, oracle)` pair the searcher has
/// been asked about. Value bounds and the visit counter live in atomic
/// cells so parents can read them freely; everything else sits behind the
/// node's own mutex, which is held for a single operation at a time and
/// never across a descent into children.
pub struct Node<O>
where
    O: Oracle,
{
    id: usize,
    depth: Depth,
    terminal: bool,
    visits: AtomicUsize,
    vlower: Bound,
    vupper: Bound,
    filter: Option<Arc<dyn ActionFilter>>,
    slate: Mutex<Slate<O>>,
}

/// Lock-protected per-action state of a node.
struct Slate<O>
where
    O: Oracle,
{
    oracle: Option<O>,
    leaf: bool,
    best: Action,
    reward: Vec<Utility>,
    qlower: Vec<Utility>,
    qupper: Vec<Utility>,
    branches: Vec<Branches<O>>,
    uncertain: Vec<Option<Arc<Node<O>>>>,
}

impl<O> Node<O>
where
    O: Oracle,
{
    /// Fresh leaf for `oracle`. Terminal oracles get zero bounds and no
    /// per-action state; everything else starts at the global bounds.
    pub(super) fn new(id: usize, depth: Depth, oracle: O, problem: &Problem) -> Self {
        let terminal = oracle.terminal();
        let filter = oracle.filter();
        let (lower, upper, actions) = match terminal {
            true => (0., 0., 0),
            false => (problem.vmin, problem.vmax, problem.actions),
        };
        Self {
            id,
            depth,
            terminal,
            filter,
            visits: AtomicUsize::new(0),
            vlower: Bound::new(lower),
            vupper: Bound::new(upper),
            slate: Mutex::new(Slate {
                oracle: Some(oracle),
                leaf: true,
                best: 0,
                reward: vec![0.; actions],
                qlower: vec![problem.vmin; actions],
                qupper: vec![problem.vmax; actions],
                branches: (0..actions).map(|_| Branches::new()).collect(),
                uncertain: vec![None; actions],
            }),
        }
    }

    fn slate(&self) -> MutexGuard<'_, Slate<O>> {
        self.slate.lock().expect("node lock poisoned")
    }
    fn legal(&self, action: Action) -> bool {
        oracle::available(self.filter.as_ref(), action)
    }

    pub fn id(&self) -> usize {
        self.id
    }
    pub fn depth(&self) -> Depth {
        self.depth
    }
    pub fn terminal(&self) -> bool {
        self.terminal
    }
    pub fn visits(&self) -> usize {
        self.visits.load(Ordering::Relaxed)
    }
    pub(super) fn visit(&self) -> usize {
        self.visits.fetch_add(1, Ordering::Relaxed) + 1
    }
    pub fn vlower(&self) -> Utility {
        self.vlower.get()
    }
    pub fn vupper(&self) -> Utility {
        self.vupper.get()
    }
    /// `(lower, upper)` bounds on this node's value.
    pub fn bounds(&self) -> (Utility, Utility) {
        (self.vlower(), self.vupper())
    }
    pub fn is_leaf(&self) -> bool {
        self.slate().leaf
    }
    /// The generative state, until expansion drops it.
    pub fn oracle(&self) -> Option<O> {
        self.slate().oracle.clone()
    }
    /// Empirical mean reward of `action`.
    pub fn reward(&self, action: Action) -> Utility {
        self.slate().reward[action]
    }
    pub fn qlower(&self) -> Vec<Utility> {
        self.slate().qlower.clone()
    }
    pub fn qupper(&self) -> Vec<Utility> {
        self.slate().qupper.clone()
    }
    /// Sampled outcomes of `action` as `(child, count)` pairs.
    pub fn branches(&self, action: Action) -> Vec<(Arc<Node<O>>, usize)> {
        self.slate().branches[action]
            .values()
            .map(|b| (b.child.clone(), b.count))
            .collect()
    }

    /// How much this node would gain from another look.
    ///
    /// Raw bound width by default. In uncertainty-rate mode, once visited,
    /// the slack already removed from the global range divided by the
    /// effort spent, which favors nodes that are cheap to improve.
    pub fn uncertainty(&self, searcher: &Searcher<O>) -> Utility {
        let width = self.vupper() - self.vlower();
        match (searcher.config().uncertainty_rate, self.visits()) {
            (true, visits) if visits > 0 => {
                (searcher.problem().range() - width) / visits as Utility
            }
            _ => width,
        }
    }

    /// Draw `C` successors for every action and build the branch maps.
    ///
    /// Returns the number of samples drawn, `Some(0)` if another trajectory
    /// already expanded this node, or `None` for terminal nodes, which are
    /// never expanded.
    pub fn expand(&self, searcher: &Searcher<O>) -> Option<usize> {
        if self.terminal {
            return None;
        }
        let ref mut guard = self.slate();
        let slate = &mut **guard;
        if !slate.leaf {
            return Some(0);
        }
        let oracle = slate.oracle.take().expect("leaf retains its oracle");
        let width = searcher.config().width;
        let actions = searcher.problem().actions;
        let ref mut rng = searcher.rng(self.id, 0);
        for action in 0..actions {
            let legal = self.legal(action);
            let mut total = 0.;
            let mut most = Utility::NEG_INFINITY;
            for _ in 0..width {
                let (next, reward) = oracle
                    .next(action, rng)
                    .expect("oracle must yield a successor");
                total += reward;
                let child = searcher.node(self.depth + 1, next);
                let branch = slate.branches[action]
                    .entry(child.id())
                    .or_insert_with(|| Branch::from(child.clone()));
                branch.count += 1;
                let uncertainty = branch.count as Utility * child.uncertainty(searcher);
                if legal && uncertainty >= most {
                    most = uncertainty;
                    slate.uncertain[action] = Some(child);
                }
            }
            slate.reward[action] = total / width as Utility;
        }
        slate.best = (0..actions).find(|a| self.legal(*a)).unwrap_or(0);
        slate.leaf = false;
        log::trace!("expanded node {} at depth {}", self.id, self.depth);
        Some(width * actions)
    }

    /// Recompute action bounds from the children's current bounds, then the
    /// node bounds, the best action, and each action's most uncertain child.
    ///
    /// Actions are visited in a seeded random rotation; among equal upper
    /// bounds the one visited last becomes the best action.
    pub fn backup(&self, searcher: &Searcher<O>) {
        if self.terminal {
            return;
        }
        let ref mut guard = self.slate();
        let slate = &mut **guard;
        if slate.leaf {
            return;
        }
        let ref problem = searcher.problem();
        let width = searcher.config().width;
        let actions = problem.actions;
        let offset = searcher
            .rng(self.id, self.visits() as u64)
            .random_range(0..actions);
        let mut vlower = Utility::NEG_INFINITY;
        let mut vupper = Utility::NEG_INFINITY;
        let mut best = slate.best;
        for i in 0..actions {
            let action = (i + offset) % actions;
            let legal = self.legal(action);
            let mut lower = 0.;
            let mut upper = 0.;
            let mut most = Utility::NEG_INFINITY;
            let mut target = None;
            for branch in slate.branches[action].values() {
                let weight = branch.weight(width);
                lower += weight * branch.child.vlower();
                upper += weight * branch.child.vupper();
                let uncertainty = branch.count as Utility * branch.child.uncertainty(searcher);
                if legal && uncertainty >= most {
                    most = uncertainty;
                    target = Some(&branch.child);
                }
            }
            if let Some(child) = target {
                slate.uncertain[action] = Some(child.clone());
            }
            slate.qlower[action] = slate.reward[action] + problem.gamma * lower;
            slate.qupper[action] = slate.reward[action] + problem.gamma * upper;
            if legal {
                if slate.qlower[action] > vlower {
                    vlower = slate.qlower[action];
                }
                if slate.qupper[action] >= vupper {
                    vupper = slate.qupper[action];
                    best = action;
                }
            }
        }
        if vupper == Utility::NEG_INFINITY {
            vlower = problem.vmin;
            vupper = problem.vmin;
        }
        slate.best = best;
        self.vlower.set(vlower);
        self.vupper.set(vupper);
    }

    /// Cached argmax of the upper action bounds.
    pub fn best_action(&self) -> Action {
        self.slate().best
    }

    /// The child of `action` most worth re-sampling, with its sample count.
    pub fn most_uncertain(&self, action: Action) -> (Arc<Node<O>>, usize) {
        let slate = self.slate();
        let child = slate.uncertain[action]
            .clone()
            .expect("most uncertain child of an action never expanded");
        let count = slate.branches[action]
            .get(&child.id())
            .map(|b| b.count)
            .expect("most uncertain child belongs to its action's branches");
        (child, count)
    }

    /// Collapse both bounds to zero: the value of a finite-horizon cutoff.
    pub(super) fn flatten(&self) {
        let _guard = self.slate();
        self.vlower.set(0.);
        self.vupper.set(0.);
    }

    /// Drop every reference to children. Shallow trees can point back at
    /// their own ancestors, so the searcher unlinks nodes it discards.
    pub(super) fn release(&self) {
        let mut slate = self.slate();
        slate.branches.iter_mut().for_each(|b| b.clear());
        slate.uncertain.iter_mut().for_each(|u| *u = None);
    }
}

impl<O> std::fmt::Debug for Node<O>
where
    O: Oracle,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("depth", &self.depth)
            .field("terminal", &self.terminal)
            .field("visits", &self.visits())
            .field("vlower", &self.vlower())
            .field("vupper", &self.vupper())
            .finish()
    }
}

#[rustfmt::skip]
impl<O> std::fmt::Display for Node<O>
where
    O: Oracle,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slate = self.slate();
        writeln!(f, "Node {}  depth {}  visits {}  V ∈ [{:.4}, {:.4}]  π {}", self.id, self.depth, self.visits(), self.vlower(), self.vupper(), slate.best)?;
        if let Some(ref oracle) = slate.oracle {
            writeln!(f, "  oracle {:?}", oracle)?;
        }
        for (a, (r, (lo, hi))) in slate.reward.iter().zip(slate.qlower.iter().zip(slate.qupper.iter())).enumerate() {
            writeln!(f, "  a{:<3} r {:>+9.4}  Q ∈ [{:>+9.4}, {:>+9.4}]  branches {}", a, r, lo, hi, slate.branches[a].len())?;
        }
        Ok(())
    }
}

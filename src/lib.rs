//! Forward-search sparse sampling.
//!
//! An anytime online planner for MDPs and belief MDPs. Starting from the
//! current state, it grows a partial lookahead tree by sampling a fixed
//! number of outcomes per action and tightens upper and lower bounds on
//! every reachable node's value until the caller's budget runs out.
//!
//! # Module Structure
//!
//! - `oracle`: Generative model capabilities consumed by the search
//! - `search`: Search tree nodes, the memoizing searcher, trajectory sampling
//! - `mdp`: Tabular MDPs and the oracle that samples from them
//! - `vi`: Exact value iteration over known tabular MDPs
//! - `rmax`: Optimistic counting model and its learning agent
//! - `planner`: Per-episode planning loop with trajectory budgets

mod mdp;
mod oracle;
mod planner;
mod rmax;
mod search;
mod vi;

pub use mdp::*;
pub use oracle::*;
pub use planner::*;
pub use rmax::*;
pub use search::*;
pub use vi::*;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Index of an action in `[0, actions)`.
pub type Action = usize;
/// Index of a state in a tabular model.
pub type State = usize;
/// Distance from the planning root, and memo table bucket key.
pub type Depth = usize;
/// Rewards, returns, and value bounds.
pub type Utility = f64;
/// Transition weights and path likelihoods.
pub type Probability = f64;

// ============================================================================
// SEARCH DEFAULTS
// Sparse sampling width and pruning knobs (see `search::Config`).
// ============================================================================
/// Successor samples drawn per action when a node is expanded.
pub const SEARCH_WIDTH: usize = 5;
/// Visits after which a node stops admitting trajectories (0 = unlimited).
pub const SEARCH_MAX_VISITS: usize = 0;
/// Seed for the searcher's deterministic sampling streams.
pub const SEARCH_SEED: u64 = 0x5EED;

// ============================================================================
// PLANNING LOOP DEFAULTS
// Trajectory count and expansion budget per real-world decision.
// ============================================================================
/// Maximum trajectory length from the planning root.
pub const PLAN_DEPTH: usize = 10;
/// Trajectories sampled per decision.
pub const PLAN_TRAJECTORIES: usize = 100;
/// Expansion budget per decision (0 = unlimited).
pub const PLAN_BUDGET: usize = 1000;

// ============================================================================
// MODEL DEFAULTS
// ============================================================================
/// Observations of a state-action pair before R-max treats it as known.
pub const RMAX_THRESHOLD: usize = 5;
/// Convergence threshold on the max Bellman error for value iteration.
pub const VI_EPSILON: Utility = 1e-6;
/// Tolerance when checking that a transition row sums to one.
pub const ROW_TOLERANCE: Probability = 1e-6;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

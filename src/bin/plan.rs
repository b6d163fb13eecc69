//! Planning Binary
//!
//! Runs one episode of online sparse-sampling planning on a tabular MDP and
//! prints the planner's action bounds next to the exact values.
//!
//! Options: --mdp, --settings, --chain, --gamma, --depth, --trajectories,
//! --budget, --width, --shallow, --seed, --steps, --parallel, ...

use anyhow::Context;
use clap::Parser;
use fsss::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "Plan through one episode of a tabular MDP", long_about = None)]
struct Args {
    /// JSON model file; defaults to the built-in slippery chain
    #[arg(long)]
    mdp: Option<std::path::PathBuf>,
    /// JSON planner settings file; flags below override it
    #[arg(long)]
    settings: Option<std::path::PathBuf>,
    /// Length of the built-in chain
    #[arg(long, default_value_t = 6)]
    chain: usize,
    /// Discount of the built-in chain
    #[arg(long, default_value_t = 0.95)]
    gamma: Utility,
    #[arg(long)]
    depth: Option<usize>,
    #[arg(long)]
    trajectories: Option<usize>,
    /// Sample budget per decision (0 = unlimited)
    #[arg(long)]
    budget: Option<usize>,
    /// Successor samples per action
    #[arg(long)]
    width: Option<usize>,
    /// Visit cap per node (0 = unlimited)
    #[arg(long)]
    max_visits: Option<usize>,
    #[arg(long)]
    no_memo: bool,
    #[arg(long)]
    shallow: bool,
    #[arg(long)]
    early_termination: bool,
    #[arg(long)]
    uncertainty_rate: bool,
    #[arg(long)]
    zero_at_horizon: bool,
    #[arg(long)]
    replan: bool,
    /// Run trajectories on the rayon pool
    #[arg(long)]
    parallel: bool,
    #[arg(long, default_value_t = SEARCH_SEED)]
    seed: u64,
    /// Real-world steps before the episode is cut off
    #[arg(long, default_value_t = 20)]
    steps: usize,
    /// Start state
    #[arg(long, default_value_t = 0)]
    start: State,
}

impl Args {
    fn model(&self) -> anyhow::Result<FlatMdp> {
        match self.mdp {
            None => {
                anyhow::ensure!(self.chain > 1, "chain needs at least two states");
                anyhow::ensure!(
                    self.gamma > 0. && self.gamma < 1.,
                    "discount {} outside (0, 1)",
                    self.gamma
                );
                Ok(FlatMdp::chain(self.chain, self.gamma))
            }
            Some(ref path) => std::fs::read_to_string(path)
                .with_context(|| format!("read model {}", path.display()))?
                .parse::<FlatMdp>()
                .with_context(|| format!("parse model {}", path.display())),
        }
    }

    fn planning(&self) -> anyhow::Result<Settings> {
        let mut settings = match self.settings {
            None => Settings::default(),
            Some(ref path) => std::fs::read_to_string(path)
                .with_context(|| format!("read settings {}", path.display()))
                .and_then(|json| {
                    serde_json::from_str::<Settings>(&json).context("parse settings")
                })?,
        };
        settings.depth = self.depth.unwrap_or(settings.depth);
        settings.trajectories = self.trajectories.unwrap_or(settings.trajectories);
        settings.budget = self.budget.unwrap_or(settings.budget);
        settings.search.width = self.width.unwrap_or(settings.search.width);
        settings.search.max_visits = self.max_visits.unwrap_or(settings.search.max_visits);
        settings.replan |= self.replan;
        settings.parallel |= self.parallel;
        settings.search.memoize &= !self.no_memo;
        settings.search.shallow |= self.shallow;
        settings.search.early_termination |= self.early_termination;
        settings.search.uncertainty_rate |= self.uncertainty_rate;
        settings.search.zero_at_horizon |= self.zero_at_horizon;
        anyhow::ensure!(settings.search.width > 0, "width must be positive");
        Ok(settings)
    }
}

fn main() -> anyhow::Result<()> {
    fsss::log();
    let args = Args::parse();
    let mdp = Arc::new(args.model()?);
    let settings = args.planning()?;
    anyhow::ensure!(args.start < mdp.states(), "start state {} out of range", args.start);
    log::info!("{}", serde_json::to_string(&settings)?);

    let exact = solve(mdp.as_ref());
    let ref mut env = SmallRng::seed_from_u64(args.seed.wrapping_add(1));
    let mut planner = Planner::new(mdp.problem(), settings).seeded(args.seed);
    let mut oracle = MdpOracle::new(mdp.clone(), args.start);
    let mut total = 0.;
    let mut discount = 1.;

    for t in 0..args.steps {
        if oracle.terminal() {
            break;
        }
        let action = match t {
            0 => planner.start(oracle.clone()),
            _ => planner.step(oracle.clone()),
        };
        let state = oracle.state();
        if let Some(root) = planner.root() {
            let (lower, upper) = (root.qlower(), root.qupper());
            for a in 0..mdp.actions() {
                println!(
                    "t {:<3} s {:<3} a {:<2} Q ∈ [{:>+9.4}, {:>+9.4}]  exact {:>+9.4}{}",
                    t,
                    state,
                    a,
                    lower.get(a).copied().unwrap_or(0.),
                    upper.get(a).copied().unwrap_or(0.),
                    exact.q(state, a),
                    if a == action { "  <" } else { "" },
                );
            }
        }
        let (next, reward) = oracle
            .next(action, env)
            .context("model row has no successor")?;
        total += discount * reward;
        discount *= mdp.gamma();
        oracle = next;
    }

    println!("discounted return {:.4}", total);
    println!("optimal value     {:.4}", exact.v(args.start));
    Ok(())
}

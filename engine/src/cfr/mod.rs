//! CFR solver family: vanilla CFR, external-sampling MCCFR and CFR+
//!
//! Every variant owns a `SolverCore` holding the abstraction, evaluator, key
//! strategy, configuration, iteration counter and node table. Variants only
//! differ in how one iteration traverses the tree; the solve loop,
//! convergence checks and checkpointing are shared through the provided
//! methods of the `Solver` trait.
//!
//! Values returned by traversals are per-seat net chip results.

mod plus;
mod sampling;
mod vanilla;

pub use plus::CfrPlus;
pub use sampling::ExternalSamplingCfr;
pub use vanilla::VanillaCfr;

use crate::abstraction::GameAbstraction;
use crate::checkpoint;
use crate::config::{CfrConfig, CfrResult};
use crate::error::{CheckpointError, Result, SolverError};
use crate::evaluator::HandEvaluator;
use crate::game::{Action, GameState, Street};
use crate::node::{InfoSetNode, KeyStrategy, NodeTable, PublicKey, Slot};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// Available solver variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverKind {
    Vanilla,
    ExternalSampling,
    CfrPlus,
}

impl SolverKind {
    /// Iterations between exploitability checks
    pub fn check_interval(self) -> u64 {
        match self {
            SolverKind::ExternalSampling => 100,
            SolverKind::Vanilla | SolverKind::CfrPlus => 50,
        }
    }

    /// Whether checkpoints of this variant carry an RNG state
    pub fn stores_rng(self) -> bool {
        self == SolverKind::ExternalSampling
    }
}

/// Numeric selector; unknown values fall back to vanilla CFR
impl From<u8> for SolverKind {
    fn from(value: u8) -> Self {
        match value {
            1 => SolverKind::ExternalSampling,
            2 => SolverKind::CfrPlus,
            _ => SolverKind::Vanilla,
        }
    }
}

impl FromStr for SolverKind {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "vanilla" | "cfr" | "vanilla-cfr" => Ok(SolverKind::Vanilla),
            "mccfr" | "external-sampling" | "chance-sampling" => Ok(SolverKind::ExternalSampling),
            "cfr-plus" | "cfr+" | "cfrplus" => Ok(SolverKind::CfrPlus),
            _ => Err(SolverError::UnsupportedSolver(s.to_string())),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolverKind::Vanilla => "vanilla",
            SolverKind::ExternalSampling => "mccfr",
            SolverKind::CfrPlus => "cfr-plus",
        };
        f.write_str(name)
    }
}

/// State shared by every solver variant
pub struct SolverCore {
    pub(crate) abstraction: Arc<dyn GameAbstraction>,
    pub(crate) evaluator: Arc<dyn HandEvaluator>,
    pub(crate) keys: Arc<dyn KeyStrategy>,
    pub(crate) config: CfrConfig,
    pub(crate) iteration: u64,
    pub(crate) table: NodeTable,
}

impl SolverCore {
    /// Core with public-information keys and an empty table
    pub fn new(
        abstraction: Arc<dyn GameAbstraction>,
        evaluator: Arc<dyn HandEvaluator>,
        config: CfrConfig,
    ) -> Self {
        SolverCore {
            abstraction,
            evaluator,
            keys: Arc::new(PublicKey),
            config,
            iteration: 0,
            table: NodeTable::new(),
        }
    }

    /// Replace the key strategy; only meaningful before solving
    pub fn with_keys(mut self, keys: Arc<dyn KeyStrategy>) -> Self {
        self.keys = keys;
        self
    }

    pub fn config(&self) -> &CfrConfig {
        &self.config
    }

    pub fn abstraction(&self) -> &dyn GameAbstraction {
        self.abstraction.as_ref()
    }

    pub fn table(&self) -> &NodeTable {
        &self.table
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Slot of the node for `player` in `state`, created on first visit.
    ///
    /// A node whose action list does not match `actions` (restored from a
    /// checkpoint, or reached with a different action set) adopts them.
    pub(crate) fn node_slot(&mut self, state: &GameState, player: usize, actions: &[Action]) -> Slot {
        let key = self.keys.key(state, player);
        let slot = self
            .table
            .get_or_insert_with(key, || InfoSetNode::new(actions.to_vec()));
        let node = self.table.node_mut(slot);
        if node.actions().len() != actions.len() || node.actions().is_empty() {
            if !node.rederive_actions(actions.to_vec()) {
                debug!("reset node {slot}: saved sums do not match {} actions", actions.len());
            }
        }
        slot
    }

    /// Average strategy at the node for `player` in `state`.
    ///
    /// Uniform over the abstracted actions when the node is unknown or its
    /// saved sums do not line up with them.
    pub fn average_strategy(&self, state: &GameState, player: usize) -> Vec<f64> {
        let n = self.abstraction.abstracted_actions(state).len();
        self.average_strategy_for(state, player, n)
    }

    pub(crate) fn average_strategy_for(&self, state: &GameState, player: usize, n: usize) -> Vec<f64> {
        let key = self.keys.key(state, player);
        match self.table.get(&key) {
            Some(node) if n > 0 && node.strategy_sum().len() == n => node.average_strategy(),
            _ => vec![1.0 / n as f64; n],
        }
    }

    /// Regret scale for iteration `t`: `t^(-alpha)` when discounting
    pub(crate) fn discount(&self, t: u64) -> f64 {
        if self.config.use_discounting && t > 0 {
            (t as f64).powf(-self.config.alpha)
        } else {
            1.0
        }
    }

    /// Reject roots the traversal cannot handle.
    ///
    /// Betting only closes on the river, so earlier streets would never reach
    /// a terminal state. A fold keeps the turn on the folded seat, so only
    /// heads-up hands end after one.
    pub fn validate_root(&self, root: &GameState, needs_hands: bool) -> Result<()> {
        let n = root.num_players;
        if n != 2 {
            return Err(SolverError::UnsupportedRoot(format!(
                "{n} players; only heads-up roots terminate"
            )));
        }
        let sized = [
            root.hands.len(),
            root.stacks.len(),
            root.bets.len(),
            root.folded.len(),
            root.invested.len(),
        ];
        if sized.iter().any(|&len| len != n) || root.current_player >= n {
            return Err(SolverError::UnsupportedRoot(
                "per-player vectors do not match the player count".into(),
            ));
        }
        if root.street != Street::River {
            return Err(SolverError::UnsupportedRoot(format!(
                "street {} never closes; roots must be on the river",
                root.street.index()
            )));
        }
        if root.board.len() < 3 {
            return Err(SolverError::UnsupportedRoot(format!(
                "board of {} cards cannot reach a showdown",
                root.board.len()
            )));
        }
        if needs_hands {
            if let Some(player) = root.hands.iter().position(Option::is_none) {
                return Err(SolverError::MissingHoleCards(player));
            }
        }
        Ok(())
    }
}

/// How a traversal folds a regret delta into a node
#[derive(Debug, Clone, Copy)]
pub(crate) enum RegretRule {
    /// r += scale * delta
    Accumulate { scale: f64 },
    /// r = max(0, r + delta)
    FloorAtZero,
}

impl RegretRule {
    pub(crate) fn apply(self, node: &mut InfoSetNode, deltas: &[f64]) {
        match self {
            RegretRule::Accumulate { scale } => {
                let scaled: Vec<f64> = deltas.iter().map(|d| d * scale).collect();
                node.update_regret(&scaled);
            }
            RegretRule::FloorAtZero => node.update_regret_plus(deltas),
        }
    }
}

/// Common solver capabilities.
///
/// Implementors provide one iteration; solving, exploitability and
/// checkpointing come from the provided methods.
pub trait Solver: Send {
    fn kind(&self) -> SolverKind;

    fn core(&self) -> &SolverCore;

    fn core_mut(&mut self) -> &mut SolverCore;

    /// Run one iteration from `root`, incrementing the iteration counter
    fn run_iteration(&mut self, root: &GameState) -> Result<()>;

    /// Serialized RNG state, for variants that sample
    fn rng_state(&self) -> std::result::Result<Option<String>, CheckpointError> {
        Ok(None)
    }

    /// Restore a serialized RNG state
    fn restore_rng(&mut self, _state: Option<&str>) -> std::result::Result<(), CheckpointError> {
        Ok(())
    }

    fn iteration(&self) -> u64 {
        self.core().iteration
    }

    fn table(&self) -> &NodeTable {
        &self.core().table
    }

    /// Output strategy for `player` in `state`: the average strategy, uniform
    /// where nothing has been learned
    fn strategy(&self, state: &GameState, player: usize) -> Vec<f64> {
        self.core().average_strategy(state, player)
    }

    fn exploitability(&self, root: &GameState) -> Result<f64> {
        self.core().exploitability(root)
    }

    fn validate_root(&self, root: &GameState) -> Result<()> {
        self.core().validate_root(root, !self.kind().stores_rng())
    }

    /// Iterate until `max_iterations` or until exploitability reaches the target.
    ///
    /// Resumes from the current iteration counter.
    fn solve(&mut self, root: &GameState) -> Result<CfrResult> {
        let config = self.core().config.clone();
        config.validate()?;
        self.validate_root(root)?;

        let interval = self.kind().check_interval();
        let start = Instant::now();
        info!(
            "{:<32}{} from iteration {} to {} (alpha {}, beta {})",
            "solving",
            self.kind(),
            self.iteration(),
            config.max_iterations,
            config.alpha,
            config.beta
        );

        let mut converged = false;
        let mut last_check: Option<(u64, f64)> = None;
        while self.iteration() < config.max_iterations {
            self.run_iteration(root)?;
            let t = self.iteration();

            if t % interval == 0 {
                let exploitability = self.exploitability(root)?;
                info!("{:<32}{:<12}{:.6}", "exploitability", t, exploitability);
                last_check = Some((t, exploitability));
                if exploitability <= config.target_exploitability {
                    converged = true;
                    break;
                }
            }

            if config.checkpoint_frequency > 0 && t % config.checkpoint_frequency == 0 {
                // failures are logged by save_checkpoint; the solve goes on
                let _ = self.save_checkpoint(&config.checkpoint_path(t));
            }
        }

        let iterations = self.iteration();
        let final_exploitability = match last_check {
            Some((at, value)) if at == iterations => value,
            _ => self.exploitability(root)?,
        };
        let result = CfrResult {
            iterations_completed: iterations,
            final_exploitability,
            convergence_time_seconds: start.elapsed().as_secs_f64(),
            converged,
            status_message: if converged {
                "Converged".to_string()
            } else {
                "Max iterations reached".to_string()
            },
        };
        info!(
            "{:<32}{} after {} iterations, exploitability {:.6}",
            "finished",
            result.status_message,
            result.iterations_completed,
            result.final_exploitability
        );
        Ok(result)
    }

    /// Write the node table and iteration counter to `path`.
    ///
    /// Failures are logged and returned; solver state is never touched.
    fn save_checkpoint(&self, path: &Path) -> std::result::Result<(), CheckpointError> {
        let outcome = self.rng_state().and_then(|rng| {
            checkpoint::save(path, self.iteration(), rng.as_deref(), self.table())
        });
        match &outcome {
            Ok(()) => info!("{:<32}{}", "saving      checkpoint", path.display()),
            Err(e) => warn!("could not save checkpoint {}: {e}", path.display()),
        }
        outcome
    }

    /// Replace the node table and iteration counter with the contents of `path`.
    ///
    /// On failure the error is logged and returned and the solver is unchanged.
    fn load_checkpoint(&mut self, path: &Path) -> std::result::Result<(), CheckpointError> {
        let loaded = match checkpoint::load(path, self.kind().stores_rng()) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("could not load checkpoint {}: {e}", path.display());
                return Err(e);
            }
        };
        if let Err(e) = self.restore_rng(loaded.rng_state.as_deref()) {
            warn!("could not restore rng from {}: {e}", path.display());
            return Err(e);
        }

        let core = self.core_mut();
        core.table = loaded.table;
        core.iteration = loaded.iteration;
        info!(
            "{:<32}{} ({} nodes, iteration {})",
            "loading     checkpoint",
            path.display(),
            core.table.len(),
            core.iteration
        );
        Ok(())
    }
}

/// Build a solver of the requested kind around `core`
pub fn create_solver(kind: SolverKind, core: SolverCore) -> Box<dyn Solver> {
    match kind {
        SolverKind::Vanilla => Box::new(VanillaCfr::new(core)),
        SolverKind::ExternalSampling => Box::new(ExternalSamplingCfr::new(core)),
        SolverKind::CfrPlus => Box::new(CfrPlus::new(core)),
    }
}

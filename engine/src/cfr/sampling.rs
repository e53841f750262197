//! External-sampling Monte Carlo CFR
//!
//! Each iteration deals one random set of hole cards, then runs one pass per
//! seat. The traversing seat explores all of its own actions; every other
//! seat plays a single action sampled from its current strategy.

use super::{RegretRule, Solver, SolverCore, SolverKind};
use crate::card::{remaining_deck, Hand};
use crate::error::{CheckpointError, Result, SolverError};
use crate::game::GameState;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// External-sampling MCCFR solver with its own seeded generator
pub struct ExternalSamplingCfr {
    core: SolverCore,
    rng: ChaCha8Rng,
}

impl ExternalSamplingCfr {
    pub fn new(core: SolverCore) -> Self {
        let seed = core.config.seed.unwrap_or_else(|| rand::rng().random());
        ExternalSamplingCfr {
            core,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Copy of `root` with fresh hole cards for every seat, disjoint from the
    /// board and from each other
    fn deal(&mut self, root: &GameState) -> Result<GameState> {
        let mut deck = remaining_deck(&root.board);
        let needed = 2 * root.num_players;
        if deck.len() < needed {
            return Err(SolverError::UnsupportedRoot(format!(
                "{} cards left for {} players",
                deck.len(),
                root.num_players
            )));
        }
        let (cards, _) = deck.partial_shuffle(&mut self.rng, needed);
        let mut state = root.clone();
        state.hands = cards.chunks(2).map(|pair| Some(Hand(pair[0], pair[1]))).collect();
        Ok(state)
    }

    fn traverse(
        &mut self,
        state: &GameState,
        reach: &[f64],
        traverser: usize,
        scale: f64,
    ) -> Result<Vec<f64>> {
        if state.is_terminal() {
            return state.payoffs(self.core.evaluator.as_ref());
        }

        let player = state.current_player;
        let actions = self.core.abstraction.abstracted_actions(state);
        if actions.is_empty() {
            return Ok(vec![0.0; state.num_players]);
        }

        let slot = self.core.node_slot(state, player, &actions);
        let strategy = self.core.table.node(slot).strategy();

        if player != traverser {
            let choice = WeightedIndex::new(&strategy)
                .map_err(|e| SolverError::Sampling(e.to_string()))?
                .sample(&mut self.rng);
            let mut next_reach = reach.to_vec();
            next_reach[player] *= strategy[choice];
            let next = state.apply_action(&actions[choice]);
            return self.traverse(&next, &next_reach, traverser, scale);
        }

        let mut node_values = vec![0.0; state.num_players];
        let mut action_values = vec![0.0; actions.len()];
        for (i, action) in actions.iter().enumerate() {
            let next = state.apply_action(action);
            let mut next_reach = reach.to_vec();
            next_reach[player] *= strategy[i];

            let values = self.traverse(&next, &next_reach, traverser, scale)?;
            action_values[i] = values[player];
            for (v, child) in node_values.iter_mut().zip(&values) {
                *v += strategy[i] * child;
            }
        }

        let regrets: Vec<f64> = action_values
            .iter()
            .map(|v| v - node_values[player])
            .collect();
        let weighted: Vec<f64> = strategy.iter().map(|p| reach[player] * p).collect();

        let node = self.core.table.node_mut(slot);
        RegretRule::Accumulate { scale }.apply(node, &regrets);
        node.update_strategy_sum(&weighted);

        Ok(node_values)
    }
}

impl Solver for ExternalSamplingCfr {
    fn kind(&self) -> SolverKind {
        SolverKind::ExternalSampling
    }

    fn core(&self) -> &SolverCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SolverCore {
        &mut self.core
    }

    fn run_iteration(&mut self, root: &GameState) -> Result<()> {
        self.validate_root(root)?;
        self.core.iteration += 1;
        let scale = self.core.discount(self.core.iteration);
        let dealt = self.deal(root)?;
        for traverser in 0..root.num_players {
            let reach = vec![1.0; root.num_players];
            self.traverse(&dealt, &reach, traverser, scale)?;
        }
        Ok(())
    }

    fn rng_state(&self) -> std::result::Result<Option<String>, CheckpointError> {
        Ok(Some(serde_json::to_string(&self.rng)?))
    }

    fn restore_rng(&mut self, state: Option<&str>) -> std::result::Result<(), CheckpointError> {
        let text = state.ok_or_else(|| CheckpointError::Corrupt("missing rng state".into()))?;
        self.rng = serde_json::from_str(text)?;
        Ok(())
    }
}

//! Exploitability of the average strategy
//!
//! For every heads-up hole-card matchup the gap between each seat's best
//! response and its value under the average strategy is averaged:
//! `((br0 - v0) + (br1 - v1)) / 2`. Matchups run in parallel with rayon; all
//! access to the node table is read-only.
//!
//! With public-information keys the only hand-dependent input to a traversal
//! is who wins a showdown. Matchups are then grouped into three outcome
//! classes and each class is traversed once, weighted by its size.

use crate::card::{all_hands, remaining_deck, Hand};
use crate::cfr::SolverCore;
use crate::error::Result;
use crate::evaluator::HandStrength;
use crate::game::GameState;
use log::warn;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Reported when the player count is not two
pub const PLACEHOLDER_EXPLOITABILITY: f64 = 0.01;

impl SolverCore {
    /// Mean best-response gap over every board-disjoint hole-card matchup
    pub fn exploitability(&self, root: &GameState) -> Result<f64> {
        if root.num_players != 2 {
            warn!(
                "exploitability is only defined for two players, got {}; reporting {}",
                root.num_players, PLACEHOLDER_EXPLOITABILITY
            );
            return Ok(PLACEHOLDER_EXPLOITABILITY);
        }

        let hands = all_hands(&remaining_deck(&root.board));
        if self.keys.reads_private_cards() {
            let pairs = disjoint_pairs(&hands);
            return self.exploitability_over(root, &pairs);
        }
        self.exploitability_by_outcome(root, &hands)
    }

    /// Mean best-response gap over the given (seat 0, seat 1) matchups
    pub fn exploitability_over(&self, root: &GameState, pairs: &[(Hand, Hand)]) -> Result<f64> {
        if root.num_players != 2 {
            warn!("exploitability is only defined for two players");
            return Ok(PLACEHOLDER_EXPLOITABILITY);
        }
        if pairs.is_empty() {
            return Ok(0.0);
        }
        let gaps = pairs
            .par_iter()
            .map(|&(a, b)| self.matchup_gap(root, a, b))
            .collect::<Result<Vec<f64>>>()?;
        Ok(gaps.iter().sum::<f64>() / pairs.len() as f64)
    }

    fn exploitability_by_outcome(&self, root: &GameState, hands: &[Hand]) -> Result<f64> {
        let strengths = hands
            .par_iter()
            .map(|hand| {
                let mut cards = root.board.clone();
                cards.extend_from_slice(&hand.cards());
                self.evaluator.evaluate(&cards)
            })
            .collect::<Result<Vec<HandStrength>>>()?;

        // counts of matchups where seat 0 wins, seat 1 wins, or they tie
        let counts = (0..hands.len())
            .into_par_iter()
            .map(|i| {
                let mut local = [0u64; 3];
                for j in 0..hands.len() {
                    if i != j && !hands[i].overlaps(hands[j]) {
                        local[outcome(strengths[i], strengths[j])] += 1;
                    }
                }
                local
            })
            .reduce(|| [0u64; 3], |a, b| [a[0] + b[0], a[1] + b[1], a[2] + b[2]]);

        let total: u64 = counts.iter().sum();
        if total == 0 {
            return Ok(0.0);
        }

        let mut weighted = 0.0;
        for (class, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            if let Some((a, b)) = representative(hands, &strengths, class) {
                weighted += count as f64 * self.matchup_gap(root, a, b)?;
            }
        }
        Ok(weighted / total as f64)
    }

    fn matchup_gap(&self, root: &GameState, first: Hand, second: Hand) -> Result<f64> {
        let mut state = root.clone();
        state.hands = vec![Some(first), Some(second)];
        let value0 = self.strategy_value(&state, 0)?;
        let value1 = self.strategy_value(&state, 1)?;
        let best0 = self.best_response(&state, 0)?;
        let best1 = self.best_response(&state, 1)?;
        Ok(((best0 - value0) + (best1 - value1)) / 2.0)
    }

    /// Expected value of `player` when every seat follows the average strategy
    pub fn strategy_value(&self, state: &GameState, player: usize) -> Result<f64> {
        if state.is_terminal() {
            return Ok(state.payoffs(self.evaluator.as_ref())?[player]);
        }
        let actions = self.abstraction.abstracted_actions(state);
        if actions.is_empty() {
            return Ok(0.0);
        }

        let strategy = self.average_strategy_for(state, state.current_player, actions.len());
        let mut value = 0.0;
        for (action, p) in actions.iter().zip(&strategy) {
            value += p * self.strategy_value(&state.apply_action(action), player)?;
        }
        Ok(value)
    }

    /// Value of `player` best-responding to everyone else's average strategy.
    ///
    /// Unvisited opponent nodes, or nodes whose action count no longer
    /// matches, are treated as uniform.
    pub fn best_response(&self, state: &GameState, player: usize) -> Result<f64> {
        if state.is_terminal() {
            return Ok(state.payoffs(self.evaluator.as_ref())?[player]);
        }
        let actions = self.abstraction.abstracted_actions(state);
        if actions.is_empty() {
            return Ok(0.0);
        }

        let acting = state.current_player;
        if acting == player {
            let mut best = f64::NEG_INFINITY;
            for action in &actions {
                best = best.max(self.best_response(&state.apply_action(action), player)?);
            }
            return Ok(best);
        }

        let strategy = self.average_strategy_for(state, acting, actions.len());
        let mut value = 0.0;
        for (action, p) in actions.iter().zip(&strategy) {
            value += p * self.best_response(&state.apply_action(action), player)?;
        }
        Ok(value)
    }
}

/// Every ordered (seat 0, seat 1) pair of non-overlapping hands
pub fn disjoint_pairs(hands: &[Hand]) -> Vec<(Hand, Hand)> {
    let mut pairs = Vec::new();
    for &a in hands {
        for &b in hands {
            if !a.overlaps(b) {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

/// 0 when seat 0 wins, 1 when seat 1 wins, 2 on a tie
fn outcome(first: HandStrength, second: HandStrength) -> usize {
    match first.cmp(&second) {
        Ordering::Greater => 0,
        Ordering::Less => 1,
        Ordering::Equal => 2,
    }
}

fn representative(hands: &[Hand], strengths: &[HandStrength], class: usize) -> Option<(Hand, Hand)> {
    for i in 0..hands.len() {
        for j in 0..hands.len() {
            if i != j && !hands[i].overlaps(hands[j]) && outcome(strengths[i], strengths[j]) == class {
                return Some((hands[i], hands[j]));
            }
        }
    }
    None
}

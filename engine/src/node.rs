//! Information-set nodes and the node table
//!
//! A node holds the action list frozen when it was first visited, plus the
//! cumulative regret and strategy-sum vectors aligned with that list. Nodes
//! live in an arena indexed by slot; the table maps canonical state keys to
//! slots. Keys are built by a pluggable `KeyStrategy`.

use crate::card::board_to_string;
use crate::game::{Action, GameState};
use std::collections::HashMap;
use std::fmt::Write;

/// Arena index of a node
pub type Slot = usize;

/// Accumulated regrets and strategy weights for one information set
#[derive(Debug, Clone, PartialEq)]
pub struct InfoSetNode {
    actions: Vec<Action>,
    regret_sum: Vec<f64>,
    strategy_sum: Vec<f64>,
}

impl InfoSetNode {
    /// Zero-initialized node for the given actions
    pub fn new(actions: Vec<Action>) -> Self {
        let n = actions.len();
        InfoSetNode {
            actions,
            regret_sum: vec![0.0; n],
            strategy_sum: vec![0.0; n],
        }
    }

    /// Node restored from saved sums; its actions are filled in on the next visit
    pub fn restored(regret_sum: Vec<f64>, strategy_sum: Vec<f64>) -> Self {
        InfoSetNode {
            actions: Vec::new(),
            regret_sum,
            strategy_sum,
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn regret_sum(&self) -> &[f64] {
        &self.regret_sum
    }

    pub fn strategy_sum(&self) -> &[f64] {
        &self.strategy_sum
    }

    /// Attach actions to a restored node.
    ///
    /// Saved sums are kept when they line up with the actions, otherwise the
    /// node starts again from zero. Returns false when the sums were reset.
    pub fn rederive_actions(&mut self, actions: Vec<Action>) -> bool {
        let n = actions.len();
        self.actions = actions;
        if self.regret_sum.len() == n && self.strategy_sum.len() == n {
            return true;
        }
        self.regret_sum = vec![0.0; n];
        self.strategy_sum = vec![0.0; n];
        false
    }

    /// Current strategy via regret matching.
    /// σ(I,a) = r+(I,a) / Σr+(I,a); uniform if no regret is positive.
    pub fn strategy(&self) -> Vec<f64> {
        let n = self.regret_sum.len();
        let positive: f64 = self.regret_sum.iter().map(|&r| r.max(0.0)).sum();
        if positive <= 0.0 {
            return vec![1.0 / n as f64; n];
        }
        self.regret_sum.iter().map(|&r| r.max(0.0) / positive).collect()
    }

    /// Average strategy: S(I,a) / ΣS(I,a); uniform if nothing was accumulated.
    pub fn average_strategy(&self) -> Vec<f64> {
        let n = self.strategy_sum.len();
        let total: f64 = self.strategy_sum.iter().sum();
        if total <= 0.0 {
            return vec![1.0 / n as f64; n];
        }
        self.strategy_sum.iter().map(|&s| s / total).collect()
    }

    /// r(I,a) += delta[a]
    pub fn update_regret(&mut self, delta: &[f64]) {
        for (r, &d) in self.regret_sum.iter_mut().zip(delta) {
            *r += d;
        }
    }

    /// CFR+ update: r(I,a) = max(0, r(I,a) + delta[a]).
    /// The floor applies to the cumulative value, not the delta.
    pub fn update_regret_plus(&mut self, delta: &[f64]) {
        for (r, &d) in self.regret_sum.iter_mut().zip(delta) {
            *r = (*r + d).max(0.0);
        }
    }

    /// S(I,a) += weighted[a]
    pub fn update_strategy_sum(&mut self, weighted: &[f64]) {
        for (s, &w) in self.strategy_sum.iter_mut().zip(weighted) {
            *s += w;
        }
    }
}

/// Builds the canonical key that identifies a node.
pub trait KeyStrategy: Send + Sync {
    /// Key of the node where `player` decides in `state`
    fn key(&self, state: &GameState, player: usize) -> String;

    /// Whether keys depend on hole cards
    fn reads_private_cards(&self) -> bool {
        false
    }
}

/// Public-information key: street, pot, acting player, board and bets.
///
/// Every hole-card matchup with the same public history shares a node.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicKey;

impl KeyStrategy for PublicKey {
    fn key(&self, state: &GameState, player: usize) -> String {
        let mut key = format!(
            "p{}_s{}_pot{}_cp{}_board{}",
            player,
            state.street.index(),
            state.pot,
            state.current_player,
            board_to_string(&state.board)
        );
        for (i, bet) in state.bets.iter().enumerate() {
            let _ = write!(key, "_bet{i}_{bet}");
        }
        key
    }
}

/// Public key extended with the keyed player's hole cards
#[derive(Debug, Clone, Copy, Default)]
pub struct InformationSetKey;

impl KeyStrategy for InformationSetKey {
    fn key(&self, state: &GameState, player: usize) -> String {
        let mut key = PublicKey.key(state, player);
        match state.hands.get(player).copied().flatten() {
            Some(hand) => {
                let _ = write!(key, "_hand{hand}");
            }
            None => key.push_str("_hand--"),
        }
        key
    }

    fn reads_private_cards(&self) -> bool {
        true
    }
}

/// Key to node mapping backed by an arena.
///
/// Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    index: HashMap<String, Slot>,
    nodes: Vec<(String, InfoSetNode)>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
    }

    pub fn slot(&self, key: &str) -> Option<Slot> {
        self.index.get(key).copied()
    }

    pub fn get(&self, key: &str) -> Option<&InfoSetNode> {
        self.slot(key).map(|slot| &self.nodes[slot].1)
    }

    pub fn node(&self, slot: Slot) -> &InfoSetNode {
        &self.nodes[slot].1
    }

    pub fn node_mut(&mut self, slot: Slot) -> &mut InfoSetNode {
        &mut self.nodes[slot].1
    }

    /// Slot of `key`, creating the node with `make` on first use
    pub fn get_or_insert_with(&mut self, key: String, make: impl FnOnce() -> InfoSetNode) -> Slot {
        if let Some(&slot) = self.index.get(&key) {
            return slot;
        }
        let slot = self.nodes.len();
        self.index.insert(key.clone(), slot);
        self.nodes.push((key, make()));
        slot
    }

    /// Insert or replace the node stored under `key`
    pub fn insert(&mut self, key: String, node: InfoSetNode) -> Slot {
        match self.index.get(&key) {
            Some(&slot) => {
                self.nodes[slot].1 = node;
                slot
            }
            None => self.get_or_insert_with(key, || node),
        }
    }

    /// Nodes with their keys, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InfoSetNode)> {
        self.nodes.iter().map(|(k, n)| (k.as_str(), n))
    }
}

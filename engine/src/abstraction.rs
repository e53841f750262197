//! Card and action abstraction
//!
//! Hands are collapsed into buckets, legal raises into at most three
//! representative sizes, and boards into coarse classes.

use crate::card::{all_hands, remaining_deck, Card, Hand};
use crate::error::Result;
use crate::evaluator::HandEvaluator;
use crate::game::{Action, GameState};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Canonical starting-hand classes (13 pairs, 78 suited, 78 offsuit)
pub const PREFLOP_BUCKETS: usize = 169;
/// Equity buckets appended after the preflop classes
pub const POSTFLOP_BUCKETS: usize = 10;
/// Samples used when estimating postflop equity
pub const EQUITY_SAMPLES: usize = 1000;

const RANK_NAMES: [char; 13] = [
    '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A',
];

/// Maps hands, actions and boards onto a smaller strategic space.
pub trait GameAbstraction: Send + Sync {
    /// Bucket id of `hand` given the visible `board`
    fn hand_bucket(&self, hand: Hand, board: &[Card]) -> Result<usize>;

    /// Number of distinct bucket ids `hand_bucket` can return
    fn num_hand_buckets(&self) -> usize;

    /// Reduced action set for the acting player
    fn abstracted_actions(&self, state: &GameState) -> Vec<Action>;

    /// Coarse class of a board
    fn board_isomorphism_class(&self, board: &[Card]) -> usize;
}

/// Starting-hand table plus equity buckets, three raise sizes at most
pub struct BasicAbstraction {
    evaluator: Arc<dyn HandEvaluator>,
    /// preflop[i][j] for rank indices 0..13; i == j pairs, i < j suited, i > j offsuit
    preflop: [[usize; 13]; 13],
}

impl BasicAbstraction {
    pub fn new(evaluator: Arc<dyn HandEvaluator>) -> Self {
        let mut preflop = [[0usize; 13]; 13];
        let mut bucket = 0;
        for row in preflop.iter_mut() {
            for cell in row.iter_mut() {
                *cell = bucket;
                bucket += 1;
            }
        }
        BasicAbstraction { evaluator, preflop }
    }

    /// Table cell for a hand: (low, high) for suited, (high, low) otherwise
    fn preflop_cell(hand: Hand) -> (usize, usize) {
        let a = (hand.0.rank() - 2) as usize;
        let b = (hand.1.rank() - 2) as usize;
        let (high, low) = (a.max(b), a.min(b));
        if hand.is_suited() && high != low {
            (low, high)
        } else {
            (high, low)
        }
    }

    /// Starting-hand class name such as `AKs`, `T9o` or `77`
    pub fn preflop_class(hand: Hand) -> String {
        let a = hand.0.rank().max(hand.1.rank());
        let b = hand.0.rank().min(hand.1.rank());
        let (high, low) = (RANK_NAMES[(a - 2) as usize], RANK_NAMES[(b - 2) as usize]);
        if a == b {
            format!("{high}{low}")
        } else if hand.is_suited() {
            format!("{high}{low}s")
        } else {
            format!("{high}{low}o")
        }
    }

    fn postflop_bucket(&self, hand: Hand, board: &[Card]) -> Result<usize> {
        let mut dead = board.to_vec();
        dead.extend_from_slice(&hand.cards());
        let opponents = all_hands(&remaining_deck(&dead));
        if opponents.is_empty() {
            return Ok(PREFLOP_BUCKETS + POSTFLOP_BUCKETS / 2);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(card_seed(&dead));
        let equity = self.evaluator.monte_carlo_equity(
            hand,
            &opponents,
            board,
            EQUITY_SAMPLES,
            &mut rng,
        )?;
        let bucket = ((equity * POSTFLOP_BUCKETS as f64) as usize).min(POSTFLOP_BUCKETS - 1);
        Ok(PREFLOP_BUCKETS + bucket)
    }
}

/// Stable seed from a set of cards, so bucketing is repeatable
fn card_seed(cards: &[Card]) -> u64 {
    cards
        .iter()
        .fold(0u64, |acc, c| acc.wrapping_mul(53).wrapping_add(c.index() as u64 + 1))
}

impl GameAbstraction for BasicAbstraction {
    fn hand_bucket(&self, hand: Hand, board: &[Card]) -> Result<usize> {
        if board.is_empty() {
            let (row, col) = Self::preflop_cell(hand);
            return Ok(self.preflop[row][col]);
        }
        self.postflop_bucket(hand, board)
    }

    fn num_hand_buckets(&self) -> usize {
        PREFLOP_BUCKETS + POSTFLOP_BUCKETS
    }

    fn abstracted_actions(&self, state: &GameState) -> Vec<Action> {
        let legal = state.legal_actions();
        let mut actions: Vec<Action> = legal.iter().copied().filter(|a| !a.is_raise()).collect();

        let mut raises: Vec<f64> = legal
            .iter()
            .filter_map(|a| match a {
                Action::Raise(amount) => Some(*amount),
                _ => None,
            })
            .collect();
        raises.sort_by(f64::total_cmp);

        if let (Some(&smallest), Some(&largest)) = (raises.first(), raises.last()) {
            actions.push(Action::Raise(smallest));
            if largest > smallest {
                actions.push(Action::Raise(largest));
            }
            if raises.len() >= 3 {
                let middle = raises[raises.len() / 2];
                if middle > smallest && middle < largest {
                    actions.push(Action::Raise(middle));
                }
            }
        }

        actions.sort_by(|a, b| {
            a.kind()
                .cmp(&b.kind())
                .then_with(|| a.amount().total_cmp(&b.amount()))
        });
        actions.dedup();
        actions
    }

    fn board_isomorphism_class(&self, board: &[Card]) -> usize {
        let paired = board
            .iter()
            .enumerate()
            .any(|(i, a)| board[i + 1..].iter().any(|b| a.rank() == b.rank()));
        board.len() + if paired { 10 } else { 0 }
    }
}

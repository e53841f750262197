//! Hand-strength evaluation and equity sampling
//!
//! The evaluator follows a two-path approach per five-card combination:
//! - Suit check for flushes
//! - Rank-bit mask plus rank counts for straights and paired hands
//!
//! Seven-card hands are evaluated by taking the best of all 21 five-card
//! combinations. `HandStrength` packs the category and the tie-breaking ranks
//! into one integer, so comparing strengths is a single integer compare.

use crate::card::{Card, Hand};
use crate::error::{Result, SolverError};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// Poker hand categories, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandCategory {
    HighCard = 0,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl HandCategory {
    fn from_bits(bits: u32) -> HandCategory {
        match bits {
            0 => HandCategory::HighCard,
            1 => HandCategory::OnePair,
            2 => HandCategory::TwoPair,
            3 => HandCategory::ThreeOfAKind,
            4 => HandCategory::Straight,
            5 => HandCategory::Flush,
            6 => HandCategory::FullHouse,
            7 => HandCategory::FourOfAKind,
            _ => HandCategory::StraightFlush,
        }
    }
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandCategory::HighCard => "High Card",
            HandCategory::OnePair => "One Pair",
            HandCategory::TwoPair => "Two Pair",
            HandCategory::ThreeOfAKind => "Three of a Kind",
            HandCategory::Straight => "Straight",
            HandCategory::Flush => "Flush",
            HandCategory::FullHouse => "Full House",
            HandCategory::FourOfAKind => "Four of a Kind",
            HandCategory::StraightFlush => "Straight Flush",
        };
        f.write_str(name)
    }
}

/// Strength of the best five-card hand
///
/// Higher values beat lower values; equal values split the pot.
/// Layout: category in bits 20..24, then five 4-bit tie-break ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandStrength(u32);

impl HandStrength {
    fn new(category: HandCategory, kickers: &[u8]) -> Self {
        let mut value = (category as u32) << 20;
        for (i, &k) in kickers.iter().take(5).enumerate() {
            value |= (k as u32) << (16 - 4 * i);
        }
        HandStrength(value)
    }

    pub fn category(self) -> HandCategory {
        HandCategory::from_bits(self.0 >> 20)
    }

    /// Tie-break ranks, most significant first (zero-padded)
    pub fn kickers(self) -> [u8; 5] {
        let mut out = [0u8; 5];
        for (i, k) in out.iter_mut().enumerate() {
            *k = ((self.0 >> (16 - 4 * i)) & 0xF) as u8;
        }
        out
    }

    /// Raw packed value
    pub fn value(self) -> u32 {
        self.0
    }
}

/// Hand strength evaluation used at showdowns and during bucketing.
pub trait HandEvaluator: Send + Sync {
    /// Strength of the best five-card hand among 5 to 7 cards.
    fn evaluate(&self, cards: &[Card]) -> Result<HandStrength>;

    /// Monte Carlo win probability of `hand` against a uniformly drawn
    /// opponent hand from `opponents`, completing `board` to five cards.
    ///
    /// Ties count as half a win. Samples whose opponent hand collides with a
    /// known card are skipped.
    fn monte_carlo_equity(
        &self,
        hand: Hand,
        opponents: &[Hand],
        board: &[Card],
        samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<f64> {
        if board.len() > 5 {
            return Err(SolverError::CardCount(board.len() + 2));
        }
        if opponents.is_empty() || samples == 0 {
            return Ok(0.5);
        }

        let mut wins = 0.0_f64;
        let mut valid = 0usize;
        let mut cards = Vec::with_capacity(7);
        for _ in 0..samples {
            let opponent = opponents[rng.random_range(0..opponents.len())];
            if opponent.overlaps(hand) || board.iter().any(|&c| opponent.contains(c)) {
                continue;
            }

            let mut deck: Vec<Card> = crate::card::full_deck()
                .into_iter()
                .filter(|&c| !hand.contains(c) && !opponent.contains(c) && !board.contains(&c))
                .collect();
            let needed = 5 - board.len();
            let (runout, _) = deck.partial_shuffle(rng, needed);

            cards.clear();
            cards.extend_from_slice(board);
            cards.extend_from_slice(runout);
            let shared = cards.len();

            cards.extend_from_slice(&hand.cards());
            let ours = self.evaluate(&cards)?;
            cards.truncate(shared);
            cards.extend_from_slice(&opponent.cards());
            let theirs = self.evaluate(&cards)?;

            valid += 1;
            if ours > theirs {
                wins += 1.0;
            } else if ours == theirs {
                wins += 0.5;
            }
        }

        if valid == 0 {
            return Ok(0.5);
        }
        Ok(wins / valid as f64)
    }
}

/// Rank-mask evaluator
///
/// Checks every five-card subset and keeps the strongest.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskEvaluator;

impl MaskEvaluator {
    pub fn new() -> Self {
        MaskEvaluator
    }

    /// Evaluate a 7-card hand (5 board + 2 hole cards)
    pub fn evaluate_7cards(&self, board: [Card; 5], hand: [Card; 2]) -> HandStrength {
        let all_cards = [board[0], board[1], board[2], board[3], board[4], hand[0], hand[1]];
        best_of(&all_cards)
    }

    /// Evaluate a batch of 7-card hands
    pub fn evaluate_batch(&self, boards: &[[Card; 5]], hands: &[[Card; 2]]) -> Vec<HandStrength> {
        boards
            .iter()
            .zip(hands.iter())
            .map(|(board, hand)| self.evaluate_7cards(*board, *hand))
            .collect()
    }
}

impl HandEvaluator for MaskEvaluator {
    fn evaluate(&self, cards: &[Card]) -> Result<HandStrength> {
        if !(5..=7).contains(&cards.len()) {
            return Err(SolverError::CardCount(cards.len()));
        }
        Ok(best_of(cards))
    }
}

/// Best five-card strength among `cards` (5 to 7 cards)
fn best_of(cards: &[Card]) -> HandStrength {
    let n = cards.len();
    let mut best = HandStrength(0);
    let mut five = [cards[0]; 5];
    for mask in 0u32..(1 << n) {
        if mask.count_ones() != 5 {
            continue;
        }
        let mut k = 0;
        for (i, &card) in cards.iter().enumerate() {
            if mask & (1 << i) != 0 {
                five[k] = card;
                k += 1;
            }
        }
        let strength = rank_5cards(five);
        if strength > best {
            best = strength;
        }
    }
    best
}

/// Rank exactly five cards
fn rank_5cards(cards: [Card; 5]) -> HandStrength {
    let mut rank_mask = 0u16;
    let mut counts = [0u8; 15];
    for card in cards.iter() {
        rank_mask |= 1 << card.rank();
        counts[card.rank() as usize] += 1;
    }

    let flush = cards.iter().all(|c| c.suit() == cards[0].suit());
    let straight = straight_high(rank_mask);

    if let (true, Some(high)) = (flush, straight) {
        return HandStrength::new(HandCategory::StraightFlush, &[high]);
    }

    // (count, rank) groups, biggest group first, then highest rank
    let mut groups: Vec<(u8, u8)> = (2..=14u8)
        .rev()
        .filter(|&r| counts[r as usize] > 0)
        .map(|r| (counts[r as usize], r))
        .collect();
    groups.sort_by(|a, b| b.cmp(a));
    let ranks: Vec<u8> = groups.iter().map(|&(_, r)| r).collect();

    match (groups[0].0, groups.get(1).map(|g| g.0), straight) {
        (4, _, _) => HandStrength::new(HandCategory::FourOfAKind, &ranks),
        (3, Some(2), _) => HandStrength::new(HandCategory::FullHouse, &ranks),
        _ if flush => HandStrength::new(HandCategory::Flush, &ranks),
        (_, _, Some(high)) => HandStrength::new(HandCategory::Straight, &[high]),
        (3, _, _) => HandStrength::new(HandCategory::ThreeOfAKind, &ranks),
        (2, Some(2), _) => HandStrength::new(HandCategory::TwoPair, &ranks),
        (2, _, _) => HandStrength::new(HandCategory::OnePair, &ranks),
        _ => HandStrength::new(HandCategory::HighCard, &ranks),
    }
}

/// High card of a five-card straight in the rank mask, if any.
/// The wheel (A-2-3-4-5) counts as five-high.
fn straight_high(rank_mask: u16) -> Option<u8> {
    for high in (6..=14u8).rev() {
        let run = 0x1F << (high - 4);
        if rank_mask & run == run {
            return Some(high);
        }
    }
    const WHEEL: u16 = (1 << 14) | 0b11_1100;
    if rank_mask & WHEEL == WHEEL {
        return Some(5);
    }
    None
}

/// Benchmark helper for CLI
///
/// Evaluates a deterministic batch of 7-card hands and returns
/// (evals_per_sec, duration_ms)
pub fn benchmark_throughput(sample_size: usize) -> (f64, u64) {
    use std::time::Instant;

    let evaluator = MaskEvaluator::new();
    let (boards, hands) = generate_hands(sample_size, 12345);

    // Warm-up
    for i in 0..10_000.min(sample_size) {
        let _ = evaluator.evaluate_7cards(boards[i], hands[i]);
    }

    let start = Instant::now();
    let results = evaluator.evaluate_batch(&boards, &hands);
    let duration = start.elapsed();
    std::hint::black_box(results);

    let evals_per_sec = sample_size as f64 / duration.as_secs_f64().max(f64::MIN_POSITIVE);
    (evals_per_sec, duration.as_millis() as u64)
}

/// Deterministic random (board, hand) batch for benchmarks
pub fn generate_hands(count: usize, seed: u64) -> (Vec<[Card; 5]>, Vec<[Card; 2]>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut deck = crate::card::full_deck();
    let mut boards = Vec::with_capacity(count);
    let mut hands = Vec::with_capacity(count);
    for _ in 0..count {
        let (seven, _) = deck.partial_shuffle(&mut rng, 7);
        boards.push([seven[0], seven[1], seven[2], seven[3], seven[4]]);
        hands.push([seven[5], seven[6]]);
    }
    (boards, hands)
}

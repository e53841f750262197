//! Card, hole-card and board value types
//!
//! Cards are small immutable values shared by the rules engine, the
//! abstraction and the hand evaluator. Text parsing is strict: anything
//! malformed is rejected instead of being guessed at.

use crate::error::{Result, SolverError};
use std::fmt;
use std::str::FromStr;

const RANK_CHARS: [char; 13] = [
    '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A',
];
const SUIT_CHARS: [char; 4] = ['c', 'd', 'h', 's'];

/// A playing card with rank 2..=14 (ace high) and suit 0..=3 (c, d, h, s).
///
/// Ordering is by rank first, then suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Card {
    rank: u8,
    suit: u8,
}

impl Card {
    /// Create a card, rejecting out-of-range ranks or suits
    pub fn new(rank: u8, suit: u8) -> Result<Self> {
        if !(2..=14).contains(&rank) || suit > 3 {
            return Err(SolverError::InvalidCard(format!("rank {rank} suit {suit}")));
        }
        Ok(Card { rank, suit })
    }

    /// Create a card from its index 0..52, laid out as `(rank - 2) * 4 + suit`
    pub fn from_index(index: u8) -> Result<Self> {
        if index >= 52 {
            return Err(SolverError::InvalidCard(format!("index {index}")));
        }
        Ok(Card {
            rank: index / 4 + 2,
            suit: index % 4,
        })
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn suit(self) -> u8 {
        self.suit
    }

    /// Index 0..52 of this card
    pub fn index(self) -> u8 {
        (self.rank - 2) * 4 + self.suit
    }

    /// Rank as a single character (`2`..`9`, `T`, `J`, `Q`, `K`, `A`)
    pub fn rank_char(self) -> char {
        RANK_CHARS[(self.rank - 2) as usize]
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank_char(), SUIT_CHARS[self.suit as usize])
    }
}

impl FromStr for Card {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let (Some(r), Some(su), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(SolverError::InvalidCard(s.to_string()));
        };
        let rank = RANK_CHARS
            .iter()
            .position(|&c| c == r.to_ascii_uppercase())
            .ok_or_else(|| SolverError::InvalidCard(s.to_string()))?;
        let suit = SUIT_CHARS
            .iter()
            .position(|&c| c == su.to_ascii_lowercase())
            .ok_or_else(|| SolverError::InvalidCard(s.to_string()))?;
        Card::new(rank as u8 + 2, suit as u8)
    }
}

/// A pair of hole cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hand(pub Card, pub Card);

impl Hand {
    /// Create a hand, rejecting a pair of identical cards
    pub fn new(first: Card, second: Card) -> Result<Self> {
        if first == second {
            return Err(SolverError::InvalidHand(format!("{first}{second}")));
        }
        Ok(Hand(first, second))
    }

    pub fn cards(self) -> [Card; 2] {
        [self.0, self.1]
    }

    pub fn contains(self, card: Card) -> bool {
        self.0 == card || self.1 == card
    }

    /// True when the two hands share a card
    pub fn overlaps(self, other: Hand) -> bool {
        self.contains(other.0) || self.contains(other.1)
    }

    pub fn is_pair(self) -> bool {
        self.0.rank() == self.1.rank()
    }

    pub fn is_suited(self) -> bool {
        self.0.suit() == self.1.suit()
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

impl FromStr for Hand {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self> {
        let cards = parse_cards(s).map_err(|_| SolverError::InvalidHand(s.to_string()))?;
        match cards.as_slice() {
            [a, b] => Hand::new(*a, *b),
            _ => Err(SolverError::InvalidHand(s.to_string())),
        }
    }
}

/// Parse a run of cards such as `"As Kd 7h"` or `"AsKd7h"`.
///
/// Duplicate cards are rejected.
pub fn parse_cards(s: &str) -> Result<Vec<Card>> {
    let compact: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() % 2 != 0 {
        return Err(SolverError::InvalidCard(s.to_string()));
    }
    let mut cards: Vec<Card> = Vec::with_capacity(compact.len() / 2);
    for chunk in compact.chunks(2) {
        let card: Card = chunk.iter().collect::<String>().parse()?;
        if cards.contains(&card) {
            return Err(SolverError::InvalidCard(format!("duplicate {card}")));
        }
        cards.push(card);
    }
    Ok(cards)
}

/// Render a board as concatenated card text, e.g. `"AsKd7h"`
pub fn board_to_string(board: &[Card]) -> String {
    board.iter().map(|c| c.to_string()).collect()
}

/// All 52 cards, ordered by rank then suit
pub fn full_deck() -> Vec<Card> {
    (2..=14u8)
        .flat_map(|rank| (0..4u8).map(move |suit| Card { rank, suit }))
        .collect()
}

/// Cards of the full deck not present in `dead`
pub fn remaining_deck(dead: &[Card]) -> Vec<Card> {
    full_deck().into_iter().filter(|c| !dead.contains(c)).collect()
}

/// Every two-card hand drawable from `deck`, in deck order
pub fn all_hands(deck: &[Card]) -> Vec<Hand> {
    let mut hands = Vec::with_capacity(deck.len() * deck.len().saturating_sub(1) / 2);
    for (i, &a) in deck.iter().enumerate() {
        for &b in &deck[i + 1..] {
            hands.push(Hand(a, b));
        }
    }
    hands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_card_round_trip() {
        let card: Card = "As".parse().unwrap();
        assert_eq!(card.rank(), 14);
        assert_eq!(card.suit(), 3);
        assert_eq!(card.to_string(), "As");

        let lower: Card = "tH".parse().unwrap();
        assert_eq!(lower.rank(), 10);
        assert_eq!(lower.suit(), 2);
    }

    #[test]
    fn test_parse_card_rejects_malformed() {
        for bad in ["", "A", "Ax", "1s", "Asd", "10s"] {
            assert!(bad.parse::<Card>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_card_ordering_rank_then_suit() {
        let two_spades: Card = "2s".parse().unwrap();
        let three_clubs: Card = "3c".parse().unwrap();
        let three_spades: Card = "3s".parse().unwrap();
        assert!(two_spades < three_clubs);
        assert!(three_clubs < three_spades);
    }

    #[test]
    fn test_index_matches_deck_order() {
        let deck = full_deck();
        assert_eq!(deck.len(), 52);
        for (i, card) in deck.iter().enumerate() {
            assert_eq!(card.index() as usize, i);
            assert_eq!(Card::from_index(i as u8).unwrap(), *card);
        }
        assert!(Card::from_index(52).is_err());
    }

    #[test]
    fn test_parse_board_and_duplicates() {
        let board = parse_cards("As Kd 7h").unwrap();
        assert_eq!(board.len(), 3);
        assert_eq!(board_to_string(&board), "AsKd7h");
        assert_eq!(parse_cards("AsKd7h").unwrap(), board);
        assert!(parse_cards("As As").is_err());
    }

    #[test]
    fn test_hand_parse_and_overlap() {
        let hand: Hand = "AsKh".parse().unwrap();
        let other: Hand = "KhQd".parse().unwrap();
        assert!(hand.overlaps(other));
        assert!(!hand.is_pair());
        assert!(!hand.is_suited());
        assert!("AsAs".parse::<Hand>().is_err());
        assert!("AsKhQd".parse::<Hand>().is_err());
    }

    #[test]
    fn test_all_hands_count() {
        let deck = remaining_deck(&parse_cards("2c 7d 9h Js Kc").unwrap());
        assert_eq!(deck.len(), 47);
        assert_eq!(all_hands(&deck).len(), 47 * 46 / 2);
    }
}

//! Game rules: state, actions, transitions and payoffs
//!
//! `GameState` is plain value data. Every transition returns a new state and
//! leaves the original untouched. Chip amounts carried by actions are always
//! the incremental chips added by that action, so `stack + invested` stays
//! constant for every player across a hand.

use crate::card::{board_to_string, Card, Hand};
use crate::error::{Result, SolverError};
use crate::evaluator::HandEvaluator;
use std::fmt;

/// Two raise amounts closer than this are the same action
pub const RAISE_TOLERANCE: f64 = 0.01;

/// Tolerance for comparing chip totals built from float arithmetic
const CHIP_EPSILON: f64 = 1e-9;

/// Betting round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Street {
    Preflop = 0,
    Flop = 1,
    Turn = 2,
    River = 3,
}

impl Street {
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Street implied by the number of board cards
    pub fn from_board_len(len: usize) -> Result<Street> {
        match len {
            0 => Ok(Street::Preflop),
            3 => Ok(Street::Flop),
            4 => Ok(Street::Turn),
            5 => Ok(Street::River),
            n => Err(SolverError::InvalidCard(format!("board of {n} cards"))),
        }
    }
}

impl TryFrom<u8> for Street {
    type Error = SolverError;

    fn try_from(value: u8) -> Result<Street> {
        match value {
            0 => Ok(Street::Preflop),
            1 => Ok(Street::Flop),
            2 => Ok(Street::Turn),
            3 => Ok(Street::River),
            n => Err(SolverError::Config(format!("unknown street {n}"))),
        }
    }
}

/// Player action. Chip amounts are incremental.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    Fold,
    Check,
    /// Call, carrying the chips owed
    Call(f64),
    /// Raise, carrying the chips added by this action
    Raise(f64),
}

impl Action {
    /// Chips this action puts into the pot
    pub fn amount(self) -> f64 {
        match self {
            Action::Fold | Action::Check => 0.0,
            Action::Call(amount) | Action::Raise(amount) => amount,
        }
    }

    /// Sort rank of the action type: fold, check, call, raise
    pub fn kind(self) -> u8 {
        match self {
            Action::Fold => 0,
            Action::Check => 1,
            Action::Call(_) => 2,
            Action::Raise(_) => 3,
        }
    }

    pub fn is_raise(self) -> bool {
        matches!(self, Action::Raise(_))
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Action::Raise(a), Action::Raise(b)) => (a - b).abs() < RAISE_TOLERANCE,
            _ => self.kind() == other.kind(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Fold => f.write_str("FOLD"),
            Action::Check => f.write_str("CHECK"),
            Action::Call(amount) => write!(f, "CALL {amount}"),
            Action::Raise(amount) => write!(f, "RAISE {amount}"),
        }
    }
}

/// Outcome of comparing hands at showdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Showdown {
    /// One player holds the strictly best hand
    Winner(usize),
    /// Several players share the best hand
    Split(Vec<usize>),
}

/// Complete public and private state of a hand in progress
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub board: Vec<Card>,
    pub hands: Vec<Option<Hand>>,
    pub stacks: Vec<f64>,
    /// Chips put in on the current street
    pub bets: Vec<f64>,
    pub pot: f64,
    pub current_player: usize,
    pub button: usize,
    pub num_players: usize,
    pub street: Street,
    pub folded: Vec<bool>,
    /// Chips put in over the whole hand
    pub invested: Vec<f64>,
    pub small_blind: f64,
    pub big_blind: f64,
    /// Raise sizes as fractions of the pot
    pub bet_sizes: Vec<f64>,
}

impl GameState {
    /// Empty preflop state with zero stacks, ready to be filled in
    pub fn new(num_players: usize) -> Self {
        GameState {
            board: Vec::new(),
            hands: vec![None; num_players],
            stacks: vec![0.0; num_players],
            bets: vec![0.0; num_players],
            pot: 0.0,
            current_player: 0,
            button: 0,
            num_players,
            street: Street::Preflop,
            folded: vec![false; num_players],
            invested: vec![0.0; num_players],
            small_blind: 0.5,
            big_blind: 1.0,
            bet_sizes: vec![0.33, 0.5, 0.75, 1.0],
        }
    }

    /// Largest current-street bet
    pub fn max_bet(&self) -> f64 {
        self.bets.iter().copied().fold(0.0, f64::max)
    }

    /// Chips the acting player owes to call
    pub fn call_amount(&self) -> f64 {
        (self.max_bet() - self.bets[self.current_player]).max(0.0)
    }

    /// Smallest stack among players still in the hand
    pub fn effective_stack(&self) -> f64 {
        (0..self.num_players)
            .filter(|&i| !self.folded[i])
            .map(|i| self.stacks[i])
            .fold(f64::INFINITY, f64::min)
    }

    /// Per-player `stack + invested`; constant across a hand
    pub fn chip_totals(&self) -> Vec<f64> {
        self.stacks
            .iter()
            .zip(&self.invested)
            .map(|(s, i)| s + i)
            .collect()
    }

    fn is_active(&self, player: usize) -> bool {
        !self.folded[player] && self.stacks[player] > 0.0
    }

    /// Legal actions for the acting player; empty once the hand is over
    pub fn legal_actions(&self) -> Vec<Action> {
        if self.is_terminal() {
            return Vec::new();
        }

        let player = self.current_player;
        let current_bet = self.max_bet();
        let player_bet = self.bets[player];
        let stack = self.stacks[player];
        let to_call = current_bet - player_bet;

        let mut actions = Vec::new();
        if to_call > CHIP_EPSILON {
            actions.push(Action::Fold);
            if to_call <= stack + CHIP_EPSILON {
                actions.push(Action::Call(to_call));
            }
        } else {
            actions.push(Action::Check);
        }

        let min_raise = 2.0 * current_bet - player_bet;
        if min_raise <= stack {
            for &fraction in &self.bet_sizes {
                let amount = self.pot * fraction;
                if amount > 0.0 && amount >= min_raise && amount <= stack {
                    actions.push(Action::Raise(amount));
                }
            }
            let all_in = Action::Raise(stack);
            if stack > min_raise && stack > 0.0 && !actions.contains(&all_in) {
                actions.push(all_in);
            }
        }

        actions
    }

    /// Successor state after the acting player takes `action`.
    ///
    /// A fold only marks the player folded; everything else passes the turn
    /// to the next seat.
    pub fn apply_action(&self, action: &Action) -> GameState {
        let mut next = self.clone();
        let player = self.current_player;

        match *action {
            Action::Fold => {
                next.folded[player] = true;
                return next;
            }
            Action::Check => {}
            Action::Call(amount) => {
                next.bets[player] = self.max_bet();
                next.stacks[player] -= amount;
                next.pot += amount;
                next.invested[player] += amount;
            }
            Action::Raise(amount) => {
                next.bets[player] += amount;
                next.stacks[player] -= amount;
                next.pot += amount;
                next.invested[player] += amount;
            }
        }

        next.current_player = (player + 1) % self.num_players;
        next
    }

    /// True when at most one player can still act, or the river betting has closed
    pub fn is_terminal(&self) -> bool {
        let active = (0..self.num_players).filter(|&i| self.is_active(i)).count();
        if active <= 1 {
            return true;
        }

        if self.street == Street::River {
            let max_bet = self.max_bet();
            return (0..self.num_players)
                .filter(|&i| self.is_active(i))
                .all(|i| self.bets[i] >= max_bet - CHIP_EPSILON);
        }

        false
    }

    /// Net chip result per player; all zeros for a non-terminal state
    pub fn payoffs(&self, evaluator: &dyn HandEvaluator) -> Result<Vec<f64>> {
        let mut payoffs = vec![0.0; self.num_players];
        if !self.is_terminal() {
            return Ok(payoffs);
        }

        let contenders: Vec<usize> = (0..self.num_players).filter(|&i| !self.folded[i]).collect();
        match contenders.as_slice() {
            [] => {}
            [only] => payoffs[*only] = self.pot,
            _ => match self.determine_winner(evaluator)? {
                Showdown::Winner(winner) => payoffs[winner] = self.pot,
                Showdown::Split(tied) => {
                    let share = self.pot / tied.len() as f64;
                    for player in tied {
                        payoffs[player] = share;
                    }
                }
            },
        }

        for (payoff, invested) in payoffs.iter_mut().zip(&self.invested) {
            *payoff -= invested;
        }
        Ok(payoffs)
    }

    /// Compare the hands of every player still in the hand
    pub fn determine_winner(&self, evaluator: &dyn HandEvaluator) -> Result<Showdown> {
        let mut best = None;
        let mut leaders: Vec<usize> = Vec::new();
        let mut cards = Vec::with_capacity(self.board.len() + 2);

        for player in (0..self.num_players).filter(|&i| !self.folded[i]) {
            let hand = self.hands[player].ok_or(SolverError::MissingHoleCards(player))?;
            cards.clear();
            cards.extend_from_slice(&hand.cards());
            cards.extend_from_slice(&self.board);
            let strength = evaluator.evaluate(&cards)?;

            match best {
                Some(top) if strength < top => {}
                Some(top) if strength == top => leaders.push(player),
                _ => {
                    best = Some(strength);
                    leaders.clear();
                    leaders.push(player);
                }
            }
        }

        match leaders.as_slice() {
            [winner] => Ok(Showdown::Winner(*winner)),
            _ => Ok(Showdown::Split(leaders)),
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "street {} | pot {} | board {} | to act {}",
            self.street.index(),
            self.pot,
            board_to_string(&self.board),
            self.current_player
        )?;
        for i in 0..self.num_players {
            let hand = self.hands[i].map(|h| h.to_string()).unwrap_or_else(|| "----".into());
            writeln!(
                f,
                "  p{i} {hand} stack {} bet {} invested {}{}",
                self.stacks[i],
                self.bets[i],
                self.invested[i],
                if self.folded[i] { " folded" } else { "" }
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::parse_cards;
    use crate::evaluator::MaskEvaluator;
    use crate::test_tree::{call_or_fold_root, raise_war_root};

    fn river(hands: [&str; 2]) -> GameState {
        let mut state = GameState::new(2);
        state.street = Street::River;
        state.board = parse_cards("2c 7d 9h Js Kc").unwrap();
        state.hands = vec![Some(hands[0].parse().unwrap()), Some(hands[1].parse().unwrap())];
        state
    }

    fn assert_conserves_chips(state: &GameState) {
        let before = state.chip_totals();
        for action in state.legal_actions() {
            let after = state.apply_action(&action).chip_totals();
            for (b, a) in before.iter().zip(&after) {
                assert!((b - a).abs() < 1e-9, "{action} broke chip conservation");
            }
        }
    }

    #[test]
    fn test_raise_equality_tolerance() {
        assert_eq!(Action::Raise(10.0), Action::Raise(10.005));
        assert_ne!(Action::Raise(10.0), Action::Raise(10.02));
        assert_eq!(Action::Call(1.0), Action::Call(2.0));
        assert_ne!(Action::Check, Action::Fold);
    }

    #[test]
    fn test_facing_bet_actions() {
        let root = raise_war_root();
        let actions = root.legal_actions();
        // pot 10, facing 5 with 50 behind: min raise 10
        assert_eq!(
            actions,
            vec![Action::Fold, Action::Call(5.0), Action::Raise(10.0), Action::Raise(50.0)]
        );
        assert!((actions[1].amount() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_short_stack_cannot_raise() {
        let root = call_or_fold_root();
        assert_eq!(root.legal_actions(), vec![Action::Fold, Action::Call(5.0)]);
    }

    #[test]
    fn test_unopened_actions_include_check() {
        let mut state = GameState::new(2);
        state.street = Street::Flop;
        state.stacks = vec![100.0, 100.0];
        state.pot = 10.0;
        let actions = state.legal_actions();
        assert_eq!(actions[0], Action::Check);
        assert!(!actions.contains(&Action::Fold));
        assert!(actions.contains(&Action::Raise(3.3)));
        assert!(actions.contains(&Action::Raise(100.0)));
    }

    #[test]
    fn test_chip_conservation_for_every_action() {
        assert_conserves_chips(&raise_war_root());
        assert_conserves_chips(&call_or_fold_root());

        let root = raise_war_root();
        for action in root.legal_actions() {
            let child = root.apply_action(&action);
            assert_conserves_chips(&child);
            for grand in child.legal_actions() {
                assert_conserves_chips(&child.apply_action(&grand));
            }
        }
    }

    #[test]
    fn test_fold_does_not_advance_turn() {
        let root = raise_war_root();
        let folded = root.apply_action(&Action::Fold);
        assert!(folded.folded[0]);
        assert_eq!(folded.current_player, 0);
        assert!(folded.is_terminal());
        assert!(folded.legal_actions().is_empty());
    }

    #[test]
    fn test_call_closes_river() {
        let root = raise_war_root();
        let called = root.apply_action(&Action::Call(5.0));
        assert_eq!(called.current_player, 1);
        assert!((called.bets[0] - 5.0).abs() < 1e-10);
        assert!((called.pot - 15.0).abs() < 1e-10);
        assert!(called.is_terminal());
    }

    #[test]
    fn test_raise_reopens_action() {
        let root = raise_war_root();
        let raised = root.apply_action(&Action::Raise(10.0));
        assert!(!raised.is_terminal());
        assert_eq!(raised.current_player, 1);
        assert!((raised.bets[0] - 10.0).abs() < 1e-10);
        assert!((raised.call_amount() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_non_river_equal_bets_not_terminal() {
        let mut state = GameState::new(2);
        state.street = Street::Turn;
        state.stacks = vec![50.0, 50.0];
        assert!(!state.is_terminal());
        state.street = Street::River;
        assert!(state.is_terminal());
    }

    #[test]
    fn test_fold_payoffs() {
        let root = raise_war_root();
        let eval = MaskEvaluator::new();
        let payoffs = root.apply_action(&Action::Fold).payoffs(&eval).unwrap();
        assert!((payoffs[0] + 2.5).abs() < 1e-10);
        assert!((payoffs[1] - 2.5).abs() < 1e-10);
        assert!((payoffs.iter().sum::<f64>()).abs() < 1e-10);
    }

    #[test]
    fn test_showdown_winner_and_split() {
        let eval = MaskEvaluator::new();
        let mut state = river(["KhKd", "3c4d"]);
        state.stacks = vec![90.0, 90.0];
        state.invested = vec![10.0, 10.0];
        state.pot = 20.0;
        assert_eq!(state.determine_winner(&eval).unwrap(), Showdown::Winner(0));
        let payoffs = state.payoffs(&eval).unwrap();
        assert!((payoffs[0] - 10.0).abs() < 1e-10);
        assert!((payoffs[1] + 10.0).abs() < 1e-10);

        // Both play the board's straight
        let mut split = river(["2d 3h", "2h 4s"]);
        split.board = parse_cards("8c 9d Th Js Qc").unwrap();
        split.stacks = vec![90.0, 90.0];
        split.invested = vec![10.0, 10.0];
        split.pot = 20.0;
        assert_eq!(split.determine_winner(&eval).unwrap(), Showdown::Split(vec![0, 1]));
        let payoffs = split.payoffs(&eval).unwrap();
        assert!(payoffs.iter().all(|p| p.abs() < 1e-10));
    }

    #[test]
    fn test_showdown_requires_hole_cards() {
        let eval = MaskEvaluator::new();
        let mut state = river(["KhKd", "3c4d"]);
        state.stacks = vec![90.0, 90.0];
        state.hands[1] = None;
        assert!(matches!(
            state.payoffs(&eval),
            Err(SolverError::MissingHoleCards(1))
        ));
    }

    #[test]
    fn test_non_terminal_payoffs_are_zero() {
        let eval = MaskEvaluator::new();
        let payoffs = raise_war_root().payoffs(&eval).unwrap();
        assert_eq!(payoffs, vec![0.0, 0.0]);
    }

    #[test]
    fn test_effective_stack_ignores_folded() {
        let mut state = raise_war_root();
        assert!((state.effective_stack() - 50.0).abs() < 1e-10);
        state.folded[0] = true;
        assert!((state.effective_stack() - 92.5).abs() < 1e-10);
    }
}

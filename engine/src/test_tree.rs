//! Fixed heads-up river spots for tests and benchmarks
//!
//! All spots share the board `2c 7d 9h Js Kc`. Seat 0 holds `AhAd` and seat 1
//! holds `3s4h`, so seat 0 wins every showdown in the supplied scenario.
//!
//! Spots:
//!   call_or_fold_root   seat 0 faces a 5 chip bet into 10 with exactly 5 behind
//!                       [Fold, Call(5)], both children terminal
//!   raise_war_root      same bet with 50 behind, raises allowed on both sides
//!   closed_river_root   pot 1.5 after blinds, betting closed, already terminal

use crate::card::parse_cards;
use crate::game::{GameState, Street};

pub const BOARD: &str = "2c 7d 9h Js Kc";
pub const HERO: &str = "AhAd";
pub const VILLAIN: &str = "3s4h";

fn heads_up_river() -> GameState {
    let mut state = GameState::new(2);
    state.street = Street::River;
    state.button = 1;
    state.board = parse_cards(BOARD).expect("fixture board");
    state.hands = vec![
        Some(HERO.parse().expect("fixture hand")),
        Some(VILLAIN.parse().expect("fixture hand")),
    ];
    state
}

/// Seat 0 faces a bet and can only call all-in or fold
pub fn call_or_fold_root() -> GameState {
    let mut state = heads_up_river();
    state.pot = 10.0;
    state.invested = vec![2.5, 7.5];
    state.bets = vec![0.0, 5.0];
    state.stacks = vec![5.0, 92.5];
    state
}

/// Seat 0 faces a bet with room for raises and re-raises
pub fn raise_war_root() -> GameState {
    let mut state = call_or_fold_root();
    state.stacks = vec![50.0, 92.5];
    state
}

/// Blinds posted, river reached, nothing left to decide
pub fn closed_river_root() -> GameState {
    let mut state = heads_up_river();
    state.pot = 1.5;
    state.stacks = vec![99.5, 99.0];
    state.invested = vec![0.5, 1.0];
    state.bets = vec![0.0, 0.0];
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_conserve_starting_stacks() {
        for (root, total) in [
            (call_or_fold_root(), [7.5, 100.0]),
            (raise_war_root(), [52.5, 100.0]),
            (closed_river_root(), [100.0, 100.0]),
        ] {
            let totals = root.chip_totals();
            assert!((totals[0] - total[0]).abs() < 1e-10);
            assert!((totals[1] - total[1]).abs() < 1e-10);
            let invested: f64 = root.invested.iter().sum();
            assert!((invested - root.pot).abs() < 1e-10);
        }
    }

    #[test]
    fn test_fixture_terminality() {
        assert!(!call_or_fold_root().is_terminal());
        assert!(!raise_war_root().is_terminal());
        assert!(closed_river_root().is_terminal());
    }

    #[test]
    fn test_fixture_cards_are_disjoint() {
        let root = raise_war_root();
        let board = &root.board;
        for hand in root.hands.iter().flatten() {
            assert!(!board.iter().any(|&c| hand.contains(c)));
        }
        let (a, b) = (root.hands[0].unwrap(), root.hands[1].unwrap());
        assert!(!a.overlaps(b));
    }
}

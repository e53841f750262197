//! gto Tree Builder - Root states and tree measurement
//!
//! This crate turns a serde game configuration into the root `GameState` a
//! solver starts from, and walks the abstracted tree below a root to report
//! its size before committing to a solve.

use gto_engine::abstraction::GameAbstraction;
use gto_engine::card::{parse_cards, Card, Hand};
use gto_engine::config::CfrConfig;
use gto_engine::error::{Result, SolverError};
use gto_engine::game::{GameState, Street};
use log::debug;
use serde::{Deserialize, Serialize};

/// Table and spot description.
///
/// Seat 0 posts the small blind and seat 1 the big blind. Missing fields keep
/// their defaults, so `{}` is a heads-up preflop game with 100 chip stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub num_players: usize,
    pub small_blind: f64,
    pub big_blind: f64,
    #[serde(alias = "stack_size")]
    pub starting_stack: f64,
    /// Raise sizes as fractions of the pot
    #[serde(alias = "allowed_bet_sizes")]
    pub bet_sizes: Vec<f64>,
    pub button: usize,
    pub current_player: usize,
    /// Board text such as `"2c 7d 9h Js Kc"`; empty for preflop
    pub board: String,
    /// Hole cards per seat; empty strings leave a seat undealt
    pub hands: Vec<String>,
    /// Street index 0..=3; inferred from the board when absent
    pub street: Option<u8>,
    /// Chips already bet on the current street, per seat. Not allowed preflop,
    /// where the blinds are the bets.
    pub bets: Option<Vec<f64>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            num_players: 2,
            small_blind: 0.5,
            big_blind: 1.0,
            starting_stack: 100.0,
            bet_sizes: vec![0.33, 0.5, 0.75, 1.0],
            button: 1,
            current_player: 0,
            board: String::new(),
            hands: Vec::new(),
            street: None,
            bets: None,
        }
    }
}

/// Contents of a `--params-file`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamsFile {
    pub solver_config: CfrConfig,
    pub game_config: GameConfig,
}

/// Build the root state described by `config`, blinds posted.
pub fn build_root(config: &GameConfig) -> Result<GameState> {
    let n = config.num_players;
    if n < 2 {
        return Err(SolverError::Config(format!("need at least 2 players, got {n}")));
    }
    if config.button >= n || config.current_player >= n {
        return Err(SolverError::Config(format!(
            "button {} and current player {} must be below {n}",
            config.button, config.current_player
        )));
    }
    if !(config.small_blind >= 0.0 && config.big_blind >= config.small_blind) {
        return Err(SolverError::Config(format!(
            "blinds {}/{} are not ordered",
            config.small_blind, config.big_blind
        )));
    }
    if !(config.starting_stack >= config.big_blind) {
        return Err(SolverError::Config(format!(
            "stack {} cannot cover the big blind",
            config.starting_stack
        )));
    }

    let board = parse_cards(&config.board)?;
    let street = resolve_street(config.street, board.len())?;
    let hands = parse_hands(&config.hands, n, &board)?;

    let mut state = GameState::new(n);
    state.board = board;
    state.hands = hands;
    state.street = street;
    state.button = config.button;
    state.current_player = config.current_player;
    state.small_blind = config.small_blind;
    state.big_blind = config.big_blind;
    state.bet_sizes = config.bet_sizes.clone();
    state.stacks = vec![config.starting_stack; n];

    post(&mut state, 0, config.small_blind);
    post(&mut state, 1, config.big_blind);

    if street == Street::Preflop {
        if config.bets.is_some() {
            return Err(SolverError::Config("preflop bets are the blinds".into()));
        }
        state.bets[0] = config.small_blind;
        state.bets[1] = config.big_blind;
    } else if let Some(bets) = &config.bets {
        if bets.len() != n {
            return Err(SolverError::Config(format!("{} bets for {n} players", bets.len())));
        }
        for (seat, &bet) in bets.iter().enumerate() {
            if !(bet >= 0.0 && bet <= state.stacks[seat]) {
                return Err(SolverError::Config(format!(
                    "seat {seat} cannot bet {bet} from a stack of {}",
                    state.stacks[seat]
                )));
            }
            post(&mut state, seat, bet);
            state.bets[seat] = bet;
        }
    }

    debug!("built root: {}", state.to_string().trim_end());
    Ok(state)
}

fn post(state: &mut GameState, seat: usize, chips: f64) {
    state.stacks[seat] -= chips;
    state.invested[seat] += chips;
    state.pot += chips;
}

fn resolve_street(explicit: Option<u8>, board_len: usize) -> Result<Street> {
    let implied = Street::from_board_len(board_len)?;
    match explicit {
        None => Ok(implied),
        Some(index) => {
            let street = Street::try_from(index)?;
            if street != implied {
                return Err(SolverError::Config(format!(
                    "street {index} does not match a board of {board_len} cards"
                )));
            }
            Ok(street)
        }
    }
}

fn parse_hands(texts: &[String], n: usize, board: &[Card]) -> Result<Vec<Option<Hand>>> {
    if texts.is_empty() {
        return Ok(vec![None; n]);
    }
    if texts.len() != n {
        return Err(SolverError::Config(format!("{} hands for {n} players", texts.len())));
    }

    let mut seen: Vec<Card> = board.to_vec();
    let mut hands = Vec::with_capacity(n);
    for text in texts {
        if text.trim().is_empty() {
            hands.push(None);
            continue;
        }
        let hand: Hand = text.parse()?;
        for card in hand.cards() {
            if seen.contains(&card) {
                return Err(SolverError::InvalidHand(format!("{card} is dealt twice")));
            }
            seen.push(card);
        }
        hands.push(Some(hand));
    }
    Ok(hands)
}

/// Size of the abstracted tree below a root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub nodes: usize,
    pub decisions: usize,
    pub terminals: usize,
    pub max_depth: usize,
}

/// Walk every abstracted action sequence from `root` and count what is reached.
///
/// Only heads-up river roots are accepted: earlier betting rounds never
/// close, and a fold at a wider table leaves the folded seat to act.
pub fn measure(root: &GameState, abstraction: &dyn GameAbstraction) -> Result<TreeStats> {
    if root.num_players != 2 {
        return Err(SolverError::UnsupportedRoot(format!(
            "cannot walk a tree with {} players",
            root.num_players
        )));
    }
    if root.street != Street::River {
        return Err(SolverError::UnsupportedRoot(format!(
            "cannot walk a tree rooted on street {}",
            root.street.index()
        )));
    }
    let mut stats = TreeStats::default();
    walk(root, abstraction, 0, &mut stats);
    debug!(
        "tree: {} nodes, {} decisions, {} terminals, depth {}",
        stats.nodes, stats.decisions, stats.terminals, stats.max_depth
    );
    Ok(stats)
}

fn walk(state: &GameState, abstraction: &dyn GameAbstraction, depth: usize, stats: &mut TreeStats) {
    stats.nodes += 1;
    stats.max_depth = stats.max_depth.max(depth);

    let actions = if state.is_terminal() {
        Vec::new()
    } else {
        abstraction.abstracted_actions(state)
    };
    if actions.is_empty() {
        stats.terminals += 1;
        return;
    }

    stats.decisions += 1;
    for action in &actions {
        walk(&state.apply_action(action), abstraction, depth + 1, stats);
    }
}

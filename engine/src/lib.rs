//! gto Engine - No-limit hold'em rules, abstraction and CFR solvers
//!
//! This crate contains the card model and hand evaluator, the betting state
//! machine, the card and action abstraction, the information-set node table,
//! the CFR solver family (vanilla, external-sampling MCCFR and CFR+) with
//! exploitability measurement, and the binary checkpoint format.
//!
//! The engine is platform-agnostic and has zero UI dependencies.

pub mod abstraction;
pub mod card;
pub mod cfr;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod exploitability;
pub mod game;
pub mod node;
pub mod test_tree;

pub use abstraction::{BasicAbstraction, GameAbstraction};
pub use card::{Card, Hand};
pub use cfr::{create_solver, CfrPlus, ExternalSamplingCfr, Solver, SolverCore, SolverKind, VanillaCfr};
pub use config::{CfrConfig, CfrResult};
pub use error::{CheckpointError, Result, SolverError};
pub use evaluator::{HandEvaluator, HandStrength, MaskEvaluator};
pub use game::{Action, GameState, Showdown, Street};
pub use node::{InfoSetNode, InformationSetKey, KeyStrategy, NodeTable, PublicKey};

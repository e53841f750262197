//! Solver configuration and result records

use crate::error::{Result, SolverError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Solver settings, fixed for the duration of a solve.
///
/// Missing fields in a serialized config keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfrConfig {
    pub max_iterations: u64,
    pub target_exploitability: f64,
    /// Prefer the sampling solver when no solver is named explicitly
    pub use_chance_sampling: bool,
    pub use_discounting: bool,
    /// Regret discount exponent: deltas are scaled by `iteration^(-alpha)`
    pub alpha: f64,
    /// Accepted for configuration compatibility; no update reads it
    pub beta: f64,
    /// Write a checkpoint every this many iterations; 0 disables
    pub checkpoint_frequency: u64,
    pub checkpoint_dir: PathBuf,
    /// Seed for the sampling solver; drawn from entropy when absent
    pub seed: Option<u64>,
}

impl Default for CfrConfig {
    fn default() -> Self {
        CfrConfig {
            max_iterations: 1000,
            target_exploitability: 0.005,
            use_chance_sampling: true,
            use_discounting: true,
            alpha: 1.5,
            beta: 0.0,
            checkpoint_frequency: 100,
            checkpoint_dir: PathBuf::from("."),
            seed: None,
        }
    }
}

impl CfrConfig {
    /// Reject settings no solve can run with
    pub fn validate(&self) -> Result<()> {
        if !(self.target_exploitability > 0.0 && self.target_exploitability <= 1.0) {
            return Err(SolverError::Config(format!(
                "target_exploitability must be in (0, 1], got {}",
                self.target_exploitability
            )));
        }
        if !(self.alpha >= 0.0) {
            return Err(SolverError::Config(format!("alpha must be >= 0, got {}", self.alpha)));
        }
        Ok(())
    }

    /// Path of the periodic checkpoint for `iteration`
    pub fn checkpoint_path(&self, iteration: u64) -> PathBuf {
        self.checkpoint_dir.join(format!("checkpoint_{iteration}.bin"))
    }
}

/// Outcome of a solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfrResult {
    pub iterations_completed: u64,
    pub final_exploitability: f64,
    pub convergence_time_seconds: f64,
    pub converged: bool,
    pub status_message: String,
}

impl fmt::Display for CfrResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CFR Result:")?;
        writeln!(f, "  Iterations: {}", self.iterations_completed)?;
        writeln!(f, "  Final Exploitability: {}", self.final_exploitability)?;
        writeln!(f, "  Convergence Time: {:.3}s", self.convergence_time_seconds)?;
        writeln!(f, "  Converged: {}", if self.converged { "Yes" } else { "No" })?;
        write!(f, "  Status: {}", self.status_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CfrConfig::default();
        assert_eq!(config.max_iterations, 1000);
        assert!((config.target_exploitability - 0.005).abs() < 1e-12);
        assert!(config.use_chance_sampling);
        assert!(config.use_discounting);
        assert!((config.alpha - 1.5).abs() < 1e-12);
        assert!(config.beta.abs() < 1e-12);
        assert_eq!(config.checkpoint_frequency, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: CfrConfig =
            serde_json::from_str(r#"{"max_iterations": 250, "use_discounting": false}"#).unwrap();
        assert_eq!(config.max_iterations, 250);
        assert!(!config.use_discounting);
        assert_eq!(config.checkpoint_frequency, 100);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_validate_rejects_bad_target() {
        for target in [0.0, -0.1, 1.5, f64::NAN] {
            let config = CfrConfig {
                target_exploitability: target,
                ..CfrConfig::default()
            };
            assert!(config.validate().is_err(), "target {target} should be rejected");
        }
        let edge = CfrConfig {
            target_exploitability: 1.0,
            ..CfrConfig::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_checkpoint_path() {
        let config = CfrConfig {
            checkpoint_dir: PathBuf::from("/tmp/run"),
            ..CfrConfig::default()
        };
        assert_eq!(config.checkpoint_path(300), PathBuf::from("/tmp/run/checkpoint_300.bin"));
    }
}

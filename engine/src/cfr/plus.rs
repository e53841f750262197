//! CFR+: full traversal with cumulative regrets floored at zero

use super::vanilla::traverse;
use super::{RegretRule, Solver, SolverCore, SolverKind};
use crate::error::Result;
use crate::game::GameState;

/// CFR+ solver.
///
/// Shares the vanilla traversal; only the regret update differs. Regret
/// matching over floored regrets is the same as over raw ones, since negative
/// values never survive an update.
pub struct CfrPlus {
    core: SolverCore,
}

impl CfrPlus {
    pub fn new(core: SolverCore) -> Self {
        CfrPlus { core }
    }
}

impl Solver for CfrPlus {
    fn kind(&self) -> SolverKind {
        SolverKind::CfrPlus
    }

    fn core(&self) -> &SolverCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SolverCore {
        &mut self.core
    }

    fn run_iteration(&mut self, root: &GameState) -> Result<()> {
        self.validate_root(root)?;
        self.core.iteration += 1;
        let reach = vec![1.0; root.num_players];
        traverse(&mut self.core, root, &reach, RegretRule::FloorAtZero)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::tests::{core, quiet_config};
    use crate::test_tree::{call_or_fold_root, raise_war_root};

    #[test]
    fn test_cumulative_regret_never_negative() {
        let mut solver = CfrPlus::new(core(quiet_config(300)));
        let root = raise_war_root();
        for iteration in 1..=300 {
            solver.run_iteration(&root).unwrap();
            for (key, node) in solver.table().iter() {
                assert!(
                    node.regret_sum().iter().all(|&r| r >= 0.0),
                    "negative regret at {key} after iteration {iteration}"
                );
            }
        }
    }

    #[test]
    fn test_first_iteration_floors_fold_regret() {
        let mut solver = CfrPlus::new(core(quiet_config(1)));
        solver.run_iteration(&call_or_fold_root()).unwrap();
        let node = solver.table().iter().next().unwrap().1;
        assert_eq!(node.regret_sum(), &[0.0, 5.0]);
    }

    #[test]
    fn test_ignores_discounting() {
        let mut solver = CfrPlus::new(core(quiet_config(3)));
        let root = call_or_fold_root();
        for _ in 0..3 {
            solver.run_iteration(&root).unwrap();
        }
        // Pure call from iteration 2 on adds zero regret to call
        let node = solver.table().iter().next().unwrap().1;
        assert!((node.regret_sum()[1] - 5.0).abs() < 1e-10);
        assert!(node.regret_sum()[0].abs() < 1e-10);
    }

    #[test]
    fn test_exploitability_drops_after_training() {
        let root = call_or_fold_root();
        let uniform = CfrPlus::new(core(quiet_config(100))).exploitability(&root).unwrap();
        let mut solver = CfrPlus::new(core(quiet_config(100)));
        let result = solver.solve(&root).unwrap();
        assert!(uniform > result.final_exploitability);
    }
}

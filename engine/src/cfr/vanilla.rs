//! Vanilla CFR: full traversal of every action for one fixed deal

use super::{RegretRule, Solver, SolverCore, SolverKind};
use crate::error::Result;
use crate::game::GameState;

/// Full-traversal CFR with optional regret discounting
pub struct VanillaCfr {
    core: SolverCore,
}

impl VanillaCfr {
    pub fn new(core: SolverCore) -> Self {
        VanillaCfr { core }
    }
}

impl Solver for VanillaCfr {
    fn kind(&self) -> SolverKind {
        SolverKind::Vanilla
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
        let rule = RegretRule::Accumulate {
            scale: self.core.discount(self.core.iteration),
        };
        let reach = vec![1.0; root.num_players];
        traverse(&mut self.core, root, &reach, rule)?;
        Ok(())
    }
}

/// Recursive CFR pass returning each seat's expected value at `state`.
///
/// At every decision node the acting player's regret for action `a` is
/// `v(a) - v(node)`, folded in with `rule`, and the strategy sum grows by the
/// acting player's reach times the current strategy.
pub(crate) fn traverse(
    core: &mut SolverCore,
    state: &GameState,
    reach: &[f64],
    rule: RegretRule,
) -> Result<Vec<f64>> {
    if state.is_terminal() {
        return state.payoffs(core.evaluator.as_ref());
    }

    let player = state.current_player;
    let actions = core.abstraction.abstracted_actions(state);
    if actions.is_empty() {
        return Ok(vec![0.0; state.num_players]);
    }

    let slot = core.node_slot(state, player, &actions);
    let strategy = core.table.node(slot).strategy();

    let mut node_values = vec![0.0; state.num_players];
    let mut action_values = vec![0.0; actions.len()];
    for (i, action) in actions.iter().enumerate() {
        let next = state.apply_action(action);
        let mut next_reach = reach.to_vec();
        next_reach[player] *= strategy[i];

        let values = traverse(core, &next, &next_reach, rule)?;
        action_values[i] = values[player];
        for (v, child) in node_values.iter_mut().zip(&values) {
            *v += strategy[i] * child;
        }
    }

    let regrets: Vec<f64> = action_values
        .iter()
        .map(|v| v - node_values[player])
        .collect();
    let weighted: Vec<f64> = strategy.iter().map(|p| reach[player] * p).collect();

    let node = core.table.node_mut(slot);
    rule.apply(node, &regrets);
    node.update_strategy_sum(&weighted);

    Ok(node_values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::tests::{core, quiet_config};
    use crate::config::CfrConfig;
    use crate::game::Action;
    use crate::test_tree::{call_or_fold_root, raise_war_root};

    #[test]
    fn test_first_iteration_regrets() {
        let mut solver = VanillaCfr::new(core(quiet_config(1)));
        let root = call_or_fold_root();
        solver.run_iteration(&root).unwrap();

        // Fold -2.5, call +7.5 (seat 0 wins), uniform node value +2.5
        let node = solver.table().iter().next().unwrap().1;
        assert_eq!(node.actions(), &[Action::Fold, Action::Call(5.0)]);
        assert!((node.regret_sum()[0] + 5.0).abs() < 1e-10);
        assert!((node.regret_sum()[1] - 5.0).abs() < 1e-10);
        assert!((node.strategy_sum()[0] - 0.5).abs() < 1e-10);
        assert!((node.strategy_sum()[1] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_discounting_scales_regret_delta() {
        let config = CfrConfig {
            use_discounting: true,
            alpha: 1.0,
            ..quiet_config(2)
        };
        let mut solver = VanillaCfr::new(core(config));
        let root = call_or_fold_root();
        solver.run_iteration(&root).unwrap();
        solver.run_iteration(&root).unwrap();

        // Iteration 2 plays pure call: regret deltas (-10, 0) scaled by 1/2
        let node = solver.table().iter().next().unwrap().1;
        assert!((node.regret_sum()[0] - (-5.0 - 5.0)).abs() < 1e-10);
        assert!((node.regret_sum()[1] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_no_discount_when_disabled() {
        let config = CfrConfig {
            use_discounting: false,
            ..quiet_config(2)
        };
        let mut solver = VanillaCfr::new(core(config));
        let root = call_or_fold_root();
        solver.run_iteration(&root).unwrap();
        solver.run_iteration(&root).unwrap();
        let node = solver.table().iter().next().unwrap().1;
        assert!((node.regret_sum()[0] + 15.0).abs() < 1e-10);
    }

    #[test]
    fn test_learns_to_call_with_the_winner() {
        let mut solver = VanillaCfr::new(core(quiet_config(200)));
        let root = call_or_fold_root();
        for _ in 0..200 {
            solver.run_iteration(&root).unwrap();
        }
        let strategy = solver.strategy(&root, 0);
        assert!(strategy[1] > 0.99, "call weight {}", strategy[1]);
    }

    #[test]
    fn test_regrets_can_go_negative() {
        let mut solver = VanillaCfr::new(core(quiet_config(50)));
        let root = raise_war_root();
        for _ in 0..50 {
            solver.run_iteration(&root).unwrap();
        }
        let any_negative = solver
            .table()
            .iter()
            .any(|(_, n)| n.regret_sum().iter().any(|&r| r < 0.0));
        assert!(any_negative);
    }

    #[test]
    fn test_exploitability_drops_after_training() {
        let root = call_or_fold_root();
        let untrained = VanillaCfr::new(core(quiet_config(500)));
        let uniform = untrained.exploitability(&root).unwrap();

        let mut solver = VanillaCfr::new(core(quiet_config(500)));
        let result = solver.solve(&root).unwrap();
        assert_eq!(result.iterations_completed, 500);
        assert!(
            uniform > result.final_exploitability,
            "uniform {uniform} vs trained {}",
            result.final_exploitability
        );
    }
}

/// Crate `validator` independently replays a counterexample trace against
/// the transition system, without trusting the search that produced it —
/// the same spirit as the teacher's `ValidatorIF::validate` scanning every
/// clause against a loaded assignment rather than asking the solver that
/// found it.
use crate::error::CarResult;
use crate::literal::Cube;
use crate::sat::{IncrementalSolver, SatAbstraction, SatKind, SatOutcome};
use crate::transition::TransitionSystem;

/// Re-derives, one step at a time, whether a claimed counterexample trace
/// is a genuine run of `system`: initial latches satisfying `init`, each
/// step's `(latches, input)` satisfying `T` with the next latch cube the
/// transition relation actually forces, and the final latches satisfying
/// `bad`.
pub fn replay(
    system: &dyn TransitionSystem,
    init_latches: &Cube,
    input_trace: &[Cube],
) -> CarResult<bool> {
    if !cube_implies(init_latches, system.initial_cube()) {
        return Ok(false);
    }

    let mut current = init_latches.clone();
    for inputs in input_trace {
        let mut solver = IncrementalSolver::new();
        for clause in system.transition_clauses() {
            solver.add_clause(clause);
        }
        solver.clear_assumptions();
        for &lit in current.iter() {
            solver.assume(lit);
        }
        for &lit in inputs.iter() {
            solver.assume(lit);
        }
        match solver.solve(SatKind::Invariant)? {
            SatOutcome::Unsatisfiable => return Ok(false),
            SatOutcome::Satisfiable => {}
        }
        let model = solver.model();
        let part = system.partition();
        let next_latches: Vec<_> = model
            .iter()
            .copied()
            .filter_map(|lit| {
                let candidate = part.unprime(lit);
                let cv = candidate.unsigned_abs();
                if part.is_latch(cv) && part.prime(candidate) == lit {
                    Some(candidate)
                } else {
                    None
                }
            })
            .collect();
        current = Cube::new(next_latches);
    }

    Ok(cube_implies(&current, system.bad_cube()))
}

/// True if every literal of `target` also appears in `candidate` — the
/// replayed state is at least as specific as the predicate it must
/// satisfy.
fn cube_implies(candidate: &Cube, target: &Cube) -> bool {
    target.iter().all(|lit| candidate.0.contains(lit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::{Clause, VarPartition};
    use crate::transition::InMemoryTransitionSystem;

    /// 1 input, 1 latch: `l' = i`, init `-l`, bad `+l`. Variable 1 is the
    /// input, 2 the latch, 4 its primed counterpart (`VarPartition::prime`
    /// with one input and one latch maps 2 to 2 + (1+1) = 4).
    fn two_step_system() -> InMemoryTransitionSystem {
        let part = VarPartition::new(1, 1);
        let clauses = vec![
            Clause::new(vec![-4, 1]), // l' -> i
            Clause::new(vec![4, -1]), // i -> l'
        ];
        InMemoryTransitionSystem::new(part, clauses, Cube::new(vec![-2]), Cube::new(vec![2]))
    }

    #[test]
    fn accepts_a_genuine_counterexample() {
        let sys = two_step_system();
        let ok = replay(&sys, &Cube::new(vec![-2]), &[Cube::new(vec![1])]).unwrap();
        assert!(ok);
    }

    #[test]
    fn rejects_a_trace_whose_input_does_not_reach_bad() {
        let sys = two_step_system();
        let ok = replay(&sys, &Cube::new(vec![-2]), &[Cube::new(vec![-1])]).unwrap();
        assert!(!ok);
    }

    #[test]
    fn rejects_a_trace_whose_start_is_not_initial() {
        let sys = two_step_system();
        let ok = replay(&sys, &Cube::new(vec![2]), &[]).unwrap();
        assert!(!ok);
    }
}

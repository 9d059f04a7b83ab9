//! Minimal-unsat-core extraction by recursive halving.
//!
//! Grounded on `carsolver.cpp::get_mus`/`SAT`/`remove_from`: a worklist of
//! not-yet-minimised segments, repeatedly split in half and re-checked,
//! until every segment still in the worklist is a single literal that
//! cannot be dropped.
//!
//! The original source also carries a commented-out alternative: drop one
//! literal at a time from the core, re-solving after each drop, keeping the
//! literal only if its removal flips the result back to SAT. That algorithm
//! is also a valid single-literal-drop-minimal MUC but is not guaranteed to
//! produce the same core as halving on every input (§9 Open Question) — we
//! implement halving only and do not compare the two.
use super::{SatAbstraction, SatKind};
use crate::error::CarResult;
use crate::literal::Literal;

/// Returns a subset of `core` that remains UNSAT under the same assumption
/// context and is minimal under single-literal removal (§4.5, invariant 5
/// of §8).
pub fn minimise<S: SatAbstraction + ?Sized>(
    solver: &mut S,
    kind: SatKind,
    core: Vec<Literal>,
) -> CarResult<Vec<Literal>> {
    if core.len() <= 1 {
        return Ok(core);
    }
    let mut worklist: Vec<Vec<Literal>> = vec![core];
    let mut result: Vec<Literal> = Vec::new();

    while let Some(segment) = worklist.pop() {
        if segment.len() == 1 {
            result.push(segment[0]);
            continue;
        }
        let mid = segment.len() / 2;
        let (first_half, second_half) = segment.split_at(mid);
        let first_half = first_half.to_vec();
        let second_half = second_half.to_vec();

        if !solve_with(solver, kind, &first_half, &worklist)? {
            let reason = solver.core();
            worklist.push(first_half);
            retain_literals(&mut worklist, &reason);
        } else if !solve_with(solver, kind, &second_half, &worklist)? {
            let reason = solver.core();
            worklist.push(second_half);
            retain_literals(&mut worklist, &reason);
        } else {
            worklist.push(first_half);
            worklist.push(second_half);
        }
    }

    Ok(result)
}

/// Assumes `segment` plus every other worklist entry, and solves. Returns
/// `true` on SAT (the candidate piece, together with the rest of the
/// worklist, is too weak to reproduce UNSAT on its own).
fn solve_with<S: SatAbstraction + ?Sized>(
    solver: &mut S,
    kind: SatKind,
    segment: &[Literal],
    rest: &[Vec<Literal>],
) -> CarResult<bool> {
    solver.clear_assumptions();
    for &lit in segment {
        solver.assume(lit);
    }
    for other in rest {
        for &lit in other {
            solver.assume(lit);
        }
    }
    Ok(solver.solve(kind)? == super::SatOutcome::Satisfiable)
}

/// Drops, from every worklist segment, any literal not present in `reason`
/// (`carsolver.cpp::remove_from`): once a smaller reason is known, segments
/// mentioning literals outside it are provably not needed either.
fn retain_literals(worklist: &mut [Vec<Literal>], reason: &[Literal]) {
    for segment in worklist.iter_mut() {
        segment.retain(|lit| reason.contains(lit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::solver::IncrementalSolver;

    /// Builds an UNSAT instance where assumptions are `{a, b, c, d}` but
    /// only `{b, d}` is actually needed: the clauses `(-b or -d)` forces a
    /// conflict whenever both are assumed, while `a` and `c` are free.
    #[test]
    fn minimises_to_the_unique_muc() {
        let mut solver = IncrementalSolver::new();
        for v in 1..=4 {
            solver.lit_of(v);
        }
        solver.add_clause(&crate::literal::Clause::new(vec![-2, -4])); // -b or -d

        solver.clear_assumptions();
        for lit in [1, 2, 3, 4] {
            solver.assume(lit);
        }
        let outcome = solver.solve(SatKind::Main).unwrap();
        assert_eq!(outcome, super::super::SatOutcome::Unsatisfiable);
        let core = solver.core();

        let muc = minimise(&mut solver, SatKind::Muc, core).unwrap();
        let mut sorted = muc.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![2, 4]);
    }

    #[test]
    fn singleton_core_is_returned_unchanged() {
        let mut solver = IncrementalSolver::new();
        solver.lit_of(1);
        solver.add_clause(&crate::literal::Clause::new(vec![-1]));
        solver.clear_assumptions();
        solver.assume(1);
        assert_eq!(
            solver.solve(SatKind::Main).unwrap(),
            super::super::SatOutcome::Unsatisfiable
        );
        let core = solver.core();
        let muc = minimise(&mut solver, SatKind::Muc, core.clone()).unwrap();
        assert_eq!(muc, core);
    }
}

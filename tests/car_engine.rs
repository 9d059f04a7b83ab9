//! Integration coverage for the six end-to-end scenarios of §8, run against
//! the public surface of the crate rather than any internal type. Scenarios
//! 1-3 and 6 drive `CarEngine::run` directly; scenarios 4 and 5 are
//! properties of the SAT/frame layer (`sat::muc::minimise`, `frame::Frame`)
//! stated the same way §8 states them, so they are exercised at that layer
//! here rather than through a contrived engine run.
use car::config::Config;
use car::engine::{CarEngine, Verdict};
use car::frame::Frame;
use car::literal::{Clause, Cube, VarPartition};
use car::sat::{muc, IncrementalSolver, SatAbstraction, SatKind, SatOutcome};
use car::stats::NullSink;
use car::transition::InMemoryTransitionSystem;

/// Scenario 1: 1 input, 1 latch, `T = latch' <-> latch`, init `{+latch}`,
/// bad `-latch`. Nothing can ever make the latch false, so the search blocks
/// the bad state in the very first frame and converges without exploring
/// any predecessor.
#[test]
fn scenario_1_trivially_safe() {
    let part = VarPartition::new(1, 1); // input: 1, latch: 2, primed latch: 4
    let sys = InMemoryTransitionSystem::new(
        part,
        vec![Clause::new(vec![-4, 2]), Clause::new(vec![4, -2])],
        Cube::new(vec![2]),
        Cube::new(vec![-2]),
    );
    let mut engine = CarEngine::new(&sys, Config::default(), Box::new(NullSink));
    let verdict = engine.run().unwrap();
    match verdict {
        Verdict::Safe { invariant_frame, invariant } => {
            assert_eq!(invariant_frame, 1);
            assert_eq!(invariant, vec![Clause::new(vec![2])]);
        }
        Verdict::Unsafe { .. } => panic!("expected SAFE"),
    }
    // No predecessor of the bad state is ever consistent with `T`, so the
    // search never has to branch past the root.
    assert_eq!(engine.explored_states(), 1);
}

/// Scenario 2: init and bad are the same cube, so the root itself is already
/// a counterexample — no input is ever applied.
#[test]
fn scenario_2_immediate_counterexample() {
    let part = VarPartition::new(0, 1); // latch: 1, primed latch: 2
    let sys = InMemoryTransitionSystem::new(
        part,
        vec![Clause::new(vec![-2, 1]), Clause::new(vec![2, -1])],
        Cube::new(vec![1]),
        Cube::new(vec![1]),
    );
    let mut engine = CarEngine::new(&sys, Config::default(), Box::new(NullSink));
    let verdict = engine.run().unwrap();
    match verdict {
        Verdict::Unsafe {
            initial_latches,
            input_trace,
            rendered_trace,
        } => {
            assert_eq!(initial_latches, Cube::new(vec![1]));
            assert!(input_trace.is_empty());
            assert_eq!(rendered_trace, "1\n");
        }
        Verdict::Safe { .. } => panic!("expected an immediate counterexample"),
    }
}

/// Scenario 3: `l' = i`, init `-l`, bad `+l`. One input vector (`i = 1`)
/// drives the latch from `0` to `1`.
#[test]
fn scenario_3_two_step_counterexample() {
    let part = VarPartition::new(1, 1); // input: 1, latch: 2, primed latch: 4
    let sys = InMemoryTransitionSystem::new(
        part,
        vec![Clause::new(vec![-4, 1]), Clause::new(vec![4, -1])],
        Cube::new(vec![-2]),
        Cube::new(vec![2]),
    );
    let mut engine = CarEngine::new(&sys, Config::default(), Box::new(NullSink));
    let verdict = engine.run().unwrap();
    match verdict {
        Verdict::Unsafe {
            initial_latches,
            input_trace,
            rendered_trace,
        } => {
            assert_eq!(initial_latches, Cube::new(vec![-2]));
            assert_eq!(input_trace, vec![Cube::new(vec![1])]);
            assert_eq!(rendered_trace, "0\n1\n");
        }
        Verdict::Safe { .. } => panic!("expected a two-step counterexample"),
    }
}

/// Scenario 4: assumptions `{a, b, c, d}` over an UNSAT instance whose
/// unique MUC is `{b, d}` (clause `-b or -d` conflicts whenever both hold;
/// `a` and `c` are free).
#[test]
fn scenario_4_muc_minimisation() {
    let mut solver = IncrementalSolver::new();
    for v in 1..=4 {
        solver.lit_of(v);
    }
    solver.add_clause(&Clause::new(vec![-2, -4]));

    solver.clear_assumptions();
    for lit in [1, 2, 3, 4] {
        solver.assume(lit);
    }
    assert_eq!(solver.solve(SatKind::Main).unwrap(), SatOutcome::Unsatisfiable);

    let core = solver.core();
    let mut muc = muc::minimise(&mut solver, SatKind::Muc, core).unwrap();
    muc.sort_unstable();
    assert_eq!(muc, vec![2, 4]);
}

/// Scenario 5: inserting `{+1, +2, +3}` then `{+1, +2}` leaves only the
/// stronger clause, with its subsumed sibling's index entries gone too.
#[test]
fn scenario_5_frame_subsumption() {
    let mut frame = Frame::new();
    assert!(frame.add(Clause::new(vec![1, 2, 3])));
    assert!(frame.add(Clause::new(vec![1, 2])));

    assert_eq!(frame.len(), 1);
    assert_eq!(frame.get(0).unwrap(), &Clause::new(vec![1, 2]));
    assert!(frame.get_indexes(3).is_empty());
}

/// Scenario 6: a state with no consistent predecessor at all (forward
/// search) is blocked by dead-state pruning alone; propagation then carries
/// that single clause forward without the search ever having to branch, and
/// the O-sequence converges on the very next frame it grows.
#[test]
fn scenario_6_propagation_reaches_a_fixed_point_without_new_clauses() {
    let part = VarPartition::new(0, 1); // latch: 1, primed latch: 2
    let sys = InMemoryTransitionSystem::new(
        part,
        vec![Clause::new(vec![-2])], // latch' is always false
        Cube::new(vec![-1]),
        Cube::new(vec![1]),
    );
    let mut engine = CarEngine::new(&sys, Config::default(), Box::new(NullSink));
    let verdict = engine.run().unwrap();
    match verdict {
        Verdict::Safe { invariant_frame, invariant } => {
            assert_eq!(invariant_frame, 1);
            assert_eq!(invariant, vec![Clause::new(vec![-1])]);
        }
        Verdict::Unsafe { .. } => panic!("expected SAFE"),
    }
    // Dead-state pruning blocks the root outright; no child state is ever
    // allocated to carry the search further.
    assert_eq!(engine.explored_states(), 1);
}

/// Bad state identical to the initial state: UNSAFE at depth 0, with an
/// empty input trace (§8 boundary behaviors).
#[test]
fn boundary_bad_equals_initial_is_unsafe_at_depth_zero() {
    let part = VarPartition::new(0, 1);
    let sys = InMemoryTransitionSystem::new(
        part,
        vec![Clause::new(vec![-2, 1]), Clause::new(vec![2, -1])],
        Cube::new(vec![-1]),
        Cube::new(vec![-1]),
    );
    let mut engine = CarEngine::new(&sys, Config::default(), Box::new(NullSink));
    match engine.run().unwrap() {
        Verdict::Unsafe {
            initial_latches,
            input_trace,
            rendered_trace,
        } => {
            assert_eq!(initial_latches, Cube::new(vec![-1]));
            assert!(input_trace.is_empty());
            assert_eq!(rendered_trace, "0\n");
        }
        Verdict::Safe { .. } => panic!("expected an immediate counterexample"),
    }
}

/// Single-latch identity system, bad = `-latch`, init = `+latch`: SAFE with
/// a one-element invariant (§8 boundary behaviors).
#[test]
fn boundary_identity_system_is_safe_with_a_one_element_invariant() {
    let part = VarPartition::new(0, 1);
    let sys = InMemoryTransitionSystem::new(
        part,
        vec![Clause::new(vec![-2, 1]), Clause::new(vec![2, -1])],
        Cube::new(vec![1]),
        Cube::new(vec![-1]),
    );
    let mut engine = CarEngine::new(&sys, Config::default(), Box::new(NullSink));
    match engine.run().unwrap() {
        Verdict::Safe { invariant, .. } => {
            assert_eq!(invariant.len(), 1);
            assert_eq!(invariant, vec![Clause::new(vec![1])]);
        }
        Verdict::Unsafe { .. } => panic!("expected SAFE"),
    }
}

/// Frame insertion of a cube equal to an existing element leaves the frame
/// unchanged: one copy retained, index untouched (§8 boundary behaviors).
#[test]
fn boundary_duplicate_clause_insertion_is_a_no_op() {
    let mut frame = Frame::new();
    assert!(frame.add(Clause::new(vec![1, 2])));
    assert!(!frame.add(Clause::new(vec![1, 2])));
    assert_eq!(frame.len(), 1);
    assert_eq!(frame.get_indexes(1), &[0]);
    assert_eq!(frame.get_indexes(2), &[0]);
}

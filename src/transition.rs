//! The transition-system adapter (§4.4, component 5): the boundary between
//! this crate and whatever parses a circuit description and builds its CNF
//! encoding — both explicitly out of scope (§1). The engine only ever sees
//! this trait.
use crate::literal::{Clause, Cube, Literal, VarPartition};

/// Which end of the O-sequence the search starts from. Fixed for a run
/// (§4.4 "`direction`: forward or backward — fixed for the run").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `F[0]` is the initial states; search looks for a path to a bad
    /// state.
    Forward,
    /// `F[0]` is the bad states; search looks for a path back to init.
    Backward,
}

/// What an adapter built from a parsed circuit and a CNF-encoded
/// transition relation must supply. Everything here is read-only from the
/// engine's perspective: variable allocation for the transition clauses
/// happened upstream, before the engine ever sees this system.
pub trait TransitionSystem {
    fn partition(&self) -> VarPartition;

    /// CNF clauses of the transition relation `T`, over unprimed and
    /// primed latch/input/auxiliary variables.
    fn transition_clauses(&self) -> &[Clause];

    /// The initial-state predicate, as a cube over (unprimed) latches.
    fn initial_cube(&self) -> &Cube;

    /// The bad-state predicate, as a cube (commonly a single literal) over
    /// latches and/or auxiliaries.
    fn bad_cube(&self) -> &Cube;

    /// Maps an unprimed latch literal to its primed counterpart.
    fn prime(&self, lit: Literal) -> Literal {
        self.partition().prime(lit)
    }
}

/// A `TransitionSystem` built directly from in-memory CNF — what a test,
/// or a future adapter crate, hands the engine once parsing/encoding has
/// already happened upstream.
#[derive(Debug, Clone)]
pub struct InMemoryTransitionSystem {
    partition: VarPartition,
    clauses: Vec<Clause>,
    init: Cube,
    bad: Cube,
}

impl InMemoryTransitionSystem {
    pub fn new(partition: VarPartition, clauses: Vec<Clause>, init: Cube, bad: Cube) -> Self {
        InMemoryTransitionSystem {
            partition,
            clauses,
            init,
            bad,
        }
    }
}

impl TransitionSystem for InMemoryTransitionSystem {
    fn partition(&self) -> VarPartition {
        self.partition
    }

    fn transition_clauses(&self) -> &[Clause] {
        &self.clauses
    }

    fn initial_cube(&self) -> &Cube {
        &self.init
    }

    fn bad_cube(&self) -> &Cube {
        &self.bad
    }
}

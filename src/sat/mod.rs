//! Crate `sat` wraps an incremental Boolean solver behind the capability set
//! the CAR engine needs: variable allocation, clause addition, assumption-
//! based solving, model read-out and unsat-core extraction. The engine talks
//! to exactly this trait; which concrete solver answers is an
//! implementation-time choice (Design Notes: "no inheritance is required").
pub mod muc;
pub mod solver;

pub use solver::IncrementalSolver;

use crate::error::CarResult;
use crate::literal::{Clause, Cube, Literal};

/// Identifies which of the engine's logical solvers issued a query, purely
/// for statistics (§4.1 `solve(kind)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatKind {
    Main,
    Invariant,
    Start,
    Dead,
    Partial,
    Muc,
    Propagate,
}

impl SatKind {
    pub const ALL: [SatKind; 7] = [
        SatKind::Main,
        SatKind::Invariant,
        SatKind::Start,
        SatKind::Dead,
        SatKind::Partial,
        SatKind::Muc,
        SatKind::Propagate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SatKind::Main => "main",
            SatKind::Invariant => "invariant",
            SatKind::Start => "start",
            SatKind::Dead => "dead",
            SatKind::Partial => "partial",
            SatKind::Muc => "muc",
            SatKind::Propagate => "propagate",
        }
    }
}

/// The only two answers a solve can give the engine; a third outcome
/// (UNKNOWN) is fatal and never reaches this type — it is reported as
/// `CarError::SolverUnknown` instead (§4.1 "any third outcome is fatal").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatOutcome {
    Satisfiable,
    Unsatisfiable,
}

/// The capability set the CAR engine depends on. A back-end implements this
/// once; the engine never reaches past it into solver internals.
pub trait SatAbstraction {
    /// Maps a signed-integer literal to the solver's internal representation,
    /// growing the variable pool as needed. Stable for the lifetime of the
    /// instance: the same `id` always yields the same mapping.
    fn lit_of(&mut self, id: Literal) -> Literal;

    /// Inverse of `lit_of`.
    fn id_of(&self, lit: Literal) -> Literal;

    /// Adds a disjunction. Fails silently if the solver rejects it; the
    /// engine must not rely on a return value (§4.1).
    fn add_clause(&mut self, clause: &Clause);

    fn add_unit(&mut self, id: Literal) {
        self.add_clause(&Clause::new(vec![id]));
    }

    fn add_binary(&mut self, a: Literal, b: Literal) {
        self.add_clause(&Clause::new(vec![a, b]));
    }

    fn add_ternary(&mut self, a: Literal, b: Literal, c: Literal) {
        self.add_clause(&Clause::new(vec![a, b, c]));
    }

    fn add_quaternary(&mut self, a: Literal, b: Literal, c: Literal, d: Literal) {
        self.add_clause(&Clause::new(vec![a, b, c, d]));
    }

    /// Asserts each literal of `cube` as a unit clause. Only safe when the
    /// caller guarantees the units will be retracted by scope (a fresh
    /// solver instance, or explicit negated units undoing them) — this is
    /// for temporary assumptions materialised permanently into a
    /// throwaway solver, not a substitute for `assume`.
    fn add_cube(&mut self, cube: &Cube) {
        for &lit in cube.iter() {
            self.add_unit(lit);
        }
    }

    /// Appends a literal to the assumption vector used by the next `solve`.
    fn assume(&mut self, lit: Literal);

    /// Clears the assumption vector. Callers must do this before any new
    /// solve; solvers do not remember previous assumptions (§4.1).
    fn clear_assumptions(&mut self);

    /// Solves under the current assumptions. `kind` is purely a statistics
    /// tag. An UNKNOWN result from the underlying engine is fatal.
    fn solve(&mut self, kind: SatKind) -> CarResult<SatOutcome>;

    /// On SAT, the full signed-integer assignment over allocated variables.
    fn model(&self) -> Vec<Literal>;

    /// On UNSAT, the subset of assumptions that sufficed — the unsat core,
    /// each literal reported with the polarity that appeared in
    /// assumptions.
    fn core(&self) -> Vec<Literal>;

    /// A locally-minimal unsat core, computed by `muc::minimise` (§4.5).
    fn minimise_core(&mut self, kind: SatKind, core: Vec<Literal>) -> CarResult<Vec<Literal>> {
        muc::minimise(self, kind, core)
    }
}

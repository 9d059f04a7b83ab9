//! Crate `literal` provides the `Literal`/`Cube`/`Clause` vocabulary and the
//! variable-index partition (inputs / latches / auxiliaries) that the rest
//! of the engine is built on.
use std::fmt;

/// A non-zero signed integer. `+v`/`-v` denote the positive/negative
/// polarity of variable `v`.
pub type Literal = i32;
/// 1-indexed variable identifier: `Literal::abs()` of any literal over it.
pub type VarId = u32;

/// Returns the variable a literal is over.
pub fn var_of(lit: Literal) -> VarId {
    debug_assert_ne!(lit, 0, "literal 0 is not a valid literal");
    lit.unsigned_abs()
}

/// Flips polarity; `negate(negate(l)) == l`.
pub fn negate(lit: Literal) -> Literal {
    -lit
}

/// Describes how a pool of variables partitions into inputs, latches and
/// auxiliaries, and the fixed offset that maps a latch literal to its primed
/// counterpart (§3 "Primed latches are produced by a fixed offset mapping").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarPartition {
    pub num_inputs: u32,
    pub num_latches: u32,
}

impl VarPartition {
    pub fn new(num_inputs: u32, num_latches: u32) -> Self {
        VarPartition {
            num_inputs,
            num_latches,
        }
    }

    /// First auxiliary variable id (one past the last latch).
    pub fn first_aux(&self) -> VarId {
        self.num_inputs + self.num_latches + 1
    }

    /// True if `v` is a latch variable (not input, not auxiliary).
    pub fn is_latch(&self, v: VarId) -> bool {
        self.num_inputs < v && v <= self.num_inputs + self.num_latches
    }

    /// Zero-based index of a latch variable within the latch block, per the
    /// `|l| - I - 1` formula of §4.3. Panics (via an assertion) on a
    /// literal that is not a latch literal, matching the original's
    /// `assert (index >= 0)`.
    pub fn latch_index(&self, lit: Literal) -> usize {
        let v = var_of(lit) as i64;
        let idx = v - self.num_inputs as i64 - 1;
        assert!(idx >= 0, "literal {} does not refer to a latch", lit);
        idx as usize
    }

    /// Maps a latch literal to its primed counterpart by a fixed offset:
    /// primed variables live immediately past every unprimed variable the
    /// partition currently knows about (inputs, latches and auxiliaries).
    pub fn prime(&self, lit: Literal) -> Literal {
        let offset = (self.first_aux() - 1) as Literal;
        if lit > 0 {
            lit + offset
        } else {
            lit - offset
        }
    }

    /// Inverse of `prime`: maps a primed latch literal back to unprimed.
    pub fn unprime(&self, lit: Literal) -> Literal {
        let offset = (self.first_aux() - 1) as Literal;
        if lit > 0 {
            lit - offset
        } else {
            lit + offset
        }
    }
}

/// An ordered conjunction of literals: a partial assignment, a state, or a
/// counter-model. Must be consistent (never contains both `l` and `-l`);
/// callers that build cubes from trusted sources (a SAT model, a known
/// state) do not re-check this on every construction — `is_consistent` is
/// there for the boundary where an unverified vector becomes a `Cube`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Cube(pub Vec<Literal>);

/// An ordered disjunction of literals: blocks the states satisfying the
/// negation of its literals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Clause(pub Vec<Literal>);

fn is_consistent(lits: &[Literal]) -> bool {
    for (i, &a) in lits.iter().enumerate() {
        for &b in &lits[i + 1..] {
            if a == -b {
                return false;
            }
        }
    }
    true
}

impl Cube {
    pub fn new(lits: Vec<Literal>) -> Self {
        debug_assert!(is_consistent(&lits), "inconsistent cube: {:?}", lits);
        Cube(lits)
    }

    pub fn is_consistent(&self) -> bool {
        is_consistent(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Literal> {
        self.0.iter()
    }

    /// The clause blocking exactly the states this cube describes: negate
    /// every literal (`carsolver.cpp::add_clause_from_cube`).
    pub fn negate_into_clause(&self) -> Clause {
        Clause(self.0.iter().map(|&l| -l).collect())
    }
}

impl From<Vec<Literal>> for Cube {
    fn from(v: Vec<Literal>) -> Self {
        Cube::new(v)
    }
}

impl Clause {
    pub fn new(lits: Vec<Literal>) -> Self {
        Clause(lits)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Literal> {
        self.0.iter()
    }

    pub fn negate_into_cube(&self) -> Cube {
        Cube::new(self.0.iter().map(|&l| -l).collect())
    }
}

impl From<Vec<Literal>> for Clause {
    fn from(v: Vec<Literal>) -> Self {
        Clause::new(v)
    }
}

impl fmt::Display for Cube {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for l in &self.0 {
            write!(f, "{} ", l)?;
        }
        Ok(())
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for l in &self.0 {
            write!(f, "{} ", l)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prime_offsets_latches_past_the_whole_unprimed_pool() {
        let part = VarPartition::new(1, 2); // inputs:1 latches:2(3,4 aux:5+
        assert_eq!(part.prime(3), 3 + 4);
        assert_eq!(part.prime(-4), -(4 + 4));
    }

    #[test]
    fn unprime_inverts_prime() {
        let part = VarPartition::new(1, 2);
        for lit in [3, -4] {
            assert_eq!(part.unprime(part.prime(lit)), lit);
        }
    }

    #[test]
    fn latch_index_matches_spec_formula() {
        let part = VarPartition::new(2, 3); // latches are 3,4,5
        assert_eq!(part.latch_index(3), 0);
        assert_eq!(part.latch_index(-5), 2);
    }

    #[test]
    fn cube_consistency_check_rejects_contradiction() {
        assert!(!is_consistent(&[1, -1]));
        assert!(is_consistent(&[1, 2, -3]));
    }

    #[test]
    fn negate_into_clause_flips_every_literal() {
        let cu = Cube::new(vec![1, -2, 3]);
        let cl = cu.negate_into_clause();
        assert_eq!(cl.0, vec![-1, 2, -3]);
    }
}

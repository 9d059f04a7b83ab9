//! A compact incremental SAT backend implementing `SatAbstraction`.
//!
//! This is the "MiniSAT-class... behind a small abstract interface" collaborator
//! that §1 of the spec puts out of scope; it exists only so the crate has a
//! real, testable decision procedure to drive. It is deliberately not a
//! competitive CDCL engine: two-watched-literal unit propagation plus
//! chronological DPLL backtracking, no clause learning, no VSIDS, no
//! restarts — those are the teacher's (`splr`'s) concerns for a different
//! problem (winning SAT competitions), not this one (a correct, simple
//! oracle for a handful of small circuit queries per CAR iteration).
//!
//! Unsat-core quality: a query's assumptions are pushed as forced decisions
//! before any free-variable branching happens. If propagation conflicts
//! while still pushing assumptions, the engine resolves the conflict back
//! through propagation reasons to the decisions that caused it — a real,
//! often-proper subset of the assumptions. If the conflict is only found
//! after free-variable branching was needed and fully exhausted, the whole
//! assumption set is returned instead (still sound: it is, by construction,
//! exactly the set the solver just proved unsatisfiable together with the
//! permanent clauses). Either way `minimise_core` (`sat::muc`) is what
//! actually drives the core down to local minimality; this just seeds it.
use super::{SatAbstraction, SatKind, SatOutcome};
use crate::error::CarResult;
use crate::literal::{Clause, Literal, VarId};
use std::collections::HashMap;

struct DecisionFrame {
    var: VarId,
    trail_pos: usize,
    is_free: bool,
    flip_tried: bool,
}

/// Two-watched-literal clause storage: `lits[0]` and `lits[1]` are always
/// the currently watched literals.
struct StoredClause {
    lits: Vec<Literal>,
}

#[derive(Default)]
pub struct IncrementalSolver {
    num_vars: VarId,
    clauses: Vec<StoredClause>,
    /// `watches[l]` lists clause indices for which `l` is a watched literal;
    /// they must be re-examined whenever `l` becomes false.
    watches: HashMap<Literal, Vec<usize>>,
    /// 1-indexed by variable; 0 means unassigned.
    value: Vec<i8>,
    reason: Vec<Option<usize>>,
    level: Vec<u32>,
    trail: Vec<Literal>,
    propagated_to: usize,
    decisions: Vec<DecisionFrame>,
    assumption_level_count: u32,
    pending_assumptions: Vec<Literal>,
    model_cache: Vec<Literal>,
    core_cache: Vec<Literal>,
}

impl IncrementalSolver {
    pub fn new() -> Self {
        IncrementalSolver {
            num_vars: 0,
            clauses: Vec::new(),
            watches: HashMap::new(),
            value: vec![0],   // index 0 unused
            reason: vec![None],
            level: vec![0],
            trail: Vec::new(),
            propagated_to: 0,
            decisions: Vec::new(),
            assumption_level_count: 0,
            pending_assumptions: Vec::new(),
            model_cache: Vec::new(),
            core_cache: Vec::new(),
        }
    }

    fn grow_to(&mut self, v: VarId) {
        while self.num_vars < v {
            self.num_vars += 1;
            self.value.push(0);
            self.reason.push(None);
            self.level.push(0);
        }
    }

    fn value_of(&self, lit: Literal) -> i8 {
        let v = lit.unsigned_abs() as usize;
        let raw = self.value[v];
        if lit < 0 {
            -raw
        } else {
            raw
        }
    }

    fn current_level(&self) -> u32 {
        self.decisions.len() as u32
    }

    /// Registers `lit` as true via `cause` (`None` for a decision/fact),
    /// at the given decision level.
    fn enqueue(&mut self, lit: Literal, cause: Option<usize>) {
        let v = lit.unsigned_abs() as usize;
        self.value[v] = if lit > 0 { 1 } else { -1 };
        self.reason[v] = cause;
        self.level[v] = self.current_level();
        self.trail.push(lit);
    }

    fn register_watch(&mut self, clause_idx: usize, watched_lit: Literal) {
        self.watches.entry(watched_lit).or_default().push(clause_idx);
    }

    /// Propagates units to a fixed point; returns the index of a violated
    /// clause on conflict.
    fn propagate(&mut self) -> Option<usize> {
        while self.propagated_to < self.trail.len() {
            let lit = self.trail[self.propagated_to];
            self.propagated_to += 1;
            let falsified = -lit;
            let watching = self.watches.remove(&falsified).unwrap_or_default();
            let mut still_watching = Vec::with_capacity(watching.len());
            let mut conflict = None;
            for ci in watching {
                if conflict.is_some() {
                    still_watching.push(ci);
                    continue;
                }
                // Normalise so the falsified literal sits at position 1.
                if self.clauses[ci].lits[0] == falsified {
                    self.clauses[ci].lits.swap(0, 1);
                }
                debug_assert_eq!(self.clauses[ci].lits[1], falsified);
                let other_watch = self.clauses[ci].lits[0];
                if self.value_of(other_watch) == 1 {
                    // Clause already satisfied by its other watch.
                    still_watching.push(ci);
                    continue;
                }
                let mut found_replacement = None;
                for k in 2..self.clauses[ci].lits.len() {
                    let cand = self.clauses[ci].lits[k];
                    if self.value_of(cand) != -1 {
                        found_replacement = Some(k);
                        break;
                    }
                }
                match found_replacement {
                    Some(k) => {
                        self.clauses[ci].lits.swap(1, k);
                        let new_watch = self.clauses[ci].lits[1];
                        self.register_watch(ci, new_watch);
                    }
                    None => {
                        if self.value_of(other_watch) == 0 {
                            self.enqueue(other_watch, Some(ci));
                            still_watching.push(ci);
                        } else {
                            // Both watches false: conflict.
                            still_watching.push(ci);
                            conflict = Some(ci);
                        }
                    }
                }
            }
            self.watches.insert(falsified, still_watching);
            if let Some(ci) = conflict {
                return Some(ci);
            }
        }
        None
    }

    fn first_unassigned(&self) -> Option<VarId> {
        (1..=self.num_vars).find(|&v| self.value[v as usize] == 0)
    }

    fn undo_from(&mut self, trail_pos: usize) {
        while self.trail.len() > trail_pos {
            let lit = self.trail.pop().unwrap();
            let v = lit.unsigned_abs() as usize;
            self.value[v] = 0;
            self.reason[v] = None;
            self.level[v] = 0;
        }
        self.propagated_to = self.propagated_to.min(self.trail.len());
    }

    /// Pushes a new decision literal (assumption-forced or free) at a fresh
    /// level.
    fn push_decision(&mut self, lit: Literal, is_free: bool) {
        let trail_pos = self.trail.len();
        self.decisions.push(DecisionFrame {
            var: lit.unsigned_abs(),
            trail_pos,
            is_free,
            flip_tried: false,
        });
        self.enqueue(lit, None);
    }

    /// Applies the pending assumptions as forced decisions, propagating
    /// after each. Returns the violated clause's literals (as a conflict
    /// set) if one contradicts directly or propagation conflicts.
    fn push_assumptions(&mut self) -> Option<Vec<Literal>> {
        let assumptions = self.pending_assumptions.clone();
        for lit in assumptions {
            match self.value_of(lit) {
                1 => continue, // already implied, nothing new to push
                -1 => return Some(vec![lit]), // contradicts an existing fact/decision
                _ => {
                    self.push_decision(lit, false);
                    self.assumption_level_count = self.current_level();
                    if let Some(ci) = self.propagate() {
                        return Some(self.clauses[ci].lits.clone());
                    }
                }
            }
        }
        None
    }

    /// Chronological DPLL over whatever variables remain free once the
    /// assumptions are committed. Returns `true` on SAT.
    fn search_free(&mut self) -> bool {
        loop {
            if let Some(ci) = self.propagate() {
                if !self.backtrack_and_flip() {
                    self.core_cache = self.pending_assumptions.clone();
                    let _ = ci;
                    return false;
                }
                continue;
            }
            match self.first_unassigned() {
                Some(v) => self.push_decision(v as Literal, true),
                None => {
                    self.model_cache = (1..=self.num_vars)
                        .map(|v| if self.value[v as usize] >= 1 { v as Literal } else { -(v as Literal) })
                        .collect();
                    return true;
                }
            }
        }
    }

    /// Backtracks to the most recent free decision not yet flipped, flips
    /// it, and re-propagates one step up. Returns `false` if no free
    /// decision remains to flip (the assumption boundary was reached).
    fn backtrack_and_flip(&mut self) -> bool {
        loop {
            let idx = match self.decisions.len() {
                0 => return false,
                n => n - 1,
            };
            if !self.decisions[idx].is_free {
                return false;
            }
            if !self.decisions[idx].flip_tried {
                let var = self.decisions[idx].var;
                let trail_pos = self.decisions[idx].trail_pos;
                let was_true = self.value[var as usize] == 1;
                self.undo_from(trail_pos);
                self.decisions[idx].flip_tried = true;
                let flipped = if was_true { -(var as Literal) } else { var as Literal };
                self.enqueue(flipped, None);
                return true;
            } else {
                let trail_pos = self.decisions[idx].trail_pos;
                self.undo_from(trail_pos);
                self.decisions.pop();
            }
        }
    }

    fn backtrack_to_root(&mut self) {
        self.undo_from(0);
        self.decisions.clear();
        self.assumption_level_count = 0;
    }

    /// Resolves a set of currently-false literals back through propagation
    /// reasons to the decisions that imply their falsity, keeping only
    /// genuine (level > 0) decisions — i.e. assumption pushes, since free
    /// decisions cannot yet have been made when this runs.
    fn analyze(&self, conflict_lits: &[Literal]) -> Vec<Literal> {
        let mut involved: Vec<bool> = vec![false; self.num_vars as usize + 1];
        let mut pending = 0usize;
        for &lit in conflict_lits {
            let v = lit.unsigned_abs() as usize;
            if !involved[v] {
                involved[v] = true;
                pending += 1;
            }
        }
        let mut core = Vec::new();
        for &lit in self.trail.iter().rev() {
            if pending == 0 {
                break;
            }
            let v = lit.unsigned_abs() as usize;
            if !involved[v] {
                continue;
            }
            involved[v] = false;
            pending -= 1;
            match self.reason[v] {
                Some(ci) => {
                    for &other in self.clauses[ci].lits.iter() {
                        let ov = other.unsigned_abs() as usize;
                        if ov != v && !involved[ov] {
                            involved[ov] = true;
                            pending += 1;
                        }
                    }
                }
                None => {
                    if self.level[v] > 0 && self.level[v] <= self.assumption_level_count {
                        if !core.contains(&lit) {
                            core.push(lit);
                        }
                    }
                }
            }
        }
        core
    }
}

impl SatAbstraction for IncrementalSolver {
    fn lit_of(&mut self, id: Literal) -> Literal {
        self.grow_to(id.unsigned_abs());
        id
    }

    fn id_of(&self, lit: Literal) -> Literal {
        lit
    }

    fn add_clause(&mut self, clause: &Clause) {
        if clause.is_empty() {
            return;
        }
        for &lit in clause.iter() {
            self.grow_to(lit.unsigned_abs());
        }
        if clause.len() == 1 {
            let lit = clause.0[0];
            match self.value_of(lit) {
                -1 => { /* silently rejected, per §4.1 */ }
                0 => self.enqueue(lit, None),
                _ => {}
            }
            return;
        }
        let idx = self.clauses.len();
        let lits = clause.0.clone();
        let (w0, w1) = (lits[0], lits[1]);
        self.clauses.push(StoredClause { lits });
        self.register_watch(idx, w0);
        self.register_watch(idx, w1);
    }

    fn assume(&mut self, lit: Literal) {
        self.pending_assumptions.push(lit);
    }

    fn clear_assumptions(&mut self) {
        self.pending_assumptions.clear();
    }

    fn solve(&mut self, _kind: SatKind) -> CarResult<SatOutcome> {
        self.backtrack_to_root();
        self.model_cache.clear();
        self.core_cache.clear();

        if let Some(ci) = self.propagate() {
            // A permanent fact conflicts with another permanent fact: the
            // clause database itself is unsatisfiable, independent of any
            // assumption.
            let lits = self.clauses[ci].lits.clone();
            self.core_cache = self.analyze(&lits);
            return Ok(SatOutcome::Unsatisfiable);
        }

        if let Some(conflict_lits) = self.push_assumptions() {
            self.core_cache = self.analyze(&conflict_lits);
            return Ok(SatOutcome::Unsatisfiable);
        }

        if self.search_free() {
            Ok(SatOutcome::Satisfiable)
        } else {
            Ok(SatOutcome::Unsatisfiable)
        }
    }

    fn model(&self) -> Vec<Literal> {
        self.model_cache.clone()
    }

    fn core(&self) -> Vec<Literal> {
        self.core_cache.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_propagation_chains_through_a_small_cnf() {
        let mut s = IncrementalSolver::new();
        for v in 1..=3 {
            s.lit_of(v);
        }
        s.add_clause(&Clause::new(vec![1]));
        s.add_clause(&Clause::new(vec![-1, 2]));
        s.add_clause(&Clause::new(vec![-2, 3]));
        s.clear_assumptions();
        assert_eq!(s.solve(SatKind::Main).unwrap(), SatOutcome::Satisfiable);
        let model = s.model();
        assert!(model.contains(&1));
        assert!(model.contains(&2));
        assert!(model.contains(&3));
    }

    #[test]
    fn contradictory_assumptions_are_unsat() {
        let mut s = IncrementalSolver::new();
        s.lit_of(1);
        s.add_clause(&Clause::new(vec![1]));
        s.clear_assumptions();
        s.assume(-1);
        assert_eq!(s.solve(SatKind::Main).unwrap(), SatOutcome::Unsatisfiable);
        assert_eq!(s.core(), vec![-1]);
    }

    #[test]
    fn solves_same_instance_repeatedly_with_different_assumptions() {
        let mut s = IncrementalSolver::new();
        for v in 1..=2 {
            s.lit_of(v);
        }
        s.add_clause(&Clause::new(vec![-1, 2]));
        s.clear_assumptions();
        s.assume(1);
        assert_eq!(s.solve(SatKind::Main).unwrap(), SatOutcome::Satisfiable);
        assert!(s.model().contains(&2));

        s.clear_assumptions();
        s.assume(1);
        s.assume(-2);
        assert_eq!(s.solve(SatKind::Main).unwrap(), SatOutcome::Unsatisfiable);
    }

    #[test]
    fn branches_over_free_variables_when_needed() {
        let mut s = IncrementalSolver::new();
        for v in 1..=3 {
            s.lit_of(v);
        }
        // Satisfiable only if variable 3 is chosen appropriately; nothing
        // forces it via unit propagation from the assumption alone.
        s.add_clause(&Clause::new(vec![1, 2, 3]));
        s.add_clause(&Clause::new(vec![1, 2, -3]));
        s.clear_assumptions();
        s.assume(-1);
        s.assume(-2);
        assert_eq!(s.solve(SatKind::Main).unwrap(), SatOutcome::Unsatisfiable);
    }
}

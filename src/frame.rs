//! The O-sequence (§4.2): a growing list of `Frame`s, each an over-
//! approximation of the states reachable within `k` transitions of the
//! current search direction. Grounded on `data_structure.h`/`.cpp`'s
//! `Frame`/`Fsequence`: clauses are kept subsumption-free via an inverted
//! index from literal to the sorted positions of the clauses that mention
//! it, so adding one clause does not require scanning the whole frame.
use crate::literal::{Clause, Literal};
use std::collections::HashMap;

/// A single blocking clause stored in a `Frame`. Kept as a type alias
/// rather than a wrapper: nothing beyond the literal set is tracked per
/// clause in this engine (no activity, no learned-from provenance).
pub type FrameElement = Clause;

/// One level of the O-sequence: a subsumption-free set of clauses, all
/// implied by the frame above it (§4.2 invariant 1).
#[derive(Debug, Clone, Default)]
pub struct Frame {
    clauses: Vec<FrameElement>,
    /// literal -> ascending positions of the clauses in `clauses` that
    /// mention it (`data_structure.cpp::Frame::get_indexes`).
    index: HashMap<Literal, Vec<usize>>,
}

impl Frame {
    pub fn new() -> Self {
        Frame::default()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrameElement> {
        self.clauses.iter()
    }

    pub fn get(&self, pos: usize) -> Option<&FrameElement> {
        self.clauses.get(pos)
    }

    /// Positions of the clauses mentioning `lit`, ascending
    /// (`Frame::get_indexes`).
    pub fn get_indexes(&self, lit: Literal) -> &[usize] {
        self.index.get(&lit).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Adds `clause` to the frame, maintaining subsumption-freedom.
    /// Returns `false` without modifying the frame if an existing clause
    /// already subsumes it (i.e. is a subset of its literal set — a
    /// strictly stronger or identical constraint already present).
    /// Otherwise inserts the clause and discards every existing clause
    /// that the new one subsumes in turn.
    pub fn add(&mut self, clause: FrameElement) -> bool {
        if self.find_subsuming(&clause).is_some() {
            return false;
        }
        let mut redundant = self.find_subsumed(&clause);
        redundant.sort_unstable_by(|a, b| b.cmp(a));
        for pos in redundant {
            self.remove_at(pos);
        }
        let new_pos = self.clauses.len();
        for &lit in clause.iter() {
            self.index.entry(lit).or_default().push(new_pos);
        }
        self.clauses.push(clause);
        true
    }

    /// Removes the clause at `pos`, renumbering every index entry that
    /// pointed past it (`Frame::update_index_for`/`update_index_map`).
    fn remove_at(&mut self, pos: usize) {
        let removed = self.clauses.remove(pos);
        for &lit in removed.iter() {
            if let Some(positions) = self.index.get_mut(&lit) {
                positions.retain(|&p| p != pos);
            }
        }
        for positions in self.index.values_mut() {
            for p in positions.iter_mut() {
                if *p > pos {
                    *p -= 1;
                }
            }
        }
        self.index.retain(|_, positions| !positions.is_empty());
    }

    /// An existing clause whose literal set is a subset of `clause`'s
    /// (so `clause` would add nothing new), chosen via the literal with
    /// the shortest posting list to limit the scan.
    fn find_subsuming(&self, clause: &FrameElement) -> Option<usize> {
        if clause.is_empty() {
            return None;
        }
        let pivot = clause
            .iter()
            .min_by_key(|&&lit| self.get_indexes(lit).len())
            .copied()?;
        self.get_indexes(pivot)
            .iter()
            .copied()
            .find(|&pos| self.clauses[pos].iter().all(|l| clause.0.contains(l)))
    }

    /// Existing clauses that `clause` itself subsumes: strict supersets
    /// of `clause`'s literal set.
    fn find_subsumed(&self, clause: &FrameElement) -> Vec<usize> {
        if clause.is_empty() {
            return Vec::new();
        }
        let mut candidates: Option<Vec<usize>> = None;
        for &lit in clause.iter() {
            let postings = self.get_indexes(lit);
            candidates = Some(match candidates {
                None => postings.to_vec(),
                Some(prev) => prev.into_iter().filter(|p| postings.contains(p)).collect(),
            });
        }
        candidates
            .unwrap_or_default()
            .into_iter()
            .filter(|&p| self.clauses[p].len() > clause.len())
            .collect()
    }
}

/// The O-sequence proper: `frames[0]` is the weakest (innermost) frame,
/// each later frame an over-approximation of states within one more step
/// (§4.2). Monotonicity (every clause of `frames[k]` holds in `frames[k-1]`
/// too) is an engine-maintained invariant, not something `Fsequence` itself
/// enforces — it only stores and indexes.
#[derive(Debug, Clone, Default)]
pub struct Fsequence {
    frames: Vec<Frame>,
}

impl Fsequence {
    pub fn new() -> Self {
        Fsequence { frames: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push_frame(&mut self) -> usize {
        self.frames.push(Frame::new());
        self.frames.len() - 1
    }

    pub fn frame(&self, k: usize) -> &Frame {
        &self.frames[k]
    }

    pub fn frame_mut(&mut self, k: usize) -> &mut Frame {
        &mut self.frames[k]
    }

    pub fn last_index(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn total_clauses(&self) -> usize {
        self.frames.iter().map(Frame::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_a_subset_clause_drops_the_superset_it_subsumes() {
        let mut f = Frame::new();
        assert!(f.add(Clause::new(vec![1, 2, 3])));
        assert!(f.add(Clause::new(vec![1, 2])));
        assert_eq!(f.len(), 1);
        assert_eq!(f.get(0).unwrap().0, vec![1, 2]);
    }

    #[test]
    fn adding_a_superset_of_an_existing_clause_is_rejected() {
        let mut f = Frame::new();
        assert!(f.add(Clause::new(vec![1, 2])));
        assert!(!f.add(Clause::new(vec![1, 2, 3])));
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn unrelated_clauses_coexist() {
        let mut f = Frame::new();
        assert!(f.add(Clause::new(vec![1, 2])));
        assert!(f.add(Clause::new(vec![-1, 3])));
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn index_stays_consistent_after_a_removal() {
        let mut f = Frame::new();
        f.add(Clause::new(vec![1, 2, 3]));
        f.add(Clause::new(vec![4, 5]));
        f.add(Clause::new(vec![1, 2])); // subsumes the first clause
        assert_eq!(f.len(), 2);
        assert_eq!(f.get_indexes(4), &[0]);
        assert_eq!(f.get_indexes(1), &[1]);
    }

    #[test]
    fn fsequence_tracks_frame_count_and_totals() {
        let mut seq = Fsequence::new();
        seq.push_frame();
        seq.push_frame();
        seq.frame_mut(0).add(Clause::new(vec![1]));
        seq.frame_mut(1).add(Clause::new(vec![2]));
        seq.frame_mut(1).add(Clause::new(vec![3]));
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.total_clauses(), 3);
    }
}

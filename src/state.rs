//! The search tree (§4.3): each `State` is a node recording the latch
//! assignment it stands for, the input cube that produced it, and a parent
//! link back towards the frontier's root. Grounded on
//! `data_structure.h`/`.cpp`'s `State` class — the same fields
//! (`latches_`, `inputs_`, `last_inputs_`, `pre_`, `depth_`), the same
//! `imply`/`intersect` predicates, and the same forward/backward-aware
//! trace printing.
use crate::literal::{Cube, Literal, VarPartition};

/// Index into a `Bsequence`'s arena. Cheap to copy, stable for the life of
/// the arena (no removal — dead states are flagged, not freed, since a
/// parent link elsewhere in the tree may still reference them).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub usize);

/// One node of the search tree.
#[derive(Debug, Clone)]
pub struct State {
    id: u64,
    /// Latch assignment this node stands for. May be a partial cube once
    /// generalisation (partial-state extraction, §4.4) has trimmed it.
    latches: Cube,
    /// Input cube that, applied at this node's latch values, produces the
    /// child this node was created from (forward search) or that this node
    /// was created to reach (backward search).
    inputs: Cube,
    /// For backward search only: the input cube used one step further
    /// towards the bad state, needed to reverse the walk when printing a
    /// counterexample (`State::last_inputs`).
    last_inputs: Cube,
    parent: Option<StateId>,
    depth: u32,
    forward: bool,
    dead: bool,
    added_to_dead_solver: bool,
}

impl State {
    pub fn latches(&self) -> &Cube {
        &self.latches
    }

    pub fn inputs(&self) -> &Cube {
        &self.inputs
    }

    pub fn last_inputs(&self) -> &Cube {
        &self.last_inputs
    }

    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_forward(&self) -> bool {
        self.forward
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_dead(&mut self, dead: bool) {
        self.dead = dead;
    }

    pub fn added_to_dead_solver(&self) -> bool {
        self.added_to_dead_solver
    }

    pub fn set_added_to_dead_solver(&mut self, v: bool) {
        self.added_to_dead_solver = v;
    }

    /// Trims `self.latches` down to `reduced`, keeping the state's identity
    /// otherwise untouched. Used once partial-state extraction (§4.4) has
    /// found a smaller cube that still blocks.
    pub fn set_latches(&mut self, reduced: Cube) {
        self.latches = reduced;
    }

    /// True if every literal of `target` also appears in `self`'s latch
    /// cube — `self` is at least as specific, so `self` implies `target`
    /// (`State::imply`).
    pub fn imply(&self, target: &Cube) -> bool {
        target.iter().all(|lit| self.latches.0.contains(lit))
    }

    /// True if `self` and `other` share no pair of literals over the same
    /// variable with opposite polarity — the two partial assignments are
    /// compatible and could be extended to a common full state
    /// (`State::intersect`).
    pub fn intersect(&self, other: &Cube) -> bool {
        other.iter().all(|&lit| !self.latches.0.contains(&-lit))
    }

    fn stringify(cube: &Cube, count: u32) -> String {
        let mut out = String::with_capacity(count as usize);
        for v in 1..=count {
            let lit = v as Literal;
            if cube.0.contains(&lit) {
                out.push('1');
            } else if cube.0.contains(&-lit) {
                out.push('0');
            } else {
                out.push('x');
            }
        }
        out
    }

    pub fn latches_string(&self, part: &VarPartition) -> String {
        // Latch variables are offset past the inputs; shift before
        // stringifying so index 0 of the output is latch 0.
        let shifted = Cube::new(
            self.latches
                .iter()
                .map(|&lit| {
                    let idx = part.latch_index(lit) as Literal + 1;
                    if lit > 0 {
                        idx
                    } else {
                        -idx
                    }
                })
                .collect(),
        );
        Self::stringify(&shifted, part.num_latches)
    }

    pub fn inputs_string(&self, part: &VarPartition) -> String {
        Self::stringify(&self.inputs, part.num_inputs)
    }

    pub fn last_inputs_string(&self, part: &VarPartition) -> String {
        Self::stringify(&self.last_inputs, part.num_inputs)
    }
}

/// The search tree for one direction of exploration: an arena of `State`s
/// plus monotonically increasing ids (`data_structure.h`'s static
/// `id_counter_`, made instance-local since a run now keeps one tree per
/// direction rather than one process-global counter).
#[derive(Debug, Clone, Default)]
pub struct Bsequence {
    states: Vec<State>,
    next_id: u64,
}

impl Bsequence {
    pub fn new() -> Self {
        Bsequence::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Allocates a new node. `parent` is `None` only for the root of a
    /// direction's tree (the initial-state or bad-state seed).
    pub fn alloc(
        &mut self,
        latches: Cube,
        inputs: Cube,
        last_inputs: Cube,
        parent: Option<StateId>,
        forward: bool,
    ) -> StateId {
        let depth = match parent {
            Some(p) => self.states[p.0].depth + 1,
            None => 0,
        };
        let id = self.next_id;
        self.next_id += 1;
        let state = State {
            id,
            latches,
            inputs,
            last_inputs,
            parent,
            depth,
            forward,
            dead: false,
            added_to_dead_solver: false,
        };
        self.states.push(state);
        StateId(self.states.len() - 1)
    }

    pub fn get(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub fn get_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[id.0]
    }

    /// Root-to-leaf chain of ids ending at `id` (inclusive), found by
    /// walking parent links and reversing.
    pub fn chain(&self, id: StateId) -> Vec<StateId> {
        let mut rev = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            rev.push(c);
            cur = self.states[c.0].parent;
        }
        rev.reverse();
        rev
    }

    /// Renders a counterexample trace ending at `id`: the initial latches,
    /// followed by the input vector applied at each step, in chronological
    /// order (`print_evidence(forward, out)`, §4.3).
    ///
    /// `chain` always runs this tree's root to `id`. A forward-growing tree
    /// (root is the initial state, children are successors) is already in
    /// chronological order, and each node's own `inputs` is the input that
    /// drives it to its child. A backward-growing tree (root is the bad-state
    /// seed, children are predecessors) runs tip-to-init in the wrong
    /// direction for reporting, so it is reversed first; once reversed, each
    /// node's own `last_inputs` is the input that drives it towards the
    /// bad state, since that is what backward exploration recorded when the
    /// node was created as a predecessor of its (chronologically later)
    /// parent.
    pub fn print_evidence(&self, id: StateId, part: &VarPartition) -> String {
        let forward = self.get(id).is_forward();
        let raw = self.chain(id);
        let chain: Vec<StateId> = if forward {
            raw
        } else {
            raw.into_iter().rev().collect()
        };
        let mut out = String::new();
        out.push_str(&self.get(chain[0]).latches_string(part));
        out.push('\n');
        for &sid in chain.iter().take(chain.len().saturating_sub(1)) {
            let s = self.get(sid);
            let step_inputs = if forward {
                s.inputs_string(part)
            } else {
                s.last_inputs_string(part)
            };
            out.push_str(&step_inputs);
            out.push('\n');
        }
        out
    }
}

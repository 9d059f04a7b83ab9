/*!
# car — a Complementary Approximate Reachability model checker

`car` decides whether a bad state is reachable in a finite-state sequential
circuit given as a symbolic transition system. It either finds a concrete
counterexample trace from an initial state to a bad state, or builds a
monotone over-approximation of every reachable state (an inductive
invariant) proving the bad state can never be reached.

The search alternates two complementary structures: an O-sequence of
growing over-approximations (`frame`) anchored at one side of the system
(initial states for forward search, bad states for backward search), and a
search tree (`state`) that necessarily explores predecessors/successors in
the complementary direction. Every step is driven by an incremental SAT
oracle behind the `sat::SatAbstraction` trait; `engine::CarEngine` is the
orchestrator tying all of it together.

AIGER parsing, CNF encoding, and the concrete circuit-loading CLI front end
are out of scope for this crate — see `transition::TransitionSystem` for the
boundary a caller must supply.

## Usage

```plain
$ car circuit.aig
SAFE
invariant frame: 4

$ car --backward circuit.aig
UNSAFE
0
1
1
```
*/
/// Crate `config` provides the engine's configuration and CLI.
pub mod config;
/// Crate `engine` is the CAR search orchestrator.
pub mod engine;
/// Crate `error` provides the engine's terminal-failure vocabulary.
pub mod error;
/// Crate `frame` is the O-sequence: a growing list of clause frames.
pub mod frame;
/// Crate `literal` provides the `Literal`/`Cube`/`Clause` vocabulary and the
/// variable-index partition.
pub mod literal;
/// Crate `sat` wraps an incremental SAT solver behind a small trait.
pub mod sat;
/// Crate `stats` is the ambient statistics collaborator.
pub mod stats;
/// Crate `state` is the search tree explored in the direction complementary
/// to the O-sequence.
pub mod state;
/// Crate `transition` is the boundary to a parsed, CNF-encoded circuit.
pub mod transition;
/// Crate `validator` independently replays a counterexample trace.
pub mod validator;

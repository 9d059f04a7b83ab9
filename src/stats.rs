//! Statistics is an external collaborator (§1, §9 "Statistics collector"):
//! the engine threads every SAT call through a minimal event-sink trait
//! rather than owning a concrete aggregator. `CarStats` is the one
//! implementation this crate ships — modeled on `statistics.h`'s per-solver
//! call counters and on the teacher's own `SolverState` elapsed-time
//! display idiom (`chrono::Utc::now() - start`, trimmed of its `PT`/`S`
//! ISO-8601 wrapping).
use crate::sat::{SatKind, SatOutcome};
use chrono::Duration;
use std::collections::HashMap;
use std::fmt;

/// Receives every solve the engine issues. `CarEngine` never downcasts or
/// inspects its sink; a caller wanting no statistics at all hands it a
/// `NullSink`.
pub trait EventSink {
    fn on_solve_begin(&mut self, kind: SatKind);
    fn on_solve_end(&mut self, kind: SatKind, elapsed: Duration, outcome: SatOutcome);
    fn on_verdict(&mut self, verdict_kind: &str);
}

/// The default sink: observes nothing, costs nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_solve_begin(&mut self, _kind: SatKind) {}
    fn on_solve_end(&mut self, _kind: SatKind, _elapsed: Duration, _outcome: SatOutcome) {}
    fn on_verdict(&mut self, _verdict_kind: &str) {}
}

#[derive(Debug, Clone, Default)]
struct KindTally {
    calls: u64,
    sat: u64,
    unsat: u64,
    time: Duration,
}

/// Counts solver calls per `SatKind`, grouped the way `statistics.h` keeps
/// one counter block per solver (main/inv/start/dead/partial/muc/propagate).
pub struct CarStats {
    tallies: HashMap<SatKind, KindTally>,
    verdict: Option<String>,
}

impl Default for CarStats {
    fn default() -> Self {
        CarStats::new()
    }
}

impl CarStats {
    pub fn new() -> Self {
        CarStats {
            tallies: SatKind::ALL.iter().map(|&k| (k, KindTally::default())).collect(),
            verdict: None,
        }
    }

    pub fn calls(&self, kind: SatKind) -> u64 {
        self.tallies.get(&kind).map(|t| t.calls).unwrap_or(0)
    }

    pub fn total_calls(&self) -> u64 {
        self.tallies.values().map(|t| t.calls).sum()
    }
}

impl EventSink for CarStats {
    fn on_solve_begin(&mut self, _kind: SatKind) {}

    fn on_solve_end(&mut self, kind: SatKind, elapsed: Duration, outcome: SatOutcome) {
        let tally = self.tallies.entry(kind).or_default();
        tally.calls += 1;
        tally.time = tally.time + elapsed;
        match outcome {
            SatOutcome::Satisfiable => tally.sat += 1,
            SatOutcome::Unsatisfiable => tally.unsat += 1,
        }
    }

    fn on_verdict(&mut self, verdict_kind: &str) {
        self.verdict = Some(verdict_kind.to_string());
    }
}

/// Trims a `chrono::Duration`'s ISO-8601 `Display` (`PT12.345S`) down to
/// `12.345`, the same transform `SolverState`'s `Display` applies.
fn human_elapsed(d: Duration) -> String {
    let mut tm = format!("{}", d);
    if tm.starts_with("PT") {
        tm.drain(..2);
    }
    if tm.ends_with('S') {
        tm.pop();
    }
    tm
}

impl fmt::Display for CarStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:<10}|{:>8}|{:>8}|{:>8}|{:>12}", "solver", "calls", "sat", "unsat", "time")?;
        for kind in SatKind::ALL.iter() {
            let tally = self.tallies.get(kind).cloned().unwrap_or_default();
            writeln!(
                f,
                "{:<10}|{:>8}|{:>8}|{:>8}|{:>12}",
                kind.label(),
                tally.calls,
                tally.sat,
                tally.unsat,
                human_elapsed(tally.time)
            )?;
        }
        if let Some(v) = &self.verdict {
            write!(f, "verdict: {}", v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallies_accumulate_per_kind() {
        let mut stats = CarStats::new();
        stats.on_solve_end(SatKind::Main, Duration::milliseconds(5), SatOutcome::Satisfiable);
        stats.on_solve_end(SatKind::Main, Duration::milliseconds(5), SatOutcome::Unsatisfiable);
        stats.on_solve_end(SatKind::Muc, Duration::milliseconds(1), SatOutcome::Unsatisfiable);
        assert_eq!(stats.calls(SatKind::Main), 2);
        assert_eq!(stats.calls(SatKind::Muc), 1);
        assert_eq!(stats.total_calls(), 3);
    }

    #[test]
    fn null_sink_accepts_every_event_without_panicking() {
        let mut sink = NullSink;
        sink.on_solve_begin(SatKind::Dead);
        sink.on_solve_end(SatKind::Dead, Duration::zero(), SatOutcome::Satisfiable);
        sink.on_verdict("safe");
    }
}

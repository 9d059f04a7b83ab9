// Thin CLI driver (§6 CLI surface): load a transition system, run
// `CarEngine`, map the verdict to an exit code. Colored SAT/UNSAT-style
// output and the 0/1/>=2 exit-code convention follow `splr::bin::splr`.
use car::config::Config;
use car::engine::{CarEngine, Verdict};
use car::error::{CarError, CarResult};
use car::literal::{Clause, Cube, Literal, VarPartition};
use car::stats::CarStats;
use car::transition::InMemoryTransitionSystem;
use car::validator;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use structopt::StructOpt;

const RED: &str = "\x1B[001m\x1B[031m";
const GREEN: &str = "\x1B[001m\x1B[032m";
const BLUE: &str = "\x1B[001m\x1B[034m";
const RESET: &str = "\x1B[000m";

fn main() {
    let config = Config::from_args();
    let quiet = config.quiet_mode;
    match run(config) {
        Ok(0) => std::process::exit(0),
        Ok(1) => std::process::exit(1),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}", colored(&format!("error: {}", e), RED, quiet));
            std::process::exit(2);
        }
    }
}

fn colored(msg: &str, color: &str, quiet: bool) -> String {
    if quiet {
        msg.to_string()
    } else {
        format!("{}{}{}", color, msg, RESET)
    }
}

fn run(config: Config) -> CarResult<i32> {
    let system = load_system(&config.input_filename)?;
    let quiet = config.quiet_mode;
    let mut engine = CarEngine::new(&system, config.clone(), Box::new(CarStats::new()));
    let verdict = engine.run()?;

    match verdict {
        Verdict::Safe { invariant_frame, .. } => {
            println!("{}", colored("SAFE", BLUE, quiet));
            println!("invariant frame: {}", invariant_frame);
            Ok(0)
        }
        Verdict::Unsafe {
            initial_latches,
            input_trace,
            rendered_trace,
        } => {
            if !validator::replay(&system, &initial_latches, &input_trace)? {
                return Err(CarError::InvariantViolation(
                    "produced counterexample did not replay against the transition system".into(),
                ));
            }
            println!("{}", colored("UNSAFE", GREEN, quiet));
            write_trace(&config, &rendered_trace)?;
            Ok(1)
        }
    }
}

fn write_trace(config: &Config, rendered: &str) -> CarResult<()> {
    if config.trace_filename.as_os_str().is_empty() {
        print!("{}", rendered);
        Ok(())
    } else {
        let mut f = File::create(&config.trace_filename)
            .map_err(|e| CarError::ResourceExhausted(e.to_string()))?;
        f.write_all(rendered.as_bytes())
            .map_err(|e| CarError::ResourceExhausted(e.to_string()))
    }
}

/// A minimal, non-AIGER text format for a pre-encoded transition system:
/// parsing and CNF construction from an actual circuit description are out
/// of scope for this crate (§1), so this loader only ever has to read CNF
/// and cubes already computed upstream. Grounded on the DIMACS CNF reading
/// convention `Solver::inject` uses: `c`-prefixed comments skipped, literals
/// whitespace-split and terminated by a trailing `0`.
///
/// ```text
/// c comment
/// p car <num_inputs> <num_latches>
/// i <literal>... 0      # initial cube
/// b <literal>... 0      # bad cube
/// <literal>... 0        # one transition clause per remaining line
/// ```
fn load_system(path: &std::path::Path) -> CarResult<InMemoryTransitionSystem> {
    let file = File::open(path).map_err(|e| CarError::InputMalformed(e.to_string()))?;
    let reader = BufReader::new(file);

    let mut partition: Option<VarPartition> = None;
    let mut init = None;
    let mut bad = None;
    let mut clauses = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|e| CarError::InputMalformed(e.to_string()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("p") => {
                let num_inputs: u32 = tokens
                    .next()
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| CarError::InputMalformed("malformed 'p' line".into()))?;
                let num_latches: u32 = tokens
                    .next()
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| CarError::InputMalformed("malformed 'p' line".into()))?;
                partition = Some(VarPartition::new(num_inputs, num_latches));
            }
            Some("i") => init = Some(Cube::new(parse_literals(tokens))),
            Some("b") => bad = Some(Cube::new(parse_literals(tokens))),
            Some(first) => {
                let lits = parse_literals(std::iter::once(first).chain(tokens));
                clauses.push(Clause::new(lits));
            }
            None => {}
        }
    }

    let partition = partition.ok_or_else(|| CarError::InputMalformed("missing 'p' line".into()))?;
    let init = init.ok_or_else(|| CarError::InputMalformed("missing 'i' line".into()))?;
    let bad = bad.ok_or_else(|| CarError::InputMalformed("missing 'b' line".into()))?;
    Ok(InMemoryTransitionSystem::new(partition, clauses, init, bad))
}

fn parse_literals<'a>(tokens: impl Iterator<Item = &'a str>) -> Vec<Literal> {
    tokens
        .filter_map(|t| t.parse::<Literal>().ok())
        .take_while(|&l| l != 0)
        .collect()
}

/// Crate `config` provides the engine's configuration and CLI.
use {crate::transition::Direction, std::path::PathBuf, structopt::StructOpt};

/// car version number.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration built from command line options.
#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "car", about, author)]
pub struct Config {
    //
    //## I/O configuration
    //
    /// An AIGER-like circuit description (parsing happens upstream of this
    /// crate; the path is carried through only so the CLI can report it).
    #[structopt(parse(from_os_str))]
    pub input_filename: PathBuf,

    /// Counterexample trace output file; empty means stdout.
    #[structopt(long = "trace", short = "t", default_value = "", parse(from_os_str))]
    pub trace_filename: PathBuf,

    /// Disable any progress/statistics message.
    #[structopt(long = "quiet", short = "q")]
    pub quiet_mode: bool,

    //
    //## search
    //
    /// Search direction: forward from init, or backward from the bad cube.
    #[structopt(long = "backward", short = "b")]
    pub backward: bool,

    /// Disable dead-state pruning (§4.4 "Dead-state pruning").
    #[structopt(long = "without-dead-pruning", short = "D")]
    pub without_dead_pruning: bool,

    /// Disable unsat-core minimisation; blocking clauses use the raw core
    /// from `solve` instead of `minimise_core`'s locally-minimal one.
    /// Mirrors the commented-out alternative routine in `carsolver.cpp`:
    /// useful for isolating whether a regression is in search or in MUC.
    #[structopt(long = "without-minimisation", short = "M")]
    pub without_minimisation: bool,
}

impl Config {
    pub fn direction(&self) -> Direction {
        if self.backward {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            input_filename: PathBuf::new(),
            trace_filename: PathBuf::new(),
            quiet_mode: false,
            backward: false,
            without_dead_pruning: false,
            without_minimisation: false,
        }
    }
}

impl<T> From<T> for Config
where
    PathBuf: From<T>,
{
    fn from(path: T) -> Config {
        let mut config = Config::default();
        config.input_filename = PathBuf::from(path);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_direction_is_forward() {
        assert_eq!(Config::default().direction(), Direction::Forward);
    }

    #[test]
    fn backward_flag_selects_backward_direction() {
        let mut cfg = Config::default();
        cfg.backward = true;
        assert_eq!(cfg.direction(), Direction::Backward);
    }
}

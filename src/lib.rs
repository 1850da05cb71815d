//! This crate provides the core logic for a deterministic single-tape Turing machine simulator
//! with an optional finite-valued memory register.
//! It includes modules for reading machine specifications, validating them, and running the
//! machine over one or many input strings with an optional trace of every configuration.

pub mod analyzer;
pub mod batch;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod table;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the keyed result collection produced by batch simulation.
pub use batch::Results;
/// Re-exports the `SpecLoader` struct from the loader module.
pub use loader::SpecLoader;
/// Re-exports the machine and its run records from the machine module.
pub use machine::{Execution, InstantaneousDescription, Outcome, Run, Step, TuringMachine};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports the `TransitionTable` struct from the table module.
pub use table::TransitionTable;
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports the specification and option types from the types module.
pub use types::{
    Direction, MachineSpec, Memory, SimulationOptions, SimulatorError, Transition,
    DEFAULT_MAX_STEPS, DEFAULT_TAPE_RADIUS, MAX_SPEC_SIZE,
};

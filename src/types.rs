//! This module defines the core data structures and types used throughout the simulator,
//! including the machine specification, transitions, run options and error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Rule;

/// The maximum allowed size for a machine specification document in bytes.
pub const MAX_SPEC_SIZE: usize = 65536; // 64KB
/// The default maximum number of steps to execute before suspending a run.
pub const DEFAULT_MAX_STEPS: usize = 10_000;
/// The default number of cells rendered on each side of the head in a snapshot.
pub const DEFAULT_TAPE_RADIUS: usize = 20;

/// A fully validated, immutable description of a single-tape Turing machine.
///
/// Specifications are produced by the [`loader`](crate::loader) and consumed as-is by the
/// simulation engine, which never re-validates them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineSpec {
    /// A human readable name, taken from the document or its file name.
    pub name: String,
    /// Every state identifier of the machine.
    pub states: Vec<String>,
    /// The state every run starts in.
    pub initial_state: String,
    /// Reaching any of these states halts the run with acceptance.
    pub final_states: Vec<String>,
    /// Symbols allowed in input strings.
    pub input_alphabet: Vec<char>,
    /// Symbols allowed on the tape. Always contains `blank`.
    pub tape_alphabet: Vec<char>,
    /// The symbol of every cell that was never written.
    pub blank: char,
    /// The memory register, if the machine carries one.
    pub memory: Option<Memory>,
    /// Transition rules in declaration order.
    pub transitions: Vec<Transition>,
    /// Input strings declared by the document for simulation.
    pub simulation_strings: Vec<String>,
}

impl MachineSpec {
    /// Checks whether `state` is one of the machine's final states.
    pub fn is_final(&self, state: &str) -> bool {
        self.final_states.iter().any(|s| s == state)
    }

    /// Returns the value the memory register holds at the start of a run, if there is a register.
    pub fn initial_memory(&self) -> Option<&str> {
        self.memory.as_ref().map(|m| m.initial.as_str())
    }
}

/// A finite-valued memory register attached to the machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Memory {
    /// Every value the register may hold. `None` leaves register values unconstrained.
    pub alphabet: Option<Vec<String>>,
    /// The value held at step 0.
    pub initial: String,
}

/// A single transition rule.
///
/// `(from_state, read, from_memory) -> (to_state, write, direction, to_memory)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state the rule applies in.
    pub from_state: String,
    /// The symbol that must be under the head.
    pub read: char,
    /// The register value the rule requires. `None` matches any value.
    pub from_memory: Option<String>,
    /// The state the machine moves to.
    pub to_state: String,
    /// The symbol written under the head.
    pub write: char,
    /// Where the head moves after writing.
    pub direction: Direction,
    /// The new register value. `None` leaves the register untouched.
    pub to_memory: Option<String>,
}

/// Represents the possible directions a Turing Machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    /// The signed head offset for this direction.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Stay => 0,
        }
    }
}

/// Knobs for a single run or a batch of runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOptions {
    /// Exact number of transitions after which a run is suspended.
    pub max_steps: usize,
    /// Whether instantaneous descriptions are recorded.
    pub capture_trace: bool,
    /// Cells rendered on each side of the head in every snapshot.
    pub tape_radius: usize,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            capture_trace: true,
            tape_radius: DEFAULT_TAPE_RADIUS,
        }
    }
}

/// Represents various errors that can occur while loading a machine specification.
///
/// Running a machine never fails; every way a run can end is reported through
/// [`Outcome`](crate::machine::Outcome).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulatorError {
    /// Indicates a syntax error in the specification document.
    #[error("Specification parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates that the document is well formed but does not describe a valid machine.
    #[error("Specification validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
}

//! This module provides functions for analyzing machine specifications to detect errors
//! before any simulation takes place. The engine trusts whatever passes these checks, so
//! every membership invariant it relies on is enforced here.

use crate::types::{MachineSpec, Memory, SimulatorError, Transition};

/// Represents the errors that can be found during the analysis of a machine specification.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The machine declares no states.
    NoStates,
    /// The initial state is not a declared state.
    InvalidStartState(String),
    /// A final state is not a declared state.
    InvalidFinalState(String),
    /// The named alphabet is empty.
    EmptyAlphabet(&'static str),
    /// The blank symbol is not part of the tape alphabet.
    BlankNotInTapeAlphabet(char),
    /// The memory register's initial value is not part of its alphabet.
    InvalidInitialMemory(String),
    /// A transition references an undeclared state.
    UndefinedState { index: usize, state: String },
    /// A transition reads or writes a symbol outside the tape alphabet.
    InvalidSymbol { index: usize, symbol: char },
    /// A transition requires or sets a value outside the memory alphabet.
    InvalidMemoryValue { index: usize, value: String },
}

impl From<AnalysisError> for SimulatorError {
    /// Converts an `AnalysisError` into a `SimulatorError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        let message = match error {
            AnalysisError::NoStates => "At least one state must be declared in 'q_list'".into(),
            AnalysisError::InvalidStartState(state) => {
                format!("Initial state '{state}' is not a declared state")
            }
            AnalysisError::InvalidFinalState(state) => {
                format!("Final state '{state}' is not a declared state")
            }
            AnalysisError::EmptyAlphabet(name) => format!("Alphabet '{name}' must not be empty"),
            AnalysisError::BlankNotInTapeAlphabet(blank) => {
                format!("Blank symbol '{blank}' must belong to the tape alphabet")
            }
            AnalysisError::InvalidInitialMemory(value) => {
                format!("Initial memory value '{value}' must belong to the memory alphabet")
            }
            AnalysisError::UndefinedState { index, state } => {
                format!("Transition #{index} references undefined state '{state}'")
            }
            AnalysisError::InvalidSymbol { index, symbol } => {
                format!("Transition #{index} uses symbol '{symbol}' outside the tape alphabet")
            }
            AnalysisError::InvalidMemoryValue { index, value } => {
                format!("Transition #{index} uses memory value '{value}' outside the memory alphabet")
            }
        };

        SimulatorError::ValidationError(message)
    }
}

/// Analyzes a `MachineSpec` for consistency errors.
///
/// Checks run in declaration order of the document sections and the first failure is
/// reported. Duplicate transition keys are deliberately not reported; the later rule
/// replaces the earlier one when the transition table is built.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(SimulatorError::ValidationError)` describing the first problem.
pub fn analyze(spec: &MachineSpec) -> Result<(), SimulatorError> {
    [
        check_states,
        check_alphabets,
        check_memory,
        check_transitions,
    ]
    .iter()
    .try_for_each(|check| check(spec))
    .map_err(Into::into)
}

/// Checks that states exist and that the initial and final states are among them.
fn check_states(spec: &MachineSpec) -> Result<(), AnalysisError> {
    if spec.states.is_empty() {
        return Err(AnalysisError::NoStates);
    }

    if !is_state(spec, &spec.initial_state) {
        return Err(AnalysisError::InvalidStartState(spec.initial_state.clone()));
    }

    spec.final_states
        .iter()
        .find(|state| !is_state(spec, state))
        .map_or(Ok(()), |state| {
            Err(AnalysisError::InvalidFinalState(state.clone()))
        })
}

/// Checks that both alphabets are populated and that the blank symbol can appear on the tape.
fn check_alphabets(spec: &MachineSpec) -> Result<(), AnalysisError> {
    if spec.input_alphabet.is_empty() {
        return Err(AnalysisError::EmptyAlphabet("input"));
    }
    if spec.tape_alphabet.is_empty() {
        return Err(AnalysisError::EmptyAlphabet("tape"));
    }
    if !spec.tape_alphabet.contains(&spec.blank) {
        return Err(AnalysisError::BlankNotInTapeAlphabet(spec.blank));
    }

    Ok(())
}

/// Checks that the memory register starts with a value from its own alphabet.
fn check_memory(spec: &MachineSpec) -> Result<(), AnalysisError> {
    match &spec.memory {
        Some(Memory {
            alphabet: Some(alphabet),
            initial,
        }) if !alphabet.contains(initial) => {
            Err(AnalysisError::InvalidInitialMemory(initial.clone()))
        }
        _ => Ok(()),
    }
}

/// Checks every transition against the declared states, tape alphabet and memory alphabet.
fn check_transitions(spec: &MachineSpec) -> Result<(), AnalysisError> {
    spec.transitions
        .iter()
        .enumerate()
        .try_for_each(|(index, transition)| check_transition(spec, index, transition))
}

fn check_transition(
    spec: &MachineSpec,
    index: usize,
    transition: &Transition,
) -> Result<(), AnalysisError> {
    for state in [&transition.from_state, &transition.to_state] {
        if !is_state(spec, state) {
            return Err(AnalysisError::UndefinedState {
                index,
                state: state.clone(),
            });
        }
    }

    for symbol in [transition.read, transition.write] {
        if !spec.tape_alphabet.contains(&symbol) {
            return Err(AnalysisError::InvalidSymbol { index, symbol });
        }
    }

    // Memory values are only constrained when the machine declares a register alphabet.
    if let Some(alphabet) = spec.memory.as_ref().and_then(|m| m.alphabet.as_ref()) {
        let values = [&transition.from_memory, &transition.to_memory];
        if let Some(value) = values
            .into_iter()
            .flatten()
            .find(|value| !alphabet.contains(*value))
        {
            return Err(AnalysisError::InvalidMemoryValue {
                index,
                value: value.clone(),
            });
        }
    }

    Ok(())
}

fn is_state(spec: &MachineSpec, state: &str) -> bool {
    spec.states.iter().any(|s| s == state)
}

//! This module provides the `SpecLoader` struct, responsible for loading machine specifications
//! from files and strings. Documents are read by the [`parser`](crate::parser), mapped onto the
//! raw document layout with `serde`, converted into a [`MachineSpec`] and finally checked by the
//! [`analyzer`](crate::analyzer).

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::analyzer::analyze;
use crate::parser::parse;
use crate::types::{Direction, MachineSpec, Memory, SimulatorError, Transition};

/// The name given to specifications that neither declare one nor come from a file.
const DEFAULT_NAME: &str = "machine";

/// `SpecLoader` is a utility struct for loading machine specifications.
pub struct SpecLoader;

impl SpecLoader {
    /// Loads a specification from the file at `path`.
    ///
    /// When the document has no `name`, the file stem is used.
    ///
    /// # Returns
    ///
    /// * `Ok(MachineSpec)` if the file is read, parsed and validated.
    /// * `Err(SimulatorError::FileError)` if the file cannot be read.
    /// * `Err(SimulatorError::ParseError)` or `Err(SimulatorError::ValidationError)` otherwise.
    pub fn load_spec(path: &Path) -> Result<MachineSpec, SimulatorError> {
        let content = fs::read_to_string(path).map_err(|e| {
            SimulatorError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        let fallback = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_NAME.to_string());

        let spec = load(&content, fallback)?;
        tracing::debug!(path = %path.display(), machine = %spec.name, "loaded specification");

        Ok(spec)
    }

    /// Loads a specification from the provided document text.
    pub fn load_spec_from_string(content: &str) -> Result<MachineSpec, SimulatorError> {
        load(content, DEFAULT_NAME.to_string())
    }
}

fn load(content: &str, fallback_name: String) -> Result<MachineSpec, SimulatorError> {
    let Value::Object(root) = parse(content)? else {
        return Err(validation("The document must describe a mapping"));
    };

    // The machine may be wrapped in a top-level `machine:` node.
    let machine = match root.get("machine") {
        Some(Value::Object(inner)) => Value::Object(inner.clone()),
        _ => Value::Object(root.clone()),
    };

    let raw: RawMachine = serde_json::from_value(machine).map_err(|e| validation(e.to_string()))?;

    let simulation_strings = match root.get("simulation_strings") {
        Some(value) if is_present(value) => {
            Some(serde_json::from_value(value.clone()).map_err(|e| validation(e.to_string()))?)
        }
        _ => raw.simulation_strings.clone(),
    };

    let spec = raw.into_spec(fallback_name, simulation_strings)?;
    analyze(&spec)?;

    Ok(spec)
}

/// Mirrors the falsy check of the document format: null and empty lists or strings are absent.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

fn validation(message: impl Into<String>) -> SimulatorError {
    SimulatorError::ValidationError(message.into())
}

/// Any scalar read as text. Unquoted digits such as `0` or `1` are common symbols.
///
/// Floats keep their fractional part (`1.0`) and booleans are capitalized (`True`), matching
/// how documents written for the reference tooling spell them back.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(text) => text,
            Scalar::Integer(n) => n.to_string(),
            Scalar::Float(n) => format!("{n:?}"),
            Scalar::Bool(true) => "True".to_string(),
            Scalar::Bool(false) => "False".to_string(),
        }
    }
}

/// A field that accepts either a single scalar or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Scalar),
    Many(Vec<Scalar>),
}

impl OneOrMany {
    fn into_texts(self) -> Vec<String> {
        match self {
            OneOrMany::One(scalar) => vec![scalar.into_text()],
            OneOrMany::Many(scalars) => scalars.into_iter().map(Scalar::into_text).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMachine {
    name: Option<Scalar>,
    q_states: Option<RawStates>,
    alphabet: Option<RawAlphabet>,
    blank: Option<Scalar>,
    memory: Option<RawMemory>,
    delta: Option<Vec<RawTransition>>,
    simulation_strings: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
struct RawStates {
    q_list: Option<Vec<Scalar>>,
    initial: Option<Scalar>,
    #[serde(rename = "final")]
    finals: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
struct RawAlphabet {
    input: Option<Vec<Scalar>>,
    tape: Option<Vec<Scalar>>,
    blank: Option<Scalar>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMemory {
    alphabet: Option<Vec<Scalar>>,
    initial: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct RawTransition {
    params: RawParams,
    output: RawOutput,
}

#[derive(Debug, Deserialize)]
struct RawParams {
    initial_state: Option<Scalar>,
    tape_input: Option<Scalar>,
    mem_cache_value: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    final_state: Option<Scalar>,
    tape_output: Option<Scalar>,
    tape_displacement: Option<Scalar>,
    mem_cache_value: Option<Scalar>,
}

impl RawMachine {
    fn into_spec(
        self,
        fallback_name: String,
        simulation_strings: Option<OneOrMany>,
    ) -> Result<MachineSpec, SimulatorError> {
        let states = self
            .q_states
            .ok_or_else(|| validation("The 'q_states' block is required"))?;
        let alphabet = self
            .alphabet
            .ok_or_else(|| validation("The 'alphabet' block is required"))?;

        let blank = self
            .blank
            .or(alphabet.blank)
            .ok_or_else(|| validation("A blank symbol must be defined with 'blank'"))?;
        let blank = symbol(blank.into_text(), "blank")?;

        let memory = self.memory.unwrap_or_default();
        let memory = match (memory.alphabet, memory.initial) {
            (Some(_), None) => {
                return Err(validation(
                    "'memory.initial' is required when 'memory.alphabet' is defined",
                ))
            }
            (alphabet, Some(initial)) => Some(Memory {
                alphabet: alphabet.map(|values| texts(Some(values))),
                initial: initial.into_text(),
            }),
            (None, None) => None,
        };

        let transitions = self
            .delta
            .ok_or_else(|| validation("The 'delta' block must be a list of transitions"))?
            .into_iter()
            .enumerate()
            .map(|(index, raw)| raw.into_transition(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MachineSpec {
            name: self
                .name
                .map(Scalar::into_text)
                .unwrap_or(fallback_name),
            states: texts(states.q_list),
            initial_state: states
                .initial
                .map(Scalar::into_text)
                .ok_or_else(|| validation("The 'q_states.initial' state is required"))?,
            final_states: states
                .finals
                .map(OneOrMany::into_texts)
                .unwrap_or_default(),
            input_alphabet: symbols(alphabet.input, "alphabet.input")?,
            tape_alphabet: symbols(alphabet.tape, "alphabet.tape")?,
            blank,
            memory,
            transitions,
            simulation_strings: simulation_strings
                .map(OneOrMany::into_texts)
                .unwrap_or_default(),
        })
    }
}

impl RawTransition {
    fn into_transition(self, index: usize) -> Result<Transition, SimulatorError> {
        let required = |value: Option<Scalar>, field: &str| {
            value.map(Scalar::into_text).ok_or_else(|| {
                validation(format!("Transition #{index} is missing '{field}'"))
            })
        };

        let read = required(self.params.tape_input, "params.tape_input")?;
        let write = required(self.output.tape_output, "output.tape_output")?;
        let movement = required(self.output.tape_displacement, "output.tape_displacement")?;

        Ok(Transition {
            from_state: required(self.params.initial_state, "params.initial_state")?,
            read: symbol(read, &format!("transition #{index} input"))?,
            from_memory: self.params.mem_cache_value.map(Scalar::into_text),
            to_state: required(self.output.final_state, "output.final_state")?,
            write: symbol(write, &format!("transition #{index} output"))?,
            direction: direction(&movement).ok_or_else(|| {
                validation(format!(
                    "Transition #{index} has invalid movement '{movement}', expected one of L, R, S"
                ))
            })?,
            to_memory: self.output.mem_cache_value.map(Scalar::into_text),
        })
    }
}

fn direction(movement: &str) -> Option<Direction> {
    match movement {
        "L" => Some(Direction::Left),
        "R" => Some(Direction::Right),
        "S" => Some(Direction::Stay),
        _ => None,
    }
}

fn texts(values: Option<Vec<Scalar>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(Scalar::into_text)
        .collect()
}

fn symbols(values: Option<Vec<Scalar>>, field: &str) -> Result<Vec<char>, SimulatorError> {
    texts(values)
        .into_iter()
        .map(|text| symbol(text, field))
        .collect()
}

/// Tape symbols are single characters.
fn symbol(text: String, field: &str) -> Result<char, SimulatorError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(validation(format!(
            "Symbol '{text}' in {field} must be exactly one character"
        ))),
    }
}

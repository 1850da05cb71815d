//! This module defines the `TuringMachine` struct, which simulates a deterministic single-tape
//! Turing machine with an optional memory register. A machine is built once from a
//! [`MachineSpec`] and can then run any number of independent input strings.

use std::fmt;

use serde::Serialize;

use crate::table::TransitionTable;
use crate::tape::Tape;
use crate::types::{MachineSpec, SimulationOptions};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// The machine entered, or stopped in, a final state.
    #[serde(rename = "final state reached")]
    Accepted,
    /// No rule applies and the current state is not final.
    #[serde(rename = "no transition defined")]
    NoTransition,
    /// The caller's step budget ran out before the machine halted on its own.
    #[serde(rename = "step limit reached")]
    StepLimit,
}

impl Outcome {
    /// The human readable termination reason.
    pub fn reason(self) -> &'static str {
        match self {
            Outcome::Accepted => "final state reached",
            Outcome::NoTransition => "no transition defined",
            Outcome::StepLimit => "step limit reached",
        }
    }

    /// Whether the machine itself stopped. A step-limit suspension is not a halt.
    pub fn is_halted(self) -> bool {
        !matches!(self, Outcome::StepLimit)
    }

    pub fn is_accepted(self) -> bool {
        matches!(self, Outcome::Accepted)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Represents the outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A transition was applied.
    Continue,
    /// No transition applies; the run is over.
    Halt(Outcome),
}

/// A snapshot of the machine's full configuration at one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstantaneousDescription {
    pub step: usize,
    pub state: String,
    pub head_position: i64,
    /// The rendered tape window with the head cell in brackets.
    pub tape_view: String,
    pub memory: Option<String>,
}

impl fmt::Display for InstantaneousDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Step {:04}: state={}, head={}, memory={}\n  tape: {}",
            self.step,
            self.state,
            self.head_position,
            self.memory
                .as_deref()
                .filter(|memory| !memory.is_empty())
                .unwrap_or("-"),
            self.tape_view
        )
    }
}

/// The final record of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Execution {
    pub accepted: bool,
    pub halted: bool,
    #[serde(rename = "reason")]
    pub outcome: Outcome,
    /// Completed transitions, not counting the initial snapshot.
    pub steps: usize,
    /// Snapshots from step 0 onwards. Empty unless tracing was requested.
    pub ids: Vec<InstantaneousDescription>,
}

impl Execution {
    fn new(outcome: Outcome, steps: usize, ids: Vec<InstantaneousDescription>) -> Self {
        Self {
            accepted: outcome.is_accepted(),
            halted: outcome.is_halted(),
            outcome,
            steps,
            ids,
        }
    }

    pub fn reason(&self) -> &'static str {
        self.outcome.reason()
    }
}

/// A deterministic single-tape Turing machine.
///
/// The transition table is built once and shared read-only by every run, so a machine can be
/// used from several threads at once.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    spec: MachineSpec,
    table: TransitionTable,
}

impl TuringMachine {
    /// Creates a machine from an already validated specification.
    pub fn new(spec: MachineSpec) -> Self {
        let table = TransitionTable::new(&spec.transitions);
        tracing::debug!(
            machine = %spec.name,
            states = spec.states.len(),
            rules = table.len(),
            "built transition table"
        );

        Self { spec, table }
    }

    pub fn spec(&self) -> &MachineSpec {
        &self.spec
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Starts a fresh run over `input` without executing any step.
    pub fn start(&self, input: &str) -> Run<'_> {
        Run::new(self, input)
    }

    /// Runs `input` until the machine accepts, rejects, or exhausts `options.max_steps`.
    ///
    /// The result is a pure function of the specification, the input and the options.
    pub fn run(&self, input: &str, options: &SimulationOptions) -> Execution {
        let mut run = self.start(input);
        let mut ids = Vec::new();

        let mut capture = |run: &Run<'_>| {
            if options.capture_trace {
                ids.push(run.snapshot(options.tape_radius));
            }
        };

        tracing::debug!(machine = %self.spec.name, input, max_steps = options.max_steps, "run started");
        capture(&run);

        while run.steps() < options.max_steps {
            match run.step() {
                Step::Continue => capture(&run),
                Step::Halt(outcome) => return run.finish(outcome, ids),
            }

            if run.is_accepting() {
                return run.finish(Outcome::Accepted, ids);
            }
        }

        run.finish(Outcome::StepLimit, ids)
    }
}

/// The mutable configuration of a single run.
///
/// Owned exclusively by the code driving the run; nothing in here is shared with other runs.
#[derive(Debug, Clone)]
pub struct Run<'m> {
    machine: &'m TuringMachine,
    tape: Tape,
    state: String,
    head: i64,
    memory: Option<String>,
    steps: usize,
}

impl<'m> Run<'m> {
    /// Places `input` on a fresh tape with the head on cell 0 and the machine in its initial
    /// state and memory.
    pub fn new(machine: &'m TuringMachine, input: &str) -> Self {
        let spec = &machine.spec;
        Self {
            machine,
            tape: Tape::new(spec.blank, input),
            state: spec.initial_state.clone(),
            head: 0,
            memory: spec.initial_memory().map(str::to_string),
            steps: 0,
        }
    }

    /// Reads, resolves, writes, moves and transitions once.
    ///
    /// When no rule applies the configuration is left untouched and the halt outcome depends
    /// only on whether the current state is final.
    pub fn step(&mut self) -> Step {
        let machine = self.machine;
        let symbol = self.tape.read(self.head);
        let Some(transition) = machine
            .table
            .resolve(&self.state, symbol, self.memory.as_deref())
        else {
            return Step::Halt(if self.is_accepting() {
                Outcome::Accepted
            } else {
                Outcome::NoTransition
            });
        };

        tracing::trace!(
            step = self.steps + 1,
            from = %self.state,
            to = %transition.to_state,
            read = %symbol,
            write = %transition.write,
            direction = ?transition.direction,
            "transition"
        );

        self.tape.write(self.head, transition.write);
        self.head += transition.direction.offset();
        self.state.clone_from(&transition.to_state);
        if let Some(memory) = &transition.to_memory {
            self.memory = Some(memory.clone());
        }
        self.steps += 1;

        Step::Continue
    }

    /// Captures the current configuration.
    pub fn snapshot(&self, radius: usize) -> InstantaneousDescription {
        InstantaneousDescription {
            step: self.steps,
            state: self.state.clone(),
            head_position: self.head,
            tape_view: self.tape.render(self.head, radius),
            memory: self.memory.clone(),
        }
    }

    /// Whether the current state is one of the machine's final states.
    pub fn is_accepting(&self) -> bool {
        self.machine.spec.is_final(&self.state)
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    pub fn memory(&self) -> Option<&str> {
        self.memory.as_deref()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    fn finish(self, outcome: Outcome, ids: Vec<InstantaneousDescription>) -> Execution {
        tracing::debug!(
            state = %self.state,
            steps = self.steps,
            reason = outcome.reason(),
            "run finished"
        );
        Execution::new(outcome, self.steps, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Memory, Transition};

    fn rule(
        from: &str,
        read: char,
        to: &str,
        write: char,
        direction: Direction,
    ) -> Transition {
        Transition {
            from_state: from.into(),
            read,
            from_memory: None,
            to_state: to.into(),
            write,
            direction,
            to_memory: None,
        }
    }

    fn machine(final_states: &[&str], transitions: Vec<Transition>) -> TuringMachine {
        TuringMachine::new(MachineSpec {
            name: "test".into(),
            states: vec!["q0".into(), "q1".into(), "qf".into()],
            initial_state: "q0".into(),
            final_states: final_states.iter().map(|s| s.to_string()).collect(),
            input_alphabet: vec!['0', '1', 'a'],
            tape_alphabet: vec!['0', '1', 'a', '_'],
            blank: '_',
            memory: None,
            transitions,
            simulation_strings: Vec::new(),
        })
    }

    fn unary_machine() -> TuringMachine {
        machine(&["qf"], vec![rule("q0", '1', "qf", '1', Direction::Stay)])
    }

    fn options(max_steps: usize) -> SimulationOptions {
        SimulationOptions {
            max_steps,
            ..SimulationOptions::default()
        }
    }

    #[test]
    fn test_accepts_on_final_state() {
        let result = unary_machine().run("1", &SimulationOptions::default());

        assert!(result.accepted);
        assert!(result.halted);
        assert_eq!(result.steps, 1);
        assert_eq!(result.reason(), "final state reached");
        assert_eq!(result.ids.len(), 2);
    }

    #[test]
    fn test_rejects_without_transition() {
        let result = unary_machine().run("2", &SimulationOptions::default());

        assert!(!result.accepted);
        assert!(result.halted);
        assert_eq!(result.steps, 0);
        assert_eq!(result.outcome, Outcome::NoTransition);
        assert_eq!(result.reason(), "no transition defined");
        assert_eq!(result.ids.len(), 1);
    }

    #[test]
    fn test_step_limit_is_not_a_halt() {
        let machine = machine(&[], vec![rule("q0", 'a', "q0", 'a', Direction::Stay)]);
        let result = machine.run("a", &options(5));

        assert!(!result.accepted);
        assert!(!result.halted);
        assert_eq!(result.steps, 5);
        assert_eq!(result.reason(), "step limit reached");
        assert_eq!(result.ids.len(), 6);
    }

    #[test]
    fn test_step_limit_on_blank_loop() {
        let machine = machine(&[], vec![rule("q0", '_', "q0", '_', Direction::Left)]);
        let result = machine.run("", &options(3));

        assert_eq!(result.outcome, Outcome::StepLimit);
        assert_eq!(result.steps, 3);
        assert_eq!(result.ids.last().unwrap().head_position, -3);
    }

    #[test]
    fn test_zero_step_budget() {
        let result = unary_machine().run("1", &options(0));

        assert_eq!(result.outcome, Outcome::StepLimit);
        assert_eq!(result.steps, 0);
        assert_eq!(result.ids.len(), 1);
    }

    #[test]
    fn test_specific_memory_rule_wins() {
        let mut transitions = vec![rule("q0", '0', "q1", '0', Direction::Right)];
        transitions.push(Transition {
            from_memory: Some("seen".into()),
            ..rule("q0", '0', "qf", '0', Direction::Stay)
        });

        let mut machine = machine(&["qf"], transitions);
        machine.spec.memory = Some(Memory {
            alphabet: Some(vec!["seen".into(), "unseen".into()]),
            initial: "seen".into(),
        });

        let result = machine.run("0", &SimulationOptions::default());

        assert!(result.accepted);
        assert_eq!(result.steps, 1);
        assert_eq!(result.ids[0].memory.as_deref(), Some("seen"));
    }

    #[test]
    fn test_memory_update_and_keep() {
        let transitions = vec![
            Transition {
                to_memory: Some("one".into()),
                ..rule("q0", '1', "q1", 'x', Direction::Right)
            },
            Transition {
                from_memory: Some("one".into()),
                ..rule("q1", '0', "qf", 'y', Direction::Right)
            },
        ];

        let mut machine = machine(&["qf"], transitions);
        machine.spec.memory = Some(Memory {
            alphabet: Some(vec!["zero".into(), "one".into()]),
            initial: "zero".into(),
        });

        let result = machine.run("10", &SimulationOptions::default());

        assert!(result.accepted);
        assert_eq!(result.steps, 2);
        let memories: Vec<_> = result.ids.iter().map(|id| id.memory.clone()).collect();
        assert_eq!(
            memories,
            vec![Some("zero".into()), Some("one".into()), Some("one".into())]
        );
    }

    #[test]
    fn test_empty_input_reads_blank() {
        let machine = machine(&["qf"], vec![rule("q0", '_', "qf", '_', Direction::Stay)]);
        let result = machine.run("", &SimulationOptions::default());

        assert!(result.accepted);
        assert_eq!(result.steps, 1);
        assert!(result.ids[0].tape_view.contains("[_]"));
    }

    #[test]
    fn test_later_duplicate_rule_is_used() {
        let machine = machine(
            &["qf"],
            vec![
                rule("q0", '1', "q1", '1', Direction::Stay),
                rule("q0", '1', "qf", '0', Direction::Stay),
            ],
        );
        let result = machine.run("1", &SimulationOptions::default());

        assert!(result.accepted);
        assert!(result.ids[1].tape_view.contains("[0]"));
    }

    #[test]
    fn test_acceptance_ignores_unread_input() {
        let machine = machine(&["qf"], vec![rule("q0", '1', "qf", '1', Direction::Left)]);
        let result = machine.run("1111", &SimulationOptions::default());

        assert!(result.accepted);
        assert_eq!(result.steps, 1);
        assert_eq!(result.ids[1].head_position, -1);
    }

    #[test]
    fn test_starting_in_final_state_without_rule_accepts() {
        let machine = machine(&["q0"], Vec::new());
        let result = machine.run("1", &SimulationOptions::default());

        assert!(result.accepted);
        assert!(result.halted);
        assert_eq!(result.steps, 0);
    }

    #[test]
    fn test_trace_disabled() {
        let result = unary_machine().run(
            "1",
            &SimulationOptions {
                capture_trace: false,
                ..SimulationOptions::default()
            },
        );

        assert!(result.accepted);
        assert!(result.ids.is_empty());
    }

    #[test]
    fn test_run_is_deterministic() {
        let machine = machine(
            &["qf"],
            vec![
                rule("q0", '0', "q0", '1', Direction::Right),
                rule("q0", '1', "q0", '0', Direction::Right),
                rule("q0", '_', "qf", '_', Direction::Left),
            ],
        );

        let first = machine.run("0110", &SimulationOptions::default());
        let second = machine.run("0110", &SimulationOptions::default());

        assert_eq!(first, second);
        assert_eq!(first.steps, 5);
        assert_eq!(first.ids.len(), first.steps + 1);
    }

    #[test]
    fn test_stepwise_run() {
        let machine = unary_machine();
        let mut run = machine.start("1");

        assert_eq!(run.state(), "q0");
        assert_eq!(run.step(), Step::Continue);
        assert_eq!(run.state(), "qf");
        assert!(run.is_accepting());
        assert_eq!(run.step(), Step::Halt(Outcome::Accepted));
        assert_eq!(run.steps(), 1);
        assert_eq!(run.head(), 0);
        assert_eq!(run.memory(), None);
        assert_eq!(run.tape().read(0), '1');
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = InstantaneousDescription {
            step: 7,
            state: "q1".into(),
            head_position: -2,
            tape_view: "[a]b".into(),
            memory: None,
        };

        assert_eq!(
            snapshot.to_string(),
            "Step 0007: state=q1, head=-2, memory=-\n  tape: [a]b"
        );

        let with_memory = InstantaneousDescription {
            memory: Some("seen".into()),
            ..snapshot.clone()
        };
        assert!(with_memory.to_string().contains("memory=seen"));

        let empty_memory = InstantaneousDescription {
            memory: Some(String::new()),
            ..snapshot
        };
        assert!(empty_memory.to_string().contains("memory=-\n"));
    }

    #[test]
    fn test_execution_json_shape() {
        let result = unary_machine().run("2", &SimulationOptions::default());
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["accepted"], false);
        assert_eq!(json["halted"], true);
        assert_eq!(json["reason"], "no transition defined");
        assert_eq!(json["steps"], 0);
        assert_eq!(json["ids"][0]["state"], "q0");
        assert_eq!(json["ids"][0]["head_position"], 0);
        assert!(json["ids"][0]["memory"].is_null());
    }
}

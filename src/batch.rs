//! Runs a machine over many input strings.

use std::num::NonZeroUsize;
use std::thread;

use indexmap::IndexMap;

use crate::machine::{Execution, TuringMachine};
use crate::types::SimulationOptions;

/// Results keyed by input string, iterated in the order inputs were first given.
///
/// An input that appears more than once keeps its first position but only its last result.
pub type Results = IndexMap<String, Execution>;

impl TuringMachine {
    /// Runs every input independently, one after another.
    pub fn simulate<S: AsRef<str>>(&self, inputs: &[S], options: &SimulationOptions) -> Results {
        let mut results = Results::with_capacity(inputs.len());
        for input in inputs {
            let input = input.as_ref();
            results.insert(input.to_string(), self.run(input, options));
        }

        results
    }

    /// Runs every input on a pool of scoped threads sharing this machine read-only.
    ///
    /// Produces exactly what [`simulate`](Self::simulate) produces for the same arguments.
    pub fn simulate_parallel<S: AsRef<str> + Sync>(
        &self,
        inputs: &[S],
        options: &SimulationOptions,
    ) -> Results {
        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
            .min(inputs.len());

        if workers <= 1 {
            return self.simulate(inputs, options);
        }

        let chunk_size = inputs.len().div_ceil(workers);
        tracing::debug!(inputs = inputs.len(), workers, "simulating in parallel");

        let executions: Vec<Execution> = thread::scope(|scope| {
            let handles: Vec<_> = inputs
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|input| self.run(input.as_ref(), options))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(chunk) => chunk,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        let mut results = Results::with_capacity(inputs.len());
        for (input, execution) in inputs.iter().zip(executions) {
            results.insert(input.as_ref().to_string(), execution);
        }

        results
    }
}

//! The immutable transition lookup used by every run of a machine.

use std::collections::HashMap;

use crate::types::Transition;

/// Rules that share a `(state, symbol)` pair.
#[derive(Debug, Clone, Default)]
struct RuleSlot {
    exact: HashMap<String, Transition>,
    wildcard: Option<Transition>,
}

/// Maps `(state, symbol, memory)` to a transition rule.
///
/// Built once per machine and shared read-only between runs. Resolution prefers a rule that
/// names the current register value over one that applies to any value.
#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    rules: HashMap<String, HashMap<char, RuleSlot>>,
    len: usize,
}

impl TransitionTable {
    /// Indexes `transitions` in declaration order.
    ///
    /// A rule whose key collides with an earlier one replaces it.
    pub fn new<'a>(transitions: impl IntoIterator<Item = &'a Transition>) -> Self {
        let mut table = Self::default();

        for transition in transitions {
            let slot = table
                .rules
                .entry(transition.from_state.clone())
                .or_default()
                .entry(transition.read)
                .or_default();

            let replaced = match &transition.from_memory {
                Some(memory) => slot
                    .exact
                    .insert(memory.clone(), transition.clone())
                    .is_some(),
                None => slot.wildcard.replace(transition.clone()).is_some(),
            };

            if replaced {
                tracing::debug!(
                    state = %transition.from_state,
                    symbol = %transition.read,
                    memory = ?transition.from_memory,
                    "transition overrides an earlier rule with the same key"
                );
            } else {
                table.len += 1;
            }
        }

        table
    }

    /// Finds the rule for `state` reading `symbol` while the register holds `memory`.
    ///
    /// A rule for the exact register value wins; otherwise the wildcard rule for the same
    /// `(state, symbol)` applies. Machines without a register pass `None` and only ever see
    /// wildcard rules.
    pub fn resolve(&self, state: &str, symbol: char, memory: Option<&str>) -> Option<&Transition> {
        let slot = self.rules.get(state)?.get(&symbol)?;

        memory
            .and_then(|value| slot.exact.get(value))
            .or(slot.wildcard.as_ref())
    }

    /// The number of distinct keys in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

//! A sparse tape that is unbounded in both directions.

use std::collections::HashMap;

/// An infinite tape indexed by the integers.
///
/// Only cells that were initialised from the input or written by the machine are stored;
/// every other cell holds the blank symbol. The tape also tracks the leftmost and rightmost
/// touched positions so that rendering covers everything the machine has produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: HashMap<i64, char>,
    blank: char,
    min: i64,
    max: i64,
}

impl Tape {
    /// Creates a tape holding `input` in cells `0..input.len()`.
    ///
    /// An empty input materialises cell 0 as `blank`.
    pub fn new(blank: char, input: &str) -> Self {
        let mut cells = HashMap::new();
        let mut max = 0;

        for (index, symbol) in (0..).zip(input.chars()) {
            cells.insert(index, symbol);
            max = index;
        }

        if cells.is_empty() {
            cells.insert(0, blank);
        }

        Self {
            cells,
            blank,
            min: 0,
            max,
        }
    }

    /// Returns the symbol at `position`, or the blank symbol if it was never written.
    pub fn read(&self, position: i64) -> char {
        self.cells.get(&position).copied().unwrap_or(self.blank)
    }

    /// Stores `symbol` at `position`, widening the touched bounds if needed.
    pub fn write(&mut self, position: i64, symbol: char) {
        self.cells.insert(position, symbol);
        self.min = self.min.min(position);
        self.max = self.max.max(position);
    }

    /// Returns the blank symbol of this tape.
    pub fn blank(&self) -> char {
        self.blank
    }

    /// The leftmost and rightmost touched positions, inclusive.
    pub fn bounds(&self) -> (i64, i64) {
        (self.min, self.max)
    }

    /// Iterates over the touched span from left to right as `(position, symbol)` pairs.
    pub fn cells(&self) -> impl Iterator<Item = (i64, char)> + '_ {
        (self.min..=self.max).map(move |position| (position, self.read(position)))
    }

    /// Renders the tape around `head`.
    ///
    /// The window spans from `min(min_touched, head - radius)` to
    /// `max(max_touched, head + radius)`, with the head cell wrapped in brackets.
    pub fn render(&self, head: i64, radius: usize) -> String {
        let radius = i64::try_from(radius).unwrap_or(i64::MAX);
        let start = self.min.min(head.saturating_sub(radius));
        let end = self.max.max(head.saturating_add(radius));

        let mut view = String::new();
        for position in start..=end {
            let symbol = self.read(position);
            if position == head {
                view.push('[');
                view.push(symbol);
                view.push(']');
            } else {
                view.push(symbol);
            }
        }

        view
    }
}

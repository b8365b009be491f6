#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rule::RuleId;

/// Handle into a level's sequence table.
pub type SequenceId = usize;

/// A closed run of rules at one level. Becomes a single entry one level up.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sequence {
    pub rules: Vec<RuleId>,
    pub contains_goal: bool,
}

impl Sequence {
    pub fn last_rule(&self) -> Option<RuleId> {
        self.rules.last().copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Closed sequences of a level plus the buffer currently being filled.
#[derive(Debug, Clone, Default)]
pub struct SequenceTable {
    closed: Vec<Sequence>,
    open: Vec<RuleId>,
    last_goal: Option<SequenceId>,
}

/// Result of closing the working buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedSequence {
    pub id: SequenceId,
    pub reused: bool,
    pub contains_goal: bool,
}

impl SequenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SequenceId) -> Option<&Sequence> {
        self.closed.get(id)
    }

    pub fn closed(&self) -> &[Sequence] {
        &self.closed
    }

    pub fn open(&self) -> &[RuleId] {
        &self.open
    }

    /// Most recently closed goal-terminated sequence.
    pub fn last_goal(&self) -> Option<SequenceId> {
        self.last_goal
    }

    pub fn push_open(&mut self, rule: RuleId) {
        self.open.push(rule);
    }

    /// Close the working buffer. An identical closed sequence (same rule
    /// handles in the same order) is reused instead of stored twice.
    ///
    /// The new buffer is seeded with `seed` when given.
    pub fn close(&mut self, contains_goal: bool, seed: Option<RuleId>) -> ClosedSequence {
        let rules = core::mem::take(&mut self.open);
        if let Some(rule) = seed {
            self.open.push(rule);
        }

        let existing = self.closed.iter().position(|s| s.rules == rules);
        let (id, reused) = match existing {
            Some(id) => (id, true),
            None => {
                self.closed.push(Sequence {
                    rules,
                    contains_goal,
                });
                (self.closed.len() - 1, false)
            }
        };

        let contains_goal = self.closed[id].contains_goal;
        if contains_goal {
            self.last_goal = Some(id);
        }

        ClosedSequence {
            id,
            reused,
            contains_goal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_stores_new_sequences_and_reuses_duplicates() {
        let mut table = SequenceTable::new();
        table.push_open(0);
        table.push_open(1);
        let first = table.close(true, None);
        assert_eq!(first.id, 0);
        assert!(!first.reused);
        assert!(table.open().is_empty());

        table.push_open(0);
        table.push_open(1);
        let second = table.close(true, None);
        assert_eq!(second.id, 0);
        assert!(second.reused);
        assert_eq!(table.closed().len(), 1);
        assert_eq!(table.last_goal(), Some(0));
    }

    #[test]
    fn close_seeds_next_buffer() {
        let mut table = SequenceTable::new();
        table.push_open(4);
        table.push_open(7);
        let closed = table.close(false, Some(7));
        assert!(!closed.contains_goal);
        assert_eq!(table.open(), &[7]);
        assert_eq!(table.last_goal(), None);
    }

    #[test]
    fn different_order_is_a_different_sequence() {
        let mut table = SequenceTable::new();
        table.push_open(1);
        table.push_open(2);
        table.close(false, None);
        table.push_open(2);
        table.push_open(1);
        let closed = table.close(false, None);
        assert!(!closed.reused);
        assert_eq!(table.closed().len(), 2);
    }
}

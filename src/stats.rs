//! Per-kind outcome counters returned by undo, redo and batch deletes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::EntityKind;

/// Outcome of one processed journal entry or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// A row was (re)inserted.
    Created,
    /// A row was rewritten.
    Modified,
    /// A row was removed.
    Deleted,
    /// The store refused the write.
    Error,
}

impl Outcome {
    /// All outcomes in declaration order.
    pub const ALL: [Outcome; 4] = [
        Outcome::Created,
        Outcome::Modified,
        Outcome::Deleted,
        Outcome::Error,
    ];

    const fn index(self) -> usize {
        match self {
            Outcome::Created => 0,
            Outcome::Modified => 1,
            Outcome::Deleted => 2,
            Outcome::Error => 3,
        }
    }
}

/// Counts of outcomes per entity kind.
///
/// Callers start from a zeroed value; the controllers only ever increment,
/// so counts recorded before an error stay visible afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    counts: [[u32; 4]; 5],
}

impl Statistics {
    /// Zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for one `(kind, outcome)` cell.
    pub fn count(&self, kind: EntityKind, outcome: Outcome) -> u32 {
        self.counts[kind.index()][outcome.index()]
    }

    /// Adds one to a cell.
    pub fn inc(&mut self, kind: EntityKind, outcome: Outcome) {
        self.add(kind, outcome, 1);
    }

    /// Adds `n` to a cell.
    pub fn add(&mut self, kind: EntityKind, outcome: Outcome, n: u32) {
        let cell = &mut self.counts[kind.index()][outcome.index()];
        *cell = cell.saturating_add(n);
    }

    /// Adds every cell of `other` into `self`.
    pub fn merge(&mut self, other: &Statistics) {
        for kind in EntityKind::ALL {
            for outcome in Outcome::ALL {
                self.add(kind, outcome, other.count(kind, outcome));
            }
        }
    }

    /// Sum over all kinds for one outcome.
    pub fn total_of(&self, outcome: Outcome) -> u32 {
        EntityKind::ALL
            .iter()
            .map(|k| self.count(*k, outcome))
            .sum()
    }

    /// Sum of all cells, errors included.
    pub fn total(&self) -> u32 {
        self.counts.iter().flatten().sum()
    }

    /// True when nothing was counted.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Zeroes every cell.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        f.write_str("{")?;
        for kind in EntityKind::ALL {
            for outcome in Outcome::ALL {
                let n = self.count(kind, outcome);
                if n == 0 {
                    continue;
                }
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{kind}:{outcome:?}={n}")?;
                first = false;
            }
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_and_display() {
        let mut stat = Statistics::new();
        assert!(stat.is_empty());
        assert_eq!(stat.to_string(), "{}");

        stat.inc(EntityKind::Classifier, Outcome::Deleted);
        stat.inc(EntityKind::DiagramElement, Outcome::Deleted);
        stat.inc(EntityKind::Feature, Outcome::Error);

        assert_eq!(stat.total(), 3);
        assert_eq!(stat.total_of(Outcome::Deleted), 2);
        assert_eq!(stat.count(EntityKind::Classifier, Outcome::Created), 0);
        assert_eq!(
            stat.to_string(),
            "{diagramelement:Deleted=1, classifier:Deleted=1, feature:Error=1}"
        );

        let mut sum = Statistics::new();
        sum.merge(&stat);
        sum.merge(&stat);
        assert_eq!(sum.count(EntityKind::Classifier, Outcome::Deleted), 2);

        sum.reset();
        assert!(sum.is_empty());
    }
}

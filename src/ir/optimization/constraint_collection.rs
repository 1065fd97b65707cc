use serde::{Deserialize, Serialize};
use tracing::debug;

use super::super::node::{ChangeTag, SourceRef};

/// One rewrite reported by a node during optimization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub pass: usize,
    pub tag: ChangeTag,
    pub source_ref: SourceRef,
    pub message: String,
}

/// Facts threaded through every simplification call of a run.
///
/// Node rules only forward it to the receivers they delegate to; the driver
/// uses it to count and trace changes per pass.
#[derive(Debug, Default)]
pub struct ConstraintCollection {
    pass: usize,
    changes_in_pass: usize,
    record_changes: bool,
    changes: Vec<ChangeRecord>,
}

impl ConstraintCollection {
    pub fn new(record_changes: bool) -> Self {
        ConstraintCollection {
            record_changes,
            ..Default::default()
        }
    }

    /// Starts a new pass and resets the per-pass change counter.
    pub fn start_pass(&mut self) {
        self.pass += 1;
        self.changes_in_pass = 0;
    }

    pub fn on_change(&mut self, tag: ChangeTag, source_ref: &SourceRef, message: &str) {
        debug!("{} [{}] {}", source_ref, tag, message);
        self.changes_in_pass += 1;
        if self.record_changes {
            self.changes.push(ChangeRecord {
                pass: self.pass,
                tag,
                source_ref: source_ref.clone(),
                message: message.to_string(),
            });
        }
    }

    pub fn pass(&self) -> usize {
        self.pass
    }

    pub fn changes_in_pass(&self) -> usize {
        self.changes_in_pass
    }

    pub fn changes(&self) -> &[ChangeRecord] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<ChangeRecord> {
        self.changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_counted_per_pass() {
        let location = SourceRef::new("facts.py", 1);
        let mut collection = ConstraintCollection::new(true);
        collection.start_pass();
        collection.on_change(ChangeTag::Rewritten, &location, "first");
        collection.on_change(ChangeTag::ConstantFolded, &location, "second");
        assert_eq!(collection.changes_in_pass(), 2);

        collection.start_pass();
        assert_eq!(collection.pass(), 2);
        assert_eq!(collection.changes_in_pass(), 0);
        assert_eq!(collection.changes().len(), 2);
        assert_eq!(collection.changes()[1].pass, 1);
    }

    #[test]
    fn test_recording_can_be_disabled() {
        let mut collection = ConstraintCollection::new(false);
        collection.start_pass();
        collection.on_change(ChangeTag::Rewritten, &SourceRef::new("facts.py", 2), "dropped");
        assert_eq!(collection.changes_in_pass(), 1);
        assert!(collection.into_changes().is_empty());
    }
}

//! Ordered collection of operation records

use std::sync::Arc;

use crate::error::TrackerError;
use crate::models::{Operation, OperationPatch, OperationStatus};

/// Action re-run when the user retries a failed operation
pub type RetryHandler = Arc<dyn Fn() + Send + Sync>;

struct Entry {
    operation: Operation,
    retry: Option<RetryHandler>,
}

/// A status transition caused by a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before
    pub from: OperationStatus,
    /// Status after
    pub to: OperationStatus,
}

impl StatusChange {
    /// The record just became successful
    pub fn entered_success(&self) -> bool {
        self.from != OperationStatus::Success && self.to == OperationStatus::Success
    }

    /// The record was successful and no longer is
    pub fn left_success(&self) -> bool {
        self.from == OperationStatus::Success && self.to != OperationStatus::Success
    }
}

/// Insertion-ordered operation records with unique ids
#[derive(Default)]
pub struct OperationList {
    entries: Vec<Entry>,
}

impl OperationList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Fails if the id is already present.
    pub fn add(
        &mut self,
        mut operation: Operation,
        retry: Option<RetryHandler>,
    ) -> Result<(), TrackerError> {
        if self.contains(&operation.id) {
            return Err(TrackerError::DuplicateId(operation.id));
        }
        operation.retryable = retry.is_some();
        self.entries.push(Entry { operation, retry });
        Ok(())
    }

    /// Merge a patch into the record with this id.
    ///
    /// Returns the status change, or `None` if the id is unknown.
    pub fn update(&mut self, id: &str, patch: &OperationPatch) -> Option<StatusChange> {
        let entry = self.entry_mut(id)?;
        let from = entry.operation.status;
        entry.operation.apply(patch);
        Some(StatusChange {
            from,
            to: entry.operation.status,
        })
    }

    /// Delete the record with this id, returning it if it existed
    pub fn remove(&mut self, id: &str) -> Option<Operation> {
        let idx = self.entries.iter().position(|e| e.operation.id == id)?;
        Some(self.entries.remove(idx).operation)
    }

    /// Move a failed record back to loading and hand out its retry handler.
    ///
    /// Returns `None` (and changes nothing) unless the record exists, is in
    /// `error`, and has a handler bound.
    pub fn retry(&mut self, id: &str) -> Option<RetryHandler> {
        let entry = self.entry_mut(id)?;
        if entry.operation.status != OperationStatus::Error {
            return None;
        }
        let handler = entry.retry.clone()?;
        entry.operation.status = OperationStatus::Loading;
        Some(handler)
    }

    /// Remove the record only if it is still successful
    pub fn expire(&mut self, id: &str) -> bool {
        let still_success = self
            .get(id)
            .is_some_and(|op| op.status == OperationStatus::Success);
        still_success && self.remove(id).is_some()
    }

    /// Look up a record
    pub fn get(&self, id: &str) -> Option<&Operation> {
        self.entries
            .iter()
            .find(|e| e.operation.id == id)
            .map(|e| &e.operation)
    }

    /// Is this id tracked?
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the list empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records in insertion order
    pub fn snapshot(&self) -> Vec<Operation> {
        self.entries.iter().map(|e| e.operation.clone()).collect()
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.operation.id == id)
    }
}

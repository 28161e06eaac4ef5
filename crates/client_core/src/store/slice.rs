use shared::{
    domain::{Record, ResourceKind},
    protocol::Registration,
};
use tracing::{debug, warn};

use super::status::{
    AsyncStatus, Change, Operation, OperationState, Phase, SliceAction, StatusTracker,
};
use crate::error::{ClientError, ClientResult};

/// One resource collection plus the lifecycle state of its operations.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSlice<T: Record> {
    items: Vec<T>,
    tracker: StatusTracker,
}

impl<T: Record> Default for CollectionSlice<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            tracker: StatusTracker::default(),
        }
    }
}

impl<T: Record> CollectionSlice<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.get(id).is_some()
    }

    pub fn find(&self, resource: ResourceKind, id: &T::Id) -> ClientResult<&T> {
        self.get(id)
            .ok_or_else(|| ClientError::not_found(resource, id))
    }

    pub fn status(&self) -> AsyncStatus {
        self.tracker.status()
    }

    pub fn is_loading(&self) -> bool {
        self.status() == AsyncStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        self.tracker.error()
    }

    pub fn operation(&self, op: Operation) -> OperationState {
        self.tracker.operation(op)
    }

    /// Returns whether the action changed the slice.
    pub fn reduce(&mut self, action: SliceAction<T>) -> bool {
        let SliceAction {
            op,
            generation,
            phase,
        } = action;
        match phase {
            Phase::Pending => self.tracker.on_pending(op, generation),
            Phase::Fulfilled(change) => {
                let replaces_all = matches!(change, Change::ReplaceAll(_));
                if replaces_all && self.tracker.is_stale(op, generation) {
                    debug!(op = op.as_str(), generation, "store: discarding stale fetch result");
                    return false;
                }
                self.apply(change);
                self.tracker.on_fulfilled(op, generation);
                true
            }
            Phase::Rejected(message) => self.tracker.on_rejected(op, generation, message),
            Phase::Cancelled => self.tracker.on_cancelled(op, generation),
        }
    }

    /// Merges a change without touching operation status.
    pub fn apply(&mut self, change: Change<T>) {
        match change {
            Change::ReplaceAll(items) => self.items = items,
            Change::Append(item) => match self.position(item.id()) {
                Some(index) => self.items[index] = item,
                None => self.items.push(item),
            },
            Change::Replace(item) => {
                let Some(index) = self.position(item.id()) else {
                    warn!(id = %item.id(), "store: update for a record not held locally");
                    return;
                };
                let id = item.id().clone();
                self.items[index] = item;
                let mut seen = false;
                self.items.retain(|existing| {
                    if existing.id() != &id {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            Change::Remove(id) => self.items.retain(|item| item.id() != &id),
        }
    }

    fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }
}

/// All registrations plus the pending ones awaiting review.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationsSlice {
    pub all: CollectionSlice<Registration>,
    pub pending: CollectionSlice<Registration>,
}

impl RegistrationsSlice {
    pub fn reduce(&mut self, action: SliceAction<Registration>) -> bool {
        match (action.op, &action.phase) {
            (Operation::FetchPending, _) => self.pending.reduce(action),
            (Operation::UpdateStatus, Phase::Fulfilled(Change::Replace(registration))) => {
                let registration = registration.clone();
                let changed = self.all.reduce(action);
                if registration.status.is_pending() {
                    self.pending.apply(Change::Append(registration));
                } else {
                    self.pending.apply(Change::Remove(registration.id));
                }
                changed
            }
            (Operation::Delete, Phase::Fulfilled(Change::Remove(id))) => {
                self.pending.apply(Change::Remove(id.clone()));
                self.all.reduce(action)
            }
            _ => self.all.reduce(action),
        }
    }
}

#[cfg(test)]
#[path = "../tests/slice_tests.rs"]
mod tests;

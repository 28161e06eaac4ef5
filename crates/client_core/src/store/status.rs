use std::collections::HashMap;

use shared::domain::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AsyncStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchAll,
    FetchPending,
    Create,
    Update,
    UpdateStatus,
    Delete,
}

impl Operation {
    pub fn is_read(self) -> bool {
        matches!(self, Self::FetchAll | Self::FetchPending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchAll => "fetch_all",
            Self::FetchPending => "fetch_pending",
            Self::Create => "create",
            Self::Update => "update",
            Self::UpdateStatus => "update_status",
            Self::Delete => "delete",
        }
    }
}

/// How a fulfilled payload merges into a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T: Record> {
    ReplaceAll(Vec<T>),
    Append(T),
    Replace(T),
    Remove(T::Id),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase<P> {
    Pending,
    Fulfilled(P),
    Rejected(String),
    Cancelled,
}

/// One lifecycle event of one thunk run against a slice.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceAction<T: Record> {
    pub op: Operation,
    pub generation: u64,
    pub phase: Phase<Change<T>>,
}

impl<T: Record> SliceAction<T> {
    pub fn pending(op: Operation, generation: u64) -> Self {
        Self {
            op,
            generation,
            phase: Phase::Pending,
        }
    }

    pub fn fulfilled(op: Operation, generation: u64, change: Change<T>) -> Self {
        Self {
            op,
            generation,
            phase: Phase::Fulfilled(change),
        }
    }

    pub fn rejected(op: Operation, generation: u64, message: impl Into<String>) -> Self {
        Self {
            op,
            generation,
            phase: Phase::Rejected(message.into()),
        }
    }

    pub fn cancelled(op: Operation, generation: u64) -> Self {
        Self {
            op,
            generation,
            phase: Phase::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationState {
    pub status: AsyncStatus,
    /// Generation of the most recently dispatched run.
    pub latest: u64,
}

/// Per-operation lifecycle bookkeeping shared by every slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusTracker {
    ops: HashMap<Operation, OperationState>,
    last_settled: AsyncStatus,
    error: Option<String>,
}

impl StatusTracker {
    pub fn status(&self) -> AsyncStatus {
        if self
            .ops
            .values()
            .any(|state| state.status == AsyncStatus::Loading)
        {
            AsyncStatus::Loading
        } else {
            self.last_settled
        }
    }

    pub fn operation(&self, op: Operation) -> OperationState {
        self.ops.get(&op).copied().unwrap_or_default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_stale(&self, op: Operation, generation: u64) -> bool {
        generation < self.operation(op).latest
    }

    pub fn on_pending(&mut self, op: Operation, generation: u64) -> bool {
        if self.is_stale(op, generation) {
            return false;
        }
        self.ops.insert(
            op,
            OperationState {
                status: AsyncStatus::Loading,
                latest: generation,
            },
        );
        self.error = None;
        true
    }

    pub fn on_fulfilled(&mut self, op: Operation, generation: u64) -> bool {
        self.settle(op, generation, AsyncStatus::Succeeded)
    }

    pub fn on_rejected(&mut self, op: Operation, generation: u64, message: String) -> bool {
        if !self.settle(op, generation, AsyncStatus::Failed) {
            return false;
        }
        self.error = Some(message);
        true
    }

    pub fn on_cancelled(&mut self, op: Operation, generation: u64) -> bool {
        if self.is_stale(op, generation) {
            return false;
        }
        let state = self.ops.entry(op).or_default();
        state.status = AsyncStatus::Idle;
        state.latest = generation;
        true
    }

    fn settle(&mut self, op: Operation, generation: u64, status: AsyncStatus) -> bool {
        if self.is_stale(op, generation) {
            return false;
        }
        self.ops.insert(
            op,
            OperationState {
                status,
                latest: generation,
            },
        );
        self.last_settled = status;
        true
    }
}

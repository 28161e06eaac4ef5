//! Client-side store: every slice plus UI state, mutated only through
//! [`StoreHandle::dispatch`].

use std::sync::Arc;

use shared::protocol::{
    AttendanceRecord, ClassSummary, EvaluationRecord, LessonSummary, ModuleSummary, NewsArticle,
    Registration, StudentSummary,
};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::ui_state::{AlertAction, ModalAction, UiState};

mod slice;
mod status;

pub use slice::{CollectionSlice, RegistrationsSlice};
pub use status::{
    AsyncStatus, Change, Operation, OperationState, Phase, SliceAction, StatusTracker,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    pub classes: CollectionSlice<ClassSummary>,
    pub students: CollectionSlice<StudentSummary>,
    pub modules: CollectionSlice<ModuleSummary>,
    pub lessons: CollectionSlice<LessonSummary>,
    pub attendances: CollectionSlice<AttendanceRecord>,
    pub evaluations: CollectionSlice<EvaluationRecord>,
    pub news: CollectionSlice<NewsArticle>,
    pub registrations: RegistrationsSlice,
    pub ui: UiState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Classes(SliceAction<ClassSummary>),
    Students(SliceAction<StudentSummary>),
    Modules(SliceAction<ModuleSummary>),
    Lessons(SliceAction<LessonSummary>),
    Attendances(SliceAction<AttendanceRecord>),
    Evaluations(SliceAction<EvaluationRecord>),
    News(SliceAction<NewsArticle>),
    Registrations(SliceAction<Registration>),
    Modal(ModalAction),
    Alert(AlertAction),
}

impl StoreEvent {
    pub fn slice_name(&self) -> &'static str {
        match self {
            Self::Classes(_) => "classes",
            Self::Students(_) => "students",
            Self::Modules(_) => "modules",
            Self::Lessons(_) => "lessons",
            Self::Attendances(_) => "attendances",
            Self::Evaluations(_) => "evaluations",
            Self::News(_) => "news",
            Self::Registrations(_) => "registrations",
            Self::Modal(_) => "modal",
            Self::Alert(_) => "alert",
        }
    }
}

impl Store {
    pub fn reduce(&mut self, event: StoreEvent) -> bool {
        match event {
            StoreEvent::Classes(action) => self.classes.reduce(action),
            StoreEvent::Students(action) => self.students.reduce(action),
            StoreEvent::Modules(action) => self.modules.reduce(action),
            StoreEvent::Lessons(action) => self.lessons.reduce(action),
            StoreEvent::Attendances(action) => self.attendances.reduce(action),
            StoreEvent::Evaluations(action) => self.evaluations.reduce(action),
            StoreEvent::News(action) => self.news.reduce(action),
            StoreEvent::Registrations(action) => self.registrations.reduce(action),
            StoreEvent::Modal(action) => self.ui.reduce_modal(action),
            StoreEvent::Alert(action) => self.ui.reduce_alert(action),
        }
    }
}

/// Shared owner of the store. Transitions are serialized by the write lock and
/// re-broadcast to subscribers after they are applied.
pub struct StoreHandle {
    state: RwLock<Store>,
    events: broadcast::Sender<StoreEvent>,
}

impl StoreHandle {
    pub fn new() -> Arc<Self> {
        Self::with_state(Store::default())
    }

    pub fn with_state(store: Store) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            state: RwLock::new(store),
            events,
        })
    }

    pub async fn dispatch(&self, event: StoreEvent) -> bool {
        let slice = event.slice_name();
        let changed = self.state.write().await.reduce(event.clone());
        debug!(slice, changed, "store: event dispatched");
        let _ = self.events.send(event);
        changed
    }

    pub async fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        let guard = self.state.read().await;
        f(&guard)
    }

    pub async fn snapshot(&self) -> Store {
        self.state.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

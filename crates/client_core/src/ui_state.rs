//! Modal and alert switchboard plus the toast presenter that consumes alerts.

use std::{sync::Arc, time::Duration};

use shared::{
    domain::ResourceKind,
    protocol::{
        AttendanceRecord, ClassSummary, EvaluationRecord, LessonSummary, ModuleSummary,
        NewsArticle, Registration, StudentSummary,
    },
};
use tokio::{
    sync::{broadcast, broadcast::error::RecvError, Mutex},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, warn};

use crate::{
    store::{StoreEvent, StoreHandle},
    ClientOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalKind {
    Add(ResourceKind),
    Edit(ResourceKind),
    View(ResourceKind),
    ConfirmDelete(ResourceKind),
}

impl ModalKind {
    pub fn resource(self) -> ResourceKind {
        match self {
            Self::Add(resource)
            | Self::Edit(resource)
            | Self::View(resource)
            | Self::ConfirmDelete(resource) => resource,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    pub resource: ResourceKind,
    pub id: String,
}

impl DeleteTarget {
    pub fn new(resource: ResourceKind, id: impl ToString) -> Self {
        Self {
            resource,
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ModalPayload {
    #[default]
    Empty,
    Class(ClassSummary),
    Student(StudentSummary),
    Module(ModuleSummary),
    Lesson(LessonSummary),
    Attendance(AttendanceRecord),
    Evaluation(EvaluationRecord),
    News(NewsArticle),
    Registration(Registration),
    Target(DeleteTarget),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenModal {
    pub kind: ModalKind,
    pub payload: ModalPayload,
}

/// At most one modal is open; opening another replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalState {
    open: Option<OpenModal>,
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn kind(&self) -> Option<ModalKind> {
        self.open.as_ref().map(|modal| modal.kind)
    }

    pub fn payload(&self) -> Option<&ModalPayload> {
        self.open.as_ref().map(|modal| &modal.payload)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalAction {
    Open { kind: ModalKind, payload: ModalPayload },
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(AlertKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(AlertKind::Error, message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertAction {
    Set(Alert),
    Clear,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub modal: ModalState,
    pub alert: Option<Alert>,
}

impl UiState {
    pub fn reduce_modal(&mut self, action: ModalAction) -> bool {
        match action {
            ModalAction::Open { kind, payload } => {
                self.modal.open = Some(OpenModal { kind, payload });
                true
            }
            ModalAction::Close => self.modal.open.take().is_some(),
        }
    }

    pub fn reduce_alert(&mut self, action: AlertAction) -> bool {
        match action {
            AlertAction::Set(alert) => {
                self.alert = Some(alert);
                true
            }
            AlertAction::Clear => self.alert.take().is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub alert: Alert,
    pub shown_at: Instant,
    pub expires_at: Instant,
}

/// Turns alerts into visible toasts. The same message is not shown twice in a
/// row until the store alert has been cleared.
#[derive(Debug)]
pub struct ToastPresenter {
    auto_close: Duration,
    last_shown: Option<String>,
    visible: Vec<Toast>,
}

impl ToastPresenter {
    pub fn new(auto_close: Duration) -> Self {
        Self {
            auto_close,
            last_shown: None,
            visible: Vec::new(),
        }
    }

    pub fn present(&mut self, alert: &Alert, now: Instant) -> Option<Toast> {
        if alert.message.is_empty() || self.last_shown.as_deref() == Some(alert.message.as_str())
        {
            return None;
        }
        self.last_shown = Some(alert.message.clone());
        let toast = Toast {
            alert: alert.clone(),
            shown_at: now,
            expires_at: now + self.auto_close,
        };
        self.visible.push(toast.clone());
        Some(toast)
    }

    pub fn acknowledge_clear(&mut self) {
        self.last_shown = None;
    }

    pub fn visible(&mut self, now: Instant) -> &[Toast] {
        self.visible.retain(|toast| toast.expires_at > now);
        &self.visible
    }
}

/// Background task that hands store alerts to the presenter and clears them.
pub struct AlertOrchestrator {
    presenter: Arc<Mutex<ToastPresenter>>,
    toasts: broadcast::Sender<Toast>,
    task: JoinHandle<()>,
}

impl AlertOrchestrator {
    pub fn spawn(store: Arc<StoreHandle>, options: &ClientOptions) -> Self {
        let presenter = Arc::new(Mutex::new(ToastPresenter::new(options.toast_auto_close)));
        let (toasts, _) = broadcast::channel(64);
        let mut events = store.subscribe();
        let handoff_delay = options.alert_handoff_delay;

        let task_presenter = Arc::clone(&presenter);
        let task_toasts = toasts.clone();
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(StoreEvent::Alert(AlertAction::Set(alert))) => {
                        let toast = task_presenter.lock().await.present(&alert, Instant::now());
                        match toast {
                            Some(toast) => {
                                debug!(message = %toast.alert.message, "alerts: toast shown");
                                let _ = task_toasts.send(toast);
                            }
                            None => {
                                debug!(message = %alert.message, "alerts: duplicate suppressed")
                            }
                        }
                        if handoff_delay.is_zero() {
                            tokio::task::yield_now().await;
                        } else {
                            tokio::time::sleep(handoff_delay).await;
                        }
                        store.dispatch(StoreEvent::Alert(AlertAction::Clear)).await;
                    }
                    Ok(StoreEvent::Alert(AlertAction::Clear)) => {
                        task_presenter.lock().await.acknowledge_clear();
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "alerts: store event stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self {
            presenter,
            toasts,
            task,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.toasts.subscribe()
    }

    pub async fn visible(&self) -> Vec<Toast> {
        self.presenter.lock().await.visible(Instant::now()).to_vec()
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for AlertOrchestrator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "tests/ui_state_tests.rs"]
mod tests;

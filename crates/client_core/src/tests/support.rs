use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{
    domain::{AttendanceStatus, RegistrationStatus, Role},
    protocol::{
        AttendanceRecord, ClassSummary, LessonSummary, ModuleSummary, NewsArticle, Registration,
        StudentSummary,
    },
};
use tokio::sync::Mutex;

use crate::{
    error::{ClientError, ClientResult},
    services::Services,
    store::StoreHandle,
    thunks::Dispatcher,
    transport::{ApiRequest, Method, Transport},
    ClientOptions,
};

struct Scripted {
    delay: Duration,
    result: ClientResult<Value>,
}

/// In-memory transport answering from per-route queues and recording every
/// request it receives.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

fn route_key(method: Method, path: &str) -> String {
    format!("{method:?} {path}")
}

fn request_key(request: &ApiRequest) -> String {
    let mut key = route_key(request.method, &request.path);
    if !request.query.is_empty() {
        let query: Vec<String> = request
            .query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        key.push('?');
        key.push_str(&query.join("&"));
    }
    key
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn push(&self, method: Method, path: &str, delay: Duration, result: ClientResult<Value>) {
        self.responses
            .lock()
            .await
            .entry(route_key(method, path))
            .or_default()
            .push_back(Scripted { delay, result });
    }

    /// `path` may carry a `?k=v` suffix matching the request query.
    pub(crate) async fn respond(&self, method: Method, path: &str, body: Value) {
        self.push(method, path, Duration::ZERO, Ok(body)).await;
    }

    pub(crate) async fn respond_after(
        &self,
        method: Method,
        path: &str,
        delay: Duration,
        body: Value,
    ) {
        self.push(method, path, delay, Ok(body)).await;
    }

    pub(crate) async fn fail(&self, method: Method, path: &str, status: u16, message: &str) {
        self.push(
            method,
            path,
            Duration::ZERO,
            Err(ClientError::request(Some(status), message)),
        )
        .await;
    }

    pub(crate) async fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().await.clone()
    }

    pub(crate) async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> ClientResult<Value> {
        let key = request_key(&request);
        self.requests.lock().await.push(request);
        let scripted = self
            .responses
            .lock()
            .await
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        let Some(scripted) = scripted else {
            return Err(ClientError::request(
                Some(404),
                format!("no scripted response for {key}"),
            ));
        };
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.result
    }
}

pub(crate) fn dispatcher_with(
    role: Role,
    transport: Arc<ScriptedTransport>,
    options: ClientOptions,
) -> Arc<Dispatcher> {
    let services = Services::new(transport);
    Dispatcher::new(StoreHandle::new(), services, role, options)
}

pub(crate) fn dispatcher(role: Role, transport: Arc<ScriptedTransport>) -> Arc<Dispatcher> {
    dispatcher_with(role, transport, ClientOptions::default())
}

pub(crate) fn data(value: Value) -> Value {
    json!({ "data": value })
}

pub(crate) fn class(id: &str, name: &str) -> ClassSummary {
    ClassSummary {
        id: id.into(),
        name: name.to_string(),
        description: None,
        start_date: None,
        end_date: None,
    }
}

pub(crate) fn student(id: &str, class: &str) -> StudentSummary {
    StudentSummary {
        id: id.into(),
        first_name: format!("First {id}"),
        last_name: format!("Last {id}"),
        email: None,
        class_id: Some(class.into()),
    }
}

pub(crate) fn module(id: &str, class: &str) -> ModuleSummary {
    ModuleSummary {
        id: id.into(),
        name: format!("Module {id}"),
        class_id: Some(class.into()),
    }
}

pub(crate) fn lesson(id: &str, module: &str) -> LessonSummary {
    LessonSummary {
        id: id.into(),
        title: format!("Lesson {id}"),
        module_id: module.into(),
        date: None,
    }
}

pub(crate) fn attendance(id: &str, student: &str, lesson: &str) -> AttendanceRecord {
    AttendanceRecord {
        id: id.into(),
        student: student.into(),
        lesson: lesson.into(),
        status: AttendanceStatus::Present,
        note: None,
    }
}

pub(crate) fn news(id: &str, title: &str) -> NewsArticle {
    NewsArticle {
        id: id.into(),
        title: title.to_string(),
        content: String::new(),
        image_url: None,
        published: true,
        created_at: None,
    }
}

pub(crate) fn registration(id: &str, status: RegistrationStatus) -> Registration {
    Registration {
        id: id.into(),
        first_name: "Ada".to_string(),
        last_name: format!("Applicant {id}"),
        email: format!("{id}@example.test"),
        phone: None,
        class_id: None,
        status,
        note: None,
        created_at: None,
    }
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).expect("fixture serializes")
}

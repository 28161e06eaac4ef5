//! Thunks: call a service, emit pending/fulfilled/rejected for the target
//! slice and return the service result to the caller.
//!
//! Every run draws a fresh generation so slices can discard results of runs
//! that were superseded before they completed. With
//! [`ClientOptions::cancel_stale_reads`] reads for the same (resource,
//! operation) additionally abort each other, and the newest generation is
//! always the one left running.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures::future::{BoxFuture, FutureExt};
use shared::{
    domain::{
        AttendanceId, ClassId, EvaluationId, LessonId, ModuleId, NewsId, Record, RegistrationId,
        ResourceKind, Role, StudentId,
    },
    protocol::{
        AttendancePatch, AttendanceRecord, ClassInput, ClassSummary, EvaluationRecord,
        LessonInput, LessonSummary, ModuleInput, ModuleSummary, NewAttendance, NewEvaluation,
        NewsArticle, NewsDraft, Registration, RegistrationStatusUpdate, StudentInput,
        StudentSummary,
    },
};
use tokio::{sync::Mutex, task::AbortHandle};
use tracing::{info, warn};

use crate::{
    error::{ClientError, ClientResult},
    permissions::{self, Permission, Section},
    services::{ImageFile, ImageUpdate, Services},
    store::{Change, Operation, SliceAction, StoreEvent, StoreHandle},
    ui_state::{Alert, AlertAction, DeleteTarget, ModalAction, ModalKind, ModalPayload},
    wizard::{AttendanceMark, OptionsRequest, Wizard},
    ClientOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub resource: ResourceKind,
    pub op: Operation,
}

struct InflightRead {
    generation: u64,
    abort: AbortHandle,
    on_cancel: StoreEvent,
}

pub struct Dispatcher {
    store: Arc<StoreHandle>,
    services: Services,
    role: Role,
    options: ClientOptions,
    generation: AtomicU64,
    inflight: Mutex<HashMap<RequestKey, InflightRead>>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<StoreHandle>,
        services: Services,
        role: Role,
        options: ClientOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            services,
            role,
            options,
            generation: AtomicU64::new(0),
            inflight: Mutex::new(HashMap::new()),
        })
    }

    pub fn store(&self) -> &Arc<StoreHandle> {
        &self.store
    }

    pub fn role(&self) -> Role {
        self.role
    }

    fn ensure(&self, permission: Permission) -> ClientResult<()> {
        permissions::ensure(self.role, permission)
    }

    async fn run<T, P>(
        self: &Arc<Self>,
        resource: ResourceKind,
        op: Operation,
        wrap: fn(SliceAction<T>) -> StoreEvent,
        call: BoxFuture<'static, ClientResult<P>>,
        into_change: impl FnOnce(&P) -> Change<T>,
    ) -> ClientResult<P>
    where
        T: Record,
        P: Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.store
            .dispatch(wrap(SliceAction::pending(op, generation)))
            .await;

        let outcome = if self.options.cancel_stale_reads && op.is_read() {
            let key = RequestKey { resource, op };
            let on_cancel = wrap(SliceAction::cancelled(op, generation));
            self.run_cancellable(key, generation, on_cancel, call).await
        } else {
            call.await
        };

        match outcome {
            Ok(payload) => {
                self.store
                    .dispatch(wrap(SliceAction::fulfilled(
                        op,
                        generation,
                        into_change(&payload),
                    )))
                    .await;
                Ok(payload)
            }
            Err(ClientError::Cancelled) => {
                info!(%resource, op = op.as_str(), generation, "thunk: read cancelled");
                Err(ClientError::Cancelled)
            }
            Err(err) => {
                warn!(%resource, op = op.as_str(), generation, error = %err, "thunk: rejected");
                self.store
                    .dispatch(wrap(SliceAction::rejected(op, generation, err.to_string())))
                    .await;
                Err(err)
            }
        }
    }

    async fn run_cancellable<P: Send + 'static>(
        &self,
        key: RequestKey,
        generation: u64,
        on_cancel: StoreEvent,
        call: BoxFuture<'static, ClientResult<P>>,
    ) -> ClientResult<P> {
        let mut inflight = self.inflight.lock().await;
        if let Some(newer) = inflight
            .get(&key)
            .filter(|entry| entry.generation > generation)
        {
            info!(
                resource = %key.resource,
                op = key.op.as_str(),
                generation,
                superseded_by = newer.generation,
                "thunk: dropping read superseded before it started"
            );
            return Err(ClientError::Cancelled);
        }
        let task = tokio::spawn(call);
        let previous = inflight.insert(
            key,
            InflightRead {
                generation,
                abort: task.abort_handle(),
                on_cancel,
            },
        );
        drop(inflight);
        if let Some(previous) = previous {
            info!(
                resource = %key.resource,
                op = key.op.as_str(),
                superseded = previous.generation,
                generation,
                "thunk: aborting superseded read"
            );
            previous.abort.abort();
        }

        let joined = task.await;
        {
            let mut inflight = self.inflight.lock().await;
            if inflight
                .get(&key)
                .is_some_and(|entry| entry.generation == generation)
            {
                inflight.remove(&key);
            }
        }

        match joined {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(ClientError::Cancelled),
            Err(err) => Err(ClientError::request(None, format!("request task failed: {err}"))),
        }
    }

    /// Aborts in-flight reads of one resource, returning how many were
    /// aborted. Their operations go back to idle.
    pub async fn cancel_reads(&self, resource: ResourceKind) -> usize {
        self.cancel_matching(|key| key.resource == resource).await
    }

    pub async fn cancel_all_reads(&self) -> usize {
        self.cancel_matching(|_| true).await
    }

    async fn cancel_matching(&self, predicate: impl Fn(&RequestKey) -> bool) -> usize {
        let cancelled: Vec<InflightRead> = {
            let mut inflight = self.inflight.lock().await;
            let keys: Vec<RequestKey> = inflight
                .keys()
                .filter(|key| predicate(*key))
                .copied()
                .collect();
            keys.iter().filter_map(|key| inflight.remove(key)).collect()
        };
        for entry in &cancelled {
            entry.abort.abort();
            self.store.dispatch(entry.on_cancel.clone()).await;
        }
        cancelled.len()
    }

    async fn fetch_into<T: Record>(
        self: &Arc<Self>,
        resource: ResourceKind,
        op: Operation,
        wrap: fn(SliceAction<T>) -> StoreEvent,
        call: BoxFuture<'static, ClientResult<Vec<T>>>,
    ) -> ClientResult<Vec<T>> {
        self.run(resource, op, wrap, call, |items: &Vec<T>| {
            Change::ReplaceAll(items.clone())
        })
        .await
    }

    async fn create_into<T: Record>(
        self: &Arc<Self>,
        resource: ResourceKind,
        wrap: fn(SliceAction<T>) -> StoreEvent,
        call: BoxFuture<'static, ClientResult<T>>,
    ) -> ClientResult<T> {
        self.ensure(Permission::Create(resource))?;
        self.run(resource, Operation::Create, wrap, call, |record: &T| {
            Change::Append(record.clone())
        })
        .await
    }

    async fn update_into<T: Record>(
        self: &Arc<Self>,
        resource: ResourceKind,
        op: Operation,
        wrap: fn(SliceAction<T>) -> StoreEvent,
        call: BoxFuture<'static, ClientResult<T>>,
    ) -> ClientResult<T> {
        self.run(resource, op, wrap, call, |record: &T| {
            Change::Replace(record.clone())
        })
        .await
    }

    async fn delete_from<T: Record>(
        self: &Arc<Self>,
        resource: ResourceKind,
        wrap: fn(SliceAction<T>) -> StoreEvent,
        id: T::Id,
        call: BoxFuture<'static, ClientResult<()>>,
    ) -> ClientResult<()> {
        self.ensure(Permission::Delete(resource))?;
        self.run(resource, Operation::Delete, wrap, call, move |_: &()| {
            Change::Remove(id)
        })
        .await
    }

    // Classes

    pub async fn fetch_classes(self: &Arc<Self>) -> ClientResult<Vec<ClassSummary>> {
        self.ensure(Permission::View(Section::Classes))?;
        let service = self.services.classes.clone();
        self.fetch_into(
            ResourceKind::Class,
            Operation::FetchAll,
            StoreEvent::Classes,
            async move { service.list(&[]).await }.boxed(),
        )
        .await
    }

    pub async fn create_class(self: &Arc<Self>, input: ClassInput) -> ClientResult<ClassSummary> {
        let service = self.services.classes.clone();
        self.create_into(
            ResourceKind::Class,
            StoreEvent::Classes,
            async move { service.create(&input).await }.boxed(),
        )
        .await
    }

    pub async fn update_class(
        self: &Arc<Self>,
        id: ClassId,
        input: ClassInput,
    ) -> ClientResult<ClassSummary> {
        self.ensure(Permission::Update(ResourceKind::Class))?;
        let service = self.services.classes.clone();
        self.update_into(
            ResourceKind::Class,
            Operation::Update,
            StoreEvent::Classes,
            async move { service.update(&id, &input).await }.boxed(),
        )
        .await
    }

    pub async fn delete_class(self: &Arc<Self>, id: ClassId) -> ClientResult<()> {
        let service = self.services.classes.clone();
        let target = id.clone();
        self.delete_from(
            ResourceKind::Class,
            StoreEvent::Classes,
            id,
            async move { service.delete(&target).await }.boxed(),
        )
        .await
    }

    // Students

    /// Lists students, restricted to one class when `class` is given.
    pub async fn fetch_students(
        self: &Arc<Self>,
        class: Option<ClassId>,
    ) -> ClientResult<Vec<StudentSummary>> {
        self.ensure(Permission::View(Section::Students))?;
        let service = self.services.students.clone();
        self.fetch_into(
            ResourceKind::Student,
            Operation::FetchAll,
            StoreEvent::Students,
            async move {
                match &class {
                    Some(class) => service.list(&[("class", class.as_str())]).await,
                    None => service.list(&[]).await,
                }
            }
            .boxed(),
        )
        .await
    }

    pub async fn create_student(
        self: &Arc<Self>,
        input: StudentInput,
    ) -> ClientResult<StudentSummary> {
        let service = self.services.students.clone();
        self.create_into(
            ResourceKind::Student,
            StoreEvent::Students,
            async move { service.create(&input).await }.boxed(),
        )
        .await
    }

    pub async fn update_student(
        self: &Arc<Self>,
        id: StudentId,
        input: StudentInput,
    ) -> ClientResult<StudentSummary> {
        self.ensure(Permission::Update(ResourceKind::Student))?;
        let service = self.services.students.clone();
        self.update_into(
            ResourceKind::Student,
            Operation::Update,
            StoreEvent::Students,
            async move { service.update(&id, &input).await }.boxed(),
        )
        .await
    }

    pub async fn delete_student(self: &Arc<Self>, id: StudentId) -> ClientResult<()> {
        let service = self.services.students.clone();
        let target = id.clone();
        self.delete_from(
            ResourceKind::Student,
            StoreEvent::Students,
            id,
            async move { service.delete(&target).await }.boxed(),
        )
        .await
    }

    // Modules

    pub async fn fetch_modules(
        self: &Arc<Self>,
        class: Option<ClassId>,
    ) -> ClientResult<Vec<ModuleSummary>> {
        self.ensure(Permission::View(Section::Modules))?;
        let service = self.services.modules.clone();
        self.fetch_into(
            ResourceKind::Module,
            Operation::FetchAll,
            StoreEvent::Modules,
            async move {
                match &class {
                    Some(class) => service.list(&[("class", class.as_str())]).await,
                    None => service.list(&[]).await,
                }
            }
            .boxed(),
        )
        .await
    }

    pub async fn create_module(
        self: &Arc<Self>,
        input: ModuleInput,
    ) -> ClientResult<ModuleSummary> {
        let service = self.services.modules.clone();
        self.create_into(
            ResourceKind::Module,
            StoreEvent::Modules,
            async move { service.create(&input).await }.boxed(),
        )
        .await
    }

    pub async fn update_module(
        self: &Arc<Self>,
        id: ModuleId,
        input: ModuleInput,
    ) -> ClientResult<ModuleSummary> {
        self.ensure(Permission::Update(ResourceKind::Module))?;
        let service = self.services.modules.clone();
        self.update_into(
            ResourceKind::Module,
            Operation::Update,
            StoreEvent::Modules,
            async move { service.update(&id, &input).await }.boxed(),
        )
        .await
    }

    pub async fn delete_module(self: &Arc<Self>, id: ModuleId) -> ClientResult<()> {
        let service = self.services.modules.clone();
        let target = id.clone();
        self.delete_from(
            ResourceKind::Module,
            StoreEvent::Modules,
            id,
            async move { service.delete(&target).await }.boxed(),
        )
        .await
    }

    // Lessons

    pub async fn fetch_lessons(
        self: &Arc<Self>,
        module: Option<ModuleId>,
    ) -> ClientResult<Vec<LessonSummary>> {
        self.ensure(Permission::View(Section::Lessons))?;
        let service = self.services.lessons.clone();
        self.fetch_into(
            ResourceKind::Lesson,
            Operation::FetchAll,
            StoreEvent::Lessons,
            async move {
                match &module {
                    Some(module) => service.list(&[("module", module.as_str())]).await,
                    None => service.list(&[]).await,
                }
            }
            .boxed(),
        )
        .await
    }

    pub async fn create_lesson(
        self: &Arc<Self>,
        input: LessonInput,
    ) -> ClientResult<LessonSummary> {
        let service = self.services.lessons.clone();
        self.create_into(
            ResourceKind::Lesson,
            StoreEvent::Lessons,
            async move { service.create(&input).await }.boxed(),
        )
        .await
    }

    pub async fn update_lesson(
        self: &Arc<Self>,
        id: LessonId,
        input: LessonInput,
    ) -> ClientResult<LessonSummary> {
        self.ensure(Permission::Update(ResourceKind::Lesson))?;
        let service = self.services.lessons.clone();
        self.update_into(
            ResourceKind::Lesson,
            Operation::Update,
            StoreEvent::Lessons,
            async move { service.update(&id, &input).await }.boxed(),
        )
        .await
    }

    pub async fn delete_lesson(self: &Arc<Self>, id: LessonId) -> ClientResult<()> {
        let service = self.services.lessons.clone();
        let target = id.clone();
        self.delete_from(
            ResourceKind::Lesson,
            StoreEvent::Lessons,
            id,
            async move { service.delete(&target).await }.boxed(),
        )
        .await
    }

    // Attendance

    /// Never rejects on request failure: the service degrades to an empty list.
    pub async fn fetch_attendances(
        self: &Arc<Self>,
        lesson: LessonId,
    ) -> ClientResult<Vec<AttendanceRecord>> {
        self.ensure(Permission::View(Section::Attendance))?;
        let service = self.services.attendance.clone();
        self.fetch_into(
            ResourceKind::Attendance,
            Operation::FetchAll,
            StoreEvent::Attendances,
            async move { service.list_for_lesson(&lesson).await }.boxed(),
        )
        .await
    }

    pub async fn create_attendance(
        self: &Arc<Self>,
        input: NewAttendance,
    ) -> ClientResult<AttendanceRecord> {
        let service = self.services.attendance.clone();
        self.create_into(
            ResourceKind::Attendance,
            StoreEvent::Attendances,
            async move { service.create(&input).await }.boxed(),
        )
        .await
    }

    pub async fn update_attendance(
        self: &Arc<Self>,
        id: AttendanceId,
        patch: AttendancePatch,
    ) -> ClientResult<AttendanceRecord> {
        self.ensure(Permission::Update(ResourceKind::Attendance))?;
        let service = self.services.attendance.clone();
        self.update_into(
            ResourceKind::Attendance,
            Operation::Update,
            StoreEvent::Attendances,
            async move { service.update(&id, &patch).await }.boxed(),
        )
        .await
    }

    pub async fn delete_attendance(self: &Arc<Self>, id: AttendanceId) -> ClientResult<()> {
        let service = self.services.attendance.clone();
        let target = id.clone();
        self.delete_from(
            ResourceKind::Attendance,
            StoreEvent::Attendances,
            id,
            async move { service.delete(&target).await }.boxed(),
        )
        .await
    }

    /// Submits the attendance form of a wizard, one record per mark. Stops at
    /// the first failure; records created before it stay in the slice.
    pub async fn submit_attendance(
        self: &Arc<Self>,
        wizard: &Wizard,
        marks: Vec<AttendanceMark>,
    ) -> ClientResult<Vec<AttendanceRecord>> {
        let entries = wizard.attendance_submission(marks)?;
        let mut created = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.create_attendance(entry).await {
                Ok(record) => created.push(record),
                Err(err) => {
                    self.set_alert(Alert::error(err.to_string())).await;
                    return Err(err);
                }
            }
        }
        self.set_alert(Alert::success(format!(
            "{} attendance record(s) saved",
            created.len()
        )))
        .await;
        Ok(created)
    }

    // Evaluations

    pub async fn fetch_evaluations(
        self: &Arc<Self>,
        lesson: LessonId,
    ) -> ClientResult<Vec<EvaluationRecord>> {
        self.ensure(Permission::View(Section::Evaluations))?;
        let service = self.services.evaluations.clone();
        self.fetch_into(
            ResourceKind::Evaluation,
            Operation::FetchAll,
            StoreEvent::Evaluations,
            async move { service.list_for_lesson(&lesson).await }.boxed(),
        )
        .await
    }

    pub async fn create_evaluation(
        self: &Arc<Self>,
        input: NewEvaluation,
    ) -> ClientResult<EvaluationRecord> {
        input.validate()?;
        let service = self.services.evaluations.clone();
        self.create_into(
            ResourceKind::Evaluation,
            StoreEvent::Evaluations,
            async move { service.create(&input).await }.boxed(),
        )
        .await
    }

    pub async fn delete_evaluation(self: &Arc<Self>, id: EvaluationId) -> ClientResult<()> {
        let service = self.services.evaluations.clone();
        let target = id.clone();
        self.delete_from(
            ResourceKind::Evaluation,
            StoreEvent::Evaluations,
            id,
            async move { service.delete(&target).await }.boxed(),
        )
        .await
    }

    pub async fn submit_evaluation(
        self: &Arc<Self>,
        wizard: &Wizard,
        score: f32,
        comment: Option<String>,
    ) -> ClientResult<EvaluationRecord> {
        let input = wizard.evaluation_submission(score, comment)?;
        match self.create_evaluation(input).await {
            Ok(record) => {
                self.set_alert(Alert::success("Evaluation saved")).await;
                Ok(record)
            }
            Err(err) => {
                self.set_alert(Alert::error(err.to_string())).await;
                Err(err)
            }
        }
    }

    // News

    pub async fn fetch_news(self: &Arc<Self>) -> ClientResult<Vec<NewsArticle>> {
        self.ensure(Permission::View(Section::News))?;
        let service = self.services.news.clone();
        self.fetch_into(
            ResourceKind::News,
            Operation::FetchAll,
            StoreEvent::News,
            async move { service.list().await }.boxed(),
        )
        .await
    }

    pub async fn create_news(
        self: &Arc<Self>,
        draft: NewsDraft,
        image: Option<ImageFile>,
    ) -> ClientResult<NewsArticle> {
        let service = self.services.news.clone();
        self.create_into(
            ResourceKind::News,
            StoreEvent::News,
            async move { service.create(&draft, image).await }.boxed(),
        )
        .await
    }

    pub async fn update_news(
        self: &Arc<Self>,
        id: NewsId,
        draft: NewsDraft,
        image: ImageUpdate,
    ) -> ClientResult<NewsArticle> {
        self.ensure(Permission::Update(ResourceKind::News))?;
        let service = self.services.news.clone();
        self.update_into(
            ResourceKind::News,
            Operation::Update,
            StoreEvent::News,
            async move { service.update(&id, &draft, image).await }.boxed(),
        )
        .await
    }

    pub async fn delete_news(self: &Arc<Self>, id: NewsId) -> ClientResult<()> {
        let service = self.services.news.clone();
        let target = id.clone();
        self.delete_from(
            ResourceKind::News,
            StoreEvent::News,
            id,
            async move { service.delete(&target).await }.boxed(),
        )
        .await
    }

    // Registrations

    pub async fn fetch_registrations(self: &Arc<Self>) -> ClientResult<Vec<Registration>> {
        self.ensure(Permission::View(Section::Registrations))?;
        let service = self.services.registrations.clone();
        self.fetch_into(
            ResourceKind::Registration,
            Operation::FetchAll,
            StoreEvent::Registrations,
            async move { service.list().await }.boxed(),
        )
        .await
    }

    pub async fn fetch_pending_registrations(self: &Arc<Self>) -> ClientResult<Vec<Registration>> {
        self.ensure(Permission::View(Section::Registrations))?;
        let service = self.services.registrations.clone();
        self.fetch_into(
            ResourceKind::Registration,
            Operation::FetchPending,
            StoreEvent::Registrations,
            async move { service.list_pending().await }.boxed(),
        )
        .await
    }

    pub async fn update_registration_status(
        self: &Arc<Self>,
        id: RegistrationId,
        update: RegistrationStatusUpdate,
    ) -> ClientResult<Registration> {
        self.ensure(Permission::ReviewRegistrations)?;
        let service = self.services.registrations.clone();
        self.update_into(
            ResourceKind::Registration,
            Operation::UpdateStatus,
            StoreEvent::Registrations,
            async move { service.update_status(&id, &update).await }.boxed(),
        )
        .await
    }

    pub async fn delete_registration(self: &Arc<Self>, id: RegistrationId) -> ClientResult<()> {
        let service = self.services.registrations.clone();
        let target = id.clone();
        self.delete_from(
            ResourceKind::Registration,
            StoreEvent::Registrations,
            id,
            async move { service.delete(&target).await }.boxed(),
        )
        .await
    }

    // Wizard data

    /// Loads what a wizard step asked for.
    pub async fn load_options(self: &Arc<Self>, request: OptionsRequest) -> ClientResult<()> {
        match request {
            OptionsRequest::Classes => {
                self.fetch_classes().await?;
            }
            OptionsRequest::StudentsOfClass(class) => {
                self.fetch_students(Some(class)).await?;
            }
            OptionsRequest::ModulesOfClass(class) => {
                self.fetch_modules(Some(class)).await?;
            }
            OptionsRequest::LessonsOfModule(module) => {
                self.fetch_lessons(Some(module)).await?;
            }
            OptionsRequest::AttendanceSheet { class, lesson } => {
                let (students, _) =
                    tokio::join!(self.fetch_students(Some(class)), self.fetch_attendances(lesson));
                students?;
            }
            OptionsRequest::EvaluationsOfLesson(lesson) => {
                self.fetch_evaluations(lesson).await?;
            }
        }
        Ok(())
    }

    // Modal and alert

    pub async fn open_modal(&self, kind: ModalKind, payload: ModalPayload) {
        self.store
            .dispatch(StoreEvent::Modal(ModalAction::Open { kind, payload }))
            .await;
    }

    pub async fn close_modal(&self) {
        self.store.dispatch(StoreEvent::Modal(ModalAction::Close)).await;
    }

    pub async fn set_alert(&self, alert: Alert) {
        self.store
            .dispatch(StoreEvent::Alert(AlertAction::Set(alert)))
            .await;
    }

    /// Opens the edit modal for a record held in the store.
    pub async fn open_edit(&self, resource: ResourceKind, id: &str) -> ClientResult<()> {
        self.ensure(Permission::Update(resource))?;
        let payload = self
            .store
            .read(|store| -> ClientResult<ModalPayload> {
                Ok(match resource {
                    ResourceKind::Class => ModalPayload::Class(
                        store.classes.find(resource, &ClassId::from(id))?.clone(),
                    ),
                    ResourceKind::Student => ModalPayload::Student(
                        store.students.find(resource, &StudentId::from(id))?.clone(),
                    ),
                    ResourceKind::Module => ModalPayload::Module(
                        store.modules.find(resource, &ModuleId::from(id))?.clone(),
                    ),
                    ResourceKind::Lesson => ModalPayload::Lesson(
                        store.lessons.find(resource, &LessonId::from(id))?.clone(),
                    ),
                    ResourceKind::Attendance => ModalPayload::Attendance(
                        store
                            .attendances
                            .find(resource, &AttendanceId::from(id))?
                            .clone(),
                    ),
                    ResourceKind::Evaluation => ModalPayload::Evaluation(
                        store
                            .evaluations
                            .find(resource, &EvaluationId::from(id))?
                            .clone(),
                    ),
                    ResourceKind::News => ModalPayload::News(
                        store.news.find(resource, &NewsId::from(id))?.clone(),
                    ),
                    ResourceKind::Registration => ModalPayload::Registration(
                        store
                            .registrations
                            .all
                            .find(resource, &RegistrationId::from(id))?
                            .clone(),
                    ),
                })
            })
            .await?;
        self.open_modal(ModalKind::Edit(resource), payload).await;
        Ok(())
    }

    /// First half of a delete: asks for confirmation, sends nothing.
    pub async fn request_delete(&self, target: DeleteTarget) -> ClientResult<()> {
        self.ensure(Permission::Delete(target.resource))?;
        let kind = ModalKind::ConfirmDelete(target.resource);
        self.open_modal(kind, ModalPayload::Target(target)).await;
        Ok(())
    }

    /// Issues the delete awaiting confirmation. The modal closes either way; a
    /// failure raises an error alert and leaves the collection untouched.
    pub async fn confirm_delete(self: &Arc<Self>) -> ClientResult<()> {
        let target = self
            .store
            .read(|store| match store.ui.modal.payload() {
                Some(ModalPayload::Target(target))
                    if matches!(store.ui.modal.kind(), Some(ModalKind::ConfirmDelete(_))) =>
                {
                    Some(target.clone())
                }
                _ => None,
            })
            .await
            .ok_or_else(|| ClientError::validation("no deletion awaiting confirmation"))?;
        self.close_modal().await;

        let id = target.id.as_str();
        let result = match target.resource {
            ResourceKind::Class => self.delete_class(id.into()).await,
            ResourceKind::Student => self.delete_student(id.into()).await,
            ResourceKind::Module => self.delete_module(id.into()).await,
            ResourceKind::Lesson => self.delete_lesson(id.into()).await,
            ResourceKind::Attendance => self.delete_attendance(id.into()).await,
            ResourceKind::Evaluation => self.delete_evaluation(id.into()).await,
            ResourceKind::News => self.delete_news(id.into()).await,
            ResourceKind::Registration => self.delete_registration(id.into()).await,
        };
        match result {
            Ok(()) => {
                self.set_alert(Alert::success(format!("{} deleted", target.resource)))
                    .await;
                Ok(())
            }
            Err(err) => {
                self.set_alert(Alert::error(err.to_string())).await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/thunks_tests.rs"]
mod tests;

//! Domain services: one HTTP call per intent, envelope unwrapped, errors
//! propagated.

use std::{marker::PhantomData, sync::Arc};

use serde::Serialize;
use shared::{
    domain::Record,
    protocol::{ClassSummary, LessonSummary, ModuleSummary, StudentSummary},
};

use crate::{
    envelope::{unwrap_list, unwrap_one},
    error::ClientResult,
    transport::{ApiRequest, Transport},
};

mod attendance;
mod evaluations;
mod news;
mod registrations;

pub use attendance::AttendanceService;
pub use evaluations::EvaluationService;
pub use news::{ImageFile, ImageUpdate, NewsService};
pub use registrations::RegistrationService;

pub const API_PREFIX: &str = "back-office";

/// Static description of one REST collection.
pub trait Resource: Send + Sync + 'static {
    const PATH: &'static str;
    type Record: Record;
}

pub struct Classes;
pub struct Students;
pub struct Modules;
pub struct Lessons;

impl Resource for Classes {
    const PATH: &'static str = "classes";
    type Record = ClassSummary;
}

impl Resource for Students {
    const PATH: &'static str = "students";
    type Record = StudentSummary;
}

impl Resource for Modules {
    const PATH: &'static str = "modules";
    type Record = ModuleSummary;
}

impl Resource for Lessons {
    const PATH: &'static str = "lessons";
    type Record = LessonSummary;
}

pub(crate) fn collection_path(path: &str) -> String {
    format!("{API_PREFIX}/{path}")
}

pub(crate) fn item_path(path: &str, id: &impl std::fmt::Display) -> String {
    format!("{API_PREFIX}/{path}/{id}")
}

/// Generic list/create/update/delete helper over one collection path.
pub struct ResourceService<R: Resource> {
    transport: Arc<dyn Transport>,
    path: &'static str,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            path: self.path,
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            path: R::PATH,
            _resource: PhantomData,
        }
    }

    pub async fn list(&self, query: &[(&str, &str)]) -> ClientResult<Vec<R::Record>> {
        let mut request = ApiRequest::get(collection_path(self.path));
        for (key, value) in query {
            request = request.with_query(*key, *value);
        }
        let body = self.transport.execute(request).await?;
        unwrap_list(body)
    }

    pub async fn create(&self, input: &impl Serialize) -> ClientResult<R::Record> {
        let body = self
            .transport
            .execute(ApiRequest::post(
                collection_path(self.path),
                serde_json::to_value(input)?,
            ))
            .await?;
        unwrap_one(body)
    }

    pub async fn update(
        &self,
        id: &<R::Record as Record>::Id,
        patch: &impl Serialize,
    ) -> ClientResult<R::Record> {
        let body = self
            .transport
            .execute(ApiRequest::put(
                item_path(self.path, id),
                serde_json::to_value(patch)?,
            ))
            .await?;
        unwrap_one(body)
    }

    pub async fn delete(&self, id: &<R::Record as Record>::Id) -> ClientResult<()> {
        self.transport
            .execute(ApiRequest::delete(item_path(self.path, id)))
            .await?;
        Ok(())
    }
}

/// Every service the dispatcher talks to, sharing one transport.
#[derive(Clone)]
pub struct Services {
    pub classes: ResourceService<Classes>,
    pub students: ResourceService<Students>,
    pub modules: ResourceService<Modules>,
    pub lessons: ResourceService<Lessons>,
    pub attendance: AttendanceService,
    pub evaluations: EvaluationService,
    pub news: NewsService,
    pub registrations: RegistrationService,
}

impl Services {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            classes: ResourceService::new(Arc::clone(&transport)),
            students: ResourceService::new(Arc::clone(&transport)),
            modules: ResourceService::new(Arc::clone(&transport)),
            lessons: ResourceService::new(Arc::clone(&transport)),
            attendance: AttendanceService::new(Arc::clone(&transport)),
            evaluations: EvaluationService::new(Arc::clone(&transport)),
            news: NewsService::new(Arc::clone(&transport)),
            registrations: RegistrationService::new(transport),
        }
    }
}

#[cfg(test)]
#[path = "../tests/services_tests.rs"]
mod tests;

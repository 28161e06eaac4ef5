use std::sync::Arc;

use shared::{
    domain::{AttendanceId, LessonId},
    protocol::{AttendancePatch, AttendanceRecord, NewAttendance},
};
use tracing::warn;

use super::{Resource, ResourceService};
use crate::{error::ClientResult, transport::Transport};

pub struct Attendances;

impl Resource for Attendances {
    const PATH: &'static str = "attendances";
    type Record = AttendanceRecord;
}

#[derive(Clone)]
pub struct AttendanceService {
    inner: ResourceService<Attendances>,
}

impl AttendanceService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: ResourceService::new(transport),
        }
    }

    /// Lists the attendances of one lesson. A failed request yields an empty
    /// list instead of an error; this is the only read path that degrades.
    /// Undecodable bodies still fail.
    pub async fn list_for_lesson(&self, lesson: &LessonId) -> ClientResult<Vec<AttendanceRecord>> {
        match self.inner.list(&[("lesson", lesson.as_str())]).await {
            Err(err) if err.is_request() => {
                warn!(lesson = %lesson, error = %err, "attendance: listing failed; showing none");
                Ok(Vec::new())
            }
            result => result,
        }
    }

    pub async fn create(&self, input: &NewAttendance) -> ClientResult<AttendanceRecord> {
        self.inner.create(input).await
    }

    pub async fn update(
        &self,
        id: &AttendanceId,
        patch: &AttendancePatch,
    ) -> ClientResult<AttendanceRecord> {
        self.inner.update(id, patch).await
    }

    pub async fn delete(&self, id: &AttendanceId) -> ClientResult<()> {
        self.inner.delete(id).await
    }
}

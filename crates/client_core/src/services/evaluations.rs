use std::sync::Arc;

use shared::{
    domain::{EvaluationId, LessonId},
    protocol::{EvaluationRecord, NewEvaluation},
};

use super::{Resource, ResourceService};
use crate::{error::ClientResult, transport::Transport};

pub struct Evaluations;

impl Resource for Evaluations {
    const PATH: &'static str = "evaluations";
    type Record = EvaluationRecord;
}

#[derive(Clone)]
pub struct EvaluationService {
    inner: ResourceService<Evaluations>,
}

impl EvaluationService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: ResourceService::new(transport),
        }
    }

    pub async fn list_for_lesson(&self, lesson: &LessonId) -> ClientResult<Vec<EvaluationRecord>> {
        self.inner.list(&[("lesson", lesson.as_str())]).await
    }

    /// Rejects out-of-range scores locally; nothing is sent in that case.
    pub async fn create(&self, input: &NewEvaluation) -> ClientResult<EvaluationRecord> {
        input.validate()?;
        self.inner.create(input).await
    }

    pub async fn delete(&self, id: &EvaluationId) -> ClientResult<()> {
        self.inner.delete(id).await
    }
}

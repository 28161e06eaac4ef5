use std::sync::Arc;

use shared::{
    domain::RegistrationId,
    protocol::{Registration, RegistrationStatusUpdate},
};

use super::{Resource, ResourceService};
use crate::{error::ClientResult, transport::Transport};

pub struct Registrations;

impl Resource for Registrations {
    const PATH: &'static str = "student-registrations";
    type Record = Registration;
}

#[derive(Clone)]
pub struct RegistrationService {
    inner: ResourceService<Registrations>,
}

impl RegistrationService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: ResourceService::new(transport),
        }
    }

    pub async fn list(&self) -> ClientResult<Vec<Registration>> {
        self.inner.list(&[]).await
    }

    pub async fn list_pending(&self) -> ClientResult<Vec<Registration>> {
        self.inner.list(&[("status", "pending")]).await
    }

    pub async fn update_status(
        &self,
        id: &RegistrationId,
        update: &RegistrationStatusUpdate,
    ) -> ClientResult<Registration> {
        self.inner.update(id, update).await
    }

    pub async fn delete(&self, id: &RegistrationId) -> ClientResult<()> {
        self.inner.delete(id).await
    }
}

//! Client-side state layer of the training-center back office: REST services,
//! store slices, thunk orchestration, modal/alert switchboard, selection
//! wizards and role checks.

use std::time::Duration;

pub mod envelope;
pub mod error;
pub mod permissions;
pub mod services;
pub mod store;
pub mod thunks;
pub mod transport;
pub mod ui_state;
pub mod wizard;

pub use error::{ClientError, ClientResult};
pub use services::{ImageFile, ImageUpdate, Services};
pub use store::{AsyncStatus, Store, StoreEvent, StoreHandle};
pub use thunks::Dispatcher;
pub use transport::{HttpTransport, Transport};
pub use ui_state::{Alert, AlertKind, AlertOrchestrator, DeleteTarget, ModalKind, ModalPayload};
pub use wizard::{Wizard, WizardMove};

pub const DEFAULT_TOAST_AUTO_CLOSE: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    /// Abort an in-flight read when a newer read for the same slice starts.
    pub cancel_stale_reads: bool,
    pub toast_auto_close: Duration,
    /// Delay between handing an alert to the presenter and clearing it.
    pub alert_handoff_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            cancel_stale_reads: false,
            toast_auto_close: DEFAULT_TOAST_AUTO_CLOSE,
            alert_handoff_delay: Duration::ZERO,
        }
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

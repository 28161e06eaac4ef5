use shared::{domain::ResourceKind, error::FieldError};
use thiserror::Error;

use crate::permissions::Permission;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// Non-2xx response or transport failure; `status` is `None` when no
    /// response was received.
    #[error("request failed{}: {message}", status_suffix(.status))]
    Request { status: Option<u16>, message: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{resource} {id} not found")]
    NotFound { resource: ResourceKind, id: String },
    #[error("role {role} is not allowed to {permission}")]
    Forbidden {
        role: shared::domain::Role,
        permission: Permission,
    },
    #[error("invalid response payload: {0}")]
    Decode(String),
    #[error("request cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn request(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Request {
            status,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(resource: ResourceKind, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return Self::Decode(value.to_string());
        }
        Self::Request {
            status: value.status().map(|s| s.as_u16()),
            message: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

impl From<FieldError> for ClientError {
    fn from(value: FieldError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(value: url::ParseError) -> Self {
        Self::Validation(format!("invalid url: {value}"))
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

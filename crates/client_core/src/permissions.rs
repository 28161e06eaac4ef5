//! Role-based capability checks, kept in one place instead of scattered role
//! comparisons.

use std::fmt;

use shared::domain::{ResourceKind, Role};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Classes,
    Students,
    Modules,
    Lessons,
    Attendance,
    Evaluations,
    News,
    Registrations,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Classes,
        Section::Students,
        Section::Modules,
        Section::Lessons,
        Section::Attendance,
        Section::Evaluations,
        Section::News,
        Section::Registrations,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    View(Section),
    Create(ResourceKind),
    Update(ResourceKind),
    Delete(ResourceKind),
    ReviewRegistrations,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View(section) => write!(f, "view {section:?}"),
            Self::Create(resource) => write!(f, "create {resource}"),
            Self::Update(resource) => write!(f, "update {resource}"),
            Self::Delete(resource) => write!(f, "delete {resource}"),
            Self::ReviewRegistrations => f.write_str("review registrations"),
        }
    }
}

fn is_structural(resource: ResourceKind) -> bool {
    matches!(
        resource,
        ResourceKind::Class | ResourceKind::Student | ResourceKind::Module | ResourceKind::Lesson
    )
}

fn is_recorded_by_trainer(resource: ResourceKind) -> bool {
    matches!(resource, ResourceKind::Attendance | ResourceKind::Evaluation)
}

pub fn can(role: Role, permission: Permission) -> bool {
    match role {
        Role::Admin => true,
        Role::Manager => match permission {
            Permission::Delete(resource) => !is_structural(resource),
            _ => true,
        },
        Role::Trainer => match permission {
            Permission::View(section) => {
                !matches!(section, Section::News | Section::Registrations)
            }
            Permission::Create(resource) | Permission::Update(resource) => {
                is_recorded_by_trainer(resource)
            }
            Permission::Delete(_) | Permission::ReviewRegistrations => false,
        },
    }
}

pub fn ensure(role: Role, permission: Permission) -> ClientResult<()> {
    if can(role, permission) {
        Ok(())
    } else {
        Err(ClientError::Forbidden { role, permission })
    }
}

pub fn visible_sections(role: Role) -> Vec<Section> {
    Section::ALL
        .into_iter()
        .filter(|section| can(role, Permission::View(*section)))
        .collect()
}

//! Domain records: principals, users, departments and documents.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OrbitError;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a user (any role, organizations included).
    UserId
);
id_type!(
    /// Identifier of a department.
    DepartmentId
);
id_type!(
    /// Identifier of an uploaded document.
    DocumentId
);

/// Closed set of roles a principal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Dean,
    Adviser,
    Organization,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Dean, Role::Adviser, Role::Organization];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Dean => "dean",
            Role::Adviser => "adviser",
            Role::Organization => "organization",
        }
    }

    /// Roles that must be attached to a department.
    pub fn requires_department(self) -> bool {
        matches!(self, Role::Dean | Role::Adviser | Role::Organization)
    }

    /// Roles that must be attached to an organization.
    pub fn requires_organization(self) -> bool {
        matches!(self, Role::Adviser)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = OrbitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "dean" => Ok(Role::Dean),
            "adviser" => Ok(Role::Adviser),
            "organization" => Ok(Role::Organization),
            other => Err(OrbitError::validation(format!("invalid role: {other}"))),
        }
    }
}

/// The authenticated actor making a request.
///
/// Principals are not validated on construction: a misconfigured record
/// (e.g. a dean without a department) must stay representable so the
/// authorization layer can report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
    pub department: Option<DepartmentId>,
    pub organization: Option<UserId>,
}

/// Stored identity record behind a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub department: Option<DepartmentId>,
    pub organization: Option<UserId>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            role: self.role,
            department: self.department,
            organization: self.organization,
        }
    }
}

/// Fields for a user about to be created. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub department: Option<DepartmentId>,
    pub organization: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

/// Review state of a document. Only `Pending` is ever assigned today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub file: String,
    pub uploaded_by: UserId,
    pub adviser: UserId,
    pub department: DepartmentId,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
}

/// Fields for a document about to be created.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub file: String,
    pub uploaded_by: UserId,
    pub adviser: UserId,
    pub department: DepartmentId,
}

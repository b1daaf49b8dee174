//! Action table and the `can_perform` decision.

use std::fmt;

use crate::error::{OrbitError, Result};
use crate::model::{Document, Principal, Role, UserId};

use super::visibility::{visibility_filter, DEAN_WITHOUT_DEPARTMENT};

/// Operations a principal can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CreateOrganization,
    RegisterUser,
    CreateDepartment,
    UploadDocument,
    ListDocuments,
    ViewProfile,
    ViewDocument,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::CreateOrganization => "create-organization",
            Action::RegisterUser => "register-user",
            Action::CreateDepartment => "create-department",
            Action::UploadDocument => "upload-document",
            Action::ListDocuments => "list-documents",
            Action::ViewProfile => "view-profile",
            Action::ViewDocument => "view-document",
        }
    }

    /// Roles allowed to attempt this action at all.
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Action::CreateOrganization | Action::RegisterUser | Action::CreateDepartment => {
                &[Role::Admin]
            }
            Action::UploadDocument
            | Action::ListDocuments
            | Action::ViewProfile
            | Action::ViewDocument => &Role::ALL,
        }
    }

    fn target(self) -> ResourceKind {
        match self {
            Action::CreateOrganization => ResourceKind::Organization,
            Action::RegisterUser => ResourceKind::User,
            Action::CreateDepartment => ResourceKind::Department,
            Action::UploadDocument | Action::ViewDocument => ResourceKind::Document,
            Action::ListDocuments => ResourceKind::DocumentCollection,
            Action::ViewProfile => ResourceKind::Profile,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Organization,
    User,
    Department,
    Document,
    DocumentCollection,
    Profile,
}

/// What an action is aimed at.
///
/// `Document(None)` is a document that does not exist yet (upload);
/// `Document(Some(_))` is an existing one (read).
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Organization,
    User,
    Department,
    Document(Option<&'a Document>),
    DocumentCollection,
    Profile(UserId),
}

impl Resource<'_> {
    fn kind(&self) -> ResourceKind {
        match self {
            Resource::Organization => ResourceKind::Organization,
            Resource::User => ResourceKind::User,
            Resource::Department => ResourceKind::Department,
            Resource::Document(_) => ResourceKind::Document,
            Resource::DocumentCollection => ResourceKind::DocumentCollection,
            Resource::Profile(_) => ResourceKind::Profile,
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Convert a denial into `OrbitError::Forbidden`.
    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(OrbitError::forbidden(reason)),
        }
    }
}

/// Decide whether `principal` may perform `action` on `resource`.
///
/// Deny by default: an action paired with a resource it does not target is
/// denied. The result depends only on the arguments.
pub fn can_perform(principal: &Principal, action: Action, resource: &Resource<'_>) -> Decision {
    if action.target() != resource.kind() {
        return Decision::Deny("Action does not apply to this resource");
    }
    if !action.allowed_roles().contains(&principal.role) {
        return Decision::Deny("You do not have permission to perform this action");
    }

    match (action, resource) {
        (Action::ListDocuments, _) => match visibility_filter(principal) {
            Ok(_) => Decision::Allow,
            Err(_) => Decision::Deny(DEAN_WITHOUT_DEPARTMENT),
        },
        (Action::ViewDocument, Resource::Document(Some(doc))) => {
            match visibility_filter(principal) {
                Ok(filter) if filter.matches(doc) => Decision::Allow,
                Ok(_) => Decision::Deny("Document is not visible to this principal"),
                Err(_) => Decision::Deny(DEAN_WITHOUT_DEPARTMENT),
            }
        }
        (Action::ViewDocument, _) => Decision::Deny("Document does not exist"),
        (Action::UploadDocument, Resource::Document(Some(_))) => {
            Decision::Deny("Uploads always create a new document")
        }
        (Action::ViewProfile, Resource::Profile(owner)) if *owner != principal.id => {
            Decision::Deny("Profiles are only visible to their owner")
        }
        _ => Decision::Allow,
    }
}

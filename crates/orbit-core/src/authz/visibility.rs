//! Role-scoped document visibility.

use crate::error::{OrbitError, Result};
use crate::model::{DepartmentId, Document, Principal, Role, UserId};

/// Predicate over documents a principal may list or read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFilter {
    /// Every document.
    All,
    /// Documents assigned to this adviser.
    Adviser(UserId),
    /// Documents filed under this department.
    Department(DepartmentId),
    /// Documents uploaded by this user.
    UploadedBy(UserId),
}

impl DocumentFilter {
    pub fn matches(&self, doc: &Document) -> bool {
        match *self {
            DocumentFilter::All => true,
            DocumentFilter::Adviser(id) => doc.adviser == id,
            DocumentFilter::Department(id) => doc.department == id,
            DocumentFilter::UploadedBy(id) => doc.uploaded_by == id,
        }
    }
}

pub(crate) const DEAN_WITHOUT_DEPARTMENT: &str = "Dean is not assigned to a department";

/// Compute the visibility filter for `principal`.
///
/// A dean without a department is a configuration error and is reported as
/// forbidden rather than silently yielding an empty listing.
pub fn visibility_filter(principal: &Principal) -> Result<DocumentFilter> {
    match principal.role {
        Role::Admin => Ok(DocumentFilter::All),
        Role::Adviser => Ok(DocumentFilter::Adviser(principal.id)),
        Role::Organization => Ok(DocumentFilter::UploadedBy(principal.id)),
        Role::Dean => principal
            .department
            .map(DocumentFilter::Department)
            .ok_or_else(|| OrbitError::forbidden(DEAN_WITHOUT_DEPARTMENT)),
    }
}

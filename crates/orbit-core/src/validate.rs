//! Synchronous request validation.
//!
//! Every check here runs before any store write. Existence and uniqueness are
//! not checked here: they belong to the stores, which report them
//! authoritatively.

use serde::{Deserialize, Deserializer};

use crate::error::{OrbitError, Result};
use crate::model::{DepartmentId, Role, UserId};

/// `POST /register/` body.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub department: Option<u64>,
    #[serde(default, rename = "organizationId", deserialize_with = "lenient_id")]
    pub organization_id: Option<u64>,
}

/// `POST /create-organization/` body.
#[derive(Debug, Default, Deserialize)]
pub struct CreateOrganizationRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, rename = "departmentId", deserialize_with = "lenient_id")]
    pub department_id: Option<u64>,
}

/// `POST /create-department/` body.
#[derive(Debug, Default, Deserialize)]
pub struct CreateDepartmentRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// Text parts of the `POST /upload-document/` multipart form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub title: Option<String>,
    pub file_name: Option<String>,
    pub adviser_id: Option<String>,
    pub department_id: Option<String>,
}

/// A user registration that passed every synchronous check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub department: Option<DepartmentId>,
    pub organization: Option<UserId>,
}

/// An upload that passed every synchronous check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub title: String,
    pub file_name: String,
    pub adviser: UserId,
    pub department: DepartmentId,
}

pub fn validate_registration(req: RegisterUserRequest) -> Result<Registration> {
    let (Some(name), Some(email), Some(password), Some(role)) = (
        present(req.name),
        present(req.email),
        present(req.password),
        present(req.role),
    ) else {
        return Err(OrbitError::validation("All fields are required"));
    };
    let role: Role = role.parse()?;

    if role.requires_department() && req.department.is_none() {
        return Err(OrbitError::validation(format!("{role}s must have a department")));
    }
    if role == Role::Admin && req.department.is_some() {
        return Err(OrbitError::validation("Admins should not have a department"));
    }
    if role.requires_organization() && req.organization_id.is_none() {
        return Err(OrbitError::validation(
            "Advisers must be assigned to an organization",
        ));
    }

    Ok(Registration {
        name,
        email,
        password,
        role,
        department: req.department.map(DepartmentId),
        organization: req.organization_id.map(UserId),
    })
}

pub fn validate_organization(req: CreateOrganizationRequest) -> Result<Registration> {
    let (Some(name), Some(email), Some(password), Some(department)) = (
        present(req.name),
        present(req.email),
        present(req.password),
        req.department_id,
    ) else {
        return Err(OrbitError::validation(
            "Organization name, email, password, and department are required",
        ));
    };

    Ok(Registration {
        name,
        email,
        password,
        role: Role::Organization,
        department: Some(DepartmentId(department)),
        organization: None,
    })
}

pub fn validate_department(req: CreateDepartmentRequest) -> Result<String> {
    present(req.name).ok_or_else(|| OrbitError::validation("Department name is required"))
}

pub fn validate_upload(form: UploadForm) -> Result<Upload> {
    let (Some(title), Some(file_name), Some(adviser), Some(department)) = (
        present(form.title),
        form.file_name.as_deref().and_then(sanitize_file_name),
        present(form.adviser_id),
        present(form.department_id),
    ) else {
        return Err(OrbitError::validation("All fields are required"));
    };

    Ok(Upload {
        title,
        file_name,
        adviser: UserId(parse_id("adviser_id", &adviser)?),
        department: DepartmentId(parse_id("department_id", &department)?),
    })
}

/// Keep only the final path component of a client-supplied file name.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_string())
}

fn present(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

fn parse_id(field: &str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(OrbitError::validation(format!(
            "{field} must be a positive integer"
        ))),
        Ok(id) => Ok(id),
    }
}

/// Accept ids as JSON numbers or numeric strings. `null`, `""` and `0` count
/// as absent.
fn lenient_id<'de, D>(de: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    match Option::<Raw>::deserialize(de)? {
        None | Some(Raw::Num(0)) => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Str(s)) => match s.trim().parse::<u64>() {
            Ok(0) => Ok(None),
            Ok(n) => Ok(Some(n)),
            Err(_) => Err(serde::de::Error::custom(format!("invalid id: {s}"))),
        },
    }
}

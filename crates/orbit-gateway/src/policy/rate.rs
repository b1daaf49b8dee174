//! Rate strings and endpoint groups.
//!
//! Rates are written `N/unit` where unit is one of `s`, `m`, `h`, `d`
//! (long spellings `sec`, `min`, `hour`, `day` and their plurals accepted).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use orbit_core::error::{OrbitError, Result};

/// A quota: at most `limit` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub limit: u32,
    pub window: Duration,
}

impl Rate {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }
}

impl FromStr for Rate {
    type Err = OrbitError;

    fn from_str(s: &str) -> Result<Self> {
        // format: "5/m"
        let (n, unit) = s.split_once('/').ok_or_else(|| {
            OrbitError::validation(format!("invalid rate: {s} (expected N/unit)"))
        })?;

        let limit: u32 = n
            .trim()
            .parse()
            .map_err(|_| OrbitError::validation(format!("invalid rate count: {n}")))?;
        if limit == 0 {
            return Err(OrbitError::validation(format!(
                "invalid rate: {s} (count must be positive)"
            )));
        }

        let secs = match unit.trim() {
            "s" | "sec" | "secs" | "second" | "seconds" => 1,
            "m" | "min" | "mins" | "minute" | "minutes" => 60,
            "h" | "hour" | "hours" => 3_600,
            "d" | "day" | "days" => 86_400,
            other => {
                return Err(OrbitError::validation(format!("invalid rate unit: {other}")));
            }
        };

        Ok(Rate::new(limit, Duration::from_secs(secs)))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}s", self.limit, self.window.as_secs())
    }
}

/// Rate-limit bucket shared by one or more routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndpointGroup {
    Login,
    TokenRefresh,
    Profile,
    CreateOrganization,
    RegisterUser,
    CreateDepartment,
    UploadDocument,
    ListDocuments,
    ViewDocument,
}

impl EndpointGroup {
    pub const ALL: [EndpointGroup; 9] = [
        EndpointGroup::Login,
        EndpointGroup::TokenRefresh,
        EndpointGroup::Profile,
        EndpointGroup::CreateOrganization,
        EndpointGroup::RegisterUser,
        EndpointGroup::CreateDepartment,
        EndpointGroup::UploadDocument,
        EndpointGroup::ListDocuments,
        EndpointGroup::ViewDocument,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EndpointGroup::Login => "login",
            EndpointGroup::TokenRefresh => "token-refresh",
            EndpointGroup::Profile => "profile",
            EndpointGroup::CreateOrganization => "create-organization",
            EndpointGroup::RegisterUser => "register-user",
            EndpointGroup::CreateDepartment => "create-department",
            EndpointGroup::UploadDocument => "upload-document",
            EndpointGroup::ListDocuments => "list-documents",
            EndpointGroup::ViewDocument => "view-document",
        }
    }
}

impl fmt::Display for EndpointGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointGroup {
    type Err = OrbitError;

    fn from_str(s: &str) -> Result<Self> {
        EndpointGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| OrbitError::validation(format!("unknown rate limit group: {s}")))
    }
}

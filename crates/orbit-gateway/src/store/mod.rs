//! Storage seams: identity records, documents and uploaded files.
//!
//! Uniqueness (department name, user email) is enforced inside the stores
//! under their write locks, so `StoreError::Conflict` is the authoritative
//! source of conflicts. Callers do not pre-check.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use orbit_core::authz::DocumentFilter;
use orbit_core::error::OrbitError;
use orbit_core::model::{
    Department, DepartmentId, Document, DocumentId, NewDocument, NewUser, User, UserId,
};

pub mod files;
pub mod memory;

pub use files::{InMemoryFileStore, LocalDirFileStore};
pub use memory::InMemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("storage failure: {0}")]
    Unexpected(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for OrbitError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => OrbitError::NotFound(msg),
            StoreError::Conflict(msg) => OrbitError::Conflict(msg),
            StoreError::Unexpected(msg) => OrbitError::Internal(msg),
        }
    }
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get_user(&self, id: UserId) -> StoreResult<User>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Fails with `Conflict("Email already exists")` on a duplicate email.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn get_department(&self, id: DepartmentId) -> StoreResult<Department>;
    /// Fails with `Conflict("Department already exists")` on a duplicate name.
    async fn create_department(&self, name: &str) -> StoreResult<Department>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, doc: NewDocument) -> StoreResult<Document>;
    /// Matching documents in ascending id order.
    async fn list_documents(&self, filter: &DocumentFilter) -> StoreResult<Vec<Document>>;
    async fn get_document(&self, id: DocumentId) -> StoreResult<Document>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `body` and return its path (`documents/<name>`). Name clashes get
    /// a numeric suffix instead of overwriting.
    async fn put(&self, file_name: &str, body: Bytes) -> StoreResult<String>;
    async fn get(&self, path: &str) -> StoreResult<Bytes>;
}

//! In-memory identity and document store.
//!
//! Not durable: all state is lost on restart. Each record family sits behind
//! one `tokio::sync::RwLock`, so an insert and its uniqueness check happen
//! under the same write guard.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use orbit_core::authz::DocumentFilter;
use orbit_core::model::{
    Department, DepartmentId, Document, DocumentId, DocumentStatus, NewDocument, NewUser, User,
    UserId,
};

use super::{DocumentStore, IdentityStore, StoreError, StoreResult};

#[derive(Default)]
struct Identities {
    next_user: u64,
    next_department: u64,
    users: BTreeMap<UserId, User>,
    by_email: HashMap<String, UserId>,
    departments: BTreeMap<DepartmentId, Department>,
    by_department_name: HashMap<String, DepartmentId>,
}

#[derive(Default)]
struct Documents {
    next_id: u64,
    items: BTreeMap<DocumentId, Document>,
}

#[derive(Default)]
pub struct InMemoryStore {
    identities: RwLock<Identities>,
    documents: RwLock<Documents>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.identities
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("User not found".into()))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let ids = self.identities.read().await;
        Ok(ids.by_email.get(email).and_then(|id| ids.users.get(id)).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut ids = self.identities.write().await;
        if ids.by_email.contains_key(&user.email) {
            return Err(StoreError::Conflict("Email already exists".into()));
        }

        ids.next_user += 1;
        let id = UserId(ids.next_user);
        let record = User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            department: user.department,
            organization: user.organization,
        };
        ids.by_email.insert(record.email.clone(), id);
        ids.users.insert(id, record.clone());
        Ok(record)
    }

    async fn get_department(&self, id: DepartmentId) -> StoreResult<Department> {
        self.identities
            .read()
            .await
            .departments
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Department not found".into()))
    }

    async fn create_department(&self, name: &str) -> StoreResult<Department> {
        let mut ids = self.identities.write().await;
        if ids.by_department_name.contains_key(name) {
            return Err(StoreError::Conflict("Department already exists".into()));
        }

        ids.next_department += 1;
        let dept = Department {
            id: DepartmentId(ids.next_department),
            name: name.to_string(),
        };
        ids.by_department_name.insert(dept.name.clone(), dept.id);
        ids.departments.insert(dept.id, dept.clone());
        Ok(dept)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create_document(&self, doc: NewDocument) -> StoreResult<Document> {
        let mut docs = self.documents.write().await;
        docs.next_id += 1;
        let record = Document {
            id: DocumentId(docs.next_id),
            title: doc.title,
            file: doc.file,
            uploaded_by: doc.uploaded_by,
            adviser: doc.adviser,
            department: doc.department,
            status: DocumentStatus::default(),
            uploaded_at: Utc::now(),
        };
        docs.items.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_documents(&self, filter: &DocumentFilter) -> StoreResult<Vec<Document>> {
        Ok(self
            .documents
            .read()
            .await
            .items
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }

    async fn get_document(&self, id: DocumentId) -> StoreResult<Document> {
        self.documents
            .read()
            .await
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Document not found".into()))
    }
}

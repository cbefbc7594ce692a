use super::domain::{
    ApplicationId, Document, DocumentDraft, DocumentId, LoanApplication, Notification,
    NotificationDraft, NotificationId, Role, User, UserId,
};

/// Storage abstraction so the service module can run against fakes or a real backend.
pub trait ApplicationRepository: Send + Sync {
    /// Reserve the identifier for the next application.
    fn next_id(&self) -> Result<ApplicationId, RepositoryError>;
    fn insert(&self, record: LoanApplication) -> Result<LoanApplication, RepositoryError>;
    /// Apply `change` to the stored record as one step. The record is only written back when
    /// `change` succeeds, and no other write can interleave between the read and the write.
    fn modify<T, E>(
        &self,
        id: &ApplicationId,
        change: impl FnOnce(&mut LoanApplication) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError>;
    fn list_all(&self) -> Result<Vec<LoanApplication>, RepositoryError>;
    fn list_by_applicant(&self, applicant: &UserId)
        -> Result<Vec<LoanApplication>, RepositoryError>;
}

/// Error enumeration for adapter failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Where uploaded proofs end up. The in-memory store only hands out preview handles.
pub trait DocumentStore: Send + Sync {
    /// Keep an upload, assigning its id and handle. Stored documents start out pending.
    fn store(&self, draft: DocumentDraft) -> Result<Document, RepositoryError>;
    /// An upload made by `owner`; documents uploaded by anyone else are not visible.
    fn fetch(&self, owner: &UserId, id: &DocumentId) -> Result<Option<Document>, RepositoryError>;
}

pub trait NotificationRepository: Send + Sync {
    fn push(&self, draft: NotificationDraft) -> Result<Notification, RepositoryError>;
    fn list_for(&self, user: &UserId) -> Result<Vec<Notification>, RepositoryError>;
    /// Flip the read flag; returns `NotFound` when the id is unknown for this user.
    fn mark_read(
        &self,
        user: &UserId,
        id: &NotificationId,
    ) -> Result<Notification, RepositoryError>;
}

/// Directory of known desk users.
pub trait UserDirectory: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    fn find_by_role(&self, role: Role) -> Result<Option<User>, RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
}

/// The set of adapters one deployment wires together.
pub trait Backend: Send + Sync + 'static {
    type Applications: ApplicationRepository + 'static;
    type Notifications: NotificationRepository + 'static;
    type Documents: DocumentStore + 'static;
    type Users: UserDirectory + 'static;
}

//! In-memory adapters standing in for the lending backend.
//!
//! State lives in the process and resets on restart. Each store is guarded by a single mutex,
//! so writes are serialized.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};

use super::domain::{
    ApplicationId, ApplicationSubmission, Document, DocumentDraft, DocumentId, DocumentStatus,
    EmploymentDetails, EmploymentType, LoanApplication, LoanRequest, Notification,
    NotificationDraft, NotificationId, NotificationKind, PersonalDetails, Role, User, UserId,
};
use super::repository::{
    ApplicationRepository, Backend, DocumentStore, NotificationRepository, RepositoryError,
    UserDirectory,
};

/// Wires every port to its in-memory adapter.
pub struct InMemoryBackend;

impl Backend for InMemoryBackend {
    type Applications = InMemoryApplicationRepository;
    type Notifications = InMemoryNotificationRepository;
    type Documents = InMemoryDocumentStore;
    type Users = MockUserDirectory;
}

const FIRST_APPLICATION_NUMBER: u64 = 1001;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

#[derive(Clone)]
pub struct InMemoryApplicationRepository {
    records: Arc<Mutex<BTreeMap<ApplicationId, LoanApplication>>>,
    sequence: Arc<AtomicU64>,
}

impl Default for InMemoryApplicationRepository {
    fn default() -> Self {
        Self {
            records: Arc::default(),
            sequence: Arc::new(AtomicU64::new(FIRST_APPLICATION_NUMBER)),
        }
    }
}

impl InMemoryApplicationRepository {
    pub fn len(&self) -> usize {
        self.records.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn next_id(&self) -> Result<ApplicationId, RepositoryError> {
        let number = self.sequence.fetch_add(1, Ordering::Relaxed);
        Ok(ApplicationId(format!("L-{number}")))
    }

    fn insert(&self, record: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn modify<T, E>(
        &self,
        id: &ApplicationId,
        change: impl FnOnce(&mut LoanApplication) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepositoryError>,
    {
        let mut guard = lock(&self.records)?;
        let existing = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let mut working = existing.clone();
        let outcome = change(&mut working)?;
        *existing = working;
        Ok(outcome)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(id).cloned())
    }

    fn list_all(&self) -> Result<Vec<LoanApplication>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.values().cloned().collect())
    }

    fn list_by_applicant(
        &self,
        applicant: &UserId,
    ) -> Result<Vec<LoanApplication>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard
            .values()
            .filter(|record| &record.applicant_id == applicant)
            .cloned()
            .collect())
    }
}

/// Keeps upload records keyed by id and hands out `memory://` preview handles. File contents
/// are never written anywhere.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<Mutex<BTreeMap<DocumentId, (UserId, Document)>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryDocumentStore {
    /// A store that already holds `documents`, all uploaded by `owner`.
    pub fn with_documents(owner: &UserId, documents: Vec<Document>) -> Self {
        let entries = documents
            .into_iter()
            .map(|document| (document.id.clone(), (owner.clone(), document)))
            .collect();
        Self {
            documents: Arc::new(Mutex::new(entries)),
            sequence: Arc::default(),
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn store(&self, draft: DocumentDraft) -> Result<Document, RepositoryError> {
        let mut guard = lock(&self.documents)?;
        let number = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let id = DocumentId(format!("doc-{number:06}"));
        if guard.contains_key(&id) {
            return Err(RepositoryError::Conflict);
        }

        let document = Document {
            location: format!("memory://documents/{id}/{}", draft.name),
            id: id.clone(),
            name: draft.name,
            category: draft.category,
            content_type: draft.content_type,
            size_bytes: draft.size_bytes,
            status: DocumentStatus::Pending,
            uploaded_at: Utc::now(),
        };
        guard.insert(id, (draft.owner, document.clone()));
        Ok(document)
    }

    fn fetch(&self, owner: &UserId, id: &DocumentId) -> Result<Option<Document>, RepositoryError> {
        let guard = lock(&self.documents)?;
        Ok(guard
            .get(id)
            .filter(|(uploader, _)| uploader == owner)
            .map(|(_, document)| document.clone()))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryNotificationRepository {
    notifications: Arc<Mutex<Vec<Notification>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryNotificationRepository {
    pub fn all(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl NotificationRepository for InMemoryNotificationRepository {
    fn push(&self, draft: NotificationDraft) -> Result<Notification, RepositoryError> {
        let mut guard = lock(&self.notifications)?;
        let number = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let notification = Notification {
            id: NotificationId(format!("notif-{number}")),
            user_id: draft.user_id,
            title: draft.title,
            message: draft.message,
            read: false,
            kind: draft.kind,
            created_at: Utc::now(),
            link: draft.link,
        };
        guard.push(notification.clone());
        Ok(notification)
    }

    fn list_for(&self, user: &UserId) -> Result<Vec<Notification>, RepositoryError> {
        let guard = lock(&self.notifications)?;
        // Appended in push order under the lock; walking backwards keeps same-instant pushes
        // newest first through the stable sort.
        let mut scoped: Vec<Notification> = guard
            .iter()
            .rev()
            .filter(|notification| &notification.user_id == user)
            .cloned()
            .collect();
        scoped.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(scoped)
    }

    fn mark_read(
        &self,
        user: &UserId,
        id: &NotificationId,
    ) -> Result<Notification, RepositoryError> {
        let mut guard = lock(&self.notifications)?;
        let notification = guard
            .iter_mut()
            .find(|notification| &notification.id == id && &notification.user_id == user)
            .ok_or(RepositoryError::NotFound)?;
        notification.read = true;
        Ok(notification.clone())
    }
}

/// Fixed roster of desk users; login is role selection only.
#[derive(Clone)]
pub struct MockUserDirectory {
    users: Arc<Vec<User>>,
}

impl Default for MockUserDirectory {
    fn default() -> Self {
        Self::with_users(demo_users())
    }
}

impl MockUserDirectory {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(users),
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }
}

impl UserDirectory for MockUserDirectory {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let email = email.trim();
        Ok(self
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn find_by_role(&self, role: Role) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.iter().find(|user| user.role == role).cloned())
    }

    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.iter().find(|user| &user.id == id).cloned())
    }
}

pub fn demo_users() -> Vec<User> {
    let user = |id: &str, name: &str, email: &str, role: Role, avatar: Option<&str>| User {
        id: UserId(id.to_string()),
        name: name.to_string(),
        email: email.to_string(),
        role,
        avatar_url: avatar.map(str::to_string),
    };

    vec![
        user(
            "u-1",
            "John Doe",
            "john@example.com",
            Role::Applicant,
            Some("https://github.com/shadcn.png"),
        ),
        user("u-2", "Alice Smith", "officer@apex.com", Role::Officer, None),
        user("u-3", "Bob Jones", "manager@apex.com", Role::Manager, None),
        user(
            "u-4",
            "Priya Raman",
            "underwriter@apex.com",
            Role::Underwriter,
            None,
        ),
    ]
}

/// Populate the stores with the sample application and inbox the desk starts with.
pub fn seed_demo_data(
    applications: &InMemoryApplicationRepository,
    notifications: &InMemoryNotificationRepository,
    directory: &MockUserDirectory,
) -> Result<(), RepositoryError> {
    let Some(applicant) = directory.find_by_role(Role::Applicant)? else {
        return Ok(());
    };

    let submission = ApplicationSubmission {
        personal: PersonalDetails {
            full_name: applicant.name.clone(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default(),
            pan: Some("ABCDE1234F".to_string()),
            aadhaar: Some("123456789012".to_string()),
            email: applicant.email.clone(),
            phone: "1234567890".to_string(),
            address: "123 Main St".to_string(),
        },
        employment: EmploymentDetails {
            employment_type: EmploymentType::Salaried,
            employer_name: Some("Tech Corp".to_string()),
            monthly_income: 5_000,
            experience_years: 5.0,
        },
        loan: LoanRequest {
            amount: 50_000,
            tenure_months: 24,
            purpose: "Home Renovation".to_string(),
        },
        documents: Vec::new(),
    };

    let now = Utc::now();
    let id = applications.next_id()?;
    let mut record = LoanApplication::draft(id.clone(), &applicant, submission, now);
    record.submit(now).map_err(|err| {
        RepositoryError::Unavailable(format!("seed application rejected: {err}"))
    })?;
    applications.insert(record)?;

    notifications.push(NotificationDraft {
        user_id: applicant.id.clone(),
        title: "Loan Application Received".to_string(),
        message: format!("Your application #{} has been successfully submitted.", id.0),
        kind: NotificationKind::Info,
        link: Some(format!("/applications/{}", id.0)),
    })?;

    if let Some(officer) = directory.find_by_role(Role::Officer)? {
        let assigned = notifications.push(NotificationDraft {
            user_id: officer.id.clone(),
            title: "New Assignment".to_string(),
            message: "You have been assigned a new application for review.".to_string(),
            kind: NotificationKind::Warning,
            link: Some(format!("/applications/{}", id.0)),
        })?;
        notifications.mark_read(&officer.id, &assigned.id)?;
    }

    Ok(())
}

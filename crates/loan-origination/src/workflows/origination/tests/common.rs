use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::origination::domain::{
    ApplicationId, ApplicationSubmission, Document, DocumentCategory, DocumentId, DocumentStatus,
    EmploymentDetails, EmploymentType, LoanApplication, LoanRequest, Notification,
    NotificationDraft, NotificationId, PersonalDetails, Role, User, UserId,
};
use crate::workflows::origination::memory::{
    demo_users, InMemoryApplicationRepository, InMemoryDocumentStore,
    InMemoryNotificationRepository, MockUserDirectory,
};
use crate::workflows::origination::repository::{
    ApplicationRepository, Backend, NotificationRepository, RepositoryError,
};
use crate::workflows::origination::router::{origination_router, OriginationApi, SESSION_HEADER};
use crate::workflows::origination::service::LoanOriginationService;
use crate::workflows::origination::session::Session;

pub(crate) fn personal() -> PersonalDetails {
    PersonalDetails {
        full_name: "Jane Doe".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1995, 5, 5).expect("valid date"),
        pan: None,
        aadhaar: None,
        email: "jane@x.com".to_string(),
        phone: "9998887777".to_string(),
        address: "1 Elm St".to_string(),
    }
}

pub(crate) fn employment() -> EmploymentDetails {
    EmploymentDetails {
        employment_type: EmploymentType::Salaried,
        employer_name: Some("Northwind Traders".to_string()),
        monthly_income: 6_000,
        experience_years: 3.0,
    }
}

pub(crate) fn loan_request() -> LoanRequest {
    LoanRequest {
        amount: 20_000,
        tenure_months: 24,
        purpose: "Education".to_string(),
    }
}

pub(crate) fn document(id: &str, category: DocumentCategory) -> Document {
    Document {
        id: DocumentId(id.to_string()),
        name: format!("{id}.pdf"),
        category,
        location: format!("memory://documents/{id}/{id}.pdf"),
        content_type: "application/pdf".to_string(),
        size_bytes: 1_024,
        status: DocumentStatus::Pending,
        uploaded_at: Utc
            .with_ymd_and_hms(2025, 3, 1, 8, 0, 0)
            .single()
            .expect("valid timestamp"),
    }
}

pub(crate) fn documents() -> Vec<Document> {
    vec![
        document("doc-a", DocumentCategory::IdentityProof),
        document("doc-b", DocumentCategory::IncomeProof),
        document("doc-c", DocumentCategory::BankStatement),
    ]
}

pub(crate) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        personal: personal(),
        employment: employment(),
        loan: loan_request(),
        documents: documents(),
    }
}

pub(crate) fn session(role: Role) -> Session {
    let user = demo_users()
        .into_iter()
        .find(|user| user.role == role)
        .expect("roster covers every role");
    Session::new(user)
}

/// An applicant who is not on the roster and owns nothing.
pub(crate) fn stranger() -> Session {
    Session::new(User {
        id: UserId("u-9".to_string()),
        name: "Sam Stranger".to_string(),
        email: "sam@x.com".to_string(),
        role: Role::Applicant,
        avatar_url: None,
    })
}

pub(crate) type MemoryService = LoanOriginationService<
    InMemoryApplicationRepository,
    InMemoryNotificationRepository,
    InMemoryDocumentStore,
>;

/// Document store holding the fixture proofs, uploaded by the roster applicant.
pub(crate) fn uploaded_documents() -> InMemoryDocumentStore {
    InMemoryDocumentStore::with_documents(session(Role::Applicant).user_id(), documents())
}

pub(crate) fn build_service() -> (
    MemoryService,
    Arc<InMemoryApplicationRepository>,
    Arc<InMemoryNotificationRepository>,
) {
    let repository = Arc::new(InMemoryApplicationRepository::default());
    let notifications = Arc::new(InMemoryNotificationRepository::default());
    let service = LoanOriginationService::new(
        repository.clone(),
        notifications.clone(),
        Arc::new(uploaded_documents()),
    );
    (service, repository, notifications)
}

pub(crate) fn build_api<B>(
    applications: B::Applications,
    notifications: B::Notifications,
    documents: B::Documents,
    users: B::Users,
) -> Arc<OriginationApi<B>>
where
    B: Backend,
{
    Arc::new(OriginationApi::new(
        Arc::new(applications),
        Arc::new(notifications),
        Arc::new(documents),
        Arc::new(users),
    ))
}

pub(crate) fn memory_router() -> axum::Router {
    let api = build_api::<crate::workflows::origination::memory::InMemoryBackend>(
        InMemoryApplicationRepository::default(),
        InMemoryNotificationRepository::default(),
        uploaded_documents(),
        MockUserDirectory::default(),
    );
    origination_router(api)
}

pub(crate) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn next_id(&self) -> Result<ApplicationId, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _record: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn modify<T, E>(
        &self,
        _id: &ApplicationId,
        _change: impl FnOnce(&mut LoanApplication) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_all(&self) -> Result<Vec<LoanApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_by_applicant(
        &self,
        _applicant: &UserId,
    ) -> Result<Vec<LoanApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Hands out an id that is already taken.
pub(crate) struct ConflictRepository;

impl ApplicationRepository for ConflictRepository {
    fn next_id(&self) -> Result<ApplicationId, RepositoryError> {
        Ok(ApplicationId("L-1001".to_string()))
    }

    fn insert(&self, _record: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn modify<T, E>(
        &self,
        _id: &ApplicationId,
        _change: impl FnOnce(&mut LoanApplication) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("read only".to_string()).into())
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        Ok(None)
    }

    fn list_all(&self) -> Result<Vec<LoanApplication>, RepositoryError> {
        Ok(Vec::new())
    }

    fn list_by_applicant(
        &self,
        _applicant: &UserId,
    ) -> Result<Vec<LoanApplication>, RepositoryError> {
        Ok(Vec::new())
    }
}

/// Inbox that refuses every write.
pub(crate) struct OfflineInbox;

impl NotificationRepository for OfflineInbox {
    fn push(&self, _draft: NotificationDraft) -> Result<Notification, RepositoryError> {
        Err(RepositoryError::Unavailable("inbox offline".to_string()))
    }

    fn list_for(&self, _user: &UserId) -> Result<Vec<Notification>, RepositoryError> {
        Err(RepositoryError::Unavailable("inbox offline".to_string()))
    }

    fn mark_read(
        &self,
        _user: &UserId,
        _id: &NotificationId,
    ) -> Result<Notification, RepositoryError> {
        Err(RepositoryError::Unavailable("inbox offline".to_string()))
    }
}

pub(crate) struct OfflineInboxBackend;

impl Backend for OfflineInboxBackend {
    type Applications = InMemoryApplicationRepository;
    type Notifications = OfflineInbox;
    type Documents = InMemoryDocumentStore;
    type Users = MockUserDirectory;
}

pub(crate) struct UnavailableBackend;

impl Backend for UnavailableBackend {
    type Applications = UnavailableRepository;
    type Notifications = InMemoryNotificationRepository;
    type Documents = InMemoryDocumentStore;
    type Users = MockUserDirectory;
}

pub(crate) fn json_request(
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: &Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header(SESSION_HEADER, user);
    }
    builder
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("request")
}

pub(crate) fn get_request(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user) = user {
        builder = builder.header(SESSION_HEADER, user);
    }
    builder.body(Body::empty()).expect("request")
}

pub(crate) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json payload")
}

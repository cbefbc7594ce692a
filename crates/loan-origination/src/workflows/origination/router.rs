use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::documents::{DocumentError, DocumentService, FileUpload};
use super::domain::{
    ApplicationId, ApplicationStatus, ApplicationSubmission, DocumentCategory, DocumentId,
    DocumentStatus, NotificationId, Role, UserId,
};
use super::emi::{self, EmiQuote, Installment};
use super::repository::{Backend, RepositoryError};
use super::sanction::OfferResponse;
use super::service::{LoanOriginationService, OriginationServiceError};
use super::session::{AuthError, AuthService, Session};

/// Header carrying the id of the signed-in user.
pub const SESSION_HEADER: &str = "x-user-id";

/// Everything the HTTP surface needs, built over one set of adapters.
pub struct OriginationApi<B: Backend> {
    pub applications: LoanOriginationService<B::Applications, B::Notifications, B::Documents>,
    pub documents: DocumentService<B::Documents>,
    pub auth: AuthService<B::Users>,
}

impl<B: Backend> OriginationApi<B> {
    pub fn new(
        applications: Arc<B::Applications>,
        notifications: Arc<B::Notifications>,
        documents: Arc<B::Documents>,
        users: Arc<B::Users>,
    ) -> Self {
        Self {
            applications: LoanOriginationService::new(
                applications,
                notifications,
                documents.clone(),
            ),
            documents: DocumentService::new(documents),
            auth: AuthService::new(users),
        }
    }
}

/// Router builder exposing intake, review, and inbox endpoints.
pub fn origination_router<B: Backend>(api: Arc<OriginationApi<B>>) -> Router {
    Router::new()
        .route(
            "/api/v1/session",
            get(current_session_handler::<B>).post(login_handler::<B>),
        )
        .route(
            "/api/v1/applications",
            get(list_handler::<B>).post(submit_handler::<B>),
        )
        .route("/api/v1/applications/export", get(export_handler::<B>))
        .route("/api/v1/applications/:application_id", get(detail_handler::<B>))
        .route(
            "/api/v1/applications/:application_id/status",
            post(status_handler::<B>),
        )
        .route(
            "/api/v1/applications/:application_id/approve",
            post(approve_handler::<B>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler::<B>),
        )
        .route(
            "/api/v1/applications/:application_id/documents/:document_id/status",
            post(document_status_handler::<B>),
        )
        .route(
            "/api/v1/applications/:application_id/sanction-letter",
            get(sanction_letter_handler::<B>),
        )
        .route(
            "/api/v1/applications/:application_id/sanction-letter/response",
            post(offer_response_handler::<B>),
        )
        .route("/api/v1/documents", post(upload_handler::<B>))
        .route("/api/v1/dashboard", get(dashboard_handler::<B>))
        .route("/api/v1/notifications", get(notifications_handler::<B>))
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(mark_read_handler::<B>),
        )
        .route("/api/v1/emi/quote", post(emi_quote_handler))
        .with_state(api)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChangeRequest {
    status: ApplicationStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DecisionRequest {
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentStatusRequest {
    status: DocumentStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OfferResponseRequest {
    response: OfferResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadRequest {
    file_name: String,
    size_bytes: u64,
    category: DocumentCategory,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmiQuoteRequest {
    principal: u64,
    tenure_months: u32,
    #[serde(default = "default_rate")]
    annual_rate_pct: f64,
    #[serde(default)]
    include_schedule: bool,
}

fn default_rate() -> f64 {
    emi::ANNUAL_RATE_PCT
}

#[derive(Debug, Serialize)]
struct EmiQuoteResponse {
    quote: EmiQuote,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<Vec<Installment>>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({
        "error": message.into(),
    });
    (status, axum::Json(payload)).into_response()
}

fn repository_error_response(error: &RepositoryError) -> Response {
    let status = match error {
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(status, error.to_string())
}

pub(crate) fn service_error_response(error: OriginationServiceError) -> Response {
    match error {
        OriginationServiceError::Validation(errors) => {
            let payload = json!({
                "error": errors.to_string(),
                "fields": errors.errors,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        OriginationServiceError::InvalidDocumentStatus(_)
        | OriginationServiceError::UnknownDocument(_) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
        }
        OriginationServiceError::ApplicationNotFound(_)
        | OriginationServiceError::DocumentNotFound(_)
        | OriginationServiceError::NotificationNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, error.to_string())
        }
        OriginationServiceError::Authorization(_) => {
            error_response(StatusCode::FORBIDDEN, error.to_string())
        }
        OriginationServiceError::Transition(_) | OriginationServiceError::Sanction(_) => {
            error_response(StatusCode::CONFLICT, error.to_string())
        }
        OriginationServiceError::Repository(ref repository) => {
            repository_error_response(repository)
        }
        OriginationServiceError::Register(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}

fn auth_error_response(error: AuthError) -> Response {
    match error {
        AuthError::Directory(ref repository) => repository_error_response(repository),
        other => error_response(StatusCode::UNAUTHORIZED, other.to_string()),
    }
}

/// Resolve the caller from the session header, or answer 401.
fn resolve_session<B: Backend>(
    api: &OriginationApi<B>,
    headers: &HeaderMap,
) -> Result<Session, Response> {
    let user_id = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            error_response(
                StatusCode::UNAUTHORIZED,
                format!("missing {SESSION_HEADER} header"),
            )
        })?;

    match api.auth.current(&UserId(user_id.to_string())) {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(error_response(
            StatusCode::UNAUTHORIZED,
            format!("unknown user {user_id}"),
        )),
        Err(err) => Err(auth_error_response(err)),
    }
}

fn respond<T: Serialize>(
    status: StatusCode,
    result: Result<T, OriginationServiceError>,
) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn login_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    axum::Json(request): axum::Json<LoginRequest>,
) -> Response {
    let result = match (request.email, request.role) {
        (Some(email), _) => api.auth.login(&email),
        (None, Some(role)) => api.auth.login_as(role),
        (None, None) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "provide an email or a role",
            )
        }
    };

    match result {
        Ok(session) => (StatusCode::OK, axum::Json(session.user)).into_response(),
        Err(err) => auth_error_response(err),
    }
}

pub(crate) async fn current_session_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
) -> Response {
    match resolve_session(&api, &headers) {
        Ok(session) => (StatusCode::OK, axum::Json(session.user)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn list_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    respond(StatusCode::OK, api.applications.list(&session))
}

pub(crate) async fn submit_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    respond(
        StatusCode::CREATED,
        api.applications.submit(&session, submission),
    )
}

pub(crate) async fn export_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let mut buffer = Vec::new();
    match api.applications.export_register(&session, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            buffer,
        )
            .into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn detail_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        api.applications
            .get(&session, &ApplicationId(application_id)),
    )
}

pub(crate) async fn status_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<StatusChangeRequest>,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        api.applications
            .update_status(&session, &ApplicationId(application_id), request.status)
            .map(|record| record.status_view()),
    )
}

pub(crate) async fn approve_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        api.applications
            .approve(&session, &ApplicationId(application_id), request.notes)
            .map(|record| record.status_view()),
    )
}

pub(crate) async fn reject_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        api.applications
            .reject(&session, &ApplicationId(application_id), request.notes)
            .map(|record| record.status_view()),
    )
}

pub(crate) async fn document_status_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
    Path((application_id, document_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<DocumentStatusRequest>,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        api.applications.set_document_status(
            &session,
            &ApplicationId(application_id),
            &DocumentId(document_id),
            request.status,
        ),
    )
}

pub(crate) async fn sanction_letter_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        api.applications
            .sanction_letter(&session, &ApplicationId(application_id)),
    )
}

pub(crate) async fn offer_response_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<OfferResponseRequest>,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        api.applications.respond_to_offer(
            &session,
            &ApplicationId(application_id),
            request.response,
        ),
    )
}

pub(crate) async fn upload_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<UploadRequest>,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let upload = FileUpload {
        file_name: request.file_name,
        size_bytes: request.size_bytes,
    };

    match api.documents.upload(&session, upload, request.category) {
        Ok(document) => (StatusCode::CREATED, axum::Json(document)).into_response(),
        Err(DocumentError::Authorization(err)) => {
            error_response(StatusCode::FORBIDDEN, err.to_string())
        }
        Err(DocumentError::Store(err)) => repository_error_response(&err),
        Err(other) => error_response(StatusCode::UNPROCESSABLE_ENTITY, other.to_string()),
    }
}

pub(crate) async fn dashboard_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    respond(StatusCode::OK, api.applications.dashboard(&session))
}

pub(crate) async fn notifications_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    respond(StatusCode::OK, api.applications.notifications(&session))
}

pub(crate) async fn mark_read_handler<B: Backend>(
    State(api): State<Arc<OriginationApi<B>>>,
    headers: HeaderMap,
    Path(notification_id): Path<String>,
) -> Response {
    let session = match resolve_session(&api, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        api.applications
            .mark_notification_read(&session, &NotificationId(notification_id)),
    )
}

pub(crate) async fn emi_quote_handler(
    axum::Json(request): axum::Json<EmiQuoteRequest>,
) -> Response {
    let quote = match emi::quote(
        request.principal,
        request.tenure_months,
        request.annual_rate_pct,
    ) {
        Ok(quote) => quote,
        Err(err) => {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
    };

    let schedule = if request.include_schedule {
        match emi::schedule(
            request.principal,
            request.tenure_months,
            request.annual_rate_pct,
        ) {
            Ok(rows) => Some(rows),
            Err(err) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        }
    } else {
        None
    };

    (
        StatusCode::OK,
        axum::Json(EmiQuoteResponse { quote, schedule }),
    )
        .into_response()
}

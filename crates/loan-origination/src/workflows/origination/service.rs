use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::dashboard::{summarize, DashboardSummary};
use super::domain::{
    ApplicationId, ApplicationStatus, ApplicationSubmission, Document, DocumentId,
    DocumentStatus, LoanApplication, Notification, NotificationDraft, NotificationId,
    NotificationKind,
};
use super::lifecycle::TransitionError;
use super::policy::{authorize, authorize_read, AuthorizationError, Capability};
use super::register::write_register;
use super::repository::{
    ApplicationRepository, DocumentStore, NotificationRepository, RepositoryError,
};
use super::sanction::{OfferResponse, SanctionError, SanctionLetter};
use super::session::Session;
use super::validation::{Validate, ValidationErrors};

/// Service composing the application store, the applicant inbox, and the uploaded proofs behind
/// the access policy.
pub struct LoanOriginationService<R, N, D> {
    repository: Arc<R>,
    notifications: Arc<N>,
    documents: Arc<D>,
}

/// Notifications for one user, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationFeed {
    pub unread: usize,
    pub notifications: Vec<Notification>,
}

impl<R, N, D> LoanOriginationService<R, N, D>
where
    R: ApplicationRepository + 'static,
    N: NotificationRepository + 'static,
    D: DocumentStore + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, documents: Arc<D>) -> Self {
        Self {
            repository,
            notifications,
            documents,
        }
    }

    /// Turn a completed wizard into a submitted application.
    pub fn submit(
        &self,
        session: &Session,
        mut submission: ApplicationSubmission,
    ) -> Result<LoanApplication, OriginationServiceError> {
        authorize(session.role(), Capability::SubmitApplication)?;
        submission.documents = self.uploaded_documents(session, &submission.documents)?;
        submission.validate()?;

        let now = Utc::now();
        let id = self.repository.next_id()?;
        let mut record = LoanApplication::draft(id, &session.user, submission, now);
        record.submit(now)?;
        let stored = self.repository.insert(record)?;

        info!(
            application_id = %stored.id.0,
            applicant = %stored.applicant_id.0,
            amount = stored.requested_amount(),
            "loan application submitted"
        );
        self.notify(
            &stored,
            NotificationKind::Info,
            "Loan Application Received",
            format!(
                "Your application #{} has been successfully submitted.",
                stored.id.0
            ),
        );

        Ok(stored)
    }

    /// Replace client-sent documents with the records the store issued to this applicant.
    /// Repeated ids collapse to one document.
    fn uploaded_documents(
        &self,
        session: &Session,
        claimed: &[Document],
    ) -> Result<Vec<Document>, OriginationServiceError> {
        let mut resolved: Vec<Document> = Vec::with_capacity(claimed.len());
        for document in claimed {
            if resolved.iter().any(|known| known.id == document.id) {
                continue;
            }
            let stored = self
                .documents
                .fetch(session.user_id(), &document.id)?
                .ok_or_else(|| OriginationServiceError::UnknownDocument(document.id.clone()))?;
            resolved.push(stored);
        }
        Ok(resolved)
    }

    pub fn get(
        &self,
        session: &Session,
        id: &ApplicationId,
    ) -> Result<LoanApplication, OriginationServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or_else(|| OriginationServiceError::ApplicationNotFound(id.clone()))?;
        authorize_read(&session.user, &record)?;
        Ok(record)
    }

    /// Applications visible to the session, most recently updated first.
    pub fn list(&self, session: &Session) -> Result<Vec<LoanApplication>, OriginationServiceError> {
        let mut records = if authorize(session.role(), Capability::ViewAllApplications).is_ok() {
            self.repository.list_all()?
        } else {
            self.repository.list_by_applicant(session.user_id())?
        };
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));
        Ok(records)
    }

    /// Move an application along the reviewer workflow.
    pub fn update_status(
        &self,
        session: &Session,
        id: &ApplicationId,
        target: ApplicationStatus,
    ) -> Result<LoanApplication, OriginationServiceError> {
        self.decide(session, id, target, None)
    }

    pub fn approve(
        &self,
        session: &Session,
        id: &ApplicationId,
        notes: Option<String>,
    ) -> Result<LoanApplication, OriginationServiceError> {
        self.decide(session, id, ApplicationStatus::Approved, notes)
    }

    pub fn reject(
        &self,
        session: &Session,
        id: &ApplicationId,
        notes: Option<String>,
    ) -> Result<LoanApplication, OriginationServiceError> {
        self.decide(session, id, ApplicationStatus::Rejected, notes)
    }

    fn decide(
        &self,
        session: &Session,
        id: &ApplicationId,
        target: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<LoanApplication, OriginationServiceError> {
        authorize(session.role(), Capability::ReviewApplication)?;
        let (from, record) = self
            .repository
            .modify(id, |record| -> Result<_, OriginationServiceError> {
                authorize_read(&session.user, record)?;
                let from = record.status;
                if let Err(err) = record.transition(target, Utc::now()) {
                    warn!(
                        application_id = %id.0,
                        from = from.label(),
                        to = target.label(),
                        "status change refused"
                    );
                    return Err(err.into());
                }
                if let Some(notes) = notes.map(|notes| notes.trim().to_string()) {
                    if !notes.is_empty() {
                        record.officer_notes = Some(notes);
                    }
                }
                Ok((from, record.clone()))
            })
            .map_err(|err| not_found_as_application(err, id))?;

        info!(
            application_id = %record.id.0,
            from = from.label(),
            status = target.label(),
            role = session.role().label(),
            "application status changed"
        );
        let (kind, title, message) = status_notice(&record);
        self.notify(&record, kind, title, message);

        Ok(record)
    }

    /// Reviewer verdict on a single uploaded proof.
    pub fn set_document_status(
        &self,
        session: &Session,
        id: &ApplicationId,
        document_id: &DocumentId,
        status: DocumentStatus,
    ) -> Result<Document, OriginationServiceError> {
        authorize(session.role(), Capability::ReviewApplication)?;
        if status == DocumentStatus::Pending {
            return Err(OriginationServiceError::InvalidDocumentStatus(status));
        }

        let updated = self
            .repository
            .modify(id, |record| -> Result<_, OriginationServiceError> {
                authorize_read(&session.user, record)?;
                if record.status.is_terminal() {
                    return Err(TransitionError::Terminal(record.status).into());
                }
                let document = record
                    .documents
                    .iter_mut()
                    .find(|document| &document.id == document_id)
                    .ok_or_else(|| {
                        OriginationServiceError::DocumentNotFound(document_id.clone())
                    })?;
                document.status = status;
                let updated = document.clone();
                record.touch(Utc::now());
                Ok(updated)
            })
            .map_err(|err| not_found_as_application(err, id))?;
        info!(
            application_id = %id.0,
            document_id = %document_id.0,
            status = ?status,
            "document reviewed"
        );
        Ok(updated)
    }

    pub fn dashboard(
        &self,
        session: &Session,
    ) -> Result<DashboardSummary, OriginationServiceError> {
        let visible = self.list(session)?;
        Ok(summarize(&visible))
    }

    pub fn sanction_letter(
        &self,
        session: &Session,
        id: &ApplicationId,
    ) -> Result<SanctionLetter, OriginationServiceError> {
        let record = self.get(session, id)?;
        Ok(SanctionLetter::issue(&record)?)
    }

    /// Record the applicant's answer to the offer. The application status is left as is.
    pub fn respond_to_offer(
        &self,
        session: &Session,
        id: &ApplicationId,
        response: OfferResponse,
    ) -> Result<Notification, OriginationServiceError> {
        authorize(session.role(), Capability::RespondToOffer)?;
        let letter = self.sanction_letter(session, id)?;

        info!(
            application_id = %id.0,
            response = response.label(),
            "sanction offer answered"
        );
        let (kind, title) = match response {
            OfferResponse::Accept => (NotificationKind::Success, "Offer Accepted"),
            OfferResponse::Decline => (NotificationKind::Warning, "Offer Declined"),
        };
        let notification = self.notifications.push(NotificationDraft {
            user_id: session.user_id().clone(),
            title: title.to_string(),
            message: format!(
                "You {} the offer of {} over {} months for application #{}.",
                response.label(),
                letter.sanctioned_amount,
                letter.tenure_months,
                letter.reference.0
            ),
            kind,
            link: Some(format!("/applications/{}/sanction-letter", id.0)),
        })?;
        Ok(notification)
    }

    pub fn notifications(
        &self,
        session: &Session,
    ) -> Result<NotificationFeed, OriginationServiceError> {
        let notifications = self.notifications.list_for(session.user_id())?;
        Ok(NotificationFeed {
            unread: notifications.iter().filter(|item| !item.read).count(),
            notifications,
        })
    }

    pub fn mark_notification_read(
        &self,
        session: &Session,
        id: &NotificationId,
    ) -> Result<Notification, OriginationServiceError> {
        self.notifications
            .mark_read(session.user_id(), id)
            .map_err(|err| match err {
                RepositoryError::NotFound => {
                    OriginationServiceError::NotificationNotFound(id.clone())
                }
                other => other.into(),
            })
    }

    /// CSV register of every application, for reviewers.
    pub fn export_register<W: Write>(
        &self,
        session: &Session,
        writer: W,
    ) -> Result<usize, OriginationServiceError> {
        authorize(session.role(), Capability::ViewAllApplications)?;
        let records = self.list(session)?;
        let written = write_register(writer, &records)?;
        info!(rows = written, role = session.role().label(), "register exported");
        Ok(written)
    }

    /// Tell the applicant about a change that is already stored. A failing inbox is logged and
    /// does not undo the change.
    fn notify(
        &self,
        record: &LoanApplication,
        kind: NotificationKind,
        title: &str,
        message: String,
    ) {
        let pushed = self.notifications.push(NotificationDraft {
            user_id: record.applicant_id.clone(),
            title: title.to_string(),
            message,
            kind,
            link: Some(format!("/applications/{}", record.id.0)),
        });
        if let Err(err) = pushed {
            warn!(
                application_id = %record.id.0,
                title,
                error = %err,
                "applicant notification not delivered"
            );
        }
    }
}

fn not_found_as_application(
    err: OriginationServiceError,
    id: &ApplicationId,
) -> OriginationServiceError {
    match err {
        OriginationServiceError::Repository(RepositoryError::NotFound) => {
            OriginationServiceError::ApplicationNotFound(id.clone())
        }
        other => other,
    }
}

fn status_notice(record: &LoanApplication) -> (NotificationKind, &'static str, String) {
    let id = &record.id.0;
    match record.status {
        ApplicationStatus::Approved => (
            NotificationKind::Success,
            "Loan Approved",
            format!("Congratulations! Your application #{id} has been approved."),
        ),
        ApplicationStatus::Rejected => (
            NotificationKind::Error,
            "Application Rejected",
            format!("Your application #{id} was not approved."),
        ),
        ApplicationStatus::Verified => (
            NotificationKind::Info,
            "Application Verified",
            format!("Your application #{id} has been verified. Your offer is ready."),
        ),
        other => (
            NotificationKind::Info,
            "Application Under Review",
            format!("Your application #{id} is now {}.", other.label().replace('_', " ")),
        ),
    }
}

/// Error raised by the origination service.
#[derive(Debug, thiserror::Error)]
pub enum OriginationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Sanction(#[from] SanctionError),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("document {0} not found on this application")]
    DocumentNotFound(DocumentId),
    #[error("document {0} was not uploaded by this applicant")]
    UnknownDocument(DocumentId),
    #[error("notification {0} not found")]
    NotificationNotFound(NotificationId),
    #[error("documents can only be marked verified or rejected, not {0:?}")]
    InvalidDocumentStatus(DocumentStatus),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("failed to write register: {0}")]
    Register(#[from] csv::Error),
}

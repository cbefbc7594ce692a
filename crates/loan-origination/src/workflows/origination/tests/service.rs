use std::sync::{Arc, Barrier};
use std::thread;

use super::common::*;

use crate::workflows::origination::domain::{
    ApplicationId, ApplicationStatus, DocumentId, DocumentStatus, NotificationId,
    NotificationKind, Role,
};
use crate::workflows::origination::lifecycle::TransitionError;
use crate::workflows::origination::memory::{
    InMemoryApplicationRepository, InMemoryNotificationRepository,
};
use crate::workflows::origination::policy::AuthorizationError;
use crate::workflows::origination::repository::{ApplicationRepository, RepositoryError};
use crate::workflows::origination::sanction::{OfferResponse, SanctionError};
use crate::workflows::origination::service::{LoanOriginationService, OriginationServiceError};

#[test]
fn submit_assigns_id_prices_and_notifies() {
    let (service, repository, notifications) = build_service();
    let applicant = session(Role::Applicant);

    let record = service
        .submit(&applicant, submission())
        .expect("valid submission");
    assert_eq!(record.id, ApplicationId("L-1001".to_string()));
    assert_eq!(record.status, ApplicationStatus::Submitted);
    assert_eq!(record.submitted_at, Some(record.updated_at));
    assert_eq!(record.applicant_id, applicant.user.id);
    assert_eq!(
        record.loan_details.as_ref().map(|terms| terms.calculated_emi()),
        Some(928)
    );

    let stored = repository
        .fetch(&record.id)
        .expect("repository available")
        .expect("record stored");
    assert_eq!(stored, record);

    let second = service
        .submit(&applicant, submission())
        .expect("valid submission");
    assert_eq!(second.id, ApplicationId("L-1002".to_string()));

    let inbox = notifications.all();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0].title, "Loan Application Received");
    assert_eq!(inbox[0].kind, NotificationKind::Info);
    assert_eq!(inbox[0].user_id, applicant.user.id);
}

#[test]
fn submit_rejects_invalid_sections_without_storing() {
    let (service, repository, notifications) = build_service();
    let mut invalid = submission();
    invalid.loan.tenure_months = 400;
    invalid.documents.pop();

    let err = service
        .submit(&session(Role::Applicant), invalid)
        .unwrap_err();
    match err {
        OriginationServiceError::Validation(errors) => {
            assert!(errors.field("tenure_months").is_some());
            assert!(errors.field("documents").is_some());
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(repository.is_empty());
    assert!(notifications.all().is_empty());
}

#[test]
fn reviewers_cannot_submit() {
    let (service, _, _) = build_service();
    let err = service
        .submit(&session(Role::Officer), submission())
        .unwrap_err();
    assert!(matches!(
        err,
        OriginationServiceError::Authorization(AuthorizationError::Forbidden { .. })
    ));
}

#[test]
fn submit_surfaces_repository_failures() {
    let service = LoanOriginationService::new(
        Arc::new(UnavailableRepository),
        Arc::new(InMemoryNotificationRepository::default()),
        Arc::new(uploaded_documents()),
    );
    assert!(matches!(
        service.submit(&session(Role::Applicant), submission()),
        Err(OriginationServiceError::Repository(RepositoryError::Unavailable(_)))
    ));

    let service = LoanOriginationService::new(
        Arc::new(ConflictRepository),
        Arc::new(InMemoryNotificationRepository::default()),
        Arc::new(uploaded_documents()),
    );
    assert!(matches!(
        service.submit(&session(Role::Applicant), submission()),
        Err(OriginationServiceError::Repository(RepositoryError::Conflict))
    ));
}

#[test]
fn applicants_only_see_their_own_applications() {
    let (service, _, _) = build_service();
    let applicant = session(Role::Applicant);
    let record = service
        .submit(&applicant, submission())
        .expect("valid submission");

    assert_eq!(service.list(&applicant).expect("list").len(), 1);
    assert!(service.list(&stranger()).expect("list").is_empty());
    assert_eq!(service.list(&session(Role::Manager)).expect("list").len(), 1);

    assert!(matches!(
        service.get(&stranger(), &record.id),
        Err(OriginationServiceError::Authorization(AuthorizationError::NotOwner))
    ));
    assert!(service.get(&session(Role::Underwriter), &record.id).is_ok());
    assert!(matches!(
        service.get(&applicant, &ApplicationId("L-9999".to_string())),
        Err(OriginationServiceError::ApplicationNotFound(_))
    ));
}

#[test]
fn reviewer_moves_application_through_review() {
    let (service, _, notifications) = build_service();
    let applicant = session(Role::Applicant);
    let officer = session(Role::Officer);
    let record = service
        .submit(&applicant, submission())
        .expect("valid submission");

    let reviewed = service
        .update_status(&officer, &record.id, ApplicationStatus::UnderReview)
        .expect("submitted -> under review");
    assert_eq!(reviewed.status, ApplicationStatus::UnderReview);
    assert!(reviewed.updated_at >= record.updated_at);

    let verified = service
        .update_status(&officer, &record.id, ApplicationStatus::Verified)
        .expect("under review -> verified");
    assert!(verified.updated_at >= reviewed.updated_at);

    let err = service
        .update_status(&officer, &record.id, ApplicationStatus::UnderReview)
        .unwrap_err();
    assert!(matches!(
        err,
        OriginationServiceError::Transition(TransitionError::Illegal { .. })
    ));

    let approved = service
        .approve(&session(Role::Manager), &record.id, Some("  income verified ".to_string()))
        .expect("verified -> approved");
    assert_eq!(approved.status, ApplicationStatus::Approved);
    assert_eq!(approved.officer_notes.as_deref(), Some("income verified"));

    let titles: Vec<String> = notifications
        .all()
        .into_iter()
        .map(|notification| notification.title)
        .collect();
    assert_eq!(
        titles,
        vec![
            "Loan Application Received",
            "Application Under Review",
            "Application Verified",
            "Loan Approved",
        ]
    );
}

#[test]
fn terminal_applications_stay_put() {
    let (service, repository, _) = build_service();
    let officer = session(Role::Officer);
    let record = service
        .submit(&session(Role::Applicant), submission())
        .expect("valid submission");
    let rejected = service
        .reject(&officer, &record.id, None)
        .expect("submitted -> rejected");

    let err = service
        .update_status(&officer, &record.id, ApplicationStatus::UnderReview)
        .unwrap_err();
    assert!(matches!(
        err,
        OriginationServiceError::Transition(TransitionError::Terminal(ApplicationStatus::Rejected))
    ));
    assert!(service.approve(&officer, &record.id, None).is_err());

    let stored = repository
        .fetch(&record.id)
        .expect("repository available")
        .expect("record stored");
    assert_eq!(stored, rejected);
}

#[test]
fn applicants_cannot_decide() {
    let (service, _, _) = build_service();
    let applicant = session(Role::Applicant);
    let record = service
        .submit(&applicant, submission())
        .expect("valid submission");

    assert!(matches!(
        service.approve(&applicant, &record.id, None),
        Err(OriginationServiceError::Authorization(_))
    ));
    assert_eq!(
        service.get(&applicant, &record.id).expect("own record").status,
        ApplicationStatus::Submitted
    );
}

#[test]
fn reviewers_mark_documents() {
    let (service, _, _) = build_service();
    let officer = session(Role::Officer);
    let record = service
        .submit(&session(Role::Applicant), submission())
        .expect("valid submission");
    let doc = DocumentId("doc-b".to_string());

    let updated = service
        .set_document_status(&officer, &record.id, &doc, DocumentStatus::Verified)
        .expect("document exists");
    assert_eq!(updated.status, DocumentStatus::Verified);
    let stored = service.get(&officer, &record.id).expect("record");
    assert_eq!(
        stored.document(&doc).map(|document| document.status),
        Some(DocumentStatus::Verified)
    );

    assert!(matches!(
        service.set_document_status(&officer, &record.id, &doc, DocumentStatus::Pending),
        Err(OriginationServiceError::InvalidDocumentStatus(DocumentStatus::Pending))
    ));
    assert!(matches!(
        service.set_document_status(
            &officer,
            &record.id,
            &DocumentId("doc-z".to_string()),
            DocumentStatus::Rejected
        ),
        Err(OriginationServiceError::DocumentNotFound(_))
    ));
}

#[test]
fn dashboard_is_scoped_to_the_session() {
    let (service, _, _) = build_service();
    let applicant = session(Role::Applicant);
    let officer = session(Role::Officer);
    let first = service
        .submit(&applicant, submission())
        .expect("valid submission");
    service
        .submit(&applicant, submission())
        .expect("valid submission");
    service
        .approve(&officer, &first.id, None)
        .expect("submitted -> approved");

    let summary = service.dashboard(&applicant).expect("dashboard");
    assert_eq!(summary.total_applications, 2);
    assert_eq!(summary.approved, 1);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.total_requested_amount, 40_000);

    let empty = service.dashboard(&stranger()).expect("dashboard");
    assert_eq!(empty.total_applications, 0);
}

#[test]
fn sanction_letter_requires_verified_or_approved() {
    let (service, _, notifications) = build_service();
    let applicant = session(Role::Applicant);
    let record = service
        .submit(&applicant, submission())
        .expect("valid submission");

    assert!(matches!(
        service.sanction_letter(&applicant, &record.id),
        Err(OriginationServiceError::Sanction(SanctionError::NotSanctioned(
            ApplicationStatus::Submitted
        )))
    ));

    service
        .update_status(&session(Role::Officer), &record.id, ApplicationStatus::Verified)
        .expect("submitted -> verified");
    let letter = service
        .sanction_letter(&applicant, &record.id)
        .expect("verified application has an offer");
    assert_eq!(letter.emi, 928);
    assert_eq!(letter.reference, record.id);

    let notice = service
        .respond_to_offer(&applicant, &record.id, OfferResponse::Accept)
        .expect("owner responds");
    assert_eq!(notice.title, "Offer Accepted");
    assert_eq!(
        service.get(&applicant, &record.id).expect("record").status,
        ApplicationStatus::Verified
    );
    assert_eq!(notifications.all().len(), 3);

    assert!(matches!(
        service.respond_to_offer(&stranger(), &record.id, OfferResponse::Decline),
        Err(OriginationServiceError::Authorization(AuthorizationError::NotOwner))
    ));
    assert!(matches!(
        service.respond_to_offer(&session(Role::Officer), &record.id, OfferResponse::Accept),
        Err(OriginationServiceError::Authorization(AuthorizationError::Forbidden { .. }))
    ));
}

#[test]
fn notifications_are_scoped_and_read_once() {
    let (service, _, _) = build_service();
    let applicant = session(Role::Applicant);
    let officer = session(Role::Officer);
    let record = service
        .submit(&applicant, submission())
        .expect("valid submission");
    service
        .reject(&officer, &record.id, None)
        .expect("submitted -> rejected");

    let feed = service.notifications(&applicant).expect("feed");
    assert_eq!(feed.unread, 2);
    assert!(feed
        .notifications
        .iter()
        .any(|item| item.kind == NotificationKind::Error && item.title == "Application Rejected"));
    assert_eq!(service.notifications(&officer).expect("feed").unread, 0);

    let target = feed.notifications[0].id.clone();
    assert!(matches!(
        service.mark_notification_read(&officer, &target),
        Err(OriginationServiceError::NotificationNotFound(_))
    ));
    let read = service
        .mark_notification_read(&applicant, &target)
        .expect("owner marks read");
    assert!(read.read);
    assert_eq!(service.notifications(&applicant).expect("feed").unread, 1);

    assert!(matches!(
        service.mark_notification_read(&applicant, &NotificationId("notif-404".to_string())),
        Err(OriginationServiceError::NotificationNotFound(_))
    ));
}

#[test]
fn register_export_is_for_reviewers() {
    let (service, _, _) = build_service();
    let applicant = session(Role::Applicant);
    service
        .submit(&applicant, submission())
        .expect("valid submission");

    let mut buffer = Vec::new();
    assert!(matches!(
        service.export_register(&applicant, &mut buffer),
        Err(OriginationServiceError::Authorization(_))
    ));

    let rows = service
        .export_register(&session(Role::Manager), &mut buffer)
        .expect("manager exports");
    assert_eq!(rows, 1);
    let text = String::from_utf8(buffer).expect("utf8");
    assert!(text.starts_with("Application ID,Applicant,Status"));
    assert!(text.contains("L-1001,John Doe,submitted,20000,24,928,"));
}

#[test]
fn submit_keeps_the_stored_copy_of_each_document() {
    let (service, _, _) = build_service();
    let mut forged = submission();
    for document in &mut forged.documents {
        document.status = DocumentStatus::Verified;
        document.location = "https://elsewhere.example/x".to_string();
    }
    let duplicate = forged.documents[0].clone();
    forged.documents.push(duplicate);

    let record = service
        .submit(&session(Role::Applicant), forged)
        .expect("documents resolve");
    assert_eq!(record.documents, documents());
    assert!(record
        .documents
        .iter()
        .all(|document| document.status == DocumentStatus::Pending));
}

#[test]
fn submit_refuses_documents_uploaded_by_someone_else() {
    let (service, repository, _) = build_service();
    assert!(matches!(
        service.submit(&stranger(), submission()),
        Err(OriginationServiceError::UnknownDocument(id)) if id == DocumentId("doc-a".to_string())
    ));
    assert!(repository.is_empty());
}

#[test]
fn stored_changes_survive_an_offline_inbox() {
    let repository = Arc::new(InMemoryApplicationRepository::default());
    let service = LoanOriginationService::new(
        repository.clone(),
        Arc::new(OfflineInbox),
        Arc::new(uploaded_documents()),
    );

    let record = service
        .submit(&session(Role::Applicant), submission())
        .expect("submission stored");
    assert_eq!(repository.len(), 1);

    let rejected = service
        .reject(&session(Role::Officer), &record.id, None)
        .expect("decision stored");
    assert_eq!(rejected.status, ApplicationStatus::Rejected);
    let stored = repository
        .fetch(&record.id)
        .expect("repository available")
        .expect("record stored");
    assert_eq!(stored.status, ApplicationStatus::Rejected);
}

#[test]
fn racing_decisions_settle_on_one_outcome() {
    for _ in 0..20 {
        let (service, repository, _) = build_service();
        let record = service
            .submit(&session(Role::Applicant), submission())
            .expect("valid submission");
        let officer = session(Role::Officer);
        let manager = session(Role::Manager);
        let start = Barrier::new(2);

        let (approved, rejected) = thread::scope(|scope| {
            let approve = scope.spawn(|| {
                start.wait();
                service.approve(&manager, &record.id, None)
            });
            let reject = scope.spawn(|| {
                start.wait();
                service.reject(&officer, &record.id, None)
            });
            (
                approve.join().expect("approve thread"),
                reject.join().expect("reject thread"),
            )
        });

        let winner = match (approved, rejected) {
            (Ok(record), Err(OriginationServiceError::Transition(_))) => record,
            (Err(OriginationServiceError::Transition(_)), Ok(record)) => record,
            other => panic!("expected exactly one decision to land, got {other:?}"),
        };
        let stored = repository
            .fetch(&record.id)
            .expect("repository available")
            .expect("record stored");
        assert_eq!(stored.status, winner.status);
    }
}

use std::sync::Arc;

use chrono::NaiveDate;
use loan_origination::workflows::origination::emi::monthly_installment;
use loan_origination::workflows::origination::{
    seed_demo_data, ApplicationStatus, ApplicationWizard, AuthService, DocumentCategory,
    DocumentService, EmploymentDetails, EmploymentType, FileUpload, InMemoryApplicationRepository,
    InMemoryDocumentStore, InMemoryNotificationRepository, LoanOriginationService, LoanRequest,
    MockUserDirectory, PersonalDetails, Role, WizardStep, ANNUAL_RATE_PCT,
};

fn jane_personal() -> PersonalDetails {
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

#[test]
fn jane_doe_applies_through_the_wizard() {
    let directory = Arc::new(MockUserDirectory::default());
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let notifications = Arc::new(InMemoryNotificationRepository::default());
    let auth = AuthService::new(directory.clone());
    let store = Arc::new(InMemoryDocumentStore::default());
    let documents = DocumentService::new(store.clone());
    let origination =
        LoanOriginationService::new(applications.clone(), notifications.clone(), store);

    let session = auth.login_as(Role::Applicant).expect("applicant on roster");
    let mut wizard = ApplicationWizard::new();

    assert_eq!(
        wizard.save_personal(jane_personal()).expect("personal valid"),
        WizardStep::Employment
    );
    assert_eq!(
        wizard
            .save_employment(EmploymentDetails {
                employment_type: EmploymentType::Salaried,
                employer_name: None,
                monthly_income: 6_000,
                experience_years: 3.0,
            })
            .expect("employment valid"),
        WizardStep::Loan
    );
    assert_eq!(
        wizard
            .save_loan(LoanRequest {
                amount: 20_000,
                tenure_months: 24,
                purpose: "Education".to_string(),
            })
            .expect("loan valid"),
        WizardStep::Documents
    );

    for (file_name, category) in [
        ("aadhaar.jpg", DocumentCategory::IdentityProof),
        ("salary-slip.pdf", DocumentCategory::IncomeProof),
        ("statement.pdf", DocumentCategory::BankStatement),
    ] {
        let document = documents
            .upload(
                &session,
                FileUpload {
                    file_name: file_name.to_string(),
                    size_bytes: 120_000,
                },
                category,
            )
            .expect("upload accepted");
        wizard.attach_document(document).expect("documents step");
    }
    assert_eq!(
        wizard.complete_documents().expect("all proofs present"),
        WizardStep::Review
    );

    let submission = wizard.into_submission().expect("wizard complete");
    let record = origination
        .submit(&session, submission)
        .expect("submission accepted");

    assert_eq!(record.status, ApplicationStatus::Submitted);
    assert!(record.id.0.starts_with("L-"));
    assert!(record.submitted_at.is_some());
    assert_eq!(
        record.loan_details.as_ref().map(|terms| terms.calculated_emi()),
        Some(monthly_installment(20_000, 24, ANNUAL_RATE_PCT))
    );
    assert_eq!(record.documents.len(), 3);
    assert_eq!(applications.len(), 1);

    let feed = origination.notifications(&session).expect("inbox");
    assert_eq!(feed.unread, 1);
    assert_eq!(feed.notifications[0].title, "Loan Application Received");
}

#[test]
fn seeded_desk_has_the_sample_application() {
    let directory = MockUserDirectory::default();
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let notifications = Arc::new(InMemoryNotificationRepository::default());
    seed_demo_data(&applications, &notifications, &directory).expect("seed");

    let auth = AuthService::new(Arc::new(directory));
    let origination = LoanOriginationService::new(
        applications,
        notifications,
        Arc::new(InMemoryDocumentStore::default()),
    );

    let manager = auth.login("manager@apex.com").expect("manager on roster");
    let all = origination.list(&manager).expect("list");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id.0, "L-1001");
    assert_eq!(all[0].applicant_name, "John Doe");
    assert_eq!(all[0].requested_amount(), 50_000);

    let officer = auth.login_as(Role::Officer).expect("officer on roster");
    let inbox = origination.notifications(&officer).expect("inbox");
    assert_eq!(inbox.notifications.len(), 1);
    assert_eq!(inbox.unread, 0);

    let applicant = auth.login_as(Role::Applicant).expect("applicant on roster");
    let approved = origination
        .approve(&manager, &all[0].id, None)
        .expect("manager approves");
    let letter = origination
        .sanction_letter(&applicant, &approved.id)
        .expect("approved application has an offer");
    assert_eq!(letter.emi, 2_319);
}

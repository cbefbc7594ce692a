//! Loan origination: wizard intake, EMI pricing, reviewer decisions, and the applicant inbox.
//!
//! The domain core (`emi`, `lifecycle`, `wizard`) is pure. Everything that touches storage goes
//! through the ports in `repository`, with in-memory adapters in `memory`.

pub mod dashboard;
pub mod documents;
pub mod domain;
pub mod emi;
pub mod lifecycle;
pub mod memory;
pub mod policy;
pub(crate) mod register;
pub mod repository;
pub mod router;
pub mod sanction;
pub mod service;
pub mod session;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use dashboard::{DashboardSummary, RecentApplication};
pub use documents::{DocumentError, DocumentService, FileUpload, MAX_UPLOAD_BYTES};
pub use domain::{
    ApplicationId, ApplicationStatus, ApplicationStatusView, ApplicationSubmission, Document,
    DocumentCategory, DocumentDraft, DocumentId, DocumentStatus, EmploymentDetails,
    EmploymentType, LoanApplication, LoanRequest, LoanTerms, Notification, NotificationId,
    NotificationKind, PersonalDetails, Role, User, UserId,
};
pub use emi::{EmiError, EmiQuote, Installment, ANNUAL_RATE_PCT, MAX_SCHEDULE_MONTHS};
pub use lifecycle::TransitionError;
pub use memory::{
    seed_demo_data, InMemoryApplicationRepository, InMemoryBackend, InMemoryDocumentStore,
    InMemoryNotificationRepository, MockUserDirectory,
};
pub use policy::{authorize, AuthorizationError, Capability};
pub use repository::{
    ApplicationRepository, Backend, DocumentStore, NotificationRepository, RepositoryError,
    UserDirectory,
};
pub use router::{origination_router, OriginationApi, SESSION_HEADER};
pub use sanction::{OfferResponse, SanctionError, SanctionLetter};
pub use service::{LoanOriginationService, NotificationFeed, OriginationServiceError};
pub use session::{AuthError, AuthService, Session};
pub use validation::{FieldError, Validate, ValidationErrors};
pub use wizard::{ApplicationReview, ApplicationWizard, WizardError, WizardStep};

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::emi::{self, EmiQuote};

/// Identifier wrapper for submitted applications (`L-1001`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for users of the lending desk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

macro_rules! display_id {
    ($($name:ident),+) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )+
    };
}

display_id!(ApplicationId, UserId, DocumentId, NotificationId);

/// Roles recognised by the access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Applicant,
    Officer,
    Underwriter,
    Manager,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Officer => "officer",
            Role::Underwriter => "underwriter",
            Role::Manager => "manager",
        }
    }

    pub const fn is_reviewer(self) -> bool {
        !matches!(self, Role::Applicant)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Step 1 of the wizard: who is applying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDetails {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aadhaar: Option<String>,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    Salaried,
    SelfEmployed,
}

impl EmploymentType {
    pub const fn label(self) -> &'static str {
        match self {
            EmploymentType::Salaried => "salaried",
            EmploymentType::SelfEmployed => "self_employed",
        }
    }
}

/// Step 2 of the wizard: declared income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentDetails {
    pub employment_type: EmploymentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer_name: Option<String>,
    pub monthly_income: u64,
    pub experience_years: f32,
}

/// Step 3 of the wizard: what the applicant asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub amount: u64,
    pub tenure_months: u32,
    pub purpose: String,
}

impl LoanRequest {
    /// Price the request at the fixed desk rate.
    pub fn price(&self) -> LoanTerms {
        LoanTerms::price(self, emi::ANNUAL_RATE_PCT)
    }
}

/// Priced loan request. The installment is always derived from amount, tenure and rate,
/// so the type is serialized outward but never accepted from clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanTerms {
    amount: u64,
    tenure_months: u32,
    purpose: String,
    annual_rate_pct: f64,
    calculated_emi: u64,
}

impl LoanTerms {
    pub(crate) fn price(request: &LoanRequest, annual_rate_pct: f64) -> Self {
        Self {
            amount: request.amount,
            tenure_months: request.tenure_months,
            purpose: request.purpose.trim().to_string(),
            annual_rate_pct,
            calculated_emi: emi::monthly_installment(
                request.amount,
                request.tenure_months,
                annual_rate_pct,
            ),
        }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn tenure_months(&self) -> u32 {
        self.tenure_months
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn annual_rate_pct(&self) -> f64 {
        self.annual_rate_pct
    }

    pub fn calculated_emi(&self) -> u64 {
        self.calculated_emi
    }

    pub fn quote(&self) -> EmiQuote {
        EmiQuote::from_installment(
            self.amount,
            self.tenure_months,
            self.annual_rate_pct,
            self.calculated_emi,
        )
    }
}

/// Categories the document step requires before the wizard may advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    IdentityProof,
    IncomeProof,
    BankStatement,
}

impl DocumentCategory {
    pub const REQUIRED: [DocumentCategory; 3] = [
        DocumentCategory::IdentityProof,
        DocumentCategory::IncomeProof,
        DocumentCategory::BankStatement,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            DocumentCategory::IdentityProof => "Identity Proof (PAN/Aadhaar)",
            DocumentCategory::IncomeProof => "Income Proof (Salary Slip/ITR)",
            DocumentCategory::BankStatement => "Bank Statement (Last 6 months)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Pending,
    Verified,
    Rejected,
}

/// Uploaded proof attached to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub category: DocumentCategory,
    /// Preview handle issued by the document store; not durable.
    pub location: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
}

/// Checked upload metadata before the document store assigns an id and a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDraft {
    pub owner: UserId,
    pub name: String,
    pub category: DocumentCategory,
    pub content_type: String,
    pub size_bytes: u64,
}

/// Lifecycle of a loan application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Verified,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Verified => "verified",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// The aggregate produced by the wizard and accepted by the origination service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub personal: PersonalDetails,
    pub employment: EmploymentDetails,
    pub loan: LoanRequest,
    pub documents: Vec<Document>,
}

/// The central record of the lending desk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanApplication {
    pub id: ApplicationId,
    pub applicant_id: UserId,
    pub applicant_name: String,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_details: Option<PersonalDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_details: Option<EmploymentDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_details: Option<LoanTerms>,
    pub documents: Vec<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_score: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub officer_notes: Option<String>,
}

impl LoanApplication {
    /// Build a draft from a completed wizard; `submit` promotes it to a formal application.
    pub fn draft(
        id: ApplicationId,
        applicant: &User,
        submission: ApplicationSubmission,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            applicant_id: applicant.id.clone(),
            applicant_name: applicant.name.clone(),
            status: ApplicationStatus::Draft,
            submitted_at: None,
            updated_at: now,
            personal_details: Some(submission.personal),
            employment_details: Some(submission.employment),
            loan_details: Some(submission.loan.price()),
            documents: submission.documents,
            risk_score: None,
            credit_score: None,
            officer_notes: None,
        }
    }

    pub fn requested_amount(&self) -> u64 {
        self.loan_details
            .as_ref()
            .map(LoanTerms::amount)
            .unwrap_or(0)
    }

    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|doc| &doc.id == id)
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id.clone(),
            status: self.status.label(),
            submitted_at: self.submitted_at,
            updated_at: self.updated_at,
            calculated_emi: self.loan_details.as_ref().map(LoanTerms::calculated_emi),
        }
    }
}

/// Compact representation returned after status-changing calls.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculated_emi: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Notification content before the repository assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
}

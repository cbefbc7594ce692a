use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, ApplicationStatus, LoanApplication};
use super::emi::EmiQuote;

/// Offer terms issued once an application is verified or approved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanctionLetter {
    pub reference: ApplicationId,
    pub applicant_name: String,
    pub status: ApplicationStatus,
    pub sanctioned_amount: u64,
    pub tenure_months: u32,
    pub annual_rate_pct: f64,
    pub emi: u64,
    pub total_interest: u64,
    pub total_payable: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanctionError {
    #[error("no offer while the application is {}", .0.label())]
    NotSanctioned(ApplicationStatus),
    #[error("application has no priced loan terms")]
    MissingTerms,
}

pub const fn is_sanctioned(status: ApplicationStatus) -> bool {
    matches!(
        status,
        ApplicationStatus::Approved | ApplicationStatus::Verified
    )
}

impl SanctionLetter {
    pub fn issue(application: &LoanApplication) -> Result<Self, SanctionError> {
        if !is_sanctioned(application.status) {
            return Err(SanctionError::NotSanctioned(application.status));
        }
        let terms = application
            .loan_details
            .as_ref()
            .ok_or(SanctionError::MissingTerms)?;
        let EmiQuote {
            emi,
            total_interest,
            total_payable,
            ..
        } = terms.quote();

        Ok(Self {
            reference: application.id.clone(),
            applicant_name: application.applicant_name.clone(),
            status: application.status,
            sanctioned_amount: terms.amount(),
            tenure_months: terms.tenure_months(),
            annual_rate_pct: terms.annual_rate_pct(),
            emi,
            total_interest,
            total_payable,
        })
    }
}

/// The applicant's answer to a sanction letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferResponse {
    Accept,
    Decline,
}

impl OfferResponse {
    pub const fn label(self) -> &'static str {
        match self {
            OfferResponse::Accept => "accepted",
            OfferResponse::Decline => "declined",
        }
    }
}

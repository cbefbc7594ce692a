use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use super::domain::{
    ApplicationSubmission, DocumentCategory, EmploymentDetails, LoanRequest, PersonalDetails,
};

pub const MIN_MONTHLY_INCOME: u64 = 1_000;
pub const MIN_LOAN_AMOUNT: u64 = 5_000;
pub const MIN_TENURE_MONTHS: u32 = 6;
pub const MAX_TENURE_MONTHS: u32 = 360;

/// One rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|error| error.field == field)
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details: Vec<String> = self
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect();
        write!(f, "validation failed ({})", details.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A wizard section that knows its own form contract.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for PersonalDetails {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.full_name.trim().chars().count() < 2 {
            errors.push("full_name", "Name must be at least 2 characters");
        }
        if !date_of_birth_is_plausible(self.date_of_birth) {
            errors.push("date_of_birth", "Invalid Date");
        }
        if !is_valid_email(&self.email) {
            errors.push("email", "Invalid email address");
        }
        if self.phone.chars().filter(char::is_ascii_digit).count() < 10 {
            errors.push("phone", "Phone must be at least 10 digits");
        }
        if let Some(pan) = &self.pan {
            let pan = pan.trim();
            if pan.len() != 10 || !pan.chars().all(|c| c.is_ascii_alphanumeric()) {
                errors.push("pan", "PAN must be 10 characters");
            }
        }
        if let Some(aadhaar) = &self.aadhaar {
            let digits: String = aadhaar.chars().filter(|c| !c.is_whitespace()).collect();
            if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_digit()) {
                errors.push("aadhaar", "Aadhaar must be 12 digits");
            }
        }
        if self.address.trim().chars().count() < 5 {
            errors.push("address", "Address is too short");
        }

        errors.into_result()
    }
}

impl Validate for EmploymentDetails {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.monthly_income < MIN_MONTHLY_INCOME {
            errors.push(
                "monthly_income",
                format!("Income must be at least {MIN_MONTHLY_INCOME}"),
            );
        }
        if !self.experience_years.is_finite() || self.experience_years < 0.0 {
            errors.push("experience_years", "Experience cannot be negative");
        }

        errors.into_result()
    }
}

impl Validate for LoanRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.amount < MIN_LOAN_AMOUNT {
            errors.push(
                "amount",
                format!("Minimum loan amount is {MIN_LOAN_AMOUNT}"),
            );
        }
        if self.tenure_months < MIN_TENURE_MONTHS {
            errors.push(
                "tenure_months",
                format!("Minimum tenure is {MIN_TENURE_MONTHS} months"),
            );
        } else if self.tenure_months > MAX_TENURE_MONTHS {
            errors.push(
                "tenure_months",
                format!("Maximum tenure is {MAX_TENURE_MONTHS} months"),
            );
        }
        if self.purpose.trim().chars().count() < 3 {
            errors.push("purpose", "Purpose is required");
        }

        errors.into_result()
    }
}

impl Validate for ApplicationSubmission {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        for result in [
            self.personal.validate(),
            self.employment.validate(),
            self.loan.validate(),
        ] {
            if let Err(section) = result {
                errors.errors.extend(section.errors);
            }
        }

        for category in missing_categories(self.documents.iter().map(|doc| doc.category)) {
            errors.push("documents", format!("{} is required", category.label()));
        }

        errors.into_result()
    }
}

/// Required document categories with no upload yet, in display order.
pub fn missing_categories(
    present: impl IntoIterator<Item = DocumentCategory>,
) -> Vec<DocumentCategory> {
    let present: Vec<DocumentCategory> = present.into_iter().collect();
    DocumentCategory::REQUIRED
        .into_iter()
        .filter(|required| !present.contains(required))
        .collect()
}

fn date_of_birth_is_plausible(date: NaiveDate) -> bool {
    date <= Utc::now().date_naive()
}

fn is_valid_email(raw: &str) -> bool {
    let email = raw.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

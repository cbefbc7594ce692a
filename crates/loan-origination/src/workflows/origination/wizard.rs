//! Multi-step intake that turns partial sections into one submission.
//!
//! A step only advances once its section passes validation. Going back never clears what was
//! entered, so the forms can be re-rendered from the stored sections.

use serde::Serialize;

use super::domain::{
    ApplicationSubmission, Document, DocumentCategory, DocumentId, EmploymentDetails,
    LoanRequest, PersonalDetails,
};
use super::emi::EmiQuote;
use super::validation::{missing_categories, Validate, ValidationErrors};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Personal,
    Employment,
    Loan,
    Documents,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Personal,
        WizardStep::Employment,
        WizardStep::Loan,
        WizardStep::Documents,
        WizardStep::Review,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            WizardStep::Personal => "Personal Details",
            WizardStep::Employment => "Employment & Income",
            WizardStep::Loan => "Loan Details",
            WizardStep::Documents => "Documents",
            WizardStep::Review => "Review",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    fn next(self) -> Self {
        Self::ALL
            .get(self.index() + 1)
            .copied()
            .unwrap_or(WizardStep::Review)
    }

    fn previous(self) -> Self {
        self.index()
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
            .unwrap_or(WizardStep::Personal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error("wizard is on step '{}', not '{}'", current.title(), attempted.title())]
    WrongStep {
        current: WizardStep,
        attempted: WizardStep,
    },
    #[error("missing required documents: {}", labels(.0))]
    MissingDocuments(Vec<DocumentCategory>),
    #[error("section '{}' has not been completed", .0.title())]
    Incomplete(WizardStep),
}

fn labels(categories: &[DocumentCategory]) -> String {
    categories
        .iter()
        .map(|category| category.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// In-progress application. Lives only as long as the intake view that owns it.
#[derive(Debug, Clone, Default)]
pub struct ApplicationWizard {
    step: WizardStep,
    personal: Option<PersonalDetails>,
    employment: Option<EmploymentDetails>,
    loan: Option<LoanRequest>,
    documents: Vec<Document>,
}

impl ApplicationWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> WizardStep {
        self.step
    }

    pub fn personal(&self) -> Option<&PersonalDetails> {
        self.personal.as_ref()
    }

    pub fn employment(&self) -> Option<&EmploymentDetails> {
        self.employment.as_ref()
    }

    pub fn loan(&self) -> Option<&LoanRequest> {
        self.loan.as_ref()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn save_personal(&mut self, details: PersonalDetails) -> Result<WizardStep, WizardError> {
        self.expect_step(WizardStep::Personal)?;
        details.validate()?;
        self.personal = Some(details);
        Ok(self.advance())
    }

    pub fn save_employment(
        &mut self,
        details: EmploymentDetails,
    ) -> Result<WizardStep, WizardError> {
        self.expect_step(WizardStep::Employment)?;
        details.validate()?;
        self.employment = Some(details);
        Ok(self.advance())
    }

    pub fn save_loan(&mut self, request: LoanRequest) -> Result<WizardStep, WizardError> {
        self.expect_step(WizardStep::Loan)?;
        request.validate()?;
        self.loan = Some(request);
        Ok(self.advance())
    }

    /// Installment preview for the loan section as entered so far.
    pub fn loan_preview(&self) -> Option<EmiQuote> {
        self.loan.as_ref().map(|request| request.price().quote())
    }

    pub fn attach_document(&mut self, document: Document) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Documents)?;
        self.documents.push(document);
        Ok(())
    }

    pub fn remove_document(&mut self, id: &DocumentId) -> Result<Option<Document>, WizardError> {
        self.expect_step(WizardStep::Documents)?;
        let position = self.documents.iter().position(|doc| &doc.id == id);
        Ok(position.map(|index| self.documents.remove(index)))
    }

    pub fn missing_documents(&self) -> Vec<DocumentCategory> {
        missing_categories(self.documents.iter().map(|doc| doc.category))
    }

    /// Leave the document step once every required category has at least one upload.
    pub fn complete_documents(&mut self) -> Result<WizardStep, WizardError> {
        self.expect_step(WizardStep::Documents)?;
        let missing = self.missing_documents();
        if !missing.is_empty() {
            return Err(WizardError::MissingDocuments(missing));
        }
        Ok(self.advance())
    }

    pub fn back(&mut self) -> WizardStep {
        self.step = self.step.previous();
        self.step
    }

    pub fn review(&self) -> Result<ApplicationReview<'_>, WizardError> {
        self.expect_step(WizardStep::Review)?;
        Ok(ApplicationReview {
            personal: require(&self.personal, WizardStep::Personal)?,
            employment: require(&self.employment, WizardStep::Employment)?,
            loan: require(&self.loan, WizardStep::Loan)?,
            quote: self
                .loan_preview()
                .ok_or(WizardError::Incomplete(WizardStep::Loan))?,
            documents: &self.documents,
        })
    }

    /// Aggregate every section into one submission, consuming the wizard.
    pub fn into_submission(self) -> Result<ApplicationSubmission, WizardError> {
        self.expect_step(WizardStep::Review)?;
        let Self {
            personal,
            employment,
            loan,
            documents,
            ..
        } = self;

        let submission = ApplicationSubmission {
            personal: personal.ok_or(WizardError::Incomplete(WizardStep::Personal))?,
            employment: employment.ok_or(WizardError::Incomplete(WizardStep::Employment))?,
            loan: loan.ok_or(WizardError::Incomplete(WizardStep::Loan))?,
            documents,
        };
        submission.validate()?;
        Ok(submission)
    }

    fn expect_step(&self, attempted: WizardStep) -> Result<(), WizardError> {
        if self.step == attempted {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                current: self.step,
                attempted,
            })
        }
    }

    fn advance(&mut self) -> WizardStep {
        self.step = self.step.next();
        self.step
    }
}

fn require<T>(section: &Option<T>, step: WizardStep) -> Result<&T, WizardError> {
    section.as_ref().ok_or(WizardError::Incomplete(step))
}

/// Read-only summary rendered on the final step.
#[derive(Debug, Serialize)]
pub struct ApplicationReview<'a> {
    pub personal: &'a PersonalDetails,
    pub employment: &'a EmploymentDetails,
    pub loan: &'a LoanRequest,
    pub quote: EmiQuote,
    pub documents: &'a [Document],
}

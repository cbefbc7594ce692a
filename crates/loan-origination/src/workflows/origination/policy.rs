use super::domain::{LoanApplication, Role, User};

/// Actions gated by role. Every mutating service entry point checks one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SubmitApplication,
    ViewAllApplications,
    ReviewApplication,
    RespondToOffer,
}

impl Capability {
    pub const fn label(self) -> &'static str {
        match self {
            Capability::SubmitApplication => "submit applications",
            Capability::ViewAllApplications => "view all applications",
            Capability::ReviewApplication => "review applications",
            Capability::RespondToOffer => "respond to sanction offers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("role {} may not {}", role.label(), capability.label())]
    Forbidden { role: Role, capability: Capability },
    #[error("application belongs to another applicant")]
    NotOwner,
}

pub const fn allows(role: Role, capability: Capability) -> bool {
    match capability {
        Capability::SubmitApplication | Capability::RespondToOffer => {
            matches!(role, Role::Applicant)
        }
        Capability::ViewAllApplications | Capability::ReviewApplication => role.is_reviewer(),
    }
}

pub fn authorize(role: Role, capability: Capability) -> Result<(), AuthorizationError> {
    if allows(role, capability) {
        Ok(())
    } else {
        Err(AuthorizationError::Forbidden { role, capability })
    }
}

/// Reviewers read everything; applicants only read what they filed.
pub fn authorize_read(
    user: &User,
    application: &LoanApplication,
) -> Result<(), AuthorizationError> {
    if allows(user.role, Capability::ViewAllApplications) || application.applicant_id == user.id {
        Ok(())
    } else {
        Err(AuthorizationError::NotOwner)
    }
}

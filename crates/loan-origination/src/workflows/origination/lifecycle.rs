use chrono::{DateTime, Utc};

use super::domain::{ApplicationStatus, LoanApplication};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot move application from {} to {}", from.label(), to.label())]
    Illegal {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("application is already {} and cannot change", .0.label())]
    Terminal(ApplicationStatus),
}

impl ApplicationStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }

    /// Awaiting a reviewer decision.
    pub const fn is_pending(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Submitted
                | ApplicationStatus::UnderReview
                | ApplicationStatus::Verified
        )
    }

    /// Transitions a reviewer may take from this status.
    pub fn next_statuses(self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Draft => &[Submitted],
            Submitted => &[UnderReview, Verified, Approved, Rejected],
            UnderReview => &[Verified, Approved, Rejected],
            Verified => &[Approved, Rejected],
            Approved | Rejected => &[],
        }
    }

    pub fn can_transition_to(self, target: ApplicationStatus) -> bool {
        self.next_statuses().contains(&target)
    }
}

impl LoanApplication {
    /// Promote a completed draft to a formal application.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.status != ApplicationStatus::Draft {
            return Err(TransitionError::Illegal {
                from: self.status,
                to: ApplicationStatus::Submitted,
            });
        }

        let stamp = self.next_timestamp(now);
        self.status = ApplicationStatus::Submitted;
        self.submitted_at = Some(stamp);
        self.updated_at = stamp;
        Ok(())
    }

    /// Apply a reviewer-driven status change. Rejected transitions leave the record untouched.
    pub fn transition(
        &mut self,
        target: ApplicationStatus,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal(self.status));
        }
        if target == ApplicationStatus::Submitted || !self.status.can_transition_to(target) {
            return Err(TransitionError::Illegal {
                from: self.status,
                to: target,
            });
        }

        self.status = target;
        self.touch(now);
        Ok(())
    }

    /// Record a mutation, never letting `updated_at` run backwards.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = self.next_timestamp(now);
    }

    fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let floor = match self.submitted_at {
            Some(submitted) => submitted.max(self.updated_at),
            None => self.updated_at,
        };
        now.max(floor)
    }
}

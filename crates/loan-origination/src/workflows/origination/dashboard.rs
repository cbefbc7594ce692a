use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ApplicationId, ApplicationStatus, LoanApplication};

const RECENT_LIMIT: usize = 5;

/// Headline counts shown on the landing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_applications: usize,
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
    pub total_requested_amount: u64,
    pub recent: Vec<RecentApplication>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentApplication {
    pub id: ApplicationId,
    pub applicant_name: String,
    pub amount: u64,
    pub status: ApplicationStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<&LoanApplication> for RecentApplication {
    fn from(application: &LoanApplication) -> Self {
        Self {
            id: application.id.clone(),
            applicant_name: application.applicant_name.clone(),
            amount: application.requested_amount(),
            status: application.status,
            updated_at: application.updated_at,
        }
    }
}

pub fn summarize(applications: &[LoanApplication]) -> DashboardSummary {
    let count = |status: ApplicationStatus| {
        applications
            .iter()
            .filter(|application| application.status == status)
            .count()
    };

    let mut by_recency: Vec<&LoanApplication> = applications.iter().collect();
    by_recency.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));

    DashboardSummary {
        total_applications: applications.len(),
        approved: count(ApplicationStatus::Approved),
        pending: applications
            .iter()
            .filter(|application| application.status.is_pending())
            .count(),
        rejected: count(ApplicationStatus::Rejected),
        total_requested_amount: applications
            .iter()
            .map(LoanApplication::requested_amount)
            .sum(),
        recent: by_recency
            .into_iter()
            .take(RECENT_LIMIT)
            .map(RecentApplication::from)
            .collect(),
    }
}

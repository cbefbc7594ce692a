use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use loan_origination::error::AppError;
use loan_origination::workflows::origination::{
    seed_demo_data, InMemoryApplicationRepository, InMemoryBackend, InMemoryDocumentStore,
    InMemoryNotificationRepository, MockUserDirectory, OriginationApi,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory lending desk: the adapters plus the API built over them.
pub(crate) struct Desk {
    pub(crate) applications: Arc<InMemoryApplicationRepository>,
    pub(crate) notifications: Arc<InMemoryNotificationRepository>,
    pub(crate) api: Arc<OriginationApi<InMemoryBackend>>,
}

impl Desk {
    pub(crate) fn build(seed: bool) -> Result<Self, AppError> {
        let applications = Arc::new(InMemoryApplicationRepository::default());
        let notifications = Arc::new(InMemoryNotificationRepository::default());
        let documents = Arc::new(InMemoryDocumentStore::default());
        let users = Arc::new(MockUserDirectory::default());

        if seed {
            seed_demo_data(&applications, &notifications, &users)?;
        }

        let api = Arc::new(OriginationApi::new(
            applications.clone(),
            notifications.clone(),
            documents,
            users,
        ));

        Ok(Self {
            applications,
            notifications,
            api,
        })
    }
}

/// Delay every request by the configured mock-backend latency.
pub(crate) async fn simulate_latency(
    State(latency): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
    next.run(request).await
}

pub(crate) fn parse_amount(raw: &str) -> Result<u64, String> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
    cleaned
        .parse::<u64>()
        .map_err(|err| format!("failed to parse '{raw}' as a whole amount ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_accept_grouping_separators() {
        assert_eq!(parse_amount("50,000"), Ok(50_000));
        assert_eq!(parse_amount(" 1_000 "), Ok(1_000));
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("ten").is_err());
    }

    #[test]
    fn seeded_desk_starts_with_the_sample_application() {
        let desk = Desk::build(true).expect("desk builds");
        assert_eq!(desk.applications.len(), 1);
        assert_eq!(desk.notifications.all().len(), 2);

        let empty = Desk::build(false).expect("desk builds");
        assert!(empty.applications.is_empty());
    }
}

//! Application state management.

use std::sync::Arc;

use crate::domain::TransactionSource;
use crate::infra::registry::RegistryManager;

use super::report_service::ReportService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub report_service: Arc<ReportService>,
    pub transaction_source: Arc<dyn TransactionSource>,
    pub registries: Arc<RegistryManager>,
}

impl AppState {
    /// Create application state over an indexer source and registries.
    #[must_use]
    pub fn new(
        transaction_source: Arc<dyn TransactionSource>,
        registries: Arc<RegistryManager>,
    ) -> Self {
        let report_service = Arc::new(ReportService::new(
            Arc::clone(&transaction_source),
            Arc::clone(&registries),
        ));
        Self {
            report_service,
            transaction_source,
            registries,
        }
    }

    /// Replace the report service (builder pattern); used to apply a custom
    /// cache TTL or fetch limit from configuration.
    #[must_use]
    pub fn with_report_service(mut self, service: ReportService) -> Self {
        self.report_service = Arc::new(service);
        self
    }
}

//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::AppError;
use super::types::TransactionRecord;

/// Source of normalized transaction history for an address.
///
/// Implementations own all network I/O, retries, and upstream timeouts; the
/// engine only ever sees the materialized, already-normalized list.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Check upstream connectivity.
    async fn health_check(&self) -> Result<(), AppError>;

    /// Fetch up to `limit` most recent transactions for `address`,
    /// normalized to [`TransactionRecord`]. Records with negative amounts or
    /// non-finite timestamps must be dropped during normalization.
    async fn fetch_transactions(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, AppError>;

    /// Provider name for logging and health reporting.
    fn name(&self) -> &'static str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MinimalSource;

    #[async_trait]
    impl TransactionSource for MinimalSource {
        async fn health_check(&self) -> Result<(), AppError> {
            Ok(())
        }

        async fn fetch_transactions(
            &self,
            _address: &str,
            _limit: usize,
        ) -> Result<Vec<TransactionRecord>, AppError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_default_name() {
        let source = MinimalSource;
        assert_eq!(source.name(), "unknown");
        assert!(source.fetch_transactions("addr", 10).await.unwrap().is_empty());
    }
}

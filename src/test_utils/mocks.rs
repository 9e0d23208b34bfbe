//! Mock implementations for testing.

use async_trait::async_trait;

use crate::domain::{
    AppError, ExternalServiceError, TransactionRecord, TransactionSource,
};

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }
}

/// Mock transaction source serving a fixed history.
#[derive(Default)]
pub struct MockTransactionSource {
    history: Vec<TransactionRecord>,
    config: MockConfig,
}

impl MockTransactionSource {
    #[must_use]
    pub fn new(history: Vec<TransactionRecord>) -> Self {
        Self {
            history,
            config: MockConfig::success(),
        }
    }

    /// A varied synthetic history of `n` transactions.
    #[must_use]
    pub fn with_history(n: usize) -> Self {
        let history = (0..n)
            .map(|i| {
                TransactionRecord::new(
                    format!("mock-sig-{i}"),
                    1_700_000_000 + (i as i64) * 5_417,
                    0.25 + (i as f64) * 0.19,
                    format!("mock-counterparty-{}", i % 7),
                    if i % 4 == 0 { "SWAP" } else { "TRANSFER" },
                )
                .with_fee(0.000005)
            })
            .collect();
        Self::new(history)
    }

    /// A source whose calls always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            history: Vec::new(),
            config: MockConfig::failure("mock indexer failure"),
        }
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(AppError::ExternalService(ExternalServiceError::Unavailable(msg)));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionSource for MockTransactionSource {
    async fn health_check(&self) -> Result<(), AppError> {
        self.check_should_fail()
    }

    async fn fetch_transactions(
        &self,
        _address: &str,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, AppError> {
        self.check_should_fail()?;
        Ok(self.history.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

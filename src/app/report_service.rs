//! Privacy report service.
//!
//! Sits between the HTTP layer and the pure engine:
//! 1. Validate the address (Base58, 32 bytes decoded).
//! 2. Fetch the transaction snapshot from the indexer.
//! 3. Return a cached report if the snapshot is unchanged and fresh.
//! 4. Otherwise run the engine and cache the result.
//!
//! Caching is keyed by address and guarded by a snapshot hash, so a wallet
//! with new activity always gets a fresh report even inside the TTL.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    AppError, MetricKind, ReferenceStats, TransactionRecord, TransactionSource, ValidationError,
};
use crate::engine::{
    self, PrivacyReport, analyze_clustering, analyze_entropy, analyze_graph,
    analyze_mutual_information, analyze_temporal, detect_cross_chain, detect_dust_attack,
    detect_exchange_interaction, detect_mixer, estimate_differential_privacy, estimate_k_anonymity,
};
use crate::infra::registry::RegistryManager;

/// Default cache TTL: 1 hour (3600 seconds)
pub const DEFAULT_CACHE_TTL_SECS: i64 = 3600;

/// Default number of transactions fetched per analysis.
pub const DEFAULT_FETCH_LIMIT: usize = 100;

struct CachedReport {
    report: PrivacyReport,
    snapshot_hash: [u8; 32],
    cached_at: DateTime<Utc>,
}

/// Service producing privacy reports over indexer snapshots.
pub struct ReportService {
    source: Arc<dyn TransactionSource>,
    registries: Arc<RegistryManager>,
    reference: ReferenceStats,
    cache: DashMap<String, CachedReport>,
    cache_ttl_secs: i64,
    fetch_limit: usize,
}

impl ReportService {
    pub fn new(source: Arc<dyn TransactionSource>, registries: Arc<RegistryManager>) -> Self {
        Self {
            source,
            registries,
            reference: ReferenceStats::default(),
            cache: DashMap::new(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }

    /// Override the cache TTL (builder pattern).
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl_secs: i64) -> Self {
        self.cache_ttl_secs = ttl_secs;
        self
    }

    /// Override the per-analysis fetch limit (builder pattern).
    #[must_use]
    pub fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = limit;
        self
    }

    /// Override the reference-population statistics (builder pattern).
    #[must_use]
    pub fn with_reference_stats(mut self, reference: ReferenceStats) -> Self {
        self.reference = reference;
        self
    }

    /// Produce a privacy report for `address`.
    ///
    /// `refresh` bypasses the cache but still stores the new result.
    #[instrument(skip(self), fields(address = %address))]
    pub async fn analyze(&self, address: &str, refresh: bool) -> Result<PrivacyReport, AppError> {
        validate_address(address)?;

        let txs = self.source.fetch_transactions(address, self.fetch_limit).await?;
        let snapshot_hash = snapshot_hash(&txs);

        if !refresh
            && let Some(cached) = self.cache.get(address)
            && cached.snapshot_hash == snapshot_hash
            && (Utc::now() - cached.cached_at).num_seconds() < self.cache_ttl_secs
        {
            debug!(address = %address, "Returning cached privacy report");
            return Ok(cached.report.clone());
        }

        info!(
            address = %address,
            transaction_count = txs.len(),
            "Generating privacy report"
        );
        let registries = self.registries.snapshot();
        let report = engine::generate_report(address, &txs, &self.reference, &registries);

        self.cache.insert(
            address.to_string(),
            CachedReport {
                report: report.clone(),
                snapshot_hash,
                cached_at: Utc::now(),
            },
        );

        Ok(report)
    }

    /// Run a single analyzer and return its result as JSON.
    #[instrument(skip(self), fields(address = %address, metric = ?metric))]
    pub async fn single_metric(
        &self,
        address: &str,
        metric: MetricKind,
    ) -> Result<serde_json::Value, AppError> {
        validate_address(address)?;

        let txs = self.source.fetch_transactions(address, self.fetch_limit).await?;
        let registries = self.registries.snapshot();

        let value = match metric {
            MetricKind::Entropy => serde_json::to_value(analyze_entropy(&txs))?,
            MetricKind::KAnonymity => {
                serde_json::to_value(estimate_k_anonymity(&txs, &self.reference))?
            }
            MetricKind::Graph => serde_json::to_value(analyze_graph(&txs, &registries))?,
            MetricKind::Temporal => serde_json::to_value(analyze_temporal(&txs))?,
            MetricKind::MutualInformation => {
                serde_json::to_value(analyze_mutual_information(&txs))?
            }
            MetricKind::DifferentialPrivacy => {
                serde_json::to_value(estimate_differential_privacy(&txs))?
            }
            MetricKind::Clustering => serde_json::to_value(analyze_clustering(&txs))?,
            MetricKind::Mixer => serde_json::to_value(detect_mixer(&txs, &registries))?,
            MetricKind::CrossChain => serde_json::to_value(detect_cross_chain(&txs, &registries))?,
            MetricKind::Dust => serde_json::to_value(detect_dust_attack(&txs))?,
            MetricKind::Exchange => {
                serde_json::to_value(detect_exchange_interaction(&txs, &registries))?
            }
        };

        Ok(value)
    }

    /// Drop every cached report. Used when the registries change, since
    /// cached reports embed registry matches.
    pub fn invalidate_cache(&self) {
        let evicted = self.cache.len();
        self.cache.clear();
        if evicted > 0 {
            warn!(evicted, "Report cache invalidated");
        }
    }
}

/// Validate that `address` is a Base58-encoded 32-byte public key.
fn validate_address(address: &str) -> Result<(), AppError> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|_| ValidationError::InvalidAddress(address.to_string()))?;
    if decoded.len() != 32 {
        return Err(ValidationError::InvalidAddress(address.to_string()).into());
    }
    Ok(())
}

/// Order-sensitive digest of the snapshot identity (signatures and
/// timestamps). Amounts are excluded; a signature uniquely identifies a
/// finalized transaction.
fn snapshot_hash(txs: &[TransactionRecord]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for tx in txs {
        hasher.update(tx.signature.as_bytes());
        hasher.update(tx.timestamp_seconds.to_le_bytes());
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockTransactionSource;

    const ADDRESS: &str = "HvwC9QSAzwEXkUkwqNNGhfNHoVqXJYfPvPZfQvJmHWcF";

    fn service(source: MockTransactionSource) -> ReportService {
        ReportService::new(Arc::new(source), Arc::new(RegistryManager::with_defaults()))
    }

    #[tokio::test]
    async fn test_analyze_rejects_invalid_address() {
        let service = service(MockTransactionSource::default());
        let err = service.analyze("not-an-address", false).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_analyze_caches_unchanged_snapshot() {
        let service = service(MockTransactionSource::with_history(20));

        let first = service.analyze(ADDRESS, false).await.unwrap();
        let second = service.analyze(ADDRESS, false).await.unwrap();
        // Same report id means the second call was served from cache.
        assert_eq!(first.report_id, second.report_id);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let service = service(MockTransactionSource::with_history(20));

        let first = service.analyze(ADDRESS, false).await.unwrap();
        let second = service.analyze(ADDRESS, true).await.unwrap();
        assert_ne!(first.report_id, second.report_id);
        assert_eq!(
            first.advanced_privacy_score,
            second.advanced_privacy_score
        );
    }

    #[tokio::test]
    async fn test_invalidate_cache_forces_regeneration() {
        let service = service(MockTransactionSource::with_history(20));

        let first = service.analyze(ADDRESS, false).await.unwrap();
        service.invalidate_cache();
        let second = service.analyze(ADDRESS, false).await.unwrap();
        assert_ne!(first.report_id, second.report_id);
    }

    #[tokio::test]
    async fn test_single_metric_returns_entropy_shape() {
        let service = service(MockTransactionSource::with_history(20));
        let value = service
            .single_metric(ADDRESS, MetricKind::Entropy)
            .await
            .unwrap();
        assert!(value.get("totalEntropy").is_some());
        assert!(value.get("interpretation").is_some());
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let service = service(MockTransactionSource::failing());
        let err = service.analyze(ADDRESS, false).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalService(_)));
    }
}

//! Domain types shared across the engine, the service layer, and the API.
//!
//! Analyzer-specific result types live next to the analyzers in
//! `crate::engine`; this module holds the input model, the reference data
//! injected into the engine, and the API envelope types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Counterparty placeholder used when an address could not be resolved.
pub const UNKNOWN_COUNTERPARTY: &str = "unknown";

/// A single normalized ledger transaction.
///
/// Produced by the indexer adapter (`infra::indexer`); the engine treats the
/// list as immutable input. Amounts and fees are in SOL and must be
/// non-negative; malformed records are rejected by the normalizer before
/// they reach the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Transaction signature (opaque identifier)
    #[schema(example = "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d")]
    pub signature: String,
    /// Unix timestamp in seconds
    pub timestamp_seconds: i64,
    /// Transferred amount in SOL (non-negative)
    pub amount: f64,
    /// Counterparty address, or `"unknown"` if unresolved
    pub counterparty: String,
    /// Free-form category tag (e.g. "TRANSFER", "SWAP")
    #[serde(rename = "type")]
    pub tx_type: String,
    /// Network fee in SOL
    pub fee: f64,
    /// Optional free text, used only for bridge/pattern matching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionRecord {
    #[must_use]
    pub fn new(
        signature: impl Into<String>,
        timestamp_seconds: i64,
        amount: f64,
        counterparty: impl Into<String>,
        tx_type: impl Into<String>,
    ) -> Self {
        Self {
            signature: signature.into(),
            timestamp_seconds,
            amount,
            counterparty: counterparty.into(),
            tx_type: tx_type.into(),
            fee: 0.0,
            description: None,
        }
    }

    /// Builder-style fee setter.
    #[must_use]
    pub fn with_fee(mut self, fee: f64) -> Self {
        self.fee = fee;
        self
    }

    /// Builder-style description setter.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Reference population statistics used by the k-anonymity estimator.
///
/// Injected as plain data; callers may supply statistics fitted to their own
/// user population. The defaults describe a typical active retail wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceStats {
    /// Average transaction count for a wallet in the reference population
    pub avg_transaction_count: f64,
    /// Average transfer amount in SOL
    pub avg_amount: f64,
    /// Average number of distinct counterparties
    pub avg_counterparty_count: f64,
}

impl Default for ReferenceStats {
    fn default() -> Self {
        Self {
            avg_transaction_count: 50.0,
            avg_amount: 1.0,
            avg_counterparty_count: 15.0,
        }
    }
}

/// Category of a known on-chain entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Centralized exchange hot wallet (KYC-linked)
    CexHotWallet,
    /// Decentralized exchange program or vault
    DexProgram,
    /// Cross-chain bridge program
    Bridge,
    /// Mixer / tumbler service
    Mixer,
    /// DeFi protocol (lending, staking, ...)
    Defi,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CexHotWallet => "cex_hot_wallet",
            Self::DexProgram => "dex_program",
            Self::Bridge => "bridge",
            Self::Mixer => "mixer",
            Self::Defi => "defi",
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cex_hot_wallet" => Ok(Self::CexHotWallet),
            "dex_program" => Ok(Self::DexProgram),
            "bridge" => Ok(Self::Bridge),
            "mixer" => Ok(Self::Mixer),
            "defi" => Ok(Self::Defi),
            _ => Err(format!("Invalid entity kind: {}", s)),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A labeled entry in an address registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KnownEntity {
    /// On-chain address (Base58), matched exactly or by 8-char prefix
    #[schema(example = "5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9")]
    pub address: String,
    /// Human-readable label (e.g. "Binance 1", "Wormhole")
    pub label: String,
    /// Entity category
    pub kind: EntityKind,
}

impl KnownEntity {
    #[must_use]
    pub fn new(address: impl Into<String>, label: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            address: address.into(),
            label: label.into(),
            kind,
        }
    }
}

/// Immutable snapshot of the known-entity registries, injected into the
/// engine as plain data (the engine never performs lookups over the network).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressRegistries {
    pub exchanges: Vec<KnownEntity>,
    pub bridges: Vec<KnownEntity>,
    pub mixers: Vec<KnownEntity>,
}

impl AddressRegistries {
    /// Find a registry entry matching `address` exactly or by 8-char prefix.
    #[must_use]
    pub fn match_entity<'a>(entries: &'a [KnownEntity], address: &str) -> Option<&'a KnownEntity> {
        entries.iter().find(|e| {
            e.address == address
                || (address.len() >= 8
                    && e.address.len() >= 8
                    && e.address.as_bytes()[..8] == address.as_bytes()[..8])
        })
    }
}

/// Overall wallet risk level derived from the final privacy score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "MINIMAL",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-metric risk tier used by the k-anonymity, dust, and exchange
/// analyzers (no MINIMAL level at metric granularity).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Tier for a vulnerability score in [0,1] using the shared
    /// 0.3 / 0.5 / 0.7 breakpoints.
    #[must_use]
    pub fn from_vulnerability(score: f64) -> Self {
        if score >= 0.7 {
            Self::Critical
        } else if score >= 0.5 {
            Self::High
        } else if score >= 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Letter grade for the final privacy score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }

    /// Grade breakpoints: >=90 A+, >=80 A, >=70 B, >=60 C, >=50 D, else F.
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Self::APlus,
            80..=89 => Self::A,
            70..=79 => Self::B,
            60..=69 => Self::C,
            50..=59 => Self::D,
            _ => Self::F,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Priority of a remediation action. Ordered so that sorting ascending
/// yields HIGH before MEDIUM before LOW.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

/// A ranked remediation action included in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    /// Deduplication key and headline (e.g. "Vary transaction amounts")
    pub action: String,
    /// Why this action was suggested for this wallet
    pub rationale: String,
}

/// Request body for `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Wallet address to analyze (Base58 Solana address)
    #[validate(length(min = 32, max = 44, message = "Address must be a Base58 Solana address"))]
    #[schema(example = "HvwC9QSAzwEXkUkwqNNGhfNHoVqXJYfPvPZfQvJmHWcF")]
    pub address: String,
    /// Skip the report cache and recompute from a fresh snapshot
    #[serde(default)]
    pub refresh: bool,
}

/// Narrow per-analyzer entry points exposed by the API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Entropy,
    KAnonymity,
    Graph,
    Temporal,
    MutualInformation,
    DifferentialPrivacy,
    Clustering,
    Mixer,
    CrossChain,
    Dust,
    Exchange,
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entropy" => Ok(Self::Entropy),
            "k_anonymity" => Ok(Self::KAnonymity),
            "graph" => Ok(Self::Graph),
            "temporal" => Ok(Self::Temporal),
            "mutual_information" => Ok(Self::MutualInformation),
            "differential_privacy" => Ok(Self::DifferentialPrivacy),
            "clustering" => Ok(Self::Clustering),
            "mixer" => Ok(Self::Mixer),
            "cross_chain" => Ok(Self::CrossChain),
            "dust" => Ok(Self::Dust),
            "exchange" => Ok(Self::Exchange),
            _ => Err(format!("Unknown metric: {}", s)),
        }
    }
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Some systems degraded but functional
    Degraded,
    /// Critical systems unavailable
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// Indexer client health status
    pub indexer: HealthStatus,
    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
    /// Application version
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn new(indexer: HealthStatus) -> Self {
        // The engine has no failure modes of its own; overall health follows
        // the upstream indexer.
        Self {
            status: indexer,
            indexer,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Error type identifier
    #[schema(example = "validation_error")]
    pub r#type: String,
    /// Human-readable error message
    #[schema(example = "Invalid Solana address")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_entity_kind_display_and_parsing() {
        let kinds = vec![
            (EntityKind::CexHotWallet, "cex_hot_wallet"),
            (EntityKind::DexProgram, "dex_program"),
            (EntityKind::Bridge, "bridge"),
            (EntityKind::Mixer, "mixer"),
            (EntityKind::Defi, "defi"),
        ];

        for (kind, string) in kinds {
            assert_eq!(kind.as_str(), string);
            assert_eq!(kind.to_string(), string);
            assert_eq!(EntityKind::from_str(string).unwrap(), kind);
        }

        assert!(EntityKind::from_str("invalid").is_err());
    }

    #[test]
    fn test_grade_breakpoints() {
        assert_eq!(Grade::from_score(100), Grade::APlus);
        assert_eq!(Grade::from_score(90), Grade::APlus);
        assert_eq!(Grade::from_score(89), Grade::A);
        assert_eq!(Grade::from_score(80), Grade::A);
        assert_eq!(Grade::from_score(70), Grade::B);
        assert_eq!(Grade::from_score(60), Grade::C);
        assert_eq!(Grade::from_score(50), Grade::D);
        assert_eq!(Grade::from_score(49), Grade::F);
        assert_eq!(Grade::from_score(0), Grade::F);
    }

    #[test]
    fn test_risk_tier_breakpoints() {
        assert_eq!(RiskTier::from_vulnerability(0.0), RiskTier::Low);
        assert_eq!(RiskTier::from_vulnerability(0.3), RiskTier::Medium);
        assert_eq!(RiskTier::from_vulnerability(0.5), RiskTier::High);
        assert_eq!(RiskTier::from_vulnerability(0.7), RiskTier::Critical);
        assert_eq!(RiskTier::from_vulnerability(1.0), RiskTier::Critical);
    }

    #[test]
    fn test_registry_prefix_match() {
        let entries = vec![KnownEntity::new(
            "5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9",
            "Binance 1",
            EntityKind::CexHotWallet,
        )];

        // Exact match
        assert!(
            AddressRegistries::match_entity(
                &entries,
                "5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9"
            )
            .is_some()
        );
        // 8-char prefix match
        assert!(AddressRegistries::match_entity(&entries, "5tzFkiKsDIFFERENTSUFFIX").is_some());
        // No match
        assert!(
            AddressRegistries::match_entity(
                &entries,
                "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"
            )
            .is_none()
        );
        // Short address never prefix-matches
        assert!(AddressRegistries::match_entity(&entries, "5tzFkiK").is_none());
    }

    #[test]
    fn test_registry_match_tolerates_multibyte_addresses() {
        // Counterparties are free-form strings; a multibyte value whose
        // 8th byte is mid-character must not panic the prefix comparison.
        let entries = vec![KnownEntity::new(
            "5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9",
            "Binance 1",
            EntityKind::CexHotWallet,
        )];
        assert!(AddressRegistries::match_entity(&entries, "あいう").is_none());

        // The same holds when the registry side carries the multibyte value.
        let entries = vec![KnownEntity::new("あいう", "odd label", EntityKind::Mixer)];
        assert!(AddressRegistries::match_entity(&entries, "あいう").is_some());
        assert!(
            AddressRegistries::match_entity(
                &entries,
                "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"
            )
            .is_none()
        );
    }

    #[test]
    fn test_transaction_record_serialization_uses_type_field() {
        let tx = TransactionRecord::new("sig1", 1_700_000_000_i64, 1.5, "CounterpartyA", "TRANSFER")
            .with_fee(0.000005);
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "TRANSFER");
        assert_eq!(json["timestampSeconds"], 1_700_000_000_i64);

        let back: TransactionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_recommendation_priority_ordering() {
        assert!(RecommendationPriority::High < RecommendationPriority::Medium);
        assert!(RecommendationPriority::Medium < RecommendationPriority::Low);
    }

    #[test]
    fn test_analyze_request_validation() {
        let req = AnalyzeRequest {
            address: "HvwC9QSAzwEXkUkwqNNGhfNHoVqXJYfPvPZfQvJmHWcF".to_string(),
            refresh: false,
        };
        assert!(req.validate().is_ok());

        let req = AnalyzeRequest {
            address: "short".to_string(),
            refresh: false,
        };
        assert!(req.validate().is_err());
    }
}

//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{AppError, ConfigError, ExternalServiceError, ValidationError};
pub use traits::TransactionSource;
pub use types::{
    AddressRegistries, AnalyzeRequest, EntityKind, ErrorDetail, ErrorResponse, Grade,
    HealthResponse, HealthStatus, KnownEntity, MetricKind, Recommendation,
    RecommendationPriority, ReferenceStats, RiskLevel, RiskTier, TransactionRecord,
    UNKNOWN_COUNTERPARTY,
};

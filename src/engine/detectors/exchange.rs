//! Exchange-interaction fingerprinting.
//!
//! Centralized-exchange deposits are the strongest real-world
//! deanonymization vector: the exchange holds KYC records for the deposit
//! address. DEX interactions leave an on-chain trail but no identity
//! binding, so they weigh far less.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AddressRegistries, EntityKind, RiskTier, TransactionRecord};
use crate::engine::stats::clamp01;

const MIN_SAMPLE: usize = 3;

/// KYC exposure added per CEX interaction / per DEX interaction.
const CEX_EXPOSURE_WEIGHT: f64 = 0.15;
const DEX_EXPOSURE_WEIGHT: f64 = 0.03;

/// Fallback name fragments for unregistered exchange frontends.
const CEX_PATTERNS: &[&str] = &["binance", "coinbase", "kraken", "okx", "bybit", "kucoin"];
const DEX_PATTERNS: &[&str] = &["raydium", "orca", "jupiter", "serum", "meteora"];

/// One matched exchange interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInteraction {
    pub counterparty: String,
    /// Registry label or matched name fragment
    pub exchange: String,
    pub kind: EntityKind,
    pub transaction_count: usize,
}

/// Exchange fingerprint result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeAnalysis {
    pub cex_transaction_count: usize,
    pub dex_transaction_count: usize,
    pub exchange_interaction_detected: bool,
    /// Estimated KYC linkability, in [0,1]
    pub kyc_exposure: f64,
    /// Tiered at the shared 0.3 / 0.5 / 0.7 breakpoints
    pub traceability_risk: RiskTier,
    pub interactions: Vec<ExchangeInteraction>,
    pub interpretation: String,
}

impl ExchangeAnalysis {
    fn empty() -> Self {
        Self {
            cex_transaction_count: 0,
            dex_transaction_count: 0,
            exchange_interaction_detected: false,
            kyc_exposure: 0.0,
            traceability_risk: RiskTier::Low,
            interactions: Vec::new(),
            interpretation: "Insufficient history for exchange fingerprinting.".to_string(),
        }
    }
}

fn classify(registries: &AddressRegistries, counterparty: &str) -> Option<(String, EntityKind)> {
    if let Some(entity) = AddressRegistries::match_entity(&registries.exchanges, counterparty) {
        return Some((entity.label.clone(), entity.kind));
    }
    let lowered = counterparty.to_lowercase();
    if let Some(p) = CEX_PATTERNS.iter().find(|p| lowered.contains(*p)) {
        return Some(((*p).to_string(), EntityKind::CexHotWallet));
    }
    if let Some(p) = DEX_PATTERNS.iter().find(|p| lowered.contains(*p)) {
        return Some(((*p).to_string(), EntityKind::DexProgram));
    }
    None
}

/// Fingerprint CEX/DEX interactions in `txs`.
#[must_use]
pub fn detect_exchange_interaction(
    txs: &[TransactionRecord],
    registries: &AddressRegistries,
) -> ExchangeAnalysis {
    if txs.len() < MIN_SAMPLE {
        return ExchangeAnalysis::empty();
    }

    // Aggregate per counterparty in first-seen order for stable output.
    let mut interactions: Vec<ExchangeInteraction> = Vec::new();
    let mut cex_count = 0usize;
    let mut dex_count = 0usize;

    for tx in txs {
        let Some((label, kind)) = classify(registries, &tx.counterparty) else {
            continue;
        };
        match kind {
            EntityKind::CexHotWallet => cex_count += 1,
            _ => dex_count += 1,
        }
        if let Some(existing) = interactions
            .iter_mut()
            .find(|i| i.counterparty == tx.counterparty)
        {
            existing.transaction_count += 1;
        } else {
            interactions.push(ExchangeInteraction {
                counterparty: tx.counterparty.clone(),
                exchange: label,
                kind,
                transaction_count: 1,
            });
        }
    }

    let exposure = clamp01(
        cex_count as f64 * CEX_EXPOSURE_WEIGHT + dex_count as f64 * DEX_EXPOSURE_WEIGHT,
    );
    let detected = !interactions.is_empty();
    let risk = RiskTier::from_vulnerability(exposure);

    ExchangeAnalysis {
        cex_transaction_count: cex_count,
        dex_transaction_count: dex_count,
        exchange_interaction_detected: detected,
        kyc_exposure: exposure,
        traceability_risk: risk,
        interactions,
        interpretation: if cex_count > 0 {
            format!(
                "{cex_count} transaction(s) with KYC-linked exchange wallets; identity is recoverable via exchange records."
            )
        } else if dex_count > 0 {
            format!("{dex_count} DEX interaction(s); traceable on-chain but not KYC-linked.")
        } else {
            "No known exchange interactions.".to_string()
        },
    }
}

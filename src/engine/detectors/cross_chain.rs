//! Cross-chain bridge activity detection.
//!
//! Matches counterparties against the injected bridge registry (exact or
//! 8-char prefix) with a substring/description fallback for unregistered
//! bridge frontends.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AddressRegistries, TransactionRecord};
use crate::engine::stats::clamp01;

const MIN_SAMPLE: usize = 3;

/// Fallback name fragments matched against counterparty and description.
const BRIDGE_PATTERNS: &[&str] = &[
    "wormhole", "portal", "allbridge", "debridge", "synapse", "bridge",
];

/// One matched bridge transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BridgeInteraction {
    pub signature: String,
    pub counterparty: String,
    /// Registry label, or the matched pattern for fallback hits
    pub bridge: String,
}

/// Cross-chain detection result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrossChainAnalysis {
    pub bridge_transaction_count: usize,
    /// Share of transactions touching a bridge, in [0,1]; proxy for how
    /// linkable this wallet is across chains
    pub cross_chain_linkability: f64,
    pub interactions: Vec<BridgeInteraction>,
    pub interpretation: String,
}

impl CrossChainAnalysis {
    fn empty() -> Self {
        Self {
            bridge_transaction_count: 0,
            cross_chain_linkability: 0.0,
            interactions: Vec::new(),
            interpretation: "Insufficient history for cross-chain detection.".to_string(),
        }
    }
}

/// Detect bridge interactions in `txs`.
#[must_use]
pub fn detect_cross_chain(
    txs: &[TransactionRecord],
    registries: &AddressRegistries,
) -> CrossChainAnalysis {
    if txs.len() < MIN_SAMPLE {
        return CrossChainAnalysis::empty();
    }

    let mut interactions = Vec::new();
    for tx in txs {
        if let Some(entity) = AddressRegistries::match_entity(&registries.bridges, &tx.counterparty)
        {
            interactions.push(BridgeInteraction {
                signature: tx.signature.clone(),
                counterparty: tx.counterparty.clone(),
                bridge: entity.label.clone(),
            });
            continue;
        }

        let haystack = format!(
            "{} {}",
            tx.counterparty.to_lowercase(),
            tx.description.as_deref().unwrap_or("").to_lowercase()
        );
        if let Some(pattern) = BRIDGE_PATTERNS.iter().find(|p| haystack.contains(*p)) {
            interactions.push(BridgeInteraction {
                signature: tx.signature.clone(),
                counterparty: tx.counterparty.clone(),
                bridge: (*pattern).to_string(),
            });
        }
    }

    let count = interactions.len();
    let linkability = clamp01(count as f64 / txs.len() as f64);

    CrossChainAnalysis {
        bridge_transaction_count: count,
        cross_chain_linkability: linkability,
        interactions,
        interpretation: if count == 0 {
            "No cross-chain bridge activity detected.".to_string()
        } else {
            format!(
                "{count} bridge transaction(s) found; cross-chain movements can be correlated on the destination chain."
            )
        },
    }
}

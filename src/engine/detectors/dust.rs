//! Dust-attack vulnerability detection.
//!
//! Tiny incoming transfers are the classic deanonymization probe: an
//! attacker sprays sub-fee amounts and watches where they move. The score
//! combines dust volume, sender repetition, round amounts, and sender
//! fan-in, each capped so no single component dominates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{RiskTier, TransactionRecord};
use crate::engine::stats::clamp01;

const MIN_SAMPLE: usize = 3;

/// Transfers under this many SOL are dust.
pub const DUST_THRESHOLD_SOL: f64 = 0.001;

/// Dust transactions before the attack flag is raised.
const DETECTION_COUNT: usize = 3;

/// Component weights (sum 1.0).
const DUST_COUNT_WEIGHT: f64 = 0.35;
const REPEAT_SENDER_WEIGHT: f64 = 0.25;
const ROUND_AMOUNT_WEIGHT: f64 = 0.20;
const UNIQUE_SENDER_WEIGHT: f64 = 0.20;

/// Dust-attack detection result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DustAnalysis {
    pub dust_transaction_count: usize,
    pub unique_dust_senders: usize,
    /// Senders that sent dust more than once
    pub repeated_dust_senders: usize,
    /// Dust amounts that are exact multiples of 0.0001 SOL
    pub round_amount_count: usize,
    /// Combined vulnerability, in [0,1]
    pub dust_vulnerability: f64,
    pub dust_attack_detected: bool,
    /// Tiered at the shared 0.3 / 0.5 / 0.7 breakpoints
    pub linking_risk: RiskTier,
    pub interpretation: String,
}

impl DustAnalysis {
    fn empty() -> Self {
        Self {
            dust_transaction_count: 0,
            unique_dust_senders: 0,
            repeated_dust_senders: 0,
            round_amount_count: 0,
            dust_vulnerability: 0.0,
            dust_attack_detected: false,
            linking_risk: RiskTier::Low,
            interpretation: "Insufficient history for dust-attack detection.".to_string(),
        }
    }
}

fn is_round_dust(amount: f64) -> bool {
    // Exact multiple of 0.0001 SOL within a lamport of tolerance.
    let scaled = amount / 0.0001;
    (scaled - scaled.round()).abs() < 1e-5
}

/// Detect dust-attack exposure in `txs`.
#[must_use]
pub fn detect_dust_attack(txs: &[TransactionRecord]) -> DustAnalysis {
    if txs.len() < MIN_SAMPLE {
        return DustAnalysis::empty();
    }

    let dust: Vec<&TransactionRecord> = txs
        .iter()
        .filter(|t| t.amount > 0.0 && t.amount < DUST_THRESHOLD_SOL)
        .collect();

    let mut sender_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tx in &dust {
        *sender_counts.entry(tx.counterparty.as_str()).or_insert(0) += 1;
    }
    let unique_senders = sender_counts.len();
    let repeated_senders = sender_counts.values().filter(|&&c| c > 1).count();
    let round_amounts = dust.iter().filter(|t| is_round_dust(t.amount)).count();

    let vulnerability = clamp01(
        DUST_COUNT_WEIGHT * (dust.len() as f64 / 10.0).min(1.0)
            + REPEAT_SENDER_WEIGHT * (repeated_senders as f64 / 5.0).min(1.0)
            + ROUND_AMOUNT_WEIGHT * (round_amounts as f64 / 5.0).min(1.0)
            + UNIQUE_SENDER_WEIGHT * (unique_senders as f64 / 10.0).min(1.0),
    );

    let detected = dust.len() >= DETECTION_COUNT;
    let risk = RiskTier::from_vulnerability(vulnerability);

    DustAnalysis {
        dust_transaction_count: dust.len(),
        unique_dust_senders: unique_senders,
        repeated_dust_senders: repeated_senders,
        round_amount_count: round_amounts,
        dust_vulnerability: vulnerability,
        dust_attack_detected: detected,
        linking_risk: risk,
        interpretation: if detected {
            format!(
                "{} dust transfer(s) from {} sender(s); spending them would link this wallet to the attacker's tracking set.",
                dust.len(),
                unique_senders
            )
        } else {
            "No dust-attack pattern detected.".to_string()
        },
    }
}

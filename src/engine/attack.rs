//! Attack-probability simulation.
//!
//! Each named scenario converts one analyzer's output into a
//! deanonymization probability through fixed, documented thresholds. The
//! aggregate is biased toward the worst single vector, since a real
//! adversary only needs one of them to work.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::engine::clustering::ClusteringAnalysis;
use crate::engine::detectors::{DustAnalysis, ExchangeAnalysis};
use crate::engine::entropy::EntropyAnalysis;
use crate::engine::graph::GraphAnalysis;
use crate::engine::k_anonymity::KAnonymityAnalysis;
use crate::engine::stats::clamp01;
use crate::engine::temporal::TemporalAnalysis;

const AGGREGATE_CAP: f64 = 0.99;

/// One simulated deanonymization scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttackScenario {
    pub name: String,
    /// Success probability in [0,1], derived from fixed thresholds
    pub probability: f64,
    pub description: String,
}

/// Combined attack-surface assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttackSimulation {
    pub scenarios: Vec<AttackScenario>,
    /// `avg + (max - avg) / 2` over scenario probabilities, capped at 0.99
    pub aggregate_probability: f64,
    /// Qualitative estimate derived from the aggregate
    pub estimated_time_to_deanonymize: String,
    pub interpretation: String,
}

fn exchange_correlation(exchange: &ExchangeAnalysis, graph: &GraphAnalysis) -> AttackScenario {
    let probability = if graph.known_entity_hop_distance == Some(1) && exchange.cex_transaction_count > 0
    {
        0.85
    } else if exchange.kyc_exposure > 0.3 {
        0.5
    } else {
        clamp01(exchange.kyc_exposure)
    };
    AttackScenario {
        name: "exchange_correlation".to_string(),
        probability,
        description: "Subpoena or data-sharing with a KYC exchange links the deposit address to an identity.".to_string(),
    }
}

fn temporal_fingerprinting(temporal: &TemporalAnalysis) -> AttackScenario {
    let probability = if temporal.detected_period.is_some() {
        0.7
    } else if temporal.burstiness > 0.5 {
        0.5
    } else {
        0.25
    };
    AttackScenario {
        name: "temporal_fingerprinting".to_string(),
        probability,
        description: "Activity schedule (periodicity, bursts, timezone) is matched against off-chain behavior.".to_string(),
    }
}

fn amount_fingerprinting(entropy: &EntropyAnalysis) -> AttackScenario {
    let probability = if entropy.amount_entropy < 0.3 {
        0.75
    } else if entropy.amount_entropy < 0.5 {
        0.5
    } else {
        0.2
    };
    AttackScenario {
        name: "amount_fingerprinting".to_string(),
        probability,
        description: "Distinctive or repeated transaction amounts are traced across hops.".to_string(),
    }
}

fn graph_topology(graph: &GraphAnalysis) -> AttackScenario {
    let mut probability = 0.15 + 0.5 * graph.network_visibility;
    if !graph.clusters.is_empty() {
        probability += 0.2;
    }
    AttackScenario {
        name: "graph_topology".to_string(),
        probability: clamp01(probability).min(0.9),
        description: "The local transaction graph is matched against known entity neighborhoods.".to_string(),
    }
}

fn quasi_identifier_correlation(k_anon: &KAnonymityAnalysis) -> AttackScenario {
    let probability = if k_anon.estimated_k < 5 {
        0.8
    } else if k_anon.estimated_k < 20 {
        0.6
    } else if k_anon.estimated_k < 100 {
        0.35
    } else {
        0.15
    };
    AttackScenario {
        name: "quasi_identifier_correlation".to_string(),
        probability,
        description: "Behavioral quasi-identifiers narrow the anonymity set until the wallet is unique.".to_string(),
    }
}

fn dust_tracking(dust: &DustAnalysis) -> AttackScenario {
    let probability = if dust.dust_vulnerability >= 0.5 {
        0.65
    } else if dust.dust_attack_detected {
        0.45
    } else {
        0.1
    };
    AttackScenario {
        name: "dust_tracking".to_string(),
        probability,
        description: "Tagged dust outputs are followed when the wallet later consolidates them.".to_string(),
    }
}

fn time_bucket(aggregate: f64) -> &'static str {
    if aggregate > 0.7 {
        "hours to days"
    } else if aggregate > 0.4 {
        "days to weeks"
    } else if aggregate > 0.2 {
        "weeks to months"
    } else {
        "months to years"
    }
}

/// Run all scenarios against the analyzer outputs.
#[must_use]
pub fn simulate_attacks(
    entropy: &EntropyAnalysis,
    k_anon: &KAnonymityAnalysis,
    graph: &GraphAnalysis,
    temporal: &TemporalAnalysis,
    clustering: &ClusteringAnalysis,
    dust: &DustAnalysis,
    exchange: &ExchangeAnalysis,
) -> AttackSimulation {
    let mut scenarios = vec![
        exchange_correlation(exchange, graph),
        temporal_fingerprinting(temporal),
        amount_fingerprinting(entropy),
        graph_topology(graph),
        quasi_identifier_correlation(k_anon),
        dust_tracking(dust),
    ];

    // Cluster evidence strengthens the quasi-identifier vector.
    if clustering.clustering_vulnerability > 0.5 {
        if let Some(s) = scenarios
            .iter_mut()
            .find(|s| s.name == "quasi_identifier_correlation")
        {
            s.probability = clamp01(s.probability + 0.1);
        }
    }

    let avg = scenarios.iter().map(|s| s.probability).sum::<f64>() / scenarios.len() as f64;
    let max = scenarios
        .iter()
        .map(|s| s.probability)
        .fold(0.0_f64, f64::max);
    let aggregate = (avg + (max - avg) * 0.5).min(AGGREGATE_CAP);

    let worst = scenarios
        .iter()
        .max_by(|a, b| a.probability.total_cmp(&b.probability))
        .map(|s| s.name.clone())
        .unwrap_or_default();

    AttackSimulation {
        aggregate_probability: aggregate,
        estimated_time_to_deanonymize: time_bucket(aggregate).to_string(),
        interpretation: format!(
            "Aggregate deanonymization probability {:.0}%; strongest vector: {}.",
            aggregate * 100.0,
            worst
        ),
        scenarios,
    }
}

//! Score aggregation and report assembly.
//!
//! Every analyzer output is converted to a 0-100 sub-score where higher
//! always means more private, then combined through a fixed weight table.
//! Some raw metrics are "lower is better" (visibility, vulnerability,
//! attack probability); each conversion documents its sign.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    AddressRegistries, Grade, Recommendation, RecommendationPriority, ReferenceStats, RiskLevel,
    TransactionRecord,
};
use crate::engine::attack::{AttackSimulation, simulate_attacks};
use crate::engine::clustering::{ClusteringAnalysis, analyze_clustering};
use crate::engine::detectors::{
    CrossChainAnalysis, DustAnalysis, ExchangeAnalysis, MixerAnalysis, detect_cross_chain,
    detect_dust_attack, detect_exchange_interaction, detect_mixer,
};
use crate::engine::dp::{DifferentialPrivacyAnalysis, estimate_differential_privacy};
use crate::engine::entropy::{EntropyAnalysis, analyze_entropy};
use crate::engine::graph::{GraphAnalysis, analyze_graph};
use crate::engine::k_anonymity::{KAnonymityAnalysis, estimate_k_anonymity};
use crate::engine::mutual_information::{MutualInformationAnalysis, analyze_mutual_information};
use crate::engine::stats::clamp01;
use crate::engine::temporal::{TemporalAnalysis, analyze_temporal};

/// Sub-score weights. Must sum to exactly 1.0; re-validate whenever a
/// component is added or removed (see `test_weights_sum_to_one`).
const WEIGHT_ENTROPY: f64 = 0.15;
const WEIGHT_K_ANONYMITY: f64 = 0.12;
const WEIGHT_GRAPH: f64 = 0.11;
const WEIGHT_TEMPORAL: f64 = 0.10;
const WEIGHT_MUTUAL_INFORMATION: f64 = 0.12;
const WEIGHT_DIFFERENTIAL_PRIVACY: f64 = 0.07;
const WEIGHT_CLUSTERING: f64 = 0.11;
const WEIGHT_ATTACK_RESISTANCE: f64 = 0.12;
const WEIGHT_DUST: f64 = 0.04;
const WEIGHT_EXCHANGE: f64 = 0.04;
const WEIGHT_CROSS_CHAIN: f64 = 0.02;

/// The complete privacy report for one wallet snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyReport {
    pub address: String,
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub transaction_count: usize,
    pub entropy: EntropyAnalysis,
    pub k_anonymity: KAnonymityAnalysis,
    pub graph: GraphAnalysis,
    pub temporal: TemporalAnalysis,
    pub mutual_information: MutualInformationAnalysis,
    pub differential_privacy: DifferentialPrivacyAnalysis,
    pub clustering: ClusteringAnalysis,
    pub mixer: MixerAnalysis,
    pub cross_chain: CrossChainAnalysis,
    pub dust: DustAnalysis,
    pub exchange: ExchangeAnalysis,
    pub attack_simulation: AttackSimulation,
    /// Weighted total, in [0, 100]
    pub advanced_privacy_score: u32,
    pub grade: Grade,
    pub risk_level: RiskLevel,
    /// Sorted HIGH > MEDIUM > LOW, deduplicated by action
    pub recommendations: Vec<Recommendation>,
}

/// Risk-level breakpoints over the final score.
fn risk_level_for(score: u32) -> RiskLevel {
    match score {
        85.. => RiskLevel::Minimal,
        70..=84 => RiskLevel::Low,
        50..=69 => RiskLevel::Medium,
        30..=49 => RiskLevel::High,
        _ => RiskLevel::Critical,
    }
}

struct SubScores {
    entropy: f64,
    k_anonymity: f64,
    graph: f64,
    temporal: f64,
    mutual_information: f64,
    differential_privacy: f64,
    clustering: f64,
    attack_resistance: f64,
    dust: f64,
    exchange: f64,
    cross_chain: f64,
}

impl SubScores {
    fn weighted_total(&self) -> u32 {
        let total = self.entropy * WEIGHT_ENTROPY
            + self.k_anonymity * WEIGHT_K_ANONYMITY
            + self.graph * WEIGHT_GRAPH
            + self.temporal * WEIGHT_TEMPORAL
            + self.mutual_information * WEIGHT_MUTUAL_INFORMATION
            + self.differential_privacy * WEIGHT_DIFFERENTIAL_PRIVACY
            + self.clustering * WEIGHT_CLUSTERING
            + self.attack_resistance * WEIGHT_ATTACK_RESISTANCE
            + self.dust * WEIGHT_DUST
            + self.exchange * WEIGHT_EXCHANGE
            + self.cross_chain * WEIGHT_CROSS_CHAIN;
        total.round().clamp(0.0, 100.0) as u32
    }
}

#[allow(clippy::too_many_arguments)]
fn sub_scores(
    entropy: &EntropyAnalysis,
    k_anon: &KAnonymityAnalysis,
    graph: &GraphAnalysis,
    temporal: &TemporalAnalysis,
    mi: &MutualInformationAnalysis,
    dp: &DifferentialPrivacyAnalysis,
    clustering: &ClusteringAnalysis,
    attack: &AttackSimulation,
    dust: &DustAnalysis,
    exchange: &ExchangeAnalysis,
    cross_chain: &CrossChainAnalysis,
) -> SubScores {
    // Temporal exposure: periodicity and burstiness are fingerprints, so
    // invert their combination. A quiet irregular schedule scores high.
    let periodicity_peak = temporal
        .periodicity
        .iter()
        .map(|c| c.confidence)
        .fold(0.0_f64, f64::max);
    let temporal_exposure = clamp01(0.5 * periodicity_peak + 0.5 * temporal.burstiness.max(0.0));

    SubScores {
        // Higher entropy = less predictable = better.
        entropy: entropy.total_entropy * 100.0,
        // Larger anonymity set = better; k = 1000 saturates the scale.
        k_anonymity: (k_anon.estimated_k as f64 / 10.0).min(100.0),
        // Visibility is "lower is better": invert.
        graph: (1.0 - graph.network_visibility) * 100.0,
        // Exposure is "lower is better": invert.
        temporal: (1.0 - temporal_exposure) * 100.0,
        // Already a 0-100 preservation score.
        mutual_information: f64::from(mi.privacy_preservation_score),
        // Budget used is "lower is better": invert.
        differential_privacy: (1.0 - dp.privacy_budget_used) * 100.0,
        // Vulnerability is "lower is better": invert.
        clustering: (1.0 - clustering.clustering_vulnerability) * 100.0,
        // Attack probability is "lower is better": invert.
        attack_resistance: (1.0 - attack.aggregate_probability) * 100.0,
        dust: (1.0 - dust.dust_vulnerability) * 100.0,
        exchange: (1.0 - exchange.kyc_exposure) * 100.0,
        cross_chain: (1.0 - cross_chain.cross_chain_linkability) * 100.0,
    }
}

fn push(recs: &mut Vec<Recommendation>, priority: RecommendationPriority, action: &str, rationale: String) {
    if recs.iter().any(|r| r.action == action) {
        return;
    }
    recs.push(Recommendation {
        priority,
        action: action.to_string(),
        rationale,
    });
}

#[allow(clippy::too_many_arguments)]
fn build_recommendations(
    entropy: &EntropyAnalysis,
    k_anon: &KAnonymityAnalysis,
    graph: &GraphAnalysis,
    temporal: &TemporalAnalysis,
    clustering: &ClusteringAnalysis,
    mixer: &MixerAnalysis,
    dust: &DustAnalysis,
    exchange: &ExchangeAnalysis,
    cross_chain: &CrossChainAnalysis,
) -> Vec<Recommendation> {
    use RecommendationPriority::{High, Low, Medium};

    let mut recs = Vec::new();

    // Fixed scan order; dedup is by action text.
    if exchange.cex_transaction_count > 0 {
        push(
            &mut recs,
            High,
            "Use a dedicated deposit wallet for exchanges",
            format!(
                "{} transaction(s) link this wallet directly to KYC exchange accounts.",
                exchange.cex_transaction_count
            ),
        );
    }
    if dust.dust_attack_detected {
        push(
            &mut recs,
            High,
            "Do not consolidate dust outputs",
            format!(
                "{} dust transaction(s) detected; spending them together links this wallet to the tagger.",
                dust.dust_transaction_count
            ),
        );
    }
    if k_anon.estimated_k < 5 {
        push(
            &mut recs,
            High,
            "Reduce behavioral distinctiveness",
            format!(
                "Estimated anonymity set of {} wallets; this activity profile is close to unique.",
                k_anon.estimated_k
            ),
        );
    }
    if entropy.amount_entropy < 0.3 {
        push(
            &mut recs,
            Medium,
            "Vary transaction amounts",
            "Repeated or round amounts act as a fingerprint across hops.".to_string(),
        );
    }
    if temporal.detected_period.is_some() {
        push(
            &mut recs,
            Medium,
            "Randomize transaction timing",
            format!(
                "A {} activity cycle was detected and can be matched to off-chain schedules.",
                temporal.detected_period.as_deref().unwrap_or("regular")
            ),
        );
    }
    if clustering.clustering_vulnerability > 0.5 {
        push(
            &mut recs,
            Medium,
            "Avoid address-reuse patterns",
            "Clustering heuristics group this wallet with related addresses.".to_string(),
        );
    }
    if graph.degree > 0 && graph.clusters.is_empty() && graph.degree < 3 {
        push(
            &mut recs,
            Low,
            "Diversify counterparties",
            format!(
                "Only {} distinct counterpart(ies); a small neighborhood is easy to map.",
                graph.degree
            ),
        );
    }
    if cross_chain.bridge_transaction_count > 0 {
        push(
            &mut recs,
            Low,
            "Break the bridge trail",
            "Bridge transfers carry this wallet's history to other chains.".to_string(),
        );
    }
    if mixer.mixer_usage_detected {
        push(
            &mut recs,
            Low,
            "Review mixer interaction exposure",
            "Mixer-style activity attracts compliance scrutiny even when privacy-motivated.".to_string(),
        );
    }
    if recs.is_empty() {
        push(
            &mut recs,
            Low,
            "Maintain current practices",
            "No dominant deanonymization vector was found in this snapshot.".to_string(),
        );
    }

    recs.sort_by_key(|r| r.priority);
    recs
}

/// Deterministic report assembly with caller-supplied timestamp and id.
///
/// The service layer uses this with `Utc::now()` and a fresh UUID; tests
/// pin both to get byte-identical output.
#[must_use]
pub fn generate_report_at(
    address: &str,
    txs: &[TransactionRecord],
    reference: &ReferenceStats,
    registries: &AddressRegistries,
    generated_at: DateTime<Utc>,
    report_id: Uuid,
) -> PrivacyReport {
    let entropy = analyze_entropy(txs);
    let k_anonymity = estimate_k_anonymity(txs, reference);
    let graph = analyze_graph(txs, registries);
    let temporal = analyze_temporal(txs);
    let mutual_information = analyze_mutual_information(txs);
    let differential_privacy = estimate_differential_privacy(txs);
    let clustering = analyze_clustering(txs);
    let mixer = detect_mixer(txs, registries);
    let cross_chain = detect_cross_chain(txs, registries);
    let dust = detect_dust_attack(txs);
    let exchange = detect_exchange_interaction(txs, registries);

    let attack_simulation = simulate_attacks(
        &entropy,
        &k_anonymity,
        &graph,
        &temporal,
        &clustering,
        &dust,
        &exchange,
    );

    let scores = sub_scores(
        &entropy,
        &k_anonymity,
        &graph,
        &temporal,
        &mutual_information,
        &differential_privacy,
        &clustering,
        &attack_simulation,
        &dust,
        &exchange,
        &cross_chain,
    );
    let advanced_privacy_score = scores.weighted_total();

    let recommendations = build_recommendations(
        &entropy,
        &k_anonymity,
        &graph,
        &temporal,
        &clustering,
        &mixer,
        &dust,
        &exchange,
        &cross_chain,
    );

    PrivacyReport {
        address: address.to_string(),
        report_id,
        generated_at,
        transaction_count: txs.len(),
        entropy,
        k_anonymity,
        graph,
        temporal,
        mutual_information,
        differential_privacy,
        clustering,
        mixer,
        cross_chain,
        dust,
        exchange,
        attack_simulation,
        grade: Grade::from_score(advanced_privacy_score),
        risk_level: risk_level_for(advanced_privacy_score),
        advanced_privacy_score,
        recommendations,
    }
}

/// Generate a report stamped with the current time and a fresh id.
#[must_use]
pub fn generate_report(
    address: &str,
    txs: &[TransactionRecord],
    reference: &ReferenceStats,
    registries: &AddressRegistries,
) -> PrivacyReport {
    generate_report_at(address, txs, reference, registries, Utc::now(), Uuid::now_v7())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "HvwC9QSAzwEXkUkwqNNGhfNHoVqXJYfPvPZfQvJmHWcF";

    fn varied_history(n: usize) -> Vec<TransactionRecord> {
        (0..n)
            .map(|i| {
                TransactionRecord::new(
                    format!("sig{i}"),
                    1_700_000_000 + (i as i64) * 7_451,
                    0.5 + i as f64 * 0.37,
                    format!("counterparty-{i}"),
                    if i % 3 == 0 { "SWAP" } else { "TRANSFER" },
                )
                .with_fee(0.000005)
            })
            .collect()
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum = WEIGHT_ENTROPY
            + WEIGHT_K_ANONYMITY
            + WEIGHT_GRAPH
            + WEIGHT_TEMPORAL
            + WEIGHT_MUTUAL_INFORMATION
            + WEIGHT_DIFFERENTIAL_PRIVACY
            + WEIGHT_CLUSTERING
            + WEIGHT_ATTACK_RESISTANCE
            + WEIGHT_DUST
            + WEIGHT_EXCHANGE
            + WEIGHT_CROSS_CHAIN;
        assert!((sum - 1.0).abs() < 1e-12, "weights sum to {sum}");
    }

    #[test]
    fn test_score_bounds_and_breakpoint_consistency() {
        let histories = vec![Vec::new(), varied_history(1), varied_history(8), varied_history(40)];
        for txs in histories {
            let report = generate_report(
                ADDRESS,
                &txs,
                &ReferenceStats::default(),
                &AddressRegistries::default(),
            );
            assert!(report.advanced_privacy_score <= 100);
            assert_eq!(report.grade, Grade::from_score(report.advanced_privacy_score));
            assert_eq!(
                report.risk_level,
                risk_level_for(report.advanced_privacy_score)
            );
            assert!(!report.recommendations.is_empty());
        }
    }

    #[test]
    fn test_empty_history_is_degenerate_but_valid() {
        let report = generate_report(
            ADDRESS,
            &[],
            &ReferenceStats::default(),
            &AddressRegistries::default(),
        );
        assert_eq!(report.transaction_count, 0);
        assert_eq!(report.entropy.total_entropy, 0.0);
        assert_eq!(report.k_anonymity.estimated_k, 1000);
        assert_eq!(report.graph.degree, 0);
        assert!(!report.dust.dust_attack_detected);
    }

    #[test]
    fn test_risk_level_breakpoints() {
        assert_eq!(risk_level_for(100), RiskLevel::Minimal);
        assert_eq!(risk_level_for(85), RiskLevel::Minimal);
        assert_eq!(risk_level_for(84), RiskLevel::Low);
        assert_eq!(risk_level_for(70), RiskLevel::Low);
        assert_eq!(risk_level_for(69), RiskLevel::Medium);
        assert_eq!(risk_level_for(50), RiskLevel::Medium);
        assert_eq!(risk_level_for(49), RiskLevel::High);
        assert_eq!(risk_level_for(30), RiskLevel::High);
        assert_eq!(risk_level_for(29), RiskLevel::Critical);
        assert_eq!(risk_level_for(0), RiskLevel::Critical);
    }

    #[test]
    fn test_deterministic_assembly() {
        let txs = varied_history(20);
        let when = DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let id = Uuid::nil();

        let a = generate_report_at(
            ADDRESS,
            &txs,
            &ReferenceStats::default(),
            &AddressRegistries::default(),
            when,
            id,
        );
        let b = generate_report_at(
            ADDRESS,
            &txs,
            &ReferenceStats::default(),
            &AddressRegistries::default(),
            when,
            id,
        );
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    #[test]
    fn test_recommendations_sorted_and_deduplicated() {
        // Dusted wallet with an exchange counterparty and repeated amounts.
        let mut txs: Vec<TransactionRecord> = (0..8)
            .map(|i| {
                TransactionRecord::new(
                    format!("dust{i}"),
                    1_700_000_000 + (i as i64) * 120,
                    0.0005,
                    format!("sender-{}", i % 3),
                    "TRANSFER",
                )
            })
            .collect();
        for i in 0..5 {
            txs.push(
                TransactionRecord::new(
                    format!("cex{i}"),
                    1_700_100_000 + (i as i64) * 600,
                    2.0,
                    "binance-hot-wallet",
                    "TRANSFER",
                )
                .with_fee(0.000005),
            );
        }

        let report = generate_report(
            ADDRESS,
            &txs,
            &ReferenceStats::default(),
            &AddressRegistries::default(),
        );

        let priorities: Vec<_> = report.recommendations.iter().map(|r| r.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);

        let mut actions: Vec<_> = report
            .recommendations
            .iter()
            .map(|r| r.action.as_str())
            .collect();
        let before = actions.len();
        actions.dedup();
        assert_eq!(before, actions.len());

        assert!(report
            .recommendations
            .iter()
            .any(|r| r.action == "Use a dedicated deposit wallet for exchanges"
                && r.priority == RecommendationPriority::High));
    }
}

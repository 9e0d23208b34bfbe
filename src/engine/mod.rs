//! The privacy scoring engine.
//!
//! Pure, deterministic, synchronous. Every analyzer is a side-effect-free
//! function of an immutable transaction slice plus optional reference data;
//! [`score::generate_report`] fans out to all of them and aggregates.

pub mod attack;
pub mod clustering;
pub mod detectors;
pub mod dp;
pub mod entropy;
pub mod graph;
pub mod k_anonymity;
pub mod mutual_information;
pub mod score;
pub mod stats;
pub mod temporal;

pub use attack::{AttackScenario, AttackSimulation, simulate_attacks};
pub use clustering::{ClusteringAnalysis, DetectedCluster, analyze_clustering};
pub use detectors::{
    BridgeInteraction, CrossChainAnalysis, DustAnalysis, ExchangeAnalysis, ExchangeInteraction,
    MixerAnalysis, MixerStyle, detect_cross_chain, detect_dust_attack,
    detect_exchange_interaction, detect_mixer,
};
pub use dp::{DifferentialPrivacyAnalysis, DpTier, estimate_differential_privacy};
pub use entropy::{EntropyAnalysis, analyze_entropy};
pub use graph::{ClusterHypothesis, GraphAnalysis, analyze_graph};
pub use k_anonymity::{KAnonymityAnalysis, QuasiIdentifier, estimate_k_anonymity};
pub use mutual_information::{MutualInformationAnalysis, analyze_mutual_information};
pub use score::{PrivacyReport, generate_report, generate_report_at};
pub use temporal::{PeriodicityCandidate, TemporalAnalysis, TimezoneEstimate, analyze_temporal};

//! Pattern detectors for specific deanonymization vectors.

pub mod cross_chain;
pub mod dust;
pub mod exchange;
pub mod mixer;

pub use cross_chain::{BridgeInteraction, CrossChainAnalysis, detect_cross_chain};
pub use dust::{DUST_THRESHOLD_SOL, DustAnalysis, detect_dust_attack};
pub use exchange::{ExchangeAnalysis, ExchangeInteraction, detect_exchange_interaction};
pub use mixer::{MixerAnalysis, MixerStyle, detect_mixer};

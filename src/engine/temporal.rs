//! Timing-pattern analysis: inter-arrival
//! autocorrelation, burstiness, periodicity, and a timezone guess.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::TransactionRecord;
use crate::engine::stats::{clamp01, finite_or_zero, inter_arrival_gaps, mean, std_dev, utc_hour};

/// Below this many records all temporal metrics are zeroed and no timezone
/// guess is made.
const MIN_SAMPLE: usize = 5;

/// Candidate periods tested against inter-arrival times.
const CANDIDATE_PERIODS: &[(&str, f64)] = &[
    ("hourly", 3_600.0),
    ("daily", 86_400.0),
    ("weekly", 604_800.0),
    ("monthly", 2_592_000.0),
];

/// Minimum folded-residual confidence before a period counts as detected.
const PERIODICITY_THRESHOLD: f64 = 0.7;

/// Minimum modal-hour concentration before a timezone guess is emitted.
const TIMEZONE_MIN_CONFIDENCE: f64 = 0.15;

/// Assumed local peak-activity hour used to translate the modal UTC hour
/// into an offset guess.
const ASSUMED_PEAK_HOUR: i32 = 14;

/// Periodicity score for one candidate period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicityCandidate {
    pub period: String,
    /// Folded-residual confidence, in [0,1]
    pub confidence: f64,
}

/// UTC-offset guess from the modal activity hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimezoneEstimate {
    /// Estimated UTC offset in hours, in [-12, 11]
    pub utc_offset_hours: i32,
    /// Share of activity in the modal hour, in [0,1]
    pub confidence: f64,
}

/// Temporal analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemporalAnalysis {
    /// Lag-1 autocorrelation of inter-arrival gaps, in [-1,1]
    pub autocorrelation: f64,
    /// (sigma - mu) / (sigma + mu) of inter-arrival times, in [-1,1]:
    /// 0 Poisson-like, -> 1 bursty, -> -1 periodic
    pub burstiness: f64,
    pub periodicity: Vec<PeriodicityCandidate>,
    /// Best candidate at confidence >= 0.7, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone_estimate: Option<TimezoneEstimate>,
    pub interpretation: String,
}

impl TemporalAnalysis {
    fn empty() -> Self {
        Self {
            autocorrelation: 0.0,
            burstiness: 0.0,
            periodicity: Vec::new(),
            detected_period: None,
            timezone_estimate: None,
            interpretation: "Insufficient history for temporal analysis.".to_string(),
        }
    }
}

/// Analyze the timing structure of `txs`.
#[must_use]
pub fn analyze_temporal(txs: &[TransactionRecord]) -> TemporalAnalysis {
    if txs.len() < MIN_SAMPLE {
        return TemporalAnalysis::empty();
    }

    let gaps = inter_arrival_gaps(txs);
    let autocorrelation = lag1_autocorrelation(&gaps);
    let burstiness = burstiness_coefficient(&gaps);

    let periodicity: Vec<PeriodicityCandidate> = CANDIDATE_PERIODS
        .iter()
        .map(|(name, period)| PeriodicityCandidate {
            period: (*name).to_string(),
            confidence: fold_confidence(&gaps, *period),
        })
        .collect();

    let detected_period = periodicity
        .iter()
        .filter(|c| c.confidence >= PERIODICITY_THRESHOLD)
        .max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|c| c.period.clone());

    let timezone_estimate = estimate_timezone(txs);

    let interpretation = interpret(burstiness, detected_period.as_deref());

    TemporalAnalysis {
        autocorrelation,
        burstiness,
        periodicity,
        detected_period,
        timezone_estimate,
        interpretation,
    }
}

/// Lag-1 autocorrelation coefficient; 0 when variance vanishes.
fn lag1_autocorrelation(gaps: &[f64]) -> f64 {
    if gaps.len() < 3 {
        return 0.0;
    }
    let m = mean(gaps);
    let denom: f64 = gaps.iter().map(|g| (g - m).powi(2)).sum();
    if denom <= 0.0 {
        return 0.0;
    }
    let num: f64 = gaps
        .windows(2)
        .map(|w| (w[0] - m) * (w[1] - m))
        .sum();
    finite_or_zero(num / denom).clamp(-1.0, 1.0)
}

/// Burstiness coefficient `(sigma - mu) / (sigma + mu)`.
fn burstiness_coefficient(gaps: &[f64]) -> f64 {
    let mu = mean(gaps);
    let sigma = std_dev(gaps);
    let denom = sigma + mu;
    if denom <= 0.0 {
        return 0.0;
    }
    finite_or_zero((sigma - mu) / denom).clamp(-1.0, 1.0)
}

/// Fold gaps modulo `period`; low mean distance from the nearest multiple
/// means high periodicity confidence.
fn fold_confidence(gaps: &[f64], period: f64) -> f64 {
    if gaps.is_empty() || period <= 0.0 {
        return 0.0;
    }
    // Gaps much shorter than the period carry no evidence for it.
    let relevant: Vec<f64> = gaps.iter().copied().filter(|g| *g >= period * 0.5).collect();
    if relevant.len() < 2 {
        return 0.0;
    }
    let half = period / 2.0;
    let mean_distance = mean(
        &relevant
            .iter()
            .map(|g| {
                let r = g % period;
                r.min(period - r)
            })
            .collect::<Vec<_>>(),
    );
    clamp01(1.0 - mean_distance / half)
}

fn estimate_timezone(txs: &[TransactionRecord]) -> Option<TimezoneEstimate> {
    let mut hour_counts = [0usize; 24];
    for tx in txs {
        hour_counts[utc_hour(tx.timestamp_seconds) as usize] += 1;
    }
    let (modal_hour, &modal_count) = hour_counts
        .iter()
        .enumerate()
        .max_by_key(|&(_, &c)| c)?;

    let confidence = clamp01(modal_count as f64 / txs.len() as f64);
    if confidence < TIMEZONE_MIN_CONFIDENCE {
        return None;
    }

    // Wrap the offset into [-12, 11].
    let mut offset = modal_hour as i32 - ASSUMED_PEAK_HOUR;
    if offset < -12 {
        offset += 24;
    } else if offset > 11 {
        offset -= 24;
    }

    Some(TimezoneEstimate {
        utc_offset_hours: offset,
        confidence,
    })
}

fn interpret(burstiness: f64, detected: Option<&str>) -> String {
    match detected {
        Some(period) => format!(
            "Strong {period} rhythm detected; scheduled activity is a temporal fingerprint."
        ),
        None if burstiness > 0.5 => {
            "Bursty activity: transactions cluster into short sessions.".to_string()
        }
        None => "No dominant timing pattern detected.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionRecord;

    fn tx(ts: i64) -> TransactionRecord {
        TransactionRecord::new(format!("sig{ts}"), ts, 1.0, "cp", "TRANSFER")
    }

    #[test]
    fn test_below_min_sample_zeroed() {
        let txs: Vec<_> = (0..4).map(|i| tx(1_700_000_000 + i * 100)).collect();
        let result = analyze_temporal(&txs);
        assert_eq!(result.autocorrelation, 0.0);
        assert_eq!(result.burstiness, 0.0);
        assert!(result.timezone_estimate.is_none());
        assert!(result.periodicity.is_empty());
    }

    #[test]
    fn test_perfectly_daily_schedule_detected() {
        let txs: Vec<_> = (0..14).map(|i| tx(1_700_000_000 + i * 86_400)).collect();
        let result = analyze_temporal(&txs);
        assert_eq!(result.detected_period.as_deref(), Some("daily"));
        // Constant gaps: sigma = 0 => burstiness -> -1
        assert!(result.burstiness < -0.9);
        // All at the same UTC hour => confident timezone guess
        let tz = result.timezone_estimate.expect("timezone guess expected");
        assert!(tz.confidence > 0.9);
        assert!((-12..=11).contains(&tz.utc_offset_hours));
    }

    #[test]
    fn test_bursty_sessions_have_positive_burstiness() {
        // 4 bursts of 5 txs 10s apart, bursts separated by ~3 days
        let mut txs = Vec::new();
        for burst in 0..4_i64 {
            for i in 0..5_i64 {
                txs.push(tx(1_700_000_000 + burst * 260_000 + i * 10));
            }
        }
        let result = analyze_temporal(&txs);
        assert!(result.burstiness > 0.3, "burstiness = {}", result.burstiness);
    }

    #[test]
    fn test_identical_timestamps_do_not_panic() {
        let txs: Vec<_> = (0..8).map(|_| tx(1_700_000_000)).collect();
        let result = analyze_temporal(&txs);
        assert_eq!(result.burstiness, 0.0);
        assert_eq!(result.autocorrelation, 0.0);
        assert!(result.detected_period.is_none());
    }

    #[test]
    fn test_metric_ranges() {
        let txs: Vec<_> = (0..50)
            .map(|i| tx(1_700_000_000 + i * i * 137 + i * 3_600))
            .collect();
        let result = analyze_temporal(&txs);
        assert!((-1.0..=1.0).contains(&result.autocorrelation));
        assert!((-1.0..=1.0).contains(&result.burstiness));
        for c in &result.periodicity {
            assert!((0.0..=1.0).contains(&c.confidence), "{}", c.period);
        }
    }
}

//! Shared numeric primitives for the analyzers.
//!
//! Frequency maps use `BTreeMap` so that every derived list (clusters,
//! recommendations) iterates in a deterministic order. Every division in the
//! engine goes through a guard here; no analyzer may surface NaN/Infinity.

use std::collections::BTreeMap;

use chrono::{Datelike, TimeZone, Timelike, Utc};

use crate::domain::TransactionRecord;

/// Number of equal-width bins for amount discretization.
pub const AMOUNT_BINS: usize = 20;

/// Time-of-day buckets (4-hour windows) crossed with weekend/weekday.
pub const TIME_BUCKETS: usize = 12;

/// Replace a non-finite value with zero.
#[inline]
#[must_use]
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

/// Clamp to [0, 1] after a finite guard.
#[inline]
#[must_use]
pub fn clamp01(x: f64) -> f64 {
    finite_or_zero(x).clamp(0.0, 1.0)
}

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    finite_or_zero(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation; 0 for fewer than two values.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    finite_or_zero(var.sqrt())
}

/// Interquartile range (Q3 - Q1) using nearest-rank quartiles; 0 below 4 values.
#[must_use]
pub fn interquartile_range(values: &[f64]) -> f64 {
    if values.len() < 4 {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if sorted.len() < 4 {
        return 0.0;
    }
    let q1 = sorted[sorted.len() / 4];
    let q3 = sorted[(sorted.len() * 3) / 4];
    finite_or_zero(q3 - q1)
}

/// Shannon entropy in bits over raw frequency counts.
#[must_use]
pub fn shannon_entropy(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let mut bits = 0.0;
    for &count in counts {
        if count == 0 {
            continue;
        }
        let p = count as f64 / total;
        bits -= p * p.log2();
    }
    finite_or_zero(bits)
}

/// Shannon entropy normalized by `log2(#occupied values)`.
///
/// Returns `(bits, normalized)`. A distribution with at most one distinct
/// value has zero entropy by definition.
#[must_use]
pub fn normalized_entropy(counts: &[usize]) -> (f64, f64) {
    let occupied = counts.iter().filter(|&&c| c > 0).count();
    let bits = shannon_entropy(counts);
    if occupied <= 1 {
        return (bits, 0.0);
    }
    (bits, clamp01(bits / (occupied as f64).log2()))
}

/// Frequency map over arbitrary string keys (deterministic order).
#[must_use]
pub fn frequency_map<'a, I>(keys: I) -> BTreeMap<&'a str, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut map = BTreeMap::new();
    for key in keys {
        *map.entry(key).or_insert(0) += 1;
    }
    map
}

/// Index of `amount` within [`AMOUNT_BINS`] equal-width bins over [min, max].
///
/// Degenerate range (max == min) puts everything in bin 0.
#[must_use]
pub fn amount_bin_index(amount: f64, min: f64, max: f64) -> usize {
    let span = max - min;
    if !span.is_finite() || span <= 0.0 {
        return 0;
    }
    let idx = ((amount - min) / span * AMOUNT_BINS as f64) as usize;
    idx.min(AMOUNT_BINS - 1)
}

/// Amount bin counts for a transaction list.
#[must_use]
pub fn amount_bin_counts(txs: &[TransactionRecord]) -> Vec<usize> {
    let mut counts = vec![0usize; AMOUNT_BINS];
    if txs.is_empty() {
        return counts;
    }
    let (min, max) = amount_range(txs);
    for tx in txs {
        counts[amount_bin_index(tx.amount, min, max)] += 1;
    }
    counts
}

/// (min, max) over transaction amounts, ignoring non-finite values.
#[must_use]
pub fn amount_range(txs: &[TransactionRecord]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for tx in txs {
        if tx.amount.is_finite() {
            min = min.min(tx.amount);
            max = max.max(tx.amount);
        }
    }
    if min > max {
        (0.0, 0.0)
    } else {
        (min, max)
    }
}

/// Hour of day (UTC) for a unix timestamp; 0 for out-of-range timestamps.
#[must_use]
pub fn utc_hour(timestamp_seconds: i64) -> u32 {
    match Utc.timestamp_opt(timestamp_seconds, 0) {
        chrono::LocalResult::Single(dt) => dt.hour(),
        _ => 0,
    }
}

/// Time bucket index in [0, 12): 4-hour window crossed with weekend flag.
#[must_use]
pub fn time_bucket_index(timestamp_seconds: i64) -> usize {
    let (hour, weekend) = match Utc.timestamp_opt(timestamp_seconds, 0) {
        chrono::LocalResult::Single(dt) => {
            let weekday = dt.weekday();
            (
                dt.hour() as usize,
                matches!(weekday, chrono::Weekday::Sat | chrono::Weekday::Sun),
            )
        }
        _ => (0, false),
    };
    let window = hour / 4; // 0..6
    if weekend { 6 + window } else { window }
}

/// Time bucket counts for a transaction list.
#[must_use]
pub fn time_bucket_counts(txs: &[TransactionRecord]) -> Vec<usize> {
    let mut counts = vec![0usize; TIME_BUCKETS];
    for tx in txs {
        counts[time_bucket_index(tx.timestamp_seconds)] += 1;
    }
    counts
}

/// Sorted inter-arrival gaps in seconds (non-negative, len = n - 1).
#[must_use]
pub fn inter_arrival_gaps(txs: &[TransactionRecord]) -> Vec<f64> {
    if txs.len() < 2 {
        return Vec::new();
    }
    let mut times: Vec<i64> = txs.iter().map(|t| t.timestamp_seconds).collect();
    times.sort_unstable();
    times
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64)
        .collect()
}

/// Stable amount key for exact-repeat grouping (9 decimal places = lamport
/// precision, so floating noise below a lamport collapses to the same key).
#[must_use]
pub fn amount_key(amount: f64) -> String {
    format!("{:.9}", finite_or_zero(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(ts: i64, amount: f64) -> TransactionRecord {
        TransactionRecord::new(format!("sig{ts}"), ts, amount, "cp", "TRANSFER")
    }

    #[test]
    fn test_shannon_entropy_uniform_vs_constant() {
        // Constant: one occupied value => 0 bits
        assert_eq!(shannon_entropy(&[10, 0, 0]), 0.0);
        // Uniform over 4 values => exactly 2 bits
        let bits = shannon_entropy(&[5, 5, 5, 5]);
        assert!((bits - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_entropy_bounds() {
        let (_, norm) = normalized_entropy(&[5, 5, 5, 5]);
        assert!((norm - 1.0).abs() < 1e-12);

        let (_, norm) = normalized_entropy(&[20]);
        assert_eq!(norm, 0.0);

        let (_, norm) = normalized_entropy(&[]);
        assert_eq!(norm, 0.0);
    }

    #[test]
    fn test_amount_bin_index_degenerate_range() {
        assert_eq!(amount_bin_index(5.0, 5.0, 5.0), 0);
        assert_eq!(amount_bin_index(10.0, 0.0, 10.0), AMOUNT_BINS - 1);
        assert_eq!(amount_bin_index(0.0, 0.0, 10.0), 0);
    }

    #[test]
    fn test_time_bucket_weekday_vs_weekend() {
        // 2023-11-13 was a Monday; 00:00 UTC => window 0, weekday
        let monday_midnight = 1_699_833_600;
        assert_eq!(time_bucket_index(monday_midnight), 0);
        // Saturday 2023-11-18 10:00 UTC => window 2, weekend => 8
        let saturday_morning = 1_700_301_600;
        assert_eq!(time_bucket_index(saturday_morning), 8);
    }

    #[test]
    fn test_inter_arrival_gaps_sorted_input_not_required() {
        let txs = vec![tx(300, 1.0), tx(100, 1.0), tx(200, 1.0)];
        assert_eq!(inter_arrival_gaps(&txs), vec![100.0, 100.0]);
        assert!(inter_arrival_gaps(&txs[..1]).is_empty());
    }

    #[test]
    fn test_iqr_and_std_guards() {
        assert_eq!(interquartile_range(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(std_dev(&[1.0]), 0.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_finite_guards() {
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(clamp01(1.5), 1.0);
        assert_eq!(clamp01(-0.5), 0.0);
    }
}

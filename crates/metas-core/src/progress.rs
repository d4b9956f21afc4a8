//! # Progress Engine
//!
//! Pure, deterministic derivation of progress figures from stored KR data.
//!
//! - Current value: sum of checkpoint values
//! - Percentage: current value against the target, rounded at the leaf
//! - Classification: on-track / bonus against named policy thresholds
//! - Weighted rollup: weight-aggregated percentage across a set of KRs
//! - Monthly buckets: calendar-month totals with a running cumulative
//!
//! ## Failure Semantics
//!
//! No operation here returns an error or panics for missing or malformed
//! data; everything degrades to `0` or an empty sequence. A single bad
//! row (non-finite value, absent date) is skipped, never allowed to abort
//! aggregation of the rest.
//!
//! ## Rounding Point
//!
//! Rounding happens exactly once, at the leaf: [`percentage`] returns a
//! whole number, and [`weighted_rollup`] consumes those rounded leaf
//! values. The rollup therefore always agrees with the per-KR figures a
//! reader sees next to it.

use crate::constants::{BONUS_THRESHOLD, ON_TRACK_THRESHOLD};
use crate::{Checkpoint, KeyResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Threshold evaluation of a completion percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Classification {
    /// Percentage is at or above the on-track threshold.
    pub on_track: bool,
    /// Percentage strictly exceeds the bonus threshold (over-achievement).
    pub bonus: bool,
}

/// Classify a percentage against the default policy thresholds
/// ([`ON_TRACK_THRESHOLD`], [`BONUS_THRESHOLD`]).
#[must_use]
pub fn classify(percentage: f64) -> Classification {
    classify_with(percentage, ON_TRACK_THRESHOLD, BONUS_THRESHOLD)
}

/// Classify a percentage against explicit thresholds.
///
/// On-track is inclusive (`>=`), bonus is strict (`>`): a KR sitting
/// exactly at 100% is complete but not over-achieving.
#[must_use]
pub fn classify_with(percentage: f64, on_track_threshold: f64, bonus_threshold: f64) -> Classification {
    Classification {
        on_track: percentage >= on_track_threshold,
        bonus: percentage > bonus_threshold,
    }
}

// =============================================================================
// LEAF AGGREGATION
// =============================================================================

/// Sum of all checkpoint values for a KR.
///
/// Non-finite values are skipped so one bad row cannot poison the total.
/// Recomputed on every read; never cached.
#[must_use]
pub fn current_value(kr: &KeyResult) -> f64 {
    kr.checkpoints
        .iter()
        .map(|cp| cp.value)
        .filter(|v| v.is_finite())
        .sum()
}

/// Completion percentage, rounded to the nearest whole number.
///
/// Defined as `0` when the target is zero (or negative, or non-finite);
/// never NaN or infinite. Values above 100 are valid over-achievement and
/// are NOT clamped here — only a progress bar's visual width clamps, and
/// that is presentation, not math.
#[must_use]
pub fn percentage(kr: &KeyResult) -> f64 {
    if !(kr.target_value.is_finite() && kr.target_value > 0.0) {
        return 0.0;
    }
    let raw = current_value(kr) / kr.target_value * 100.0;
    if raw.is_finite() { raw.round() } else { 0.0 }
}

// =============================================================================
// WEIGHTED ROLLUP
// =============================================================================

/// Weight-aggregated percentage across a set of KRs:
/// `sum(percentage_i * weight_i) / sum(weight_i)`.
///
/// - Defined as `0` for an empty input or a zero weight sum
/// - Invariant under reordering of the input
/// - Consumes each KR's own un-clamped, leaf-rounded percentage, so a
///   single over-performing KR pulls the rollup above what a clamped
///   average would show
/// - KRs with a non-finite or negative weight are skipped (weights are
///   validated non-negative at the API boundary; stored garbage degrades
///   instead of propagating)
#[must_use]
pub fn weighted_rollup(krs: &[KeyResult]) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for kr in krs {
        if !(kr.weight.is_finite() && kr.weight >= 0.0) {
            continue;
        }
        weighted_sum += percentage(kr) * kr.weight;
        weight_sum += kr.weight;
    }
    if weight_sum > 0.0 {
        weighted_sum / weight_sum
    } else {
        0.0
    }
}

// =============================================================================
// MONTHLY BUCKETS
// =============================================================================

/// A calendar year-month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    /// The year-month a date falls in.
    #[must_use]
    pub fn from_date(date: chrono::NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for MonthKey {
    type Err = crate::MetasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            || crate::MetasError::InvalidArgument(format!("Invalid month key '{s}' (expected YYYY-MM)"));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

impl Serialize for MonthKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One month of checkpoint activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// The calendar year-month this bucket covers.
    pub month: MonthKey,
    /// Sum of checkpoint values dated within the month.
    pub monthly_total: f64,
    /// Running total across all buckets up to and including this one.
    pub cumulative_total: f64,
}

/// Group checkpoints by the calendar year-month of their own date and
/// produce chronologically ordered buckets with a running cumulative.
///
/// - Grouping uses each checkpoint's `date`, never insertion order
/// - Months with no checkpoints are omitted, not zero-filled; a consumer
///   needing a continuous time axis must zero-fill explicitly
/// - Undated checkpoints and non-finite values are skipped
#[must_use]
pub fn monthly_buckets(checkpoints: &[Checkpoint]) -> Vec<MonthlyBucket> {
    let mut totals: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for cp in checkpoints {
        let Some(date) = cp.date else { continue };
        if !cp.value.is_finite() {
            continue;
        }
        *totals.entry(MonthKey::from_date(date)).or_insert(0.0) += cp.value;
    }

    let mut cumulative = 0.0;
    totals
        .into_iter()
        .map(|(month, monthly_total)| {
            cumulative += monthly_total;
            MonthlyBucket {
                month,
                monthly_total,
                cumulative_total: cumulative,
            }
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

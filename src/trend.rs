// Trend estimator.
//
// A closed-form least-squares line through the five (day index, daily
// charge) points, plus the per-student predicted charge.
use crate::types::{DailyTotal, StudentChargeRecord, WeeklyTrendPoint};
use crate::util::round2;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Number of points the line was fitted through.
    pub n: usize,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least squares over `(day_index, actual_charge)`.
///
/// A zero denominator (all x equal, or no points) gives a flat line.
pub fn fit_ols(totals: &[DailyTotal]) -> LinearFit {
    let n = totals.len();
    if n == 0 {
        return LinearFit { slope: 0.0, intercept: 0.0, n };
    }
    let nf = n as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for t in totals {
        let x = t.day_index as f64;
        let y = t.actual_charge;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }
    let denom = nf * sum_xx - sum_x * sum_x;
    let slope = if denom == 0.0 {
        0.0
    } else {
        (nf * sum_xy - sum_x * sum_y) / denom
    };
    let intercept = (sum_y - slope * sum_x) / nf;
    LinearFit { slope, intercept, n }
}

/// Daily totals with the fitted value for each day attached.
pub fn weekly_trend(totals: &[DailyTotal], fit: &LinearFit) -> Vec<WeeklyTrendPoint> {
    totals
        .iter()
        .map(|t| WeeklyTrendPoint {
            day: t.day,
            day_index: t.day_index,
            actual_charge: t.actual_charge,
            predicted_charge: round2(fit.at(t.day_index as f64)),
        })
        .collect()
}

/// How a student's predicted charge is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictionPolicy {
    /// Average charge per booking across everyone, times the student's
    /// bookings.
    #[default]
    Ratio,
    /// Superseded: spreads the weekly line across the five days and scales
    /// by bookings. Kept for comparing against older reports.
    RegressionScaling,
}

impl fmt::Display for PredictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionPolicy::Ratio => f.write_str("ratio"),
            PredictionPolicy::RegressionScaling => f.write_str("regression"),
        }
    }
}

impl FromStr for PredictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ratio" => Ok(PredictionPolicy::Ratio),
            "regression" | "regression-scaling" => Ok(PredictionPolicy::RegressionScaling),
            other => Err(format!(
                "unknown prediction policy '{other}', expected 'ratio' or 'regression'"
            )),
        }
    }
}

/// Total charge divided by total bookings. Students with no bookings still
/// count as one booking in the divisor.
pub fn avg_charge_per_booking(students: &[StudentChargeRecord]) -> f64 {
    let total_charges: f64 = students.iter().map(|s| s.total_charge).sum();
    let total_bookings: u64 = students
        .iter()
        .map(|s| u64::from(s.booking_count.max(1)))
        .sum();
    if total_bookings == 0 {
        0.0
    } else {
        total_charges / total_bookings as f64
    }
}

/// Attach a predicted charge to every student record.
pub fn predict_students(
    students: &mut [StudentChargeRecord],
    fit: &LinearFit,
    policy: PredictionPolicy,
) {
    match policy {
        PredictionPolicy::Ratio => {
            let avg = avg_charge_per_booking(students);
            for s in students.iter_mut() {
                s.predicted = Some(round2(avg * f64::from(s.booking_count)));
            }
        }
        PredictionPolicy::RegressionScaling => {
            let n = fit.n.max(1) as f64;
            for s in students.iter_mut() {
                let bookings = f64::from(s.booking_count);
                s.predicted = Some(round2((fit.slope / n) * bookings + fit.intercept / n));
            }
        }
    }
}

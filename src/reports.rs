use crate::extract::extract;
use crate::reader::{SheetMatching, Workbook};
use crate::trend::{avg_charge_per_booking, fit_ols, predict_students, weekly_trend, PredictionPolicy};
use crate::types::{
    BusUsageRecord, ChargeBucket, StudentChargeRecord, SummaryStats, WeeklyTrendPoint,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Right-closed histogram edges for per-record charges.
const CHARGE_BIN_EDGES: [f64; 8] = [0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 50.0, 100.0];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub policy: PredictionPolicy,
    pub matching: SheetMatching,
}

/// Everything derived from one upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub students: Vec<StudentChargeRecord>,
    pub weekly_trend: Vec<WeeklyTrendPoint>,
    pub bus_usage: Vec<BusUsageRecord>,
    pub charge_distribution: Vec<ChargeBucket>,
    pub summary: SummaryStats,
}

/// Extract, fit and summarize a workbook. Pure: no I/O, no shared state.
pub fn analyze(workbook: Workbook, options: AnalysisOptions) -> Insights {
    debug!(sheets = ?workbook.sheet_names(), policy = %options.policy, "analyzing workbook");
    let days = workbook.into_day_sheets(options.matching);
    debug!(days = ?days.present().collect::<Vec<_>>(), "day-sheets found");
    let mut extraction = extract(&days);

    let fit = fit_ols(&extraction.daily_totals);
    let weekly_trend = weekly_trend(&extraction.daily_totals, &fit);
    predict_students(&mut extraction.students, &fit, options.policy);

    let charge_distribution = charge_distribution(&extraction.students);
    let summary = generate_summary(&extraction.students, options.policy);

    Insights {
        students: extraction.students,
        weekly_trend,
        bus_usage: extraction.bus_usage,
        charge_distribution,
        summary,
    }
}

/// Count records per charge band; charges outside every band are skipped.
pub fn charge_distribution(students: &[StudentChargeRecord]) -> Vec<ChargeBucket> {
    CHARGE_BIN_EDGES
        .windows(2)
        .map(|edge| {
            let (lo, hi) = (edge[0], edge[1]);
            let count = students
                .iter()
                .filter(|s| s.total_charge > lo && s.total_charge <= hi)
                .count();
            ChargeBucket {
                range: format!("({}, {}]", lo, hi),
                count,
            }
        })
        .collect()
}

pub fn generate_summary(students: &[StudentChargeRecord], policy: PredictionPolicy) -> SummaryStats {
    let distinct: HashSet<&str> = students.iter().map(|s| s.name.trim()).collect();
    SummaryStats {
        total_records: students.len(),
        distinct_students: distinct.len(),
        total_charges: students.iter().map(|s| s.total_charge).sum(),
        total_bookings: students.iter().map(|s| u64::from(s.booking_count)).sum(),
        avg_charge_per_booking: avg_charge_per_booking(students),
        prediction_policy: policy.to_string(),
    }
}

/// Highest total charge first; ties keep upload order.
pub fn top_spenders(students: &[StudentChargeRecord], limit: usize) -> Vec<StudentChargeRecord> {
    let mut sorted: Vec<&StudentChargeRecord> = students.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_charge
            .partial_cmp(&a.total_charge)
            .unwrap_or(Ordering::Equal)
    });
    sorted.into_iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::fixtures::{xlsx, HEADERS};
    use crate::reader::read_workbook;
    use crate::schema::Weekday;

    fn record(name: &str, total_charge: f64, booking_count: u32) -> StudentChargeRecord {
        StudentChargeRecord {
            name: name.to_string(),
            day: Weekday::Mon,
            classification: "Standard".to_string(),
            total_charge,
            booking_count,
            notes: String::new(),
            predicted: None,
        }
    }

    #[test]
    fn distribution_has_seven_right_closed_buckets() {
        let students = vec![
            record("a", 0.0, 1),
            record("b", 5.0, 1),
            record("c", 5.01, 1),
            record("d", 49.0, 1),
            record("e", 100.0, 1),
            record("f", 250.0, 1),
        ];
        let buckets = charge_distribution(&students);
        let ranges: Vec<&str> = buckets.iter().map(|b| b.range.as_str()).collect();
        assert_eq!(
            ranges,
            vec!["(0, 5]", "(5, 10]", "(10, 15]", "(15, 20]", "(20, 25]", "(25, 50]", "(50, 100]"]
        );
        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn summary_counts_distinct_names() {
        let students = vec![
            record("Ada Lovelace", 10.0, 2),
            record("Ada Lovelace", 10.0, 0),
            record("Alan Turing", 10.0, 1),
        ];
        let summary = generate_summary(&students, PredictionPolicy::Ratio);
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.distinct_students, 2);
        assert_eq!(summary.total_charges, 30.0);
        assert_eq!(summary.total_bookings, 3);
        assert_eq!(summary.avg_charge_per_booking, 7.5);
        assert_eq!(summary.prediction_policy, "ratio");
    }

    #[test]
    fn top_spenders_sorts_and_limits() {
        let students = vec![
            record("low", 1.0, 1),
            record("high", 9.0, 1),
            record("mid-a", 5.0, 1),
            record("mid-b", 5.0, 1),
        ];
        let names: Vec<String> = top_spenders(&students, 3).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["high", "mid-a", "mid-b"]);
    }

    #[test]
    fn monday_only_workbook_fills_the_week() {
        let payload = xlsx(&[(
            "Mon",
            HEADERS,
            &[
                &["Ada", "Lovelace", "£12.50", "", "", "1", "1", "", ""],
                &["Alan", "Turing", "7.50", "Ad hoc", "", "1", "", "", "1"],
            ],
        )]);
        let book = read_workbook(&payload, Some("week.xlsx")).unwrap();
        let insights = analyze(book, AnalysisOptions::default());

        assert_eq!(insights.weekly_trend.len(), 5);
        assert_eq!(insights.weekly_trend[0].actual_charge, 20.0);
        let zero_days = insights
            .weekly_trend
            .iter()
            .filter(|p| p.actual_charge == 0.0)
            .count();
        assert_eq!(zero_days, 4);

        assert_eq!(insights.bus_usage.len(), 20);
        let mon_usage: Vec<u32> = insights.bus_usage[..4].iter().map(|b| b.usage_count).collect();
        assert_eq!(mon_usage, vec![2, 1, 0, 1]);
        let zero_usage = insights.bus_usage.iter().filter(|b| b.usage_count == 0).count();
        assert_eq!(zero_usage, 17);

        // 20.00 over 4 bookings
        let predicted: Vec<Option<f64>> = insights.students.iter().map(|s| s.predicted).collect();
        assert_eq!(predicted, vec![Some(10.0), Some(10.0)]);
        assert_eq!(insights.summary.total_bookings, 4);
    }

    #[test]
    fn csv_upload_has_no_day_sheets() {
        let book = read_workbook(b"Forename,Charge\nAda,5\n", Some("week.csv")).unwrap();
        let insights = analyze(book, AnalysisOptions::default());
        assert!(insights.students.is_empty());
        assert_eq!(insights.weekly_trend.len(), 5);
        assert_eq!(insights.bus_usage.len(), 20);
    }

    #[test]
    fn lenient_matching_reads_long_day_names() {
        let payload = xlsx(&[("Friday", HEADERS, &[&["Ada", "Lovelace", "3", "", "", "1", "", "", ""]])]);
        let strict = analyze(
            read_workbook(&payload, Some("week.xlsx")).unwrap(),
            AnalysisOptions::default(),
        );
        assert!(strict.students.is_empty());

        let lenient = analyze(
            read_workbook(&payload, Some("week.xlsx")).unwrap(),
            AnalysisOptions {
                matching: SheetMatching::Lenient,
                ..AnalysisOptions::default()
            },
        );
        assert_eq!(lenient.students.len(), 1);
        assert_eq!(lenient.weekly_trend[4].actual_charge, 3.0);
    }
}

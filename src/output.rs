use crate::reports::{top_spenders, Insights};
use crate::types::{BucketRow, StudentRow, SummaryStats, TrendRow, UsageRow, WeeklyTrendPoint};
use crate::util::{format_int, format_number};
use chrono::Local;
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    generated_at: String,
    summary: &'a SummaryStats,
    weekly_trend: &'a [WeeklyTrendPoint],
}

/// Write every collection of `insights` into `dir`, returning the paths
/// written in order.
pub fn export_all(dir: &Path, insights: &Insights) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    std::fs::create_dir_all(dir)?;
    let students = dir.join("students.csv");
    let trend = dir.join("weekly_trend.csv");
    let usage = dir.join("bus_usage.csv");
    let buckets = dir.join("charge_distribution.csv");
    let summary = dir.join("summary.json");

    write_csv(&students, &insights.students)?;
    write_csv(&trend, &insights.weekly_trend)?;
    write_csv(&usage, &insights.bus_usage)?;
    write_csv(&buckets, &insights.charge_distribution)?;
    write_json(
        &summary,
        &SummaryFile {
            generated_at: Local::now().to_rfc3339(),
            summary: &insights.summary,
            weekly_trend: &insights.weekly_trend,
        },
    )?;
    Ok(vec![students, trend, usage, buckets, summary])
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Console rendering of one upload's results.
pub fn print_insights(insights: &Insights, top: usize) {
    let s = &insights.summary;
    println!(
        "{} booking rows for {} students, total charges £{}, {} bookings (£{} per booking).\n",
        format_int(s.total_records),
        format_int(s.distinct_students),
        format_number(s.total_charges, 2),
        format_int(s.total_bookings),
        format_number(s.avg_charge_per_booking, 2)
    );

    println!("Top {} Student Spenders", top);
    println!("(Predicted charge uses the {} policy)\n", s.prediction_policy);
    let rows: Vec<StudentRow> = top_spenders(&insights.students, top)
        .iter()
        .map(StudentRow::from)
        .collect();
    preview_table_rows(&rows, top);

    println!("Weekly Charges");
    println!("(Actual vs. least-squares trend)\n");
    let rows: Vec<TrendRow> = insights.weekly_trend.iter().map(TrendRow::from).collect();
    preview_table_rows(&rows, rows.len());

    println!("Bus Usage\n");
    let rows: Vec<UsageRow> = insights.bus_usage.iter().map(UsageRow::from).collect();
    preview_table_rows(&rows, rows.len());

    println!("Charge Distribution\n");
    let rows: Vec<BucketRow> = insights
        .charge_distribution
        .iter()
        .map(BucketRow::from)
        .collect();
    preview_table_rows(&rows, rows.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::fixtures::{xlsx, HEADERS};
    use crate::reader::read_workbook;
    use crate::reports::{analyze, AnalysisOptions};
    use tempfile::TempDir;

    #[test]
    fn exports_every_collection() {
        let payload = xlsx(&[(
            "Thu",
            HEADERS,
            &[&["Ada", "Lovelace", "£6.00", "", "", "", "2", "", ""]],
        )]);
        let insights = analyze(
            read_workbook(&payload, Some("week.xlsx")).unwrap(),
            AnalysisOptions::default(),
        );
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("reports");
        let written = export_all(&dir, &insights).unwrap();
        assert_eq!(written.len(), 5);
        assert!(written.iter().all(|p| p.exists()));

        let usage = std::fs::read_to_string(dir.join("bus_usage.csv")).unwrap();
        let mut lines = usage.lines();
        assert_eq!(lines.next(), Some("serviceLabel,usageCount"));
        assert_eq!(usage.lines().count(), 21);
        assert!(usage.contains("Thu Explorers 1,2"));

        let students = std::fs::read_to_string(dir.join("students.csv")).unwrap();
        assert!(students.starts_with("name,day,classification,totalCharge,bookingCount,notes,predicted"));
        assert!(students.contains("Ada Lovelace,Thu,Standard,6"));

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("summary.json")).unwrap())
                .unwrap();
        assert_eq!(summary["summary"]["total_records"], 1);
        assert_eq!(summary["weekly_trend"].as_array().map(|a| a.len()), Some(5));
    }
}

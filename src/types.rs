use crate::schema::Weekday;
use crate::util::format_number;
use serde::Serialize;
use tabled::Tabled;

/// One raw spreadsheet cell, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The cell as the text a user would see in the sheet.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        }
    }
}

/// Header -> cell mapping for one data row of a sheet, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first value seen for a header.
    pub fn insert(&mut self, header: impl Into<String>, value: CellValue) {
        let header = header.into();
        if self.get(&header).is_none() {
            self.cells.push((header, value));
        }
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(h, _)| h == header).map(|(_, v)| v)
    }

    /// Cell text, or an empty string when the column is missing.
    pub fn text(&self, header: &str) -> String {
        self.get(header).map(CellValue::as_text).unwrap_or_default()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_blank())
    }
}

impl IntoIterator for RawRow {
    type Item = (String, CellValue);
    type IntoIter = std::vec::IntoIter<(String, CellValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentChargeRecord {
    pub name: String,
    pub day: Weekday,
    pub classification: String,
    pub total_charge: f64,
    pub booking_count: u32,
    pub notes: String,
    /// Attached by the trend estimator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub day: Weekday,
    pub day_index: usize,
    pub actual_charge: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusUsageRecord {
    pub service_label: String,
    pub usage_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrendPoint {
    pub day: Weekday,
    pub day_index: usize,
    pub actual_charge: f64,
    pub predicted_charge: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeBucket {
    pub range: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_records: usize,
    pub distinct_students: usize,
    pub total_charges: f64,
    pub total_bookings: u64,
    pub avg_charge_per_booking: f64,
    pub prediction_policy: String,
}

// Console rows. Money is pre-formatted the same way everywhere.

#[derive(Debug, Clone, Tabled)]
pub struct StudentRow {
    #[tabled(rename = "Student")]
    pub name: String,
    #[tabled(rename = "Day")]
    pub day: String,
    #[tabled(rename = "Classification")]
    pub classification: String,
    #[tabled(rename = "Predicted")]
    pub predicted: String,
    #[tabled(rename = "Total Charge")]
    pub total_charge: String,
    #[tabled(rename = "Booking Count")]
    pub booking_count: u32,
}

impl From<&StudentChargeRecord> for StudentRow {
    fn from(r: &StudentChargeRecord) -> Self {
        StudentRow {
            name: r.name.clone(),
            day: r.day.to_string(),
            classification: r.classification.clone(),
            predicted: r
                .predicted
                .map(|p| format!("£{}", format_number(p, 2)))
                .unwrap_or_else(|| "N/A".to_string()),
            total_charge: format!("£{}", format_number(r.total_charge, 2)),
            booking_count: r.booking_count,
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct TrendRow {
    #[tabled(rename = "Day")]
    pub day: String,
    #[tabled(rename = "Actual Charge")]
    pub actual: String,
    #[tabled(rename = "Predicted Charge")]
    pub predicted: String,
}

impl From<&WeeklyTrendPoint> for TrendRow {
    fn from(p: &WeeklyTrendPoint) -> Self {
        TrendRow {
            day: p.day.to_string(),
            actual: format!("£{}", format_number(p.actual_charge, 2)),
            predicted: format!("£{}", format_number(p.predicted_charge, 2)),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct UsageRow {
    #[tabled(rename = "Bus Service")]
    pub service: String,
    #[tabled(rename = "Bookings")]
    pub usage: u32,
}

impl From<&BusUsageRecord> for UsageRow {
    fn from(b: &BusUsageRecord) -> Self {
        UsageRow {
            service: b.service_label.clone(),
            usage: b.usage_count,
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct BucketRow {
    #[tabled(rename = "Charge Range")]
    pub range: String,
    #[tabled(rename = "Records")]
    pub count: usize,
}

impl From<&ChargeBucket> for BucketRow {
    fn from(b: &ChargeBucket) -> Self {
        BucketRow {
            range: b.range.clone(),
            count: b.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_row_keeps_first_duplicate_header() {
        let row: RawRow = vec![
            ("Charge", CellValue::Text("5".to_string())),
            ("Charge", CellValue::Text("9".to_string())),
        ]
        .into_iter()
        .collect();
        assert_eq!(row.text("Charge"), "5");
        assert_eq!(row.text("Notes"), "");
    }

    #[test]
    fn blank_rows_are_detected() {
        let row: RawRow = vec![
            ("Forename", CellValue::Text("  ".to_string())),
            ("Charge", CellValue::Empty),
        ]
        .into_iter()
        .collect();
        assert!(row.is_blank());

        let row: RawRow = vec![("AM", CellValue::Number(0.0))].into_iter().collect();
        assert!(!row.is_blank());
    }

    #[test]
    fn student_row_shows_missing_prediction_as_na() {
        let record = StudentChargeRecord {
            name: "Ada Lovelace".to_string(),
            day: Weekday::Wed,
            classification: "Standard".to_string(),
            total_charge: 1234.5,
            booking_count: 2,
            notes: String::new(),
            predicted: None,
        };
        let row = StudentRow::from(&record);
        assert_eq!(row.predicted, "N/A");
        assert_eq!(row.total_charge, "£1,234.50");
        assert_eq!(row.day, "Wed");
    }
}

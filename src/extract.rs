// Record extractor: day-sheet rows -> student charges, daily totals and
// bus usage.
use crate::reader::DaySheets;
use crate::schema::{
    grid_position, service_grid, service_label, Session, Weekday, COL_BOOKING_TYPE, COL_CHARGE,
    COL_FORENAME, COL_NOTES, COL_SURNAME, DEFAULT_CLASSIFICATION,
};
use crate::types::{BusUsageRecord, DailyTotal, RawRow, StudentChargeRecord};
use crate::util::{parse_charge, to_count, to_number_or_zero};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub students: Vec<StudentChargeRecord>,
    /// Always five entries, Mon..Fri.
    pub daily_totals: Vec<DailyTotal>,
    /// Always twenty entries in `service_grid` order.
    pub bus_usage: Vec<BusUsageRecord>,
}

pub fn extract(days: &DaySheets) -> Extraction {
    let mut students = Vec::new();
    let mut usage = vec![0.0f64; Weekday::ALL.len() * Session::ALL.len()];
    let mut daily_totals = Vec::with_capacity(Weekday::ALL.len());

    for day in Weekday::ALL {
        let rows = days.get(day).unwrap_or_default();
        let mut actual_charge = 0.0;
        for row in rows {
            let record = student_record(day, row);
            actual_charge += record.total_charge;
            students.push(record);

            for session in Session::ALL {
                let cell = row.get(session.column());
                usage[grid_position(day, session)] += to_number_or_zero(cell);
            }
        }
        debug!(day = %day, rows = rows.len(), actual_charge, "extracted day");
        daily_totals.push(DailyTotal {
            day,
            day_index: day.index(),
            actual_charge,
        });
    }

    let bus_usage = service_grid()
        .zip(usage)
        .map(|((day, session), total)| BusUsageRecord {
            service_label: service_label(day, session),
            usage_count: to_count(total),
        })
        .collect();

    Extraction {
        students,
        daily_totals,
        bus_usage,
    }
}

fn student_record(day: Weekday, row: &RawRow) -> StudentChargeRecord {
    let name = format!(
        "{} {}",
        row.text(COL_FORENAME).trim(),
        row.text(COL_SURNAME).trim()
    );
    let bookings: f64 = Session::ALL
        .iter()
        .map(|s| to_number_or_zero(row.get(s.column())))
        .sum();
    // Kept as written; only a blank cell falls back to the default.
    let classification = row.text(COL_BOOKING_TYPE);
    let classification = if classification.trim().is_empty() {
        DEFAULT_CLASSIFICATION.to_string()
    } else {
        classification
    };

    StudentChargeRecord {
        name,
        day,
        classification,
        total_charge: parse_charge(row.get(COL_CHARGE)),
        booking_count: to_count(bookings),
        notes: row.text(COL_NOTES),
        predicted: None,
    }
}

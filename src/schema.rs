// The fixed booking-sheet layout.
//
// Day names, session names and column headers are a small closed
// enumeration. Extraction, export and the console views all read them from
// here so the aggregation keys and the display labels can never drift apart.
use serde::Serialize;
use std::fmt;

pub const COL_FORENAME: &str = "Forename";
pub const COL_SURNAME: &str = "Surname";
pub const COL_CHARGE: &str = "Charge";
pub const COL_BOOKING_TYPE: &str = "Booking Type";
pub const COL_NOTES: &str = "Notes";

/// Classification used when a row leaves "Booking Type" blank.
pub const DEFAULT_CLASSIFICATION: &str = "Standard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];

    /// Sheet name and display label.
    pub fn label(self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
        }
    }

    /// Position in the week, used as the x value of the trend fit.
    pub fn index(self) -> usize {
        match self {
            Weekday::Mon => 0,
            Weekday::Tue => 1,
            Weekday::Wed => 2,
            Weekday::Thu => 3,
            Weekday::Fri => 4,
        }
    }

    /// Sheet names accepted under lenient matching, in preference order.
    /// The first entry is always the exact name.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Weekday::Mon => &["Mon", "Monday"],
            Weekday::Tue => &["Tue", "Tues", "Tuesday"],
            Weekday::Wed => &["Wed", "Wednesday"],
            Weekday::Thu => &["Thu", "Thurs", "Thursday"],
            Weekday::Fri => &["Fri", "Friday"],
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Session {
    Am,
    Explorers1,
    Explorers2,
    Explorers3,
}

impl Session {
    pub const ALL: [Session; 4] = [
        Session::Am,
        Session::Explorers1,
        Session::Explorers2,
        Session::Explorers3,
    ];

    /// Column header of the session, also its display name.
    pub fn column(self) -> &'static str {
        match self {
            Session::Am => "AM",
            Session::Explorers1 => "Explorers 1",
            Session::Explorers2 => "Explorers 2",
            Session::Explorers3 => "Explorers 3",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// `"<Day> <Session>"`, the key of one bus-usage bucket.
pub fn service_label(day: Weekday, session: Session) -> String {
    format!("{} {}", day.label(), session.column())
}

/// Every (day, session) pair, Mon..Fri outer and AM..Explorers 3 inner.
pub fn service_grid() -> impl Iterator<Item = (Weekday, Session)> {
    Weekday::ALL
        .into_iter()
        .flat_map(|day| Session::ALL.into_iter().map(move |session| (day, session)))
}

/// Position of a (day, session) pair inside `service_grid`.
pub fn grid_position(day: Weekday, session: Session) -> usize {
    let session_pos = Session::ALL
        .iter()
        .position(|s| *s == session)
        .unwrap_or_default();
    day.index() * Session::ALL.len() + session_pos
}

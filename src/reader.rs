// Workbook reader: uploaded bytes -> named sheets of header-keyed rows.
//
// Spreadsheet containers go through calamine, delimited text through the csv
// crate. The reader never filters or coerces data rows beyond dropping rows
// that are blank in every cell; defaults are the extractor's job.
use crate::error::ParseError;
use crate::schema::Weekday;
use crate::types::{CellValue, RawRow};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Sheet name given to a CSV upload, matching what spreadsheet tools call
/// the single sheet of a delimited file.
pub const CSV_SHEET_NAME: &str = "Sheet1";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// xlsx, xlsm, xlsb, xls or ods.
    Spreadsheet,
    Csv,
}

impl SourceFormat {
    /// Pick the format from the file extension when there is a name, or
    /// from the payload's leading bytes when there is not.
    pub fn detect(file_name: Option<&str>, payload: &[u8]) -> Result<Self, ParseError> {
        if let Some(name) = file_name {
            if let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) {
                return match ext.to_ascii_lowercase().as_str() {
                    "csv" => Ok(SourceFormat::Csv),
                    "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Spreadsheet),
                    other => Err(ParseError::UnsupportedExtension(other.to_string())),
                };
            }
        }
        Self::sniff(payload)
    }

    fn sniff(payload: &[u8]) -> Result<Self, ParseError> {
        if payload.starts_with(ZIP_MAGIC) || payload.starts_with(OLE_MAGIC) {
            return Ok(SourceFormat::Spreadsheet);
        }
        if !payload.is_empty() && !payload.contains(&0) && std::str::from_utf8(payload).is_ok() {
            return Ok(SourceFormat::Csv);
        }
        Err(ParseError::UnrecognizedFormat)
    }
}

/// How day-sheets are found by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetMatching {
    /// Sheet names must be exactly `Mon`..`Fri`; headers match as written.
    #[default]
    Exact,
    /// Sheet names and headers are trimmed, and long or alternative day
    /// names (`Monday`, `Tues`, `Thurs`, ...) are accepted.
    Lenient,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

/// Rows of each weekday's sheet, `None` where the sheet is absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DaySheets {
    days: [Option<Vec<RawRow>>; 5],
}

impl DaySheets {
    pub fn get(&self, day: Weekday) -> Option<&[RawRow]> {
        self.days[day.index()].as_deref()
    }

    pub fn set(&mut self, day: Weekday, rows: Vec<RawRow>) {
        self.days[day.index()] = Some(rows);
    }

    pub fn present(&self) -> impl Iterator<Item = Weekday> + '_ {
        Weekday::ALL.into_iter().filter(|d| self.get(*d).is_some())
    }
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Workbook { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    #[cfg(test)]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Split out the five weekday sheets; every other sheet is dropped.
    pub fn into_day_sheets(self, matching: SheetMatching) -> DaySheets {
        let mut sheets = self.sheets;
        let mut out = DaySheets::default();
        for day in Weekday::ALL {
            let found = match matching {
                SheetMatching::Exact => sheets.iter().position(|s| s.name == day.label()),
                SheetMatching::Lenient => day
                    .aliases()
                    .iter()
                    .find_map(|alias| sheets.iter().position(|s| s.name.trim() == *alias)),
            };
            if let Some(pos) = found {
                let sheet = sheets.swap_remove(pos);
                debug!(day = %day, sheet = %sheet.name, rows = sheet.rows.len(), "matched day-sheet");
                let rows = match matching {
                    SheetMatching::Exact => sheet.rows,
                    SheetMatching::Lenient => sheet.rows.into_iter().map(trim_headers).collect(),
                };
                out.set(day, rows);
            }
        }
        out
    }
}

/// Trim header names. When two headers trim to the same name the leftmost
/// column wins.
fn trim_headers(row: RawRow) -> RawRow {
    row.into_iter()
        .map(|(header, value)| (header.trim().to_string(), value))
        .collect()
}

/// Read an uploaded file. `file_name` is only used to pick the format.
pub fn read_workbook(payload: &[u8], file_name: Option<&str>) -> Result<Workbook, ParseError> {
    match SourceFormat::detect(file_name, payload)? {
        SourceFormat::Spreadsheet => read_spreadsheet(payload),
        SourceFormat::Csv => read_csv(payload),
    }
}

fn read_spreadsheet(payload: &[u8]) -> Result<Workbook, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(payload.to_vec()))?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let rows = rows_from_range(&range);
        debug!(sheet = %name, rows = rows.len(), "read sheet");
        sheets.push(Sheet { name, rows });
    }
    Ok(Workbook::new(sheets))
}

fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<Option<String>> = header_row
        .iter()
        .map(|c| {
            let text = cell_value(c).as_text();
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        })
        .collect();

    rows.map(|cells| {
        headers
            .iter()
            .zip(cells.iter())
            .filter_map(|(h, c)| h.as_ref().map(|h| (h.clone(), cell_value(c))))
            .collect::<RawRow>()
    })
    .filter(|row| !row.is_blank())
    .collect()
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
        Data::Empty => CellValue::Empty,
    }
}

fn read_csv(payload: &[u8]) -> Result<Workbook, ParseError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(payload);
    let headers = rdr.headers()?.clone();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(h, _)| !h.is_empty())
            .map(|(h, v)| {
                let value = if v.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(v.to_string())
                };
                (h, value)
            })
            .collect();
        if !row.is_blank() {
            rows.push(row);
        }
    }
    debug!(rows = rows.len(), "read csv");
    Ok(Workbook::new(vec![Sheet {
        name: CSV_SHEET_NAME.to_string(),
        rows,
    }]))
}

// Cell coercion and number formatting.
//
// Everything that turns a loosely typed spreadsheet cell into a number lives
// here, so extraction can treat every field as a plain `f64` or `u32`.
use crate::types::CellValue;
use num_format::{Locale, ToFormattedString};

/// Coerce a cell into a number, falling back to `0.0`.
///
/// - Numbers pass through; booleans count as `1`/`0`.
/// - Text is trimmed and parsed as a float.
/// - Empty cells, unparsable text, NaN and infinities all become `0.0`.
pub fn to_number_or_zero(cell: Option<&CellValue>) -> f64 {
    let n = match cell {
        Some(CellValue::Number(n)) => *n,
        Some(CellValue::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(CellValue::Text(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(CellValue::Empty) | None => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Turn a summed run of session cells into a booking count.
///
/// Cells are added as raw numbers first; only the total is clamped at zero
/// and rounded to the nearest whole booking.
pub fn to_count(total: f64) -> u32 {
    if !total.is_finite() || total <= 0.0 {
        0
    } else {
        total.round().min(u32::MAX as f64) as u32
    }
}

/// Parse a "Charge" cell.
///
/// Every character that is not an ASCII digit or `.` is dropped first, so
/// currency symbols, thousands separators and stray text disappear
/// (`"£1,012.50"` -> `1012.5`). The longest leading run that still reads as
/// a number is used, so `"1.2.3"` reads as `1.2`. Nothing left means `0.0`.
pub fn parse_charge(cell: Option<&CellValue>) -> f64 {
    let raw = cell.map(CellValue::as_text).unwrap_or_default();
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut seen_dot = false;
    let prefix: String = cleaned
        .chars()
        .take_while(|c| {
            if *c == '.' {
                if seen_dot {
                    return false;
                }
                seen_dot = true;
            }
            true
        })
        .collect();

    prefix.parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Round half away from zero to two decimal places.
pub fn round2(n: f64) -> f64 {
    let r = (n * 100.0).round() / 100.0;
    // Keeps -0.0 out of the output.
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn charge_accepts_clean_numbers() {
        assert_eq!(parse_charge(Some(&text("12.50"))), 12.5);
        assert_eq!(parse_charge(Some(&CellValue::Number(7.25))), 7.25);
    }

    #[test]
    fn charge_strips_currency_noise() {
        assert_eq!(parse_charge(Some(&text("£12.50"))), 12.5);
        assert_eq!(parse_charge(Some(&text(" £1,012.00 "))), 1012.0);
        assert_eq!(parse_charge(Some(&text("1.2.3"))), 1.2);
    }

    #[test]
    fn charge_garbage_is_zero() {
        assert_eq!(parse_charge(Some(&text(""))), 0.0);
        assert_eq!(parse_charge(Some(&text("N/A"))), 0.0);
        assert_eq!(parse_charge(Some(&text("."))), 0.0);
        assert_eq!(parse_charge(Some(&CellValue::Empty)), 0.0);
        assert_eq!(parse_charge(None), 0.0);
    }

    #[test]
    fn number_coercion_is_total() {
        assert_eq!(to_number_or_zero(Some(&text(" 2 "))), 2.0);
        assert_eq!(to_number_or_zero(Some(&text("Bus"))), 0.0);
        assert_eq!(to_number_or_zero(Some(&text("NaN"))), 0.0);
        assert_eq!(to_number_or_zero(Some(&CellValue::Bool(true))), 1.0);
        assert_eq!(to_number_or_zero(None), 0.0);
    }

    #[test]
    fn counts_clamp_and_round_the_total() {
        assert_eq!(to_count(-3.0), 0);
        assert_eq!(to_count(0.4), 0);
        assert_eq!(to_count(0.8), 1);
        assert_eq!(to_count(1.6), 2);
        assert_eq!(to_count(3.0), 3);
        assert_eq!(to_count(f64::NAN), 0);
    }

    #[test]
    fn round2_rounds_half_up() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(2.675 + 1e-9), 2.68);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.001), 0.0);
    }

    #[test]
    fn formats_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-12.5, 2), "-12.50");
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_int(9855), "9,855");
    }
}

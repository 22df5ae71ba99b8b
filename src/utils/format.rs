//! pt-BR value formatting used by the table and the exporter

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Format a numeric string with `.` thousands grouping and `,` decimals
/// (at most three fraction digits). Non-numeric input is returned as-is.
pub fn format_number_br(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(value) = trimmed.parse::<f64>() else {
        return raw.to_string();
    };
    if !value.is_finite() {
        return raw.to_string();
    }

    let rendered = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((&rendered, ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && (int_part != "0" || !frac_part.is_empty());
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

/// Export form of a number: the first `.` becomes `,`
pub fn decimal_comma(raw: &str) -> String {
    raw.replacen('.', ",", 1)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok()
}

/// `dd/mm/yyyy`, or the input unchanged when it is not a recognisable date
pub fn format_date_br(raw: &str) -> String {
    match parse_date(raw) {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_br() {
        assert_eq!(format_number_br("1234567.5"), "1.234.567,5");
        assert_eq!(format_number_br("1000"), "1.000");
        assert_eq!(format_number_br("12"), "12");
        assert_eq!(format_number_br("0.12345"), "0,123");
        assert_eq!(format_number_br("-2500.25"), "-2.500,25");
        assert_eq!(format_number_br("abc"), "abc");
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(decimal_comma("10.5"), "10,5");
        assert_eq!(decimal_comma("1.000.5"), "1,000.5");
        assert_eq!(decimal_comma("7"), "7");
    }

    #[test]
    fn test_format_date_br() {
        assert_eq!(format_date_br("2024-03-01"), "01/03/2024");
        assert_eq!(format_date_br("2024-03-01T10:00:00Z"), "01/03/2024");
        assert_eq!(format_date_br("2024-03-01T10:00:00"), "01/03/2024");
        assert_eq!(format_date_br("31/12/2023"), "31/12/2023");
        assert_eq!(format_date_br("amanhã"), "amanhã");
    }
}

use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::Timelike;
use std::fmt::Display;

/// Milliseconds in one spreadsheet day.
const MILLIS_PER_DAY: f64 = 86_400_000f64;

/// Storage kind of a raw `<c>` element, decided from its `t` and `s` attributes.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values (1/0)
    Boolean,
    /// Plain numeric values
    Number,
    /// Serial numbers formatted as dates
    NumberDate,
    /// Serial numbers formatted as date and time
    NumberDateTime,
    /// Serial numbers formatted as time of day
    NumberTime,
    /// ISO 8601 date/time strings (`t="d"`)
    IsoDateTime,
    /// Inline or formula string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values such as `#N/A`
    Error,
}

impl CellType {
    /// Maps the `t` attribute of a cell to its storage kind.
    pub(crate) fn from_type_attribute(value: Option<&str>) -> Self {
        match value {
            Some("inlineStr") | Some("str") => Self::InlineString,
            Some("s") => Self::SharedString,
            Some("d") => Self::IsoDateTime,
            Some("b") => Self::Boolean,
            Some("e") => Self::Error,
            _ => Self::Number,
        }
    }

    /// Classifies built-in number format IDs; `None` for non temporal IDs.
    pub(crate) fn parse_builtin_number_format_id(id: &str) -> Option<Self> {
        match id {
            "22" => Some(Self::NumberDateTime),
            "14" | "15" | "16" | "17" => Some(Self::NumberDate),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::NumberTime),
            _ => None,
        }
    }

    /// Classifies a custom number format code by scanning for date and time tokens
    /// outside of literals, escapes and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::NumberDateTime,
            (true, false) => Self::NumberDate,
            (false, true) => Self::NumberTime,
            (false, false) => Self::Number,
        }
    }
}

/// A raw cell value as read from (or written to) a worksheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    /// No value (null)
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// Spreadsheet error code such as `#N/A`
    Error(String),
}

impl CellValue {
    /// Returns true for the null value.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Returns the text content for text cells.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Coerces the cell to a calendar date.
    ///
    /// Dates pass through, date-times are truncated, and text is trimmed and parsed
    /// as `DD.MM.YYYY`, `YYYY-MM-DD` or `DD/MM/YYYY`.
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(date) => Some(*date),
            CellValue::DateTime(datetime) => Some(datetime.date()),
            CellValue::Text(text) => {
                let text = text.trim();
                ["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y"]
                    .iter()
                    .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
            }
            _ => None,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            CellValue::Number(value) => write!(f, "{}", format_number(*value)),
            CellValue::Text(value) => write!(f, "{}", value),
            CellValue::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            CellValue::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Time(value) => write!(f, "{}", value.format("%H:%M:%S")),
            CellValue::Error(value) => write!(f, "{}", value),
        }
    }
}

/// Integral values print without a fractional part (`5`, not `5.0`).
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

fn epoch(is_1904: bool) -> NaiveDate {
    if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1).expect("NaiveDate Literal")
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate Literal")
    }
}

/// Converts a serial day number to a date-time.
/// Serials below 60 in the 1900 system are shifted by the Lotus 1-2-3 leap year bug.
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.trunc() as i64;
    let days = if !is_1904 && days < 60 { days + 1 } else { days };
    let millis = ((serial - serial.trunc()) * MILLIS_PER_DAY).round() as i64;
    let date = epoch(is_1904).checked_add_signed(Duration::try_days(days)?)?;
    date.and_hms_opt(0, 0, 0)?.checked_add_signed(Duration::try_milliseconds(millis)?)
}

/// Converts a date-time to a serial day number in the 1900 date system.
pub(crate) fn datetime_to_serial(datetime: NaiveDateTime) -> f64 {
    let days = (datetime.date() - epoch(false)).num_days();
    let days = if days <= 60 { days - 1 } else { days };
    days as f64 + time_to_serial(datetime.time())
}

/// Converts a time of day to the fractional part of a serial day number.
pub(crate) fn time_to_serial(time: NaiveTime) -> f64 {
    let millis = time.num_seconds_from_midnight() as f64 * 1_000f64 + (time.nanosecond() / 1_000_000) as f64;
    millis / MILLIS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn custom_formats_detect_temporal_tokens() {
        assert_eq!(CellType::parse_custom_number_format("dd.mm.yyyy"), CellType::NumberDate);
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd hh:mm"), CellType::NumberDateTime);
        assert_eq!(CellType::parse_custom_number_format("[h]:mm:ss"), CellType::NumberTime);
        assert_eq!(CellType::parse_custom_number_format("#,##0.00\"days\""), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.00"), CellType::Number);
        assert_eq!(CellType::parse_builtin_number_format_id("14"), Some(CellType::NumberDate));
        assert_eq!(CellType::parse_builtin_number_format_id("2"), None);
    }

    #[test]
    fn serials_convert_both_ways() {
        let noon = date(2024, 3, 15).and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(datetime_to_serial(noon), 45366.5);
        assert_eq!(serial_to_datetime(45366.5, false), Some(noon));

        let early = date(1900, 1, 1).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(serial_to_datetime(1.0, false), Some(early));
        assert_eq!(datetime_to_serial(early), 1.0);

        let march = date(1900, 3, 1).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(serial_to_datetime(61.0, false), Some(march));
        assert_eq!(datetime_to_serial(march), 61.0);

        assert_eq!(serial_to_datetime(0.0, true).map(|it| it.date()), Some(date(1904, 1, 1)));
        assert_eq!(serial_to_datetime(1e20, false), None);
        assert_eq!(serial_to_datetime(-1e20, true), None);
        assert_eq!(serial_to_datetime(f64::NAN, false), None);
    }

    #[test]
    fn display_uses_spreadsheet_conventions() {
        assert_eq!(CellValue::Number(5.0).to_string(), "5");
        assert_eq!(CellValue::Number(5.25).to_string(), "5.25");
        assert_eq!(CellValue::Number(-0.0).to_string(), "0");
        assert_eq!(CellValue::Bool(true).to_string(), "TRUE");
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(CellValue::Date(date(2024, 1, 5)).to_string(), "2024-01-05");
        assert_eq!(
            CellValue::DateTime(date(2024, 1, 5).and_hms_opt(8, 30, 0).unwrap()).to_string(),
            "2024-01-05 08:30:00"
        );
        assert_eq!(CellValue::Error("#N/A".to_owned()).to_string(), "#N/A");
        assert_eq!(CellValue::from(" x ").as_text(), Some(" x "));
        assert_eq!(CellValue::Number(1.0).as_text(), None);
    }

    #[test]
    fn to_date_coerces_known_shapes() {
        assert_eq!(CellValue::from(" 05.01.2024 ").to_date(), Some(date(2024, 1, 5)));
        assert_eq!(CellValue::from("2024-01-05").to_date(), Some(date(2024, 1, 5)));
        assert_eq!(CellValue::from("05/01/2024").to_date(), Some(date(2024, 1, 5)));
        assert_eq!(CellValue::from("January").to_date(), None);
        assert_eq!(CellValue::Number(45296.0).to_date(), None);
        assert_eq!(CellValue::Empty.to_date(), None);
        assert_eq!(
            CellValue::DateTime(date(2024, 1, 5).and_hms_opt(23, 59, 0).unwrap()).to_date(),
            Some(date(2024, 1, 5))
        );
    }
}

//! Dataset model shared by the detection, profiling, and rendering stages.
//!
//! A [`Dataset`] is a sequence of [`Table`]s, each carrying ordered
//! [`Column`] declarations and fully materialized [`Row`]s. Cells are
//! `Option<Value>`; `None` is the null-like marker covering true absence,
//! empty text, and whitespace-only text alike. The core stages read this
//! structure and never mutate it.

use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Semantic tag describing the values stored in a column.
///
/// `Time` is producible by the detector but has no SQL mapping; an
/// all-times column is a hard stop for the whole conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Guid,
    BigInt,
    Binary,
    Boolean,
    DateTime,
    DateTimeOffset,
    Decimal,
    Double,
    Int,
    Real,
    SmallInt,
    TinyInt,
    Time,
    Any,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Guid => "guid",
            ValueType::BigInt => "bigint",
            ValueType::Binary => "binary",
            ValueType::Boolean => "boolean",
            ValueType::DateTime => "datetime",
            ValueType::DateTimeOffset => "datetimeoffset",
            ValueType::Decimal => "decimal",
            ValueType::Double => "double",
            ValueType::Int => "int",
            ValueType::Real => "real",
            ValueType::SmallInt => "smallint",
            ValueType::TinyInt => "tinyint",
            ValueType::Time => "time",
            ValueType::Any => "any",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Guid(Uuid),
    BigInt(i64),
    Binary(Vec<u8>),
    Boolean(bool),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Decimal(Decimal),
    Double(f64),
    Int(i32),
    Real(f32),
    SmallInt(i16),
    TinyInt(i8),
    Time(NaiveTime),
}

impl Value {
    /// Character count for text values; `None` for everything else.
    pub fn text_chars(&self) -> Option<usize> {
        match self {
            Value::Text(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&Decimal> {
        match self {
            Value::Decimal(d) => Some(d),
            _ => None,
        }
    }
}

/// One cell: a typed value or the null-like marker.
pub type Cell = Option<Value>;

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub ordinal: usize,
    pub value_type: ValueType,
}

#[derive(Debug, Clone)]
pub struct Row(pub Vec<Cell>);

impl Row {
    pub fn cell(&self, ordinal: usize) -> Option<&Value> {
        self.0.get(ordinal).and_then(|cell| cell.as_ref())
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Iterates the cells of one column, in row order.
    pub fn column_cells(&self, ordinal: usize) -> impl Iterator<Item = Option<&Value>> {
        self.rows.iter().map(move |row| row.cell(ordinal))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub tables: Vec<Table>,
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d"];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = chrono::NaiveDate::parse_from_str(value, fmt)
            && let Some(midnight) = parsed.and_hms_opt(0, 0, 0)
        {
            return Ok(midnight);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

pub fn parse_datetime_offset(value: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed);
    }
    const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%z"];
    for fmt in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime with offset"))
}

pub fn parse_naive_time(value: &str) -> Result<NaiveTime> {
    const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];
    for fmt in TIME_FORMATS {
        if let Ok(parsed) = NaiveTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as time"))
}

fn parse_hex_bytes(value: &str) -> Result<Vec<u8>> {
    let body = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if body.is_empty() || body.len() % 2 != 0 {
        bail!("Failed to parse '{value}' as a hex byte sequence");
    }
    (0..body.len())
        .step_by(2)
        .map(|idx| {
            u8::from_str_radix(&body[idx..idx + 2], 16)
                .with_context(|| format!("Failed to parse '{value}' as a hex byte sequence"))
        })
        .collect()
}

/// Parses one raw field into a typed cell.
///
/// Empty or whitespace-only input decodes to `None` regardless of the
/// declared type.
pub fn parse_typed_value(value: &str, ty: &ValueType) -> Result<Cell> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed = match ty {
        ValueType::Text | ValueType::Any => Value::Text(value.to_string()),
        ValueType::Guid => {
            let bare = trimmed.trim_matches(|c| matches!(c, '{' | '}'));
            let parsed = Uuid::parse_str(bare)
                .with_context(|| format!("Failed to parse '{trimmed}' as GUID"))?;
            Value::Guid(parsed)
        }
        ValueType::BigInt => {
            let parsed: i64 = trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as bigint"))?;
            Value::BigInt(parsed)
        }
        ValueType::Int => {
            let parsed: i32 = trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as int"))?;
            Value::Int(parsed)
        }
        ValueType::SmallInt => {
            let parsed: i16 = trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as smallint"))?;
            Value::SmallInt(parsed)
        }
        ValueType::TinyInt => {
            let parsed: i8 = trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as tinyint"))?;
            Value::TinyInt(parsed)
        }
        ValueType::Binary => Value::Binary(parse_hex_bytes(trimmed)?),
        ValueType::Boolean => {
            let lowered = trimmed.to_ascii_lowercase();
            let parsed = match lowered.as_str() {
                "true" | "t" | "yes" | "y" | "1" => true,
                "false" | "f" | "no" | "n" | "0" => false,
                _ => bail!("Failed to parse '{trimmed}' as boolean"),
            };
            Value::Boolean(parsed)
        }
        ValueType::DateTime => Value::DateTime(parse_naive_datetime(trimmed)?),
        ValueType::DateTimeOffset => Value::DateTimeOffset(parse_datetime_offset(trimmed)?),
        ValueType::Time => Value::Time(parse_naive_time(trimmed)?),
        ValueType::Decimal => {
            let parsed: Decimal = trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as decimal"))?;
            Value::Decimal(parsed)
        }
        ValueType::Double => {
            let parsed: f64 = trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as float"))?;
            Value::Double(parsed)
        }
        ValueType::Real => {
            let parsed: f32 = trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as real"))?;
            Value::Real(parsed)
        }
    };
    Ok(Some(parsed))
}

//! CSV decoding boundary: turns input files into typed [`Table`]s.
//!
//! Each input file becomes one table named after its file stem. A column's
//! value type is established before profiling by a full-column detection
//! pass: a column receives a non-text tag only when every non-null value
//! matches that tag, so a single stray token demotes the column to text
//! rather than failing a later parse. Integer columns are 32-bit unless
//! the observed range forces 64-bit.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use log::debug;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::data::{
    Column, Dataset, Row, Table, ValueType, parse_datetime_offset, parse_naive_datetime,
    parse_naive_time, parse_typed_value,
};

const DEFAULT_CSV_DELIMITER: u8 = b',';
const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Decimal literals wider than this are detected as float instead.
const DECIMAL_MAX_PRECISION: u32 = 28;

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub has_headers: bool,
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            has_headers: false,
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

fn resolve_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

fn decode_field(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_field(field, encoding))
        .collect()
}

fn table_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Table".to_string())
}

/// Loads every input file into one dataset, in argument order.
pub fn load(inputs: &[impl AsRef<Path>], options: &LoadOptions) -> Result<Dataset> {
    let tables = inputs
        .iter()
        .map(|path| load_table(path.as_ref(), options))
        .collect::<Result<Vec<_>>>()?;
    Ok(Dataset { tables })
}

/// Loads one CSV file into a fully typed table.
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table> {
    let delimiter = resolve_delimiter(path, options.delimiter);
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(options.has_headers)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(BufReader::new(file));

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.byte_records() {
        let record = record.with_context(|| format!("Reading CSV record from {path:?}"))?;
        raw_rows.push(decode_record(&record, options.encoding)?);
    }

    let headers = if options.has_headers {
        let record = reader
            .byte_headers()
            .with_context(|| format!("Reading CSV headers from {path:?}"))?;
        decode_record(record, options.encoding)?
    } else {
        let width = raw_rows.first().map(Vec::len).unwrap_or(0);
        (1..=width).map(|idx| format!("Column{idx}")).collect()
    };

    let name = table_name(path);
    build_table(name, headers, raw_rows)
}

fn build_table(name: String, headers: Vec<String>, raw_rows: Vec<Vec<String>>) -> Result<Table> {
    let mut detectors: Vec<TypeDetector> = headers.iter().map(|_| TypeDetector::default()).collect();
    for raw_row in &raw_rows {
        for (detector, raw) in detectors.iter_mut().zip(raw_row) {
            detector.observe(raw);
        }
    }

    let columns: Vec<Column> = headers
        .into_iter()
        .zip(&detectors)
        .enumerate()
        .map(|(ordinal, (header, detector))| {
            let value_type = detector.decide();
            debug!("Column '{header}' detected as {value_type}");
            Column {
                name: header,
                ordinal,
                value_type,
            }
        })
        .collect();

    let rows = raw_rows
        .iter()
        .enumerate()
        .map(|(row_idx, raw_row)| {
            let cells = raw_row
                .iter()
                .zip(&columns)
                .map(|(raw, column)| {
                    parse_typed_value(raw, &column.value_type).with_context(|| {
                        format!(
                            "Parsing row {} column '{}' of table '{}'",
                            row_idx + 1,
                            column.name,
                            name
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Row(cells))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Table {
        name,
        columns,
        rows,
    })
}

/// Accumulates per-column match counts across every non-null value.
#[derive(Debug, Default)]
struct TypeDetector {
    non_empty: usize,
    boolean_matches: usize,
    integer_matches: usize,
    integer_min: i64,
    integer_max: i64,
    decimal_matches: usize,
    float_matches: usize,
    datetime_matches: usize,
    datetime_offset_matches: usize,
    time_matches: usize,
    guid_matches: usize,
}

impl TypeDetector {
    fn observe(&mut self, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }
        self.non_empty += 1;

        let lowered = trimmed.to_ascii_lowercase();
        if matches!(
            lowered.as_str(),
            "true" | "false" | "t" | "f" | "yes" | "no" | "y" | "n"
        ) {
            self.boolean_matches += 1;
        }

        if let Ok(value) = trimmed.parse::<i64>() {
            if self.integer_matches == 0 {
                self.integer_min = value;
                self.integer_max = value;
            } else {
                self.integer_min = self.integer_min.min(value);
                self.integer_max = self.integer_max.max(value);
            }
            self.integer_matches += 1;
        }

        if let Ok(value) = trimmed.parse::<Decimal>() {
            // Digit count of the rendered form is an upper bound on precision.
            let digits = value
                .abs()
                .to_string()
                .chars()
                .filter(char::is_ascii_digit)
                .count() as u32;
            if digits <= DECIMAL_MAX_PRECISION {
                self.decimal_matches += 1;
            }
        }

        if trimmed.parse::<f64>().is_ok() {
            self.float_matches += 1;
        }

        if parse_datetime_offset(trimmed).is_ok() {
            self.datetime_offset_matches += 1;
        } else if parse_naive_datetime(trimmed).is_ok() {
            self.datetime_matches += 1;
        } else if parse_naive_time(trimmed).is_ok() {
            self.time_matches += 1;
        }

        let bare = trimmed.trim_matches(|c| matches!(c, '{' | '}'));
        if Uuid::parse_str(bare).is_ok() {
            self.guid_matches += 1;
        }
    }

    fn fitted_integer_type(&self) -> ValueType {
        if self.integer_min >= i64::from(i32::MIN) && self.integer_max <= i64::from(i32::MAX) {
            ValueType::Int
        } else {
            ValueType::BigInt
        }
    }

    /// Picks the column's value type. A tag wins only when every non-null
    /// value matched it; columns with no non-null values stay text.
    fn decide(&self) -> ValueType {
        let all = |matches: usize| matches > 0 && matches == self.non_empty;
        if self.non_empty == 0 {
            ValueType::Text
        } else if all(self.boolean_matches) {
            ValueType::Boolean
        } else if all(self.integer_matches) {
            self.fitted_integer_type()
        } else if all(self.decimal_matches) {
            ValueType::Decimal
        } else if all(self.float_matches) {
            ValueType::Double
        } else if all(self.datetime_offset_matches) {
            ValueType::DateTimeOffset
        } else if all(self.datetime_matches) {
            ValueType::DateTime
        } else if all(self.time_matches) {
            ValueType::Time
        } else if all(self.guid_matches) {
            ValueType::Guid
        } else {
            ValueType::Text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(values: &[&str]) -> ValueType {
        let mut detector = TypeDetector::default();
        for value in values {
            detector.observe(value);
        }
        detector.decide()
    }

    #[test]
    fn empty_and_blank_columns_stay_text() {
        assert_eq!(detect(&[]), ValueType::Text);
        assert_eq!(detect(&["", "  ", "\t"]), ValueType::Text);
    }

    #[test]
    fn integer_columns_widen_only_past_the_i32_range() {
        assert_eq!(detect(&["1", "2", "127"]), ValueType::Int);
        assert_eq!(detect(&["1", "70000"]), ValueType::Int);
        assert_eq!(detect(&["1", "3000000000"]), ValueType::BigInt);
        assert_eq!(detect(&["-3000000000", "0"]), ValueType::BigInt);
    }

    #[test]
    fn fractional_literals_become_decimal() {
        assert_eq!(detect(&["1.5", "2.25"]), ValueType::Decimal);
        assert_eq!(detect(&["1", "2.25"]), ValueType::Decimal);
    }

    #[test]
    fn exponent_forms_fall_back_to_float() {
        assert_eq!(detect(&["1.5e10", "2.0"]), ValueType::Double);
    }

    #[test]
    fn mixed_columns_demote_to_text() {
        assert_eq!(detect(&["1", "two"]), ValueType::Text);
        assert_eq!(detect(&["true", "1"]), ValueType::Text);
        assert_eq!(detect(&["2024-01-01", "soon"]), ValueType::Text);
    }

    #[test]
    fn temporal_columns_pick_the_matching_tag() {
        assert_eq!(detect(&["2024-01-01", "2024-01-02 10:00:00"]), ValueType::DateTime);
        assert_eq!(
            detect(&["2024-01-01T10:00:00+02:00"]),
            ValueType::DateTimeOffset
        );
        assert_eq!(detect(&["09:30:00", "17:00:00"]), ValueType::Time);
    }

    #[test]
    fn guid_columns_are_detected_with_or_without_braces() {
        assert_eq!(
            detect(&[
                "550e8400-e29b-41d4-a716-446655440000",
                "{9b2b0c42-3c8f-4f5d-9d68-0d2c2f1a6b7e}"
            ]),
            ValueType::Guid
        );
    }

    #[test]
    fn boolean_tokens_do_not_include_digits() {
        assert_eq!(detect(&["yes", "no", "Y"]), ValueType::Boolean);
        assert_eq!(detect(&["1", "0"]), ValueType::Int);
    }

    #[test]
    fn blank_cells_do_not_block_detection() {
        assert_eq!(detect(&["1.5", "", "2.25", "  "]), ValueType::Decimal);
    }

    #[test]
    fn build_table_types_cells_and_nulls() {
        let table = build_table(
            "orders".to_string(),
            vec!["qty".to_string(), "note".to_string()],
            vec![
                vec!["1".to_string(), "first".to_string()],
                vec!["2".to_string(), "".to_string()],
            ],
        )
        .unwrap();
        assert_eq!(table.columns[0].value_type, ValueType::Int);
        assert_eq!(table.columns[1].value_type, ValueType::Text);
        assert!(table.rows[1].cell(1).is_none());
        assert!(table.rows[1].cell(0).is_some());
    }
}

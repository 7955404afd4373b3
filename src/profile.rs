//! Per-column profiling: nullability and size bounds.
//!
//! Each column is profiled with a single pass over its own cells: an OR
//! fold for the null-like flag, a running maximum for text width, and an
//! elementwise-max fold of [`DecimalInfo`] for exact decimals. Columns are
//! independent of one another, so callers are free to fan the profiling
//! out in parallel as long as output order is preserved.

use std::fmt;

use crate::{
    data::{Column, Table, ValueType},
    ddl::{DdlError, sql_type_name},
    decimal::{DecimalInfo, analyze},
};

/// Width bound emitted when a table has no rows to measure.
const SAFE_WIDTH: TextWidth = TextWidth::W255;

/// String-length buckets. Boundary values are policy: <=255, <=512, MAX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextWidth {
    W255,
    W512,
    Max,
}

impl TextWidth {
    pub fn from_chars(len: usize) -> Self {
        if len <= 255 {
            TextWidth::W255
        } else if len <= 512 {
            TextWidth::W512
        } else {
            TextWidth::Max
        }
    }
}

impl fmt::Display for TextWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextWidth::W255 => write!(f, "255"),
            TextWidth::W512 => write!(f, "512"),
            TextWidth::Max => write!(f, "MAX"),
        }
    }
}

/// Size or precision suffix attached to a column's SQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBound {
    Unbounded,
    Chars(TextWidth),
    Numeric { precision: u32, scale: u32 },
}

impl fmt::Display for SizeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeBound::Unbounded => Ok(()),
            SizeBound::Chars(width) => write!(f, "({width})"),
            SizeBound::Numeric { precision, scale } => write!(f, "({precision},{scale})"),
        }
    }
}

/// The profiler's verdict for one column, consumed directly by the
/// renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDecision {
    pub sql_type: &'static str,
    pub nullable: bool,
    pub size: SizeBound,
}

/// Profiles one column of `table`.
///
/// A table with zero rows short-circuits to the conservative default:
/// nullable, with the safe width bound on sized types.
pub fn profile(column: &Column, table: &Table) -> Result<ColumnDecision, DdlError> {
    let sql_type =
        sql_type_name(&column.value_type).ok_or_else(|| DdlError::UnsupportedColumnType {
            column: column.name.clone(),
            value_type: column.value_type,
        })?;

    if table.rows.is_empty() {
        let size = match column.value_type {
            ValueType::Text | ValueType::Decimal => SizeBound::Chars(SAFE_WIDTH),
            _ => SizeBound::Unbounded,
        };
        return Ok(ColumnDecision {
            sql_type,
            nullable: true,
            size,
        });
    }

    let mut nullable = false;
    let size = match column.value_type {
        ValueType::Text => {
            let mut max_chars = 0usize;
            for cell in table.column_cells(column.ordinal) {
                match cell {
                    None => nullable = true,
                    Some(value) => {
                        if let Some(chars) = value.text_chars() {
                            max_chars = max_chars.max(chars);
                        }
                    }
                }
            }
            SizeBound::Chars(TextWidth::from_chars(max_chars))
        }
        ValueType::Decimal => {
            let mut info = DecimalInfo::default();
            for cell in table.column_cells(column.ordinal) {
                match cell {
                    None => nullable = true,
                    Some(value) => {
                        if let Some(decimal) = value.as_decimal() {
                            info = info.merge(analyze(decimal));
                        }
                    }
                }
            }
            SizeBound::Numeric {
                precision: info.precision,
                scale: info.scale,
            }
        }
        _ => {
            nullable = table.column_cells(column.ordinal).any(|cell| cell.is_none());
            SizeBound::Unbounded
        }
    };

    Ok(ColumnDecision {
        sql_type,
        nullable,
        size,
    })
}

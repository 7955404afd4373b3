//! SQL type mapping and CREATE TABLE rendering.
//!
//! The value-type to SQL-type table is fixed and immutable for the life of
//! the process. Rendering walks tables in dataset order, profiles every
//! column first, then appends each statement to a single output buffer; a
//! single unmapped column type aborts the whole render with nothing
//! emitted, including statements that were already assembled.

use thiserror::Error;

use crate::{
    data::{Dataset, Table, ValueType},
    profile,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DdlError {
    #[error("column '{column}' has value type '{value_type}' with no SQL type mapping")]
    UnsupportedColumnType {
        column: String,
        value_type: ValueType,
    },
}

/// Maps a semantic value type to its SQL type-name literal.
///
/// The `Any` fallback carries its own width, so profiling adds no suffix
/// to it. Unmapped types (currently `Time`) fail the conversion outright.
pub fn sql_type_name(value_type: &ValueType) -> Option<&'static str> {
    match value_type {
        ValueType::Text => Some("nvarchar"),
        ValueType::Guid => Some("uniqueidentifier"),
        ValueType::BigInt => Some("bigint"),
        ValueType::Binary => Some("binary"),
        ValueType::Boolean => Some("bit"),
        ValueType::DateTime => Some("datetime"),
        ValueType::Decimal => Some("decimal"),
        ValueType::Double => Some("float"),
        ValueType::Int => Some("int"),
        ValueType::Real => Some("real"),
        ValueType::SmallInt => Some("smallint"),
        ValueType::TinyInt => Some("tinyint"),
        ValueType::Any => Some("nvarchar(512)"),
        ValueType::DateTimeOffset => Some("datetimeoffset"),
        ValueType::Time => None,
    }
}

#[derive(Debug, Clone)]
pub struct DdlOptions {
    pub schema_name: String,
    pub identity_column: bool,
}

impl Default for DdlOptions {
    fn default() -> Self {
        Self {
            schema_name: "dbo".to_string(),
            identity_column: false,
        }
    }
}

/// Renders one CREATE TABLE statement per table, concatenated with no
/// separator, in dataset order.
pub fn render(dataset: &Dataset, options: &DdlOptions) -> Result<String, DdlError> {
    let mut sql = String::new();
    for table in &dataset.tables {
        render_table(&mut sql, table, options)?;
    }
    Ok(sql)
}

fn render_table(sql: &mut String, table: &Table, options: &DdlOptions) -> Result<(), DdlError> {
    // Resolve every column before appending anything for this table.
    let mut decisions = Vec::with_capacity(table.columns.len());
    for column in &table.columns {
        decisions.push(profile::profile(column, table)?);
    }

    sql.push_str(&format!(
        "CREATE TABLE [{}].[{}] (",
        options.schema_name, table.name
    ));
    if options.identity_column {
        sql.push_str("[Id] [int] IDENTITY(1,1) NOT NULL,");
    }

    for (idx, (column, decision)) in table.columns.iter().zip(&decisions).enumerate() {
        if idx > 0 {
            sql.push(',');
        }
        sql.push_str(&format!(
            "[{}] {}{}",
            column.name, decision.sql_type, decision.size
        ));
        if decision.nullable {
            sql.push_str(" NULL");
        }
    }

    if options.identity_column {
        sql.push_str(&format!(
            " CONSTRAINT [PK_{}] PRIMARY KEY CLUSTERED ( [Id] ASC ) WITH \
             (PAD_INDEX = OFF, STATISTICS_NORECOMPUTE = OFF, IGNORE_DUP_KEY = OFF, \
             ALLOW_ROW_LOCKS = ON, ALLOW_PAGE_LOCKS = ON) ON [PRIMARY] ) ON [PRIMARY]",
            table.name
        ));
    } else {
        sql.push(')');
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::data::{Column, Row, Table, Value, ValueType};

    use super::*;

    fn table(name: &str, columns: Vec<Column>, rows: Vec<Row>) -> Table {
        Table {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    fn column(name: &str, ordinal: usize, value_type: ValueType) -> Column {
        Column {
            name: name.to_string(),
            ordinal,
            value_type,
        }
    }

    fn person_table() -> Table {
        table(
            "Person",
            vec![
                column("Name", 0, ValueType::Text),
                column("Age", 1, ValueType::Int),
            ],
            vec![
                Row(vec![
                    Some(Value::Text("Ann".to_string())),
                    Some(Value::Int(30)),
                ]),
                Row(vec![None, None]),
            ],
        )
    }

    #[test]
    fn type_table_matches_the_fixed_mapping() {
        assert_eq!(sql_type_name(&ValueType::Text), Some("nvarchar"));
        assert_eq!(sql_type_name(&ValueType::Guid), Some("uniqueidentifier"));
        assert_eq!(sql_type_name(&ValueType::BigInt), Some("bigint"));
        assert_eq!(sql_type_name(&ValueType::Binary), Some("binary"));
        assert_eq!(sql_type_name(&ValueType::Boolean), Some("bit"));
        assert_eq!(sql_type_name(&ValueType::DateTime), Some("datetime"));
        assert_eq!(sql_type_name(&ValueType::Decimal), Some("decimal"));
        assert_eq!(sql_type_name(&ValueType::Double), Some("float"));
        assert_eq!(sql_type_name(&ValueType::Int), Some("int"));
        assert_eq!(sql_type_name(&ValueType::Real), Some("real"));
        assert_eq!(sql_type_name(&ValueType::SmallInt), Some("smallint"));
        assert_eq!(sql_type_name(&ValueType::TinyInt), Some("tinyint"));
        assert_eq!(sql_type_name(&ValueType::Any), Some("nvarchar(512)"));
        assert_eq!(
            sql_type_name(&ValueType::DateTimeOffset),
            Some("datetimeoffset")
        );
        assert_eq!(sql_type_name(&ValueType::Time), None);
    }

    #[test]
    fn renders_the_person_statement_exactly() {
        let dataset = Dataset {
            tables: vec![person_table()],
        };
        let sql = render(&dataset, &DdlOptions::default()).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE [dbo].[Person] ([Name] nvarchar(255) NULL,[Age] int NULL)"
        );
    }

    #[test]
    fn identity_option_injects_id_column_and_pk_clause() {
        let dataset = Dataset {
            tables: vec![person_table()],
        };
        let options = DdlOptions {
            schema_name: "dbo".to_string(),
            identity_column: true,
        };
        let sql = render(&dataset, &options).unwrap();
        assert!(sql.starts_with(
            "CREATE TABLE [dbo].[Person] ([Id] [int] IDENTITY(1,1) NOT NULL,[Name] nvarchar(255) NULL"
        ));
        assert!(sql.contains(" CONSTRAINT [PK_Person] PRIMARY KEY CLUSTERED ( [Id] ASC )"));
        assert!(sql.ends_with("ON [PRIMARY] ) ON [PRIMARY]"));
    }

    #[test]
    fn statements_concatenate_without_separators() {
        let dataset = Dataset {
            tables: vec![person_table(), person_table()],
        };
        let sql = render(&dataset, &DdlOptions::default()).unwrap();
        assert_eq!(sql.matches("CREATE TABLE").count(), 2);
        assert!(sql.contains(")CREATE TABLE"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let dataset = Dataset {
            tables: vec![person_table()],
        };
        let first = render(&dataset, &DdlOptions::default()).unwrap();
        let second = render(&dataset, &DdlOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unsupported_column_type_aborts_every_table() {
        let dataset = Dataset {
            tables: vec![
                person_table(),
                table(
                    "Shifts",
                    vec![column("StartsAt", 0, ValueType::Time)],
                    vec![],
                ),
            ],
        };
        let err = render(&dataset, &DdlOptions::default()).unwrap_err();
        assert_eq!(
            err,
            DdlError::UnsupportedColumnType {
                column: "StartsAt".to_string(),
                value_type: ValueType::Time,
            }
        );
    }
}

//! INSERT statement generation.
//!
//! The table reference is always bracket-qualified (`[schema].[table]`), matching
//! the `DELETE`/`USE` preamble. Only the column list depends on the target
//! dialect: Postgres double-quotes each column, the others emit names bare.
//! Values are single-quoted with embedded quotes doubled; nulls render as `NULL`.

use std::{borrow::Cow, fmt};

use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::ConversionResult,
    identifier::{self, Identifier, IdentifierKind},
    table::{Row, Table},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum TargetDialect {
    #[value(alias = "postgresql")]
    Postgres,
    #[value(alias = "mssql")]
    Sqlserver,
    Oracle,
}

impl TargetDialect {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetDialect::Postgres => "postgres",
            TargetDialect::Sqlserver => "sqlserver",
            TargetDialect::Oracle => "oracle",
        }
    }

    pub fn quotes_columns(self) -> bool {
        matches!(self, TargetDialect::Postgres)
    }

    pub fn supports_use_preamble(self) -> bool {
        matches!(self, TargetDialect::Sqlserver)
    }
}

impl fmt::Display for TargetDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn qualified_name(schema: &Identifier, table: &Identifier) -> String {
    format!("[{schema}].[{table}]")
}

/// `'value'` with quotes doubled, or `NULL`.
pub fn render_value(value: Option<&str>) -> Cow<'static, str> {
    match value {
        None => Cow::Borrowed("NULL"),
        Some(text) => Cow::Owned(format!("'{}'", text.replace('\'', "''"))),
    }
}

/// Optional `USE` block followed by the `DELETE` block, each ending in a blank line.
pub fn preamble(
    dialect: TargetDialect,
    schema: &Identifier,
    table: &Identifier,
    database: Option<&Identifier>,
) -> String {
    let mut out = String::new();
    if let Some(database) = database.filter(|_| dialect.supports_use_preamble()) {
        out.push_str(&format!("USE [{database}]\nGO\n\n"));
    }
    out.push_str(&format!(
        "DELETE FROM {};\nGO\n\n",
        qualified_name(schema, table)
    ));
    out
}

/// Renders rows for a fixed target, caching the table reference and column list.
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    target: String,
    column_list: String,
}

impl StatementBuilder {
    pub fn new(
        dialect: TargetDialect,
        schema: &Identifier,
        table: &Identifier,
        columns: &[Identifier],
    ) -> Self {
        let column_list = if dialect.quotes_columns() {
            columns.iter().map(|c| format!("\"{c}\"")).join(", ")
        } else {
            columns.iter().join(", ")
        };
        Self {
            target: qualified_name(schema, table),
            column_list,
        }
    }

    pub fn insert(&self, row: &[Option<String>]) -> String {
        let values = row.iter().map(|v| render_value(v.as_deref())).join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({values});",
            self.target, self.column_list
        )
    }

    /// One statement per row, newline-joined, in row order. No rows yields `""`.
    pub fn build(&self, rows: &[Row]) -> String {
        rows.iter().map(|row| self.insert(row)).join("\n")
    }
}

/// Validates every name, then renders the table's rows as INSERT statements.
pub fn format_insert(
    dialect: TargetDialect,
    schema: &str,
    table_name: &str,
    table: &Table,
) -> ConversionResult<String> {
    let schema = identifier::validate(schema, IdentifierKind::Schema)?;
    let table_name = identifier::validate(table_name, IdentifierKind::Table)?;
    if table.is_empty() {
        return Ok(String::new());
    }
    let columns = identifier::validate_columns(&table.columns)?;
    Ok(StatementBuilder::new(dialect, &schema, &table_name, &columns).build(&table.rows))
}

//! Spreadsheet input (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`).
//!
//! Reads the first worksheet: the first row of its used range supplies the
//! column names, every following row becomes a [`Row`]. Cells are rendered as
//! text without type inference; integral floats drop their fractional part so
//! `30` stays `30` rather than `30.0`, and date-formatted cells render as
//! `YYYY-MM-DD HH:MM:SS` instead of their serial number.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::{
    error::{ConversionError, ConversionResult},
    table::{NullMarkers, Row, Table},
};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn read_first_sheet(path: &Path, nulls: &NullMarkers) -> ConversionResult<Table> {
    let mut workbook =
        open_workbook_auto(path).map_err(|err| ConversionError::reader(path, err))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ConversionError::reader(path, "workbook has no sheets"))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|err| ConversionError::reader(path, format!("sheet '{sheet}': {err}")))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };
    let mut table = Table::new(header.iter().map(cell_to_text).collect());
    for row in rows {
        let values = row
            .iter()
            .take(table.column_count())
            .map(|cell| match cell {
                Data::Empty => None,
                other => nulls.cell(&cell_to_text(other)),
            })
            .collect::<Row>();
        table.push_row(values);
    }
    Ok(table)
}

fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) if dt.is_datetime() => match dt.as_datetime() {
            Some(datetime) => datetime.format(DATETIME_FORMAT).to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

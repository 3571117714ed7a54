use crate::error::RowDecodeError;
use crate::model::{DensityRow, DensityTable};
use serde_json::Value;
use std::io::Write;
use tracing::warn;

const COLUMNS: usize = 4;

/// Decodes one raw row into a [`DensityRow`].
///
/// Only shape and type are checked: a negative density decodes fine. Columns
/// past the fourth are ignored. A `null` row has no columns. A fractional id
/// is truncated toward zero, matching how the dataset has always been
/// narrowed to an integer.
pub fn decode_row(raw: &Value) -> Result<DensityRow, RowDecodeError> {
    let columns: &[Value] = match raw {
        Value::Array(columns) => columns,
        Value::Null => &[],
        other => return Err(mismatch(other, "row", "an array")),
    };
    if columns.len() < COLUMNS {
        return Err(RowDecodeError::InsufficientColumns {
            found: columns.len(),
        });
    }

    Ok(DensityRow {
        id: integer(&columns[0], "id")?,
        name: text(&columns[1], "name")?,
        normalised_name: text(&columns[2], "normalised_name")?,
        density: number(&columns[3], "density")?,
    })
}

fn integer(v: &Value, column: &'static str) -> Result<i64, RowDecodeError> {
    // Integer literals are taken as-is, so ids above 2^53 stay exact where a
    // float round-trip would round them. Only fractional ids are narrowed.
    if let Some(i) = v.as_i64() {
        return Ok(i);
    }
    number(v, column).map(|f| f as i64)
}

fn number(v: &Value, column: &'static str) -> Result<f64, RowDecodeError> {
    v.as_f64().ok_or_else(|| mismatch(v, column, "a number"))
}

fn text(v: &Value, column: &'static str) -> Result<String, RowDecodeError> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| mismatch(v, column, "text"))
}

fn mismatch(v: &Value, column: &'static str, expected: &'static str) -> RowDecodeError {
    RowDecodeError::TypeMismatch {
        column,
        expected,
        found: json_kind(v),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// CSV fields for one row, in header order.
pub fn encode_row(row: &DensityRow) -> [String; COLUMNS] {
    [
        row.id.to_string(),
        row.name.clone(),
        row.normalised_name.clone(),
        format!("{:.6}", row.density),
    ]
}

#[derive(Debug, Default)]
pub struct ConversionReport {
    pub written: usize,
    pub skipped: Vec<(usize, RowDecodeError)>,
}

/// Writes `table` to `sink` as CSV: the header verbatim, then every row that
/// decodes, in input order.
///
/// Rows that fail to decode are logged and skipped. Only a failure writing to
/// `sink` is returned as an error.
pub fn convert<W: Write>(table: &DensityTable, sink: W) -> Result<ConversionReport, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(sink);

    writer.write_record(&table.key)?;

    let mut report = ConversionReport::default();
    for (idx, raw) in table.values.iter().enumerate() {
        match decode_row(raw) {
            Ok(row) => {
                writer.write_record(encode_row(&row))?;
                report.written += 1;
            }
            Err(err) => {
                warn!(row = idx, "Invalid data at row {idx}: {err}");
                report.skipped.push((idx, err));
            }
        }
    }

    writer.flush()?;
    Ok(report)
}

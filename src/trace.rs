//! Trace export
//!
//! Appends a tab-separated dump of workshop rows to a text file. Each dump is
//! a title line, a header line and one line per row, followed by an empty
//! line. Real values are written in scientific notation with at most three
//! decimals (`1.234E3`).

use crate::error::{Result, ResultExt, WorkshopError};
use crate::table::{CellValue, EntityKind, TableModel};
use chrono::NaiveDateTime;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

const SEPARATOR: &str = "\t";

fn title(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Variable => "Variable table trace:",
        EntityKind::Constraint => "Constraint workshop trace:",
        EntityKind::Objective => "Objective workshop trace:",
    }
}

/// Format a real as `<mantissa>E<exponent>` with at most three decimals
pub fn format_real(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let formatted = format!("{:.3e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let mantissa = if mantissa.contains('.') {
                mantissa.trim_end_matches('0').trim_end_matches('.')
            } else {
                mantissa
            };
            format!("{}E{}", mantissa, exponent)
        }
        None => formatted,
    }
}

fn format_cell(value: &CellValue) -> String {
    match value {
        CellValue::Real(v) => format_real(*v),
        other => other.to_string(),
    }
}

/// Write one trace block for `rows` of `model`
pub fn write_trace<W: Write>(
    out: &mut W,
    model: &dyn TableModel,
    rows: &[usize],
    at: NaiveDateTime,
) -> Result<()> {
    writeln!(out, "{} {}", title(model.kind()), at.format("%Y-%m-%d %H:%M:%S"))?;

    for column in model.schema() {
        write!(out, "{}{}", column.header, SEPARATOR)?;
    }
    writeln!(out)?;

    for &row in rows {
        for column in 0..model.column_count() {
            write!(out, "{}{}", format_cell(&model.value(row, column)), SEPARATOR)?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Append a trace block to the file at `path`, creating it if needed
pub fn append_trace(path: &Path, model: &dyn TableModel, rows: &[usize]) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(WorkshopError::from)
        .with_context(|| format!("Failed to open trace file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_trace(&mut out, model, rows, chrono::Local::now().naive_local())?;
    out.flush()?;
    tracing::info!(
        "Traced {} {} rows to {}",
        rows.len(),
        model.kind().noun(),
        path.display()
    );
    Ok(())
}

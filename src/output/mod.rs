//! Writing results to stdout or to JSON / CSV files.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Endpoint data is one list per query; spread them into plain rows.
pub fn flatten_records(data: &[Value]) -> Vec<Map<String, Value>> {
    let mut rows = Vec::new();
    for item in data {
        match item {
            Value::Array(inner) => rows.extend(inner.iter().map(to_row)),
            other => rows.push(to_row(other)),
        }
    }
    rows
}

fn to_row(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        other => {
            let mut row = Map::new();
            row.insert("value".to_string(), other.clone());
            row
        }
    }
}

/// Column order is the order in which keys are first seen.
fn columns(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut cols: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !cols.iter().any(|c| c == key) {
                cols.push(key.clone());
            }
        }
    }
    cols
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn write_csv<W: Write>(writer: W, rows: &[Map<String, Value>]) -> Result<()> {
    let cols = columns(rows);
    let mut out = csv::WriterBuilder::new().flexible(false).from_writer(writer);

    out.write_record(&cols)?;
    for row in rows {
        out.write_record(cols.iter().map(|c| cell(row.get(c))))?;
    }
    out.flush()?;
    Ok(())
}

pub fn render_json(value: &Value, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

/// Write `value` to `path`: `.csv` gets flattened rows, anything else JSON.
pub fn write_file(path: &Path, value: &Value, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("Cannot create {:?}", parent))?;
    }

    let is_csv = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        let rows = match value {
            Value::Array(items) => flatten_records(items),
            other => flatten_records(std::slice::from_ref(other)),
        };
        let file = std::fs::File::create(path).with_context(|| format!("Cannot create {:?}", path))?;
        write_csv(file, &rows)?;
        info!("Wrote {} rows to {:?}", rows.len(), path);
    } else {
        std::fs::write(path, render_json(value, pretty)?)
            .with_context(|| format!("Cannot write {:?}", path))?;
        debug!("Wrote JSON to {:?}", path);
    }
    Ok(())
}

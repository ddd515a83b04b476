//! Tabular file parsing for CSV, JSON and Parquet.

use bytes::Bytes;
use insight_core::artifact::FileFormat;
use insight_core::error::{InsightError, Result};
use insight_core::table::{Table, TabularParser};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use serde_json::{Map, Value};

/// Parser covering every [`FileFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTableParser;

impl FileTableParser {
    pub fn new() -> Self {
        Self
    }
}

impl TabularParser for FileTableParser {
    fn parse(&self, bytes: &[u8], format: FileFormat, has_header: bool) -> Result<Table> {
        let table = match format {
            FileFormat::Csv => parse_csv(bytes, has_header)?,
            FileFormat::Json => parse_json(bytes)?,
            FileFormat::Parquet => parse_parquet(bytes)?,
        };
        tracing::debug!(
            format = %format,
            rows = table.row_count(),
            columns = table.column_count(),
            "Parsed table"
        );
        Ok(table)
    }
}

fn parse_csv(bytes: &[u8], has_header: bool) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .from_reader(bytes);

    let header: Option<Vec<String>> = if has_header {
        Some(reader.headers()?.iter().map(str::to_string).collect())
    } else {
        None
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let columns = header.unwrap_or_else(|| {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        positional_columns(width)
    });
    Ok(Table::new(columns, rows))
}

fn positional_columns(width: usize) -> Vec<String> {
    (0..width).map(|i| i.to_string()).collect()
}

/// Accepts records (`[{..}, ..]`), rows (`[[..], ..]`), columns
/// (`{"col": [..]}` or `{"col": {"0": ..}}`) and a single flat object.
fn parse_json(bytes: &[u8]) -> Result<Table> {
    let value: Value = serde_json::from_slice(bytes)?;
    match value {
        Value::Array(items) if items.iter().all(Value::is_object) => Ok(records_table(items)),
        Value::Array(items) if items.iter().all(Value::is_array) => {
            let rows: Vec<Vec<String>> = items
                .into_iter()
                .map(|item| match item {
                    Value::Array(cells) => cells.iter().map(cell_text).collect(),
                    _ => Vec::new(),
                })
                .collect();
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            Ok(Table::new(positional_columns(width), rows))
        }
        Value::Array(items) => Ok(Table::new(
            vec!["0".to_string()],
            items.iter().map(|item| vec![cell_text(item)]).collect(),
        )),
        Value::Object(map) if map.values().all(|v| v.is_object() || v.is_array()) => {
            Ok(columns_table(map))
        }
        Value::Object(map) => Ok(Table::new(
            map.keys().cloned().collect(),
            vec![map.values().map(cell_text).collect()],
        )),
        other => Err(InsightError::unsupported(format!(
            "JSON document must be an array or an object, found {}",
            json_kind(&other)
        ))),
    }
}

fn records_table(items: Vec<Value>) -> Table {
    let mut columns: Vec<String> = Vec::new();
    for item in &items {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let rows = items
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|column| item.get(column).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();
    Table::new(columns, rows)
}

fn columns_table(map: Map<String, Value>) -> Table {
    let columns: Vec<String> = map.keys().cloned().collect();
    let series: Vec<Vec<String>> = map
        .values()
        .map(|value| match value {
            Value::Array(cells) => cells.iter().map(cell_text).collect(),
            Value::Object(cells) => cells.values().map(cell_text).collect(),
            _ => Vec::new(),
        })
        .collect();

    let height = series.iter().map(Vec::len).max().unwrap_or(0);
    let rows = (0..height)
        .map(|row| {
            series
                .iter()
                .map(|column| column.get(row).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    Table::new(columns, rows)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_parquet(bytes: &[u8]) -> Result<Table> {
    let parquet_error = |err: parquet::errors::ParquetError| {
        InsightError::serialization("Parquet", err.to_string())
    };

    let reader =
        SerializedFileReader::new(Bytes::copy_from_slice(bytes)).map_err(parquet_error)?;
    let columns: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .root_schema()
        .get_fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();

    let mut rows = Vec::new();
    for row in reader.get_row_iter(None).map_err(parquet_error)? {
        let row = row.map_err(parquet_error)?;
        rows.push(
            row.get_column_iter()
                .map(|(_, field)| field_text(field))
                .collect::<Vec<_>>(),
        );
    }
    Ok(Table::new(columns, rows))
}

fn field_text(field: &Field) -> String {
    match field {
        Field::Null => String::new(),
        Field::Str(text) => text.clone(),
        other => other.to_string(),
    }
}

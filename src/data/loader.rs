use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use encoding_rs::WINDOWS_1252;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, SoilDataset};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a soil-sample table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – delimited text, `;` `,` or tab, UTF-8 or Latin-1
/// * `.json`         – `[{ "departamento": "...", "ph": 5.8, ... }, ...]`
/// * `.parquet`      – flat columns of strings, numbers and booleans
pub fn load_file(path: &Path) -> Result<SoilDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" | "txt" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} records with columns {:?} from {}",
        dataset.len(),
        dataset.columns(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<SoilDataset> {
    let bytes = std::fs::read(path).context("reading CSV file")?;
    parse_csv(&bytes)
}

/// Parse delimited text.
///
/// Soil survey exports are usually `;`-separated and often Latin-1 encoded,
/// so the text is decoded as UTF-8 first and as Windows-1252 when that fails.
/// Rows whose field count differs from the header are skipped.
pub fn parse_csv(bytes: &[u8]) -> Result<SoilDataset> {
    let text = decode_text(bytes);
    let delimiter = sniff_delimiter(&text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::None)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        bail!("CSV has no header row");
    }

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    let mut skipped = 0usize;
    for (row_no, result) in reader.records().enumerate() {
        match result {
            Ok(record) => rows.push(record.iter().map(guess_cell_type).collect()),
            Err(e) => {
                // Line numbers are 1-based and the header is line 1.
                log::warn!("Skipping malformed CSV row {}: {e}", row_no + 2);
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        log::warn!("Skipped {skipped} malformed CSV rows");
    }

    Ok(SoilDataset::load(&headers, rows))
}

fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            log::warn!("File is not valid UTF-8, decoding as Windows-1252");
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

/// Pick the delimiter that occurs most often in the header line.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    [b';', b',', b'\t']
        .into_iter()
        .map(|d| (d, header.bytes().filter(|&b| b == d).count()))
        .filter(|&(_, n)| n > 0)
        .max_by_key(|&(d, n)| (n, d == b';'))
        .map(|(d, _)| d)
        .unwrap_or(b';')
}

fn guess_cell_type(s: &str) -> CellValue {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return CellValue::Float(f);
        }
    }
    if trimmed == "true" || trimmed == "false" {
        return CellValue::Bool(trimmed == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "departamento": "Tolima", "municipio": "Ibagué", "ph": 5.8 },
///   ...
/// ]
/// ```
///
/// Column order follows the first object; keys first seen later are appended.
fn load_json(path: &Path) -> Result<SoilDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<SoilDataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records.iter().filter_map(JsonValue::as_object).map(|obj| {
        headers
            .iter()
            .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
            .collect::<Vec<_>>()
    });

    Ok(SoilDataset::load(&headers, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Nested columns are rendered as text.
fn load_parquet(path: &Path) -> Result<SoilDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch.columns();
        for row in 0..batch.num_rows() {
            rows.push(
                columns
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(SoilDataset::load(&headers, rows))
}

// -- Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| CellValue::String(s.value(row).to_string()))
            .unwrap_or(CellValue::Null),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(a.value(row) as i64))
            .unwrap_or(CellValue::Null),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row)))
            .unwrap_or(CellValue::Null),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64))
            .unwrap_or(CellValue::Null),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row)))
            .unwrap_or(CellValue::Null),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row)))
            .unwrap_or(CellValue::Null),
        _ => match arrow::util::display::array_value_to_string(col.as_ref(), row) {
            Ok(s) => CellValue::String(s),
            Err(_) => CellValue::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_csv_with_messy_headers() {
        let csv = " Departamento ;Municipio;Cultivo;pH;Fósforo\n\
                   Tolima;Ibagué;Café;5.8;12\n\
                   Tolima;Ibagué;Café;ND;\n";
        let ds = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.columns(), ["departamento", "municipio", "cultivo", "ph", "fósforo"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.cell(0, "ph"), Some(&CellValue::from(5.8f64)));
        assert_eq!(ds.cell(0, "fósforo"), Some(&CellValue::Integer(12)));
        assert_eq!(ds.cell(1, "ph"), Some(&CellValue::from("ND")));
        assert_eq!(ds.cell(1, "fósforo"), Some(&CellValue::Null));
    }

    #[test]
    fn comma_csv_is_detected() {
        let ds = parse_csv(b"departamento,ph\nHuila,6.1\n").unwrap();
        assert_eq!(ds.columns(), ["departamento", "ph"]);
        assert_eq!(ds.cell(0, "ph"), Some(&CellValue::from(6.1f64)));
    }

    #[test]
    fn latin1_bytes_fall_back_to_windows_1252() {
        // "Fósforo;Municipio\n12;Ibagué\n" with ó = 0xF3 and é = 0xE9
        let ds = parse_csv(b"F\xf3sforo;Municipio\n12;Ibagu\xe9\n").unwrap();
        assert_eq!(ds.columns(), ["fósforo", "municipio"]);
        assert_eq!(ds.cell(0, "municipio"), Some(&CellValue::from("Ibagué")));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let ds = parse_csv(b"a;b\n1;2\n1;2;3\n4;5\n").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.cell(1, "a"), Some(&CellValue::Integer(4)));
    }

    #[test]
    fn json_records_keep_key_order() {
        let ds = parse_json(
            r#"[{"Municipio": "Neiva", "pH": 5.5, "ok": true},
                {"Municipio": "Garzón", "topografia": "Plano"}]"#,
        )
        .unwrap();
        assert_eq!(ds.columns(), ["municipio", "ph", "ok", "topografia"]);
        assert_eq!(ds.cell(0, "ph"), Some(&CellValue::from(5.5f64)));
        assert_eq!(ds.cell(0, "ok"), Some(&CellValue::Bool(true)));
        assert_eq!(ds.cell(1, "ph"), Some(&CellValue::Null));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(parse_json(r#"{"ph": 5}"#).is_err());
        assert!(parse_json("[1, 2]").is_err());
    }

    #[test]
    fn csv_file_round_trip_through_load_file() {
        let path = std::env::temp_dir().join(format!("soil-lens-{}.csv", std::process::id()));
        std::fs::write(&path, "departamento;ph\nCauca;4.9\n").unwrap();
        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.cell(0, "departamento"), Some(&CellValue::from("Cauca")));
    }

    #[test]
    fn parquet_columns_map_to_cells() {
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("Municipio", DataType::Utf8, true),
            Field::new("pH", DataType::Float64, true),
            Field::new("Año", DataType::Int64, false),
            Field::new("Riego", DataType::Boolean, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("Neiva"), None])),
                Arc::new(Float64Array::from(vec![Some(5.5), None])),
                Arc::new(Int64Array::from(vec![2019, 2021])),
                Arc::new(BooleanArray::from(vec![true, false])),
            ],
        )
        .unwrap();

        let path = std::env::temp_dir().join(format!("soil-lens-{}.parquet", std::process::id()));
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.columns(), ["municipio", "ph", "año", "riego"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.cell(0, "municipio"), Some(&CellValue::from("Neiva")));
        assert_eq!(ds.cell(0, "ph"), Some(&CellValue::from(5.5f64)));
        assert_eq!(ds.cell(0, "año"), Some(&CellValue::from(2019i64)));
        assert_eq!(ds.cell(0, "riego"), Some(&CellValue::Bool(true)));
        assert_eq!(ds.cell(1, "municipio"), Some(&CellValue::Null));
        assert_eq!(ds.cell(1, "ph"), Some(&CellValue::Null));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(load_file(Path::new("muestras.xlsx")).is_err());
    }
}

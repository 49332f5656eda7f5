use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the soil table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common spreadsheet dtypes.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    #[default]
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// String form used for categorical comparison. `None` for null cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// A single soil sample (one row of the source table).
///
/// Cells are positional; `SoilDataset::columns` names them.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cells: Vec<CellValue>,
}

impl Record {
    pub fn get(&self, idx: usize) -> Option<&CellValue> {
        self.cells.get(idx)
    }
}

// ---------------------------------------------------------------------------
// SoilDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with normalized column names.
#[derive(Debug, Clone, Default)]
pub struct SoilDataset {
    /// Normalized (trimmed, lowercased) column names in source order.
    columns: Vec<String>,
    /// normalized name → position in `columns`.
    column_index: BTreeMap<String, usize>,
    records: Vec<Record>,
}

/// Trim and lowercase a header the way every column is stored.
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl SoilDataset {
    /// Build a dataset from raw headers and rows.
    ///
    /// Headers are normalized. When two headers collapse to the same name the
    /// first one wins and the later column is dropped from every row. Rows are
    /// padded with nulls or cut to the header width.
    pub fn load<S, R>(headers: &[S], rows: R) -> Self
    where
        S: AsRef<str>,
        R: IntoIterator<Item = Vec<CellValue>>,
    {
        let mut columns = Vec::with_capacity(headers.len());
        let mut column_index = BTreeMap::new();
        // Source positions of the headers we keep.
        let mut kept = Vec::with_capacity(headers.len());

        for (src_idx, header) in headers.iter().enumerate() {
            let name = normalize_column_name(header.as_ref());
            if column_index.contains_key(&name) {
                log::warn!(
                    "Dropping duplicate column '{}' (normalizes to '{name}')",
                    header.as_ref()
                );
                continue;
            }
            column_index.insert(name.clone(), columns.len());
            columns.push(name);
            kept.push(src_idx);
        }

        let records = rows
            .into_iter()
            .map(|mut raw| {
                let cells = kept
                    .iter()
                    .map(|&i| raw.get_mut(i).map(std::mem::take).unwrap_or_default())
                    .collect();
                Record { cells }
            })
            .collect();

        SoilDataset {
            columns,
            column_index,
            records,
        }
    }

    /// Normalized column names in source order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.records
    }

    /// Position of a column, looked up by its normalized name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_index.get(&normalize_column_name(name)).copied()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.records.get(row)?.get(idx)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_trimmed_and_lowercased() {
        let ds = SoilDataset::load(&["  Departamento ", "Fósforo(P)", "pH"], Vec::<Vec<CellValue>>::new());
        assert_eq!(ds.columns(), ["departamento", "fósforo(p)", "ph"]);
        assert_eq!(ds.column_index(" PH "), Some(2));
    }

    #[test]
    fn duplicate_headers_keep_the_first_column() {
        let ds = SoilDataset::load(
            &["pH", " PH", "cultivo"],
            vec![vec![CellValue::from("6.1"), CellValue::from("9.9"), CellValue::from("Café")]],
        );
        assert_eq!(ds.columns(), ["ph", "cultivo"]);
        assert_eq!(ds.cell(0, "ph"), Some(&CellValue::from("6.1")));
        assert_eq!(ds.cell(0, "cultivo"), Some(&CellValue::from("Café")));
    }

    #[test]
    fn ragged_rows_are_padded_or_cut() {
        let ds = SoilDataset::load(
            &["a", "b"],
            vec![vec![CellValue::Integer(1)], vec![CellValue::from(1i64), CellValue::from(2i64), CellValue::from(3i64)]],
        );
        assert_eq!(ds.rows()[0].cells, vec![CellValue::Integer(1), CellValue::Null]);
        assert_eq!(ds.rows()[1].cells.len(), 2);
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn null_has_no_text() {
        assert_eq!(CellValue::Null.as_text(), None);
        assert_eq!(CellValue::Float(5.5).as_text().as_deref(), Some("5.5"));
    }
}

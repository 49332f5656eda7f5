use std::collections::BTreeMap;

use super::model::{CellValue, Record, SoilDataset};

// ---------------------------------------------------------------------------
// Subset: a row-index projection of the dataset
// ---------------------------------------------------------------------------

/// Indices of records that survived the filters applied so far, in table order.
#[derive(Debug, Clone)]
pub struct Subset<'a> {
    dataset: &'a SoilDataset,
    indices: Vec<usize>,
}

impl<'a> Subset<'a> {
    /// Every record of the dataset.
    pub fn all(dataset: &'a SoilDataset) -> Self {
        Self {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    /// A subset made of explicit row indices; out-of-range indices are dropped.
    pub fn from_indices(dataset: &'a SoilDataset, mut indices: Vec<usize>) -> Self {
        indices.retain(|&i| i < dataset.len());
        Self { dataset, indices }
    }

    pub fn dataset(&self) -> &'a SoilDataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let rows = self.dataset.rows();
        self.indices.iter().map(move |&i| &rows[i])
    }

    pub fn first(&self) -> Option<&'a Record> {
        self.indices.first().map(|&i| &self.dataset.rows()[i])
    }

    /// Cells of one column across the subset. Empty when the column is missing.
    pub fn column_values(&self, column: &str) -> Vec<&'a CellValue> {
        match self.dataset.column_index(column) {
            Some(idx) => self.records().filter_map(|r| r.get(idx)).collect(),
            None => Vec::new(),
        }
    }

    /// Keep only the first `limit` records. `None` keeps everything.
    pub fn truncate(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.indices.truncate(limit);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Categorical matching
// ---------------------------------------------------------------------------

/// Comparison key for categorical values: trimmed, then full Unicode case
/// folding ("Straße" and "STRASSE" share a key).
pub fn normalize_key(raw: &str) -> String {
    caseless::default_case_fold_str(raw.trim())
}

fn cell_key(cell: &CellValue) -> Option<String> {
    cell.as_text().map(|s| normalize_key(&s))
}

/// Keep records whose `column` equals `value`, ignoring case and surrounding
/// whitespace on both sides.
///
/// * `column` is `None` or not in the dataset → empty subset
/// * null cells never match
pub fn filter_equals<'a>(subset: &Subset<'a>, column: Option<&str>, value: &str) -> Subset<'a> {
    let dataset = subset.dataset;
    let Some(idx) = column.and_then(|c| dataset.column_index(c)) else {
        return Subset {
            dataset,
            indices: Vec::new(),
        };
    };

    let probe = normalize_key(value);
    let rows = dataset.rows();
    let indices = subset
        .indices
        .iter()
        .copied()
        .filter(|&i| {
            rows[i]
                .get(idx)
                .and_then(cell_key)
                .is_some_and(|key| key == probe)
        })
        .collect();

    Subset { dataset, indices }
}

/// Sorted distinct values of `column` within the subset.
///
/// Values that only differ by case or surrounding whitespace collapse to one
/// entry, displayed with the first trimmed spelling seen. Null and blank cells
/// are skipped. Ordering follows the normalized key.
pub fn list_distinct(subset: &Subset<'_>, column: Option<&str>) -> Vec<String> {
    let Some(column) = column else {
        return Vec::new();
    };

    let mut distinct: BTreeMap<String, String> = BTreeMap::new();
    for cell in subset.column_values(column) {
        let Some(text) = cell.as_text() else {
            continue;
        };
        let display = text.trim();
        if display.is_empty() {
            continue;
        }
        distinct
            .entry(normalize_key(display))
            .or_insert_with(|| display.to_string());
    }
    distinct.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> SoilDataset {
        let rows = [
            ("Tolima", "Ibagué", "Café"),
            ("tolima ", "IBAGUÉ", "café"),
            ("Huila", "Neiva", "Arroz"),
            ("  TOLIMA", "Espinal", "Arroz"),
            ("Antioquia", "Medellín", "Café"),
        ];
        SoilDataset::load(
            &["departamento", "municipio", "cultivo"],
            rows.iter()
                .map(|(d, m, c)| vec![CellValue::from(*d), CellValue::from(*m), CellValue::from(*c)]),
        )
    }

    #[test]
    fn matching_ignores_case_and_whitespace() {
        let ds = dataset();
        let all = Subset::all(&ds);
        let upper = filter_equals(&all, Some("departamento"), "TOLIMA");
        let padded = filter_equals(&all, Some("departamento"), " tolima ");
        assert_eq!(upper.indices(), [0, 1, 3]);
        assert_eq!(upper.indices(), padded.indices());
    }

    #[test]
    fn matching_folds_accented_capitals() {
        let ds = dataset();
        let all = Subset::all(&ds);
        let hits = filter_equals(&all, Some("municipio"), "ibagué");
        assert_eq!(hits.indices(), [0, 1]);
    }

    #[test]
    fn matching_uses_full_case_folding() {
        let ds = SoilDataset::load(
            &["municipio"],
            vec![
                vec![CellValue::from("Straße")],
                vec![CellValue::from("STRASSE")],
                vec![CellValue::from("ΟΔΟΣ")],
                vec![CellValue::from("οδος")],
            ],
        );
        let all = Subset::all(&ds);
        assert_eq!(filter_equals(&all, Some("municipio"), "strasse").indices(), [0, 1]);
        assert_eq!(filter_equals(&all, Some("municipio"), "οδος").indices(), [2, 3]);
        assert_eq!(list_distinct(&all, Some("municipio")), ["Straße", "ΟΔΟΣ"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let ds = dataset();
        let all = Subset::all(&ds);
        let once = filter_equals(&all, Some("cultivo"), "café");
        let twice = filter_equals(&once, Some("cultivo"), "café");
        assert_eq!(once.indices(), twice.indices());
    }

    #[test]
    fn chained_filters_compose_with_and() {
        let ds = dataset();
        let all = Subset::all(&ds);
        let region = filter_equals(&all, Some("departamento"), "tolima");
        let crop = filter_equals(&region, Some("cultivo"), "arroz");
        assert_eq!(crop.indices(), [3]);
    }

    #[test]
    fn missing_column_yields_empty_subset() {
        let ds = dataset();
        let all = Subset::all(&ds);
        assert!(filter_equals(&all, Some("vereda"), "x").is_empty());
        assert!(filter_equals(&all, None, "x").is_empty());
    }

    #[test]
    fn null_cells_never_match() {
        let ds = SoilDataset::load(&["cultivo"], vec![vec![CellValue::Null]]);
        let all = Subset::all(&ds);
        assert!(filter_equals(&all, Some("cultivo"), "<null>").is_empty());
    }

    #[test]
    fn distinct_values_collapse_and_sort() {
        let ds = dataset();
        let all = Subset::all(&ds);
        assert_eq!(
            list_distinct(&all, Some("departamento")),
            ["Antioquia", "Huila", "Tolima"]
        );
    }

    #[test]
    fn distinct_values_skip_blank_and_null() {
        let ds = SoilDataset::load(
            &["cultivo"],
            vec![vec![CellValue::from("  ")], vec![CellValue::Null], vec![CellValue::from("Maíz")]],
        );
        assert_eq!(list_distinct(&Subset::all(&ds), Some("cultivo")), ["Maíz"]);
    }

    #[test]
    fn truncate_keeps_table_order() {
        let ds = dataset();
        let all = Subset::all(&ds).truncate(Some(2));
        assert_eq!(all.indices(), [0, 1]);
        let uncapped = Subset::all(&ds).truncate(None);
        assert_eq!(uncapped.len(), 5);
    }
}

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::filter::Subset;
use super::model::CellValue;
use super::resolver::{ResolvedColumns, SemanticField};

/// Sentinel shown when no terrain label is available.
pub const TOPOLOGY_UNAVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Nutrient – the numeric fields we summarize
// ---------------------------------------------------------------------------

/// Numeric soil variables reported as medians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Nutrient {
    #[default]
    #[serde(rename = "pH")]
    Ph,
    #[serde(rename = "Fósforo(P)")]
    Phosphorus,
    #[serde(rename = "Potasio(K)")]
    Potassium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 3] = [Nutrient::Ph, Nutrient::Phosphorus, Nutrient::Potassium];

    /// Display label, also the key used when the result is serialized.
    pub fn label(self) -> &'static str {
        match self {
            Nutrient::Ph => "pH",
            Nutrient::Phosphorus => "Fósforo(P)",
            Nutrient::Potassium => "Potasio(K)",
        }
    }

    pub fn field(self) -> SemanticField {
        match self {
            Nutrient::Ph => SemanticField::Ph,
            Nutrient::Phosphorus => SemanticField::Phosphorus,
            Nutrient::Potassium => SemanticField::Potassium,
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Median per nutrient. A missing key means no valid numeric value was found.
pub type Medians = BTreeMap<Nutrient, f64>;

// ---------------------------------------------------------------------------
// Numeric coercion and statistics
// ---------------------------------------------------------------------------

/// Interpret a cell as a finite number.
///
/// Integer and decimal literals (surrounding whitespace allowed) parse;
/// blank, text, boolean and non-finite values give `None`.
pub fn try_parse_number(cell: &CellValue) -> Option<f64> {
    let value = match cell {
        CellValue::Integer(i) => *i as f64,
        CellValue::Float(v) => *v,
        CellValue::String(s) => s.trim().parse::<f64>().ok()?,
        CellValue::Bool(_) | CellValue::Null => return None,
    };
    value.is_finite().then_some(value)
}

/// Standard median; the mean of the two central values for even counts.
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Parsed values of a nutrient column within the subset, in table order.
///
/// Cells that fail to parse are skipped. Empty when the column is unresolved.
pub fn numeric_values(subset: &Subset<'_>, resolved: &ResolvedColumns, nutrient: Nutrient) -> Vec<f64> {
    match resolved.get(nutrient.field()) {
        Some(column) => subset
            .column_values(column)
            .into_iter()
            .filter_map(try_parse_number)
            .collect(),
        None => Vec::new(),
    }
}

/// Median of every nutrient that has at least one valid value in the subset.
pub fn compute_medians(subset: &Subset<'_>, resolved: &ResolvedColumns) -> Medians {
    Nutrient::ALL
        .into_iter()
        .filter_map(|nutrient| {
            let values = numeric_values(subset, resolved, nutrient);
            median(values).map(|m| (nutrient, m))
        })
        .collect()
}

/// Terrain label of the first record in the subset.
///
/// Never fails: an unresolved column, an empty subset or a blank cell all
/// give [`TOPOLOGY_UNAVAILABLE`].
pub fn resolve_topology(subset: &Subset<'_>, resolved: &ResolvedColumns) -> String {
    resolved
        .get(SemanticField::Topology)
        .and_then(|column| subset.dataset().column_index(column))
        .and_then(|idx| subset.first()?.get(idx))
        .and_then(CellValue::as_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| TOPOLOGY_UNAVAILABLE.to_string())
}

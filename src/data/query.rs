use serde::Serialize;
use thiserror::Error;

use super::aggregate::{compute_medians, resolve_topology, Medians};
use super::filter::{filter_equals, list_distinct, Subset};
use super::model::SoilDataset;
use super::resolver::{ResolvedColumns, SemanticField};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("no soil data loaded")]
    NoData,
    #[error("no records found for {region} / {subregion} / {category}")]
    NoMatch {
        region: String,
        subregion: String,
        category: String,
    },
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Outcome of a median query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedianReport {
    pub medians: Medians,
    pub topology: String,
    /// Records the medians were computed over, after the limit.
    pub rows_used: usize,
}

// ---------------------------------------------------------------------------
// QueryEngine – the façade over one loaded dataset
// ---------------------------------------------------------------------------

/// Read-only query layer: region → subregion → category selection, record
/// retrieval and nutrient medians.
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    dataset: Option<SoilDataset>,
    resolved: ResolvedColumns,
}

impl QueryEngine {
    pub fn new(dataset: SoilDataset) -> Self {
        let mut engine = Self::default();
        engine.load(dataset);
        engine
    }

    /// Replace the dataset and resolve its semantic columns.
    pub fn load(&mut self, dataset: SoilDataset) {
        self.resolved = ResolvedColumns::resolve(dataset.columns());
        self.dataset = Some(dataset);
    }

    /// The loaded dataset; `NoData` when absent or without records.
    pub fn dataset(&self) -> QueryResult<&SoilDataset> {
        self.dataset
            .as_ref()
            .filter(|ds| !ds.is_empty())
            .ok_or(QueryError::NoData)
    }

    pub fn resolved(&self) -> &ResolvedColumns {
        &self.resolved
    }

    fn column(&self, field: SemanticField) -> Option<&str> {
        self.resolved.get(field)
    }

    pub fn list_regions(&self) -> QueryResult<Vec<String>> {
        let all = Subset::all(self.dataset()?);
        Ok(list_distinct(&all, self.column(SemanticField::Region)))
    }

    pub fn list_subregions(&self, region: &str) -> QueryResult<Vec<String>> {
        let all = Subset::all(self.dataset()?);
        let in_region = filter_equals(&all, self.column(SemanticField::Region), region);
        Ok(list_distinct(&in_region, self.column(SemanticField::Subregion)))
    }

    pub fn list_categories(&self, region: &str, subregion: &str) -> QueryResult<Vec<String>> {
        let all = Subset::all(self.dataset()?);
        let in_region = filter_equals(&all, self.column(SemanticField::Region), region);
        let in_subregion =
            filter_equals(&in_region, self.column(SemanticField::Subregion), subregion);
        Ok(list_distinct(&in_subregion, self.column(SemanticField::Category)))
    }

    /// All records matching the three-level selection, before any limit.
    fn select(&self, region: &str, subregion: &str, category: &str) -> QueryResult<Subset<'_>> {
        let all = Subset::all(self.dataset()?);
        let matched = [
            (SemanticField::Region, region),
            (SemanticField::Subregion, subregion),
            (SemanticField::Category, category),
        ]
        .into_iter()
        .fold(all, |subset, (field, value)| {
            filter_equals(&subset, self.column(field), value)
        });

        if matched.is_empty() {
            log::debug!("No records for {region} / {subregion} / {category}");
            return Err(QueryError::NoMatch {
                region: region.to_string(),
                subregion: subregion.to_string(),
                category: category.to_string(),
            });
        }
        Ok(matched)
    }

    /// Number of records matching the selection.
    pub fn count_matches(&self, region: &str, subregion: &str, category: &str) -> QueryResult<usize> {
        Ok(self.select(region, subregion, category)?.len())
    }

    /// Matching records in table order, capped at `limit` (`None` = no cap).
    pub fn query_records(
        &self,
        region: &str,
        subregion: &str,
        category: &str,
        limit: Option<usize>,
    ) -> QueryResult<Subset<'_>> {
        Ok(self.select(region, subregion, category)?.truncate(limit))
    }

    /// Nutrient medians and terrain label over the capped selection.
    pub fn query_medians(
        &self,
        region: &str,
        subregion: &str,
        category: &str,
        limit: Option<usize>,
    ) -> QueryResult<MedianReport> {
        let records = self.query_records(region, subregion, category, limit)?;
        let report = MedianReport {
            medians: compute_medians(&records, &self.resolved),
            topology: resolve_topology(&records, &self.resolved),
            rows_used: records.len(),
        };
        log::info!(
            "Query {region} / {subregion} / {category}: {} records, medians {:?}",
            report.rows_used,
            report.medians
        );
        Ok(report)
    }
}

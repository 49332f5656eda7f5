use crate::color::TerrainColors;
use crate::data::aggregate::{Nutrient, try_parse_number};
use crate::data::filter::Subset;
use crate::data::model::SoilDataset;
use crate::data::query::{MedianReport, QueryEngine, QueryResult};
use crate::data::resolver::SemanticField;

// ---------------------------------------------------------------------------
// Selection: region → subregion → category, plus the record limit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub category: Option<String>,
}

impl Selection {
    /// All three levels, once every one is chosen.
    pub fn complete(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.region.as_deref()?,
            self.subregion.as_deref()?,
            self.category.as_deref()?,
        ))
    }
}

/// One plotted value.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSample {
    /// Position of the record within the outcome, starting at 0.
    pub position: usize,
    pub value: f64,
    pub terrain: String,
}

/// A finished query, kept until the selection changes.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub report: MedianReport,
    /// Row indices of the records the report was computed over.
    pub rows: Vec<usize>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Query layer over the loaded dataset (empty until user loads a file).
    pub engine: QueryEngine,

    pub selection: Selection,

    /// Choices for each selection level, refreshed as upper levels change.
    pub regions: Vec<String>,
    pub subregions: Vec<String>,
    pub categories: Vec<String>,

    /// Records matching the complete selection.
    pub available: usize,

    /// How many of the matching records to use; `None` means all of them.
    pub limit: Option<usize>,

    pub outcome: Option<QueryOutcome>,

    /// Nutrient shown in the plot.
    pub plot_nutrient: Nutrient,

    /// Colours for the terrain labels of the current outcome.
    pub terrain_colors: Option<TerrainColors>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Ingest a newly loaded dataset and reset the selection.
    pub fn set_dataset(&mut self, dataset: SoilDataset) {
        self.engine.load(dataset);
        self.selection = Selection::default();
        self.subregions.clear();
        self.categories.clear();
        self.clear_outcome();
        self.regions = self.report(self.engine.list_regions()).unwrap_or_default();

        for field in [SemanticField::Region, SemanticField::Subregion, SemanticField::Category] {
            if self.engine.resolved().get(field).is_none() {
                self.status_message = Some(format!("No {field} column found in this file"));
            }
        }
    }

    pub fn dataset(&self) -> Option<&SoilDataset> {
        self.engine.dataset().ok()
    }

    /// Choose a region; clears the lower levels.
    pub fn select_region(&mut self, region: String) {
        self.clear_outcome();
        self.subregions = self
            .report(self.engine.list_subregions(&region))
            .unwrap_or_default();
        self.selection = Selection {
            region: Some(region),
            ..Selection::default()
        };
        self.categories.clear();
    }

    /// Choose a subregion within the current region; clears the category.
    pub fn select_subregion(&mut self, subregion: String) {
        let Some(region) = self.selection.region.clone() else {
            return;
        };
        self.clear_outcome();
        self.categories = self
            .report(self.engine.list_categories(&region, &subregion))
            .unwrap_or_default();
        self.selection.subregion = Some(subregion);
        self.selection.category = None;
    }

    /// Choose a category and count the matching records.
    pub fn select_category(&mut self, category: String) {
        self.selection.category = Some(category);
        self.clear_outcome();
        let count = match self.selection.complete() {
            Some((region, subregion, category)) => {
                self.engine.count_matches(region, subregion, category)
            }
            None => return,
        };
        self.available = self.report(count).unwrap_or(0);
        self.limit = None;
    }

    /// Compute medians over the first `limit` matching records.
    pub fn run_query(&mut self) {
        let Some((region, subregion, category)) = self.selection.complete() else {
            self.status_message = Some("Choose a region, subregion and category first".into());
            return;
        };

        let result = self
            .engine
            .query_medians(region, subregion, category, self.limit)
            .and_then(|report| {
                let records = self
                    .engine
                    .query_records(region, subregion, category, self.limit)?;
                Ok((report, records.indices().to_vec()))
            });

        if let Some((report, rows)) = self.report(result) {
            self.status_message = None;
            self.outcome = Some(QueryOutcome { report, rows });
            self.rebuild_terrain_colors();
        }
    }

    /// The records behind the current outcome.
    pub fn outcome_records(&self) -> Option<Subset<'_>> {
        let outcome = self.outcome.as_ref()?;
        let dataset = self.dataset()?;
        Some(Subset::from_indices(dataset, outcome.rows.clone()))
    }

    /// Parsed values of `nutrient` across the outcome records, with each
    /// record's position and terrain label. Unparseable cells are left out.
    pub fn plot_samples(&self, nutrient: Nutrient) -> Vec<PlotSample> {
        let (Some(records), Some(column)) = (
            self.outcome_records(),
            self.engine.resolved().get(nutrient.field()),
        ) else {
            return Vec::new();
        };
        let terrain = self.terrain_labels();
        records
            .column_values(column)
            .into_iter()
            .enumerate()
            .filter_map(|(position, cell)| {
                Some(PlotSample {
                    position,
                    value: try_parse_number(cell)?,
                    terrain: terrain.get(position).cloned().unwrap_or_default(),
                })
            })
            .collect()
    }

    fn rebuild_terrain_colors(&mut self) {
        let labels = self.terrain_labels();
        self.terrain_colors = Some(TerrainColors::new(labels.iter().map(String::as_str)));
    }

    /// Terrain label of each outcome record, "" where unavailable.
    pub fn terrain_labels(&self) -> Vec<String> {
        let (Some(records), Some(column)) = (
            self.outcome_records(),
            self.engine.resolved().get(SemanticField::Topology),
        ) else {
            return Vec::new();
        };
        records
            .column_values(column)
            .into_iter()
            .map(|cell| cell.as_text().unwrap_or_default().trim().to_string())
            .collect()
    }

    fn clear_outcome(&mut self) {
        self.status_message = None;
        self.outcome = None;
        self.terrain_colors = None;
        self.available = 0;
    }

    /// Record an error in the status line and log it.
    fn report<T>(&mut self, result: QueryResult<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("{e}");
                self.status_message = Some(e.to_string());
                None
            }
        }
    }
}

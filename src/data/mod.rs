/// Data layer: core types, loading, filtering, column discovery and medians.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode file → SoilDataset (normalized headers)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ resolver  │  header names → ResolvedColumns (region, pH, …)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  region → subregion → category → Subset
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  Subset → medians + topology
///   └───────────┘
/// ```
///
/// `query::QueryEngine` ties the stages together for the UI.

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod query;
pub mod resolver;

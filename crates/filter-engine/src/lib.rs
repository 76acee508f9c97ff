//! Filtering of in-memory feature attribute datasets.
//!
//! [`FilterEngine::get_filtered_data`] narrows the records of a set of
//! layers by map extent (through a [`SpatialQueryService`]) and by free-text
//! search (through the [`query`] language), then shows or hides the layers'
//! map graphics to match the surviving records.

pub mod bundle;
pub mod engine;
pub mod error;
pub mod query;
pub mod search;
pub mod spatial;
pub mod visibility;

pub use bundle::FeatureSetBundle;
pub use engine::{FilterEngine, FilterOptions, FilteredData};
pub use error::QueryError;
pub use query::{Query, QueryContext, QueryOutput};
pub use spatial::{RestSpatialQuery, SpatialQueryService};
pub use visibility::VisibilitySummary;

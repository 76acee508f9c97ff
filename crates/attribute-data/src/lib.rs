//! Feature attribute data.
//!
//! Downloads the complete attribute table of a feature layer from a map
//! service that pages its results, and keeps the result as an in-memory
//! [`LayerDataset`] indexed by object id.
//!
//! # Architecture
//!
//! - [`FeatureService`] is the remote collaborator (metadata + page queries);
//!   [`RestFeatureService`] talks to an ArcGIS REST style endpoint.
//! - [`AttributeLoader`] runs the paging protocol and installs the finished
//!   dataset into a [`DatasetStore`], announcing the outcome on an
//!   [`map_common::EventBus`].
//! - The store is an explicit session object shared by the loader and the
//!   filter engine.

pub mod dataset;
pub mod error;
pub mod loader;
pub mod rest;
pub mod service;
pub mod store;

// Re-exports
pub use dataset::{FeatureRecord, LayerDataset};
pub use error::{LoadError, Result};
pub use loader::{AttributeLoader, INITIAL_MAX_ID};
pub use rest::{HttpConfig, RestClient, RestFeatureService};
pub use service::{
    parse_metadata, parse_query_response, FeatureService, FieldInfo, PageQuery, ServiceMetadata,
    OBJECT_ID_FIELD_TYPE,
};
pub use store::DatasetStore;

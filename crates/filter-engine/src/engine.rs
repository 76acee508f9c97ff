//! The filter pass: spatial stage, projection, text search, visibility.

use std::collections::HashMap;
use std::sync::Arc;

use attribute_data::{DatasetStore, FeatureRecord, LayerDataset};
use futures::future::join_all;
use map_common::{Extent, GridMode, LayerId, MapLayer};
use metrics::{counter, histogram};
use tracing::{debug, info, instrument, warn};

use crate::bundle::FeatureSetBundle;
use crate::error::QueryError;
use crate::search;
use crate::spatial::SpatialQueryService;
use crate::visibility;

/// What to filter by.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    /// Keep only features intersecting this extent; `None` keeps everything.
    pub extent: Option<Extent>,
    pub grid_mode: GridMode,
    pub text_search: Option<String>,
    /// Search only the fields the active grid shows.
    pub visible_attribs_only: bool,
}

impl FilterOptions {
    /// The search text, if there is anything to search for.
    pub fn search_text(&self) -> Option<&str> {
        self.text_search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Filtered candidates per layer.
pub type FilteredData = HashMap<LayerId, Vec<Arc<FeatureRecord>>>;

/// Filters stored attribute datasets and keeps graphic visibility in step.
#[derive(Clone)]
pub struct FilterEngine {
    store: DatasetStore,
    spatial: Arc<dyn SpatialQueryService>,
}

impl FilterEngine {
    pub fn new(store: DatasetStore, spatial: Arc<dyn SpatialQueryService>) -> Self {
        Self { store, spatial }
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Run one filter pass over `layers`.
    ///
    /// A layer whose spatial query or text search fails, or whose attribute
    /// data is not loaded, is left out of the result; the other layers are
    /// unaffected.
    #[instrument(skip(self, layers, options), fields(layers = layers.len(), mode = ?options.grid_mode))]
    pub async fn get_filtered_data(
        &self,
        layers: &[MapLayer],
        options: &FilterOptions,
    ) -> FilteredData {
        counter!("filter_passes_total").increment(1);

        let bundles = self.spatial_stage(layers, options.extent.as_ref()).await;

        let mut result = FilteredData::with_capacity(bundles.len());
        for (layer, bundle) in bundles {
            let Some(dataset) = self.store.get(&layer.id).await else {
                debug!(layer = %layer.id, "Attribute data not loaded, skipping layer");
                continue;
            };

            match filter_layer(layer, &bundle, &dataset, options) {
                Ok(candidates) => {
                    histogram!("filter_candidates_per_layer").record(candidates.len() as f64);
                    result.insert(layer.id.clone(), candidates);
                }
                Err(e) => {
                    counter!("filter_layer_failures_total").increment(1);
                    warn!(layer = %layer.id, error = %e, "Filtering failed, layer left out");
                }
            }
        }

        info!(
            layers = result.len(),
            records = result.values().map(Vec::len).sum::<usize>(),
            "Filter pass complete"
        );
        result
    }

    /// One bundle per layer: spatial queries fan out concurrently and all of
    /// them settle before any result is used.
    async fn spatial_stage<'a>(
        &self,
        layers: &'a [MapLayer],
        extent: Option<&Extent>,
    ) -> Vec<(&'a MapLayer, FeatureSetBundle)> {
        let Some(extent) = extent else {
            return layers
                .iter()
                .map(|layer| {
                    (
                        layer,
                        FeatureSetBundle::Raw {
                            layer: layer.id.clone(),
                        },
                    )
                })
                .collect();
        };

        let queries = layers.iter().map(|layer| async move {
            (layer, self.spatial.query_extent(layer, extent).await)
        });

        join_all(queries)
            .await
            .into_iter()
            .filter_map(|(layer, outcome)| match outcome {
                Ok(graphics) => Some((
                    layer,
                    FeatureSetBundle::Features {
                        layer: layer.id.clone(),
                        graphics,
                    },
                )),
                Err(e) => {
                    counter!("filter_spatial_failures_total").increment(1);
                    warn!(layer = %layer.id, error = %e, "Spatial query failed, layer left out");
                    None
                }
            })
            .collect()
    }
}

/// Projection, text search and, in summary mode, visibility for one layer.
fn filter_layer(
    layer: &MapLayer,
    bundle: &FeatureSetBundle,
    dataset: &LayerDataset,
    options: &FilterOptions,
) -> Result<Vec<Arc<FeatureRecord>>, QueryError> {
    let mut candidates = bundle.project(dataset);

    if let Some(text) = options.search_text() {
        candidates = search::apply(
            layer,
            options.grid_mode,
            options.visible_attribs_only,
            text,
            candidates,
        )?;
    }

    if options.grid_mode == GridMode::Summary {
        if let Some(summary) = visibility::reconcile(bundle, dataset.id_field(), &candidates)? {
            histogram!("filter_graphics_visible_per_layer").record(summary.visible as f64);
            histogram!("filter_graphics_hidden_per_layer").record(summary.hidden as f64);
        }
    }

    Ok(candidates)
}

//! Spatial stage output: what each layer contributes to a filter pass.

use std::sync::Arc;

use attribute_data::{FeatureRecord, LayerDataset};
use map_common::{Graphic, LayerId};
use tracing::trace;

/// Per-layer result of the spatial stage.
#[derive(Debug, Clone)]
pub enum FeatureSetBundle {
    /// The live graphics found inside the requested extent.
    Features {
        layer: LayerId,
        graphics: Vec<Arc<Graphic>>,
    },
    /// No extent: every stored record of the layer is a candidate.
    Raw { layer: LayerId },
}

impl FeatureSetBundle {
    pub fn layer(&self) -> &LayerId {
        match self {
            FeatureSetBundle::Features { layer, .. } | FeatureSetBundle::Raw { layer } => layer,
        }
    }

    /// Turn the bundle into candidate records from the layer's dataset.
    ///
    /// Graphics are matched to records through the dataset index by their
    /// object id; graphics with no stored record are dropped. The raw variant
    /// yields a copy of the whole record sequence.
    pub fn project(&self, dataset: &LayerDataset) -> Vec<Arc<FeatureRecord>> {
        match self {
            FeatureSetBundle::Raw { .. } => dataset.snapshot(),
            FeatureSetBundle::Features { layer, graphics } => {
                let Some(id_field) = dataset.id_field() else {
                    trace!(layer = %layer, "No id field, graphics cannot be matched to records");
                    return Vec::new();
                };
                graphics
                    .iter()
                    .filter_map(|g| g.attribute(id_field))
                    .filter_map(|id| dataset.get(&id.key_string()).cloned())
                    .collect()
            }
        }
    }
}

//! Session-scoped store of per-layer datasets.

use std::collections::HashMap;
use std::sync::Arc;

use map_common::LayerId;
use tokio::sync::RwLock;

use crate::dataset::LayerDataset;

/// Per-layer datasets for one map session.
///
/// Cloning shares the same underlying map. Readers get an `Arc` snapshot of
/// a dataset; installing a new dataset never disturbs a snapshot already
/// handed out.
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    datasets: Arc<RwLock<HashMap<LayerId, Arc<LayerDataset>>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, layer: &LayerId) -> Option<Arc<LayerDataset>> {
        self.datasets.read().await.get(layer).cloned()
    }

    pub async fn contains(&self, layer: &LayerId) -> bool {
        self.datasets.read().await.contains_key(layer)
    }

    /// Install a dataset, replacing any previous one for the same layer.
    pub async fn insert(&self, dataset: LayerDataset) -> Option<Arc<LayerDataset>> {
        let layer = dataset.layer_id().clone();
        self.datasets.write().await.insert(layer, Arc::new(dataset))
    }

    pub async fn remove(&self, layer: &LayerId) -> Option<Arc<LayerDataset>> {
        self.datasets.write().await.remove(layer)
    }

    pub async fn layer_ids(&self) -> Vec<LayerId> {
        let mut ids: Vec<LayerId> = self.datasets.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.datasets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.datasets.read().await.is_empty()
    }
}

//! A map session: one store, one event bus, the loader and the filter engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use attribute_data::{AttributeLoader, DatasetStore, RestClient, RestFeatureService};
use filter_engine::{FilterEngine, FilterOptions, RestSpatialQuery};
use futures::future::join_all;
use map_common::{AttributeEvent, Attributes, EventBus, LayerId, MapLayer};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::SessionConfig;

/// Outcome of loading one layer.
#[derive(Debug, Serialize, PartialEq)]
pub struct LoadReport {
    pub layer: LayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoadReport {
    fn new(layer: &LayerId, outcome: attribute_data::Result<usize>) -> Self {
        match outcome {
            Ok(records) => Self {
                layer: layer.clone(),
                records: Some(records),
                error: None,
            },
            Err(e) => Self {
                layer: layer.clone(),
                records: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Filtered records of one layer.
#[derive(Debug, Serialize)]
pub struct LayerResult {
    pub count: usize,
    /// Graphics left visible on the map, when an extent was queried
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_graphics: Option<usize>,
    pub records: Vec<Attributes>,
}

pub struct Session {
    events: EventBus,
    loader: AttributeLoader,
    spatial: Arc<RestSpatialQuery>,
    engine: FilterEngine,
}

impl Session {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let client = RestClient::new(&config.http)?;
        let store = DatasetStore::new();
        let events = EventBus::new(config.event_capacity);

        let service = Arc::new(RestFeatureService::with_client(client.clone()));
        let loader = AttributeLoader::new(service, store.clone(), events.clone());
        let spatial = Arc::new(RestSpatialQuery::new(client, store.clone()));
        let engine = FilterEngine::new(store, spatial.clone());

        Ok(Self {
            events,
            loader,
            spatial,
            engine,
        })
    }

    /// Log every notification until the bus closes.
    pub fn spawn_event_logger(&self) -> JoinHandle<()> {
        let mut rx = self.events.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(AttributeEvent::DataChanged { layer, records }) => {
                        info!(layer = %layer, records, "Attribute data changed");
                    }
                    Ok(AttributeEvent::LoadFailed { layer, reason }) => {
                        warn!(layer = %layer, reason = %reason, "Attribute load failed");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event logger fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Load every layer; layers load concurrently, each one page at a time.
    pub async fn load_all(&self, layers: &[MapLayer]) -> Vec<LoadReport> {
        let loads = layers.iter().map(|layer| async move {
            LoadReport::new(&layer.id, self.loader.load_layer(layer).await)
        });
        join_all(loads).await
    }

    pub async fn filter(
        &self,
        layers: &[MapLayer],
        options: &FilterOptions,
    ) -> BTreeMap<LayerId, LayerResult> {
        let filtered = self.engine.get_filtered_data(layers, options).await;

        let mut results = BTreeMap::new();
        for (layer, records) in filtered {
            let visible_graphics = match options.extent {
                Some(_) => Some(self.spatial.graphics_layer(&layer).await.visible_count().await),
                None => None,
            };
            results.insert(
                layer,
                LayerResult {
                    count: records.len(),
                    visible_graphics,
                    records: records.iter().map(|r| r.attributes().clone()).collect(),
                },
            );
        }
        results
    }
}

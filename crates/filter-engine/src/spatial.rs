//! Spatial query collaborator: which live graphics fall inside an extent.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use attribute_data::{DatasetStore, RestClient};
use map_common::{
    Attributes, Extent, Graphic, GraphicsLayer, LayerId, MapError, MapLayer, MapResult,
    ServiceErrorPayload,
};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Finds the graphics of a layer intersecting an extent.
#[async_trait]
pub trait SpatialQueryService: Send + Sync {
    async fn query_extent(&self, layer: &MapLayer, extent: &Extent) -> MapResult<Vec<Arc<Graphic>>>;
}

#[derive(Debug, Deserialize)]
struct ExtentFeature {
    #[serde(default)]
    attributes: Attributes,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtentResponse {
    Error {
        error: ServiceErrorPayload,
    },
    Features {
        #[serde(rename = "objectIdFieldName", default)]
        object_id_field: Option<String>,
        features: Vec<ExtentFeature>,
    },
}

/// Envelope-intersects queries against the feature service.
///
/// Results are interned per layer so each feature keeps a single graphic
/// handle across queries.
pub struct RestSpatialQuery {
    client: RestClient,
    store: DatasetStore,
    layers: RwLock<HashMap<LayerId, Arc<GraphicsLayer>>>,
}

impl RestSpatialQuery {
    pub fn new(client: RestClient, store: DatasetStore) -> Self {
        Self {
            client,
            store,
            layers: RwLock::new(HashMap::new()),
        }
    }

    /// The graphics drawn so far for a layer.
    pub async fn graphics_layer(&self, layer: &LayerId) -> Arc<GraphicsLayer> {
        if let Some(existing) = self.layers.read().await.get(layer) {
            return existing.clone();
        }
        self.layers
            .write()
            .await
            .entry(layer.clone())
            .or_insert_with(|| Arc::new(GraphicsLayer::new(layer.clone())))
            .clone()
    }

    async fn id_field_for(&self, layer: &LayerId, reported: Option<String>) -> Option<String> {
        match reported {
            Some(field) => Some(field),
            None => self
                .store
                .get(layer)
                .await
                .and_then(|ds| ds.id_field().map(str::to_string)),
        }
    }
}

/// Query parameters for an envelope-intersects query.
pub fn extent_params(extent: &Extent) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("geometry", extent.to_envelope_json().to_string()),
        ("geometryType", "esriGeometryEnvelope".to_string()),
        ("spatialRel", "esriSpatialRelIntersects".to_string()),
        ("outFields", "*".to_string()),
        ("returnGeometry", "false".to_string()),
    ];
    if let Some(wkid) = extent.wkid {
        params.push(("inSR", wkid.to_string()));
    }
    params
}

#[async_trait]
impl SpatialQueryService for RestSpatialQuery {
    #[instrument(skip(self, layer), fields(layer = %layer.id, extent = %extent))]
    async fn query_extent(&self, layer: &MapLayer, extent: &Extent) -> MapResult<Vec<Arc<Graphic>>> {
        let url = format!("{}/query", layer.endpoint());
        let body = self.client.get_json_text(&url, &extent_params(extent)).await?;

        let (reported_id_field, features) = match serde_json::from_str::<ExtentResponse>(&body)? {
            ExtentResponse::Error { error } => return Err(error.into()),
            ExtentResponse::Features {
                object_id_field,
                features,
            } => (object_id_field, features),
        };

        let id_field = self
            .id_field_for(&layer.id, reported_id_field)
            .await
            .ok_or_else(|| {
                MapError::Decode(format!("no object id field known for layer {}", layer.id))
            })?;

        let graphics_layer = self.graphics_layer(&layer.id).await;
        let mut graphics = Vec::with_capacity(features.len());
        for feature in features {
            let Some(key) = feature.attributes.get(&id_field).map(|v| v.key_string()) else {
                continue;
            };
            graphics.push(graphics_layer.intern(key, feature.attributes).await);
        }

        debug!(count = graphics.len(), "Graphics intersecting extent");
        Ok(graphics)
    }
}

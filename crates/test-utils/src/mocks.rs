//! Scripted collaborators standing in for remote services.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use attribute_data::{FeatureService, PageQuery, ServiceMetadata};
use filter_engine::SpatialQueryService;
use map_common::{Attributes, Extent, Graphic, LayerId, MapError, MapLayer, MapResult};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A feature service that replays a fixed script of responses.
///
/// Every page request pops the next scripted result; running past the end
/// of the script yields an empty page. Requested cursors are recorded.
#[derive(Default)]
pub struct ScriptedFeatureService {
    metadata: Mutex<Option<MapResult<ServiceMetadata>>>,
    pages: Mutex<VecDeque<MapResult<Vec<Attributes>>>>,
    requests: Mutex<Vec<PageQuery>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedFeatureService {
    pub fn new(metadata: ServiceMetadata) -> Self {
        Self {
            metadata: Mutex::new(Some(Ok(metadata))),
            ..Default::default()
        }
    }

    /// A service whose metadata request fails.
    pub fn failing_metadata(error: MapError) -> Self {
        Self {
            metadata: Mutex::new(Some(Err(error))),
            ..Default::default()
        }
    }

    pub fn with_page(self, rows: Vec<Attributes>) -> Self {
        lock(&self.pages).push_back(Ok(rows));
        self
    }

    pub fn with_pages(self, pages: impl IntoIterator<Item = Vec<Attributes>>) -> Self {
        lock(&self.pages).extend(pages.into_iter().map(Ok));
        self
    }

    pub fn with_failure(self, error: MapError) -> Self {
        lock(&self.pages).push_back(Err(error));
        self
    }

    /// Number of page requests received.
    pub fn page_requests(&self) -> usize {
        lock(&self.requests).len()
    }

    /// The `after_id` cursor of every page request, in order.
    pub fn cursors(&self) -> Vec<i64> {
        lock(&self.requests).iter().map(|q| q.after_id).collect()
    }

    /// Every URL a request was sent to, metadata included.
    pub fn urls(&self) -> Vec<String> {
        lock(&self.urls).clone()
    }
}

#[async_trait]
impl FeatureService for ScriptedFeatureService {
    async fn metadata(&self, url: &str) -> MapResult<ServiceMetadata> {
        lock(&self.urls).push(url.to_string());
        lock(&self.metadata)
            .clone()
            .unwrap_or_else(|| Ok(ServiceMetadata::default()))
    }

    async fn query_page(&self, url: &str, query: &PageQuery) -> MapResult<Vec<Attributes>> {
        lock(&self.urls).push(url.to_string());
        lock(&self.requests).push(query.clone());
        lock(&self.pages).pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// A spatial query service with fixed per-layer answers.
///
/// Layers without an answer fail as if the service were unreachable.
#[derive(Default)]
pub struct StaticSpatialQuery {
    answers: HashMap<LayerId, Vec<Arc<Graphic>>>,
    failing: HashMap<LayerId, String>,
    calls: Mutex<Vec<(LayerId, Extent)>>,
}

impl StaticSpatialQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_graphics(mut self, layer: &str, graphics: Vec<Arc<Graphic>>) -> Self {
        self.answers.insert(LayerId::new(layer), graphics);
        self
    }

    pub fn with_failure(mut self, layer: &str, message: &str) -> Self {
        self.failing.insert(LayerId::new(layer), message.to_string());
        self
    }

    /// Layers queried so far, in call order.
    pub fn queried_layers(&self) -> Vec<LayerId> {
        lock(&self.calls).iter().map(|(l, _)| l.clone()).collect()
    }
}

#[async_trait]
impl SpatialQueryService for StaticSpatialQuery {
    async fn query_extent(&self, layer: &MapLayer, extent: &Extent) -> MapResult<Vec<Arc<Graphic>>> {
        lock(&self.calls).push((layer.id.clone(), *extent));
        if let Some(message) = self.failing.get(&layer.id) {
            return Err(MapError::Transport {
                url: layer.endpoint(),
                message: message.clone(),
            });
        }
        self.answers
            .get(&layer.id)
            .cloned()
            .ok_or_else(|| MapError::LayerNotFound(layer.id.to_string()))
    }
}

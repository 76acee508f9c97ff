//! Attribute table loader.
//!
//! Pages through a layer's attribute table with an object-id cursor:
//!
//! 1. Ask for rows with id greater than the cursor (initially below every id).
//! 2. The first page fixes the page size when the metadata did not disclose it.
//! 3. A short page ends the download; a full page moves the cursor to the id
//!    of its last row and asks again; an empty page also ends it.
//!
//! Pages are requested one at a time. A failed page abandons everything
//! gathered so far for that load.

use std::sync::Arc;

use map_common::{AttributeEvent, Attributes, EventBus, LayerId, LayerKind, MapLayer};
use metrics::{counter, histogram};
use tracing::{debug, error, info, instrument, warn};

use crate::dataset::LayerDataset;
use crate::error::{LoadError, Result};
use crate::service::{FeatureService, PageQuery};
use crate::store::DatasetStore;

/// Cursor value below every valid object id.
pub const INITIAL_MAX_ID: i64 = -1;

/// Downloads attribute tables and installs them into the dataset store.
#[derive(Clone)]
pub struct AttributeLoader {
    service: Arc<dyn FeatureService>,
    store: DatasetStore,
    events: EventBus,
}

impl AttributeLoader {
    pub fn new(service: Arc<dyn FeatureService>, store: DatasetStore, events: EventBus) -> Self {
        Self {
            service,
            store,
            events,
        }
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Load a configured layer.
    pub async fn load_layer(&self, layer: &MapLayer) -> Result<usize> {
        self.load_attribute_data(&layer.id, &layer.url, layer.kind)
            .await
    }

    /// Download the full attribute table of a remote layer.
    ///
    /// On success the dataset replaces whatever the store held for the layer
    /// and `DataChanged` is published. On failure `LoadFailed` is published,
    /// the store is left as it was, and the error is returned as well.
    #[instrument(skip(self), fields(layer = %layer_id))]
    pub async fn load_attribute_data(
        &self,
        layer_id: &LayerId,
        layer_url: &str,
        layer_kind: LayerKind,
    ) -> Result<usize> {
        let url = layer_kind.resolve_url(layer_url);

        match self.fetch_dataset(layer_id, &url).await {
            Ok(dataset) => {
                let records = dataset.len();
                self.store.insert(dataset).await;
                counter!("attribute_records_loaded_total").increment(records as u64);
                info!(records, "Attribute data loaded");
                self.events.publish(AttributeEvent::DataChanged {
                    layer: layer_id.clone(),
                    records,
                });
                Ok(records)
            }
            Err(e) => {
                counter!("attribute_load_failures_total").increment(1);
                error!(error = %e, url = %url, "Attribute data load failed");
                self.events.publish(AttributeEvent::LoadFailed {
                    layer: layer_id.clone(),
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Wrap rows that are already resident (e.g. a file-backed layer).
    pub async fn extract_attribute_data(
        &self,
        layer_id: &LayerId,
        id_field: Option<String>,
        rows: Vec<Attributes>,
    ) -> usize {
        let dataset = LayerDataset::from_rows(layer_id.clone(), id_field, rows);
        let records = dataset.len();
        self.store.insert(dataset).await;
        debug!(layer = %layer_id, records, "Extracted resident attribute data");
        self.events.publish(AttributeEvent::DataChanged {
            layer: layer_id.clone(),
            records,
        });
        records
    }

    async fn fetch_dataset(&self, layer_id: &LayerId, url: &str) -> Result<LayerDataset> {
        let metadata = self.service.metadata(url).await?;

        let id_field = metadata.id_field().map(str::to_string);
        if id_field.is_none() {
            warn!(
                fields = metadata.fields.len(),
                "Layer metadata has no object id field"
            );
        }

        let mut dataset = LayerDataset::new(layer_id.clone(), id_field);
        let pages = self
            .load_batches(url, &mut dataset, metadata.max_record_count)
            .await?;
        histogram!("attribute_pages_per_load").record(pages as f64);
        Ok(dataset)
    }

    /// Run the paging protocol, appending each page to `dataset`.
    ///
    /// Returns the number of page requests issued.
    async fn load_batches(
        &self,
        url: &str,
        dataset: &mut LayerDataset,
        max_batch_size: Option<usize>,
    ) -> Result<usize> {
        let layer = dataset.layer_id().clone();
        let id_field = dataset
            .id_field()
            .ok_or_else(|| LoadError::MissingIdField(layer.clone()))?
            .to_string();

        let mut max_id = INITIAL_MAX_ID;
        let mut max_batch_size = max_batch_size;
        let mut requests = 0usize;

        loop {
            let query = PageQuery::new(id_field.as_str(), max_id);
            let batch = self.service.query_page(url, &query).await?;
            requests += 1;
            counter!("attribute_pages_fetched_total").increment(1);

            let count = batch.len();
            if count == 0 {
                debug!(requests, "Empty page, attribute table exhausted");
                break;
            }

            let page_size = *max_batch_size.get_or_insert(count);
            if count < page_size {
                dataset.append(batch);
                debug!(requests, count, page_size, "Short page, attribute table exhausted");
                break;
            }

            let next_id = cursor_after(&layer, &id_field, &batch)?;
            if next_id <= max_id {
                return Err(LoadError::CursorStalled {
                    layer,
                    cursor: max_id,
                });
            }

            dataset.append(batch);
            debug!(requests, count, cursor = next_id, "Full page, requesting next");
            max_id = next_id;
        }

        Ok(requests)
    }
}

/// Object id of the last row of a page.
fn cursor_after(layer: &LayerId, id_field: &str, batch: &[Attributes]) -> Result<i64> {
    let value = batch
        .last()
        .and_then(|row| row.get(id_field))
        .ok_or_else(|| LoadError::MissingObjectId {
            layer: layer.clone(),
            field: id_field.to_string(),
        })?;

    value.as_i64().ok_or_else(|| LoadError::InvalidObjectId {
        layer: layer.clone(),
        value: value.key_string(),
    })
}

//! In-memory attribute datasets.

use std::collections::HashMap;
use std::sync::Arc;

use map_common::{AttributeValue, Attributes, LayerId};
use tracing::trace;

/// One row of a layer's attribute table.
///
/// A record points back at its dataset through the owning layer's id
/// rather than a reference, so ownership stays one-directional: the dataset
/// owns its records.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    layer: LayerId,
    attributes: Attributes,
}

impl FeatureRecord {
    pub(crate) fn new(layer: LayerId, attributes: Attributes) -> Self {
        Self { layer, attributes }
    }

    /// The layer whose dataset owns this record.
    pub fn layer(&self) -> &LayerId {
        &self.layer
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, field: &str) -> Option<&AttributeValue> {
        self.attributes.get(field)
    }
}

/// The attribute table of one feature layer.
///
/// `features` keeps arrival order. `index` maps the stringified object id
/// of every record to its position in `features`.
#[derive(Debug, Clone)]
pub struct LayerDataset {
    layer_id: LayerId,
    id_field: Option<String>,
    features: Vec<Arc<FeatureRecord>>,
    index: HashMap<String, usize>,
}

impl LayerDataset {
    /// Create an empty dataset.
    pub fn new(layer_id: LayerId, id_field: Option<String>) -> Self {
        Self {
            layer_id,
            id_field,
            features: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a dataset from rows that are already resident.
    pub fn from_rows(layer_id: LayerId, id_field: Option<String>, rows: Vec<Attributes>) -> Self {
        let mut dataset = Self::new(layer_id, id_field);
        dataset.append(rows);
        dataset
    }

    pub fn layer_id(&self) -> &LayerId {
        &self.layer_id
    }

    pub fn id_field(&self) -> Option<&str> {
        self.id_field.as_deref()
    }

    pub fn features(&self) -> &[Arc<FeatureRecord>] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Append a batch of rows, extending the index for the new rows only.
    ///
    /// Rows without an object id (or every row, when the id field is unset)
    /// are stored but cannot be looked up by id.
    pub fn append(&mut self, rows: Vec<Attributes>) -> usize {
        let start = self.features.len();
        self.features.reserve(rows.len());

        for (offset, attributes) in rows.into_iter().enumerate() {
            let key = self
                .id_field
                .as_deref()
                .and_then(|field| attributes.get(field))
                .map(AttributeValue::key_string);

            match key {
                Some(key) => {
                    self.index.insert(key, start + offset);
                }
                None => trace!(layer = %self.layer_id, position = start + offset, "Record has no object id"),
            }

            self.features
                .push(Arc::new(FeatureRecord::new(self.layer_id.clone(), attributes)));
        }

        self.features.len() - start
    }

    /// Position of the record with the given stringified object id.
    pub fn position(&self, id_key: &str) -> Option<usize> {
        self.index.get(id_key).copied()
    }

    /// Look up a record by stringified object id.
    pub fn get(&self, id_key: &str) -> Option<&Arc<FeatureRecord>> {
        self.position(id_key).and_then(|i| self.features.get(i))
    }

    /// Look up a record by object id value.
    pub fn get_by_value(&self, id: &AttributeValue) -> Option<&Arc<FeatureRecord>> {
        self.get(&id.key_string())
    }

    /// The object id of a record in this dataset.
    pub fn record_id<'a>(&self, record: &'a FeatureRecord) -> Option<&'a AttributeValue> {
        self.id_field.as_deref().and_then(|f| record.attribute(f))
    }

    /// Shallow copy of the record sequence; the dataset itself is untouched
    /// by whatever the caller does with the copy.
    pub fn snapshot(&self) -> Vec<Arc<FeatureRecord>> {
        self.features.clone()
    }

    /// Check that every id-bearing record is indexed at its own position.
    pub fn index_is_consistent(&self) -> bool {
        self.features.iter().enumerate().all(|(i, record)| {
            match self.record_id(record) {
                Some(id) => self.index.get(&id.key_string()) == Some(&i),
                None => true,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(oid: i64, name: &str) -> Attributes {
        let mut a = Attributes::new();
        a.insert("OID".to_string(), AttributeValue::Int(oid));
        a.insert("name".to_string(), AttributeValue::from(name));
        a
    }

    #[test]
    fn test_append_extends_index() {
        let mut ds = LayerDataset::new(LayerId::new("parcels"), Some("OID".to_string()));
        assert_eq!(ds.append(vec![row(10, "a"), row(3, "b")]), 2);
        assert_eq!(ds.append(vec![row(7, "c")]), 1);

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.position("10"), Some(0));
        assert_eq!(ds.position("3"), Some(1));
        assert_eq!(ds.position("7"), Some(2));
        assert!(ds.index_is_consistent());
    }

    #[test]
    fn test_records_point_back_at_layer() {
        let ds = LayerDataset::from_rows(
            LayerId::new("parcels"),
            Some("OID".to_string()),
            vec![row(1, "a")],
        );
        let record = ds.get("1").unwrap();
        assert_eq!(record.layer(), &LayerId::new("parcels"));
        assert_eq!(ds.record_id(record), Some(&AttributeValue::Int(1)));
    }

    #[test]
    fn test_lookup_by_float_id() {
        let ds = LayerDataset::from_rows(
            LayerId::new("parcels"),
            Some("OID".to_string()),
            vec![row(5, "a")],
        );
        assert!(ds.get_by_value(&AttributeValue::Float(5.0)).is_some());
        assert!(ds.get_by_value(&AttributeValue::Int(6)).is_none());
    }

    #[test]
    fn test_unset_id_field_stores_without_index() {
        let ds = LayerDataset::from_rows(LayerId::new("parcels"), None, vec![row(1, "a")]);
        assert_eq!(ds.len(), 1);
        assert!(ds.get("1").is_none());
        assert!(ds.index_is_consistent());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let ds = LayerDataset::from_rows(
            LayerId::new("parcels"),
            Some("OID".to_string()),
            vec![row(1, "a"), row(2, "b")],
        );
        let mut copy = ds.snapshot();
        copy.clear();
        assert_eq!(ds.len(), 2);
    }
}

//! Live map graphic handles.
//!
//! A [`Graphic`] stands in for the on-map drawing of one feature. The filter
//! engine only needs two things from it: the attribute values (to find the
//! matching record) and a visibility switch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{AttributeValue, Attributes, LayerId};

/// A drawn feature on the map.
#[derive(Debug)]
pub struct Graphic {
    layer: LayerId,
    attributes: Attributes,
    visible: AtomicBool,
}

impl Graphic {
    /// Create a visible graphic.
    pub fn new(layer: LayerId, attributes: Attributes) -> Self {
        Self {
            layer,
            attributes,
            visible: AtomicBool::new(true),
        }
    }

    pub fn layer(&self) -> &LayerId {
        &self.layer
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, field: &str) -> Option<&AttributeValue> {
        self.attributes.get(field)
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }
}

/// The graphics drawn for one layer, one handle per object id.
///
/// Interning keeps handles stable: asking for the same feature twice yields
/// the same `Arc<Graphic>`, so visibility set by one filter pass is what the
/// next pass sees.
#[derive(Debug)]
pub struct GraphicsLayer {
    layer: LayerId,
    graphics: RwLock<HashMap<String, Arc<Graphic>>>,
}

impl GraphicsLayer {
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            graphics: RwLock::new(HashMap::new()),
        }
    }

    pub fn layer(&self) -> &LayerId {
        &self.layer
    }

    /// Return the handle for `key`, creating it from `attributes` if absent.
    pub async fn intern(&self, key: String, attributes: Attributes) -> Arc<Graphic> {
        if let Some(existing) = self.graphics.read().await.get(&key) {
            return existing.clone();
        }

        let mut graphics = self.graphics.write().await;
        graphics
            .entry(key)
            .or_insert_with(|| Arc::new(Graphic::new(self.layer.clone(), attributes)))
            .clone()
    }

    pub async fn get(&self, key: &str) -> Option<Arc<Graphic>> {
        self.graphics.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.graphics.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.graphics.read().await.is_empty()
    }

    /// Number of graphics currently shown.
    pub async fn visible_count(&self) -> usize {
        self.graphics
            .read()
            .await
            .values()
            .filter(|g| g.is_visible())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(oid: i64) -> Attributes {
        let mut a = Attributes::new();
        a.insert("OID".to_string(), AttributeValue::Int(oid));
        a
    }

    #[test]
    fn test_visibility_toggle() {
        let g = Graphic::new(LayerId::new("parcels"), attrs(1));
        assert!(g.is_visible());
        g.set_visible(false);
        assert!(!g.is_visible());
        assert_eq!(g.attribute("OID"), Some(&AttributeValue::Int(1)));
    }

    #[test]
    fn test_intern_returns_same_handle() {
        tokio_test::block_on(async {
            let layer = GraphicsLayer::new(LayerId::new("parcels"));
            let a = layer.intern("1".to_string(), attrs(1)).await;
            let b = layer.intern("1".to_string(), attrs(1)).await;
            let c = layer.intern("2".to_string(), attrs(2)).await;

            assert!(Arc::ptr_eq(&a, &b));
            assert!(!Arc::ptr_eq(&a, &c));
            assert_eq!(layer.len().await, 2);

            a.set_visible(false);
            assert_eq!(layer.visible_count().await, 1);
        });
    }
}

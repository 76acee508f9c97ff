//! Common test fixtures for attribute loading and filtering tests.

use std::sync::Arc;

use attribute_data::{FieldInfo, LayerDataset, ServiceMetadata, OBJECT_ID_FIELD_TYPE};
use map_common::{
    AttributeValue, Attributes, ColumnKind, Extent, Graphic, GridColumn, GridConfig, LayerId,
    MapLayer,
};

/// Object id field used throughout the fixtures.
pub const OID: &str = "OID";

/// Common extents for testing.
pub mod extent {
    use super::Extent;

    /// Whole-world geographic extent
    pub fn world() -> Extent {
        Extent::new(-180.0, -90.0, 180.0, 90.0).with_wkid(4326)
    }

    /// A small web-mercator window
    pub fn small_window() -> Extent {
        Extent::new(-11_150_000.0, 4_850_000.0, -11_100_000.0, 4_900_000.0).with_wkid(3857)
    }
}

/// Build an attribute map from field/value pairs.
pub fn attrs<I, K, V>(pairs: I) -> Attributes
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AttributeValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A row with just an object id.
pub fn id_row(oid: i64) -> Attributes {
    attrs([(OID, oid)])
}

/// A row with an object id and a `name`.
pub fn named_row(oid: i64, name: &str) -> Attributes {
    attrs([(OID, AttributeValue::Int(oid)), ("name", AttributeValue::from(name))])
}

/// Rows `first..first + count` with ascending object ids.
pub fn id_rows(first: i64, count: usize) -> Vec<Attributes> {
    (first..first + count as i64).map(id_row).collect()
}

/// Rows carrying `name`, `code` and `detail` text fields.
pub fn site_rows() -> Vec<Attributes> {
    [
        (1, "Alpha", "A-100", "north ridge"),
        (2, "Beta", "B-200", "alpha valley"),
        (3, "Gamma", "ALPHA-3", "south slope"),
        (4, "Delta", "D-400", "east basin"),
    ]
    .into_iter()
    .map(|(oid, name, code, detail)| {
        attrs([
            (OID, AttributeValue::Int(oid)),
            ("name", AttributeValue::from(name)),
            ("code", AttributeValue::from(code)),
            ("detail", AttributeValue::from(detail)),
        ])
    })
    .collect()
}

/// A dataset keyed on [`OID`].
pub fn dataset(layer: &str, rows: Vec<Attributes>) -> LayerDataset {
    LayerDataset::from_rows(LayerId::new(layer), Some(OID.to_string()), rows)
}

/// The two-record `Alpha`/`Beta` dataset.
pub fn alpha_beta_dataset(layer: &str) -> LayerDataset {
    dataset(layer, vec![named_row(1, "Alpha"), named_row(2, "Beta")])
}

/// A feature layer with no grid configuration.
pub fn feature_layer(id: &str) -> MapLayer {
    MapLayer::new(id, format!("https://services.test/arcgis/rest/services/{}/FeatureServer/0", id))
}

/// A feature layer whose grids show `name` (summary) and
/// `name`, `code`, `detail` (full), with icon and button columns mixed in.
pub fn site_layer(id: &str) -> MapLayer {
    feature_layer(id).with_grid(GridConfig {
        name_field: Some("name".to_string()),
        columns: vec![
            GridColumn::with_kind("zoom", ColumnKind::Icon),
            GridColumn::field("name"),
            GridColumn::with_kind("details", ColumnKind::Button),
            GridColumn::field("code"),
            GridColumn::field("detail"),
        ],
    })
}

/// Fresh graphic handles for `ids`, in order.
pub fn graphics(layer: &str, ids: &[i64]) -> Vec<Arc<Graphic>> {
    ids.iter()
        .map(|id| Arc::new(Graphic::new(LayerId::new(layer), id_row(*id))))
        .collect()
}

/// Metadata with an [`OID`] field and optional page size.
pub fn oid_metadata(max_record_count: Option<usize>) -> ServiceMetadata {
    ServiceMetadata {
        name: Some("Test Layer".to_string()),
        fields: vec![
            FieldInfo {
                name: OID.to_string(),
                field_type: OBJECT_ID_FIELD_TYPE.to_string(),
                alias: None,
            },
            FieldInfo {
                name: "name".to_string(),
                field_type: "esriFieldTypeString".to_string(),
                alias: Some("Name".to_string()),
            },
        ],
        max_record_count,
    }
}

/// Metadata without any object id field.
pub fn metadata_without_oid() -> ServiceMetadata {
    ServiceMetadata {
        name: Some("No OID".to_string()),
        fields: vec![FieldInfo {
            name: "name".to_string(),
            field_type: "esriFieldTypeString".to_string(),
            alias: None,
        }],
        max_record_count: None,
    }
}

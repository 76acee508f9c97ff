//! Feature service collaborator contract and response parsing.

use async_trait::async_trait;
use map_common::{Attributes, MapError, MapResult, ServiceErrorPayload};
use serde::Deserialize;

/// Field type tag marking the object id field.
pub const OBJECT_ID_FIELD_TYPE: &str = "esriFieldTypeOID";

/// Remote feature service that serves layer metadata and attribute pages.
#[async_trait]
pub trait FeatureService: Send + Sync {
    /// Fetch layer metadata (`f=json`): field list and optional page size.
    async fn metadata(&self, url: &str) -> MapResult<ServiceMetadata>;

    /// Fetch one page of attribute rows with object id above the cursor.
    ///
    /// Every field is requested and no geometry.
    async fn query_page(&self, url: &str, query: &PageQuery) -> MapResult<Vec<Attributes>>;
}

/// A field descriptor from layer metadata.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl FieldInfo {
    pub fn is_object_id(&self) -> bool {
        self.field_type == OBJECT_ID_FIELD_TYPE
    }
}

/// Layer metadata as returned by `{layer}?f=json`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    /// Page size cap, when the service discloses it.
    #[serde(default)]
    pub max_record_count: Option<usize>,
}

impl ServiceMetadata {
    /// The object id field, found by its type tag.
    pub fn id_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.is_object_id())
            .map(|f| f.name.as_str())
    }
}

/// Cursor query for the next page of a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub id_field: String,
    /// Largest object id already retrieved.
    pub after_id: i64,
}

impl PageQuery {
    pub fn new(id_field: impl Into<String>, after_id: i64) -> Self {
        Self {
            id_field: id_field.into(),
            after_id,
        }
    }

    /// The `where` clause selecting rows past the cursor.
    pub fn where_clause(&self) -> String {
        format!("{} > {}", self.id_field, self.after_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MetadataEnvelope {
    Error { error: ServiceErrorPayload },
    Metadata(ServiceMetadata),
}

#[derive(Debug, Deserialize)]
struct QueryFeature {
    #[serde(default)]
    attributes: Attributes,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueryEnvelope {
    Error { error: ServiceErrorPayload },
    Features { features: Vec<QueryFeature> },
}

/// Parse a metadata response body.
pub fn parse_metadata(body: &str) -> MapResult<ServiceMetadata> {
    match serde_json::from_str::<MetadataEnvelope>(body)? {
        MetadataEnvelope::Error { error } => Err(error.into()),
        MetadataEnvelope::Metadata(metadata) => Ok(metadata),
    }
}

/// Parse a `query` response body (`{features: [...]}` or `{error: ...}`).
pub fn parse_query_response(body: &str) -> MapResult<Vec<Attributes>> {
    match serde_json::from_str::<QueryEnvelope>(body) {
        Ok(QueryEnvelope::Error { error }) => Err(error.into()),
        Ok(QueryEnvelope::Features { features }) => {
            Ok(features.into_iter().map(|f| f.attributes).collect())
        }
        Err(e) => Err(MapError::Decode(format!(
            "expected 'features' or 'error' in query response: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::AttributeValue;

    #[test]
    fn test_parse_metadata_finds_oid_field() {
        let body = r#"{
            "name": "Parcels",
            "maxRecordCount": 1000,
            "fields": [
                {"name": "NAME", "type": "esriFieldTypeString", "alias": "Name"},
                {"name": "FID", "type": "esriFieldTypeOID"}
            ]
        }"#;

        let metadata = parse_metadata(body).unwrap();
        assert_eq!(metadata.max_record_count, Some(1000));
        assert_eq!(metadata.id_field(), Some("FID"));
    }

    #[test]
    fn test_metadata_without_oid_field() {
        let body = r#"{"fields": [{"name": "NAME", "type": "esriFieldTypeString"}]}"#;
        let metadata = parse_metadata(body).unwrap();
        assert_eq!(metadata.id_field(), None);
        assert_eq!(metadata.max_record_count, None);
    }

    #[test]
    fn test_metadata_error_payload() {
        let body = r#"{"error": {"code": 499, "message": "Token Required", "details": []}}"#;
        let err = parse_metadata(body).unwrap_err();
        assert!(matches!(err, MapError::Service { code: 499, .. }));
    }

    #[test]
    fn test_parse_query_features() {
        let body = r#"{
            "objectIdFieldName": "OID",
            "features": [
                {"attributes": {"OID": 1, "NAME": "Alpha"}},
                {"attributes": {"OID": 2, "NAME": null}}
            ]
        }"#;

        let rows = parse_query_response(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["NAME"], AttributeValue::from("Alpha"));
        assert!(rows[1]["NAME"].is_null());
    }

    #[test]
    fn test_parse_query_error() {
        let body = r#"{"error": {"code": 400, "message": "Unable to complete operation."}}"#;
        assert!(matches!(
            parse_query_response(body),
            Err(MapError::Service { code: 400, .. })
        ));
    }

    #[test]
    fn test_parse_query_garbage() {
        assert!(matches!(
            parse_query_response(r#"{"count": 3}"#),
            Err(MapError::Decode(_))
        ));
    }

    #[test]
    fn test_where_clause() {
        assert_eq!(PageQuery::new("OBJECTID", -1).where_clause(), "OBJECTID > -1");
    }
}

//! Session configuration loaded from YAML.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use attribute_data::HttpConfig;
use map_common::MapLayer;
use serde::Deserialize;

/// Everything a grid session needs: HTTP settings and the layers on the map.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub http: HttpConfig,
    /// Buffered notifications per subscriber
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    pub layers: Vec<MapLayer>,
}

fn default_event_capacity() -> usize {
    64
}

impl SessionConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: SessionConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            anyhow::bail!("at least one layer must be configured");
        }
        if self.http.request_timeout_secs == 0 || self.http.connect_timeout_secs == 0 {
            anyhow::bail!("http timeouts must be > 0");
        }

        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(&layer.id) {
                anyhow::bail!("layer id '{}' is configured twice", layer.id);
            }
            if !(layer.url.starts_with("http://") || layer.url.starts_with("https://")) {
                anyhow::bail!("layer '{}' has a non-HTTP url: {}", layer.id, layer.url);
            }
        }
        Ok(())
    }

    /// The configured layers, optionally narrowed to `ids`.
    pub fn select_layers(&self, ids: &[String]) -> Result<Vec<MapLayer>> {
        if ids.is_empty() {
            return Ok(self.layers.clone());
        }
        ids.iter()
            .map(|id| {
                self.layers
                    .iter()
                    .find(|l| l.id.as_str() == id)
                    .cloned()
                    .with_context(|| format!("layer '{}' is not configured", id))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::{ColumnKind, GridMode, LayerKind};
    use std::io::Write;

    const SAMPLE: &str = r#"
http:
  request_timeout_secs: 30
layers:
  - id: wells
    title: Water wells
    url: https://services.test/arcgis/rest/services/Wells/FeatureServer/0
    grid:
      name_field: WELL_NAME
      columns:
        - field: zoom
          kind: icon
        - field: WELL_NAME
        - field: DEPTH
        - field: OWNER
  - id: parcels
    url: https://services.test/arcgis/rest/services/Cadastre/MapServer
    kind:
      type: map_service_sublayer
      index: 2
"#;

    #[test]
    fn test_parse_sample() {
        let config = SessionConfig::from_yaml(SAMPLE).unwrap();

        assert_eq!(config.http.request_timeout_secs, 30);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.event_capacity, 64);
        assert_eq!(config.layers.len(), 2);

        let wells = &config.layers[0];
        assert_eq!(wells.kind, LayerKind::Feature);
        assert_eq!(wells.grid.columns[0].kind, ColumnKind::Icon);
        assert_eq!(
            wells.grid.visible_fields(GridMode::Full),
            vec!["WELL_NAME", "DEPTH"]
        );

        let parcels = &config.layers[1];
        assert_eq!(
            parcels.endpoint(),
            "https://services.test/arcgis/rest/services/Cadastre/MapServer/2"
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = SessionConfig::from_file(file.path()).unwrap();
        assert_eq!(config.layers[0].id.as_str(), "wells");
    }

    #[test]
    fn test_missing_file() {
        let err = SessionConfig::from_file("/nonexistent/session.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_rejects_empty_layers() {
        assert!(SessionConfig::from_yaml("layers: []").is_err());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let yaml = r#"
layers:
  - id: a
    url: https://host/FeatureServer/0
  - id: a
    url: https://host/FeatureServer/1
"#;
        let err = SessionConfig::from_yaml(yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("configured twice"));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let yaml = r#"
layers:
  - id: a
    url: ftp://host/FeatureServer/0
"#;
        assert!(SessionConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_select_layers() {
        let config = SessionConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.select_layers(&[]).unwrap().len(), 2);

        let picked = config.select_layers(&["parcels".to_string()]).unwrap();
        assert_eq!(picked[0].id.as_str(), "parcels");

        assert!(config.select_layers(&["roads".to_string()]).is_err());
    }
}

//! Layer definitions and attribute grid configuration.

use serde::{Deserialize, Serialize};

/// Unique identifier for a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// How a layer's attribute table is reached on the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerKind {
    /// A feature service layer; the configured URL is the layer endpoint.
    #[default]
    Feature,
    /// A sublayer of a dynamic map service, addressed as `{url}/{index}`.
    MapServiceSublayer { index: u32 },
}

impl LayerKind {
    /// Resolve the layer endpoint for a configured service URL.
    pub fn resolve_url(&self, url: &str) -> String {
        let base = url.trim_end_matches('/');
        match self {
            LayerKind::Feature => base.to_string(),
            LayerKind::MapServiceSublayer { index } => format!("{}/{}", base, index),
        }
    }
}

/// Which attribute grid is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GridMode {
    /// One-line-per-feature list showing the layer's name field.
    #[default]
    Summary,
    /// Extended table showing the configured columns.
    Full,
}

impl std::str::FromStr for GridMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(GridMode::Summary),
            "full" => Ok(GridMode::Full),
            other => Err(format!("unknown grid mode '{}'", other)),
        }
    }
}

/// What a grid column renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Field,
    Icon,
    Button,
}

/// One column of the extended grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridColumn {
    pub field: String,
    #[serde(default)]
    pub kind: ColumnKind,
    #[serde(default)]
    pub label: Option<String>,
}

impl GridColumn {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            field: name.into(),
            kind: ColumnKind::Field,
            label: None,
        }
    }

    pub fn with_kind(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            field: name.into(),
            kind,
            label: None,
        }
    }
}

/// Attribute grid configuration for one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GridConfig {
    /// Field shown in the summary grid.
    #[serde(default)]
    pub name_field: Option<String>,
    /// Columns of the extended grid, in display order.
    #[serde(default)]
    pub columns: Vec<GridColumn>,
}

impl GridConfig {
    /// Fields visible in the given grid mode.
    ///
    /// The full grid only ever shows its first two data columns next to the
    /// icon and button columns, so only those are returned.
    pub fn visible_fields(&self, mode: GridMode) -> Vec<String> {
        match mode {
            GridMode::Summary => self.name_field.iter().cloned().collect(),
            GridMode::Full => self
                .columns
                .iter()
                .filter(|c| c.kind == ColumnKind::Field)
                .take(2)
                .map(|c| c.field.clone())
                .collect(),
        }
    }
}

/// A map layer taking part in attribute loading and filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayer {
    pub id: LayerId,
    /// Human-readable title
    #[serde(default)]
    pub title: Option<String>,
    /// Service endpoint
    pub url: String,
    #[serde(default)]
    pub kind: LayerKind,
    #[serde(default)]
    pub grid: GridConfig,
}

impl MapLayer {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: LayerId::new(id),
            title: None,
            url: url.into(),
            kind: LayerKind::Feature,
            grid: GridConfig::default(),
        }
    }

    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    /// The endpoint to query for this layer.
    pub fn endpoint(&self) -> String {
        self.kind.resolve_url(&self.url)
    }
}

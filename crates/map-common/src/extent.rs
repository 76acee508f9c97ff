//! Map extents used to bound spatial queries.

use serde::{Deserialize, Serialize};

/// A rectangular map extent.
///
/// Coordinates are in the units of `wkid` (degrees for 4326, meters for
/// 3857 / 102100). When `wkid` is `None` the service's native spatial
/// reference is assumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wkid: Option<u32>,
}

impl Extent {
    /// Create a new extent from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            wkid: None,
        }
    }

    /// Tag the extent with a spatial reference.
    pub fn with_wkid(mut self, wkid: u32) -> Self {
        self.wkid = Some(wkid);
        self
    }

    /// Parse "minx,miny,maxx,maxy".
    pub fn parse(s: &str) -> Result<Self, ExtentParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(ExtentParseError::InvalidFormat(s.to_string()));
        }

        let mut coords = [0.0f64; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| ExtentParseError::InvalidNumber(part.to_string()))?;
        }

        let extent = Self::new(coords[0], coords[1], coords[2], coords[3]);
        if extent.min_x > extent.max_x || extent.min_y > extent.max_y {
            return Err(ExtentParseError::Inverted(s.to_string()));
        }
        Ok(extent)
    }

    /// Envelope geometry JSON as accepted by a feature service `query`.
    pub fn to_envelope_json(&self) -> serde_json::Value {
        let mut envelope = serde_json::json!({
            "xmin": self.min_x,
            "ymin": self.min_y,
            "xmax": self.max_x,
            "ymax": self.max_y,
        });
        if let Some(wkid) = self.wkid {
            envelope["spatialReference"] = serde_json::json!({ "wkid": wkid });
        }
        envelope
    }
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ExtentParseError {
    #[error("Invalid extent format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("Invalid number in extent: {0}")]
    InvalidNumber(String),

    #[error("Extent has min greater than max: {0}")]
    Inverted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extent() {
        let extent = Extent::parse("-125.0, 24.0, -66.0, 50.0").unwrap();
        assert_eq!(extent.min_x, -125.0);
        assert_eq!(extent.min_y, 24.0);
        assert_eq!(extent.max_x, -66.0);
        assert_eq!(extent.max_y, 50.0);
        assert_eq!(extent.wkid, None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Extent::parse("1,2,3"),
            Err(ExtentParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            Extent::parse("1,2,x,4"),
            Err(ExtentParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            Extent::parse("10,10,5,5"),
            Err(ExtentParseError::Inverted(_))
        ));
    }

    #[test]
    fn test_envelope_json() {
        let envelope = Extent::new(1.0, 2.0, 3.0, 4.0).with_wkid(4326).to_envelope_json();
        assert_eq!(envelope["xmin"], 1.0);
        assert_eq!(envelope["ymax"], 4.0);
        assert_eq!(envelope["spatialReference"]["wkid"], 4326);

        let bare = Extent::new(1.0, 2.0, 3.0, 4.0).to_envelope_json();
        assert!(bare.get("spatialReference").is_none());
    }
}

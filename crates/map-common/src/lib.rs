//! Common types shared by the attribute loader, the filter engine and the
//! grid-query service.

pub mod attributes;
pub mod error;
pub mod events;
pub mod extent;
pub mod graphic;
pub mod layer;

pub use attributes::{AttributeValue, Attributes};
pub use error::{MapError, MapResult, ServiceErrorPayload};
pub use events::{AttributeEvent, EventBus};
pub use extent::{Extent, ExtentParseError};
pub use graphic::{Graphic, GraphicsLayer};
pub use layer::{ColumnKind, GridColumn, GridConfig, GridMode, LayerId, LayerKind, MapLayer};

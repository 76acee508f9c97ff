//! Shared test utilities for the feature-grid workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Attribute row, dataset and layer fixtures
//! - Scripted feature and spatial query services
//! - Event collection helpers
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your integration tests:
//!
//! ```ignore
//! use test_utils::{fixtures, ScriptedFeatureService};
//! ```

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;

use map_common::AttributeEvent;
use tokio::sync::broadcast::{error::TryRecvError, Receiver};

/// Drain every event already published to `rx`.
pub fn drain_events(rx: &mut Receiver<AttributeEvent>) -> Vec<AttributeEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    events
}

/// Assert that an attribute value equals an integer object id.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_oid;
///
/// assert_oid!(record.attribute("OID"), 4);
/// ```
#[macro_export]
macro_rules! assert_oid {
    ($value:expr, $expected:expr) => {{
        let value: Option<&map_common::AttributeValue> = $value;
        match value.and_then(|v| v.as_i64()) {
            Some(id) if id == $expected as i64 => {}
            other => panic!(
                "assertion failed: object id\n  left: `{:?}`,\n right: `{:?}`",
                other, $expected
            ),
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::{AttributeValue, EventBus, LayerId};

    #[test]
    fn test_assert_oid_passes() {
        assert_oid!(Some(&AttributeValue::Int(4)), 4);
        assert_oid!(Some(&AttributeValue::Float(4.0)), 4);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_oid_fails() {
        assert_oid!(None, 4);
    }

    #[test]
    fn test_drain_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(AttributeEvent::DataChanged {
            layer: LayerId::new("a"),
            records: 1,
        });
        assert_eq!(drain_events(&mut rx).len(), 1);
        assert!(drain_events(&mut rx).is_empty());
    }
}

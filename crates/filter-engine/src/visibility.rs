//! Show or hide map graphics to match the filtered records.

use std::cmp::Ordering;
use std::sync::Arc;

use attribute_data::FeatureRecord;
use map_common::AttributeValue;
use serde::Serialize;
use tracing::{debug, warn};

use crate::bundle::FeatureSetBundle;
use crate::error::QueryError;
use crate::query::{quote_field, Query, QueryContext};

/// Outcome of reconciling one layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VisibilitySummary {
    pub visible: usize,
    pub hidden: usize,
}

/// Ids of `candidates`, ascending.
pub fn sorted_ids(
    id_field: &str,
    candidates: &[Arc<FeatureRecord>],
) -> Result<Vec<AttributeValue>, QueryError> {
    let field = quote_field(id_field);
    let expr = format!("[/{0}][={0}]", field);
    Query::parse(&expr)?
        .execute(&QueryContext::default(), candidates.to_vec())?
        .into_values()
}

/// Three-way binary search over ids sorted ascending.
pub fn binary_search_id(sorted: &[AttributeValue], id: &AttributeValue) -> bool {
    let (mut lo, mut hi) = (0usize, sorted.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match sorted[mid].compare(id) {
            Ordering::Equal => return true,
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid,
        }
    }
    false
}

/// Set every graphic of a `Features` bundle visible exactly when its id is
/// among the candidates.
///
/// Returns `None` when nothing was touched: a raw bundle, or a layer without
/// an id field.
pub fn reconcile(
    bundle: &FeatureSetBundle,
    id_field: Option<&str>,
    candidates: &[Arc<FeatureRecord>],
) -> Result<Option<VisibilitySummary>, QueryError> {
    let FeatureSetBundle::Features { layer, graphics } = bundle else {
        warn!(layer = %bundle.layer(), "Raw bundle cannot be reconciled, visibility unchanged");
        return Ok(None);
    };
    let Some(id_field) = id_field else {
        warn!(layer = %layer, "No id field, visibility unchanged");
        return Ok(None);
    };

    let ids = sorted_ids(id_field, candidates)?;
    let mut summary = VisibilitySummary::default();
    for graphic in graphics {
        let visible = graphic
            .attribute(id_field)
            .is_some_and(|id| binary_search_id(&ids, id));
        graphic.set_visible(visible);
        if visible {
            summary.visible += 1;
        } else {
            summary.hidden += 1;
        }
    }

    debug!(layer = %layer, visible = summary.visible, hidden = summary.hidden, "Visibility reconciled");
    Ok(Some(summary))
}

//! Free-text search over candidate records.

use std::sync::Arc;

use attribute_data::FeatureRecord;
use map_common::{AttributeValue, GridMode, MapLayer};
use tracing::debug;

use crate::error::QueryError;
use crate::query::{quote_field, Query, QueryContext};

/// Fields a text search may look at for `layer`.
///
/// With `visible_only` the grid decides: the name field in summary mode, the
/// first two data columns in full mode. Otherwise every attribute key of the
/// candidates is searched; the first candidate's keys stand for the layer.
pub fn eligible_fields(
    layer: &MapLayer,
    mode: GridMode,
    visible_only: bool,
    candidates: &[Arc<FeatureRecord>],
) -> Vec<String> {
    if visible_only {
        return layer.grid.visible_fields(mode);
    }
    candidates
        .first()
        .map(|r| r.attributes().keys().cloned().collect())
        .unwrap_or_default()
}

/// Build `[?f1~$1|f2~$1|...]` for `fields`, `None` when there are none.
pub fn build_expression(fields: &[String]) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    let clauses: Vec<String> = fields
        .iter()
        .map(|f| format!("{}~$1", quote_field(f)))
        .collect();
    Some(format!("[?{}]", clauses.join("|")))
}

/// The single context argument: the trimmed search text wrapped in `*`.
pub fn search_context(text: &str) -> QueryContext {
    QueryContext::with_args(vec![AttributeValue::Text(format!("*{}*", text.trim()))])
}

/// Keep the candidates of `layer` matching `text` in any eligible field.
pub fn apply(
    layer: &MapLayer,
    mode: GridMode,
    visible_only: bool,
    text: &str,
    candidates: Vec<Arc<FeatureRecord>>,
) -> Result<Vec<Arc<FeatureRecord>>, QueryError> {
    let fields = eligible_fields(layer, mode, visible_only, &candidates);
    let Some(expr) = build_expression(&fields) else {
        debug!(layer = %layer.id, "No searchable fields, nothing matches");
        return Ok(Vec::new());
    };

    let before = candidates.len();
    let matched = Query::parse(&expr)?
        .execute(&search_context(text), candidates)?
        .into_records()?;
    debug!(layer = %layer.id, expr = %expr, before, after = matched.len(), "Text search");
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::{ColumnKind, GridColumn, GridConfig};

    #[test]
    fn test_build_expression() {
        assert_eq!(
            build_expression(&["NAME".to_string(), "CODE".to_string()]).as_deref(),
            Some("[?NAME~$1|CODE~$1]")
        );
        assert_eq!(build_expression(&[]), None);
    }

    #[test]
    fn test_odd_field_names_are_quoted() {
        let fields = vec!["bad name".to_string(), "GOOD".to_string(), "Ñame".to_string()];
        assert_eq!(
            build_expression(&fields).as_deref(),
            Some("[?`bad name`~$1|GOOD~$1|`Ñame`~$1]")
        );
        assert_eq!(build_expression(&["1st".to_string()]).as_deref(), Some("[?`1st`~$1]"));
        assert!(Query::parse(&build_expression(&fields).unwrap()).is_ok());
    }

    #[test]
    fn test_search_context_wraps_trimmed_text() {
        assert_eq!(
            search_context("  alp "),
            QueryContext::with_args(vec![AttributeValue::from("*alp*")])
        );
    }

    #[test]
    fn test_visible_fields_come_from_grid() {
        let layer = MapLayer::new("wells", "https://host/FeatureServer/0").with_grid(GridConfig {
            name_field: Some("NAME".to_string()),
            columns: vec![
                GridColumn::with_kind("ZOOM", ColumnKind::Icon),
                GridColumn::field("NAME"),
                GridColumn::with_kind("GO", ColumnKind::Button),
                GridColumn::field("CODE"),
                GridColumn::field("DETAIL"),
            ],
        });

        assert_eq!(eligible_fields(&layer, GridMode::Summary, true, &[]), vec!["NAME"]);
        assert_eq!(
            eligible_fields(&layer, GridMode::Full, true, &[]),
            vec!["NAME", "CODE"]
        );
        assert!(eligible_fields(&layer, GridMode::Full, false, &[]).is_empty());
    }
}

//! A small query language over in-memory feature records.
//!
//! A query is a chain of bracketed steps applied left to right:
//!
//! - `[?cond]` keeps the records for which `cond` holds
//! - `[/field]` / `[\field]` stable-sorts ascending / descending
//! - `[=field]` projects every record to one attribute value (last step only)
//!
//! Conditions compare a field with a value: `~` (case-insensitive wildcard
//! match, `*` and `?`), `=`, `!=`, `<`, `<=`, `>`, `>=`, joined with `&`
//! and `|` and grouped with parentheses. Values are quoted strings, numbers,
//! `true`, `false`, `null`, or `$N` for the N-th context argument. A field
//! name that is not a plain ASCII identifier is written in backticks
//! (`` `Ñame` ``); see [`quote_field`].
//!
//! ```
//! use attribute_data::LayerDataset;
//! use filter_engine::query::{Query, QueryContext};
//! use map_common::{AttributeValue, Attributes, LayerId};
//!
//! let rows: Vec<Attributes> = ["Alpha", "Beta", "Alphabet"]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, name)| {
//!         let mut row = Attributes::new();
//!         row.insert("OID".to_string(), AttributeValue::Int(i as i64 + 1));
//!         row.insert("NAME".to_string(), AttributeValue::from(*name));
//!         row
//!     })
//!     .collect();
//! let records = LayerDataset::from_rows(LayerId::new("sites"), Some("OID".to_string()), rows)
//!     .snapshot();
//!
//! let query = Query::parse("[?NAME~$1][\\OID][=OID]").unwrap();
//! let ctx = QueryContext::with_args(vec!["*alp*".into()]);
//! let ids = query.execute(&ctx, records).unwrap().into_values().unwrap();
//! assert_eq!(ids, vec![AttributeValue::Int(3), AttributeValue::Int(1)]);
//! ```

mod lexer;
mod parser;
mod pattern;

use std::cmp::Ordering;
use std::sync::Arc;

use attribute_data::FeatureRecord;
use map_common::AttributeValue;

pub use lexer::{is_identifier, quote_field};
pub use parser::{CompareOp, Condition, Operand, Step};
pub use pattern::wildcard_match;

use crate::error::QueryError;

/// Arguments referenced as `$1`, `$2`, ... from an expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryContext {
    args: Vec<AttributeValue>,
}

impl QueryContext {
    pub fn with_args(args: Vec<AttributeValue>) -> Self {
        Self { args }
    }

    fn arg(&self, n: usize) -> Result<&AttributeValue, QueryError> {
        n.checked_sub(1)
            .and_then(|i| self.args.get(i))
            .ok_or(QueryError::MissingArgument(n))
    }
}

/// What a query produced.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Records(Vec<Arc<FeatureRecord>>),
    Values(Vec<AttributeValue>),
}

impl QueryOutput {
    pub fn into_records(self) -> Result<Vec<Arc<FeatureRecord>>, QueryError> {
        match self {
            QueryOutput::Records(records) => Ok(records),
            QueryOutput::Values(_) => Err(QueryError::ExpectedRecords),
        }
    }

    pub fn into_values(self) -> Result<Vec<AttributeValue>, QueryError> {
        match self {
            QueryOutput::Values(values) => Ok(values),
            QueryOutput::Records(_) => Err(QueryError::ExpectedValues),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Records(r) => r.len(),
            QueryOutput::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    steps: Vec<Step>,
}

impl Query {
    pub fn parse(expr: &str) -> Result<Self, QueryError> {
        Ok(Self {
            steps: parser::parse(expr)?,
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run the query over `records`.
    pub fn execute(
        &self,
        ctx: &QueryContext,
        mut records: Vec<Arc<FeatureRecord>>,
    ) -> Result<QueryOutput, QueryError> {
        for step in &self.steps {
            match step {
                Step::Filter(cond) => {
                    let mut kept = Vec::with_capacity(records.len());
                    for record in records {
                        if evaluate(cond, ctx, &record)? {
                            kept.push(record);
                        }
                    }
                    records = kept;
                }
                Step::Sort { field, descending } => {
                    records.sort_by(|a, b| {
                        let ord = field_value(a, field).compare(field_value(b, field));
                        if *descending {
                            ord.reverse()
                        } else {
                            ord
                        }
                    });
                }
                Step::Project(field) => {
                    let values = records
                        .iter()
                        .map(|r| field_value(r, field).clone())
                        .collect();
                    return Ok(QueryOutput::Values(values));
                }
            }
        }
        Ok(QueryOutput::Records(records))
    }
}

/// Parse and run `expr` in one go.
pub fn execute(
    expr: &str,
    ctx: &QueryContext,
    records: Vec<Arc<FeatureRecord>>,
) -> Result<QueryOutput, QueryError> {
    Query::parse(expr)?.execute(ctx, records)
}

static NULL: AttributeValue = AttributeValue::Null;

fn field_value<'a>(record: &'a FeatureRecord, field: &str) -> &'a AttributeValue {
    record.attribute(field).unwrap_or(&NULL)
}

fn evaluate(cond: &Condition, ctx: &QueryContext, record: &FeatureRecord) -> Result<bool, QueryError> {
    match cond {
        Condition::And(a, b) => Ok(evaluate(a, ctx, record)? && evaluate(b, ctx, record)?),
        Condition::Or(a, b) => Ok(evaluate(a, ctx, record)? || evaluate(b, ctx, record)?),
        Condition::Compare { field, op, operand } => {
            let rhs = match operand {
                Operand::Literal(v) => v,
                Operand::Param(n) => ctx.arg(*n)?,
            };
            let lhs = field_value(record, field);
            Ok(compare(lhs, *op, rhs))
        }
    }
}

fn compare(lhs: &AttributeValue, op: CompareOp, rhs: &AttributeValue) -> bool {
    match op {
        CompareOp::Match => !lhs.is_null() && wildcard_match(&rhs.key_string(), &lhs.key_string()),
        CompareOp::Eq => lhs.loosely_equals(rhs),
        CompareOp::Ne => !lhs.loosely_equals(rhs),
        CompareOp::Lt => lhs.compare(rhs) == Ordering::Less,
        CompareOp::Le => lhs.compare(rhs) != Ordering::Greater,
        CompareOp::Gt => lhs.compare(rhs) == Ordering::Greater,
        CompareOp::Ge => lhs.compare(rhs) != Ordering::Less,
    }
}

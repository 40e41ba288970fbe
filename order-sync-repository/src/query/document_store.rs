//! Primary document store query compilation.
//!
//! Produces a MongoDB-shaped filter document plus find options. Executing
//! the query belongs to the store's own read layer.

use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{json, Map, Value};

use order_sync_shared::{FilterOperator, GenericFilterRequest, MatchClause};

use crate::errors::TranslateError;
use crate::query::mapping::BackendMapping;
use crate::query::values::{as_list, as_pattern, as_presence, object, parse_date};

const AND: &str = "$and";

/// Projection and sort options of a find call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FindOptions {
    /// `{field: 1}` inclusion list, `None` returns every field.
    pub projection: Option<Map<String, Value>>,
    /// Sort keys in declaration order, `1` ascending and `-1` descending.
    pub sort: Vec<(String, i64)>,
}

/// Filter document and options for the primary store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentStoreQuery {
    pub filter: Value,
    pub options: FindOptions,
}

pub(crate) fn compile(
    mapping: &BackendMapping,
    request: &GenericFilterRequest,
) -> Result<DocumentStoreQuery, TranslateError> {
    let mut clauses = Vec::with_capacity(request.exact_filters.len() + request.match_clauses.len());

    // Exact filters are always membership tests, never patterns.
    let in_token = mapping.operator(FilterOperator::In)?;
    for filter in request.exact_filters.iter().filter(|f| !f.values.is_empty()) {
        let field = mapping.query_field(&filter.field);
        clauses.push(object(field, object(in_token, Value::Array(filter.values.clone()))));
    }

    for clause in &request.match_clauses {
        clauses.push(compile_clause(mapping, clause)?);
    }

    let filter = if clauses.is_empty() {
        json!({})
    } else {
        object(AND, Value::Array(clauses))
    };

    Ok(DocumentStoreQuery {
        filter,
        options: FindOptions {
            projection: projection(mapping, &request.fields),
            sort: request
                .sort
                .iter()
                .map(|key| {
                    let field = mapping.query_field(&key.field).to_string();
                    (field, i64::from(key.direction))
                })
                .collect(),
        },
    })
}

fn compile_clause(mapping: &BackendMapping, clause: &MatchClause) -> Result<Value, TranslateError> {
    let field = mapping.query_field(&clause.field);
    let token = mapping.operator(clause.operator)?;

    let value = match clause.operator {
        FilterOperator::Eq | FilterOperator::Ne => clause.value.clone(),
        FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
            if mapping.is_date_field(&clause.field) {
                let date = parse_date(&clause.field, &clause.value)?;
                json!({ "$date": date.to_rfc3339_opts(SecondsFormat::Secs, true) })
            } else {
                clause.value.clone()
            }
        }
        FilterOperator::In | FilterOperator::Nin => as_list(&clause.value),
        FilterOperator::Exists => Value::Bool(as_presence(&clause.field, &clause.value)?),
        FilterOperator::Regex => Value::String(as_pattern(&clause.field, &clause.value)?.to_string()),
    };

    Ok(object(field, object(token, value)))
}

fn projection(mapping: &BackendMapping, fields: &[String]) -> Option<Map<String, Value>> {
    if fields.is_empty() {
        return None;
    }

    let mut projection = Map::with_capacity(fields.len() + 1);
    for field in fields {
        projection.insert(mapping.source_field(field).to_string(), json!(1));
    }
    projection
        .entry(mapping.source_field(mapping.id_field()).to_string())
        .or_insert(json!(1));
    Some(projection)
}


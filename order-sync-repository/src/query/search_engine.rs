//! Search engine query compilation.
//!
//! Produces an OpenSearch/Elasticsearch query DSL body. Every exact filter
//! and match clause becomes one entry of a single `bool.must` list, in
//! request order; negated clauses are wrapped in a nested `bool.must_not`
//! so they keep their position.

use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{json, Value};

use order_sync_shared::{FilterOperator, GenericFilterRequest, MatchClause, SortDirection};

use crate::errors::TranslateError;
use crate::query::mapping::BackendMapping;
use crate::query::values::{as_list, as_pattern, as_presence, object, parse_date};

/// A compiled search request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SearchEngineQuery {
    body: Value,
}

impl SearchEngineQuery {
    /// Wrap an already built query body.
    pub fn from_body(body: Value) -> Self {
        Self { body }
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}

pub(crate) fn compile(
    mapping: &BackendMapping,
    request: &GenericFilterRequest,
) -> Result<SearchEngineQuery, TranslateError> {
    let mut must = Vec::with_capacity(request.exact_filters.len() + request.match_clauses.len());

    let in_token = mapping.operator(FilterOperator::In)?;
    for filter in request.exact_filters.iter().filter(|f| !f.values.is_empty()) {
        let field = mapping.query_field(&filter.field);
        must.push(object(in_token, object(field, Value::Array(filter.values.clone()))));
    }

    for clause in &request.match_clauses {
        must.push(compile_clause(mapping, clause)?);
    }

    let query = if must.is_empty() {
        json!({ "match_all": {} })
    } else {
        json!({ "bool": { "must": must } })
    };

    let mut body = json!({ "query": query });

    if !request.sort.is_empty() {
        let sort: Vec<Value> = request
            .sort
            .iter()
            .map(|key| {
                let order = match key.direction {
                    SortDirection::Ascending => "asc",
                    SortDirection::Descending => "desc",
                };
                object(mapping.query_field(&key.field), json!({ "order": order }))
            })
            .collect();
        body["sort"] = Value::Array(sort);
    }

    if !request.fields.is_empty() {
        let mut source: Vec<String> = Vec::with_capacity(request.fields.len() + 1);
        for field in &request.fields {
            let name = mapping.source_field(field).to_string();
            if !source.contains(&name) {
                source.push(name);
            }
        }
        let id = mapping.source_field(mapping.id_field()).to_string();
        if !source.contains(&id) {
            source.push(id);
        }
        body["_source"] = json!(source);
    }

    Ok(SearchEngineQuery { body })
}

fn compile_clause(mapping: &BackendMapping, clause: &MatchClause) -> Result<Value, TranslateError> {
    let field = mapping.query_field(&clause.field);
    let token = mapping.operator(clause.operator)?;

    let compiled = match clause.operator {
        FilterOperator::Eq => object(token, object(field, clause.value.clone())),
        FilterOperator::Ne => negate(object(token, object(field, clause.value.clone()))),
        FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
            let bound = if mapping.is_date_field(&clause.field) {
                let date = parse_date(&clause.field, &clause.value)?;
                Value::String(date.to_rfc3339_opts(SecondsFormat::Secs, true))
            } else {
                clause.value.clone()
            };
            object("range", object(field, object(token, bound)))
        }
        FilterOperator::In => object(token, object(field, as_list(&clause.value))),
        FilterOperator::Nin => negate(object(token, object(field, as_list(&clause.value)))),
        FilterOperator::Exists => {
            let presence = object(token, json!({ "field": field }));
            if as_presence(&clause.field, &clause.value)? {
                presence
            } else {
                negate(presence)
            }
        }
        FilterOperator::Regex => {
            let pattern = as_pattern(&clause.field, &clause.value)?;
            object(token, object(field, Value::String(pattern.to_string())))
        }
    };

    Ok(compiled)
}

fn negate(clause: Value) -> Value {
    json!({ "bool": { "must_not": [clause] } })
}

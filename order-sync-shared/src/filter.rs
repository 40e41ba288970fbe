//! Backend-agnostic filter requests.
//!
//! A [`GenericFilterRequest`] names logical fields (dotted paths such as
//! `address.city`) and abstract operators. The repository crate compiles it
//! into a primary-store query or a search-engine query.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Abstract comparison operator of a match clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Exists,
    Regex,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 10] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
        Self::Nin,
        Self::Exists,
        Self::Regex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Exists => "exists",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{field, operator, value}` match clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchClause {
    #[serde(alias = "matchField")]
    pub field: String,
    #[serde(alias = "parameter")]
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
}

impl MatchClause {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Sort direction, `1` ascending and `-1` descending on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl TryFrom<i64> for SortDirection {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Ascending),
            -1 => Ok(Self::Descending),
            other => Err(format!("sort direction must be 1 or -1, got {}", other)),
        }
    }
}

impl From<SortDirection> for i64 {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// "Field is one of these values" filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ExactFilter {
    pub field: String,
    pub values: Vec<Value>,
}

/// One key of a multi-key sort, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Exact filters, match clauses, sort keys and projection of a search.
///
/// `exactFilters` and `sort` are JSON objects whose key order is kept, so
/// compiled queries list clauses and sort keys in the order the caller
/// wrote them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericFilterRequest {
    #[serde(default, with = "exact_filters")]
    pub exact_filters: Vec<ExactFilter>,
    #[serde(default, alias = "match")]
    pub match_clauses: Vec<MatchClause>,
    #[serde(default, with = "sort_keys")]
    pub sort: Vec<SortKey>,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl GenericFilterRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exact<V: Into<Value>>(mut self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        self.exact_filters.push(ExactFilter {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn matching(
        mut self,
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        self.match_clauses.push(MatchClause::new(field, operator, value));
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

struct EntriesVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
    type Value = Vec<(String, V)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, V>()? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

fn deserialize_entries<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    deserializer.deserialize_map(EntriesVisitor(PhantomData))
}

mod exact_filters {
    use super::*;

    pub fn serialize<S: Serializer>(filters: &[ExactFilter], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(filters.len()))?;
        for filter in filters {
            map.serialize_entry(&filter.field, &filter.values)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ExactFilter>, D::Error> {
        Ok(deserialize_entries::<D, Vec<Value>>(deserializer)?
            .into_iter()
            .map(|(field, values)| ExactFilter { field, values })
            .collect())
    }
}

mod sort_keys {
    use super::*;

    pub fn serialize<S: Serializer>(keys: &[SortKey], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(keys.len()))?;
        for key in keys {
            map.serialize_entry(&key.field, &key.direction)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<SortKey>, D::Error> {
        Ok(deserialize_entries::<D, SortDirection>(deserializer)?
            .into_iter()
            .map(|(field, direction)| SortKey { field, direction })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_request() {
        let request: GenericFilterRequest = serde_json::from_str(
            r#"{
                "exactFilters": {"status": ["Created", "Shipped"], "address.city": ["Istanbul"]},
                "matchClauses": [{"field": "total", "operator": "gte", "value": 1000}],
                "sort": {"total": -1, "createdAt": 1},
                "fields": ["status", "total"]
            }"#,
        )
        .unwrap();

        assert_eq!(request.exact_filters.len(), 2);
        assert_eq!(request.exact_filters[0].field, "status");
        assert_eq!(request.exact_filters[1].field, "address.city");
        assert_eq!(request.match_clauses[0].operator, FilterOperator::Gte);
        assert_eq!(request.fields, vec!["status", "total"]);
    }

    #[test]
    fn test_sort_keeps_declaration_order() {
        let request: GenericFilterRequest = serde_json::from_str(
            r#"{"sort": {"updatedAt": -1, "total": 1, "address.city": -1}}"#,
        )
        .unwrap();

        let fields: Vec<&str> = request.sort.iter().map(|k| k.field.as_str()).collect();
        assert_eq!(fields, vec!["updatedAt", "total", "address.city"]);
        assert_eq!(request.sort[0].direction, SortDirection::Descending);
        assert_eq!(request.sort[1].direction, SortDirection::Ascending);
    }

    #[test]
    fn test_legacy_match_names() {
        let request: GenericFilterRequest = serde_json::from_value(json!({
            "match": [{"matchField": "product.name", "parameter": "regex", "value": ".*pad.*"}]
        }))
        .unwrap();

        assert_eq!(request.match_clauses[0].field, "product.name");
        assert_eq!(request.match_clauses[0].operator, FilterOperator::Regex);
    }

    #[test]
    fn test_invalid_sort_direction_is_rejected() {
        let result = serde_json::from_value::<GenericFilterRequest>(json!({"sort": {"total": 2}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let result = serde_json::from_value::<GenericFilterRequest>(json!({
            "matchClauses": [{"field": "total", "operator": "between", "value": 1}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_body_is_default() {
        let request: GenericFilterRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, GenericFilterRequest::default());
    }

    #[test]
    fn test_serialize_keeps_order() {
        let request = GenericFilterRequest::new()
            .exact("status", ["Created"])
            .sort_by("total", SortDirection::Descending)
            .sort_by("createdAt", SortDirection::Ascending);

        let text = serde_json::to_string(&request).unwrap();
        let total = text.find("\"total\"").unwrap();
        let created = text.find("\"createdAt\"").unwrap();
        assert!(total < created);

        let back: GenericFilterRequest = serde_json::from_str(&text).unwrap();
        assert_eq!(back, request);
    }
}

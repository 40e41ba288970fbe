//! Per-backend field-name and operator vocabularies.
//!
//! A [`BackendMapping`] is plain data handed to the translator when it is
//! built, so tests can swap in alternative tables without touching any
//! shared state.

use std::collections::{BTreeMap, BTreeSet};

use order_sync_shared::FilterOperator;

use crate::errors::TranslateError;

/// Logical field names of an order document.
const ORDER_FIELDS: [&str; 17] = [
    "id",
    "userId",
    "status",
    "address.address",
    "address.city",
    "address.district",
    "address.type",
    "invoiceAddress.address",
    "invoiceAddress.city",
    "invoiceAddress.district",
    "invoiceAddress.type",
    "product.name",
    "product.quantity",
    "product.price",
    "total",
    "createdAt",
    "updatedAt",
];

/// Analyzed text fields; the search engine matches them exactly through
/// their `.keyword` sub-field.
const TEXT_FIELDS: [&str; 7] = [
    "address.address",
    "address.city",
    "address.district",
    "invoiceAddress.address",
    "invoiceAddress.city",
    "invoiceAddress.district",
    "product.name",
];

const DATE_FIELDS: [&str; 2] = ["createdAt", "updatedAt"];

/// Logical identifier field, always included in projections.
const ID_FIELD: &str = "id";

/// Backend names for one logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    /// Name used in filter clauses and sort keys.
    pub query: String,
    /// Name of the stored field, used for projections.
    pub source: String,
}

impl FieldMapping {
    pub fn same(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            query: name.clone(),
            source: name,
        }
    }
}

/// Field-name and operator tables for one backend.
///
/// Logical fields missing from the table are passed through unchanged.
/// Operators missing from the table are rejected.
#[derive(Debug, Clone)]
pub struct BackendMapping {
    name: String,
    fields: BTreeMap<String, FieldMapping>,
    operators: BTreeMap<FilterOperator, String>,
    date_fields: BTreeSet<String>,
}

impl BackendMapping {
    /// Create an empty mapping.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
            operators: BTreeMap::new(),
            date_fields: BTreeSet::new(),
        }
    }

    pub fn with_field(mut self, logical: impl Into<String>, mapping: FieldMapping) -> Self {
        self.fields.insert(logical.into(), mapping);
        self
    }

    pub fn with_operator(mut self, operator: FilterOperator, token: impl Into<String>) -> Self {
        self.operators.insert(operator, token.into());
        self
    }

    pub fn with_date_field(mut self, logical: impl Into<String>) -> Self {
        self.date_fields.insert(logical.into());
        self
    }

    /// Primary document store (MongoDB-style) vocabulary.
    pub fn document_store() -> Self {
        let mut mapping = Self::new("document-store");
        for field in ORDER_FIELDS {
            let backend = if field == "id" { "_id" } else { field };
            mapping = mapping.with_field(field, FieldMapping::same(backend));
        }
        for field in DATE_FIELDS {
            mapping = mapping.with_date_field(field);
        }
        for operator in FilterOperator::ALL {
            mapping = mapping.with_operator(operator, format!("${}", operator.as_str()));
        }
        mapping
    }

    /// Search engine (OpenSearch/Elasticsearch query DSL) vocabulary.
    pub fn search_engine() -> Self {
        let mut mapping = Self::new("search-engine");
        for field in ORDER_FIELDS {
            let field_mapping = if TEXT_FIELDS.contains(&field) {
                FieldMapping {
                    query: format!("{}.keyword", field),
                    source: field.to_string(),
                }
            } else {
                FieldMapping::same(field)
            };
            mapping = mapping.with_field(field, field_mapping);
        }
        for field in DATE_FIELDS {
            mapping = mapping.with_date_field(field);
        }
        mapping
            .with_operator(FilterOperator::Eq, "term")
            .with_operator(FilterOperator::Ne, "term")
            .with_operator(FilterOperator::Gt, "gt")
            .with_operator(FilterOperator::Gte, "gte")
            .with_operator(FilterOperator::Lt, "lt")
            .with_operator(FilterOperator::Lte, "lte")
            .with_operator(FilterOperator::In, "terms")
            .with_operator(FilterOperator::Nin, "terms")
            .with_operator(FilterOperator::Exists, "exists")
            .with_operator(FilterOperator::Regex, "regexp")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical name of the identifier field.
    pub fn id_field(&self) -> &str {
        ID_FIELD
    }

    pub fn query_field<'a>(&'a self, logical: &'a str) -> &'a str {
        self.fields
            .get(logical)
            .map(|m| m.query.as_str())
            .unwrap_or(logical)
    }

    pub fn source_field<'a>(&'a self, logical: &'a str) -> &'a str {
        self.fields
            .get(logical)
            .map(|m| m.source.as_str())
            .unwrap_or(logical)
    }

    pub fn operator(&self, operator: FilterOperator) -> Result<&str, TranslateError> {
        self.operators
            .get(&operator)
            .map(String::as_str)
            .ok_or_else(|| TranslateError::UnsupportedOperator {
                backend: self.name.clone(),
                operator,
            })
    }

    pub fn is_date_field(&self, logical: &str) -> bool {
        self.date_fields.contains(logical)
    }

    /// Check that `other` knows the same logical fields, date fields,
    /// and operators as `self`.
    pub fn ensure_consistent_with(&self, other: &BackendMapping) -> Result<(), TranslateError> {
        let ours: BTreeSet<&String> = self.fields.keys().collect();
        let theirs: BTreeSet<&String> = other.fields.keys().collect();
        if let Some(field) = ours.symmetric_difference(&theirs).next() {
            return Err(TranslateError::InconsistentMapping(format!(
                "field '{}' is mapped by only one of {} and {}",
                field, self.name, other.name
            )));
        }

        if let Some(field) = self.date_fields.symmetric_difference(&other.date_fields).next() {
            return Err(TranslateError::InconsistentMapping(format!(
                "field '{}' is date-valued in only one of {} and {}",
                field, self.name, other.name
            )));
        }

        let ours: BTreeSet<&FilterOperator> = self.operators.keys().collect();
        let theirs: BTreeSet<&FilterOperator> = other.operators.keys().collect();
        if let Some(operator) = ours.symmetric_difference(&theirs).next() {
            return Err(TranslateError::InconsistentMapping(format!(
                "operator '{}' is supported by only one of {} and {}",
                operator, self.name, other.name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mappings_are_consistent() {
        let store = BackendMapping::document_store();
        let search = BackendMapping::search_engine();
        assert!(store.ensure_consistent_with(&search).is_ok());
        assert!(search.ensure_consistent_with(&store).is_ok());
    }

    #[test]
    fn test_text_fields_use_keyword_in_search_engine() {
        let store = BackendMapping::document_store();
        let search = BackendMapping::search_engine();

        assert_eq!(store.query_field("address.city"), "address.city");
        assert_eq!(search.query_field("address.city"), "address.city.keyword");
        assert_eq!(search.source_field("address.city"), "address.city");
        assert_eq!(search.query_field("total"), "total");
    }

    #[test]
    fn test_identifier_field_names() {
        assert_eq!(BackendMapping::document_store().query_field("id"), "_id");
        assert_eq!(BackendMapping::search_engine().query_field("id"), "id");
    }

    #[test]
    fn test_unmapped_field_passes_through() {
        let search = BackendMapping::search_engine();
        assert_eq!(search.query_field("notes"), "notes");
        assert_eq!(search.source_field("notes"), "notes");
    }

    #[test]
    fn test_missing_operator_is_rejected() {
        let mapping = BackendMapping::new("partial").with_operator(FilterOperator::Eq, "$eq");
        assert_eq!(mapping.operator(FilterOperator::Eq).unwrap(), "$eq");
        assert!(matches!(
            mapping.operator(FilterOperator::Regex),
            Err(TranslateError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn test_diverging_fields_are_inconsistent() {
        let store = BackendMapping::document_store().with_field("notes", FieldMapping::same("notes"));
        let search = BackendMapping::search_engine();
        assert!(matches!(
            store.ensure_consistent_with(&search),
            Err(TranslateError::InconsistentMapping(_))
        ));
    }

    #[test]
    fn test_diverging_operators_are_inconsistent() {
        let store = BackendMapping::new("a").with_operator(FilterOperator::Regex, "$regex");
        let search = BackendMapping::new("b");
        assert!(store.ensure_consistent_with(&search).is_err());
    }

    #[test]
    fn test_diverging_date_fields_are_inconsistent() {
        let store = BackendMapping::new("a").with_date_field("shippedAt");
        let search = BackendMapping::new("b");
        assert!(store.ensure_consistent_with(&search).is_err());
    }
}

//! The resolved order document stored in the search index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default-address flags attached to an address snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressDefaults {
    pub is_default_invoice_address: bool,
    pub is_default_regular_address: bool,
}

/// Address snapshot taken when the order was written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub address: String,
    pub city: String,
    pub district: String,
    #[serde(rename = "type")]
    pub kinds: Vec<String>,
    pub default: AddressDefaults,
}

/// One product line of an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

/// A search-indexable snapshot of an order.
///
/// The identifier doubles as the index document key, so indexing the same
/// order twice overwrites instead of duplicating. Every field except `id`
/// may be absent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocument {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub invoice_address: Address,
    #[serde(default, rename = "product")]
    pub products: Vec<LineItem>,
    #[serde(default)]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderDocument {
    /// Create a document with only an identifier and status set.
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: String::new(),
            status: status.into(),
            address: Address::default(),
            invoice_address: Address::default(),
            products: Vec::new(),
            total: 0.0,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_total(mut self, total: f64) -> Self {
        self.total = total;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_document_deserializes() {
        let doc: OrderDocument =
            serde_json::from_value(json!({"id": "O-1", "status": "Shipped", "total": 24000.0}))
                .unwrap();

        assert_eq!(doc.id, "O-1");
        assert_eq!(doc.status, "Shipped");
        assert_eq!(doc.total, 24000.0);
        assert!(doc.products.is_empty());
        assert!(doc.created_at.is_none());
    }

    #[test]
    fn test_full_document_wire_names() {
        let doc: OrderDocument = serde_json::from_value(json!({
            "id": "O-2",
            "userId": "U-1",
            "status": "Created",
            "address": {
                "address": "Main St. 1",
                "city": "Istanbul",
                "district": "Kadikoy",
                "type": ["home"],
                "default": {"isDefaultInvoiceAddress": false, "isDefaultRegularAddress": true}
            },
            "invoiceAddress": {"city": "Ankara"},
            "product": [{"name": "Keyboard", "quantity": 2, "price": 1500.0}],
            "total": 3000.0,
            "createdAt": "2023-03-01T10:00:00Z",
            "updatedAt": "2023-03-02T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(doc.user_id, "U-1");
        assert_eq!(doc.address.kinds, vec!["home".to_string()]);
        assert!(doc.address.default.is_default_regular_address);
        assert_eq!(doc.invoice_address.city, "Ankara");
        assert_eq!(doc.products[0].name, "Keyboard");
        assert!(doc.created_at.is_some());

        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["invoiceAddress"]["city"], "Ankara");
        assert_eq!(back["product"][0]["quantity"], 2);
    }
}

use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Statuses an operator can move an order to
    pub const ASSIGNABLE: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Unknown => "Unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ASSIGNABLE.into_iter().find(|st| st.as_str() == wanted)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemProduct {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub product: Option<OrderItemProduct>,
}

impl OrderItem {
    pub fn product_name(&self) -> String {
        match self.product {
            Some(ref p) => p.name.clone(),
            None => format!("Product #{}", self.product_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

impl Order {
    /// Parse `created_at`, which the backend sends with or without an offset
    pub fn created_at_parsed(&self) -> Option<NaiveDateTime> {
        let raw = self.created_at.as_deref()?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_utc());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }

    /// First line of the shipping address, which holds the customer name
    pub fn customer_line(&self) -> Option<&str> {
        self.shipping_address
            .as_deref()
            .and_then(|addr| addr.lines().next())
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }

    pub fn item_count(&self) -> i64 {
        self.order_items.iter().map(|i| i.quantity).sum()
    }

    pub fn display_number(&self) -> String {
        match self.order_number {
            Some(ref n) => n.clone(),
            None => format!("#{}", self.id),
        }
    }
}

/// Body of `PUT /api/orders/{id}/`
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_JSON: &str = r#"{
        "id": 1,
        "order_number": "ORD20260218K0I9C6",
        "user_id": 5,
        "total_amount": 45.0,
        "status": "pending",
        "payment_status": "pending",
        "shipping_address": "Phnom Penh, Cambodia\nStreet 123",
        "phone_number": "012345678",
        "notes": null,
        "created_at": "2026-02-18T10:30:00",
        "updated_at": null,
        "order_items": [
            {"id": 1, "product_id": 1, "quantity": 2, "unit_price": 22.5, "total_price": 45.0,
             "product": {"id": 1, "name": "Silk shirt", "price": 25.99, "category": "Shirts"}}
        ]
    }"#;

    #[test]
    fn test_parse_order() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.customer_line(), Some("Phnom Penh, Cambodia"));
        assert_eq!(order.order_items[0].product_name(), "Silk shirt");
        assert_eq!(order.display_number(), "ORD20260218K0I9C6");

        let created = order.created_at_parsed().unwrap();
        assert_eq!(created.format("%Y-%m-%d %H:%M").to_string(), "2026-02-18 10:30");
    }

    #[test]
    fn test_created_at_with_offset() {
        let mut order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        order.created_at = Some("2026-02-18T10:30:00+07:00".into());
        let created = order.created_at_parsed().unwrap();
        assert_eq!(created.format("%H:%M").to_string(), "03:30");
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let order: Order = serde_json::from_str(r#"{"id": 9, "status": "refunded"}"#).unwrap();
        assert_eq!(order.status, OrderStatus::Unknown);
        assert_eq!(order.customer_line(), None);
        assert_eq!(order.display_number(), "#9");
    }

    #[test]
    fn test_status_parse_and_serialize() {
        assert_eq!(OrderStatus::parse("Shipped"), Some(OrderStatus::Shipped));
        assert_eq!(OrderStatus::parse("unknown"), None);
        let body = serde_json::to_string(&OrderStatusUpdate {
            status: OrderStatus::Delivered,
        })
        .unwrap();
        assert_eq!(body, r#"{"status":"delivered"}"#);
    }
}

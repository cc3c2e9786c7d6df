//! Totals shown on the dashboard screen.

use serde::Serialize;

use crate::models::{Order, OrderStatus, Product};
use crate::utils::truncate_string;

/// Number of orders listed under "recent orders"
pub const RECENT_ORDER_COUNT: usize = 5;

/// Customer labels longer than this are cut with an ellipsis
const CUSTOMER_LABEL_LEN: usize = 30;

/// Label when an order has no shipping address
const NO_CUSTOMER: &str = "No name";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentOrder {
    pub id: i64,
    pub order_number: String,
    pub customer: String,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DashboardSummary {
    pub total_products: usize,
    pub total_orders: usize,
    pub total_revenue: f64,
    pub recent_orders: Vec<RecentOrder>,
}

impl DashboardSummary {
    /// Summarize whatever the backend returned. Empty lists give an empty
    /// summary; nothing is invented to fill the screen.
    pub fn from_data(products: &[Product], orders: &[Order]) -> Self {
        let total_revenue: f64 = orders.iter().map(|o| o.total_amount).sum();

        let mut newest: Vec<&Order> = orders.iter().collect();
        // Newest first; orders without a parseable date sink to the bottom
        newest.sort_by(|a, b| b.created_at_parsed().cmp(&a.created_at_parsed()));

        let recent_orders = newest
            .into_iter()
            .take(RECENT_ORDER_COUNT)
            .map(|order| RecentOrder {
                id: order.id,
                order_number: order.display_number(),
                customer: order
                    .customer_line()
                    .map(|line| truncate_string(line, CUSTOMER_LABEL_LEN))
                    .unwrap_or_else(|| NO_CUSTOMER.to_string()),
                total: order.total_amount,
                status: order.status,
                created_at: order.created_at.clone(),
            })
            .collect();

        Self {
            total_products: products.len(),
            total_orders: orders.len(),
            total_revenue,
            recent_orders,
        }
    }
}

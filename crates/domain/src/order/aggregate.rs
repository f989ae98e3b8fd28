//! Order aggregate: an immutable snapshot of a validated cart.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, Totals};
use crate::product::SizeSelection;

use super::{Address, OrderError, OrderStatus, Payment, generate_order_number};

/// One frozen line in an order. Price and discount are copied from the
/// cart line at checkout and never re-read from the live product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub size: SizeSelection,
    pub color: Option<String>,
    pub unit_price: Money,
    pub original_price: Option<Money>,
    pub discount: Money,
}

/// One append-only entry in an order's status timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

/// An order: created once per checkout, then mutated only through status
/// transitions. Never deleted — cancellation is a status, not removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    /// Totals copied verbatim from the cart at checkout time.
    pub totals: Totals,
    pub coupon_code: Option<String>,
    pub status: OrderStatus,
    pub payment: Payment,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub notes: Option<String>,
    pub timeline: Vec<TimelineEntry>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Snapshots a validated cart into a new pending order.
    ///
    /// Items and totals are copied as stored on the cart; billing falls
    /// back to the shipping address when not given.
    pub fn from_cart(
        cart: &Cart,
        payment: Payment,
        shipping_address: Address,
        billing_address: Option<Address>,
        notes: Option<String>,
    ) -> Result<Self, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::NoItems);
        }

        let now = Utc::now();
        let items = cart
            .items
            .iter()
            .map(|line| OrderItem {
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                size: line.size.clone(),
                color: line.color.clone(),
                unit_price: line.unit_price,
                original_price: line.original_price,
                discount: line.discount,
            })
            .collect();

        let billing_address = billing_address.unwrap_or_else(|| shipping_address.clone());

        Ok(Self {
            id: OrderId::new(),
            order_number: generate_order_number(now),
            user_id: cart.user_id,
            items,
            totals: cart.totals,
            coupon_code: cart.coupon.as_ref().map(|c| c.code.clone()),
            status: OrderStatus::Pending,
            payment,
            shipping_address,
            billing_address,
            notes,
            timeline: vec![TimelineEntry {
                status: OrderStatus::Pending,
                timestamp: now,
                note: Some("Order placed".to_string()),
            }],
            created_at: now,
        })
    }

    /// Sets the status and appends a timeline entry.
    ///
    /// Appends unconditionally — which transitions are reachable is
    /// enforced by the checkout layer, not here.
    pub fn update_status(&mut self, status: OrderStatus, note: Option<String>) {
        self.status = status;
        self.timeline.push(TimelineEntry {
            status,
            timestamp: Utc::now(),
            note,
        });
    }

    /// Returns true if the given user owns this order.
    pub fn owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

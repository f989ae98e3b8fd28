//! Order lifecycle operations: reads, cancellation, status transitions.

use common::{OrderId, UserId};
use domain::{Order, OrderError, OrderStatus};
use store::{OrderStore, ProductStore};

use crate::{CheckoutError, Result};

/// Order reads and lifecycle transitions, generic over the product and
/// order stores. Cancellation compensates the inventory ledger by
/// releasing the order's reserved stock.
pub struct OrderFlow<P, O> {
    products: P,
    orders: O,
}

impl<P, O> OrderFlow<P, O>
where
    P: ProductStore,
    O: OrderStore,
{
    /// Creates a new order flow.
    pub fn new(products: P, orders: O) -> Self {
        Self { products, orders }
    }

    /// Fetches an order, enforcing ownership.
    #[tracing::instrument(skip(self))]
    pub async fn order(&self, user_id: UserId, order_id: OrderId) -> Result<Order> {
        let order = self.require_order(order_id).await?;
        if !order.owned_by(user_id) {
            return Err(CheckoutError::NotOwner);
        }
        Ok(order)
    }

    /// Lists the user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// Cancels an order and releases its stock.
    ///
    /// Only pending and confirmed orders can be cancelled; anything
    /// further along has left the warehouse.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, user_id: UserId, order_id: OrderId) -> Result<Order> {
        let mut order = self.order(user_id, order_id).await?;
        if !order.status.can_cancel() {
            return Err(OrderError::NotCancellable {
                status: order.status,
            }
            .into());
        }

        self.release_order_stock(&order).await;
        order.update_status(OrderStatus::Cancelled, Some("Cancelled by customer".into()));
        self.orders.update(&order).await?;
        metrics::counter!("orders_cancelled").increment(1);
        tracing::info!(order_id = %order.id, "order cancelled");
        Ok(order)
    }

    /// Moves an order to a new status (admin operation, no ownership
    /// check). A transition into `Cancelled` releases stock like a
    /// customer cancellation.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        note: Option<String>,
    ) -> Result<Order> {
        let mut order = self.require_order(order_id).await?;
        if !order.status.can_transition_to(status) {
            return Err(OrderError::IllegalStatusTransition {
                from: order.status,
                to: status,
            }
            .into());
        }

        if status == OrderStatus::Cancelled {
            self.release_order_stock(&order).await;
        }
        order.update_status(status, note);
        self.orders.update(&order).await?;
        tracing::info!(order_id = %order.id, status = %status, "order status updated");
        Ok(order)
    }

    /// Best-effort release of every line's stock; a failed line is logged
    /// and skipped so the rest still get released.
    async fn release_order_stock(&self, order: &Order) {
        for item in &order.items {
            if let Err(e) = self
                .products
                .release_stock(item.product_id, &item.size, item.quantity)
                .await
            {
                tracing::error!(
                    order_id = %order.id,
                    product_id = %item.product_id,
                    error = %e,
                    "failed to release stock for cancelled order line"
                );
            }
        }
    }

    async fn require_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound { order_id })
    }
}

//! Checkout orchestrator: converts a validated cart into an order.
//!
//! The flow is all-or-nothing. Validation (steps 1-2) has no side
//! effects; reservation re-checks sufficiency atomically at the store and
//! rolls back already-reserved lines on any failure, so an aborted
//! checkout leaves zero orders and unchanged stock. Cart clearing is the
//! final step by design: a crash after order persistence leaves a stale
//! cart whose re-checkout fails availability, never a double charge.

use common::UserId;
use domain::order::{Address, Payment, PaymentDetails, PaymentMethod};
use domain::{Order, Product, SizeSelection};
use store::{CartStore, OrderStore, ProductStore};

use crate::{CheckoutError, Result};

/// Client request to place an order from the current cart.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub payment_method: PaymentMethod,
    pub mobile_number: Option<String>,
    pub transaction_number: Option<String>,
    pub notes: Option<String>,
}

/// A line whose stock has been reserved in the current checkout, kept so
/// a later failure can release it again.
struct ReservedLine {
    product_id: common::ProductId,
    product_name: String,
    size: SizeSelection,
    quantity: u32,
}

/// Orchestrates the cart → inventory → order → cart-clear pipeline.
pub struct CheckoutOrchestrator<P, C, O> {
    products: P,
    carts: C,
    orders: O,
}

impl<P, C, O> CheckoutOrchestrator<P, C, O>
where
    P: ProductStore,
    C: CartStore,
    O: OrderStore,
{
    /// Creates a new orchestrator.
    pub fn new(products: P, carts: C, orders: O) -> Self {
        Self {
            products,
            carts,
            orders,
        }
    }

    /// Places an order from the user's cart.
    ///
    /// Fails fast with no side effects while any line is invalid; once
    /// reservation starts, a failed line releases everything reserved so
    /// far before returning the error.
    #[tracing::instrument(skip(self, req), fields(%user_id))]
    pub async fn place_order(&self, user_id: UserId, req: CheckoutRequest) -> Result<Order> {
        metrics::counter!("checkout_executions_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.run(user_id, req).await;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("checkout_completed").increment(1);
                tracing::info!(order_id = %order.id, order_number = %order.order_number, "checkout completed");
            }
            Err(e) => {
                metrics::counter!("checkout_failed").increment(1);
                tracing::warn!(error = %e, "checkout failed");
            }
        }
        result
    }

    async fn run(&self, user_id: UserId, req: CheckoutRequest) -> Result<Order> {
        // 1. Load the cart.
        let mut cart = self
            .carts
            .get(user_id)
            .await?
            .ok_or(CheckoutError::CartNotFound)?;
        if cart.is_empty() {
            return Err(CheckoutError::CartEmpty);
        }

        // Payment details are checked before the per-line pass: when a cart
        // has both a stale line and bad payment details the payment error
        // wins. Either way nothing has been reserved or written yet.
        let payment = Payment::new(
            req.payment_method,
            PaymentDetails {
                mobile_number: req.mobile_number,
                transaction_number: req.transaction_number,
            },
        )?;

        // 2. Re-validate every line against a fresh product read. Stock is
        //    only authoritative at commit time; anything may have changed
        //    since the items were added.
        for line in &cart.items {
            let product = self.fresh_product(line.product_id).await?;
            product
                .check_availability(&line.size, line.quantity)
                .map_err(|e| CheckoutError::from_stock(&product, e))?;
        }

        // 3. Reserve stock line by line. The store re-checks sufficiency
        //    atomically, so a concurrent sale between step 2 and here
        //    surfaces as InsufficientStock; roll back and abort.
        let mut reserved: Vec<ReservedLine> = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            match self
                .products
                .reserve_stock(line.product_id, &line.size, line.quantity)
                .await
            {
                Ok(()) => reserved.push(ReservedLine {
                    product_id: line.product_id,
                    product_name: line.product_name.clone(),
                    size: line.size.clone(),
                    quantity: line.quantity,
                }),
                Err(e) => {
                    self.rollback_reservations(&reserved).await;
                    return Err(CheckoutError::from_stock_op(e, &line.product_name));
                }
            }
        }

        // 4-5. Snapshot the cart into an order and persist it.
        let order = Order::from_cart(
            &cart,
            payment,
            req.shipping_address,
            req.billing_address,
            req.notes,
        )?;
        if let Err(e) = self.orders.insert(&order).await {
            self.rollback_reservations(&reserved).await;
            return Err(e.into());
        }

        // 6. Clear the cart last. A failure here leaves a stale cart but a
        //    committed order; the stale cart fails availability on
        //    re-checkout, so log and return the order.
        cart.clear();
        if let Err(e) = self.carts.save(&cart).await {
            tracing::warn!(order_id = %order.id, error = %e, "order committed but cart clear failed");
        }

        Ok(order)
    }

    /// Releases every line reserved in this checkout, in reverse order.
    async fn rollback_reservations(&self, reserved: &[ReservedLine]) {
        for line in reserved.iter().rev() {
            if let Err(e) = self
                .products
                .release_stock(line.product_id, &line.size, line.quantity)
                .await
            {
                // Nothing left to do but record it; stock for this line
                // stays reserved until released operationally.
                tracing::error!(
                    product_id = %line.product_id,
                    product = %line.product_name,
                    error = %e,
                    "failed to release reserved stock during checkout rollback"
                );
            }
        }
    }

    async fn fresh_product(&self, product_id: common::ProductId) -> Result<Product> {
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound { product_id })?;
        if !product.active {
            return Err(CheckoutError::ProductInactive {
                name: product.name,
            });
        }
        Ok(product)
    }
}

//! Cart aggregate: mutable per-user line items with derived totals.

use chrono::{DateTime, Utc};
use common::{LineItemId, Money, ProductId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coupon::Coupon;
use crate::product::SizeSelection;

/// Maximum quantity accepted for a single add operation.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// Subtotal at or above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Money = Money::from_dollars(50);

/// Flat shipping fee below the free-shipping threshold.
pub const SHIPPING_FLAT: Money = Money::from_cents(599);

/// Sales tax rate in basis points (8.5%), applied after discounts.
pub const TAX_RATE_BPS: i64 = 850;

/// Errors raised by cart mutations themselves (stock failures come from
/// [`crate::StockError`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("cart item {item_id} not found")]
    ItemNotFound { item_id: LineItemId },

    #[error("invalid quantity {quantity} (must be between 1 and {MAX_LINE_QUANTITY})")]
    InvalidQuantity { quantity: u32 },

    #[error("coupon code {code} is not recognized")]
    InvalidCoupon { code: String },

    #[error("cart is empty")]
    EmptyCart,
}

/// One (product, size, color) line in a cart.
///
/// `unit_price` is frozen at add time and is what the order snapshot
/// later copies; it is never re-read from the live product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub size: SizeSelection,
    pub color: Option<String>,
    pub unit_price: Money,
    pub original_price: Option<Money>,
    /// Per-unit discount captured at add time (original minus current price).
    pub discount: Money,
}

impl CartItem {
    /// Returns the line total (`unit_price * quantity`).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Returns true if `other` identifies the same (product, size, color)
    /// line for merging purposes.
    pub fn same_line(&self, product_id: ProductId, size: &SizeSelection, color: &Option<String>) -> bool {
        self.product_id == product_id && self.size == *size && self.color == *color
    }
}

/// Derived cart totals. Always recomputed from items plus coupon after
/// every mutation, never stored stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

/// A user's shopping cart.
///
/// Mutation does not reserve inventory; stock is only committed at
/// checkout, so contents can go stale between add and checkout. Callers
/// (the `checkout` crate) re-validate at every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub coupon: Option<Coupon>,
    pub totals: Totals,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            coupon: None,
            totals: Totals::default(),
            updated_at: Utc::now(),
        }
    }

    /// Returns true if the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finds a line by its item id.
    pub fn item(&self, item_id: LineItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Returns the quantity already in the cart for a merge key.
    pub fn quantity_for(
        &self,
        product_id: ProductId,
        size: &SizeSelection,
        color: &Option<String>,
    ) -> u32 {
        self.items
            .iter()
            .filter(|i| i.same_line(product_id, size, color))
            .map(|i| i.quantity)
            .sum()
    }

    /// Merges the item into an existing line with the same
    /// (product, size, color) key, or appends it as a new line.
    ///
    /// Stock validation happens in the cart service before this is called;
    /// the aggregate only maintains the merge invariant.
    pub fn upsert_item(&mut self, item: CartItem) {
        match self
            .items
            .iter_mut()
            .find(|i| i.same_line(item.product_id, &item.size, &item.color))
        {
            Some(existing) => existing.quantity += item.quantity,
            None => self.items.push(item),
        }
        self.touch();
    }

    /// Sets the quantity of an existing line; zero removes the line.
    pub fn set_item_quantity(
        &mut self,
        item_id: LineItemId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove_item(item_id);
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(CartError::ItemNotFound { item_id })?;
        item.quantity = quantity;
        self.touch();
        Ok(())
    }

    /// Removes a line from the cart.
    pub fn remove_item(&mut self, item_id: LineItemId) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        if self.items.len() == before {
            return Err(CartError::ItemNotFound { item_id });
        }
        self.touch();
        Ok(())
    }

    /// Applies a recognized coupon. Fails on an empty cart.
    pub fn apply_coupon(&mut self, coupon: Coupon) -> Result<(), CartError> {
        if self.is_empty() {
            return Err(CartError::EmptyCart);
        }
        self.coupon = Some(coupon);
        self.touch();
        Ok(())
    }

    /// Drops the applied coupon, if any.
    pub fn remove_coupon(&mut self) {
        self.coupon = None;
        self.touch();
    }

    /// Empties the cart: items gone, coupon dropped, totals zeroed.
    /// Idempotent.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon = None;
        self.totals = Totals::default();
        self.touch();
    }

    /// Recomputes all derived totals from items plus coupon.
    ///
    /// This is an explicit caller-driven step after each mutation — never
    /// invoked from a persistence hook, which would recurse through
    /// save-triggers-recompute-triggers-save.
    pub fn recompute_totals(&mut self) {
        if self.items.is_empty() {
            self.totals = Totals::default();
            return;
        }

        let subtotal: Money = self.items.iter().map(CartItem::line_total).sum();
        let discount = self
            .coupon
            .as_ref()
            .map(|c| c.discount_for(subtotal))
            .unwrap_or_default();
        let shipping = if subtotal >= FREE_SHIPPING_THRESHOLD {
            Money::zero()
        } else {
            SHIPPING_FLAT
        };
        let tax = (subtotal - discount).percent_bps(TAX_RATE_BPS);

        self.totals = Totals {
            subtotal,
            discount,
            shipping,
            tax,
            total: subtotal + tax + shipping - discount,
        };
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: ProductId, quantity: u32, size: &str, color: &str, cents: i64) -> CartItem {
        CartItem {
            id: LineItemId::new(),
            product_id,
            product_name: "Oxford Shirt".to_string(),
            quantity,
            size: SizeSelection::Sized(size.to_string()),
            color: Some(color.to_string()),
            unit_price: Money::from_cents(cents),
            original_price: None,
            discount: Money::zero(),
        }
    }

    #[test]
    fn test_upsert_merges_same_line() {
        let mut cart = Cart::new(UserId::new());
        let product_id = ProductId::new();

        cart.upsert_item(item(product_id, 2, "M", "Blue", 10_000));
        cart.upsert_item(item(product_id, 1, "M", "Blue", 10_000));

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
    }

    #[test]
    fn test_upsert_keeps_distinct_lines_separate() {
        let mut cart = Cart::new(UserId::new());
        let product_id = ProductId::new();

        cart.upsert_item(item(product_id, 1, "M", "Blue", 10_000));
        cart.upsert_item(item(product_id, 1, "L", "Blue", 10_000));
        cart.upsert_item(item(product_id, 1, "M", "Red", 10_000));

        assert_eq!(cart.items.len(), 3);
    }

    #[test]
    fn test_totals_recomputed_from_items() {
        let mut cart = Cart::new(UserId::new());
        cart.upsert_item(item(ProductId::new(), 2, "M", "Blue", 10_000));
        cart.recompute_totals();

        // $200 subtotal, free shipping, 8.5% tax
        assert_eq!(cart.totals.subtotal, Money::from_cents(20_000));
        assert_eq!(cart.totals.shipping, Money::zero());
        assert_eq!(cart.totals.tax, Money::from_cents(1_700));
        assert_eq!(cart.totals.total, Money::from_cents(21_700));
    }

    #[test]
    fn test_shipping_below_threshold() {
        let mut cart = Cart::new(UserId::new());
        cart.upsert_item(item(ProductId::new(), 1, "M", "Blue", 2_000));
        cart.recompute_totals();

        assert_eq!(cart.totals.shipping, SHIPPING_FLAT);
        assert_eq!(
            cart.totals.total,
            Money::from_cents(2_000) + cart.totals.tax + SHIPPING_FLAT
        );
    }

    #[test]
    fn test_coupon_discount_taxes_reduced_base() {
        let mut cart = Cart::new(UserId::new());
        cart.upsert_item(item(ProductId::new(), 1, "M", "Blue", 10_000));
        cart.apply_coupon(Coupon::lookup("WELCOME10").unwrap()).unwrap();
        cart.recompute_totals();

        assert_eq!(cart.totals.discount, Money::from_cents(1_000));
        // tax on $90
        assert_eq!(cart.totals.tax, Money::from_cents(765));
        assert_eq!(
            cart.totals.total,
            cart.totals.subtotal + cart.totals.tax + cart.totals.shipping - cart.totals.discount
        );
    }

    #[test]
    fn test_total_identity_after_every_mutation() {
        let mut cart = Cart::new(UserId::new());
        let product_id = ProductId::new();
        cart.upsert_item(item(product_id, 3, "M", "Blue", 1_999));
        cart.recompute_totals();

        let check = |cart: &Cart| {
            assert_eq!(
                cart.totals.total,
                cart.totals.subtotal + cart.totals.tax + cart.totals.shipping
                    - cart.totals.discount
            );
        };
        check(&cart);

        let item_id = cart.items[0].id;
        cart.set_item_quantity(item_id, 1).unwrap();
        cart.recompute_totals();
        check(&cart);

        cart.remove_item(item_id).unwrap();
        cart.recompute_totals();
        check(&cart);
        assert_eq!(cart.totals, Totals::default());
    }

    #[test]
    fn test_apply_coupon_to_empty_cart_fails() {
        let mut cart = Cart::new(UserId::new());
        let result = cart.apply_coupon(Coupon::lookup("SAVE20").unwrap());
        assert_eq!(result, Err(CartError::EmptyCart));
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new(UserId::new());
        cart.upsert_item(item(ProductId::new(), 2, "M", "Blue", 1_000));
        let item_id = cart.items[0].id;

        cart.set_item_quantity(item_id, 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_unknown_item_fails() {
        let mut cart = Cart::new(UserId::new());
        let missing = LineItemId::new();
        assert_eq!(
            cart.remove_item(missing),
            Err(CartError::ItemNotFound { item_id: missing })
        );
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut cart = Cart::new(UserId::new());
        cart.upsert_item(item(ProductId::new(), 2, "M", "Blue", 1_000));
        cart.apply_coupon(Coupon::lookup("WELCOME10").unwrap()).unwrap();
        cart.recompute_totals();

        cart.clear();
        let after_first = cart.clone();
        cart.clear();

        assert_eq!(cart.items, after_first.items);
        assert_eq!(cart.coupon, after_first.coupon);
        assert_eq!(cart.totals, Totals::default());
    }
}

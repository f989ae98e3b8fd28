//! Cart mutation service.
//!
//! Every mutation follows the same two-phase shape: validate against the
//! live product, mutate the aggregate, recompute totals, persist. Cart
//! mutation never reserves inventory — stock is only committed at
//! checkout, which re-validates everything.

use common::{LineItemId, Money, UserId};
use domain::cart::MAX_LINE_QUANTITY;
use domain::{Cart, CartError, CartItem, Coupon, Product};
use store::{CartStore, ProductStore};

use crate::{CheckoutError, Result};

/// Client request to add an item to the cart.
#[derive(Debug, Clone)]
pub struct AddItemRequest {
    pub product_id: common::ProductId,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Service for cart operations, generic over the product and cart stores.
pub struct CartService<P, C> {
    products: P,
    carts: C,
}

impl<P, C> CartService<P, C>
where
    P: ProductStore,
    C: CartStore,
{
    /// Creates a new cart service.
    pub fn new(products: P, carts: C) -> Self {
        Self { products, carts }
    }

    /// Returns the user's cart, creating (and persisting) an empty one on
    /// first access.
    #[tracing::instrument(skip(self))]
    pub async fn cart(&self, user_id: UserId) -> Result<Cart> {
        if let Some(cart) = self.carts.get(user_id).await? {
            return Ok(cart);
        }
        let cart = Cart::new(user_id);
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Adds an item, merging into an existing (product, size, color) line.
    ///
    /// The merged quantity — not just the delta — is validated against
    /// available stock, and a failure reports the remaining headroom.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(&self, user_id: UserId, req: AddItemRequest) -> Result<Cart> {
        if req.quantity == 0 || req.quantity > MAX_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity {
                quantity: req.quantity,
            }
            .into());
        }

        let product = self.active_product(req.product_id).await?;
        let selection = product
            .resolve_selection(req.size)
            .map_err(|e| CheckoutError::from_stock(&product, e))?;
        let available = product
            .availability(&selection)
            .map_err(|e| CheckoutError::from_stock(&product, e))?;

        let mut cart = self.cart(user_id).await?;
        let existing = cart.quantity_for(product.id, &selection, &req.color);
        let merged = existing + req.quantity;
        if merged > available {
            return Err(CheckoutError::Stock {
                product: product.name.clone(),
                source: domain::StockError::InsufficientStock {
                    size: selection.to_string(),
                    requested: req.quantity,
                    available: available.saturating_sub(existing),
                },
            });
        }

        let discount = product
            .original_price
            .filter(|orig| *orig > product.price)
            .map(|orig| orig - product.price)
            .unwrap_or(Money::zero());

        cart.upsert_item(CartItem {
            id: LineItemId::new(),
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: req.quantity,
            size: selection,
            color: req.color,
            unit_price: product.price,
            original_price: product.original_price,
            discount,
        });
        cart.recompute_totals();
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Sets a line's quantity, re-validating against live stock.
    /// Quantities at or below zero remove the line.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        item_id: LineItemId,
        quantity: i64,
    ) -> Result<Cart> {
        let mut cart = self.require_cart(user_id).await?;

        if quantity <= 0 {
            cart.remove_item(item_id).map_err(CheckoutError::from)?;
            cart.recompute_totals();
            self.carts.save(&cart).await?;
            return Ok(cart);
        }
        if quantity > i64::from(MAX_LINE_QUANTITY) {
            return Err(CartError::InvalidQuantity {
                quantity: u32::try_from(quantity).unwrap_or(u32::MAX),
            }
            .into());
        }
        let quantity = quantity as u32;

        let line = cart
            .item(item_id)
            .ok_or(CartError::ItemNotFound { item_id })?
            .clone();

        let product = self.active_product(line.product_id).await?;
        product
            .check_availability(&line.size, quantity)
            .map_err(|e| CheckoutError::from_stock(&product, e))?;

        cart.set_item_quantity(item_id, quantity)
            .map_err(CheckoutError::from)?;
        cart.recompute_totals();
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Removes a line from the cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, user_id: UserId, item_id: LineItemId) -> Result<Cart> {
        let mut cart = self.require_cart(user_id).await?;
        cart.remove_item(item_id).map_err(CheckoutError::from)?;
        cart.recompute_totals();
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Empties the cart. Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<Cart> {
        let mut cart = self.cart(user_id).await?;
        cart.clear();
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Applies a recognized coupon code.
    #[tracing::instrument(skip(self))]
    pub async fn apply_coupon(&self, user_id: UserId, code: &str) -> Result<Cart> {
        let coupon = Coupon::lookup(code).ok_or_else(|| CartError::InvalidCoupon {
            code: code.to_string(),
        })?;

        let mut cart = self.require_cart(user_id).await?;
        cart.apply_coupon(coupon).map_err(CheckoutError::from)?;
        cart.recompute_totals();
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Drops the applied coupon.
    #[tracing::instrument(skip(self))]
    pub async fn remove_coupon(&self, user_id: UserId) -> Result<Cart> {
        let mut cart = self.require_cart(user_id).await?;
        cart.remove_coupon();
        cart.recompute_totals();
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    async fn require_cart(&self, user_id: UserId) -> Result<Cart> {
        self.carts
            .get(user_id)
            .await?
            .ok_or(CheckoutError::CartNotFound)
    }

    async fn active_product(&self, product_id: common::ProductId) -> Result<Product> {
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

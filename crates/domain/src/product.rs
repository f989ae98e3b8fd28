//! Product catalog types and the stock availability contract.

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stock-related failures surfaced by availability checks and reservations.
///
/// These are never retried automatically: stock state is authoritative and
/// a blind retry would double-decrement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// The product has no stock entry for the requested size.
    #[error("size {size} not found")]
    SizeNotFound { size: String },

    /// The size exists but is currently marked unavailable.
    #[error("size {size} is unavailable")]
    SizeUnavailable { size: String },

    /// Not enough stock to satisfy the requested quantity.
    #[error("only {available} items available in size {size}")]
    InsufficientStock {
        size: String,
        requested: u32,
        available: u32,
    },
}

/// A size choice on a cart or order line.
///
/// Free-size products carry no per-size breakdown, so "no size applicable"
/// is a distinct variant rather than a sentinel string. Serialized as an
/// optional string (`null` for [`SizeSelection::Unsized`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum SizeSelection {
    /// A concrete size label such as `"M"` or `"42"`.
    Sized(String),
    /// The product has a single general stock counter.
    Unsized,
}

impl From<Option<String>> for SizeSelection {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(size) => SizeSelection::Sized(size),
            None => SizeSelection::Unsized,
        }
    }
}

impl From<SizeSelection> for Option<String> {
    fn from(value: SizeSelection) -> Self {
        match value {
            SizeSelection::Sized(size) => Some(size),
            SizeSelection::Unsized => None,
        }
    }
}

impl std::fmt::Display for SizeSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeSelection::Sized(size) => write!(f, "{size}"),
            SizeSelection::Unsized => write!(f, "one size"),
        }
    }
}

/// Stock counter for one size of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    pub size: String,
    pub stock: u32,
    pub available: bool,
}

impl SizeStock {
    /// Creates a size entry; availability follows the stock level.
    pub fn new(size: impl Into<String>, stock: u32) -> Self {
        Self {
            size: size.into(),
            stock,
            available: stock > 0,
        }
    }
}

/// Stock layout of a product: either a per-size breakdown or one
/// general counter for free-size products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductInventory {
    Sized(Vec<SizeStock>),
    FreeSize { stock: u32, available: bool },
}

impl ProductInventory {
    /// Creates a free-size inventory with the given stock.
    pub fn free_size(stock: u32) -> Self {
        ProductInventory::FreeSize {
            stock,
            available: stock > 0,
        }
    }
}

/// A catalog product.
///
/// Owned by the catalog; carts and orders reference it by id and freeze
/// its price at add time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    /// Pre-discount price, when the product is on sale.
    pub original_price: Option<Money>,
    pub active: bool,
    pub inventory: ProductInventory,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new active product.
    pub fn new(name: impl Into<String>, price: Money, inventory: ProductInventory) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            description: String::new(),
            price,
            original_price: None,
            active: true,
            inventory,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the product uses one general stock counter.
    pub fn is_free_size(&self) -> bool {
        matches!(self.inventory, ProductInventory::FreeSize { .. })
    }

    /// Resolves the size label a client sent against this product's layout.
    ///
    /// Free-size products ignore any label and resolve to
    /// [`SizeSelection::Unsized`]; sized products require one.
    pub fn resolve_selection(&self, size: Option<String>) -> Result<SizeSelection, StockError> {
        match (&self.inventory, size) {
            (ProductInventory::FreeSize { .. }, _) => Ok(SizeSelection::Unsized),
            (ProductInventory::Sized(_), Some(size)) => Ok(SizeSelection::Sized(size)),
            (ProductInventory::Sized(_), None) => Err(StockError::SizeNotFound {
                size: "(none)".to_string(),
            }),
        }
    }

    /// Returns the available stock for the given selection.
    ///
    /// Fails with `SizeNotFound` when no entry matches, `SizeUnavailable`
    /// when the entry is switched off.
    pub fn availability(&self, selection: &SizeSelection) -> Result<u32, StockError> {
        match (&self.inventory, selection) {
            (ProductInventory::FreeSize { stock, available }, SizeSelection::Unsized) => {
                if !available && *stock > 0 {
                    return Err(StockError::SizeUnavailable {
                        size: selection.to_string(),
                    });
                }
                Ok(*stock)
            }
            (ProductInventory::Sized(sizes), SizeSelection::Sized(size)) => {
                let entry = sizes.iter().find(|s| s.size == *size).ok_or_else(|| {
                    StockError::SizeNotFound {
                        size: size.clone(),
                    }
                })?;
                if !entry.available && entry.stock > 0 {
                    return Err(StockError::SizeUnavailable { size: size.clone() });
                }
                Ok(entry.stock)
            }
            // Layout and selection disagree; treat as an unknown size.
            (_, selection) => Err(StockError::SizeNotFound {
                size: selection.to_string(),
            }),
        }
    }

    /// Checks that `quantity` items can be taken for the selection.
    pub fn check_availability(
        &self,
        selection: &SizeSelection,
        quantity: u32,
    ) -> Result<(), StockError> {
        let available = self.availability(selection)?;
        if available < quantity {
            return Err(StockError::InsufficientStock {
                size: selection.to_string(),
                requested: quantity,
                available,
            });
        }
        Ok(())
    }

    /// Decrements stock by `quantity`, flipping availability off when the
    /// counter reaches zero.
    ///
    /// Callers must hold exclusive access to the product while invoking
    /// this; the in-memory store runs it under a write lock and the
    /// Postgres store expresses it as one conditional UPDATE instead.
    pub fn reserve(&mut self, selection: &SizeSelection, quantity: u32) -> Result<(), StockError> {
        self.check_availability(selection, quantity)?;
        match (&mut self.inventory, selection) {
            (ProductInventory::FreeSize { stock, available }, SizeSelection::Unsized) => {
                *stock -= quantity;
                *available = *stock > 0;
            }
            (ProductInventory::Sized(sizes), SizeSelection::Sized(size)) => {
                if let Some(entry) = sizes.iter_mut().find(|s| s.size == *size) {
                    entry.stock -= quantity;
                    entry.available = entry.stock > 0;
                }
            }
            _ => unreachable!("check_availability validated the selection"),
        }
        Ok(())
    }

    /// Restores previously reserved stock, flipping availability back on.
    pub fn release(&mut self, selection: &SizeSelection, quantity: u32) -> Result<(), StockError> {
        match (&mut self.inventory, selection) {
            (ProductInventory::FreeSize { stock, available }, SizeSelection::Unsized) => {
                *stock += quantity;
                *available = *stock > 0;
                Ok(())
            }
            (ProductInventory::Sized(sizes), SizeSelection::Sized(size)) => {
                let entry = sizes.iter_mut().find(|s| s.size == *size).ok_or_else(|| {
                    StockError::SizeNotFound {
                        size: size.clone(),
                    }
                })?;
                entry.stock += quantity;
                entry.available = entry.stock > 0;
                Ok(())
            }
            (_, selection) => Err(StockError::SizeNotFound {
                size: selection.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized_product() -> Product {
        Product::new(
            "Oxford Shirt",
            Money::from_cents(4_500),
            ProductInventory::Sized(vec![SizeStock::new("M", 5), SizeStock::new("L", 0)]),
        )
    }

    fn free_size_product() -> Product {
        Product::new(
            "Canvas Tote",
            Money::from_cents(1_200),
            ProductInventory::free_size(3),
        )
    }

    #[test]
    fn test_resolve_selection_free_size_ignores_label() {
        let product = free_size_product();
        assert_eq!(
            product.resolve_selection(Some("M".to_string())).unwrap(),
            SizeSelection::Unsized
        );
        assert_eq!(
            product.resolve_selection(None).unwrap(),
            SizeSelection::Unsized
        );
    }

    #[test]
    fn test_resolve_selection_sized_requires_label() {
        let product = sized_product();
        assert!(matches!(
            product.resolve_selection(None),
            Err(StockError::SizeNotFound { .. })
        ));
    }

    #[test]
    fn test_availability_unknown_size() {
        let product = sized_product();
        let result = product.availability(&SizeSelection::Sized("INVALID".to_string()));
        assert_eq!(
            result,
            Err(StockError::SizeNotFound {
                size: "INVALID".to_string()
            })
        );
    }

    #[test]
    fn test_availability_unavailable_size() {
        let mut product = sized_product();
        if let ProductInventory::Sized(sizes) = &mut product.inventory {
            sizes[0].available = false;
        }
        let result = product.availability(&SizeSelection::Sized("M".to_string()));
        assert!(matches!(result, Err(StockError::SizeUnavailable { .. })));
    }

    #[test]
    fn test_check_availability_insufficient_reports_available() {
        let product = sized_product();
        let result = product.check_availability(&SizeSelection::Sized("M".to_string()), 8);
        assert_eq!(
            result,
            Err(StockError::InsufficientStock {
                size: "M".to_string(),
                requested: 8,
                available: 5,
            })
        );
    }

    #[test]
    fn test_reserve_decrements_and_flips_availability() {
        let mut product = sized_product();
        let size = SizeSelection::Sized("M".to_string());

        product.reserve(&size, 5).unwrap();

        assert_eq!(product.availability(&size).unwrap(), 0);
        if let ProductInventory::Sized(sizes) = &product.inventory {
            assert!(!sizes[0].available);
        }
    }

    #[test]
    fn test_reserve_never_goes_negative() {
        let mut product = free_size_product();
        let result = product.reserve(&SizeSelection::Unsized, 4);
        assert!(matches!(result, Err(StockError::InsufficientStock { .. })));
        assert_eq!(product.availability(&SizeSelection::Unsized).unwrap(), 3);
    }

    #[test]
    fn test_release_restores_availability() {
        let mut product = sized_product();
        let size = SizeSelection::Sized("M".to_string());

        product.reserve(&size, 5).unwrap();
        product.release(&size, 2).unwrap();

        assert_eq!(product.availability(&size).unwrap(), 2);
        if let ProductInventory::Sized(sizes) = &product.inventory {
            assert!(sizes[0].available);
        }
    }

    #[test]
    fn test_size_selection_serde_as_option() {
        let sized = SizeSelection::Sized("M".to_string());
        assert_eq!(serde_json::to_string(&sized).unwrap(), "\"M\"");

        let unsized_json = serde_json::to_string(&SizeSelection::Unsized).unwrap();
        assert_eq!(unsized_json, "null");

        let back: SizeSelection = serde_json::from_str("null").unwrap();
        assert_eq!(back, SizeSelection::Unsized);
    }

    #[test]
    fn test_size_stock_new_availability_follows_stock() {
        assert!(SizeStock::new("M", 1).available);
        assert!(!SizeStock::new("M", 0).available);
    }
}

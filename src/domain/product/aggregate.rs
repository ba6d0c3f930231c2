use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::ProductId;
use super::errors::ProductError;

// ============================================================================
// Product - catalog entry with the authoritative stock count
// ============================================================================

/// Stock is a `u32`, so a negative count is unrepresentable. The order
/// engine changes it only through `ProductStore::update_stock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: u32,
    pub category: String,
    pub sku: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// `stock_quantity >= requested`
    pub fn is_available(&self, requested: u32) -> bool {
        self.stock_quantity >= requested
    }
}

/// Catalog payload for a new product
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: u32,
    pub category: String,
    pub sku: String,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        price: Decimal,
        stock_quantity: u32,
        category: impl Into<String>,
        sku: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            stock_quantity,
            category: category.into(),
            sku: sku.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate the payload and build the product record under the given id
    pub fn into_product(self, id: ProductId) -> Result<Product, ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyName);
        }
        if self.price <= Decimal::ZERO {
            return Err(ProductError::NonPositivePrice(self.price));
        }
        if self.category.trim().is_empty() {
            return Err(ProductError::EmptyCategory);
        }
        if self.sku.trim().is_empty() {
            return Err(ProductError::EmptySku);
        }

        let now = Utc::now();
        Ok(Product {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            stock_quantity: self.stock_quantity,
            category: self.category.trim().to_string(),
            sku: self.sku.trim().to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(price: Decimal) -> NewProduct {
        NewProduct::new("Widget", price, 10, "tools", "WID-001")
    }

    #[test]
    fn test_into_product() {
        let id = ProductId::new();
        let product = widget(Decimal::new(5000, 2)).into_product(id).unwrap();

        assert_eq!(product.id, id);
        assert_eq!(product.price, Decimal::new(5000, 2));
        assert_eq!(product.stock_quantity, 10);
        assert_eq!(product.sku, "WID-001");
    }

    #[test]
    fn test_price_must_be_positive() {
        let zero = widget(Decimal::ZERO).into_product(ProductId::new());
        assert_eq!(zero.unwrap_err(), ProductError::NonPositivePrice(Decimal::ZERO));

        let negative = widget(Decimal::new(-1, 0)).into_product(ProductId::new());
        assert!(matches!(negative.unwrap_err(), ProductError::NonPositivePrice(_)));
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut payload = widget(Decimal::ONE);
        payload.sku = " ".to_string();
        assert_eq!(payload.into_product(ProductId::new()).unwrap_err(), ProductError::EmptySku);

        let mut payload = widget(Decimal::ONE);
        payload.name = String::new();
        assert_eq!(payload.into_product(ProductId::new()).unwrap_err(), ProductError::EmptyName);

        let mut payload = widget(Decimal::ONE);
        payload.category = String::new();
        assert_eq!(payload.into_product(ProductId::new()).unwrap_err(), ProductError::EmptyCategory);
    }

    #[test]
    fn test_is_available() {
        let product = widget(Decimal::ONE).into_product(ProductId::new()).unwrap();

        assert!(product.is_available(10));
        assert!(product.is_available(0));
        assert!(!product.is_available(11));
    }
}

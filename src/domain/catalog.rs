use std::collections::BTreeSet;

use tracing::instrument;

use crate::domain::order::OrderError;
use crate::domain::product::{NewProduct, Product};
use crate::domain::user::{NewUser, User};
use crate::ids::{ProductId, UserId};
use crate::store::{Database, ProductStore, Transaction, UserStore};

// ============================================================================
// Catalog - product and user registration
// ============================================================================
//
// Feeds the stores the order engine reads from. Validation failures and
// uniqueness conflicts both come back as `OrderError::Validation`.
//
// ============================================================================

pub struct Catalog<D: Database> {
    db: D,
}

impl<D: Database> Catalog<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }

    #[instrument(skip(self, product), fields(sku = %product.sku))]
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, OrderError> {
        let product = product.into_product(ProductId::new())?;

        let mut tx = self.db.begin().await?;
        let product = tx.insert_product(product).await?;
        tx.commit().await?;

        tracing::info!(
            product_id = %product.id,
            sku = %product.sku,
            stock_quantity = product.stock_quantity,
            "Product created"
        );
        Ok(product)
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create_user(&self, user: NewUser) -> Result<User, OrderError> {
        let user = user.into_user(UserId::new())?;

        let mut tx = self.db.begin().await?;
        let user = tx.insert_user(user).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    pub async fn product(&self, id: ProductId) -> Result<Product, OrderError> {
        let mut tx = self.db.begin().await?;
        let product = tx.product(id).await?;
        tx.commit().await?;
        Ok(product)
    }

    pub async fn product_by_sku(&self, sku: &str) -> Result<Product, OrderError> {
        let mut tx = self.db.begin().await?;
        let product = tx.product_by_sku(sku).await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Products with at least one unit in stock
    pub async fn available_products(&self) -> Result<Vec<Product>, OrderError> {
        let mut tx = self.db.begin().await?;
        let products = tx.list_products().await?;
        tx.commit().await?;

        Ok(products.into_iter().filter(|p| p.stock_quantity > 0).collect())
    }

    /// Distinct categories, sorted
    pub async fn categories(&self) -> Result<Vec<String>, OrderError> {
        let mut tx = self.db.begin().await?;
        let products = tx.list_products().await?;
        tx.commit().await?;

        let categories: BTreeSet<String> = products.into_iter().map(|p| p.category).collect();
        Ok(categories.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use crate::store::InMemoryDatabase;

    fn catalog() -> Catalog<InMemoryDatabase> {
        Catalog::new(InMemoryDatabase::new())
    }

    #[tokio::test]
    async fn test_create_and_find_product_by_sku() {
        let catalog = catalog();
        let created = catalog
            .create_product(
                NewProduct::new("Laptop", Decimal::new(99999, 2), 5, "Electronics", "LAP-1")
                    .with_description("14 inch"),
            )
            .await
            .unwrap();

        let found = catalog.product_by_sku("LAP-1").await.unwrap();
        assert_eq!(found, created);
        assert_eq!(found.description.as_deref(), Some("14 inch"));
        assert_eq!(catalog.product(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_validation_error() {
        let catalog = catalog();
        let product = NewProduct::new("Laptop", Decimal::new(99999, 2), 5, "Electronics", "LAP-1");

        catalog.create_product(product.clone()).await.unwrap();
        let result = catalog.create_product(product).await;

        assert!(matches!(result, Err(OrderError::Validation(_))));
    }

    #[tokio::test]
    async fn test_invalid_product_is_rejected() {
        let catalog = catalog();

        let result = catalog
            .create_product(NewProduct::new("Freebie", Decimal::ZERO, 5, "Misc", "FREE-1"))
            .await;

        assert!(matches!(result, Err(OrderError::Validation(_))));
        assert!(catalog.available_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_validation_error() {
        let catalog = catalog();

        catalog.create_user(NewUser::new("alice", "alice@example.com")).await.unwrap();
        let result = catalog.create_user(NewUser::new("alice2", "alice@example.com")).await;

        assert!(matches!(result, Err(OrderError::Validation(_))));
    }

    #[tokio::test]
    async fn test_available_products_and_categories() {
        let catalog = catalog();
        catalog
            .create_product(NewProduct::new("Mouse", Decimal::new(1999, 2), 0, "Electronics", "MOU-1"))
            .await
            .unwrap();
        let book = catalog
            .create_product(NewProduct::new("Novel", Decimal::new(1250, 2), 3, "Books", "BOO-1"))
            .await
            .unwrap();
        catalog
            .create_product(NewProduct::new("Cable", Decimal::new(500, 2), 7, "Electronics", "CAB-1"))
            .await
            .unwrap();

        let available = catalog.available_products().await.unwrap();
        assert_eq!(available.len(), 2);
        assert!(available.iter().any(|p| p.id == book.id));

        assert_eq!(catalog.categories().await.unwrap(), vec!["Books", "Electronics"]);
    }
}

// ============================================================================
// Store - persistence seams for users, products, orders and the outbox
// ============================================================================
//
// Every engine operation runs against one `Transaction`. Writes become visible
// to other transactions only on `commit`; dropping a transaction discards
// them.
//
// ============================================================================

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::order::{Order, OrderStatus};
use crate::domain::product::Product;
use crate::domain::user::User;
use crate::ids::{OrderId, ProductId, UserId};
use crate::outbox::OutboxMessage;

pub use memory::InMemoryDatabase;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize outbox payload")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }
}

#[async_trait]
pub trait UserStore: Send {
    async fn user(&mut self, id: UserId) -> Result<User, StoreError>;

    /// Username and email must be unique
    async fn insert_user(&mut self, user: User) -> Result<User, StoreError>;
}

#[async_trait]
pub trait ProductStore: Send {
    async fn product(&mut self, id: ProductId) -> Result<Product, StoreError>;

    async fn product_by_sku(&mut self, sku: &str) -> Result<Product, StoreError>;

    /// SKU must be unique
    async fn insert_product(&mut self, product: Product) -> Result<Product, StoreError>;

    /// Sets the absolute stock count and bumps `updated_at`
    async fn update_stock(&mut self, id: ProductId, stock_quantity: u32) -> Result<Product, StoreError>;

    async fn list_products(&mut self) -> Result<Vec<Product>, StoreError>;

    async fn is_available(&mut self, id: ProductId, requested: u32) -> Result<bool, StoreError> {
        Ok(self.product(id).await?.is_available(requested))
    }
}

#[async_trait]
pub trait OrderStore: Send {
    /// Insert or replace, items included
    async fn save_order(&mut self, order: Order) -> Result<Order, StoreError>;

    async fn order(&mut self, id: OrderId) -> Result<Order, StoreError>;

    async fn delete_order(&mut self, id: OrderId) -> Result<(), StoreError>;

    async fn orders_by_user(&mut self, user_id: UserId) -> Result<Vec<Order>, StoreError>;

    async fn orders_by_status(&mut self, status: OrderStatus) -> Result<Vec<Order>, StoreError>;

    /// Orders with `start <= order_date <= end`
    async fn orders_between(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError>;

    async fn all_orders(&mut self) -> Result<Vec<Order>, StoreError>;
}

#[async_trait]
pub trait Outbox: Send {
    async fn append_message(&mut self, message: OutboxMessage) -> Result<(), StoreError>;

    /// Committed messages not yet taken, then this transaction's appends
    async fn outbox_messages(&mut self) -> Result<Vec<OutboxMessage>, StoreError>;

    /// Up to `limit` committed messages, oldest first. They leave the outbox
    /// when the transaction commits; a dropped transaction hands them out
    /// again.
    async fn take_outbox(&mut self, limit: usize) -> Result<Vec<OutboxMessage>, StoreError>;
}

#[async_trait]
pub trait Transaction: UserStore + ProductStore + OrderStore + Outbox + Send {
    async fn commit(self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait Database: Send + Sync {
    type Tx: Transaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

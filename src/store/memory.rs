use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::order::{Order, OrderStatus};
use crate::domain::product::Product;
use crate::domain::user::User;
use crate::ids::{OrderId, ProductId, UserId};
use crate::outbox::OutboxMessage;
use super::{Database, OrderStore, Outbox, ProductStore, StoreError, Transaction, UserStore};

// ============================================================================
// In-Memory Database
// ============================================================================
//
// One mutex guards all tables, so transactions are serialized: `begin` waits
// for the previous transaction to commit or drop. Each transaction works on a
// copy of the tables and writes it back on commit.
//
// The outbox is not copied. A transaction buffers its appends and counts the
// messages it has taken; commit drains the taken ones and enqueues the rest.
//
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    products: HashMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
}

#[derive(Debug, Default)]
struct Shared {
    tables: Tables,
    outbox: VecDeque<OutboxMessage>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    shared: Arc<Mutex<Shared>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let guard = Arc::clone(&self.shared).lock_owned().await;
        let working = guard.tables.clone();
        Ok(InMemoryTransaction {
            guard,
            working,
            appended: Vec::new(),
            taken: 0,
        })
    }
}

pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Shared>,
    working: Tables,
    appended: Vec<OutboxMessage>,
    taken: usize,
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self) -> Result<(), StoreError> {
        let Self { mut guard, working, appended, taken } = self;
        guard.tables = working;
        guard.outbox.drain(..taken);
        guard.outbox.extend(appended);
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryTransaction {
    async fn user(&mut self, id: UserId) -> Result<User, StoreError> {
        self.working
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("User", id))
    }

    async fn insert_user(&mut self, user: User) -> Result<User, StoreError> {
        if let Some(existing) = self.working.users.values().find(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!("Username already exists: {}", existing.username)));
        }
        if let Some(existing) = self.working.users.values().find(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("Email already exists: {}", existing.email)));
        }

        self.working.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ProductStore for InMemoryTransaction {
    async fn product(&mut self, id: ProductId) -> Result<Product, StoreError> {
        self.working
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Product", id))
    }

    async fn product_by_sku(&mut self, sku: &str) -> Result<Product, StoreError> {
        self.working
            .products
            .values()
            .find(|p| p.sku == sku)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Product", sku))
    }

    async fn insert_product(&mut self, product: Product) -> Result<Product, StoreError> {
        if self.working.products.values().any(|p| p.sku == product.sku) {
            return Err(StoreError::Conflict(format!("SKU already exists: {}", product.sku)));
        }

        self.working.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_stock(&mut self, id: ProductId, stock_quantity: u32) -> Result<Product, StoreError> {
        let product = self
            .working
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;

        product.stock_quantity = stock_quantity;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self.working.products.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }
}

#[async_trait]
impl OrderStore for InMemoryTransaction {
    async fn save_order(&mut self, order: Order) -> Result<Order, StoreError> {
        self.working.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn order(&mut self, id: OrderId) -> Result<Order, StoreError> {
        self.working
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Order", id))
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<(), StoreError> {
        self.working
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Order", id))
    }

    async fn orders_by_user(&mut self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        Ok(self.filter_orders(|o| o.user_id == user_id))
    }

    async fn orders_by_status(&mut self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        Ok(self.filter_orders(|o| o.status() == status))
    }

    async fn orders_between(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError> {
        Ok(self.filter_orders(|o| o.order_date >= start && o.order_date <= end))
    }

    async fn all_orders(&mut self) -> Result<Vec<Order>, StoreError> {
        Ok(self.working.orders.values().cloned().collect())
    }
}

#[async_trait]
impl Outbox for InMemoryTransaction {
    async fn append_message(&mut self, message: OutboxMessage) -> Result<(), StoreError> {
        self.appended.push(message);
        Ok(())
    }

    async fn outbox_messages(&mut self) -> Result<Vec<OutboxMessage>, StoreError> {
        Ok(self
            .guard
            .outbox
            .iter()
            .skip(self.taken)
            .chain(&self.appended)
            .cloned()
            .collect())
    }

    async fn take_outbox(&mut self, limit: usize) -> Result<Vec<OutboxMessage>, StoreError> {
        let batch: Vec<OutboxMessage> = self
            .guard
            .outbox
            .iter()
            .skip(self.taken)
            .take(limit)
            .cloned()
            .collect();
        self.taken += batch.len();
        Ok(batch)
    }
}

impl InMemoryTransaction {
    fn filter_orders(&self, predicate: impl Fn(&Order) -> bool) -> Vec<Order> {
        self.working
            .orders
            .values()
            .filter(|o| predicate(o))
            .cloned()
            .collect()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::NewProduct;
    use crate::domain::user::NewUser;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn widget() -> Product {
        NewProduct::new("Widget", Decimal::new(5000, 2), 10, "Tools", "W-1")
            .into_product(ProductId::new())
            .unwrap()
    }

    fn user(username: &str, email: &str) -> User {
        NewUser::new(username, email).into_user(UserId::new()).unwrap()
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let db = InMemoryDatabase::new();

        let mut tx = db.begin().await.unwrap();
        let product = tx.insert_product(widget()).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let loaded = tx.product(product.id).await.unwrap();
        assert_eq!(loaded.sku, "W-1");
        assert_eq!(loaded.stock_quantity, 10);
        assert!(tx.is_available(product.id, 10).await.unwrap());
        assert!(!tx.is_available(product.id, 11).await.unwrap());
        assert!(matches!(tx.is_available(ProductId::new(), 1).await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let db = InMemoryDatabase::new();

        let mut tx = db.begin().await.unwrap();
        let product = tx.insert_product(widget()).await.unwrap();
        tx.commit().await.unwrap();

        {
            let mut tx = db.begin().await.unwrap();
            tx.update_stock(product.id, 3).await.unwrap();
        }

        let mut tx = db.begin().await.unwrap();
        assert_eq!(tx.product(product.id).await.unwrap().stock_quantity, 10);
    }

    fn message(event_type: &str) -> OutboxMessage {
        OutboxMessage {
            id: Uuid::now_v7(),
            aggregate_id: Uuid::now_v7(),
            aggregate_type: "Order".to_string(),
            event_id: Uuid::now_v7(),
            event_type: event_type.to_string(),
            event_version: 1,
            payload: "{}".to_string(),
            correlation_id: Uuid::now_v7(),
            created_at: Utc::now(),
        }
    }

    async fn seed_outbox(db: &InMemoryDatabase, event_types: &[&str]) {
        let mut tx = db.begin().await.unwrap();
        for event_type in event_types {
            tx.append_message(message(event_type)).await.unwrap();
        }
        tx.commit().await.unwrap();
    }

    fn event_types(messages: &[OutboxMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.event_type.as_str()).collect()
    }

    #[tokio::test]
    async fn test_outbox_appends_visible_only_after_commit() {
        let db = InMemoryDatabase::new();

        {
            let mut tx = db.begin().await.unwrap();
            tx.append_message(message("Dropped")).await.unwrap();
            assert_eq!(event_types(&tx.outbox_messages().await.unwrap()), vec!["Dropped"]);
        }
        seed_outbox(&db, &["A", "B"]).await;

        let mut tx = db.begin().await.unwrap();
        assert_eq!(event_types(&tx.outbox_messages().await.unwrap()), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_take_outbox_removes_on_commit() {
        let db = InMemoryDatabase::new();
        seed_outbox(&db, &["A", "B", "C"]).await;

        let mut tx = db.begin().await.unwrap();
        assert_eq!(event_types(&tx.take_outbox(2).await.unwrap()), vec!["A", "B"]);
        tx.append_message(message("D")).await.unwrap();
        assert_eq!(event_types(&tx.outbox_messages().await.unwrap()), vec!["C", "D"]);
        tx.commit().await.unwrap();

        let mut tx = db.begin().await.unwrap();
        assert_eq!(event_types(&tx.outbox_messages().await.unwrap()), vec!["C", "D"]);
    }

    #[tokio::test]
    async fn test_take_outbox_redelivers_after_drop() {
        let db = InMemoryDatabase::new();
        seed_outbox(&db, &["A", "B"]).await;

        {
            let mut tx = db.begin().await.unwrap();
            assert_eq!(tx.take_outbox(10).await.unwrap().len(), 2);
            assert!(tx.take_outbox(10).await.unwrap().is_empty());
        }

        let mut tx = db.begin().await.unwrap();
        assert_eq!(event_types(&tx.take_outbox(10).await.unwrap()), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_duplicate_sku_conflicts() {
        let db = InMemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();

        tx.insert_product(widget()).await.unwrap();
        let result = tx.insert_product(widget()).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let db = InMemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();

        tx.insert_user(user("alice", "alice@example.com")).await.unwrap();
        let result = tx.insert_user(user("alice", "other@example.com")).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let db = InMemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();

        assert!(matches!(tx.user(UserId::new()).await, Err(StoreError::NotFound { entity: "User", .. })));
        assert!(matches!(tx.order(OrderId::new()).await, Err(StoreError::NotFound { entity: "Order", .. })));
        assert!(matches!(
            tx.update_stock(ProductId::new(), 1).await,
            Err(StoreError::NotFound { entity: "Product", .. })
        ));
        assert!(matches!(tx.product_by_sku("nope").await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_order_queries() {
        let db = InMemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();

        let alice = tx.insert_user(user("alice", "alice@example.com")).await.unwrap();
        let bob = tx.insert_user(user("bob", "bob@example.com")).await.unwrap();

        let first = tx.save_order(Order::new(&alice, "1 Main St").unwrap()).await.unwrap();
        let mut second = Order::new(&alice, "1 Main St").unwrap();
        second.set_status(OrderStatus::Confirmed);
        let second = tx.save_order(second).await.unwrap();
        tx.save_order(Order::new(&bob, "2 Side St").unwrap()).await.unwrap();

        let by_alice = tx.orders_by_user(alice.id).await.unwrap();
        assert_eq!(by_alice.iter().map(|o| o.id).collect::<Vec<_>>(), vec![first.id, second.id]);

        let confirmed = tx.orders_by_status(OrderStatus::Confirmed).await.unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, second.id);

        let start = first.order_date;
        let between = tx.orders_between(start, start).await.unwrap();
        assert!(between.iter().any(|o| o.id == first.id));

        assert_eq!(tx.all_orders().await.unwrap().len(), 3);

        tx.delete_order(first.id).await.unwrap();
        assert!(matches!(tx.delete_order(first.id).await, Err(StoreError::NotFound { .. })));
    }
}

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::ids::{OrderId, OrderItemId, ProductId, UserId};
use crate::metrics::Metrics;
use crate::outbox::{EventEnvelope, OutboxMessage};
use crate::store::{Database, OrderStore, Outbox, ProductStore, StoreError, Transaction, UserStore};
use super::aggregate::Order;
use super::commands::{CommandOutcome, OrderCommand};
use super::errors::OrderError;
use super::events::{
    OrderCancelled, OrderCreated, OrderDeleted, OrderEvent, OrderItemAdded, OrderItemRemoved,
    OrderStatusChanged, StockRestoration,
};
use super::value_objects::{OrderItem, OrderStatus};

// ============================================================================
// Order Engine
// ============================================================================
//
// Orchestrates: load → check → mutate order + product stock → save → outbox
//
// Each public operation is one store transaction. Nothing is visible to other
// callers until commit, and an early return drops the transaction, which
// discards any stock change already made in it.
//
// ============================================================================

pub struct OrderEngine<D: Database> {
    db: D,
    metrics: Arc<Metrics>,
}

impl<D: Database> OrderEngine<D> {
    pub fn new(db: D, metrics: Arc<Metrics>) -> Self {
        Self { db, metrics }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Dispatch a command to the matching operation
    pub async fn handle(&self, command: OrderCommand) -> Result<CommandOutcome, OrderError> {
        tracing::debug!(command = command.name(), "Handling order command");

        let order = match command {
            OrderCommand::CreateOrder { user_id, shipping_address } => {
                self.create_order(user_id, shipping_address).await?
            }
            OrderCommand::AddItem { order_id, product_id, quantity } => {
                self.add_item_to_order(order_id, product_id, quantity).await?
            }
            OrderCommand::RemoveItem { order_id, item_id } => {
                self.remove_item_from_order(order_id, item_id).await?
            }
            OrderCommand::UpdateStatus { order_id, status } => {
                self.update_order_status(order_id, status).await?
            }
            OrderCommand::ConfirmOrder { order_id } => self.confirm_order(order_id).await?,
            OrderCommand::ShipOrder { order_id } => self.ship_order(order_id).await?,
            OrderCommand::DeliverOrder { order_id } => self.deliver_order(order_id).await?,
            OrderCommand::CancelOrder { order_id } => self.cancel_order(order_id).await?,
            OrderCommand::DeleteOrder { order_id } => {
                self.delete_order(order_id).await?;
                return Ok(CommandOutcome::Deleted(order_id));
            }
        };

        Ok(CommandOutcome::Order(order))
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    #[instrument(skip(self, shipping_address), fields(user_id = %user_id))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        shipping_address: impl Into<String> + Send,
    ) -> Result<Order, OrderError> {
        let shipping_address = shipping_address.into();
        let started = Instant::now();
        let result = self.try_create_order(user_id, shipping_address).await;
        self.finish("create_order", started, &result);
        result
    }

    async fn try_create_order(&self, user_id: UserId, shipping_address: String) -> Result<Order, OrderError> {
        let mut tx = self.db.begin().await?;

        let user = tx.user(user_id).await?;
        let order = Order::new(&user, shipping_address)?;
        let order = tx.save_order(order).await?;

        let event = OrderEvent::Created(OrderCreated {
            user_id,
            shipping_address: order.shipping_address.clone(),
        });
        append_event(&mut tx, order.id, event, Uuid::now_v7()).await?;
        tx.commit().await?;

        self.metrics.orders_created.inc();
        tracing::info!(order_id = %order.id, user_id = %user_id, "Order created");

        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %order_id, product_id = %product_id))]
    pub async fn add_item_to_order(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Order, OrderError> {
        let started = Instant::now();
        let result = self.try_add_item(order_id, product_id, quantity).await;
        self.finish("add_item", started, &result);
        result
    }

    async fn try_add_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Order, OrderError> {
        let mut tx = self.db.begin().await?;

        let mut order = tx.order(order_id).await?;
        if order.status() != OrderStatus::Pending {
            return Err(OrderError::InvalidState {
                order_id,
                status: order.status(),
                action: "add items to",
            });
        }

        let product = tx.product(product_id).await?;
        if !tx.is_available(product_id, quantity).await? {
            return Err(OrderError::InsufficientStock {
                product_id,
                product_name: product.name,
                requested: quantity,
                available: product.stock_quantity,
            });
        }

        let item = OrderItem::new(product.id, quantity, product.price);
        let item_id = item.id;
        order.add_item(item)?;

        let stock_before = product.stock_quantity;
        let stock_after = stock_before.checked_sub(quantity).ok_or_else(|| OrderError::InsufficientStock {
            product_id,
            product_name: product.name.clone(),
            requested: quantity,
            available: stock_before,
        })?;
        tx.update_stock(product_id, stock_after).await?;

        let order = tx.save_order(order).await?;

        let event = OrderEvent::ItemAdded(OrderItemAdded {
            item_id,
            product_id,
            quantity,
            unit_price: product.price,
            total_amount: order.total_amount(),
        });
        append_event(&mut tx, order_id, event, Uuid::now_v7()).await?;
        tx.commit().await?;

        self.metrics.record_item_added(quantity);
        tracing::info!(
            order_id = %order_id,
            product_id = %product_id,
            quantity,
            stock_before,
            stock_after,
            total_amount = %order.total_amount(),
            "Item added to order"
        );

        Ok(order)
    }

    /// Remove a line from a PENDING order and give its quantity back to the
    /// product's stock.
    #[instrument(skip(self), fields(order_id = %order_id, item_id = %item_id))]
    pub async fn remove_item_from_order(
        &self,
        order_id: OrderId,
        item_id: OrderItemId,
    ) -> Result<Order, OrderError> {
        let started = Instant::now();
        let result = self.try_remove_item(order_id, item_id).await;
        self.finish("remove_item", started, &result);
        result
    }

    async fn try_remove_item(&self, order_id: OrderId, item_id: OrderItemId) -> Result<Order, OrderError> {
        let mut tx = self.db.begin().await?;

        let mut order = tx.order(order_id).await?;
        if order.status() != OrderStatus::Pending {
            return Err(OrderError::InvalidState {
                order_id,
                status: order.status(),
                action: "remove items from",
            });
        }

        let item = order
            .remove_item(item_id)
            .ok_or_else(|| OrderError::not_found("OrderItem", item_id))?;

        let product = tx.product(item.product_id).await?;
        let stock_after = restored_stock(product.stock_quantity, item.quantity, &product.name)?;
        tx.update_stock(product.id, stock_after).await?;

        let order = tx.save_order(order).await?;

        let event = OrderEvent::ItemRemoved(OrderItemRemoved {
            item_id,
            product_id: item.product_id,
            quantity: item.quantity,
            total_amount: order.total_amount(),
        });
        append_event(&mut tx, order_id, event, Uuid::now_v7()).await?;
        tx.commit().await?;

        self.metrics.record_item_removed(item.quantity);
        tracing::info!(
            order_id = %order_id,
            product_id = %item.product_id,
            quantity = item.quantity,
            stock_after,
            total_amount = %order.total_amount(),
            "Item removed from order"
        );

        Ok(order)
    }

    /// Setting the current status again is a no-op that still saves the
    /// order and emits no event.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order, OrderError> {
        let started = Instant::now();
        let result = self.try_update_status(order_id, status).await;
        self.finish("update_status", started, &result);
        result
    }

    async fn try_update_status(&self, order_id: OrderId, target: OrderStatus) -> Result<Order, OrderError> {
        let mut tx = self.db.begin().await?;
        let order = tx.order(order_id).await?;

        let (order, changed) = transition(&mut tx, order, target).await?;
        if let Some(from) = changed {
            let event = OrderEvent::StatusChanged(OrderStatusChanged { from, to: target });
            append_event(&mut tx, order_id, event, Uuid::now_v7()).await?;
        }
        tx.commit().await?;

        match changed {
            Some(from) => {
                self.metrics.record_transition(from, target);
                tracing::info!(order_id = %order_id, from = %from, to = %target, "Order status changed");
            }
            None => tracing::debug!(order_id = %order_id, status = %target, "Order already in requested status"),
        }

        Ok(order)
    }

    pub async fn confirm_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.update_order_status(order_id, OrderStatus::Confirmed).await
    }

    pub async fn ship_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.update_order_status(order_id, OrderStatus::Shipped).await
    }

    pub async fn deliver_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.update_order_status(order_id, OrderStatus::Delivered).await
    }

    /// Cancel a PENDING or CONFIRMED order. A CONFIRMED order gives every
    /// item's quantity back to its product; a PENDING order leaves stock
    /// alone. Cancelling a CANCELLED order is a no-op.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let started = Instant::now();
        let result = self.try_cancel(order_id).await;
        self.finish("cancel_order", started, &result);
        result
    }

    async fn try_cancel(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let mut tx = self.db.begin().await?;
        let order = tx.order(order_id).await?;
        let from = order.status();

        if matches!(from, OrderStatus::Shipped | OrderStatus::Delivered) {
            return Err(OrderError::InvalidState { order_id, status: from, action: "cancel" });
        }

        let mut restored = Vec::new();
        if from == OrderStatus::Confirmed {
            for item in order.items() {
                let product = tx.product(item.product_id).await?;
                let stock_after = restored_stock(product.stock_quantity, item.quantity, &product.name)?;
                tx.update_stock(product.id, stock_after).await?;

                tracing::debug!(
                    product_id = %product.id,
                    quantity = item.quantity,
                    stock_before = product.stock_quantity,
                    stock_after,
                    "Stock restored"
                );
                restored.push(StockRestoration {
                    product_id: product.id,
                    quantity: item.quantity,
                    stock_after,
                });
            }
        }

        let (order, changed) = transition(&mut tx, order, OrderStatus::Cancelled).await?;
        if changed.is_some() {
            let event = OrderEvent::Cancelled(OrderCancelled { from, restored: restored.clone() });
            append_event(&mut tx, order_id, event, Uuid::now_v7()).await?;
        }
        tx.commit().await?;

        if changed.is_some() {
            let units: u32 = restored.iter().map(|r| r.quantity).sum();
            self.metrics.record_stock_restored(units);
            self.metrics.record_transition(from, OrderStatus::Cancelled);
            tracing::info!(
                order_id = %order_id,
                from = %from,
                restored_products = restored.len(),
                restored_units = units,
                "Order cancelled"
            );
        }

        Ok(order)
    }

    /// Only PENDING and CANCELLED orders can be deleted
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), OrderError> {
        let started = Instant::now();
        let result = self.try_delete(order_id).await;
        self.finish("delete_order", started, &result);
        result
    }

    async fn try_delete(&self, order_id: OrderId) -> Result<(), OrderError> {
        let mut tx = self.db.begin().await?;
        let order = tx.order(order_id).await?;
        let status = order.status();

        if !matches!(status, OrderStatus::Pending | OrderStatus::Cancelled) {
            return Err(OrderError::InvalidState { order_id, status, action: "delete" });
        }

        tx.delete_order(order_id).await?;
        append_event(&mut tx, order_id, OrderEvent::Deleted(OrderDeleted { status }), Uuid::now_v7()).await?;
        tx.commit().await?;

        self.metrics.orders_deleted.inc();
        tracing::info!(order_id = %order_id, status = %status, "Order deleted");

        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let mut tx = self.db.begin().await?;
        let order = tx.order(order_id).await?;
        tx.commit().await?;
        Ok(order)
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
        let mut tx = self.db.begin().await?;
        let orders = tx.all_orders().await?;
        tx.commit().await?;
        Ok(orders)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        let mut tx = self.db.begin().await?;
        tx.user(user_id).await?;
        let orders = tx.orders_by_user(user_id).await?;
        tx.commit().await?;
        Ok(orders)
    }

    pub async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderError> {
        let mut tx = self.db.begin().await?;
        let orders = tx.orders_by_status(status).await?;
        tx.commit().await?;
        Ok(orders)
    }

    /// Both bounds inclusive
    pub async fn orders_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, OrderError> {
        if start > end {
            return Err(OrderError::Validation(format!(
                "Start date {start} must not be after end date {end}"
            )));
        }

        let mut tx = self.db.begin().await?;
        let orders = tx.orders_between(start, end).await?;
        tx.commit().await?;
        Ok(orders)
    }

    /// Everything written to the outbox so far, oldest first
    pub async fn outbox_messages(&self) -> Result<Vec<OutboxMessage>, OrderError> {
        let mut tx = self.db.begin().await?;
        let messages = tx.outbox_messages().await?;
        tx.commit().await?;
        Ok(messages)
    }

    /// Hands out up to `limit` unpublished messages, oldest first, and removes
    /// them from the outbox
    pub async fn take_outbox(&self, limit: usize) -> Result<Vec<OutboxMessage>, OrderError> {
        let mut tx = self.db.begin().await?;
        let messages = tx.take_outbox(limit).await?;
        tx.commit().await?;
        Ok(messages)
    }

    fn finish<T>(&self, operation: &'static str, started: Instant, result: &Result<T, OrderError>) {
        self.metrics.observe_duration(operation, started.elapsed().as_secs_f64());

        if let Err(e) = result {
            self.metrics.record_failure(operation, e.kind());
            match e {
                OrderError::Store(_) => tracing::error!(operation, error = %e, "Order operation failed"),
                _ => tracing::warn!(operation, error = %e, "Order operation rejected"),
            }
        }
    }
}

// ============================================================================
// Transaction helpers
// ============================================================================

/// Validate and apply a status change inside an open transaction. Returns the
/// saved order and the previous status, or `None` for a self-transition.
async fn transition<T: Transaction>(
    tx: &mut T,
    mut order: Order,
    target: OrderStatus,
) -> Result<(Order, Option<OrderStatus>), OrderError> {
    let from = order.status();
    if from == target {
        return Ok((tx.save_order(order).await?, None));
    }

    from.validate_transition(target)?;
    order.set_status(target);
    Ok((tx.save_order(order).await?, Some(from)))
}

async fn append_event<T: Outbox>(
    tx: &mut T,
    order_id: OrderId,
    event: OrderEvent,
    correlation_id: Uuid,
) -> Result<(), OrderError> {
    let envelope = EventEnvelope::new(order_id.into_uuid(), event.name(), event, correlation_id);
    let message = OutboxMessage::from_envelope(&envelope).map_err(StoreError::from)?;
    tx.append_message(message).await?;
    Ok(())
}

fn restored_stock(current: u32, quantity: u32, product_name: &str) -> Result<u32, OrderError> {
    current.checked_add(quantity).ok_or_else(|| {
        OrderError::Validation(format!("Stock overflow restoring {quantity} units of {product_name}"))
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

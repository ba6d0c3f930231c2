use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::user::User;
use crate::ids::{OrderId, OrderItemId, UserId};
use super::errors::OrderError;
use super::value_objects::{OrderItem, OrderStatus};

// ============================================================================
// Order Aggregate - one order plus its line items
// ============================================================================
//
// The order owns its items; each item only carries the order's id. The total
// is derived and recomputed on every add/remove. Status and stock rules live
// in the engine, not here.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    status: OrderStatus,
    total_amount: Decimal,
    pub order_date: DateTime<Utc>,
    pub shipping_address: String,
    items: Vec<OrderItem>,
}

impl Order {
    /// New PENDING order with no items and a zero total
    pub fn new(user: &User, shipping_address: impl Into<String>) -> Result<Self, OrderError> {
        let shipping_address = shipping_address.into();
        if shipping_address.trim().is_empty() {
            return Err(OrderError::Validation("Shipping address cannot be blank".to_string()));
        }

        Ok(Self {
            id: OrderId::new(),
            user_id: user.id,
            status: OrderStatus::Pending,
            total_amount: Decimal::ZERO,
            order_date: Utc::now(),
            shipping_address,
            items: Vec::new(),
        })
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Callers are expected to have checked the transition table first
    pub(crate) fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Fails without touching the order if the new total would overflow
    pub fn add_item(&mut self, mut item: OrderItem) -> Result<(), OrderError> {
        let total = item
            .subtotal()
            .and_then(|subtotal| self.total_amount.checked_add(subtotal))
            .ok_or_else(|| {
                OrderError::Validation(format!(
                    "Order total overflow adding {} x {}",
                    item.quantity, item.unit_price
                ))
            })?;

        item.attach_to(self.id);
        self.items.push(item);
        self.total_amount = total;
        Ok(())
    }

    /// Returns the removed item with its order reference cleared, or `None`
    /// if no item with that id is on the order.
    pub fn remove_item(&mut self, item_id: OrderItemId) -> Option<OrderItem> {
        let position = self.items.iter().position(|item| item.id == item_id)?;
        let mut removed = self.items.remove(position);
        removed.detach();
        // A subset of items that summed without overflow sums without overflow
        if let Some(total) = sum_subtotals(&self.items) {
            self.total_amount = total;
        }
        Some(removed)
    }

    pub fn recompute_total(&mut self) -> Result<(), OrderError> {
        self.total_amount = sum_subtotals(&self.items)
            .ok_or_else(|| OrderError::Validation("Order total overflow".to_string()))?;
        Ok(())
    }
}

fn sum_subtotals(items: &[OrderItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.subtotal()?))
}

// ============================================================================
// Unit Tests
// ============================================================================

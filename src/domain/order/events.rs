use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{OrderItemId, ProductId, UserId};
use crate::outbox::DomainEvent;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Events - written to the outbox in the same transaction as the change
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Created(OrderCreated),
    ItemAdded(OrderItemAdded),
    ItemRemoved(OrderItemRemoved),
    StatusChanged(OrderStatusChanged),
    Cancelled(OrderCancelled),
    Deleted(OrderDeleted),
}

impl OrderEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OrderEvent::Created(_) => "OrderCreated",
            OrderEvent::ItemAdded(_) => "OrderItemAdded",
            OrderEvent::ItemRemoved(_) => "OrderItemRemoved",
            OrderEvent::StatusChanged(_) => "OrderStatusChanged",
            OrderEvent::Cancelled(_) => "OrderCancelled",
            OrderEvent::Deleted(_) => "OrderDeleted",
        }
    }
}

impl DomainEvent for OrderEvent {
    fn event_type() -> &'static str { "Order" }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub user_id: UserId,
    pub shipping_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemAdded {
    pub item_id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRemoved {
    pub item_id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// One product's stock given back by a cancellation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRestoration {
    pub product_id: ProductId,
    pub quantity: u32,
    pub stock_after: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub from: OrderStatus,
    pub restored: Vec<StockRestoration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDeleted {
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let event = OrderEvent::StatusChanged(OrderStatusChanged {
            from: OrderStatus::Pending,
            to: OrderStatus::Confirmed,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "StatusChanged");
        assert_eq!(json["data"]["from"], "PENDING");
        assert_eq!(json["data"]["to"], "CONFIRMED");
        assert_eq!(event.name(), "OrderStatusChanged");
    }
}

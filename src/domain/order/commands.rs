use crate::ids::{OrderId, OrderItemId, ProductId, UserId};
use super::aggregate::Order;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Commands - Represent caller intent
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum OrderCommand {
    CreateOrder {
        user_id: UserId,
        shipping_address: String,
    },
    AddItem {
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    },
    RemoveItem {
        order_id: OrderId,
        item_id: OrderItemId,
    },
    UpdateStatus {
        order_id: OrderId,
        status: OrderStatus,
    },
    ConfirmOrder {
        order_id: OrderId,
    },
    ShipOrder {
        order_id: OrderId,
    },
    DeliverOrder {
        order_id: OrderId,
    },
    CancelOrder {
        order_id: OrderId,
    },
    DeleteOrder {
        order_id: OrderId,
    },
}

impl OrderCommand {
    pub fn name(&self) -> &'static str {
        match self {
            OrderCommand::CreateOrder { .. } => "create_order",
            OrderCommand::AddItem { .. } => "add_item",
            OrderCommand::RemoveItem { .. } => "remove_item",
            OrderCommand::UpdateStatus { .. } => "update_status",
            OrderCommand::ConfirmOrder { .. } => "confirm_order",
            OrderCommand::ShipOrder { .. } => "ship_order",
            OrderCommand::DeliverOrder { .. } => "deliver_order",
            OrderCommand::CancelOrder { .. } => "cancel_order",
            OrderCommand::DeleteOrder { .. } => "delete_order",
        }
    }
}

/// Result of a dispatched command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Order(Order),
    Deleted(OrderId),
}

impl CommandOutcome {
    pub fn into_order(self) -> Option<Order> {
        match self {
            CommandOutcome::Order(order) => Some(order),
            CommandOutcome::Deleted(_) => None,
        }
    }
}

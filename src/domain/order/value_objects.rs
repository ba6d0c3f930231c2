use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{OrderId, OrderItemId, ProductId};
use super::errors::OrderError;

// ============================================================================
// Order Status - lifecycle state machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Adjacency table of permitted transitions, self-transition excluded
    pub const fn allowed_targets(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    /// Self-transition is always permitted (as a no-op)
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        self == target || self.allowed_targets().contains(&target)
    }

    pub fn validate_transition(self, target: OrderStatus) -> Result<(), OrderError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(OrderError::InvalidTransition { from: self, to: target })
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Order Item - one product line
// ============================================================================

/// The unit price is captured when the line is created and never re-read
/// from the product. `order_id` is a lookup key back to the owning order,
/// set by `Order::add_item` and cleared by `Order::remove_item`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    order_id: Option<OrderId>,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderItem {
    pub fn new(product_id: ProductId, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            id: OrderItemId::new(),
            order_id: None,
            product_id,
            quantity,
            unit_price,
        }
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub(super) fn attach_to(&mut self, order_id: OrderId) {
        self.order_id = Some(order_id);
    }

    pub(super) fn detach(&mut self) {
        self.order_id = None;
    }

    /// unit_price × quantity, exact; `None` if it does not fit in a `Decimal`
    pub fn subtotal(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table_is_total() {
        use OrderStatus::*;

        let allowed = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Shipped),
            (Confirmed, Cancelled),
            (Shipped, Delivered),
        ];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = from == to || allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "unexpected outcome for {from} -> {to}"
                );

                match from.validate_transition(to) {
                    Ok(()) => assert!(expected),
                    Err(OrderError::InvalidTransition { from: f, to: t }) => {
                        assert!(!expected);
                        assert_eq!((f, t), (from, to));
                    }
                    Err(other) => panic!("unexpected error {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_targets() {
        assert!(OrderStatus::Delivered.allowed_targets().is_empty());
        assert!(OrderStatus::Cancelled.allowed_targets().is_empty());
        assert!(!OrderStatus::Shipped.allowed_targets().is_empty());
    }

    #[test]
    fn test_order_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"SHIPPED\"");

        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderStatus::Shipped);
    }

    #[test]
    fn test_order_item_subtotal() {
        let item = OrderItem::new(ProductId::new(), 3, Decimal::new(1999, 2));

        assert_eq!(item.subtotal(), Some(Decimal::new(5997, 2)));
        assert_eq!(item.order_id(), None);
    }

    #[test]
    fn test_order_item_subtotal_overflow() {
        let item = OrderItem::new(ProductId::new(), 3, Decimal::MAX / Decimal::TWO);

        assert_eq!(item.subtotal(), None);
    }
}

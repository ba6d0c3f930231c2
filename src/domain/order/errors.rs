use crate::domain::product::ProductError;
use crate::domain::user::UserError;
use crate::ids::{OrderId, ProductId};
use crate::store::StoreError;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Engine Errors
// ============================================================================
//
// None of these are retried by the engine. `response_class` is the mapping a
// caller-facing surface uses to pick a response.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cannot {action} order {order_id} in status {status}")]
    InvalidState {
        order_id: OrderId,
        status: OrderStatus,
        action: &'static str,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Insufficient stock for product: {product_name} (requested {requested}, available {available})")]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: u32,
        available: u32,
    },

    #[error("Storage error")]
    Store(#[source] StoreError),
}

/// How a caller-facing surface should report an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    NotFound,
    BadRequest,
    Internal,
}

impl OrderError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }

    /// Stable name, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::NotFound { .. } => "not_found",
            OrderError::Validation(_) => "validation",
            OrderError::InvalidState { .. } => "invalid_state",
            OrderError::InvalidTransition { .. } => "invalid_transition",
            OrderError::InsufficientStock { .. } => "insufficient_stock",
            OrderError::Store(_) => "store",
        }
    }

    pub fn response_class(&self) -> ResponseClass {
        match self {
            OrderError::NotFound { .. } => ResponseClass::NotFound,
            OrderError::Validation(_)
            | OrderError::InvalidState { .. }
            | OrderError::InvalidTransition { .. }
            | OrderError::InsufficientStock { .. } => ResponseClass::BadRequest,
            OrderError::Store(_) => ResponseClass::Internal,
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::Conflict(message) => Self::Validation(message),
            other => Self::Store(other),
        }
    }
}

impl From<UserError> for OrderError {
    fn from(error: UserError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<ProductError> for OrderError {
    fn from(error: ProductError) -> Self {
        Self::Validation(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_names_product() {
        let error = OrderError::InsufficientStock {
            product_id: ProductId::new(),
            product_name: "Widget".to_string(),
            requested: 6,
            available: 5,
        };

        assert!(error.to_string().contains("Widget"));
        assert_eq!(error.kind(), "insufficient_stock");
    }

    #[test]
    fn test_response_classes() {
        let missing = OrderError::not_found("Order", OrderId::new());
        assert_eq!(missing.response_class(), ResponseClass::NotFound);

        let transition = OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        };
        assert_eq!(transition.response_class(), ResponseClass::BadRequest);
        assert_eq!(transition.to_string(), "Invalid status transition from DELIVERED to PENDING");

        let state = OrderError::InvalidState {
            order_id: OrderId::new(),
            status: OrderStatus::Shipped,
            action: "cancel",
        };
        assert_eq!(state.response_class(), ResponseClass::BadRequest);

        let store = OrderError::Store(StoreError::Unavailable("down".to_string()));
        assert_eq!(store.response_class(), ResponseClass::Internal);
    }

    #[test]
    fn test_store_error_mapping() {
        let not_found: OrderError = StoreError::not_found("Product", "p-1").into();
        assert!(matches!(not_found, OrderError::NotFound { entity: "Product", .. }));

        let conflict: OrderError = StoreError::Conflict("duplicate SKU".to_string()).into();
        assert!(matches!(conflict, OrderError::Validation(_)));

        let other: OrderError = StoreError::Unavailable("down".to_string()).into();
        assert!(matches!(other, OrderError::Store(_)));
    }
}

use rust_decimal::Decimal;

// ============================================================================
// Product Validation Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProductError {
    #[error("Product name cannot be blank")]
    EmptyName,

    #[error("Product price must be greater than zero, got {0}")]
    NonPositivePrice(Decimal),

    #[error("Product category cannot be blank")]
    EmptyCategory,

    #[error("Product SKU cannot be blank")]
    EmptySku,
}

// ============================================================================
// User Validation Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UserError {
    #[error("Username cannot be blank")]
    EmptyUsername,

    #[error("Email cannot be blank")]
    EmptyEmail,

    #[error("Invalid email format: {0}")]
    InvalidEmail(String),
}

use serde::{Deserialize, Serialize};

use super::errors::UserError;

// ============================================================================
// User Value Objects
// ============================================================================

/// User email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Basic format check: non-blank and contains `@`
    pub fn parse(email: impl Into<String>) -> Result<Self, UserError> {
        let email = email.into();
        let trimmed = email.trim();

        if trimmed.is_empty() {
            return Err(UserError::EmptyEmail);
        }
        if !trimmed.contains('@') {
            return Err(UserError::InvalidEmail(email));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_parse_trims() {
        let email = Email::parse("  alice@example.com ").unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
    }

    #[test]
    fn test_email_rejects_blank_and_malformed() {
        assert!(matches!(Email::parse("   "), Err(UserError::EmptyEmail)));
        assert!(matches!(Email::parse("alice"), Err(UserError::InvalidEmail(_))));
    }
}

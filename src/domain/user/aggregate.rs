use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use super::errors::UserError;
use super::value_objects::Email;

// ============================================================================
// User - referenced by orders, never mutated by the order engine
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Registration payload for a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NewUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    /// Validate the payload and build the user record under the given id
    pub fn into_user(self, id: UserId) -> Result<User, UserError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(UserError::EmptyUsername);
        }

        let email = Email::parse(self.email)?;

        Ok(User {
            id,
            username: username.to_string(),
            email,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: Utc::now(),
        })
    }
}

//! User model for Serene.
//!
//! Users are provisioned out-of-band; chat sessions only claim and release
//! them by writing the `connection_id` column.

/// A user row that a live connection can claim as its identity.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Display username (unique).
    pub username: String,
    /// Connection currently holding this user, if any.
    pub connection_id: Option<String>,
}

impl User {
    /// Whether a live connection currently holds this user.
    pub fn is_claimed(&self) -> bool {
        self.connection_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_claimed() {
        let mut user = User {
            id: 1,
            username: "user1".to_string(),
            connection_id: None,
        };
        assert!(!user.is_claimed());

        user.connection_id = Some("conn-1".to_string());
        assert!(user.is_claimed());
    }
}

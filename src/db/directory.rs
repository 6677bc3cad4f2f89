//! User directory for Serene.
//!
//! The directory is the authoritative record of which connection holds
//! which user. Claims are taken with a single conditional update so that two
//! connections racing for the same row can never both win.

use tracing::debug;

use super::user::User;
use super::DbPool;
use crate::{Result, SereneError};

/// Repository for user identity claims.
pub struct UserDirectory<'a> {
    pool: &'a DbPool,
}

impl<'a> UserDirectory<'a> {
    /// Create a new UserDirectory with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Claim one unclaimed user for `connection_id`.
    ///
    /// Which user is returned is unspecified. Returns `None` when every user
    /// is already claimed.
    pub async fn claim_unassigned(&self, connection_id: &str) -> Result<Option<User>> {
        let mut attempt = 0u32;
        loop {
            // Candidate selection and the claim run as one statement.
            let claimed = sqlx::query_as::<_, User>(
                "UPDATE users SET connection_id = ?
                 WHERE id = (SELECT id FROM users WHERE connection_id IS NULL ORDER BY id LIMIT 1)
                   AND connection_id IS NULL
                 RETURNING id, username, connection_id",
            )
            .bind(connection_id)
            .fetch_optional(self.pool)
            .await?;

            if let Some(user) = claimed {
                return Ok(Some(user));
            }

            // A lost race means another connection took a row; only stop
            // once nothing is left to claim.
            let free: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE connection_id IS NULL)")
                    .fetch_one(self.pool)
                    .await?;
            if !free {
                return Ok(None);
            }
            attempt += 1;
            debug!(attempt, connection_id, "claim lost race, retrying");
        }
    }

    /// Look up the username currently held by `connection_id`.
    pub async fn find_claimant_username(&self, connection_id: &str) -> Result<Option<String>> {
        let username = sqlx::query_scalar("SELECT username FROM users WHERE connection_id = ?")
            .bind(connection_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(username)
    }

    /// Release whatever user `connection_id` holds.
    ///
    /// Returns true if a claim was cleared. Releasing an unknown or already
    /// released connection is a no-op.
    pub async fn release(&self, connection_id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET connection_id = NULL WHERE connection_id = ?")
            .bind(connection_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear every claim. Returns the number of users released.
    pub async fn reset_all_claims(&self) -> Result<u64> {
        let result =
            sqlx::query("UPDATE users SET connection_id = NULL WHERE connection_id IS NOT NULL")
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Insert a user with the given username unless it already exists.
    pub async fn provision(&self, username: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SereneError::Validation(
                "username must not be empty".to_string(),
            ));
        }

        sqlx::query("INSERT OR IGNORE INTO users (username) VALUES (?)")
            .bind(username)
            .execute(self.pool)
            .await?;

        self.get_by_username(username)
            .await?
            .ok_or_else(|| SereneError::NotFound("user".to_string()))
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, connection_id FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// List all users ordered by ID.
    pub async fn list(&self) -> Result<Vec<User>> {
        let users =
            sqlx::query_as::<_, User>("SELECT id, username, connection_id FROM users ORDER BY id")
                .fetch_all(self.pool)
                .await?;
        Ok(users)
    }

    /// Count users currently claimed by a connection.
    pub async fn count_claimed(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE connection_id IS NOT NULL")
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::db::Database;

    async fn setup_db(users: &[&str]) -> Database {
        let db = Database::open_in_memory().await.unwrap();
        let directory = UserDirectory::new(db.pool());
        for name in users {
            directory.provision(name).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_claim_marks_user() {
        let db = setup_db(&["alice"]).await;
        let directory = UserDirectory::new(db.pool());

        let user = directory.claim_unassigned("conn-1").await.unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.connection_id.as_deref(), Some("conn-1"));
        assert_eq!(directory.count_claimed().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_claims_are_unique() {
        let db = setup_db(&["alice", "bob", "carol"]).await;
        let directory = UserDirectory::new(db.pool());

        let mut seen = HashSet::new();
        for i in 0..3 {
            let user = directory
                .claim_unassigned(&format!("conn-{i}"))
                .await
                .unwrap()
                .unwrap();
            assert!(seen.insert(user.id), "user {} claimed twice", user.id);
        }
        assert_eq!(seen.len(), 3);
    }

    #[tokio::test]
    async fn test_claim_none_available() {
        let db = setup_db(&["alice"]).await;
        let directory = UserDirectory::new(db.pool());

        assert!(directory.claim_unassigned("conn-1").await.unwrap().is_some());
        assert!(directory.claim_unassigned("conn-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_empty_directory() {
        let db = setup_db(&[]).await;
        let directory = UserDirectory::new(db.pool());
        assert!(directory.claim_unassigned("conn-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_release_makes_user_claimable_again() {
        let db = setup_db(&["alice"]).await;
        let directory = UserDirectory::new(db.pool());

        let first = directory.claim_unassigned("conn-1").await.unwrap().unwrap();
        assert!(directory.release("conn-1").await.unwrap());

        let second = directory.claim_unassigned("conn-2").await.unwrap().unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.connection_id.as_deref(), Some("conn-2"));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let db = setup_db(&["alice"]).await;
        let directory = UserDirectory::new(db.pool());

        directory.claim_unassigned("conn-1").await.unwrap();
        assert!(directory.release("conn-1").await.unwrap());
        assert!(!directory.release("conn-1").await.unwrap());
        assert!(!directory.release("never-connected").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_claimant_username() {
        let db = setup_db(&["alice"]).await;
        let directory = UserDirectory::new(db.pool());

        assert!(directory
            .find_claimant_username("conn-1")
            .await
            .unwrap()
            .is_none());

        directory.claim_unassigned("conn-1").await.unwrap();
        assert_eq!(
            directory.find_claimant_username("conn-1").await.unwrap(),
            Some("alice".to_string())
        );
    }

    #[tokio::test]
    async fn test_reset_all_claims() {
        let db = setup_db(&["alice", "bob"]).await;
        let directory = UserDirectory::new(db.pool());

        directory.claim_unassigned("conn-1").await.unwrap();
        directory.claim_unassigned("conn-2").await.unwrap();

        assert_eq!(directory.reset_all_claims().await.unwrap(), 2);
        assert!(directory
            .find_claimant_username("conn-1")
            .await
            .unwrap()
            .is_none());
        assert!(directory
            .find_claimant_username("conn-2")
            .await
            .unwrap()
            .is_none());
        assert_eq!(directory.reset_all_claims().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_provision_is_idempotent() {
        let db = setup_db(&[]).await;
        let directory = UserDirectory::new(db.pool());

        let first = directory.provision("alice").await.unwrap();
        let second = directory.provision("alice").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(directory.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_provision_rejects_empty_username() {
        let db = setup_db(&[]).await;
        let directory = UserDirectory::new(db.pool());
        assert!(matches!(
            directory.provision("   ").await,
            Err(SereneError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_same_connection_cannot_hold_two_users() {
        let db = setup_db(&["alice", "bob"]).await;
        let directory = UserDirectory::new(db.pool());

        directory.claim_unassigned("conn-1").await.unwrap();
        let second = directory.claim_unassigned("conn-1").await;
        assert!(matches!(second, Err(SereneError::Database(_))));
    }

    async fn setup_file_db(users: usize) -> (tempfile::TempDir, Arc<Database>) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("claims.db")).await.unwrap();
        {
            let directory = UserDirectory::new(db.pool());
            for i in 0..users {
                directory.provision(&format!("user{i}")).await.unwrap();
            }
        }
        (dir, Arc::new(db))
    }

    async fn claim_concurrently(db: &Arc<Database>, claimers: usize) -> Vec<Option<User>> {
        let mut handles = Vec::new();
        for i in 0..claimers {
            let db = Arc::clone(db);
            handles.push(tokio::spawn(async move {
                UserDirectory::new(db.pool())
                    .claim_unassigned(&format!("conn-{i}"))
                    .await
                    .unwrap()
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_claims_all_succeed() {
        let (_dir, db) = setup_file_db(50).await;

        let results = claim_concurrently(&db, 50).await;
        let claimed: Vec<i64> = results.iter().flatten().map(|u| u.id).collect();
        let unique: HashSet<_> = claimed.iter().copied().collect();

        assert_eq!(claimed.len(), 50, "every claimer must get a user");
        assert_eq!(unique.len(), 50);
        assert_eq!(
            UserDirectory::new(db.pool()).count_claimed().await.unwrap(),
            50
        );
        db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_claims_exhaust_pool() {
        let (_dir, db) = setup_file_db(20).await;

        let results = claim_concurrently(&db, 40).await;
        let claimed: Vec<i64> = results.iter().flatten().map(|u| u.id).collect();
        let unique: HashSet<_> = claimed.iter().copied().collect();

        assert_eq!(claimed.len(), 20);
        assert_eq!(unique.len(), 20);
        assert_eq!(results.iter().filter(|r| r.is_none()).count(), 20);
        assert_eq!(
            UserDirectory::new(db.pool()).count_claimed().await.unwrap(),
            20
        );
        db.close().await;
    }
}

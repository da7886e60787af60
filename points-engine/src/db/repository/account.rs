//! Account Repository
//!
//! Also serves as the identity resolver: a free-form identifier (loyalty
//! card number, mobile, or internal id) maps to at most one account.

use super::{RepoError, RepoResult};
use shared::models::{Account, AccountRole};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Account>> {
        let row = sqlx::query_as::<_, Account>(
            "SELECT id, loyalty_id, name, mobile, role, is_active, created_at, updated_at
             FROM account WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Resolve a free-form identifier: loyalty id, mobile, or internal id
    pub async fn resolve(&self, identifier: &str) -> RepoResult<Option<Account>> {
        let as_id: i64 = identifier.parse().unwrap_or(0);
        let row = sqlx::query_as::<_, Account>(
            "SELECT id, loyalty_id, name, mobile, role, is_active, created_at, updated_at
             FROM account
             WHERE loyalty_id = ?1 OR mobile = ?1 OR id = ?2
             LIMIT 1",
        )
        .bind(identifier)
        .bind(as_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Create an account (role defaults to Customer)
    pub async fn create(
        &self,
        loyalty_id: &str,
        name: &str,
        mobile: &str,
        role: AccountRole,
    ) -> RepoResult<Account> {
        if self.resolve(loyalty_id).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Account '{loyalty_id}' already exists"
            )));
        }

        let now = now_millis();
        let id = snowflake_id();
        sqlx::query(
            "INSERT INTO account (id, loyalty_id, name, mobile, role, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(id)
        .bind(loyalty_id)
        .bind(name)
        .bind(mobile)
        .bind(role)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create account".to_string()))
    }

    /// Deactivate an account (soft delete; ledger history stays)
    pub async fn deactivate(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE account SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(now_millis())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;

    #[tokio::test]
    async fn test_create_and_resolve_by_every_identifier() {
        let repo = AccountRepository::new(test_pool().await);
        let account = repo
            .create("FLT-0042", "Asha Verma", "9876543210", AccountRole::Customer)
            .await
            .unwrap();

        let by_loyalty = repo.resolve("FLT-0042").await.unwrap().unwrap();
        assert_eq!(by_loyalty.id, account.id);

        let by_mobile = repo.resolve("9876543210").await.unwrap().unwrap();
        assert_eq!(by_mobile.id, account.id);

        let by_id = repo.resolve(&account.id.to_string()).await.unwrap().unwrap();
        assert_eq!(by_id.id, account.id);
        assert_eq!(by_id.role, AccountRole::Customer);
    }

    #[tokio::test]
    async fn test_unknown_identifier_resolves_to_none() {
        let repo = AccountRepository::new(test_pool().await);
        assert!(repo.resolve("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_loyalty_id_rejected() {
        let repo = AccountRepository::new(test_pool().await);
        repo.create("FLT-0001", "A", "111", AccountRole::Customer)
            .await
            .unwrap();
        let result = repo.create("FLT-0001", "B", "222", AccountRole::Customer).await;
        assert!(matches!(result, Err(RepoError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_deactivate() {
        let repo = AccountRepository::new(test_pool().await);
        let account = repo
            .create("FLT-0002", "A", "111", AccountRole::Staff)
            .await
            .unwrap();
        assert!(repo.deactivate(account.id).await.unwrap());
        let loaded = repo.find_by_id(account.id).await.unwrap().unwrap();
        assert!(!loaded.is_active);
    }
}

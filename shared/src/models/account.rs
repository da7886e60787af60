//! Account Model

use serde::{Deserialize, Serialize};

/// Role of a points-holding identity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum AccountRole {
    Admin,
    Manager,
    Staff,
    Customer,
    FleetOwner,
}

impl AccountRole {
    /// Roles allowed to create at-pump redemptions on a customer's behalf
    pub fn can_redeem_at_pump(&self) -> bool {
        matches!(self, AccountRole::Manager | AccountRole::Staff)
    }
}

/// Points-holding account (customer, manager, or staff)
///
/// The wallet summary itself lives in the ledger store and is mutated
/// exclusively through ledger operations, never by direct field writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Account {
    pub id: i64,
    /// Printed loyalty card number, unique
    pub loyalty_id: String,
    pub name: String,
    pub mobile: String,
    pub role: AccountRole,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

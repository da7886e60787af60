//! Transaction category

use serde::{Deserialize, Serialize};

/// Category of a pump transaction, used for rate lookup and campaign scoping
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TransactionCategory {
    Fuel,
    Lubricant,
    Store,
    Service,
}

impl std::fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionCategory::Fuel => write!(f, "FUEL"),
            TransactionCategory::Lubricant => write!(f, "LUBRICANT"),
            TransactionCategory::Store => write!(f, "STORE"),
            TransactionCategory::Service => write!(f, "SERVICE"),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AccountId = Uuid;

/// An account holds no balance of its own: the balance is always derived by
/// aggregating the account's ledger entries. Accounts are immutable after
/// creation and are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Reference to the owning user (opaque to the ledger).
    pub owner: String,
    /// Free-form tag such as "savings" or "current".
    pub account_type: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        owner: impl Into<String>,
        account_type: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            account_type: account_type.into(),
            currency: currency.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account() {
        let account = Account::new("u1", "savings", "INR");
        assert_eq!(account.owner, "u1");
        assert_eq!(account.account_type, "savings");
        assert_eq!(account.currency, "INR");
    }

    #[test]
    fn test_accounts_get_distinct_ids() {
        let a = Account::new("u1", "savings", "INR");
        let b = Account::new("u1", "savings", "INR");
        assert_ne!(a.id, b.id);
    }
}

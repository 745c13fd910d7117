use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Paise, TransactionId};

pub type EntryId = Uuid;

/// Which side of the ledger an entry posts to. A credit raises the
/// account's balance, a debit lowers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    Credit,
    Debit,
}

impl EntrySide {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySide::Credit => "credit",
            EntrySide::Debit => "debit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "credit" => Some(EntrySide::Credit),
            "debit" => Some(EntrySide::Debit),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntrySide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable posting against one account, tied to exactly one
/// transaction. Entries are never updated or deleted once written;
/// corrections take the form of new transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub account_id: AccountId,
    pub transaction_id: TransactionId,
    pub side: EntrySide,
    /// Amount in paise (always positive; `side` carries the direction).
    pub amount: Paise,
    /// Monotonically increasing number assigned by the repository when the
    /// entry is written. Breaks ties between entries sharing a timestamp.
    pub sequence: i64,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    fn new(
        account_id: AccountId,
        transaction_id: TransactionId,
        side: EntrySide,
        amount: Paise,
    ) -> Self {
        assert!(amount > 0, "Entry amount must be positive");
        Self {
            id: Uuid::new_v4(),
            account_id,
            transaction_id,
            side,
            amount,
            sequence: 0, // Will be set by the repository
            created_at: Utc::now(),
        }
    }

    pub fn credit(account_id: AccountId, transaction_id: TransactionId, amount: Paise) -> Self {
        Self::new(account_id, transaction_id, EntrySide::Credit, amount)
    }

    pub fn debit(account_id: AccountId, transaction_id: TransactionId, amount: Paise) -> Self {
        Self::new(account_id, transaction_id, EntrySide::Debit, amount)
    }

    /// The entry's contribution to its account's balance.
    pub fn signed_amount(&self) -> Paise {
        match self.side {
            EntrySide::Credit => self.amount,
            EntrySide::Debit => -self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_raises_balance() {
        let entry = LedgerEntry::credit(Uuid::new_v4(), Uuid::new_v4(), 5000);
        assert_eq!(entry.side, EntrySide::Credit);
        assert_eq!(entry.signed_amount(), 5000);
    }

    #[test]
    fn test_debit_lowers_balance() {
        let entry = LedgerEntry::debit(Uuid::new_v4(), Uuid::new_v4(), 5000);
        assert_eq!(entry.side, EntrySide::Debit);
        assert_eq!(entry.signed_amount(), -5000);
    }

    #[test]
    fn test_side_roundtrip() {
        for side in [EntrySide::Credit, EntrySide::Debit] {
            assert_eq!(EntrySide::from_str(side.as_str()), Some(side));
        }
    }

    #[test]
    #[should_panic(expected = "Entry amount must be positive")]
    fn test_entry_requires_positive_amount() {
        LedgerEntry::credit(Uuid::new_v4(), Uuid::new_v4(), -100);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Paise};

pub type TransactionId = Uuid;

/// The kind of financial movement a transaction records. The kind dictates
/// which account legs are set: a deposit has a destination only, a
/// withdrawal a source only, a transfer both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Transfer => "transfer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(TransactionKind::Deposit),
            "withdrawal" => Some(TransactionKind::Withdrawal),
            "transfer" => Some(TransactionKind::Transfer),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a transaction. Records are created `Pending` and
/// flipped to `Completed` in the same atomic unit that writes their ledger
/// entries; a failed posting rolls the whole unit back, so `Failed` is
/// declared for the schema but never assigned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction is the metadata record of one financial movement. Its
/// ledger entries carry the actual account postings; the two are only ever
/// written together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    /// Amount in paise (always positive; direction comes from the entries).
    pub amount: Paise,
    pub currency: String,
    pub status: TransactionStatus,
    /// Account debited. Set for withdrawals and transfers.
    pub source_account: Option<AccountId>,
    /// Account credited. Set for deposits and transfers.
    pub destination_account: Option<AccountId>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    fn new(
        kind: TransactionKind,
        amount: Paise,
        currency: impl Into<String>,
        source_account: Option<AccountId>,
        destination_account: Option<AccountId>,
    ) -> Self {
        assert!(amount > 0, "Transaction amount must be positive");
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            currency: currency.into(),
            status: TransactionStatus::Pending,
            source_account,
            destination_account,
            description: None,
            created_at: Utc::now(),
        }
    }

    /// A pending deposit into `destination`.
    pub fn deposit(destination: AccountId, amount: Paise, currency: impl Into<String>) -> Self {
        Self::new(TransactionKind::Deposit, amount, currency, None, Some(destination))
    }

    /// A pending withdrawal out of `source`.
    pub fn withdrawal(source: AccountId, amount: Paise, currency: impl Into<String>) -> Self {
        Self::new(TransactionKind::Withdrawal, amount, currency, Some(source), None)
    }

    /// A pending transfer from `source` to `destination`.
    pub fn transfer(
        source: AccountId,
        destination: AccountId,
        amount: Paise,
        currency: impl Into<String>,
    ) -> Self {
        assert!(
            source != destination,
            "Transfer source and destination must differ"
        );
        Self::new(
            TransactionKind::Transfer,
            amount,
            currency,
            Some(source),
            Some(destination),
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Net movement the kind implies across this transaction's entries:
    /// credits minus debits. Deposits add money to the system, withdrawals
    /// remove it, transfers move it and net out to zero.
    pub fn expected_net(&self) -> Paise {
        match self.kind {
            TransactionKind::Deposit => self.amount,
            TransactionKind::Withdrawal => -self.amount,
            TransactionKind::Transfer => 0,
        }
    }

    /// True when the source/destination legs match the kind's shape.
    pub fn legs_are_valid(&self) -> bool {
        match self.kind {
            TransactionKind::Deposit => {
                self.source_account.is_none() && self.destination_account.is_some()
            }
            TransactionKind::Withdrawal => {
                self.source_account.is_some() && self.destination_account.is_none()
            }
            TransactionKind::Transfer => match (self.source_account, self.destination_account) {
                (Some(from), Some(to)) => from != to,
                _ => false,
            },
        }
    }
}

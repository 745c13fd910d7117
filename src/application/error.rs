use thiserror::Error;

use crate::domain::{AccountId, Paise, TransactionId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error(
        "Insufficient balance in account {account_id}: balance {balance}, required {required}"
    )]
    InsufficientBalance {
        account_id: AccountId,
        balance: Paise,
        required: Paise,
    },

    #[error("Currency mismatch: {requested} vs account currency {account_currency}")]
    CurrencyMismatch {
        requested: String,
        account_currency: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

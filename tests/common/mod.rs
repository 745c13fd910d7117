// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use khata::application::LedgerService;
use khata::domain::AccountId;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Test fixture: standard account setups
pub struct SeededAccounts;

impl SeededAccounts {
    /// Create a savings account for "u1" with the default currency.
    pub async fn one(service: &LedgerService) -> Result<AccountId> {
        let account = service.create_account("u1", "savings", None).await?;
        Ok(account.id)
    }

    /// Create an account and fund it with an initial deposit.
    pub async fn one_funded(service: &LedgerService, amount: i64) -> Result<AccountId> {
        let id = Self::one(service).await?;
        service.deposit(id, amount, None, None).await?;
        Ok(id)
    }

    /// Create two accounts for different owners.
    pub async fn pair(service: &LedgerService) -> Result<(AccountId, AccountId)> {
        let first = service.create_account("u1", "savings", None).await?;
        let second = service.create_account("u2", "current", None).await?;
        Ok((first.id, second.id))
    }
}

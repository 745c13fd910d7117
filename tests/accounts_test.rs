mod common;

use anyhow::Result;
use common::{test_service, SeededAccounts};
use khata::application::AppError;
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_get_account() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = service
        .create_account("u1", "savings", None)
        .await?;

    let info = service.get_account(account.id).await?;
    assert_eq!(info.account.owner, "u1");
    assert_eq!(info.account.account_type, "savings");
    assert_eq!(info.account.currency, "INR", "currency defaults to INR");
    assert_eq!(info.balance, 0, "fresh account has zero balance");

    Ok(())
}

#[tokio::test]
async fn test_create_account_with_explicit_currency() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = service
        .create_account("u2", "current", Some("USD".to_string()))
        .await?;

    let info = service.get_account(account.id).await?;
    assert_eq!(info.account.currency, "USD");

    Ok(())
}

#[tokio::test]
async fn test_create_account_requires_owner_and_type() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let missing_owner = service.create_account("", "savings", None).await;
    assert!(matches!(missing_owner, Err(AppError::Validation(_))));

    let missing_type = service.create_account("u1", "  ", None).await;
    assert!(matches!(missing_type, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn test_get_unknown_account_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.get_account(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::AccountNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_list_entries_for_unknown_account_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.list_entries(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::AccountNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_list_entries_empty_for_fresh_account() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account_id = SeededAccounts::one(&service).await?;
    let entries = service.list_entries(account_id).await?;
    assert!(entries.is_empty());

    Ok(())
}

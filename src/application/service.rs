use serde::Serialize;

use crate::domain::{
    build_integrity_report, Account, AccountId, IntegrityReport, LedgerEntry, Paise, Transaction,
    TransactionId, DEFAULT_CURRENCY,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing the ledger's operations: the account
/// registry, the posting engine, and committed-state reads. This is the
/// primary interface for any client (CLI, API, etc.).
pub struct LedgerService {
    repo: Repository,
}

/// An account joined with its derived balance.
#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    pub account: Account,
    pub balance: Paise,
}

/// A transaction record together with its ledger entries.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionInfo {
    pub transaction: Transaction,
    pub entries: Vec<LedgerEntry>,
}

/// Result of a successful posting. The transaction is `completed` and the
/// entries carry their assigned sequence numbers.
#[derive(Debug, Clone, Serialize)]
pub struct PostingReceipt {
    pub transaction: Transaction,
    pub entries: Vec<LedgerEntry>,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Account registry
    // ========================

    /// Create a new account. Currency defaults to INR.
    pub async fn create_account(
        &self,
        owner: &str,
        account_type: &str,
        currency: Option<String>,
    ) -> Result<Account, AppError> {
        if owner.trim().is_empty() {
            return Err(AppError::Validation("owner is required".to_string()));
        }
        if account_type.trim().is_empty() {
            return Err(AppError::Validation("account_type is required".to_string()));
        }

        let currency = currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        let account = Account::new(owner.trim(), account_type.trim(), currency);
        self.repo.save_account(&account).await?;

        tracing::info!(account_id = %account.id, owner = %account.owner, "created account");
        Ok(account)
    }

    /// Get an account by ID, enriched with its derived balance.
    pub async fn get_account(&self, id: AccountId) -> Result<AccountInfo, AppError> {
        let account = self
            .repo
            .get_account(id)
            .await?
            .ok_or(AppError::AccountNotFound(id))?;
        let balance = self.repo.compute_balance(id).await?;

        Ok(AccountInfo { account, balance })
    }

    /// List an account's ledger entries, oldest first. An existing account
    /// with no entries yields an empty vec.
    pub async fn list_entries(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, AppError> {
        self.repo
            .get_account(account_id)
            .await?
            .ok_or(AppError::AccountNotFound(account_id))?;

        Ok(self.repo.list_entries(account_id).await?)
    }

    /// Get a transaction record together with its entries.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<TransactionInfo, AppError> {
        let transaction = self
            .repo
            .get_transaction(id)
            .await?
            .ok_or(AppError::TransactionNotFound(id))?;
        let entries = self.repo.list_entries_for_transaction(id).await?;

        Ok(TransactionInfo {
            transaction,
            entries,
        })
    }

    // ========================
    // Posting engine
    // ========================

    /// Record a deposit: one credit entry on the destination account.
    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount: Paise,
        currency: Option<String>,
        description: Option<String>,
    ) -> Result<PostingReceipt, AppError> {
        validate_amount(amount)?;
        let account = self.fetch_account(account_id).await?;
        let currency = posting_currency(&account, currency)?;

        let mut record = Transaction::deposit(account_id, amount, currency);
        if let Some(desc) = description {
            record = record.with_description(desc);
        }

        let mut unit = self.repo.begin().await?;
        unit.insert_transaction(&record).await?;
        let mut entry = LedgerEntry::credit(account_id, record.id, amount);
        unit.append_entry(&mut entry).await?;
        unit.mark_completed(&mut record).await?;
        unit.commit().await?;

        tracing::info!(transaction_id = %record.id, account_id = %account_id, amount, "posted deposit");
        Ok(PostingReceipt {
            transaction: record,
            entries: vec![entry],
        })
    }

    /// Record a withdrawal: one debit entry on the source account. The
    /// balance check runs inside the posting unit, on the same connection
    /// as the debit, so concurrent postings cannot jointly overdraw the
    /// account.
    pub async fn withdraw(
        &self,
        account_id: AccountId,
        amount: Paise,
        currency: Option<String>,
        description: Option<String>,
    ) -> Result<PostingReceipt, AppError> {
        validate_amount(amount)?;
        let account = self.fetch_account(account_id).await?;
        let currency = posting_currency(&account, currency)?;

        let mut unit = self.repo.begin().await?;

        let balance = unit.balance_of(account_id).await?;
        if balance < amount {
            unit.rollback().await?;
            return Err(AppError::InsufficientBalance {
                account_id,
                balance,
                required: amount,
            });
        }

        let mut record = Transaction::withdrawal(account_id, amount, currency);
        if let Some(desc) = description {
            record = record.with_description(desc);
        }

        unit.insert_transaction(&record).await?;
        let mut entry = LedgerEntry::debit(account_id, record.id, amount);
        unit.append_entry(&mut entry).await?;
        unit.mark_completed(&mut record).await?;
        unit.commit().await?;

        tracing::info!(transaction_id = %record.id, account_id = %account_id, amount, "posted withdrawal");
        Ok(PostingReceipt {
            transaction: record,
            entries: vec![entry],
        })
    }

    /// Record a transfer: a debit entry on the source and a credit entry on
    /// the destination, written in the same posting unit so neither leg is
    /// ever observable without the other.
    pub async fn transfer(
        &self,
        from_account: AccountId,
        to_account: AccountId,
        amount: Paise,
        currency: Option<String>,
        description: Option<String>,
    ) -> Result<PostingReceipt, AppError> {
        validate_amount(amount)?;
        if from_account == to_account {
            return Err(AppError::Validation(
                "cannot transfer to the same account".to_string(),
            ));
        }

        let from = self.fetch_account(from_account).await?;
        let to = self.fetch_account(to_account).await?;

        if from.currency != to.currency {
            return Err(AppError::CurrencyMismatch {
                requested: to.currency,
                account_currency: from.currency,
            });
        }
        let currency = posting_currency(&from, currency)?;

        let mut unit = self.repo.begin().await?;

        let balance = unit.balance_of(from_account).await?;
        if balance < amount {
            unit.rollback().await?;
            return Err(AppError::InsufficientBalance {
                account_id: from_account,
                balance,
                required: amount,
            });
        }

        let mut record = Transaction::transfer(from_account, to_account, amount, currency);
        if let Some(desc) = description {
            record = record.with_description(desc);
        }

        unit.insert_transaction(&record).await?;
        let mut debit = LedgerEntry::debit(from_account, record.id, amount);
        unit.append_entry(&mut debit).await?;
        let mut credit = LedgerEntry::credit(to_account, record.id, amount);
        unit.append_entry(&mut credit).await?;
        unit.mark_completed(&mut record).await?;
        unit.commit().await?;

        tracing::info!(
            transaction_id = %record.id,
            from = %from_account,
            to = %to_account,
            amount,
            "posted transfer"
        );
        Ok(PostingReceipt {
            transaction: record,
            entries: vec![debit, credit],
        })
    }

    // ========================
    // Integrity operations
    // ========================

    /// Sweep the whole ledger and report anything that violates its
    /// invariants: orphaned entries, unbalanced or stranded transactions,
    /// non-positive amounts, sequence gaps.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let stats = self.repo.get_integrity_stats().await?;
        let transactions = self.repo.list_transactions().await?;
        let entries = self.repo.list_all_entries().await?;

        Ok(build_integrity_report(
            &transactions,
            &entries,
            stats.account_count,
            stats.orphaned_entries,
            stats.invalid_amounts,
            stats.has_sequence_gaps,
        ))
    }

    async fn fetch_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or(AppError::AccountNotFound(id))
    }
}

fn validate_amount(amount: Paise) -> Result<(), AppError> {
    if amount <= 0 {
        return Err(AppError::Validation("amount must be positive".to_string()));
    }
    Ok(())
}

/// Resolve the currency a posting is recorded in. Omitted means the
/// account's own; an explicit currency that contradicts the account's is
/// refused, since conversion is out of scope.
fn posting_currency(account: &Account, requested: Option<String>) -> Result<String, AppError> {
    match requested {
        None => Ok(account.currency.clone()),
        Some(currency) if currency == account.currency => Ok(currency),
        Some(currency) => Err(AppError::CurrencyMismatch {
            requested: currency,
            account_currency: account.currency.clone(),
        }),
    }
}

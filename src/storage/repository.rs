use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, EntrySide, LedgerEntry, Paise, Transaction, TransactionId,
    TransactionKind, TransactionStatus,
};

use super::MIGRATION_001_INITIAL;

/// Balance is derived, never stored: credits minus debits over the
/// account's committed entries.
const BALANCE_SQL: &str = r#"
    SELECT COALESCE(SUM(CASE WHEN side = 'credit' THEN amount_paise ELSE -amount_paise END), 0) AS balance
    FROM ledger_entries
    WHERE account_id = ?
"#;

/// Raw counts used to assemble an integrity report.
#[derive(Debug, Clone)]
pub struct IntegrityStats {
    pub account_count: i64,
    pub orphaned_entries: i64,
    pub invalid_amounts: i64,
    pub has_sequence_gaps: bool,
}

/// Repository for persisting and querying accounts, transactions, and
/// ledger entries. Reads on the pool only ever observe committed state;
/// all writes to transactions and entries go through a [`PostingUnit`].
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        tracing::debug!("database migrations applied");
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, owner, account_type, currency, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.owner)
        .bind(&account.account_type)
        .bind(&account.currency)
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner, account_type, currency, created_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    // ========================
    // Committed-state reads
    // ========================

    /// Compute the balance for an account using SQL aggregation.
    /// Returns 0 for an account with no entries.
    pub async fn compute_balance(&self, account_id: AccountId) -> Result<Paise> {
        let row = sqlx::query(BALANCE_SQL)
            .bind(account_id.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to compute balance")?;

        Ok(row.get("balance"))
    }

    /// List an account's ledger entries in creation order.
    pub async fn list_entries(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, transaction_id, side, amount_paise, sequence, created_at
            FROM ledger_entries
            WHERE account_id = ?
            ORDER BY sequence
            "#,
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list ledger entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// Get a transaction record by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, kind, amount_paise, currency, status,
                   source_account_id, destination_account_id, description, created_at
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transaction")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_transaction(&row)?)),
            None => Ok(None),
        }
    }

    /// List the entries belonging to one transaction, in creation order.
    pub async fn list_entries_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, transaction_id, side, amount_paise, sequence, created_at
            FROM ledger_entries
            WHERE transaction_id = ?
            ORDER BY sequence
            "#,
        )
        .bind(transaction_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list entries for transaction")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// List all transaction records, in creation order.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, kind, amount_paise, currency, status,
                   source_account_id, destination_account_id, description, created_at
            FROM transactions
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// List every ledger entry, in creation order.
    pub async fn list_all_entries(&self) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, transaction_id, side, amount_paise, sequence, created_at
            FROM ledger_entries
            ORDER BY sequence
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list all entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// Get statistics for integrity checking.
    pub async fn get_integrity_stats(&self) -> Result<IntegrityStats> {
        let account_count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM accounts")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        // Entries whose parent transaction row is missing
        let orphaned_entries: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM ledger_entries e
            WHERE NOT EXISTS (SELECT 1 FROM transactions t WHERE t.id = e.transaction_id)
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .get("count");

        let invalid_amounts: i64 = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM ledger_entries WHERE amount_paise <= 0) +
                (SELECT COUNT(*) FROM transactions WHERE amount_paise <= 0) AS count
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .get("count");

        let sequence_check = sqlx::query(
            r#"
            SELECT MIN(sequence) AS min_seq, MAX(sequence) AS max_seq, COUNT(*) AS count
            FROM ledger_entries
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let min_seq: Option<i64> = sequence_check.get("min_seq");
        let max_seq: Option<i64> = sequence_check.get("max_seq");
        let count: i64 = sequence_check.get("count");

        let has_sequence_gaps = match (min_seq, max_seq) {
            (Some(min), Some(max)) => (max - min + 1) != count,
            _ => false,
        };

        Ok(IntegrityStats {
            account_count,
            orphaned_entries,
            invalid_amounts,
            has_sequence_gaps,
        })
    }

    // ========================
    // Atomic unit of work
    // ========================

    /// Open a posting unit: a transaction-scoped session whose writes
    /// become visible all at once on commit, or not at all.
    pub async fn begin(&self) -> Result<PostingUnit> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to open posting unit")?;
        Ok(PostingUnit { tx })
    }

    // ========================
    // Row converters
    // ========================

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            owner: row.get("owner"),
            account_type: row.get("account_type"),
            currency: row.get("currency"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let id_str: String = row.get("id");
        let kind_str: String = row.get("kind");
        let status_str: String = row.get("status");
        let source_str: Option<String> = row.get("source_account_id");
        let destination_str: Option<String> = row.get("destination_account_id");
        let created_at_str: String = row.get("created_at");

        Ok(Transaction {
            id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            kind: TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?,
            amount: row.get("amount_paise"),
            currency: row.get("currency"),
            status: TransactionStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction status: {}", status_str))?,
            source_account: source_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid source account ID")?,
            destination_account: destination_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid destination account ID")?,
            description: row.get("description"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<LedgerEntry> {
        let id_str: String = row.get("id");
        let account_str: String = row.get("account_id");
        let transaction_str: String = row.get("transaction_id");
        let side_str: String = row.get("side");
        let created_at_str: String = row.get("created_at");

        Ok(LedgerEntry {
            id: Uuid::parse_str(&id_str).context("Invalid entry ID")?,
            account_id: Uuid::parse_str(&account_str).context("Invalid account ID")?,
            transaction_id: Uuid::parse_str(&transaction_str)
                .context("Invalid transaction ID")?,
            side: EntrySide::from_str(&side_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid entry side: {}", side_str))?,
            amount: row.get("amount_paise"),
            sequence: row.get("sequence"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}

/// One atomic unit of work: a transaction record and its ledger entries are
/// written through this and become durable together at [`commit`], or not
/// at all. Dropping an uncommitted unit rolls it back, so an error
/// propagating out of the posting engine cannot leave partial state behind.
///
/// [`commit`]: PostingUnit::commit
pub struct PostingUnit {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl PostingUnit {
    /// Insert a transaction record in its current (pending) status.
    pub async fn insert_transaction(&mut self, record: &Transaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (id, kind, amount_paise, currency, status,
                 source_account_id, destination_account_id, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.kind.as_str())
        .bind(record.amount)
        .bind(&record.currency)
        .bind(record.status.as_str())
        .bind(record.source_account.map(|id| id.to_string()))
        .bind(record.destination_account.map(|id| id.to_string()))
        .bind(&record.description)
        .bind(record.created_at.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .context("Failed to insert transaction record")?;
        Ok(())
    }

    /// Append a ledger entry. Assigns the next sequence number from the
    /// counter; the counter update participates in this unit, so a rollback
    /// releases the number along with the entry.
    pub async fn append_entry(&mut self, entry: &mut LedgerEntry) -> Result<()> {
        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = 'entry_sequence'
            RETURNING value
            "#,
        )
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to get next entry sequence")?;
        entry.sequence = row.get("value");

        sqlx::query(
            r#"
            INSERT INTO ledger_entries
                (id, account_id, transaction_id, side, amount_paise, sequence, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.account_id.to_string())
        .bind(entry.transaction_id.to_string())
        .bind(entry.side.as_str())
        .bind(entry.amount)
        .bind(entry.sequence)
        .bind(entry.created_at.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .context("Failed to append ledger entry")?;
        Ok(())
    }

    /// Compute an account's balance on this unit's own connection. Unlike
    /// [`Repository::compute_balance`] this read is serialized with the
    /// unit's writes, so a concurrent posting cannot slip between the check
    /// and the debit.
    pub async fn balance_of(&mut self, account_id: AccountId) -> Result<Paise> {
        let row = sqlx::query(BALANCE_SQL)
            .bind(account_id.to_string())
            .fetch_one(&mut *self.tx)
            .await
            .context("Failed to compute balance in posting unit")?;

        Ok(row.get("balance"))
    }

    /// Transition the record to `completed`, mirroring the change into the
    /// in-memory struct.
    pub async fn mark_completed(&mut self, record: &mut Transaction) -> Result<()> {
        sqlx::query("UPDATE transactions SET status = ? WHERE id = ?")
            .bind(TransactionStatus::Completed.as_str())
            .bind(record.id.to_string())
            .execute(&mut *self.tx)
            .await
            .context("Failed to mark transaction completed")?;
        record.status = TransactionStatus::Completed;
        Ok(())
    }

    /// Make every write in this unit durable and visible, together.
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await.context("Failed to commit posting unit")
    }

    /// Discard every write made in this unit.
    pub async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .context("Failed to roll back posting unit")
    }
}

use std::collections::HashMap;

use super::{
    AccountId, LedgerEntry, Paise, Transaction, TransactionId, TransactionKind, TransactionStatus,
};

/// Compute the balance for a single account from a list of entries.
/// Balance = sum of credits - sum of debits; an account with no entries
/// has balance 0.
pub fn compute_balance(account_id: AccountId, entries: &[LedgerEntry]) -> Paise {
    entries
        .iter()
        .filter(|entry| entry.account_id == account_id)
        .map(|entry| entry.signed_amount())
        .sum()
}

/// Compute balances for all accounts seen in a list of entries.
/// Returns a map of account_id -> balance.
pub fn compute_all_balances(entries: &[LedgerEntry]) -> HashMap<AccountId, Paise> {
    let mut balances: HashMap<AccountId, Paise> = HashMap::new();

    for entry in entries {
        *balances.entry(entry.account_id).or_insert(0) += entry.signed_amount();
    }

    balances
}

/// Check that a transaction's entries have the shape its kind demands:
/// a deposit is one credit on the destination, a withdrawal one debit on
/// the source, a transfer a debit on the source plus a credit on the
/// destination. In every case the signed entry sum must equal the net
/// movement the kind implies.
pub fn transaction_is_balanced(transaction: &Transaction, entries: &[LedgerEntry]) -> bool {
    let own: Vec<&LedgerEntry> = entries
        .iter()
        .filter(|entry| entry.transaction_id == transaction.id)
        .collect();

    let net: Paise = own.iter().map(|entry| entry.signed_amount()).sum();
    if net != transaction.expected_net() {
        return false;
    }

    let credits: Vec<&LedgerEntry> = own
        .iter()
        .copied()
        .filter(|entry| entry.signed_amount() > 0)
        .collect();
    let debits: Vec<&LedgerEntry> = own
        .iter()
        .copied()
        .filter(|entry| entry.signed_amount() < 0)
        .collect();

    match transaction.kind {
        TransactionKind::Deposit => {
            own.len() == 1
                && credits.len() == 1
                && Some(credits[0].account_id) == transaction.destination_account
        }
        TransactionKind::Withdrawal => {
            own.len() == 1
                && debits.len() == 1
                && Some(debits[0].account_id) == transaction.source_account
        }
        TransactionKind::Transfer => {
            own.len() == 2
                && debits.len() == 1
                && credits.len() == 1
                && Some(debits[0].account_id) == transaction.source_account
                && Some(credits[0].account_id) == transaction.destination_account
                && debits[0].amount == transaction.amount
                && credits[0].amount == transaction.amount
        }
    }
}

/// Result of a full ledger integrity sweep.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IntegrityReport {
    pub account_count: i64,
    pub transaction_count: i64,
    pub entry_count: i64,
    /// Entries whose parent transaction row is missing.
    pub orphaned_entries: i64,
    /// Completed transactions whose entries don't match their kind's shape.
    pub unbalanced_transactions: Vec<TransactionId>,
    /// Transactions stranded in `pending` (a posting unit that committed
    /// without finishing, which the engine never does).
    pub pending_transactions: Vec<TransactionId>,
    /// Stored amounts that are zero or negative.
    pub invalid_amounts: i64,
    /// Accounts whose derived balance has gone below zero.
    pub negative_balances: Vec<AccountId>,
    pub has_sequence_gaps: bool,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_entries == 0
            && self.unbalanced_transactions.is_empty()
            && self.pending_transactions.is_empty()
            && self.invalid_amounts == 0
            && self.negative_balances.is_empty()
            && !self.has_sequence_gaps
    }
}

/// Assemble an integrity report from the full transaction/entry sets plus
/// counts the repository computes in SQL.
pub fn build_integrity_report(
    transactions: &[Transaction],
    entries: &[LedgerEntry],
    account_count: i64,
    orphaned_entries: i64,
    invalid_amounts: i64,
    has_sequence_gaps: bool,
) -> IntegrityReport {
    let mut unbalanced = Vec::new();
    let mut pending = Vec::new();

    for transaction in transactions {
        match transaction.status {
            TransactionStatus::Pending => pending.push(transaction.id),
            TransactionStatus::Completed => {
                if !transaction_is_balanced(transaction, entries) {
                    unbalanced.push(transaction.id);
                }
            }
            TransactionStatus::Failed => {}
        }
    }

    let mut negative_balances: Vec<AccountId> = compute_all_balances(entries)
        .into_iter()
        .filter(|(_, balance)| *balance < 0)
        .map(|(account_id, _)| account_id)
        .collect();
    negative_balances.sort();

    IntegrityReport {
        account_count,
        transaction_count: transactions.len() as i64,
        entry_count: entries.len() as i64,
        orphaned_entries,
        unbalanced_transactions: unbalanced,
        pending_transactions: pending,
        invalid_amounts,
        negative_balances,
        has_sequence_gaps,
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_compute_balance_empty() {
        let account = Uuid::new_v4();
        assert_eq!(compute_balance(account, &[]), 0);
    }

    #[test]
    fn test_compute_balance_mixed() {
        let account = Uuid::new_v4();
        let other = Uuid::new_v4();
        let tx = Uuid::new_v4();

        let entries = vec![
            LedgerEntry::credit(account, tx, 10000),
            LedgerEntry::debit(account, tx, 4000),
            LedgerEntry::credit(other, tx, 2500),
        ];

        assert_eq!(compute_balance(account, &entries), 6000);
        assert_eq!(compute_balance(other, &entries), 2500);
    }

    #[test]
    fn test_compute_all_balances() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let tx = Uuid::new_v4();

        let entries = vec![
            LedgerEntry::credit(a, tx, 5000),
            LedgerEntry::debit(a, tx, 3000),
            LedgerEntry::credit(b, tx, 3000),
        ];

        let balances = compute_all_balances(&entries);
        assert_eq!(balances.get(&a), Some(&2000));
        assert_eq!(balances.get(&b), Some(&3000));
    }

    #[test]
    fn test_transfer_entries_conserve_balance() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let tx = Transaction::transfer(from, to, 3000, "INR");

        let entries = vec![
            LedgerEntry::debit(from, tx.id, 3000),
            LedgerEntry::credit(to, tx.id, 3000),
        ];

        // A transfer nets to zero across the system
        let balances = compute_all_balances(&entries);
        let total: Paise = balances.values().sum();
        assert_eq!(total, 0);
        assert!(transaction_is_balanced(&tx, &entries));
    }

    #[test]
    fn test_deposit_balance_check() {
        let account = Uuid::new_v4();
        let tx = Transaction::deposit(account, 10000, "INR");
        let entries = vec![LedgerEntry::credit(account, tx.id, 10000)];

        assert!(transaction_is_balanced(&tx, &entries));
    }

    #[test]
    fn test_lone_transfer_leg_is_unbalanced() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let tx = Transaction::transfer(from, to, 3000, "INR");

        // Debit leg written without its credit counterpart
        let entries = vec![LedgerEntry::debit(from, tx.id, 3000)];
        assert!(!transaction_is_balanced(&tx, &entries));
    }

    #[test]
    fn test_wrong_amount_is_unbalanced() {
        let account = Uuid::new_v4();
        let tx = Transaction::deposit(account, 10000, "INR");
        let entries = vec![LedgerEntry::credit(account, tx.id, 9999)];

        assert!(!transaction_is_balanced(&tx, &entries));
    }

    #[test]
    fn test_report_flags_pending_and_unbalanced() {
        let account = Uuid::new_v4();

        let mut completed = Transaction::deposit(account, 1000, "INR");
        completed.status = TransactionStatus::Completed;
        let stuck = Transaction::deposit(account, 2000, "INR");

        // Completed deposit missing its entry, plus a stranded pending row
        let report = build_integrity_report(
            &[completed.clone(), stuck.clone()],
            &[],
            1,
            0,
            0,
            false,
        );

        assert!(!report.is_clean());
        assert_eq!(report.unbalanced_transactions, vec![completed.id]);
        assert_eq!(report.pending_transactions, vec![stuck.id]);
    }

    #[test]
    fn test_report_flags_negative_balances() {
        let account = Uuid::new_v4();
        let mut tx = Transaction::withdrawal(account, 500, "INR");
        tx.status = TransactionStatus::Completed;
        let entries = vec![LedgerEntry::debit(account, tx.id, 500)];

        let report = build_integrity_report(&[tx], &entries, 1, 0, 0, false);
        assert_eq!(report.negative_balances, vec![account]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_clean_report() {
        let account = Uuid::new_v4();
        let mut tx = Transaction::deposit(account, 1000, "INR");
        tx.status = TransactionStatus::Completed;
        let entries = vec![LedgerEntry::credit(account, tx.id, 1000)];

        let report = build_integrity_report(&[tx], &entries, 1, 0, 0, false);
        assert!(report.is_clean());
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{LedgerService, PostingReceipt};
use crate::domain::{format_paise, parse_paise, LedgerEntry, Paise};

/// Khata - Double-Entry Account Ledger
#[derive(Parser)]
#[command(name = "khata")]
#[command(about = "A double-entry account ledger with derived balances")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "khata.db")]
    pub database: String,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Deposit money into an account
    Deposit {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Destination account ID
        #[arg(long)]
        to: String,

        /// Currency (defaults to the account's)
        #[arg(short, long)]
        currency: Option<String>,

        /// Description of the movement
        #[arg(long)]
        description: Option<String>,
    },

    /// Withdraw money from an account
    Withdraw {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Source account ID
        #[arg(long)]
        from: String,

        /// Currency (defaults to the account's)
        #[arg(short, long)]
        currency: Option<String>,

        /// Description of the movement
        #[arg(long)]
        description: Option<String>,
    },

    /// Transfer money between two accounts
    Transfer {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Source account ID
        #[arg(long)]
        from: String,

        /// Destination account ID
        #[arg(long)]
        to: String,

        /// Currency (defaults to the accounts')
        #[arg(short, long)]
        currency: Option<String>,

        /// Description of the movement
        #[arg(long)]
        description: Option<String>,
    },

    /// Show a transaction and its ledger entries
    Show {
        /// Transaction ID
        id: String,
    },

    /// Verify ledger integrity
    Check,
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Owning user reference
        #[arg(long)]
        owner: String,

        /// Account type tag (e.g., "savings")
        #[arg(long = "type")]
        account_type: String,

        /// Currency (defaults to INR)
        #[arg(short, long)]
        currency: Option<String>,
    },

    /// Show an account with its derived balance
    Show {
        /// Account ID
        id: String,
    },

    /// List an account's ledger entries, oldest first
    Ledger {
        /// Account ID
        id: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Account(account_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_account_command(&service, account_cmd, self.json).await?;
            }

            Commands::Deposit {
                amount,
                to,
                currency,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let receipt = service
                    .deposit(parse_account_id(&to)?, parse_amount(&amount)?, currency, description)
                    .await?;
                print_receipt(&receipt, self.json)?;
            }

            Commands::Withdraw {
                amount,
                from,
                currency,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let receipt = service
                    .withdraw(parse_account_id(&from)?, parse_amount(&amount)?, currency, description)
                    .await?;
                print_receipt(&receipt, self.json)?;
            }

            Commands::Transfer {
                amount,
                from,
                to,
                currency,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let receipt = service
                    .transfer(
                        parse_account_id(&from)?,
                        parse_account_id(&to)?,
                        parse_amount(&amount)?,
                        currency,
                        description,
                    )
                    .await?;
                print_receipt(&receipt, self.json)?;
            }

            Commands::Show { id } => {
                let service = LedgerService::connect(&self.database).await?;
                let transaction_id =
                    Uuid::parse_str(&id).context("Invalid transaction ID format (expected UUID)")?;
                let info = service.get_transaction(transaction_id).await?;

                if self.json {
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    let tx = &info.transaction;
                    println!(
                        "Transaction {} [{}] {} {} ({})",
                        tx.id,
                        tx.kind,
                        format_paise(tx.amount),
                        tx.currency,
                        tx.status
                    );
                    if let Some(desc) = &tx.description {
                        println!("  {}", desc);
                    }
                    for entry in &info.entries {
                        print_entry(entry);
                    }
                }
            }

            Commands::Check => {
                let service = LedgerService::connect(&self.database).await?;
                let report = service.check_integrity().await?;

                if self.json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    println!(
                        "{} accounts, {} transactions, {} entries",
                        report.account_count, report.transaction_count, report.entry_count
                    );
                    if report.is_clean() {
                        println!("Ledger integrity: OK");
                    } else {
                        println!("Ledger integrity: PROBLEMS FOUND");
                        if report.orphaned_entries > 0 {
                            println!("  orphaned entries: {}", report.orphaned_entries);
                        }
                        for id in &report.unbalanced_transactions {
                            println!("  unbalanced transaction: {}", id);
                        }
                        for id in &report.pending_transactions {
                            println!("  stranded pending transaction: {}", id);
                        }
                        if report.invalid_amounts > 0 {
                            println!("  invalid amounts: {}", report.invalid_amounts);
                        }
                        for id in &report.negative_balances {
                            println!("  negative balance on account: {}", id);
                        }
                        if report.has_sequence_gaps {
                            println!("  entry sequence has gaps");
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

async fn run_account_command(
    service: &LedgerService,
    command: AccountCommands,
    json: bool,
) -> Result<()> {
    match command {
        AccountCommands::Create {
            owner,
            account_type,
            currency,
        } => {
            let account = service.create_account(&owner, &account_type, currency).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&account)?);
            } else {
                println!("Account created: {}", account.id);
            }
        }

        AccountCommands::Show { id } => {
            let info = service.get_account(parse_account_id(&id)?).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!(
                    "Account {} ({} / {}): balance {} {}",
                    info.account.id,
                    info.account.owner,
                    info.account.account_type,
                    format_paise(info.balance),
                    info.account.currency
                );
            }
        }

        AccountCommands::Ledger { id } => {
            let entries = service.list_entries(parse_account_id(&id)?).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No entries");
            } else {
                for entry in &entries {
                    print_entry(entry);
                }
            }
        }
    }

    Ok(())
}

fn parse_account_id(input: &str) -> Result<Uuid> {
    Uuid::parse_str(input).context("Invalid account ID format (expected UUID)")
}

fn parse_amount(input: &str) -> Result<Paise> {
    parse_paise(input).context("Invalid amount format. Use '50.00' or '50'")
}

fn print_receipt(receipt: &PostingReceipt, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(receipt)?);
    } else {
        println!(
            "Recorded {}: {} {} ({})",
            receipt.transaction.kind,
            format_paise(receipt.transaction.amount),
            receipt.transaction.currency,
            receipt.transaction.id
        );
    }
    Ok(())
}

fn print_entry(entry: &LedgerEntry) {
    println!(
        "  #{} {} {} {} tx={}",
        entry.sequence,
        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
        entry.side,
        format_paise(entry.amount),
        entry.transaction_id
    );
}

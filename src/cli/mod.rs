use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::{LedgerStore, LedgerSummary};
use crate::domain::{
    Action, Person, TIMESTAMP_FORMAT, Transaction, TransactionFilter, TransactionId,
    format_cents, format_dollars, parse_amount,
};

/// sharedbook - shared account ledger for two people
#[derive(Parser)]
#[command(name = "sharedbook")]
#[command(about = "Record credits and debits for two people and track their balances")]
#[command(version)]
pub struct Cli {
    /// Ledger file path
    #[arg(
        short,
        long,
        default_value = "transactions.csv",
        env = "SHAREDBOOK_FILE",
        global = true
    )]
    pub file: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a transaction
    Add {
        /// Person: 1 or 2
        person: String,

        /// Action: credit or debit
        action: String,

        /// Amount (e.g., "10.00" or "10")
        amount: String,

        /// Date of the transaction ("YYYY-MM-DD" or "YYYY-MM-DD HH:MM:SS", defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show Person 1, Person 2 and combined balances
    Balance,

    /// List transactions, optionally filtered
    List {
        /// Only the transaction with this id
        #[arg(long, conflicts_with_all = ["date", "person"])]
        id: Option<TransactionId>,

        /// Only transactions on this day (YYYY-MM-DD) or month (YYYY-MM)
        #[arg(long, conflicts_with = "person")]
        date: Option<String>,

        /// Only transactions of this person (1 or 2)
        #[arg(long)]
        person: Option<String>,
    },

    /// Show a single transaction
    Show {
        /// Transaction id
        id: TransactionId,
    },

    /// Change the action and amount of a transaction
    Update {
        /// Transaction id
        id: TransactionId,

        /// New action: credit or debit
        action: String,

        /// New amount
        amount: String,
    },

    /// Delete a transaction
    Delete {
        /// Transaction id
        id: TransactionId,
    },

    /// Per-person credit and debit totals
    Summary {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions, balances, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Append transactions from a CSV file
    Import {
        /// Input file with person, action, amount and optional date columns
        input: String,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let mut store = LedgerStore::open(&self.file)
            .with_context(|| format!("Failed to open ledger: {}", self.file))?;

        match self.command {
            Commands::Add {
                person,
                action,
                amount,
                date,
            } => {
                let person = parse_person(&person)?;
                let action = parse_action(&action)?;
                let amount = parse_amount(&amount)
                    .with_context(|| format!("Invalid amount '{}'. Use '10.00' or '10'", amount))?;

                let transaction = match date {
                    Some(date_str) => {
                        let timestamp = parse_timestamp(&date_str)?;
                        store.append_at(person, action, amount, timestamp)?
                    }
                    None => store.append(person, action, amount)?,
                };

                println!(
                    "Transaction recorded: #{} {} {} {}",
                    transaction.id,
                    transaction.person,
                    transaction.action,
                    format_dollars(transaction.amount)
                );
                print_balances(&store)?;
            }

            Commands::Balance => print_balances(&store)?,

            Commands::List { id, date, person } => {
                let filter = if let Some(id) = id {
                    TransactionFilter::Id(id)
                } else if let Some(date) = date {
                    TransactionFilter::DatePrefix(parse_date_prefix(&date)?)
                } else if let Some(person) = person {
                    TransactionFilter::Person(parse_person(&person)?)
                } else {
                    TransactionFilter::All
                };

                let transactions = store.filter(&filter);
                if transactions.is_empty() {
                    println!("No transactions found with the selected filters.");
                } else {
                    print_transaction_table(&transactions);
                }
            }

            Commands::Show { id } => {
                let transaction = store.get(id)?;
                println!("Transaction: {}", transaction.id);
                println!("  Person:  {}", transaction.person);
                println!("  Action:  {}", transaction.action);
                println!("  Amount:  {}", format_dollars(transaction.amount));
                println!("  Date:    {}", transaction.timestamp);
            }

            Commands::Update { id, action, amount } => {
                let action = parse_action(&action)?;
                let amount = parse_amount(&amount)
                    .with_context(|| format!("Invalid amount '{}'. Use '10.00' or '10'", amount))?;

                if store.update(id, action, amount)? {
                    println!("Transaction {} updated.", id);
                    print_balances(&store)?;
                } else {
                    println!("No transaction with id {}; nothing changed.", id);
                }
            }

            Commands::Delete { id } => {
                if store.delete(id)? {
                    println!("Transaction {} deleted.", id);
                    print_balances(&store)?;
                } else {
                    println!("No transaction with id {}; nothing changed.", id);
                }
            }

            Commands::Summary { format } => {
                let summary = store.summary()?;
                match format.as_str() {
                    "table" => print_summary(&summary),
                    "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
                    _ => anyhow::bail!("Invalid format '{}'. Valid formats: table, json", format),
                }
            }

            Commands::Export {
                export_type,
                output,
            } => run_export_command(&store, &export_type, output.as_deref())?,

            Commands::Import { input, dry_run } => {
                run_import_command(&mut store, &input, dry_run)?
            }
        }

        Ok(())
    }
}

fn run_export_command(store: &LedgerStore, export_type: &str, output: Option<&str>) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(store);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "transactions" => {
            let count = exporter.export_transactions_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        "balances" => {
            exporter.export_balances_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported balances");
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer)?;
            if output.is_some() {
                eprintln!(
                    "Exported full ledger: {} transactions",
                    snapshot.transactions.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: transactions, balances, full",
                export_type
            );
        }
    }

    Ok(())
}

fn run_import_command(store: &mut LedgerStore, input: &str, dry_run: bool) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;

    let file = File::open(input).with_context(|| format!("Failed to open input file: {}", input))?;
    let result = Importer::new(store).import_transactions_csv(file, ImportOptions { dry_run })?;

    if dry_run {
        println!("Dry run: {} transactions would be imported", result.imported);
    } else {
        println!("Imported {} transactions", result.imported);
    }

    if !result.errors.is_empty() {
        println!("{} rows skipped:", result.errors.len());
        for err in &result.errors {
            match &err.field {
                Some(field) => println!("  line {} ({}): {}", err.line, field, err.error),
                None => println!("  line {}: {}", err.line, err.error),
            }
        }
    }

    Ok(())
}

fn print_balances(store: &LedgerStore) -> Result<()> {
    let balances = store.balances()?;
    println!("Person 1 Balance: {}", format_dollars(balances.person1));
    println!("Person 2 Balance: {}", format_dollars(balances.person2));
    println!("Combined Balance: {}", format_dollars(balances.combined));
    Ok(())
}

fn print_transaction_table(transactions: &[&Transaction]) {
    println!(
        "{:>6}  {:<9} {:<7} {:>12}  DATE",
        "ID", "PERSON", "ACTION", "AMOUNT"
    );
    println!("{}", "-".repeat(58));
    for t in transactions {
        println!(
            "{:>6}  {:<9} {:<7} {:>12}  {}",
            t.id,
            t.person,
            t.action,
            format_cents(t.amount),
            t.timestamp
        );
    }
}

fn print_summary(summary: &LedgerSummary) {
    println!(
        "{:<10} {:>12} {:>12} {:>12} {:>6}",
        "PERSON", "CREDITS", "DEBITS", "BALANCE", "COUNT"
    );
    println!("{}", "-".repeat(56));
    for p in &summary.people {
        println!(
            "{:<10} {:>12} {:>12} {:>12} {:>6}",
            p.person,
            format_cents(p.total_credits),
            format_cents(p.total_debits),
            format_cents(p.balance),
            p.count
        );
    }
    println!("{}", "-".repeat(56));
    println!(
        "{:<10} {:>12} {:>12} {:>12} {:>6}",
        "Combined",
        format_cents(summary.total_credits),
        format_cents(summary.total_debits),
        format_cents(summary.combined_balance),
        summary.transaction_count
    );
    if let (Some(first), Some(last)) = (&summary.first_date, &summary.last_date) {
        println!();
        println!("Period: {} to {}", first, last);
    }
}

fn parse_person(input: &str) -> Result<Person> {
    input.parse().map_err(anyhow::Error::msg)
}

fn parse_action(input: &str) -> Result<Action> {
    input.parse().map_err(anyhow::Error::msg)
}

/// Accepts "YYYY-MM-DD HH:MM:SS" or a bare date (midnight).
fn parse_timestamp(input: &str) -> Result<String> {
    use chrono::{NaiveDate, NaiveDateTime};

    let input = input.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, TIMESTAMP_FORMAT) {
        return Ok(dt.format(TIMESTAMP_FORMAT).to_string());
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").with_context(|| {
        format!(
            "Invalid date '{}'. Use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS",
            input
        )
    })?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;
    Ok(midnight.format(TIMESTAMP_FORMAT).to_string())
}

/// Parse a day (YYYY-MM-DD) or month (YYYY-MM) into the zero-padded prefix
/// stored timestamps start with.
fn parse_date_prefix(input: &str) -> Result<String> {
    use chrono::NaiveDate;

    let input = input.trim();
    if let Ok(day) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(day.format("%Y-%m-%d").to_string());
    }
    if let Ok(month) = NaiveDate::parse_from_str(&format!("{}-01", input), "%Y-%m-%d") {
        return Ok(month.format("%Y-%m").to_string());
    }
    anyhow::bail!("Invalid date '{}'. Use YYYY-MM-DD or YYYY-MM", input)
}

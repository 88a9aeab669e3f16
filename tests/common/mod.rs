// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use sharedbook::application::LedgerStore;
use sharedbook::domain::{Action, Cents, Person, Transaction};
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a store backed by a ledger file in a temporary directory
pub fn test_store() -> Result<(LedgerStore, TempDir)> {
    let temp_dir = TempDir::new()?;
    let store = LedgerStore::open(ledger_path(&temp_dir))?;
    Ok((store, temp_dir))
}

pub fn ledger_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("transactions.csv")
}

/// Sum of credits minus sum of debits for one person, computed independently
/// of the library's balance code.
pub fn expected_balance(person: Person, transactions: &[Transaction]) -> Cents {
    let credits: Cents = transactions
        .iter()
        .filter(|t| t.person == person && t.action == Action::Credit)
        .map(|t| t.amount)
        .sum();
    let debits: Cents = transactions
        .iter()
        .filter(|t| t.person == person && t.action == Action::Debit)
        .map(|t| t.amount)
        .sum();
    credits - debits
}

/// Test fixture: a few transactions spread over two months
pub struct StandardLedger;

impl StandardLedger {
    pub fn populate(store: &mut LedgerStore) -> Result<()> {
        store.append_at(Person::Person1, Action::Credit, 120000, "2024-01-03 09:15:00")?;
        store.append_at(Person::Person2, Action::Credit, 95000, "2024-01-03 09:20:00")?;
        store.append_at(Person::Person1, Action::Debit, 4599, "2024-01-17 18:02:41")?;
        store.append_at(Person::Person2, Action::Debit, 30000, "2024-02-01 08:00:00")?;
        store.append_at(Person::Person1, Action::Debit, 1250, "2024-02-01 12:30:00")?;
        Ok(())
    }
}

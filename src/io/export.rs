use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerStore;
use crate::domain::{Balances, Person, Transaction, TransactionId, format_cents};
use crate::storage::write_transactions;

/// Full ledger snapshot for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub next_id: TransactionId,
    pub transactions: Vec<Transaction>,
    pub balances: Balances,
}

/// Exporter for writing ledger data to CSV or JSON
pub struct Exporter<'a> {
    store: &'a LedgerStore,
}

impl<'a> Exporter<'a> {
    pub fn new(store: &'a LedgerStore) -> Self {
        Self { store }
    }

    /// Export transactions in the ledger file format
    pub fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        write_transactions(writer, self.store.transactions())
    }

    /// Export per-person and combined balances to CSV
    pub fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let balances = self.store.balances()?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["person", "balance"])?;

        let mut count = 0;
        for person in Person::ALL {
            csv_writer.write_record([
                person.as_str(),
                format_cents(balances.for_person(person)).as_str(),
            ])?;
            count += 1;
        }
        csv_writer.write_record(["Combined", format_cents(balances.combined).as_str()])?;

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the whole ledger as a JSON snapshot
    pub fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            next_id: self.store.ledger().next_id(),
            transactions: self.store.transactions().to_vec(),
            balances: self.store.balances()?,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Action;
    use tempfile::TempDir;

    fn populated_store(temp: &TempDir) -> Result<LedgerStore> {
        let mut store = LedgerStore::open(temp.path().join("transactions.csv"))?;
        store.append_at(Person::Person1, Action::Credit, 1000, "2024-05-01 09:00:00")?;
        store.append_at(Person::Person2, Action::Debit, 250, "2024-05-02 09:00:00")?;
        Ok(store)
    }

    #[test]
    fn test_export_balances_csv() -> Result<()> {
        let temp = TempDir::new()?;
        let store = populated_store(&temp)?;

        let mut out = Vec::new();
        let count = Exporter::new(&store).export_balances_csv(&mut out)?;

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out)?,
            "person,balance\nPerson 1,10.00\nPerson 2,-2.50\nCombined,7.50\n"
        );
        Ok(())
    }

    #[test]
    fn test_export_transactions_matches_ledger_file() -> Result<()> {
        let temp = TempDir::new()?;
        let store = populated_store(&temp)?;

        let mut out = Vec::new();
        let count = Exporter::new(&store).export_transactions_csv(&mut out)?;

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out)?,
            std::fs::read_to_string(store.repository().path())?
        );
        Ok(())
    }

    #[test]
    fn test_export_full_json() -> Result<()> {
        let temp = TempDir::new()?;
        let store = populated_store(&temp)?;

        let mut out = Vec::new();
        let snapshot = Exporter::new(&store).export_full_json(&mut out)?;
        assert_eq!(snapshot.transactions.len(), 2);
        assert_eq!(snapshot.next_id, 3);

        let parsed: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(parsed["transactions"][0]["person"], "Person 1");
        assert_eq!(parsed["transactions"][0]["amount"], "10.00");
        assert_eq!(parsed["transactions"][1]["transaction_id"], 2);
        assert_eq!(parsed["balances"]["combined"], 750);
        Ok(())
    }
}

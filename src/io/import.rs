use anyhow::{Result, bail};
use std::io::Read;
use tracing::debug;

use crate::application::LedgerStore;
use crate::domain::{Action, Person, Transaction, now_timestamp, parse_amount};

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
}

/// Importer appending transactions from another CSV into the ledger.
///
/// Rows keep their person, action, amount and date but always receive fresh
/// ids. A missing `date` column stamps rows with the current time.
pub struct Importer<'a> {
    store: &'a mut LedgerStore,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a mut LedgerStore) -> Self {
        Self { store }
    }

    /// Import transactions from CSV in the ledger file layout
    pub fn import_transactions_csv<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h == name);
        let (Some(person_col), Some(action_col), Some(amount_col)) =
            (column("person"), column("action"), column("amount"))
        else {
            bail!("Import file must have person, action and amount columns");
        };
        let date_col = column("date");

        let mut accepted = Vec::new();
        let mut errors = Vec::new();

        for (line_num, result) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let person: Person = match record.get(person_col).unwrap_or("").parse() {
                Ok(p) => p,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("person".to_string()),
                        error: e,
                    });
                    continue;
                }
            };

            let action: Action = match record.get(action_col).unwrap_or("").parse() {
                Ok(a) => a,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("action".to_string()),
                        error: e,
                    });
                    continue;
                }
            };

            let amount_str = record.get(amount_col).unwrap_or("");
            let amount = match parse_amount(amount_str) {
                Ok(a) => a,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("amount".to_string()),
                        error: format!("Invalid amount '{}': {}", amount_str, e),
                    });
                    continue;
                }
            };

            let timestamp = date_col
                .and_then(|col| record.get(col))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(now_timestamp);

            // Id is reassigned by the ledger
            accepted.push(Transaction::new(0, person, action, amount, timestamp));
        }

        debug!(
            accepted = accepted.len(),
            rejected = errors.len(),
            dry_run = options.dry_run,
            "parsed import file"
        );

        let imported = if options.dry_run {
            accepted.len()
        } else {
            self.store.append_all(accepted)?.len()
        };

        Ok(ImportResult { imported, errors })
    }
}

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::domain::{Ledger, Transaction, TransactionId};

/// Column order of the ledger file.
pub const LEDGER_COLUMNS: [&str; 5] = ["person", "action", "amount", "date", "transaction_id"];

/// Flat-file repository: one CSV holding every transaction, plus a
/// sequence file holding the next id to assign.
#[derive(Debug, Clone)]
pub struct Repository {
    path: PathBuf,
    sequence_path: PathBuf,
}

impl Repository {
    /// Create a repository for the ledger file at `path`.
    /// Nothing is touched on disk until the first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut sequence_path = OsString::from(path.as_os_str());
        sequence_path.push(".seq");
        Self {
            path,
            sequence_path: PathBuf::from(sequence_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sequence_path(&self) -> &Path {
        &self.sequence_path
    }

    /// Load the whole ledger. A missing file is an empty ledger.
    pub fn load(&self) -> Result<Ledger> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "ledger file not found, starting empty");
                return Ok(Ledger::from_parts(Vec::new(), self.read_sequence())?);
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to open ledger file: {}", self.path.display())
                });
            }
        };

        let transactions = read_transactions(file)
            .with_context(|| format!("Failed to read ledger file: {}", self.path.display()))?;
        let ledger = Ledger::from_parts(transactions, self.read_sequence())
            .with_context(|| format!("Invalid ledger file: {}", self.path.display()))?;

        debug!(
            path = %self.path.display(),
            transactions = ledger.len(),
            next_id = ledger.next_id(),
            "loaded ledger"
        );
        Ok(ledger)
    }

    /// Write the whole ledger back, replacing the previous file contents.
    ///
    /// Each file is written to a temporary sibling and renamed into place.
    /// The sequence file is replaced before the ledger file.
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        replace_file(&self.sequence_path, |file| {
            writeln!(file, "{}", ledger.next_id())?;
            Ok(())
        })
        .with_context(|| {
            format!(
                "Failed to write sequence file: {}",
                self.sequence_path.display()
            )
        })?;

        replace_file(&self.path, |file| {
            write_transactions(file, ledger.transactions())?;
            Ok(())
        })
        .with_context(|| format!("Failed to write ledger file: {}", self.path.display()))?;

        debug!(
            path = %self.path.display(),
            transactions = ledger.len(),
            next_id = ledger.next_id(),
            "saved ledger"
        );
        Ok(())
    }

    /// Read the stored next id. Missing or garbled files fall back to
    /// deriving the counter from the highest id in the ledger.
    fn read_sequence(&self) -> Option<TransactionId> {
        let raw = match fs::read_to_string(&self.sequence_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(
                    path = %self.sequence_path.display(),
                    error = %e,
                    "could not read sequence file, deriving next id from ledger"
                );
                return None;
            }
        };

        match raw.trim().parse() {
            Ok(next_id) => Some(next_id),
            Err(_) => {
                warn!(
                    path = %self.sequence_path.display(),
                    contents = raw.trim(),
                    "invalid sequence file, deriving next id from ledger"
                );
                None
            }
        }
    }
}

/// Fill a temporary file next to `target`, then rename it over `target`.
fn replace_file(
    target: &Path,
    fill: impl FnOnce(&mut NamedTempFile) -> Result<()>,
) -> Result<()> {
    let dir = target
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    fill(&mut file)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Parse transactions in ledger-file CSV format.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut transactions = Vec::new();
    for (line_num, result) in csv_reader.deserialize::<Transaction>().enumerate() {
        let line = line_num + 2; // +2 for header and 0-indexing
        let transaction = result.with_context(|| format!("Malformed row at line {}", line))?;
        transactions.push(transaction);
    }
    Ok(transactions)
}

/// Write transactions in ledger-file CSV format. The header is always written,
/// so an empty ledger still produces a readable file.
pub fn write_transactions<W: Write>(writer: W, transactions: &[Transaction]) -> Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(LEDGER_COLUMNS)?;
    for transaction in transactions {
        csv_writer.serialize(transaction)?;
    }
    csv_writer.flush()?;

    Ok(transactions.len())
}

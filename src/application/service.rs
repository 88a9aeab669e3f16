use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::domain::{
    compute_balances, filter_transactions, now_timestamp, Action, Balances, Cents, Ledger,
    Person, Transaction, TransactionFilter, TransactionId,
};
use crate::storage::Repository;

use super::{build_summary, AppError, LedgerSummary};

/// The ledger store: every operation of the tool goes through one of these.
///
/// Mutations reload the file, apply the change in memory and write the
/// whole ledger back. Reads use the copy loaded last.
pub struct LedgerStore {
    repo: Repository,
    ledger: Ledger,
}

impl LedgerStore {
    /// Open the ledger stored at `path`. A missing file gives an empty ledger.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        Self::with_repository(Repository::new(path))
    }

    /// Open a store on top of an existing repository.
    pub fn with_repository(repo: Repository) -> Result<Self, AppError> {
        let ledger = load_checked(&repo)?;
        Ok(Self { repo, ledger })
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Re-read the ledger file, discarding the in-memory copy.
    pub fn reload(&mut self) -> Result<&Ledger, AppError> {
        self.ledger = load_checked(&self.repo)?;
        Ok(&self.ledger)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.ledger.transactions()
    }

    /// Look up one transaction by id.
    pub fn get(&self, id: TransactionId) -> Result<&Transaction, AppError> {
        self.ledger.get(id).ok_or(AppError::TransactionNotFound(id))
    }

    // ========================
    // Mutations
    // ========================

    /// Record a new transaction stamped with the current local time.
    pub fn append(
        &mut self,
        person: Person,
        action: Action,
        amount: Cents,
    ) -> Result<Transaction, AppError> {
        self.append_at(person, action, amount, now_timestamp())
    }

    /// Record a new transaction with an explicit timestamp.
    pub fn append_at(
        &mut self,
        person: Person,
        action: Action,
        amount: Cents,
        timestamp: impl Into<String>,
    ) -> Result<Transaction, AppError> {
        validate_amount(amount)?;
        let mut ledger = load_checked(&self.repo)?;

        let transaction = ledger.append(person, action, amount, timestamp)?.clone();
        self.commit(ledger)?;

        info!(
            id = transaction.id,
            person = %transaction.person,
            action = %transaction.action,
            amount = transaction.amount,
            "recorded transaction"
        );
        Ok(transaction)
    }

    /// Append several transactions under fresh ids with a single write.
    /// Ids carried by `transactions` are ignored.
    pub fn append_all(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<TransactionId>, AppError> {
        for transaction in &transactions {
            validate_amount(transaction.amount)?;
        }
        let mut ledger = load_checked(&self.repo)?;

        let mut ids = Vec::with_capacity(transactions.len());
        for t in transactions {
            ids.push(ledger.append(t.person, t.action, t.amount, t.timestamp)?.id);
        }
        if ids.is_empty() {
            self.ledger = ledger;
        } else {
            self.commit(ledger)?;
        }

        info!(count = ids.len(), "appended transactions");
        Ok(ids)
    }

    /// Change action and amount of an existing transaction.
    /// Returns `Ok(false)` without touching the file if `id` is unknown.
    pub fn update(
        &mut self,
        id: TransactionId,
        action: Action,
        amount: Cents,
    ) -> Result<bool, AppError> {
        validate_amount(amount)?;
        let mut ledger = load_checked(&self.repo)?;

        if !ledger.update(id, action, amount) {
            warn!(id, "update ignored, no such transaction");
            self.ledger = ledger;
            return Ok(false);
        }
        self.commit(ledger)?;

        info!(id, action = %action, amount, "updated transaction");
        Ok(true)
    }

    /// Remove a transaction. Returns `Ok(false)` if `id` is unknown.
    pub fn delete(&mut self, id: TransactionId) -> Result<bool, AppError> {
        let mut ledger = load_checked(&self.repo)?;

        if !ledger.delete(id) {
            warn!(id, "delete ignored, no such transaction");
            self.ledger = ledger;
            return Ok(false);
        }
        self.commit(ledger)?;

        info!(id, "deleted transaction");
        Ok(true)
    }

    /// Persist a mutated ledger and make it the current one.
    /// Nothing is written if its balances or totals would overflow.
    fn commit(&mut self, ledger: Ledger) -> Result<(), AppError> {
        compute_balances(ledger.transactions())?;
        build_summary(ledger.transactions())?;

        self.repo.save(&ledger)?;
        self.ledger = ledger;
        Ok(())
    }

    // ========================
    // Queries
    // ========================

    /// Person 1, Person 2 and combined balance.
    pub fn balances(&self) -> Result<Balances, AppError> {
        Ok(compute_balances(self.ledger.transactions())?)
    }

    /// Transactions matching `filter`, in ledger order.
    pub fn filter(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        filter_transactions(self.ledger.transactions(), filter)
    }

    /// Per-person credit/debit totals.
    pub fn summary(&self) -> Result<LedgerSummary, AppError> {
        Ok(build_summary(self.ledger.transactions())?)
    }
}

fn validate_amount(amount: Cents) -> Result<(), AppError> {
    if amount < 0 {
        return Err(AppError::NegativeAmount(amount));
    }
    Ok(())
}

fn load_checked(repo: &Repository) -> Result<Ledger, AppError> {
    let ledger = repo.load()?;

    let mut seen = HashSet::new();
    for transaction in ledger.transactions() {
        if !seen.insert(transaction.id) {
            return Err(AppError::DuplicateId(transaction.id));
        }
    }
    Ok(ledger)
}

use thiserror::Error;

use crate::domain::{Cents, LedgerError, TransactionId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("Negative amount not allowed: {0} cents")]
    NegativeAmount(Cents),

    #[error("Duplicate transaction id in ledger file: {0}")]
    DuplicateId(TransactionId),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

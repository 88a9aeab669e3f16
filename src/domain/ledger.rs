use serde::{Deserialize, Serialize};

use super::{Action, Cents, Person, Transaction, TransactionId};

/// Ordered collection of transactions plus the id counter.
///
/// `next_id` only ever grows: deleting a transaction never frees its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    next_id: TransactionId,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            next_id: 1,
        }
    }

    /// Build a ledger from loaded rows.
    /// The counter is raised to `max(id) + 1` if `next_id` is lower than that.
    pub fn from_parts(
        transactions: Vec<Transaction>,
        next_id: Option<TransactionId>,
    ) -> Result<Self, LedgerError> {
        let max_id = transactions.iter().map(|t| t.id).max().unwrap_or(0);
        let floor = max_id.checked_add(1).ok_or(LedgerError::IdExhausted)?;
        Ok(Self {
            transactions,
            next_id: next_id.map_or(floor, |n| n.max(floor)),
        })
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn next_id(&self) -> TransactionId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Append a new transaction with a fresh id and return it.
    /// Fails without changing anything once the id space is used up.
    pub fn append(
        &mut self,
        person: Person,
        action: Action,
        amount: Cents,
        timestamp: impl Into<String>,
    ) -> Result<&Transaction, LedgerError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(LedgerError::IdExhausted)?;
        self.transactions
            .push(Transaction::new(id, person, action, amount, timestamp));
        Ok(&self.transactions[self.transactions.len() - 1])
    }

    /// Replace action and amount of the transaction with `id`.
    /// Returns false (and changes nothing) if no such transaction exists.
    pub fn update(&mut self, id: TransactionId, action: Action, amount: Cents) -> bool {
        assert!(amount >= 0, "Transaction amount must not be negative");
        match self.transactions.iter_mut().find(|t| t.id == id) {
            Some(transaction) => {
                transaction.action = action;
                transaction.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Remove the transaction with `id`. Returns false if there was none.
    pub fn delete(&mut self, id: TransactionId) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        self.transactions.len() != before
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A balance or total does not fit in `Cents`
    BalanceOverflow,
    /// No id left to hand out
    IdExhausted,
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::BalanceOverflow => {
                write!(f, "balance exceeds the largest representable amount")
            }
            LedgerError::IdExhausted => write!(f, "transaction ids exhausted"),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Sum amounts, failing instead of wrapping on overflow.
pub fn checked_sum(amounts: impl IntoIterator<Item = Cents>) -> Result<Cents, LedgerError> {
    amounts
        .into_iter()
        .try_fold(0 as Cents, |acc, amount| acc.checked_add(amount))
        .ok_or(LedgerError::BalanceOverflow)
}

/// Per-person balances derived from the transaction history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balances {
    pub person1: Cents,
    pub person2: Cents,
    pub combined: Cents,
}

impl Balances {
    pub fn for_person(&self, person: Person) -> Cents {
        match person {
            Person::Person1 => self.person1,
            Person::Person2 => self.person2,
        }
    }
}

/// Compute the balance of a single person: credits minus debits.
pub fn compute_balance(person: Person, transactions: &[Transaction]) -> Result<Cents, LedgerError> {
    checked_sum(
        transactions
            .iter()
            .filter(|t| t.person == person)
            .map(Transaction::signed_amount),
    )
}

/// Compute both balances and their sum.
pub fn compute_balances(transactions: &[Transaction]) -> Result<Balances, LedgerError> {
    let person1 = compute_balance(Person::Person1, transactions)?;
    let person2 = compute_balance(Person::Person2, transactions)?;
    Ok(Balances {
        person1,
        person2,
        combined: person1
            .checked_add(person2)
            .ok_or(LedgerError::BalanceOverflow)?,
    })
}

/// Criteria for narrowing the transaction table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransactionFilter {
    #[default]
    All,
    Id(TransactionId),
    /// Matches timestamps starting with this string, e.g. "2024-03-01"
    DatePrefix(String),
    Person(Person),
}

impl TransactionFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            TransactionFilter::All => true,
            TransactionFilter::Id(id) => transaction.id == *id,
            TransactionFilter::DatePrefix(prefix) => {
                transaction.timestamp.starts_with(prefix.as_str())
            }
            TransactionFilter::Person(person) => transaction.person == *person,
        }
    }
}

/// Return the transactions matching `filter`, in ledger order.
pub fn filter_transactions<'a>(
    transactions: &'a [Transaction],
    filter: &TransactionFilter,
) -> Vec<&'a Transaction> {
    transactions.iter().filter(|t| filter.matches(t)).collect()
}

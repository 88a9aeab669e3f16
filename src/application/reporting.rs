use serde::{Deserialize, Serialize};

use crate::domain::{Action, Cents, LedgerError, Person, Transaction, checked_sum};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub person: Person,
    pub total_credits: Cents,
    pub total_debits: Cents,
    pub balance: Cents,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub people: Vec<PersonSummary>,
    pub total_credits: Cents,
    pub total_debits: Cents,
    pub combined_balance: Cents,
    pub transaction_count: usize,
    /// Timestamp of the earliest and latest transaction, as recorded
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

/// Aggregate credits and debits per person.
/// Fails if any total does not fit in `Cents`.
pub fn build_summary(transactions: &[Transaction]) -> Result<LedgerSummary, LedgerError> {
    let people = Person::ALL
        .iter()
        .map(|&person| summarize_person(person, transactions))
        .collect::<Result<Vec<_>, _>>()?;

    let total_credits = checked_sum(people.iter().map(|p| p.total_credits))?;
    let total_debits = checked_sum(people.iter().map(|p| p.total_debits))?;

    Ok(LedgerSummary {
        combined_balance: checked_sum(people.iter().map(|p| p.balance))?,
        people,
        total_credits,
        total_debits,
        transaction_count: transactions.len(),
        first_date: transactions.iter().map(|t| &t.timestamp).min().cloned(),
        last_date: transactions.iter().map(|t| &t.timestamp).max().cloned(),
    })
}

fn summarize_person(
    person: Person,
    transactions: &[Transaction],
) -> Result<PersonSummary, LedgerError> {
    let own: Vec<&Transaction> = transactions.iter().filter(|t| t.person == person).collect();
    let total_for = |action: Action| {
        checked_sum(
            own.iter()
                .filter(|t| t.action == action)
                .map(|t| t.amount),
        )
    };

    let total_credits = total_for(Action::Credit)?;
    let total_debits = total_for(Action::Debit)?;
    Ok(PersonSummary {
        person,
        total_credits,
        total_debits,
        balance: total_credits
            .checked_sub(total_debits)
            .ok_or(LedgerError::BalanceOverflow)?,
        count: own.len(),
    })
}

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::Cents;
use super::money::cents_as_decimal;

pub type TransactionId = u64;

/// Timestamp layout used for every transaction recorded by this crate.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One of the two fixed ledger participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Person {
    #[serde(rename = "Person 1")]
    Person1,
    #[serde(rename = "Person 2")]
    Person2,
}

impl Person {
    pub const ALL: [Person; 2] = [Person::Person1, Person::Person2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Person::Person1 => "Person 1",
            Person::Person2 => "Person 2",
        }
    }
}

impl std::fmt::Display for Person {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Person {
    type Err = String;

    /// Accepts "1", "person1", "Person 1", "PERSON_2" and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "1" | "person1" | "p1" => Ok(Person::Person1),
            "2" | "person2" | "p2" => Ok(Person::Person2),
            _ => Err(format!("unknown person '{}' (expected 1 or 2)", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Money in: adds to the person's balance
    Credit,
    /// Money out: subtracts from the person's balance
    Debit,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Credit => "Credit",
            Action::Debit => "Debit",
        }
    }

    /// Sign applied to an amount when computing balances.
    pub fn sign(&self) -> Cents {
        match self {
            Action::Credit => 1,
            Action::Debit => -1,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "credit" => Ok(Action::Credit),
            "debit" => Ok(Action::Debit),
            _ => Err(format!("unknown action '{}' (expected credit or debit)", s)),
        }
    }
}

/// A single credit or debit recorded against one person.
///
/// Field order matches the column order of the ledger file:
/// `person,action,amount,date,transaction_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub person: Person,
    pub action: Action,
    /// Amount in cents (never negative)
    #[serde(with = "cents_as_decimal")]
    pub amount: Cents,
    /// When the transaction was recorded, kept as written in the file
    #[serde(rename = "date")]
    pub timestamp: String,
    /// Assigned by the ledger, stable across updates
    #[serde(rename = "transaction_id")]
    pub id: TransactionId,
}

impl Transaction {
    /// Create a transaction. The id must be assigned by the ledger.
    pub fn new(
        id: TransactionId,
        person: Person,
        action: Action,
        amount: Cents,
        timestamp: impl Into<String>,
    ) -> Self {
        assert!(amount >= 0, "Transaction amount must not be negative");
        Self {
            person,
            action,
            amount,
            timestamp: timestamp.into(),
            id,
        }
    }

    /// Contribution of this transaction to its person's balance.
    pub fn signed_amount(&self) -> Cents {
        self.action.sign() * self.amount
    }

    /// Parsed timestamp, when it follows [`TIMESTAMP_FORMAT`].
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

mod common;

use anyhow::Result;
use common::{StandardLedger, expected_balance, ledger_path, test_store};
use sharedbook::application::LedgerStore;
use sharedbook::domain::{Action, Person, TransactionFilter, parse_amount};
use sharedbook::storage::Repository;

#[test]
fn test_credit_increases_person1_balance() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    StandardLedger::populate(&mut store)?;
    let before = store.balances()?;

    store.append(Person::Person1, Action::Credit, 1000)?;
    let after = store.balances()?;

    assert_eq!(after.person1 - before.person1, 1000);
    assert_eq!(after.person2, before.person2);
    Ok(())
}

#[test]
fn test_debit_decreases_person2_balance() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    StandardLedger::populate(&mut store)?;
    let before = store.balances()?;

    store.append(Person::Person2, Action::Debit, 500)?;
    let after = store.balances()?;

    assert_eq!(after.person2 - before.person2, -500);
    assert_eq!(after.person1, before.person1);
    Ok(())
}

#[test]
fn test_balances_equal_credits_minus_debits() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    StandardLedger::populate(&mut store)?;

    store.update(2, Action::Debit, 100)?;
    store.delete(3)?;
    store.append(Person::Person2, Action::Credit, 777)?;
    store.update(5, Action::Credit, 1250)?;

    let balances = store.balances()?;
    let transactions = store.transactions();
    assert_eq!(
        balances.person1,
        expected_balance(Person::Person1, transactions)
    );
    assert_eq!(
        balances.person2,
        expected_balance(Person::Person2, transactions)
    );
    assert_eq!(balances.combined, balances.person1 + balances.person2);
    Ok(())
}

#[test]
fn test_standard_ledger_balances() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    StandardLedger::populate(&mut store)?;

    let balances = store.balances()?;
    assert_eq!(balances.person1, 120000 - 4599 - 1250);
    assert_eq!(balances.person2, 95000 - 30000);
    assert_eq!(balances.combined, 114151 + 65000);
    Ok(())
}

#[test]
fn test_delete_removes_contribution() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    StandardLedger::populate(&mut store)?;
    let before = store.balances()?;

    // Transaction 3 is a Person 1 debit of 45.99
    assert!(store.delete(3)?);

    let after = store.balances()?;
    assert_eq!(after.person1, before.person1 + 4599);
    assert_eq!(after.person2, before.person2);
    assert!(store.get(3).is_err());
    Ok(())
}

#[test]
fn test_update_changes_balance_by_delta() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    StandardLedger::populate(&mut store)?;
    let before = store.balances()?;

    // Transaction 4 is a Person 2 debit of 300.00; lower it to 250.00
    assert!(store.update(4, Action::Debit, 25000)?);

    let after = store.balances()?;
    assert_eq!(after.person2 - before.person2, 5000);
    assert_eq!(after.person1, before.person1);

    // Flipping the action swings the balance by twice the amount
    assert!(store.update(4, Action::Credit, 25000)?);
    assert_eq!(store.balances()?.person2 - after.person2, 50000);
    Ok(())
}

#[test]
fn test_update_keeps_id_person_and_date() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    StandardLedger::populate(&mut store)?;

    store.update(1, Action::Debit, 10)?;
    let tx = store.get(1)?;
    assert_eq!(tx.id, 1);
    assert_eq!(tx.person, Person::Person1);
    assert_eq!(tx.timestamp, "2024-01-03 09:15:00");
    assert_eq!((tx.action, tx.amount), (Action::Debit, 10));
    Ok(())
}

#[test]
fn test_unknown_id_update_and_delete_are_noops() -> Result<()> {
    let (mut store, temp) = test_store()?;
    StandardLedger::populate(&mut store)?;
    let contents = std::fs::read_to_string(ledger_path(&temp))?;

    assert!(!store.update(99, Action::Credit, 1)?);
    assert!(!store.delete(99)?);

    assert_eq!(std::fs::read_to_string(ledger_path(&temp))?, contents);
    assert_eq!(store.transactions().len(), 5);
    Ok(())
}

#[test]
fn test_save_then_load_roundtrip() -> Result<()> {
    let (mut store, temp) = test_store()?;
    StandardLedger::populate(&mut store)?;
    store.delete(2)?;

    let reopened = LedgerStore::open(ledger_path(&temp))?;
    assert_eq!(reopened.ledger(), store.ledger());

    let repo = Repository::new(ledger_path(&temp));
    let loaded = repo.load()?;
    repo.save(&loaded)?;
    assert_eq!(repo.load()?, loaded);
    Ok(())
}

#[test]
fn test_ids_never_reused_across_reopen() -> Result<()> {
    let (mut store, temp) = test_store()?;
    StandardLedger::populate(&mut store)?;

    // Remove the newest transaction, then come back in a new process
    assert!(store.delete(5)?);
    drop(store);

    let mut store = LedgerStore::open(ledger_path(&temp))?;
    let tx = store.append(Person::Person1, Action::Credit, 100)?;
    assert_eq!(tx.id, 6);

    let ids: Vec<_> = store.transactions().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 6]);
    Ok(())
}

#[test]
fn test_huge_amounts_never_make_the_ledger_unreadable() -> Result<()> {
    let (mut store, temp) = test_store()?;
    let huge = parse_amount("90000000000000000")?;

    store.append(Person::Person1, Action::Credit, huge)?;
    assert!(store.append(Person::Person1, Action::Credit, huge).is_err());
    drop(store);

    // The rejected row never reached the file
    let store = LedgerStore::open(ledger_path(&temp))?;
    assert_eq!(store.transactions().len(), 1);
    assert_eq!(store.balances()?.person1, huge);
    assert!(store.summary().is_ok());
    Ok(())
}

#[test]
fn test_missing_file_is_empty_ledger() -> Result<()> {
    let (store, temp) = test_store()?;

    assert!(store.transactions().is_empty());
    assert_eq!(store.balances()?.combined, 0);
    assert!(!ledger_path(&temp).exists());
    Ok(())
}

#[test]
fn test_filtering() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    StandardLedger::populate(&mut store)?;

    let by_id = store.filter(&TransactionFilter::Id(4));
    assert_eq!(by_id.len(), 1);
    assert_eq!(by_id[0].person, Person::Person2);

    let january = store.filter(&TransactionFilter::DatePrefix("2024-01".into()));
    assert_eq!(january.len(), 3);

    let feb_first = store.filter(&TransactionFilter::DatePrefix("2024-02-01".into()));
    let ids: Vec<_> = feb_first.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![4, 5]);

    let person1 = store.filter(&TransactionFilter::Person(Person::Person1));
    let ids: Vec<_> = person1.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 3, 5]);

    assert_eq!(store.filter(&TransactionFilter::All).len(), 5);
    assert!(store
        .filter(&TransactionFilter::DatePrefix("2023".into()))
        .is_empty());
    Ok(())
}

#[test]
fn test_summary_matches_balances() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    StandardLedger::populate(&mut store)?;

    let summary = store.summary()?;
    let balances = store.balances()?;

    assert_eq!(summary.transaction_count, 5);
    assert_eq!(summary.combined_balance, balances.combined);
    for p in &summary.people {
        assert_eq!(p.balance, balances.for_person(p.person));
    }
    assert_eq!(summary.first_date.as_deref(), Some("2024-01-03 09:15:00"));
    assert_eq!(summary.last_date.as_deref(), Some("2024-02-01 12:30:00"));
    Ok(())
}

#[test]
fn test_reads_files_written_by_other_tools() -> Result<()> {
    let (_, temp) = test_store()?;
    std::fs::write(
        ledger_path(&temp),
        "person,action,amount,date,transaction_id\n\
         Person 1,Credit,10.0,2024-11-02 10:11:12,1\n\
         Person 2,Debit,5.0,2024-11-02 10:12:00,2\n\
         Person 1,Debit,0.5,2024-11-03 07:00:00,4\n",
    )?;

    let mut store = LedgerStore::open(ledger_path(&temp))?;
    let balances = store.balances()?;
    assert_eq!(balances.person1, 950);
    assert_eq!(balances.person2, -500);
    assert_eq!(balances.combined, 450);

    let tx = store.append(Person::Person2, Action::Credit, 100)?;
    assert_eq!(tx.id, 5);
    Ok(())
}

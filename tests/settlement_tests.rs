// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use wagebook::commands::{attendance, bonus, ledger, salary, settlement, workers};
use wagebook::db;
use wagebook::error::WagebookError;
use wagebook::models::{AttendanceStatus, SettlementKind, TxKind};

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    workers::add_worker(&conn, "Asha", Decimal::from(100), Decimal::from(8)).unwrap();
    workers::add_worker(&conn, "Ravi", Decimal::from(120), Decimal::from(8)).unwrap();
    conn
}

fn d(s: &str) -> chrono::NaiveDate {
    s.parse().unwrap()
}

fn mark_present(conn: &Connection, wid: i64, date: &str) {
    attendance::upsert(conn, wid, d(date), AttendanceStatus::Present, Decimal::from(8), None)
        .unwrap();
}

#[test]
fn salary_finalize_posts_deposits_and_advances() {
    let mut conn = setup();
    ledger::append_transaction(&mut conn, 1, TxKind::Advance, Decimal::from(2000), d("2025-06-15"), None)
        .unwrap();
    mark_present(&conn, 1, "2025-07-01");
    mark_present(&conn, 2, "2025-07-01");

    let drafts = salary::draft(&mut conn, d("2025-07-01"), d("2025-07-31")).unwrap();
    let asha = drafts.iter().find(|s| s.worker_name == "Asha").unwrap();
    let ravi = drafts.iter().find(|s| s.worker_name == "Ravi").unwrap();
    assert_eq!(asha.total_pay, Decimal::from(800));

    salary::set_deposit(&conn, asha.id, Decimal::from(2000)).unwrap();
    salary::set_advance(&conn, ravi.id, Decimal::from(1500)).unwrap();

    let rec =
        settlement::finalize(&mut conn, SettlementKind::Salary, d("2025-07-01"), d("2025-07-31"))
            .unwrap();

    assert_eq!(ledger::get_balance(&conn, 1).unwrap(), Decimal::ZERO);
    assert_eq!(ledger::get_balance(&conn, 2).unwrap(), Decimal::from(1500));
    assert_eq!(ledger::get_history(&conn, 1).unwrap().len(), 2);
    assert_eq!(ledger::get_history(&conn, 2).unwrap().len(), 1);

    assert_eq!(rec.items.len(), 2);
    let asha_item = rec.items.iter().find(|i| i.worker_name == "Asha").unwrap();
    assert_eq!(asha_item.deposit, Decimal::from(2000));
    assert_eq!(asha_item.balance_after, Decimal::ZERO);
    assert_eq!(rec.total_deposit, Decimal::from(2000));
    assert_eq!(rec.total_advance, Decimal::from(1500));

    // Drafts are locked once settled
    let err = salary::set_deposit(&conn, asha.id, Decimal::from(1)).unwrap_err();
    assert!(matches!(err, WagebookError::Conflict(_)));
}

#[test]
fn deposit_never_reduces_final_amount_twice() {
    let mut conn = setup();
    ledger::append_transaction(&mut conn, 1, TxKind::Advance, Decimal::from(500), d("2025-06-15"), None)
        .unwrap();
    mark_present(&conn, 1, "2025-07-01");

    let drafts = salary::draft(&mut conn, d("2025-07-01"), d("2025-07-31")).unwrap();
    let asha = drafts.iter().find(|s| s.worker_name == "Asha").unwrap();

    let rec = salary::set_deposit(&conn, asha.id, Decimal::from(300)).unwrap();
    assert_eq!(rec.final_amount, Decimal::from(500));

    // A new advance rides along without touching the salary figure
    let rec = salary::set_advance(&conn, asha.id, Decimal::from(1000)).unwrap();
    assert_eq!(rec.final_amount, Decimal::from(500));
    assert_eq!(rec.new_advance, Decimal::from(1000));
}

#[test]
fn failed_worker_aborts_whole_batch() {
    let mut conn = setup();
    // Asha can cover her deposit, Ravi cannot cover his
    ledger::append_transaction(&mut conn, 1, TxKind::Advance, Decimal::from(1000), d("2025-06-01"), None)
        .unwrap();
    mark_present(&conn, 1, "2025-07-01");
    mark_present(&conn, 2, "2025-07-01");

    let drafts = salary::draft(&mut conn, d("2025-07-01"), d("2025-07-31")).unwrap();
    let asha = drafts.iter().find(|s| s.worker_name == "Asha").unwrap();
    let ravi = drafts.iter().find(|s| s.worker_name == "Ravi").unwrap();
    salary::set_deposit(&conn, asha.id, Decimal::from(500)).unwrap();
    salary::set_deposit(&conn, ravi.id, Decimal::from(2000)).unwrap();

    let err =
        settlement::finalize(&mut conn, SettlementKind::Salary, d("2025-07-01"), d("2025-07-31"))
            .unwrap_err();
    match err {
        WagebookError::InsufficientBalance { worker, .. } => assert_eq!(worker, "Ravi"),
        other => panic!("unexpected error {:?}", other),
    }

    // Asha's posting was rolled back with the rest of the batch
    assert_eq!(ledger::get_balance(&conn, 1).unwrap(), Decimal::from(1000));
    assert_eq!(ledger::get_history(&conn, 1).unwrap().len(), 1);
    let settlements: i64 = conn
        .query_row("SELECT COUNT(*) FROM settlements", [], |r| r.get(0))
        .unwrap();
    assert_eq!(settlements, 0);
    let finalized: i64 = conn
        .query_row("SELECT COUNT(*) FROM salary_records WHERE is_finalized=1", [], |r| r.get(0))
        .unwrap();
    assert_eq!(finalized, 0);
}

#[test]
fn bonus_finalize_posts_employee_deposits() {
    let mut conn = setup();
    ledger::append_transaction(&mut conn, 1, TxKind::Advance, Decimal::from(1000), d("2025-06-01"), None)
        .unwrap();
    mark_present(&conn, 1, "2025-07-01");
    mark_present(&conn, 2, "2025-07-01");

    let drafts = bonus::draft(&mut conn, d("2025-07-01"), d("2025-07-30"), Decimal::ZERO, false)
        .unwrap();
    let asha = drafts.iter().find(|b| b.worker_name == "Asha").unwrap();
    bonus::add_employee_deposit(&conn, asha.id, Decimal::from(1000), None).unwrap();

    let rec =
        settlement::finalize(&mut conn, SettlementKind::Bonus, d("2025-07-01"), d("2025-07-30"))
            .unwrap();

    assert_eq!(ledger::get_balance(&conn, 1).unwrap(), Decimal::ZERO);
    let history = ledger::get_history(&conn, 1).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.last().unwrap().kind, TxKind::Deposit);

    // Ravi had no deposit: snapshotted, nothing posted
    assert_eq!(ledger::get_history(&conn, 2).unwrap().len(), 0);
    assert_eq!(rec.items.len(), 2);
}

#[test]
fn deleting_history_leaves_the_ledger_alone() {
    let mut conn = setup();
    ledger::append_transaction(&mut conn, 1, TxKind::Advance, Decimal::from(2000), d("2025-06-01"), None)
        .unwrap();
    mark_present(&conn, 1, "2025-07-01");

    let drafts = salary::draft(&mut conn, d("2025-07-01"), d("2025-07-31")).unwrap();
    salary::set_deposit(&conn, drafts[0].id, Decimal::from(2000)).unwrap();
    let rec =
        settlement::finalize(&mut conn, SettlementKind::Salary, d("2025-07-01"), d("2025-07-31"))
            .unwrap();

    let balance_before = ledger::get_balance(&conn, 1).unwrap();
    let count_before = ledger::get_history(&conn, 1).unwrap().len();

    settlement::delete_history(&conn, rec.id).unwrap();

    assert_eq!(ledger::get_balance(&conn, 1).unwrap(), balance_before);
    assert_eq!(ledger::get_history(&conn, 1).unwrap().len(), count_before);
    assert!(settlement::list_history(&conn, None).unwrap().is_empty());
    let err = settlement::get_history(&conn, rec.id).unwrap_err();
    assert!(matches!(err, WagebookError::NotFound(_)));
    // Items went with the snapshot
    let items: i64 = conn
        .query_row("SELECT COUNT(*) FROM settlement_items", [], |r| r.get(0))
        .unwrap();
    assert_eq!(items, 0);
}

#[test]
fn one_settlement_per_kind_and_period() {
    let mut conn = setup();
    mark_present(&conn, 1, "2025-07-01");
    salary::draft(&mut conn, d("2025-07-01"), d("2025-07-31")).unwrap();

    settlement::finalize(&mut conn, SettlementKind::Salary, d("2025-07-01"), d("2025-07-31"))
        .unwrap();
    let err =
        settlement::finalize(&mut conn, SettlementKind::Salary, d("2025-07-01"), d("2025-07-31"))
            .unwrap_err();
    assert!(matches!(err, WagebookError::Conflict(_)));
}

#[test]
fn finalize_without_drafts_is_not_found() {
    let mut conn = setup();
    let err =
        settlement::finalize(&mut conn, SettlementKind::Bonus, d("2025-07-01"), d("2025-07-30"))
            .unwrap_err();
    assert!(matches!(err, WagebookError::NotFound(_)));
}

#[test]
fn history_filters_by_kind() {
    let mut conn = setup();
    mark_present(&conn, 1, "2025-07-01");
    salary::draft(&mut conn, d("2025-07-01"), d("2025-07-31")).unwrap();
    bonus::draft(&mut conn, d("2025-07-01"), d("2025-07-31"), Decimal::ZERO, false).unwrap();

    settlement::finalize(&mut conn, SettlementKind::Salary, d("2025-07-01"), d("2025-07-31"))
        .unwrap();
    settlement::finalize(&mut conn, SettlementKind::Bonus, d("2025-07-01"), d("2025-07-31"))
        .unwrap();

    assert_eq!(settlement::list_history(&conn, None).unwrap().len(), 2);
    let only_bonus = settlement::list_history(&conn, Some(SettlementKind::Bonus)).unwrap();
    assert_eq!(only_bonus.len(), 1);
    assert_eq!(only_bonus[0].kind, SettlementKind::Bonus);
}

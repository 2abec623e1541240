// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use wagebook::commands::{attendance, bonus, workers};
use wagebook::db;
use wagebook::error::WagebookError;
use wagebook::models::AttendanceStatus;

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

fn mark(conn: &Connection, wid: i64, date: &str, status: AttendanceStatus) {
    let hours = match status {
        AttendanceStatus::Present => Decimal::from(8),
        _ => Decimal::ZERO,
    };
    attendance::upsert(conn, wid, d(date), status, hours, None).unwrap();
}

/// Standard-month scenario: rate 100, two absences charged at 50 against a
/// least-absent worker with none.
#[test]
fn threshold_relative_penalty_against_least_absent_worker() {
    let conn = setup();
    mark(&conn, 1, "2025-07-01", AttendanceStatus::Present);
    mark(&conn, 1, "2025-07-02", AttendanceStatus::Absent);
    mark(&conn, 1, "2025-07-03", AttendanceStatus::Absent);
    mark(&conn, 2, "2025-07-01", AttendanceStatus::Present);

    let drafts = bonus::compute_drafts(
        &conn,
        d("2025-07-01"),
        d("2025-07-30"),
        Decimal::from(50),
        true,
    )
    .unwrap();

    let asha = drafts.iter().find(|b| b.worker_name == "Asha").unwrap();
    assert_eq!(asha.base_bonus, Decimal::from(24000));
    assert_eq!(asha.days_absent, 2);
    assert_eq!(asha.penalty, Decimal::from(100));
    assert_eq!(asha.gross_bonus, Decimal::from(23900));
    assert_eq!(asha.net_bonus, Decimal::from(23900));

    let ravi = drafts.iter().find(|b| b.worker_name == "Ravi").unwrap();
    assert_eq!(ravi.penalty, Decimal::ZERO);
    assert_eq!(ravi.base_bonus, Decimal::from(28800));
}

#[test]
fn threshold_mode_charges_only_absences_beyond_the_minimum() {
    let conn = setup();
    for day in ["2025-07-01", "2025-07-02", "2025-07-03"] {
        mark(&conn, 1, day, AttendanceStatus::Absent);
    }
    mark(&conn, 2, "2025-07-01", AttendanceStatus::Absent);

    let relative = bonus::compute_drafts(
        &conn,
        d("2025-07-01"),
        d("2025-07-30"),
        Decimal::from(50),
        true,
    )
    .unwrap();
    let asha = relative.iter().find(|b| b.worker_name == "Asha").unwrap();
    let ravi = relative.iter().find(|b| b.worker_name == "Ravi").unwrap();
    assert_eq!(asha.penalty, Decimal::from(100)); // 3 - 1 chargeable
    assert_eq!(ravi.penalty, Decimal::ZERO);

    let absolute = bonus::compute_drafts(
        &conn,
        d("2025-07-01"),
        d("2025-07-30"),
        Decimal::from(50),
        false,
    )
    .unwrap();
    let asha = absolute.iter().find(|b| b.worker_name == "Asha").unwrap();
    let ravi = absolute.iter().find(|b| b.worker_name == "Ravi").unwrap();
    assert_eq!(asha.penalty, Decimal::from(150));
    assert_eq!(ravi.penalty, Decimal::from(50));
}

#[test]
fn recompute_is_idempotent() {
    let conn = setup();
    mark(&conn, 1, "2025-07-01", AttendanceStatus::Present);
    mark(&conn, 1, "2025-07-02", AttendanceStatus::Absent);

    let first = bonus::compute_drafts(&conn, d("2025-07-01"), d("2025-07-30"), Decimal::from(50), true)
        .unwrap();
    let second = bonus::compute_drafts(&conn, d("2025-07-01"), d("2025-07-30"), Decimal::from(50), true)
        .unwrap();
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[test]
fn manual_adjustments_survive_redraft() {
    let mut conn = setup();
    mark(&conn, 1, "2025-07-01", AttendanceStatus::Present);

    let drafts = bonus::draft(&mut conn, d("2025-07-01"), d("2025-07-30"), Decimal::from(50), true)
        .unwrap();
    let asha_id = drafts.iter().find(|b| b.worker_name == "Asha").unwrap().id;

    bonus::add_extra_bonus(&conn, asha_id, Decimal::from(500), Some("festival".into())).unwrap();

    // New attendance lands, the period is redrafted
    mark(&conn, 1, "2025-07-05", AttendanceStatus::Absent);
    let redrafted = bonus::draft(&mut conn, d("2025-07-01"), d("2025-07-30"), Decimal::from(50), true)
        .unwrap();
    let asha = redrafted.iter().find(|b| b.worker_name == "Asha").unwrap();

    assert!(asha.extra_bonus >= Decimal::from(500));
    assert_eq!(asha.days_absent, 1);
    // gross = 24000 - 0 (Ravi also has 0 absences... threshold keeps min at 0)
    assert_eq!(asha.penalty, Decimal::from(50));
    assert_eq!(asha.gross_bonus, Decimal::from(24450));
}

#[test]
fn deposit_beyond_gross_is_rejected() {
    let mut conn = setup();
    mark(&conn, 1, "2025-07-01", AttendanceStatus::Present);
    mark(&conn, 1, "2025-07-02", AttendanceStatus::Absent);
    mark(&conn, 1, "2025-07-03", AttendanceStatus::Absent);
    mark(&conn, 2, "2025-07-01", AttendanceStatus::Present);

    let drafts = bonus::draft(&mut conn, d("2025-07-01"), d("2025-07-30"), Decimal::from(50), true)
        .unwrap();
    let asha = drafts.iter().find(|b| b.worker_name == "Asha").unwrap();
    assert_eq!(asha.gross_bonus, Decimal::from(23900));

    let err = bonus::add_employee_deposit(&conn, asha.id, Decimal::from(24000), None).unwrap_err();
    assert!(matches!(err, WagebookError::ExceedsEntitlement { .. }));

    // An allowed deposit nets down the payout
    let rec = bonus::add_employee_deposit(&conn, asha.id, Decimal::from(900), None).unwrap();
    assert_eq!(rec.employee_deposit, Decimal::from(900));
    assert_eq!(rec.net_bonus, Decimal::from(23000));
}

#[test]
fn cumulative_deposits_are_capped_by_gross() {
    let mut conn = setup();
    mark(&conn, 1, "2025-07-01", AttendanceStatus::Present);
    let drafts = bonus::draft(&mut conn, d("2025-07-01"), d("2025-07-30"), Decimal::ZERO, false)
        .unwrap();
    let id = drafts[0].id;
    let gross = drafts[0].gross_bonus;

    bonus::add_employee_deposit(&conn, id, gross, None).unwrap();
    let err = bonus::add_employee_deposit(&conn, id, Decimal::from(1), None).unwrap_err();
    assert!(matches!(err, WagebookError::ExceedsEntitlement { .. }));
}

#[test]
fn extra_bonus_raises_gross_and_net() {
    let mut conn = setup();
    mark(&conn, 1, "2025-07-01", AttendanceStatus::Present);
    let drafts = bonus::draft(&mut conn, d("2025-07-01"), d("2025-07-30"), Decimal::from(50), true)
        .unwrap();
    let asha = drafts.iter().find(|b| b.worker_name == "Asha").unwrap();

    let rec = bonus::add_extra_bonus(&conn, asha.id, Decimal::from(250), None).unwrap();
    assert_eq!(rec.extra_bonus, Decimal::from(250));
    assert_eq!(rec.gross_bonus, Decimal::from(24250));
    assert_eq!(rec.net_bonus, Decimal::from(24250));
    assert!(rec.note.unwrap().contains("extra +250"));

    let err = bonus::add_extra_bonus(&conn, asha.id, Decimal::ZERO, None).unwrap_err();
    assert!(matches!(err, WagebookError::Validation(_)));
}

#[test]
fn mark_paid_defaults_to_net_and_leaves_ledger_alone() {
    let mut conn = setup();
    mark(&conn, 1, "2025-07-01", AttendanceStatus::Present);
    let drafts = bonus::draft(&mut conn, d("2025-07-01"), d("2025-07-30"), Decimal::ZERO, false)
        .unwrap();
    let asha = drafts.iter().find(|b| b.worker_name == "Asha").unwrap();

    let rec = bonus::mark_paid(&conn, asha.id, None).unwrap();
    assert!(rec.is_paid);
    assert_eq!(rec.amount_paid, Some(rec.net_bonus));

    let ledger_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM ledger", [], |r| r.get(0))
        .unwrap();
    assert_eq!(ledger_rows, 0);
}

#[test]
fn finalized_records_refuse_changes() {
    let mut conn = setup();
    mark(&conn, 1, "2025-07-01", AttendanceStatus::Present);
    let drafts = bonus::draft(&mut conn, d("2025-07-01"), d("2025-07-30"), Decimal::ZERO, false)
        .unwrap();
    let id = drafts[0].id;

    conn.execute("UPDATE bonus_records SET is_finalized=1", []).unwrap();

    let err = bonus::add_extra_bonus(&conn, id, Decimal::from(10), None).unwrap_err();
    assert!(matches!(err, WagebookError::Conflict(_)));
    let err = bonus::draft(&mut conn, d("2025-07-01"), d("2025-07-30"), Decimal::ZERO, false)
        .unwrap_err();
    assert!(matches!(err, WagebookError::Conflict(_)));
}

#[test]
fn inactive_workers_are_left_out_of_the_cohort() {
    let conn = setup();
    mark(&conn, 1, "2025-07-01", AttendanceStatus::Present);
    conn.execute("UPDATE workers SET is_active=0 WHERE name='Ravi'", [])
        .unwrap();

    let drafts = bonus::compute_drafts(&conn, d("2025-07-01"), d("2025-07-30"), Decimal::from(50), true)
        .unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].worker_name, "Asha");
}

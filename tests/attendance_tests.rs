// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use wagebook::commands::{attendance, workers};
use wagebook::db;
use wagebook::models::AttendanceStatus;
use wagebook::{cli, error::WagebookError};

fn setup() -> (Connection, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let w = workers::add_worker(&conn, "Asha", Decimal::from(100), Decimal::from(8)).unwrap();
    (conn, w.id)
}

fn d(s: &str) -> chrono::NaiveDate {
    s.parse().unwrap()
}

#[test]
fn pay_follows_status_rules() {
    let (conn, wid) = setup();

    let present = attendance::upsert(
        &conn,
        wid,
        d("2025-07-01"),
        AttendanceStatus::Present,
        Decimal::from(6),
        None,
    )
    .unwrap();
    assert_eq!(present.total_pay, Decimal::from(600));

    // Half-day ignores supplied hours: always half the standard day
    let half = attendance::upsert(
        &conn,
        wid,
        d("2025-07-02"),
        AttendanceStatus::HalfDay,
        Decimal::from(7),
        None,
    )
    .unwrap();
    assert_eq!(half.hours_worked, Decimal::from(4));
    assert_eq!(half.total_pay, Decimal::from(400));

    let absent = attendance::upsert(
        &conn,
        wid,
        d("2025-07-03"),
        AttendanceStatus::Absent,
        Decimal::from(8),
        None,
    )
    .unwrap();
    assert_eq!(absent.hours_worked, Decimal::ZERO);
    assert_eq!(absent.total_pay, Decimal::ZERO);
}

#[test]
fn negative_hours_rejected() {
    let (conn, wid) = setup();
    let err = attendance::upsert(
        &conn,
        wid,
        d("2025-07-01"),
        AttendanceStatus::Present,
        "-1".parse().unwrap(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, WagebookError::Validation(_)));
}

#[test]
fn second_mark_for_same_day_replaces_the_first() {
    let (conn, wid) = setup();
    attendance::upsert(
        &conn,
        wid,
        d("2025-07-01"),
        AttendanceStatus::Present,
        Decimal::from(8),
        None,
    )
    .unwrap();
    attendance::upsert(
        &conn,
        wid,
        d("2025-07-01"),
        AttendanceStatus::Present,
        Decimal::from(5),
        Some("left early".into()),
    )
    .unwrap();

    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM attendance WHERE worker_id=?1 AND date='2025-07-01'",
            [wid],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);

    let hours: String = conn
        .query_row(
            "SELECT hours_worked FROM attendance WHERE worker_id=?1 AND date='2025-07-01'",
            [wid],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(hours, "5");
}

#[test]
fn aggregate_counts_and_sums() {
    let (conn, wid) = setup();
    attendance::upsert(&conn, wid, d("2025-07-01"), AttendanceStatus::Present, Decimal::from(8), None)
        .unwrap();
    attendance::upsert(&conn, wid, d("2025-07-02"), AttendanceStatus::Present, Decimal::from(8), None)
        .unwrap();
    attendance::upsert(&conn, wid, d("2025-07-03"), AttendanceStatus::Absent, Decimal::ZERO, None)
        .unwrap();
    attendance::upsert(&conn, wid, d("2025-07-04"), AttendanceStatus::HalfDay, Decimal::ZERO, None)
        .unwrap();

    let totals = attendance::aggregate(&conn, d("2025-07-01"), d("2025-07-31"), Some(wid)).unwrap();
    assert_eq!(totals.len(), 1);
    let t = &totals[0];
    assert_eq!(t.days_present, 2);
    assert_eq!(t.days_absent, 1);
    assert_eq!(t.hours_worked, Decimal::from(20));
    assert_eq!(t.total_pay, Decimal::from(2000));
}

#[test]
fn zero_hour_holiday_counts_as_full_day_in_aggregate_only() {
    let (conn, wid) = setup();
    attendance::upsert(&conn, wid, d("2025-07-04"), AttendanceStatus::Holiday, Decimal::ZERO, None)
        .unwrap();

    let totals = attendance::aggregate(&conn, d("2025-07-01"), d("2025-07-31"), Some(wid)).unwrap();
    assert_eq!(totals[0].days_present, 1);
    assert_eq!(totals[0].hours_worked, Decimal::from(8));
    assert_eq!(totals[0].total_pay, Decimal::from(800));

    // Stored row keeps its zero hours
    let stored: String = conn
        .query_row(
            "SELECT hours_worked FROM attendance WHERE worker_id=?1 AND date='2025-07-04'",
            [wid],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(stored, "0");
}

#[test]
fn worked_holiday_keeps_its_recorded_hours() {
    let (conn, wid) = setup();
    attendance::upsert(&conn, wid, d("2025-07-04"), AttendanceStatus::Holiday, Decimal::from(3), None)
        .unwrap();

    let totals = attendance::aggregate(&conn, d("2025-07-01"), d("2025-07-31"), Some(wid)).unwrap();
    assert_eq!(totals[0].hours_worked, Decimal::from(3));
    assert_eq!(totals[0].total_pay, Decimal::from(300));
}

#[test]
fn mark_defaults_status_from_holiday_calendar() {
    let (conn, _wid) = setup();
    conn.execute(
        "INSERT INTO holidays(date, name) VALUES ('2025-07-04', 'Independence Day')",
        [],
    )
    .unwrap();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "wagebook",
        "attendance",
        "mark",
        "--worker",
        "Asha",
        "--date",
        "2025-07-04",
    ]);
    if let Some(("attendance", att_m)) = matches.subcommand() {
        attendance::handle(&conn, att_m).unwrap();
    } else {
        panic!("attendance command not parsed");
    }

    let status: String = conn
        .query_row(
            "SELECT status FROM attendance WHERE date='2025-07-04'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(status, "holiday");
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::error::WagebookError;
use crate::models::{AttendanceEntry, AttendanceStatus, AttendanceTotals};
use crate::utils::{
    fmt_money, get_dec, id_for_worker, maybe_print_json, parse_date, parse_decimal,
    period_from_args, pretty_table,
};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("mark", sub)) => mark(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("summary", sub)) => summary(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Insert or replace the one entry allowed per (worker, date). Pay is derived
/// from the worker's rate at write time:
/// present/holiday pay the recorded hours, a half-day pays half the standard
/// day regardless of supplied hours, an absent day pays nothing.
pub fn upsert(
    conn: &Connection,
    worker_id: i64,
    date: NaiveDate,
    status: AttendanceStatus,
    hours_worked: Decimal,
    note: Option<String>,
) -> crate::error::Result<AttendanceEntry> {
    if hours_worked < Decimal::ZERO {
        return Err(WagebookError::Validation(format!(
            "hours worked cannot be negative, got {}",
            hours_worked
        )));
    }
    let worker = crate::utils::get_worker(conn, worker_id)?;

    let (hours, total_pay) = match status {
        AttendanceStatus::Present | AttendanceStatus::Holiday => {
            (hours_worked, hours_worked * worker.hourly_rate)
        }
        AttendanceStatus::HalfDay => {
            let h = worker.standard_daily_hours / Decimal::TWO;
            (h, h * worker.hourly_rate)
        }
        AttendanceStatus::Absent => (Decimal::ZERO, Decimal::ZERO),
    };

    conn.execute(
        "INSERT INTO attendance(worker_id, date, status, hours_worked, total_pay, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(worker_id, date) DO UPDATE SET
             status=excluded.status,
             hours_worked=excluded.hours_worked,
             total_pay=excluded.total_pay,
             note=excluded.note,
             updated_at=datetime('now')",
        params![
            worker_id,
            date.to_string(),
            status.as_str(),
            hours.to_string(),
            total_pay.to_string(),
            note
        ],
    )?;
    let id: i64 = conn.query_row(
        "SELECT id FROM attendance WHERE worker_id=?1 AND date=?2",
        params![worker_id, date.to_string()],
        |r| r.get(0),
    )?;

    Ok(AttendanceEntry {
        id,
        worker_id,
        date,
        status,
        hours_worked: hours,
        total_pay,
        note,
    })
}

/// Per-worker totals over `[start, end]`. A holiday entry stored with zero
/// hours counts as a full standard day here; the stored row is left as is.
pub fn aggregate(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
    worker_id: Option<i64>,
) -> crate::error::Result<Vec<AttendanceTotals>> {
    let mut sql = String::from(
        "SELECT a.worker_id, w.name, w.hourly_rate, w.standard_daily_hours,
                a.status, a.hours_worked, a.total_pay
         FROM attendance a JOIN workers w ON a.worker_id=w.id
         WHERE a.date >= ?1 AND a.date <= ?2",
    );
    if worker_id.is_some() {
        sql.push_str(" AND a.worker_id = ?3");
    }
    sql.push_str(" ORDER BY a.worker_id, a.date");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match worker_id {
        Some(id) => stmt.query(params![start.to_string(), end.to_string(), id])?,
        None => stmt.query(params![start.to_string(), end.to_string()])?,
    };

    let mut totals: Vec<AttendanceTotals> = Vec::new();
    while let Some(r) = rows.next()? {
        let wid: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let rate = get_dec(r, 2)?;
        let std_hours = get_dec(r, 3)?;
        let status = AttendanceStatus::parse(&r.get::<_, String>(4)?)?;
        let mut hours = get_dec(r, 5)?;
        let mut pay = get_dec(r, 6)?;

        if status == AttendanceStatus::Holiday && hours.is_zero() {
            hours = std_hours;
            pay = std_hours * rate;
        }

        if totals.last().map(|t| t.worker_id) != Some(wid) {
            totals.push(AttendanceTotals {
                worker_id: wid,
                worker_name: name,
                hours_worked: Decimal::ZERO,
                total_pay: Decimal::ZERO,
                days_present: 0,
                days_absent: 0,
            });
        }
        let t = totals.last_mut().unwrap();
        t.hours_worked += hours;
        t.total_pay += pay;
        match status {
            AttendanceStatus::Present | AttendanceStatus::Holiday => t.days_present += 1,
            AttendanceStatus::Absent => t.days_absent += 1,
            AttendanceStatus::HalfDay => {}
        }
    }
    Ok(totals)
}

fn mark(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("worker").unwrap().trim();
    let worker_id = id_for_worker(conn, name)?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d.trim())?,
        None => chrono::Local::now().date_naive(),
    };
    // Without an explicit status the holiday calendar decides the default.
    let status = match sub.get_one::<String>("status") {
        Some(s) => AttendanceStatus::parse(s.trim())?,
        None => {
            let on_calendar: Option<i32> = conn
                .query_row(
                    "SELECT 1 FROM holidays WHERE date=?1",
                    params![date.to_string()],
                    |r| r.get(0),
                )
                .optional()?;
            if on_calendar.is_some() {
                AttendanceStatus::Holiday
            } else {
                AttendanceStatus::Present
            }
        }
    };
    let hours = match sub.get_one::<String>("hours") {
        Some(h) => parse_decimal(h.trim())?,
        None => match status {
            AttendanceStatus::Present => {
                crate::utils::get_worker(conn, worker_id)?.standard_daily_hours
            }
            _ => Decimal::ZERO,
        },
    };
    let note = sub.get_one::<String>("note").map(|s| s.to_string());

    let entry = upsert(conn, worker_id, date, status, hours, note)?;
    println!(
        "Marked '{}' {} on {} ({}h, pay {})",
        name,
        entry.status.as_str(),
        entry.date,
        entry.hours_worked,
        fmt_money(&entry.total_pay)
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let (start, end) = period_from_args(sub)?;
    let worker_id = match sub.get_one::<String>("worker") {
        Some(name) => Some(id_for_worker(conn, name.trim())?),
        None => None,
    };

    let mut sql = String::from(
        "SELECT a.date, w.name, a.status, a.hours_worked, a.total_pay, a.note
         FROM attendance a JOIN workers w ON a.worker_id=w.id
         WHERE a.date >= ?1 AND a.date <= ?2",
    );
    if worker_id.is_some() {
        sql.push_str(" AND a.worker_id = ?3");
    }
    sql.push_str(" ORDER BY a.date, w.name");

    let mut stmt = conn.prepare(&sql)?;
    let mut cur = match worker_id {
        Some(id) => stmt.query(params![start.to_string(), end.to_string(), id])?,
        None => stmt.query(params![start.to_string(), end.to_string()])?,
    };
    let mut data = Vec::new();
    while let Some(r) = cur.next()? {
        data.push(vec![
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, Option<String>>(5)?.unwrap_or_default(),
        ]);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(&["Date", "Worker", "Status", "Hours", "Pay", "Note"], data)
        );
    }
    Ok(())
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let (start, end) = period_from_args(sub)?;
    let worker_id = match sub.get_one::<String>("worker") {
        Some(name) => Some(id_for_worker(conn, name.trim())?),
        None => None,
    };
    let totals = aggregate(conn, start, end, worker_id)?;
    if !maybe_print_json(json_flag, jsonl_flag, &totals)? {
        let rows: Vec<Vec<String>> = totals
            .iter()
            .map(|t| {
                vec![
                    t.worker_name.clone(),
                    t.hours_worked.to_string(),
                    fmt_money(&t.total_pay),
                    t.days_present.to_string(),
                    t.days_absent.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Worker", "Hours", "Pay", "Present", "Absent"], rows)
        );
    }
    Ok(())
}

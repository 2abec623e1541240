// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::commands::attendance;
use crate::error::WagebookError;
use crate::models::SalaryRecord;
use crate::utils::{fmt_money, get_dec, maybe_print_json, parse_decimal, period_from_args, pretty_table};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("draft", sub)) => draft_cmd(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("set-deposit", sub)) => set_deposit_cmd(conn, sub)?,
        Some(("set-advance", sub)) => set_advance_cmd(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Build or refresh salary rows for every active worker over the period.
/// `deposit` and `new_advance` are operator-entered and survive recompute;
/// they are deliberately not derived from the ledger until finalize.
pub fn draft(
    conn: &mut Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> crate::error::Result<Vec<SalaryRecord>> {
    let workers: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT id FROM workers WHERE is_active=1 ORDER BY id")?;
        let ids = stmt
            .query_map([], |r| r.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        ids
    };

    let finalized: i64 = conn.query_row(
        "SELECT COUNT(*) FROM salary_records WHERE period_start=?1 AND period_end=?2 AND is_finalized=1",
        params![start.to_string(), end.to_string()],
        |r| r.get(0),
    )?;
    if finalized > 0 {
        return Err(WagebookError::Conflict(format!(
            "salary records for {}..{} are finalized",
            start, end
        )));
    }

    let totals = attendance::aggregate(conn, start, end, None)?;

    let tx = conn.transaction()?;
    for wid in &workers {
        let t = totals.iter().find(|t| t.worker_id == *wid);
        let hours = t.map(|t| t.hours_worked).unwrap_or(Decimal::ZERO);
        let pay = t.map(|t| t.total_pay).unwrap_or(Decimal::ZERO);
        let present = t.map(|t| t.days_present).unwrap_or(0);
        let absent = t.map(|t| t.days_absent).unwrap_or(0);

        let deposit: Decimal = tx
            .query_row(
                "SELECT deposit FROM salary_records
                 WHERE worker_id=?1 AND period_start=?2 AND period_end=?3",
                params![wid, start.to_string(), end.to_string()],
                |r| get_dec(r, 0),
            )
            .optional()?
            .unwrap_or(Decimal::ZERO);
        let final_amount = Decimal::ZERO.max(pay - deposit);

        tx.execute(
            "INSERT INTO salary_records(worker_id, period_start, period_end, hours_worked,
                 total_pay, days_present, days_absent, final_amount)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8)
             ON CONFLICT(worker_id, period_start, period_end) DO UPDATE SET
                 hours_worked=excluded.hours_worked,
                 total_pay=excluded.total_pay,
                 days_present=excluded.days_present,
                 days_absent=excluded.days_absent,
                 final_amount=excluded.final_amount",
            params![
                wid,
                start.to_string(),
                end.to_string(),
                hours.to_string(),
                pay.to_string(),
                present,
                absent,
                final_amount.to_string()
            ],
        )?;
    }
    tx.commit()?;
    list_records(conn, start, end)
}

pub fn load_record(conn: &Connection, record_id: i64) -> crate::error::Result<SalaryRecord> {
    let rec = conn
        .query_row(
            "SELECT s.id, s.worker_id, w.name, s.period_start, s.period_end, s.hours_worked,
                    s.total_pay, s.days_present, s.days_absent, s.deposit, s.new_advance,
                    s.final_amount, s.is_finalized, s.note
             FROM salary_records s JOIN workers w ON s.worker_id=w.id WHERE s.id=?1",
            params![record_id],
            row_to_record,
        )
        .optional()?;
    rec.ok_or_else(|| WagebookError::NotFound(format!("salary record #{}", record_id)))
}

pub fn list_records(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> crate::error::Result<Vec<SalaryRecord>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.worker_id, w.name, s.period_start, s.period_end, s.hours_worked,
                s.total_pay, s.days_present, s.days_absent, s.deposit, s.new_advance,
                s.final_amount, s.is_finalized, s.note
         FROM salary_records s JOIN workers w ON s.worker_id=w.id
         WHERE s.period_start=?1 AND s.period_end=?2 ORDER BY s.worker_id",
    )?;
    let rows = stmt.query_map(params![start.to_string(), end.to_string()], row_to_record)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

fn row_to_record(r: &rusqlite::Row<'_>) -> rusqlite::Result<SalaryRecord> {
    let start_s: String = r.get(3)?;
    let end_s: String = r.get(4)?;
    let date_err = |idx, e: chrono::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    };
    Ok(SalaryRecord {
        id: r.get(0)?,
        worker_id: r.get(1)?,
        worker_name: r.get(2)?,
        period_start: start_s.parse().map_err(|e| date_err(3, e))?,
        period_end: end_s.parse().map_err(|e| date_err(4, e))?,
        hours_worked: get_dec(r, 5)?,
        total_pay: get_dec(r, 6)?,
        days_present: r.get(7)?,
        days_absent: r.get(8)?,
        deposit: get_dec(r, 9)?,
        new_advance: get_dec(r, 10)?,
        final_amount: get_dec(r, 11)?,
        is_finalized: r.get(12)?,
        note: r.get(13)?,
    })
}

fn ensure_open(rec: &SalaryRecord) -> crate::error::Result<()> {
    if rec.is_finalized {
        return Err(WagebookError::Conflict(format!(
            "salary record #{} is finalized",
            rec.id
        )));
    }
    Ok(())
}

/// Enter the amount withheld from this salary toward the worker's advance
/// balance. Takes effect on the ledger only at finalize.
pub fn set_deposit(
    conn: &Connection,
    record_id: i64,
    amount: Decimal,
) -> crate::error::Result<SalaryRecord> {
    if amount < Decimal::ZERO {
        return Err(WagebookError::Validation(format!(
            "deposit cannot be negative, got {}",
            amount
        )));
    }
    let rec = load_record(conn, record_id)?;
    ensure_open(&rec)?;
    let final_amount = Decimal::ZERO.max(rec.total_pay - amount);
    conn.execute(
        "UPDATE salary_records SET deposit=?1, final_amount=?2 WHERE id=?3",
        params![amount.to_string(), final_amount.to_string(), record_id],
    )?;
    load_record(conn, record_id)
}

/// Enter a fresh advance to hand out alongside this salary. Posted to the
/// ledger at finalize; never subtracted from the salary itself.
pub fn set_advance(
    conn: &Connection,
    record_id: i64,
    amount: Decimal,
) -> crate::error::Result<SalaryRecord> {
    if amount < Decimal::ZERO {
        return Err(WagebookError::Validation(format!(
            "new advance cannot be negative, got {}",
            amount
        )));
    }
    let rec = load_record(conn, record_id)?;
    ensure_open(&rec)?;
    conn.execute(
        "UPDATE salary_records SET new_advance=?1 WHERE id=?2",
        params![amount.to_string(), record_id],
    )?;
    load_record(conn, record_id)
}

fn print_records(sub: &clap::ArgMatches, data: &[SalaryRecord]) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|s| {
                vec![
                    s.id.to_string(),
                    s.worker_name.clone(),
                    s.hours_worked.to_string(),
                    fmt_money(&s.total_pay),
                    fmt_money(&s.deposit),
                    fmt_money(&s.new_advance),
                    fmt_money(&s.final_amount),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Worker", "Hours", "Pay", "Deposit", "Advance", "Final"],
                rows
            )
        );
    }
    Ok(())
}

fn draft_cmd(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (start, end) = period_from_args(sub)?;
    let data = draft(conn, start, end)?;
    print_records(sub, &data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (start, end) = period_from_args(sub)?;
    let data = list_records(conn, start, end)?;
    print_records(sub, &data)
}

fn set_deposit_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let rec = set_deposit(conn, id, amount)?;
    println!(
        "Deposit for '{}' set to {} (final {})",
        rec.worker_name,
        fmt_money(&rec.deposit),
        fmt_money(&rec.final_amount)
    );
    Ok(())
}

fn set_advance_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let rec = set_advance(conn, id, amount)?;
    println!(
        "New advance for '{}' set to {} (final {})",
        rec.worker_name,
        fmt_money(&rec.new_advance),
        fmt_money(&rec.final_amount)
    );
    Ok(())
}

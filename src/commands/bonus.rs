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
use crate::models::BonusRecord;
use crate::utils::{fmt_money, get_dec, maybe_print_json, parse_decimal, period_from_args, pretty_table};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("draft", sub)) => draft_cmd(conn, sub)?,
        Some(("preview", sub)) => preview(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("extra", sub)) => extra(conn, sub)?,
        Some(("deposit", sub)) => deposit(conn, sub)?,
        Some(("mark-paid", sub)) => mark_paid_cmd(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Compute bonus rows for every active worker without persisting anything.
///
/// The absence penalty can be threshold-relative: each worker is only charged
/// for the days they were absent beyond the least-absent worker in the
/// cohort. Manual adjustments already stored for the same (worker, period)
/// are carried forward, so recomputing never resets them.
pub fn compute_drafts(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
    deduction_per_absent_day: Decimal,
    threshold_relative: bool,
) -> crate::error::Result<Vec<BonusRecord>> {
    if deduction_per_absent_day < Decimal::ZERO {
        return Err(WagebookError::Validation(format!(
            "deduction per absent day cannot be negative, got {}",
            deduction_per_absent_day
        )));
    }

    let mut stmt =
        conn.prepare("SELECT id, name, hourly_rate FROM workers WHERE is_active=1 ORDER BY id")?;
    let workers: Vec<(i64, String, Decimal)> = stmt
        .query_map([], |r| {
            Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?, get_dec(r, 2)?))
        })?
        .collect::<rusqlite::Result<_>>()?;

    let totals = attendance::aggregate(conn, start, end, None)?;
    let absent_of = |wid: i64| -> i64 {
        totals
            .iter()
            .find(|t| t.worker_id == wid)
            .map(|t| t.days_absent)
            .unwrap_or(0)
    };
    let present_of = |wid: i64| -> i64 {
        totals
            .iter()
            .find(|t| t.worker_id == wid)
            .map(|t| t.days_present)
            .unwrap_or(0)
    };

    let min_absent = workers.iter().map(|w| absent_of(w.0)).min().unwrap_or(0);

    let mut out = Vec::new();
    for (wid, name, rate) in workers {
        let days_absent = absent_of(wid);
        let chargeable = if threshold_relative {
            (days_absent - min_absent).max(0)
        } else {
            days_absent
        };
        let penalty = Decimal::from(chargeable) * deduction_per_absent_day;
        // Fixed standard-month formula: 30 days of 8 hours.
        let base_bonus = Decimal::from(30 * 8) * rate;

        let prior = load_for_period(conn, wid, start, end)?;
        let (id, extra_bonus, employee_deposit, is_paid, amount_paid, is_finalized, note) =
            match prior {
                Some(p) => (
                    p.id,
                    p.extra_bonus,
                    p.employee_deposit,
                    p.is_paid,
                    p.amount_paid,
                    p.is_finalized,
                    p.note,
                ),
                None => (0, Decimal::ZERO, Decimal::ZERO, false, None, false, None),
            };

        let gross_bonus = Decimal::ZERO.max(base_bonus - penalty + extra_bonus);
        let net_bonus = Decimal::ZERO.max(gross_bonus - employee_deposit);

        out.push(BonusRecord {
            id,
            worker_id: wid,
            worker_name: name,
            period_start: start,
            period_end: end,
            days_present: present_of(wid),
            days_absent,
            base_bonus,
            penalty,
            extra_bonus,
            employee_deposit,
            gross_bonus,
            net_bonus,
            is_paid,
            amount_paid,
            is_finalized,
            note,
        });
    }
    Ok(out)
}

/// Persisting variant of [`compute_drafts`]: upserts one row per active
/// worker keyed by (worker, period). Stored manual fields survive the upsert
/// untouched. Refuses to overwrite a finalized period.
pub fn draft(
    conn: &mut Connection,
    start: NaiveDate,
    end: NaiveDate,
    deduction_per_absent_day: Decimal,
    threshold_relative: bool,
) -> crate::error::Result<Vec<BonusRecord>> {
    let computed = compute_drafts(conn, start, end, deduction_per_absent_day, threshold_relative)?;
    if computed.iter().any(|r| r.is_finalized) {
        return Err(WagebookError::Conflict(format!(
            "bonus records for {}..{} are finalized",
            start, end
        )));
    }

    let tx = conn.transaction()?;
    for rec in &computed {
        tx.execute(
            "INSERT INTO bonus_records(worker_id, period_start, period_end, days_present,
                 days_absent, base_bonus, penalty, gross_bonus, net_bonus)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)
             ON CONFLICT(worker_id, period_start, period_end) DO UPDATE SET
                 days_present=excluded.days_present,
                 days_absent=excluded.days_absent,
                 base_bonus=excluded.base_bonus,
                 penalty=excluded.penalty,
                 gross_bonus=excluded.gross_bonus,
                 net_bonus=excluded.net_bonus",
            params![
                rec.worker_id,
                start.to_string(),
                end.to_string(),
                rec.days_present,
                rec.days_absent,
                rec.base_bonus.to_string(),
                rec.penalty.to_string(),
                rec.gross_bonus.to_string(),
                rec.net_bonus.to_string()
            ],
        )?;
    }
    tx.commit()?;
    list_records(conn, start, end)
}

pub fn load_record(conn: &Connection, record_id: i64) -> crate::error::Result<BonusRecord> {
    let rec = query_one(
        conn,
        "SELECT b.id, b.worker_id, w.name, b.period_start, b.period_end, b.days_present,
                b.days_absent, b.base_bonus, b.penalty, b.extra_bonus, b.employee_deposit,
                b.gross_bonus, b.net_bonus, b.is_paid, b.amount_paid, b.is_finalized, b.note
         FROM bonus_records b JOIN workers w ON b.worker_id=w.id WHERE b.id=?1",
        params![record_id],
    )?;
    rec.ok_or_else(|| WagebookError::NotFound(format!("bonus record #{}", record_id)))
}

fn load_for_period(
    conn: &Connection,
    worker_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> crate::error::Result<Option<BonusRecord>> {
    query_one(
        conn,
        "SELECT b.id, b.worker_id, w.name, b.period_start, b.period_end, b.days_present,
                b.days_absent, b.base_bonus, b.penalty, b.extra_bonus, b.employee_deposit,
                b.gross_bonus, b.net_bonus, b.is_paid, b.amount_paid, b.is_finalized, b.note
         FROM bonus_records b JOIN workers w ON b.worker_id=w.id
         WHERE b.worker_id=?1 AND b.period_start=?2 AND b.period_end=?3",
        params![worker_id, start.to_string(), end.to_string()],
    )
}

pub fn list_records(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> crate::error::Result<Vec<BonusRecord>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.worker_id, w.name, b.period_start, b.period_end, b.days_present,
                b.days_absent, b.base_bonus, b.penalty, b.extra_bonus, b.employee_deposit,
                b.gross_bonus, b.net_bonus, b.is_paid, b.amount_paid, b.is_finalized, b.note
         FROM bonus_records b JOIN workers w ON b.worker_id=w.id
         WHERE b.period_start=?1 AND b.period_end=?2 ORDER BY b.worker_id",
    )?;
    let rows = stmt.query_map(params![start.to_string(), end.to_string()], row_to_record)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

fn query_one(
    conn: &Connection,
    sql: &str,
    p: impl rusqlite::Params,
) -> crate::error::Result<Option<BonusRecord>> {
    let rec = conn.query_row(sql, p, row_to_record).optional()?;
    Ok(rec)
}

fn row_to_record(r: &rusqlite::Row<'_>) -> rusqlite::Result<BonusRecord> {
    let start_s: String = r.get(3)?;
    let end_s: String = r.get(4)?;
    let paid_s: Option<String> = r.get(14)?;
    Ok(BonusRecord {
        id: r.get(0)?,
        worker_id: r.get(1)?,
        worker_name: r.get(2)?,
        period_start: start_s.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        period_end: end_s.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
        days_present: r.get(5)?,
        days_absent: r.get(6)?,
        base_bonus: get_dec(r, 7)?,
        penalty: get_dec(r, 8)?,
        extra_bonus: get_dec(r, 9)?,
        employee_deposit: get_dec(r, 10)?,
        gross_bonus: get_dec(r, 11)?,
        net_bonus: get_dec(r, 12)?,
        is_paid: r.get(13)?,
        amount_paid: match paid_s {
            Some(s) => Some(s.parse().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    14,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?),
            None => None,
        },
        is_finalized: r.get(15)?,
        note: r.get(16)?,
    })
}

fn append_note(existing: Option<String>, addition: String) -> String {
    match existing {
        Some(n) if !n.is_empty() => format!("{} | {}", n, addition),
        _ => addition,
    }
}

/// Raise a record's extra bonus and rederive gross/net.
pub fn add_extra_bonus(
    conn: &Connection,
    record_id: i64,
    amount: Decimal,
    note: Option<String>,
) -> crate::error::Result<BonusRecord> {
    if amount <= Decimal::ZERO {
        return Err(WagebookError::Validation(format!(
            "extra bonus must be positive, got {}",
            amount
        )));
    }
    let rec = load_record(conn, record_id)?;
    if rec.is_finalized {
        return Err(WagebookError::Conflict(format!(
            "bonus record #{} is finalized",
            record_id
        )));
    }
    let extra = rec.extra_bonus + amount;
    let gross = Decimal::ZERO.max(rec.base_bonus - rec.penalty + extra);
    let net = Decimal::ZERO.max(gross - rec.employee_deposit);
    let audit = append_note(
        rec.note,
        match note {
            Some(n) => format!("extra +{} ({})", amount, n),
            None => format!("extra +{}", amount),
        },
    );
    conn.execute(
        "UPDATE bonus_records SET extra_bonus=?1, gross_bonus=?2, net_bonus=?3, note=?4 WHERE id=?5",
        params![extra.to_string(), gross.to_string(), net.to_string(), audit, record_id],
    )?;
    load_record(conn, record_id)
}

/// Withhold part of the bonus as an employee deposit. The cumulative deposit
/// may never exceed the computed gross bonus.
pub fn add_employee_deposit(
    conn: &Connection,
    record_id: i64,
    amount: Decimal,
    note: Option<String>,
) -> crate::error::Result<BonusRecord> {
    if amount <= Decimal::ZERO {
        return Err(WagebookError::Validation(format!(
            "employee deposit must be positive, got {}",
            amount
        )));
    }
    let rec = load_record(conn, record_id)?;
    if rec.is_finalized {
        return Err(WagebookError::Conflict(format!(
            "bonus record #{} is finalized",
            record_id
        )));
    }
    let total = rec.employee_deposit + amount;
    if total > rec.gross_bonus {
        return Err(WagebookError::ExceedsEntitlement {
            worker: rec.worker_name,
            requested: total,
            gross: rec.gross_bonus,
        });
    }
    let net = Decimal::ZERO.max(rec.gross_bonus - total);
    let audit = append_note(
        rec.note,
        match note {
            Some(n) => format!("deposit +{} ({})", amount, n),
            None => format!("deposit +{}", amount),
        },
    );
    conn.execute(
        "UPDATE bonus_records SET employee_deposit=?1, net_bonus=?2, note=?3 WHERE id=?4",
        params![total.to_string(), net.to_string(), audit, record_id],
    )?;
    load_record(conn, record_id)
}

/// Mark a record paid. This never posts ledger transactions; the cash
/// movement is booked once, at settlement finalize.
pub fn mark_paid(
    conn: &Connection,
    record_id: i64,
    amount_paid: Option<Decimal>,
) -> crate::error::Result<BonusRecord> {
    if let Some(a) = amount_paid {
        if a < Decimal::ZERO {
            return Err(WagebookError::Validation(format!(
                "amount paid cannot be negative, got {}",
                a
            )));
        }
    }
    let rec = load_record(conn, record_id)?;
    let paid = amount_paid.unwrap_or(rec.net_bonus);
    conn.execute(
        "UPDATE bonus_records SET is_paid=1, amount_paid=?1 WHERE id=?2",
        params![paid.to_string(), record_id],
    )?;
    load_record(conn, record_id)
}

fn print_records(sub: &clap::ArgMatches, data: &[BonusRecord]) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    b.worker_name.clone(),
                    b.days_absent.to_string(),
                    fmt_money(&b.base_bonus),
                    fmt_money(&b.penalty),
                    fmt_money(&b.extra_bonus),
                    fmt_money(&b.employee_deposit),
                    fmt_money(&b.gross_bonus),
                    fmt_money(&b.net_bonus),
                    if b.is_paid { "yes".into() } else { "no".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Worker", "Absent", "Base", "Penalty", "Extra", "Deposit", "Gross", "Net", "Paid"],
                rows,
            )
        );
    }
    Ok(())
}

fn draft_cmd(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (start, end) = period_from_args(sub)?;
    let deduction = parse_decimal(sub.get_one::<String>("deduction").unwrap().trim())?;
    let threshold = sub.get_flag("threshold");
    let data = draft(conn, start, end, deduction, threshold)?;
    print_records(sub, &data)
}

fn preview(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (start, end) = period_from_args(sub)?;
    let deduction = parse_decimal(sub.get_one::<String>("deduction").unwrap().trim())?;
    let threshold = sub.get_flag("threshold");
    let data = compute_drafts(conn, start, end, deduction, threshold)?;
    print_records(sub, &data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (start, end) = period_from_args(sub)?;
    let data = list_records(conn, start, end)?;
    print_records(sub, &data)
}

fn extra(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let note = sub.get_one::<String>("note").map(|s| s.to_string());
    let rec = add_extra_bonus(conn, id, amount, note)?;
    println!(
        "Extra bonus for '{}' now {} (gross {}, net {})",
        rec.worker_name,
        fmt_money(&rec.extra_bonus),
        fmt_money(&rec.gross_bonus),
        fmt_money(&rec.net_bonus)
    );
    Ok(())
}

fn deposit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let note = sub.get_one::<String>("note").map(|s| s.to_string());
    let rec = add_employee_deposit(conn, id, amount, note)?;
    println!(
        "Deposit for '{}' now {} (net {})",
        rec.worker_name,
        fmt_money(&rec.employee_deposit),
        fmt_money(&rec.net_bonus)
    );
    Ok(())
}

fn mark_paid_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
    let amount = match sub.get_one::<String>("amount") {
        Some(a) => Some(parse_decimal(a.trim())?),
        None => None,
    };
    let rec = mark_paid(conn, id, amount)?;
    println!(
        "Marked bonus #{} for '{}' paid ({})",
        rec.id,
        rec.worker_name,
        fmt_money(&rec.amount_paid.unwrap_or(rec.net_bonus))
    );
    Ok(())
}

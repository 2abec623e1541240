// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::commands::{bonus, ledger, salary};
use crate::error::WagebookError;
use crate::models::{SettlementItem, SettlementKind, SettlementRecord, TxKind};
use crate::utils::{fmt_money, get_dec, maybe_print_json, period_from_args, pretty_table};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("run", sub)) => run(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

struct Posting {
    worker_id: i64,
    worker_name: String,
    gross: Decimal,
    deposit: Decimal,
    new_advance: Decimal,
    net: Decimal,
    record_id: i64,
}

/// Finalize the period's draft records: post each worker's deposit and new
/// advance to the ledger, mark the drafts finalized, and persist one
/// immutable settlement snapshot.
///
/// The whole batch runs inside a single storage transaction. The first
/// failing worker aborts it; the error names that worker and nothing posted
/// so far survives the rollback.
pub fn finalize(
    conn: &mut Connection,
    kind: SettlementKind,
    start: NaiveDate,
    end: NaiveDate,
) -> crate::error::Result<SettlementRecord> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM settlements WHERE kind=?1 AND period_start=?2 AND period_end=?3",
            params![kind.as_str(), start.to_string(), end.to_string()],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Err(WagebookError::Conflict(format!(
            "{} settlement for {}..{} already exists (#{})",
            kind.as_str(),
            start,
            end,
            id
        )));
    }

    let postings: Vec<Posting> = match kind {
        SettlementKind::Bonus => bonus::list_records(conn, start, end)?
            .into_iter()
            .map(|b| Posting {
                worker_id: b.worker_id,
                worker_name: b.worker_name,
                gross: b.gross_bonus,
                deposit: b.employee_deposit,
                new_advance: Decimal::ZERO,
                net: b.net_bonus,
                record_id: b.id,
            })
            .collect(),
        SettlementKind::Salary => salary::list_records(conn, start, end)?
            .into_iter()
            .map(|s| Posting {
                worker_id: s.worker_id,
                worker_name: s.worker_name,
                gross: s.total_pay,
                deposit: s.deposit,
                new_advance: s.new_advance,
                net: s.final_amount,
                record_id: s.id,
            })
            .collect(),
    };
    if postings.is_empty() {
        return Err(WagebookError::NotFound(format!(
            "no {} records drafted for {}..{}",
            kind.as_str(),
            start,
            end
        )));
    }

    let today = chrono::Local::now().date_naive();
    let note = format!("{} settlement {}..{}", kind.as_str(), start, end);
    let table = match kind {
        SettlementKind::Bonus => "bonus_records",
        SettlementKind::Salary => "salary_records",
    };

    let tx = conn.transaction()?;
    let mut total_gross = Decimal::ZERO;
    let mut total_net = Decimal::ZERO;
    let mut total_deposit = Decimal::ZERO;
    let mut total_advance = Decimal::ZERO;
    let mut items = Vec::new();
    for p in &postings {
        if p.deposit > Decimal::ZERO {
            ledger::post(
                &tx,
                p.worker_id,
                TxKind::Deposit,
                p.deposit,
                today,
                Some(note.clone()),
            )?;
        }
        if p.new_advance > Decimal::ZERO {
            ledger::post(
                &tx,
                p.worker_id,
                TxKind::Advance,
                p.new_advance,
                today,
                Some(note.clone()),
            )?;
        }
        let balance_after = crate::utils::get_worker(&tx, p.worker_id)?.balance;
        tx.execute(
            &format!("UPDATE {} SET is_finalized=1 WHERE id=?1", table),
            params![p.record_id],
        )?;
        total_gross += p.gross;
        total_net += p.net;
        total_deposit += p.deposit;
        total_advance += p.new_advance;
        items.push(SettlementItem {
            worker_id: p.worker_id,
            worker_name: p.worker_name.clone(),
            gross: p.gross,
            deposit: p.deposit,
            new_advance: p.new_advance,
            net: p.net,
            balance_after,
        });
    }

    tx.execute(
        "INSERT INTO settlements(kind, period_start, period_end, total_gross, total_net,
             total_deposit, total_advance)
         VALUES (?1,?2,?3,?4,?5,?6,?7)",
        params![
            kind.as_str(),
            start.to_string(),
            end.to_string(),
            total_gross.to_string(),
            total_net.to_string(),
            total_deposit.to_string(),
            total_advance.to_string()
        ],
    )?;
    let settlement_id = tx.last_insert_rowid();
    for item in &items {
        tx.execute(
            "INSERT INTO settlement_items(settlement_id, worker_id, worker_name, gross,
                 deposit, new_advance, net, balance_after)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                settlement_id,
                item.worker_id,
                item.worker_name,
                item.gross.to_string(),
                item.deposit.to_string(),
                item.new_advance.to_string(),
                item.net.to_string(),
                item.balance_after.to_string()
            ],
        )?;
    }
    tx.commit()?;

    get_history(conn, settlement_id)
}

pub fn list_history(
    conn: &Connection,
    kind: Option<SettlementKind>,
) -> crate::error::Result<Vec<SettlementRecord>> {
    let mut sql = String::from("SELECT id FROM settlements");
    if kind.is_some() {
        sql.push_str(" WHERE kind=?1");
    }
    sql.push_str(" ORDER BY id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let ids: Vec<i64> = match kind {
        Some(k) => stmt
            .query_map(params![k.as_str()], |r| r.get(0))?
            .collect::<rusqlite::Result<_>>()?,
        None => stmt
            .query_map([], |r| r.get(0))?
            .collect::<rusqlite::Result<_>>()?,
    };
    let mut out = Vec::new();
    for id in ids {
        out.push(get_history(conn, id)?);
    }
    Ok(out)
}

pub fn get_history(conn: &Connection, id: i64) -> crate::error::Result<SettlementRecord> {
    let head = conn
        .query_row(
            "SELECT id, kind, period_start, period_end, total_gross, total_net,
                    total_deposit, total_advance
             FROM settlements WHERE id=?1",
            params![id],
            |r| {
                let kind_s: String = r.get(1)?;
                let start_s: String = r.get(2)?;
                let end_s: String = r.get(3)?;
                Ok((
                    r.get::<_, i64>(0)?,
                    kind_s,
                    start_s,
                    end_s,
                    get_dec(r, 4)?,
                    get_dec(r, 5)?,
                    get_dec(r, 6)?,
                    get_dec(r, 7)?,
                ))
            },
        )
        .optional()?;
    let (id, kind_s, start_s, end_s, total_gross, total_net, total_deposit, total_advance) =
        head.ok_or_else(|| WagebookError::NotFound(format!("settlement #{}", id)))?;

    let mut stmt = conn.prepare(
        "SELECT worker_id, worker_name, gross, deposit, new_advance, net, balance_after
         FROM settlement_items WHERE settlement_id=?1 ORDER BY worker_id",
    )?;
    let rows = stmt.query_map(params![id], |r| {
        Ok(SettlementItem {
            worker_id: r.get(0)?,
            worker_name: r.get(1)?,
            gross: get_dec(r, 2)?,
            deposit: get_dec(r, 3)?,
            new_advance: get_dec(r, 4)?,
            net: get_dec(r, 5)?,
            balance_after: get_dec(r, 6)?,
        })
    })?;
    let mut items = Vec::new();
    for r in rows {
        items.push(r?);
    }

    Ok(SettlementRecord {
        id,
        kind: SettlementKind::parse(&kind_s)?,
        period_start: start_s
            .parse()
            .map_err(|e: chrono::ParseError| WagebookError::Validation(e.to_string()))?,
        period_end: end_s
            .parse()
            .map_err(|e: chrono::ParseError| WagebookError::Validation(e.to_string()))?,
        total_gross,
        total_net,
        total_deposit,
        total_advance,
        items,
    })
}

/// Remove a settlement snapshot. The ledger transactions it posted stay in
/// effect; deleting history never moves money.
pub fn delete_history(conn: &Connection, id: i64) -> crate::error::Result<()> {
    let n = conn.execute("DELETE FROM settlements WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(WagebookError::NotFound(format!("settlement #{}", id)));
    }
    Ok(())
}

fn run(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind = SettlementKind::parse(sub.get_one::<String>("kind").unwrap().trim())?;
    let (start, end) = period_from_args(sub)?;
    let rec = finalize(conn, kind, start, end)?;
    println!(
        "Finalized {} settlement #{} for {}..{} ({} workers, net {})",
        rec.kind.as_str(),
        rec.id,
        rec.period_start,
        rec.period_end,
        rec.items.len(),
        fmt_money(&rec.total_net)
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let kind = match sub.get_one::<String>("kind") {
        Some(k) => Some(SettlementKind::parse(k.trim())?),
        None => None,
    };
    let data = list_history(conn, kind)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|s| {
                vec![
                    s.id.to_string(),
                    s.kind.as_str().to_string(),
                    format!("{}..{}", s.period_start, s.period_end),
                    s.items.len().to_string(),
                    fmt_money(&s.total_gross),
                    fmt_money(&s.total_net),
                    fmt_money(&s.total_deposit),
                    fmt_money(&s.total_advance),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Kind", "Period", "Workers", "Gross", "Net", "Deposits", "Advances"],
                rows
            )
        );
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
    let rec = get_history(conn, id)?;
    if !maybe_print_json(json_flag, jsonl_flag, &rec)? {
        println!(
            "{} settlement #{} for {}..{}",
            rec.kind.as_str(),
            rec.id,
            rec.period_start,
            rec.period_end
        );
        let rows: Vec<Vec<String>> = rec
            .items
            .iter()
            .map(|i| {
                vec![
                    i.worker_name.clone(),
                    fmt_money(&i.gross),
                    fmt_money(&i.deposit),
                    fmt_money(&i.new_advance),
                    fmt_money(&i.net),
                    fmt_money(&i.balance_after),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Worker", "Gross", "Deposit", "Advance", "Net", "Balance"],
                rows
            )
        );
    }
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
    delete_history(conn, id)?;
    println!("Removed settlement #{} (ledger untouched)", id);
    Ok(())
}

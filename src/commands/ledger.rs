// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::WagebookError;
use crate::models::{LedgerTransaction, TxKind};
use crate::utils::{fmt_money, get_dec, id_for_worker, maybe_print_json, parse_date, parse_decimal, pretty_table};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("give", sub)) => record(conn, sub, TxKind::Advance)?,
        Some(("repay", sub)) => record(conn, sub, TxKind::Repayment)?,
        Some(("deposit", sub)) => record(conn, sub, TxKind::Deposit)?,
        Some(("balance", sub)) => balance(conn, sub)?,
        Some(("history", sub)) => history(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn record(conn: &mut Connection, sub: &clap::ArgMatches, kind: TxKind) -> Result<()> {
    let name = sub.get_one::<String>("worker").unwrap().trim().to_string();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d.trim())?,
        None => chrono::Local::now().date_naive(),
    };
    let note = sub.get_one::<String>("note").map(|s| s.to_string());

    let worker_id = id_for_worker(conn, &name)?;
    let tx = append_transaction(conn, worker_id, kind, amount, date, note)?;
    println!(
        "{} {} for '{}' on {} (balance: {})",
        match kind {
            TxKind::Advance => "Advanced",
            TxKind::Repayment => "Repaid",
            TxKind::Deposit => "Deposited",
        },
        fmt_money(&tx.amount),
        name,
        tx.date,
        fmt_money(&tx.balance_after)
    );
    Ok(())
}

/// Append a ledger transaction and refresh the cached worker balance.
///
/// The balance read, the accept/reject decision, and the row insert + cache
/// update run inside one storage transaction, so two callers racing on the
/// same worker cannot interleave.
pub fn append_transaction(
    conn: &mut Connection,
    worker_id: i64,
    kind: TxKind,
    amount: Decimal,
    date: NaiveDate,
    note: Option<String>,
) -> crate::error::Result<LedgerTransaction> {
    let tx = conn.transaction()?;
    let rec = post(&tx, worker_id, kind, amount, date, note)?;
    tx.commit()?;
    Ok(rec)
}

/// Posting body shared with the settlement finalizer, which supplies its own
/// enclosing transaction.
pub(crate) fn post(
    conn: &Connection,
    worker_id: i64,
    kind: TxKind,
    amount: Decimal,
    date: NaiveDate,
    note: Option<String>,
) -> crate::error::Result<LedgerTransaction> {
    if amount <= Decimal::ZERO {
        return Err(WagebookError::Validation(format!(
            "transaction amount must be positive, got {}",
            amount
        )));
    }
    let worker = crate::utils::get_worker(conn, worker_id)?;
    if kind.is_debit() && amount > worker.balance {
        return Err(WagebookError::InsufficientBalance {
            worker: worker.name,
            requested: amount,
            balance: worker.balance,
        });
    }
    let balance_after = worker.balance + kind.signed(amount);

    conn.execute(
        "INSERT INTO ledger(worker_id, kind, amount, date, balance_after, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            worker_id,
            kind.as_str(),
            amount.to_string(),
            date.to_string(),
            balance_after.to_string(),
            note
        ],
    )?;
    let id = conn.last_insert_rowid();
    conn.execute(
        "UPDATE workers SET balance=?1 WHERE id=?2",
        params![balance_after.to_string(), worker_id],
    )?;

    Ok(LedgerTransaction {
        id,
        worker_id,
        kind,
        amount,
        date,
        balance_after,
        note,
    })
}

pub fn get_balance(conn: &Connection, worker_id: i64) -> crate::error::Result<Decimal> {
    Ok(crate::utils::get_worker(conn, worker_id)?.balance)
}

pub fn get_history(
    conn: &Connection,
    worker_id: i64,
) -> crate::error::Result<Vec<LedgerTransaction>> {
    crate::utils::get_worker(conn, worker_id)?;
    let mut stmt = conn.prepare(
        "SELECT id, worker_id, kind, amount, date, balance_after, note
         FROM ledger WHERE worker_id=?1 ORDER BY date, id",
    )?;
    let rows = stmt.query_map(params![worker_id], |r| {
        let kind_s: String = r.get(2)?;
        let date_s: String = r.get(4)?;
        let date = date_s.parse::<NaiveDate>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            kind_s,
            get_dec(r, 3)?,
            date,
            get_dec(r, 5)?,
            r.get::<_, Option<String>>(6)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (id, worker_id, kind_s, amount, date, balance_after, note) = row?;
        data.push(LedgerTransaction {
            id,
            worker_id,
            kind: TxKind::parse(&kind_s)?,
            amount,
            date,
            balance_after,
            note,
        });
    }
    Ok(data)
}

/// One worker whose cached balance disagrees with its ledger history.
#[derive(Debug, Serialize)]
pub struct BalanceDrift {
    pub worker_id: i64,
    pub worker_name: String,
    pub cached: Decimal,
    pub folded: Decimal,
    pub last_balance_after: Option<Decimal>,
}

/// Recompute every worker's balance by folding the full ledger and compare
/// against the cache and the newest `balance_after`. Reports drift, never
/// repairs it.
pub fn reconcile(conn: &Connection) -> crate::error::Result<Vec<BalanceDrift>> {
    let mut stmt = conn.prepare("SELECT id, name, balance FROM workers ORDER BY id")?;
    let workers = stmt.query_map([], |r| {
        Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?, get_dec(r, 2)?))
    })?;

    let mut drifts = Vec::new();
    for w in workers {
        let (worker_id, worker_name, cached) = w?;
        let mut stmt_t =
            conn.prepare_cached("SELECT kind, amount, balance_after FROM ledger WHERE worker_id=?1 ORDER BY id")?;
        let mut cur = stmt_t.query(params![worker_id])?;
        let mut folded = Decimal::ZERO;
        let mut last_after: Option<Decimal> = None;
        while let Some(r) = cur.next()? {
            let kind_s: String = r.get(0)?;
            let amount = get_dec(r, 1)?;
            let after = get_dec(r, 2)?;
            folded += TxKind::parse(&kind_s)?.signed(amount);
            last_after = Some(after);
        }
        if folded != cached || last_after.map(|a| a != cached).unwrap_or(false) {
            drifts.push(BalanceDrift {
                worker_id,
                worker_name,
                cached,
                folded,
                last_balance_after: last_after,
            });
        }
    }
    Ok(drifts)
}

fn balance(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("worker").unwrap().trim();
    let worker_id = id_for_worker(conn, name)?;
    let bal = get_balance(conn, worker_id)?;
    println!("{}: {}", name, fmt_money(&bal));
    Ok(())
}

fn history(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let name = sub.get_one::<String>("worker").unwrap().trim();
    let worker_id = id_for_worker(conn, name)?;
    let data = get_history(conn, worker_id)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|t| {
                vec![
                    t.date.to_string(),
                    t.kind.as_str().to_string(),
                    fmt_money(&t.amount),
                    fmt_money(&t.balance_after),
                    t.note.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Kind", "Amount", "Balance", "Note"], rows)
        );
    }
    Ok(())
}

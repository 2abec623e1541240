// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::ledger;
use crate::utils::{get_dec, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Cached balances that no longer match the ledger fold
    for d in ledger::reconcile(conn)? {
        rows.push(vec![
            "balance_drift".into(),
            format!(
                "{}: cached {}, ledger folds to {}",
                d.worker_name, d.cached, d.folded
            ),
        ]);
    }

    // 2) Ledger rows that recorded a negative running balance
    let mut stmt = conn.prepare(
        "SELECT l.id, w.name, l.balance_after FROM ledger l JOIN workers w ON l.worker_id=w.id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let after = get_dec(r, 2)?;
        if after < Decimal::ZERO {
            rows.push(vec![
                "negative_balance".into(),
                format!("tx #{} for {}: balance_after {}", id, name, after),
            ]);
        }
    }

    // 3) Bonus records whose deposit outgrew their gross
    let mut stmt2 = conn.prepare(
        "SELECT b.id, w.name, b.employee_deposit, b.gross_bonus
         FROM bonus_records b JOIN workers w ON b.worker_id=w.id",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let dep = get_dec(r, 2)?;
        let gross = get_dec(r, 3)?;
        if dep > gross {
            rows.push(vec![
                "deposit_exceeds_gross".into(),
                format!("bonus #{} for {}: deposit {} > gross {}", id, name, dep, gross),
            ]);
        }
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

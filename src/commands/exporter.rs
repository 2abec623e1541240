// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("ledger", sub)) => export_ledger(conn, sub),
        Some(("attendance", sub)) => export_attendance(conn, sub),
        _ => Ok(()),
    }
}

fn export_ledger(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut stmt = conn.prepare(
        "SELECT l.date, w.name as worker, l.kind, l.amount, l.balance_after, l.note
         FROM ledger l JOIN workers w ON l.worker_id=w.id
         ORDER BY l.date, l.id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, Option<String>>(5)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["date", "worker", "kind", "amount", "balance_after", "note"])?;
            for row in rows {
                let (d, w, k, a, b, note) = row?;
                wtr.write_record([d, w, k, a, b, note.unwrap_or_default()])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (d, w, k, a, b, note) = row?;
                items.push(json!({
                    "date": d, "worker": w, "kind": k, "amount": a, "balance_after": b, "note": note
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
        }
    }
    println!("Exported ledger to {}", out);
    Ok(())
}

fn export_attendance(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut stmt = conn.prepare(
        "SELECT a.date, w.name as worker, a.status, a.hours_worked, a.total_pay, a.note
         FROM attendance a JOIN workers w ON a.worker_id=w.id
         ORDER BY a.date, w.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, Option<String>>(5)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["date", "worker", "status", "hours_worked", "total_pay", "note"])?;
            for row in rows {
                let (d, w, s, h, p, note) = row?;
                wtr.write_record([d, w, s, h, p, note.unwrap_or_default()])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (d, w, s, h, p, note) = row?;
                items.push(json!({
                    "date": d, "worker": w, "status": s, "hours_worked": h, "total_pay": p, "note": note
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
        }
    }
    println!("Exported attendance to {}", out);
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::error::WagebookError;
use crate::models::Worker;
use crate::utils::{fmt_money, id_for_worker, maybe_print_json, parse_decimal, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let rate = parse_decimal(sub.get_one::<String>("rate").unwrap().trim())?;
            let hours = match sub.get_one::<String>("hours") {
                Some(h) => parse_decimal(h.trim())?,
                None => Decimal::from(8),
            };
            let w = add_worker(conn, name, rate, hours)?;
            println!(
                "Added worker '{}' (rate {}, {}h standard day)",
                w.name, w.hourly_rate, w.standard_daily_hours
            );
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("set-rate", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let rate = parse_decimal(sub.get_one::<String>("rate").unwrap().trim())?;
            let id = id_for_worker(conn, name)?;
            conn.execute(
                "UPDATE workers SET hourly_rate=?1 WHERE id=?2",
                params![rate.to_string(), id],
            )?;
            println!("Rate for '{}' set to {}", name, rate);
        }
        Some(("deactivate", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let id = id_for_worker(conn, name)?;
            conn.execute("UPDATE workers SET is_active=0 WHERE id=?1", params![id])?;
            println!("Deactivated '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn add_worker(
    conn: &Connection,
    name: &str,
    hourly_rate: Decimal,
    standard_daily_hours: Decimal,
) -> crate::error::Result<Worker> {
    if name.is_empty() {
        return Err(WagebookError::Validation("worker name is required".into()));
    }
    if hourly_rate <= Decimal::ZERO || standard_daily_hours <= Decimal::ZERO {
        return Err(WagebookError::Validation(format!(
            "rate and standard hours must be positive, got {} and {}",
            hourly_rate, standard_daily_hours
        )));
    }
    let res = conn.execute(
        "INSERT INTO workers(name, hourly_rate, standard_daily_hours) VALUES (?1, ?2, ?3)",
        params![name, hourly_rate.to_string(), standard_daily_hours.to_string()],
    );
    match res {
        Ok(_) => crate::utils::get_worker(conn, conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(WagebookError::Conflict(format!(
                "worker '{}' already exists",
                name
            )))
        }
        Err(e) => Err(e.into()),
    }
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut stmt = conn.prepare(
        "SELECT id, name, hourly_rate, standard_daily_hours, is_active, balance
         FROM workers ORDER BY name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(Worker {
            id: r.get(0)?,
            name: r.get(1)?,
            hourly_rate: crate::utils::get_dec(r, 2)?,
            standard_daily_hours: crate::utils::get_dec(r, 3)?,
            is_active: r.get(4)?,
            balance: crate::utils::get_dec(r, 5)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|w| {
                vec![
                    w.name.clone(),
                    w.hourly_rate.to_string(),
                    w.standard_daily_hours.to_string(),
                    if w.is_active { "yes".into() } else { "no".into() },
                    fmt_money(&w.balance),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Name", "Rate", "Std Hours", "Active", "Balance"], rows)
        );
    }
    Ok(())
}

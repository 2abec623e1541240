// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::error::WagebookError;
use crate::models::Worker;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<String> {
    chrono::NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(s.to_string())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn id_for_worker(conn: &Connection, name: &str) -> crate::error::Result<i64> {
    let id: Option<i64> = conn
        .query_row("SELECT id FROM workers WHERE name=?1", params![name], |r| {
            r.get(0)
        })
        .optional()?;
    id.ok_or_else(|| WagebookError::NotFound(format!("worker '{}'", name)))
}

pub fn get_worker(conn: &Connection, worker_id: i64) -> crate::error::Result<Worker> {
    let w = conn
        .query_row(
            "SELECT id, name, hourly_rate, standard_daily_hours, is_active, balance
             FROM workers WHERE id=?1",
            params![worker_id],
            |r| {
                Ok(Worker {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    hourly_rate: get_dec(r, 2)?,
                    standard_daily_hours: get_dec(r, 3)?,
                    is_active: r.get(4)?,
                    balance: get_dec(r, 5)?,
                })
            },
        )
        .optional()?;
    w.ok_or_else(|| WagebookError::NotFound(format!("worker #{}", worker_id)))
}

/// Read a TEXT-encoded decimal column. A malformed stored value surfaces as a
/// conversion failure, not a silent zero.
pub fn get_dec(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn month_bounds(month: &str) -> Result<(NaiveDate, NaiveDate)> {
    let parts: Vec<&str> = month.split('-').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("Invalid month '{}'", month));
    }
    let y: i32 = parts[0].parse()?;
    let m: u32 = parts[1].parse()?;
    let last_day = match m {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if chrono::NaiveDate::from_ymd_opt(y, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => return Err(anyhow::anyhow!("Invalid month number {}", m)),
    };
    let start =
        NaiveDate::from_ymd_opt(y, m, 1).ok_or_else(|| anyhow::anyhow!("Invalid month '{}'", month))?;
    let end = NaiveDate::from_ymd_opt(y, m, last_day)
        .ok_or_else(|| anyhow::anyhow!("Invalid month '{}'", month))?;
    Ok((start, end))
}

/// Resolve the period flags shared by aggregate/draft/settle subcommands:
/// either `--month YYYY-MM` or an explicit `--from`/`--to` pair.
pub fn period_from_args(sub: &clap::ArgMatches) -> Result<(NaiveDate, NaiveDate)> {
    if let Some(month) = sub.get_one::<String>("month") {
        return month_bounds(&parse_month(month.trim())?);
    }
    let from = sub
        .get_one::<String>("from")
        .context("Either --month or --from/--to is required")?;
    let to = sub
        .get_one::<String>("to")
        .context("Either --month or --from/--to is required")?;
    let start = parse_date(from.trim())?;
    let end = parse_date(to.trim())?;
    if start > end {
        return Err(anyhow::anyhow!("Period start {} is after end {}", start, end));
    }
    Ok((start, end))
}

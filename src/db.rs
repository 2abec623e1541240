// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Wagebook", "wagebook"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("wagebook.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

/// Creates every table the crate uses. Public so integration tests can run
/// against an in-memory connection with the real schema.
pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS workers(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        hourly_rate TEXT NOT NULL,
        standard_daily_hours TEXT NOT NULL DEFAULT '8',
        is_active INTEGER NOT NULL DEFAULT 1,
        balance TEXT NOT NULL DEFAULT '0',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    -- Append-only: rows are never updated or deleted once written.
    CREATE TABLE IF NOT EXISTS ledger(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        worker_id INTEGER NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('advance','repayment','deposit')),
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        balance_after TEXT NOT NULL,
        note TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(worker_id) REFERENCES workers(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_ledger_worker ON ledger(worker_id, id);

    CREATE TABLE IF NOT EXISTS attendance(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        worker_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        status TEXT NOT NULL CHECK(status IN ('present','absent','holiday','half-day')),
        hours_worked TEXT NOT NULL,
        total_pay TEXT NOT NULL,
        note TEXT,
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(worker_id, date),
        FOREIGN KEY(worker_id) REFERENCES workers(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date);

    CREATE TABLE IF NOT EXISTS holidays(
        date TEXT PRIMARY KEY,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS bonus_records(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        worker_id INTEGER NOT NULL,
        period_start TEXT NOT NULL,
        period_end TEXT NOT NULL,
        days_present INTEGER NOT NULL DEFAULT 0,
        days_absent INTEGER NOT NULL DEFAULT 0,
        base_bonus TEXT NOT NULL DEFAULT '0',
        penalty TEXT NOT NULL DEFAULT '0',
        extra_bonus TEXT NOT NULL DEFAULT '0',
        employee_deposit TEXT NOT NULL DEFAULT '0',
        gross_bonus TEXT NOT NULL DEFAULT '0',
        net_bonus TEXT NOT NULL DEFAULT '0',
        is_paid INTEGER NOT NULL DEFAULT 0,
        amount_paid TEXT,
        is_finalized INTEGER NOT NULL DEFAULT 0,
        note TEXT,
        UNIQUE(worker_id, period_start, period_end),
        FOREIGN KEY(worker_id) REFERENCES workers(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS salary_records(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        worker_id INTEGER NOT NULL,
        period_start TEXT NOT NULL,
        period_end TEXT NOT NULL,
        hours_worked TEXT NOT NULL DEFAULT '0',
        total_pay TEXT NOT NULL DEFAULT '0',
        days_present INTEGER NOT NULL DEFAULT 0,
        days_absent INTEGER NOT NULL DEFAULT 0,
        deposit TEXT NOT NULL DEFAULT '0',
        new_advance TEXT NOT NULL DEFAULT '0',
        final_amount TEXT NOT NULL DEFAULT '0',
        is_finalized INTEGER NOT NULL DEFAULT 0,
        note TEXT,
        UNIQUE(worker_id, period_start, period_end),
        FOREIGN KEY(worker_id) REFERENCES workers(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS settlements(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL CHECK(kind IN ('bonus','salary')),
        period_start TEXT NOT NULL,
        period_end TEXT NOT NULL,
        total_gross TEXT NOT NULL DEFAULT '0',
        total_net TEXT NOT NULL DEFAULT '0',
        total_deposit TEXT NOT NULL DEFAULT '0',
        total_advance TEXT NOT NULL DEFAULT '0',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(kind, period_start, period_end)
    );

    CREATE TABLE IF NOT EXISTS settlement_items(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        settlement_id INTEGER NOT NULL,
        worker_id INTEGER NOT NULL,
        worker_name TEXT NOT NULL,
        gross TEXT NOT NULL DEFAULT '0',
        deposit TEXT NOT NULL DEFAULT '0',
        new_advance TEXT NOT NULL DEFAULT '0',
        net TEXT NOT NULL DEFAULT '0',
        balance_after TEXT NOT NULL DEFAULT '0',
        FOREIGN KEY(settlement_id) REFERENCES settlements(id) ON DELETE CASCADE
    );
    "#,
    )?;
    Ok(())
}

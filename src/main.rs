// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use wagebook::{cli, commands, db};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("worker", sub)) => commands::workers::handle(&conn, sub)?,
        Some(("holiday", sub)) => commands::holidays::handle(&conn, sub)?,
        Some(("advance", sub)) => commands::ledger::handle(&mut conn, sub)?,
        Some(("attendance", sub)) => commands::attendance::handle(&conn, sub)?,
        Some(("bonus", sub)) => commands::bonus::handle(&mut conn, sub)?,
        Some(("salary", sub)) => commands::salary::handle(&mut conn, sub)?,
        Some(("settle", sub)) => commands::settlement::handle(&mut conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

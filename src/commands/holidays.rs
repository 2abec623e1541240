// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{params, Connection};

use crate::utils::{parse_date, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute(
                "INSERT INTO holidays(date, name) VALUES (?1, ?2)
                 ON CONFLICT(date) DO UPDATE SET name=excluded.name",
                params![date.to_string(), name],
            )?;
            println!("Added holiday '{}' on {}", name, date);
        }
        Some(("rm", sub)) => {
            let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
            conn.execute("DELETE FROM holidays WHERE date=?1", params![date.to_string()])?;
            println!("Removed holiday on {}", date);
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare("SELECT date, name FROM holidays ORDER BY date")?;
            let rows = stmt.query_map([], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (d, n) = row?;
                data.push(vec![d, n]);
            }
            println!("{}", pretty_table(&["Date", "Name"], data));
        }
        _ => {}
    }
    Ok(())
}

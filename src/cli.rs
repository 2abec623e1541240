// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn period_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("month")
            .long("month")
            .help("Period as a month, YYYY-MM"),
    )
    .arg(Arg::new("from").long("from").help("Period start, YYYY-MM-DD"))
    .arg(Arg::new("to").long("to").help("Period end, YYYY-MM-DD"))
}

fn ledger_entry(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(Arg::new("worker").long("worker").required(true))
        .arg(Arg::new("amount").long("amount").required(true))
        .arg(Arg::new("date").long("date").help("Defaults to today"))
        .arg(Arg::new("note").long("note"))
}

pub fn build_cli() -> Command {
    Command::new("wagebook")
        .about("Workforce attendance, advance ledger, and settlement tracking")
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("worker")
                .about("Manage the worker directory")
                .subcommand(
                    Command::new("add")
                        .about("Add a worker")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("rate")
                                .long("rate")
                                .required(true)
                                .help("Hourly rate"),
                        )
                        .arg(
                            Arg::new("hours")
                                .long("hours")
                                .help("Standard daily hours (default 8)"),
                        ),
                )
                .subcommand(json_flags(Command::new("list").about("List workers")))
                .subcommand(
                    Command::new("set-rate")
                        .about("Change a worker's hourly rate")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("rate").long("rate").required(true)),
                )
                .subcommand(
                    Command::new("deactivate")
                        .about("Exclude a worker from future drafts")
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("holiday")
                .about("Manage the holiday calendar")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(
                    Command::new("rm").arg(Arg::new("date").long("date").required(true)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("advance")
                .about("Cash-advance ledger")
                .subcommand(ledger_entry("give", "Give a cash advance"))
                .subcommand(ledger_entry("repay", "Record a repayment"))
                .subcommand(ledger_entry("deposit", "Record a deposit against the balance"))
                .subcommand(
                    Command::new("balance")
                        .about("Show a worker's outstanding balance")
                        .arg(Arg::new("worker").long("worker").required(true)),
                )
                .subcommand(json_flags(
                    Command::new("history")
                        .about("Full transaction history for a worker")
                        .arg(Arg::new("worker").long("worker").required(true)),
                )),
        )
        .subcommand(
            Command::new("attendance")
                .about("Daily attendance")
                .subcommand(
                    Command::new("mark")
                        .about("Record one worker-day (upserts)")
                        .arg(Arg::new("worker").long("worker").required(true))
                        .arg(Arg::new("date").long("date").help("Defaults to today"))
                        .arg(
                            Arg::new("status")
                                .long("status")
                                .help("present|absent|holiday|half-day (default from calendar)"),
                        )
                        .arg(Arg::new("hours").long("hours"))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(json_flags(period_args(
                    Command::new("list")
                        .about("List entries in a period")
                        .arg(Arg::new("worker").long("worker")),
                )))
                .subcommand(json_flags(period_args(
                    Command::new("summary")
                        .about("Per-worker totals for a period")
                        .arg(Arg::new("worker").long("worker")),
                ))),
        )
        .subcommand(
            Command::new("bonus")
                .about("Bonus drafts and adjustments")
                .subcommand(json_flags(period_args(
                    Command::new("draft")
                        .about("Compute and store bonus rows for a period")
                        .arg(
                            Arg::new("deduction")
                                .long("deduction")
                                .required(true)
                                .help("Deduction per chargeable absent day"),
                        )
                        .arg(
                            Arg::new("threshold")
                                .long("threshold")
                                .action(ArgAction::SetTrue)
                                .help("Charge absences relative to the least-absent worker"),
                        ),
                )))
                .subcommand(json_flags(period_args(
                    Command::new("preview")
                        .about("Compute bonus rows without storing them")
                        .arg(Arg::new("deduction").long("deduction").required(true))
                        .arg(
                            Arg::new("threshold")
                                .long("threshold")
                                .action(ArgAction::SetTrue),
                        ),
                )))
                .subcommand(json_flags(period_args(
                    Command::new("list").about("Show stored bonus rows for a period"),
                )))
                .subcommand(
                    Command::new("extra")
                        .about("Add an extra bonus to a record")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    Command::new("deposit")
                        .about("Withhold an employee deposit from a record")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    Command::new("mark-paid")
                        .about("Mark a bonus record paid")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .help("Defaults to the net bonus"),
                        ),
                ),
        )
        .subcommand(
            Command::new("salary")
                .about("Salary drafts")
                .subcommand(json_flags(period_args(
                    Command::new("draft").about("Compute and store salary rows for a period"),
                )))
                .subcommand(json_flags(period_args(
                    Command::new("list").about("Show stored salary rows for a period"),
                )))
                .subcommand(
                    Command::new("set-deposit")
                        .about("Enter the deposit withheld from a salary")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(Arg::new("amount").long("amount").required(true)),
                )
                .subcommand(
                    Command::new("set-advance")
                        .about("Enter a fresh advance to give with a salary")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(Arg::new("amount").long("amount").required(true)),
                ),
        )
        .subcommand(
            Command::new("settle")
                .about("Finalize drafts and manage settlement history")
                .subcommand(period_args(
                    Command::new("run")
                        .about("Finalize a period: post ledger entries, snapshot the drafts")
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .required(true)
                                .help("bonus|salary"),
                        ),
                ))
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List settlement history")
                        .arg(Arg::new("kind").long("kind").help("bonus|salary")),
                ))
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Show one settlement snapshot")
                        .arg(Arg::new("id").long("id").required(true)),
                ))
                .subcommand(
                    Command::new("rm")
                        .about("Delete a snapshot (ledger entries stay)")
                        .arg(Arg::new("id").long("id").required(true)),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export raw rows")
                .subcommand(
                    Command::new("ledger")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                )
                .subcommand(
                    Command::new("attendance")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Consistency checks (report only)"))
}

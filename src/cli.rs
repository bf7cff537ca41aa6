// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn base_arg() -> Arg {
    Arg::new("base")
        .long("base")
        .help("Base currency (defaults to the stored setting)")
}

fn quote_arg() -> Arg {
    Arg::new("quote")
        .long("quote")
        .required(true)
        .help("Quote currency code")
}

fn rate_arg() -> Arg {
    Arg::new("rate")
        .long("rate")
        .required(true)
        .allow_hyphen_values(true)
        .help("Units of quote currency per 1 unit of base")
}

pub fn build_cli() -> Command {
    Command::new("ratebook")
        .about("Base-currency exchange rates with manual overrides")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_parser(value_parser!(std::path::PathBuf))
                .help("Path to the SQLite database"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("rates")
                .about("List and override exchange rates")
                .subcommand(
                    Command::new("list")
                        .about("Show manual and automatic rates")
                        .arg(Arg::new("search").long("search").help("Quote code substring"))
                        .arg(base_arg())
                        .arg(Arg::new("json").long("json").action(ArgAction::SetTrue))
                        .arg(Arg::new("jsonl").long("jsonl").action(ArgAction::SetTrue)),
                )
                .subcommand(
                    Command::new("add")
                        .about("Add a manual override")
                        .arg(quote_arg())
                        .arg(rate_arg())
                        .arg(base_arg()),
                )
                .subcommand(
                    Command::new("update")
                        .about("Change the rate of a visible entry")
                        .arg(quote_arg())
                        .arg(rate_arg())
                        .arg(base_arg()),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Remove a manual override")
                        .arg(quote_arg())
                        .arg(base_arg()),
                ),
        )
        .subcommand(
            Command::new("fx")
                .about("Base currency and conversion")
                .subcommand(
                    Command::new("set-base")
                        .about("Set the default base currency")
                        .arg(Arg::new("currency").long("currency").required(true)),
                )
                .subcommand(
                    Command::new("convert")
                        .about("Convert an amount using effective rates")
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_hyphen_values(true),
                        )
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true))
                        .arg(base_arg()),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Import data")
                .subcommand(
                    Command::new("automatic")
                        .about("Replace automatic rates from a quote,rate CSV")
                        .arg(Arg::new("path").long("path").required(true))
                        .arg(base_arg()),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("rates")
                        .about("Write resolved rates to CSV")
                        .arg(Arg::new("out").long("out").required(true))
                        .arg(base_arg()),
                ),
        )
}

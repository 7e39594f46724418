// SPDX-FileCopyrightText: 2021 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use junior_rankings::cli;
use junior_rankings::config::Config;
use junior_rankings::db::{LocalDatabase, SqliteStore};
use junior_rankings::directory::{DirectoryFilter, NameMatch};
use junior_rankings::projection::ScopeKind;
use junior_rankings::week::Week;
use junior_rankings::{RankingError, RankingService};

#[derive(Parser, Debug)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    database: Option<PathBuf>,

    /// Week of the player directory
    #[arg(long, value_parser = cli::parse_week)]
    current_week: Option<Week>,

    /// Ranks shown above and below a player in a neighborhood
    #[arg(long)]
    radius: Option<u32>,

    /// Match player names regardless of case
    #[arg(long)]
    ignore_case: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Weeks,
    Counties,
    Years,
    Directory {
        #[arg(long, default_value = "All")]
        county: String,
        #[arg(long, default_value = "All")]
        year: String,
        #[arg(long, default_value = "")]
        name: String,
    },
    History {
        #[arg(long)]
        player_id: i64,
    },
    Neighborhood {
        #[arg(long)]
        player_id: i64,
        #[arg(long, value_parser = cli::parse_week)]
        week: Week,
        /// Only this scope instead of all four
        #[arg(long, value_parser = cli::parse_scope)]
        scope: Option<ScopeKind>,
    },
    Summary {
        #[arg(long)]
        player_id: i64,
        #[arg(long, value_parser = cli::parse_week)]
        week: Week,
    },
    Similar {
        #[arg(long)]
        player_id: i64,
        #[arg(long, value_parser = cli::parse_week)]
        week: Week,
    },
    Report {
        #[arg(long, value_parser = cli::parse_week)]
        week: Week,
    },
    CountyStats,
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(database) = &args.database {
        config.database = database.clone();
    }
    if let Some(week) = &args.current_week {
        config.current_week = Some(week.label().to_owned());
    }
    if let Some(radius) = args.radius {
        config.neighborhood_radius = radius;
    }
    if args.ignore_case {
        config.name_match = NameMatch::CaseInsensitive;
    }
    config.validate()?;
    Ok(config)
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the result, or an informational message for an empty or
/// recoverable result.
fn render<T: Serialize>(
    result: Result<Vec<T>, RankingError>,
    empty_message: &str,
) -> anyhow::Result<()> {
    match result {
        Ok(rows) if rows.is_empty() => print(&json!({ "rows": rows, "info": empty_message })),
        Ok(rows) => print(&json!({ "rows": rows })),
        Err(err) if err.is_recoverable() => print(&json!({ "rows": [], "info": err.to_string() })),
        Err(err) => Err(err.into()),
    }
}

fn render_one<T: Serialize>(result: Result<T, RankingError>) -> anyhow::Result<()> {
    match result {
        Ok(value) => print(&value),
        Err(err) if err.is_recoverable() => print(&json!({ "info": err.to_string() })),
        Err(err) => Err(err.into()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let db = LocalDatabase::new(config.database.clone());
    let store = SqliteStore::open(&db)
        .with_context(|| format!("unable to use database {}", config.database.display()))?;
    let service = RankingService::new(store, config);

    match args.command {
        Command::Weeks => render(
            service.weeks().map(|weeks| weeks.to_vec()),
            "No ranking weeks available",
        ),
        Command::Counties => render(service.counties(), "No counties available"),
        Command::Years => render(service.birth_years(), "No birth years available"),
        Command::Directory { county, year, name } => {
            service.config().require_current_week()?;
            let filter = DirectoryFilter {
                county: cli::parse_filter(&county),
                birth_year: cli::parse_year_filter(&year)?,
                name: cli::parse_name_filter(&name),
            };
            render(
                service.directory(&filter),
                "No players found matching your criteria",
            )
        }
        Command::History { player_id } => {
            let player = match service.player(player_id) {
                Ok(player) => player,
                Err(err) => return render_one::<()>(Err(err)),
            };
            let history = service.player_history(player_id)?;
            if history.is_empty() {
                print(&json!({
                    "player": player,
                    "history": history,
                    "info": "No ranking data available for this player",
                }))
            } else {
                print(&json!({ "player": player, "history": history }))
            }
        }
        Command::Neighborhood {
            player_id,
            week,
            scope: Some(kind),
        } => render(
            service.neighborhood(player_id, &week, kind),
            "No players found in this neighborhood",
        ),
        Command::Neighborhood {
            player_id,
            week,
            scope: None,
        } => render(
            service.neighborhoods(player_id, &week),
            "No players found in this neighborhood",
        ),
        Command::Summary { player_id, week } => {
            render_one(service.player_summary(player_id, &week))
        }
        Command::Similar { player_id, week } => render(
            service.similar_players(player_id, &week),
            "No similar players found",
        ),
        Command::Report { week } => render_one(service.week_report(&week)),
        Command::CountyStats => render(service.county_statistics(), "No counties available"),
    }
}

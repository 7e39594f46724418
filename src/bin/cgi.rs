// SPDX-FileCopyrightText: 2021 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{collections::HashMap, env, path::PathBuf};

use serde::Serialize;
use serde_json::json;
use tracing::error;
use tracing_subscriber::EnvFilter;

use junior_rankings::cli;
use junior_rankings::config::Config;
use junior_rankings::db::{LocalDatabase, SqliteStore};
use junior_rankings::directory::DirectoryFilter;
use junior_rankings::projection::ScopeKind;
use junior_rankings::week::Week;
use junior_rankings::{PlayerId, RankingError, RankingService};

type Service = RankingService<SqliteStore>;

fn open_service() -> anyhow::Result<Service> {
    let config = match env::var_os("RANKINGS_CONFIG") {
        Some(path) => Config::load(&PathBuf::from(path))?,
        None => Config::default(),
    };
    // the directory is built from the current week
    config.require_current_week()?;
    let db = LocalDatabase::new(config.database.clone());
    let store = SqliteStore::open(&db)?;
    Ok(RankingService::new(store, config))
}

fn json_response<T: Serialize>(value: &T) -> cgi::Response {
    match serde_json::to_vec(value) {
        Ok(body) => cgi::binary_response(200, "application/json", body),
        Err(err) => cgi::text_response(500, err.to_string()),
    }
}

fn rows_response<T: Serialize>(result: Result<Vec<T>, RankingError>, empty_message: &str) -> cgi::Response {
    match result {
        Ok(rows) if rows.is_empty() => json_response(&json!({ "rows": rows, "info": empty_message })),
        Ok(rows) => json_response(&json!({ "rows": rows })),
        Err(err) => error_response(err),
    }
}

fn value_response<T: Serialize>(result: Result<T, RankingError>) -> cgi::Response {
    match result {
        Ok(value) => json_response(&value),
        Err(err) => error_response(err),
    }
}

fn error_response(err: RankingError) -> cgi::Response {
    if err.is_recoverable() {
        json_response(&json!({ "info": err.to_string() }))
    } else {
        error!("request failed: {:?}", err);
        cgi::text_response(500, err.to_string())
    }
}

struct Params(HashMap<String, String>);

impl Params {
    fn require(&self, name: &str) -> Result<&str, cgi::Response> {
        self.0
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| cgi::text_response(400, format!("missing parameter '{}'", name)))
    }

    fn optional(&self, name: &str) -> &str {
        self.0.get(name).map_or("", String::as_str)
    }

    fn player_id(&self) -> Result<PlayerId, cgi::Response> {
        self.require("playerId")?
            .parse()
            .map_err(|_| cgi::text_response(400, "invalid parameter 'playerId'"))
    }

    fn week(&self) -> Result<Week, cgi::Response> {
        cli::parse_week(self.require("week")?).map_err(|err| cgi::text_response(400, err.to_string()))
    }

    fn scope(&self) -> Result<Option<ScopeKind>, cgi::Response> {
        match self.0.get("scope") {
            Some(scope) => cli::parse_scope(scope)
                .map(Some)
                .map_err(|err| cgi::text_response(400, err.to_string())),
            None => Ok(None),
        }
    }

    fn directory_filter(&self) -> Result<DirectoryFilter, cgi::Response> {
        Ok(DirectoryFilter {
            county: cli::parse_filter(self.optional("county")),
            birth_year: cli::parse_year_filter(self.optional("year"))
                .map_err(|err| cgi::text_response(400, err.to_string()))?,
            name: cli::parse_name_filter(self.optional("name")),
        })
    }
}

fn respond(service: &Service, params: &Params) -> Result<cgi::Response, cgi::Response> {
    let response = match params.require("query")? {
        "weeks" => rows_response(
            service.weeks().map(|weeks| weeks.to_vec()),
            "No ranking weeks available",
        ),
        "counties" => rows_response(service.counties(), "No counties available"),
        "years" => rows_response(service.birth_years(), "No birth years available"),
        "directory" => rows_response(
            service.directory(&params.directory_filter()?),
            "No players found matching your criteria",
        ),
        "history" => rows_response(
            service.player_history(params.player_id()?),
            "No ranking data available for this player",
        ),
        "neighborhood" => {
            let (player_id, week) = (params.player_id()?, params.week()?);
            match params.scope()? {
                Some(kind) => rows_response(
                    service.neighborhood(player_id, &week, kind),
                    "No players found in this neighborhood",
                ),
                None => rows_response(
                    service.neighborhoods(player_id, &week),
                    "No players found in this neighborhood",
                ),
            }
        }
        "summary" => value_response(service.player_summary(params.player_id()?, &params.week()?)),
        "similar" => rows_response(
            service.similar_players(params.player_id()?, &params.week()?),
            "No similar players found",
        ),
        "report" => value_response(service.week_report(&params.week()?)),
        "county-stats" => rows_response(service.county_statistics(), "No counties available"),
        other => cgi::text_response(400, format!("unknown query '{}'", other)),
    };
    Ok(response)
}

pub fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Without a usable database no request can be served.
    let service = open_service();

    cgi::handle(|request| {
        let service = match &service {
            Ok(service) => service,
            Err(err) => {
                error!("unable to open rankings: {:?}", err);
                return cgi::text_response(500, "rankings are unavailable");
            }
        };

        let query = request.uri().query().unwrap_or("");
        let params = Params(
            form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        );

        respond(service, &params).unwrap_or_else(|response| response)
    })
}

// SPDX-FileCopyrightText: 2025 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use cache::QueryCache;
use config::Config;
use directory::{DirectoryEntry, DirectoryFilter};
use history::HistoryPoint;
use neighborhood::{NeighborhoodRow, SimilarPlayer};
use projection::{project_week, Scope, ScopeKind, WeekRanking};
use stats::{CountyCount, WeekReport};
use store::RankingStore;
use summary::PlayerSummary;
use week::Week;

pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod directory;
pub mod history;
pub mod neighborhood;
pub mod projection;
pub mod stats;
pub mod store;
pub mod summary;
pub mod week;

pub type PlayerId = i64;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub player_id: PlayerId,
    #[serde(rename = "playerName")]
    pub name: String,
    pub county: Option<String>,
    pub birth_year: Option<i32>,
}

/// Points and tournament count of one player in one week.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingObservation {
    pub player_id: PlayerId,
    pub week: String,
    pub points: f64,
    pub tournaments: u32,
}

/// An observation of a week joined with the attributes of its player.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotRow {
    pub player: Player,
    pub points: f64,
    pub tournaments: u32,
}

#[derive(Error, Debug)]
pub enum RankingError {
    #[error("malformed week label {label:?}, expected <month>-<year>")]
    MalformedWeekLabel { label: String },
    #[error("player {player_id} is not ranked in {scope} for {week}")]
    PlayerNotInScope {
        player_id: PlayerId,
        week: String,
        scope: String,
    },
    #[error("unknown player {player_id}")]
    UnknownPlayer { player_id: PlayerId },
    #[error("no current week configured")]
    NoCurrentWeek,
    #[error("storage query failed")]
    Storage(#[from] rusqlite::Error),
}

impl RankingError {
    /// Conditions of a single request that are shown as an empty state
    /// instead of failing the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RankingError::MalformedWeekLabel { .. }
                | RankingError::PlayerNotInScope { .. }
                | RankingError::UnknownPlayer { .. }
        )
    }
}

/// The neighborhood of a player in one kind of scope.
///
/// `info` explains an empty `rows` when the player has no scope of this kind.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedNeighborhood {
    pub kind: ScopeKind,
    pub scope: Option<Scope>,
    pub rows: Vec<NeighborhoodRow>,
    pub info: Option<String>,
}

pub struct RankingService<S> {
    store: S,
    cache: QueryCache,
    config: Config,
}

impl<S: RankingStore> RankingService<S> {
    pub fn new(store: S, config: Config) -> Self {
        RankingService {
            store,
            cache: QueryCache::new(),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drop all cached results, e.g. after loading a new week.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    fn sync_cache(&self) -> Result<(), RankingError> {
        let version = self.store.snapshot_version()?;
        self.cache.sync(version);
        Ok(())
    }

    fn ranking(&self, week: &Week) -> Result<Arc<WeekRanking>, RankingError> {
        self.cache.week_ranking(week, || {
            let rows = self.store.week_snapshot(week)?;
            Ok(project_week(week.clone(), rows))
        })
    }

    pub fn weeks(&self) -> Result<Arc<Vec<Week>>, RankingError> {
        self.sync_cache()?;
        self.cache.weeks(|| self.store.weeks())
    }

    pub fn counties(&self) -> Result<Vec<String>, RankingError> {
        self.store.counties()
    }

    pub fn birth_years(&self) -> Result<Vec<i32>, RankingError> {
        self.store.birth_years()
    }

    pub fn player(&self, player_id: PlayerId) -> Result<Player, RankingError> {
        self.store
            .player(player_id)?
            .ok_or(RankingError::UnknownPlayer { player_id })
    }

    pub fn week_ranking(&self, week: &Week) -> Result<Arc<WeekRanking>, RankingError> {
        self.sync_cache()?;
        self.ranking(week)
    }

    pub fn current_week(&self) -> Result<Week, RankingError> {
        match &self.config.current_week {
            Some(label) => Week::parse(label),
            None => Err(RankingError::NoCurrentWeek),
        }
    }

    /// Players of the current week matching `filter`, ranked in the full week.
    pub fn directory(&self, filter: &DirectoryFilter) -> Result<Vec<DirectoryEntry>, RankingError> {
        let week = self.current_week()?;
        let ranking = self.week_ranking(&week)?;
        let entries = directory::list(&ranking, filter, self.config.name_match);
        debug!("directory for {} matched {} players", week, entries.len());
        Ok(entries)
    }

    /// Every week the player was ranked in, in calendar order.
    pub fn player_history(&self, player_id: PlayerId) -> Result<Vec<HistoryPoint>, RankingError> {
        self.sync_cache()?;
        let weeks = week::sort_weeks(self.store.player_weeks(player_id)?)?;
        let rankings = weeks
            .iter()
            .map(|week| self.ranking(week))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(history::assemble(
            player_id,
            rankings.iter().map(|ranking| &**ranking),
        ))
    }

    pub fn neighborhood(
        &self,
        player_id: PlayerId,
        week: &Week,
        kind: ScopeKind,
    ) -> Result<Vec<NeighborhoodRow>, RankingError> {
        let ranking = self.week_ranking(week)?;
        neighborhood::select(&ranking, player_id, kind, self.config.neighborhood_radius)
    }

    /// Neighborhoods in all four kinds of scope. A scope the player is not
    /// part of is reported in its entry rather than failing the others.
    pub fn neighborhoods(
        &self,
        player_id: PlayerId,
        week: &Week,
    ) -> Result<Vec<ScopedNeighborhood>, RankingError> {
        let ranking = self.week_ranking(week)?;
        ScopeKind::ALL
            .into_iter()
            .map(|kind| {
                let scope = ranking
                    .get(player_id)
                    .and_then(|entry| kind.scope_of(&entry.player));
                match neighborhood::select(&ranking, player_id, kind, self.config.neighborhood_radius)
                {
                    Ok(rows) => Ok(ScopedNeighborhood {
                        kind,
                        scope,
                        rows,
                        info: None,
                    }),
                    Err(err @ RankingError::PlayerNotInScope { .. }) => Ok(ScopedNeighborhood {
                        kind,
                        scope,
                        rows: Vec::new(),
                        info: Some(err.to_string()),
                    }),
                    Err(err) => Err(err),
                }
            })
            .collect()
    }

    pub fn player_summary(
        &self,
        player_id: PlayerId,
        week: &Week,
    ) -> Result<PlayerSummary, RankingError> {
        let ranking = self.week_ranking(week)?;
        summary::summarize(&ranking, player_id, self.config.top_n)
    }

    pub fn similar_players(
        &self,
        player_id: PlayerId,
        week: &Week,
    ) -> Result<Vec<SimilarPlayer>, RankingError> {
        let ranking = self.week_ranking(week)?;
        neighborhood::similar_players(&ranking, player_id, self.config.similar_count)
    }

    pub fn week_report(&self, week: &Week) -> Result<WeekReport, RankingError> {
        let ranking = self.week_ranking(week)?;
        Ok(stats::week_report(&ranking, self.config.top_n))
    }

    pub fn county_statistics(&self) -> Result<Vec<CountyCount>, RankingError> {
        Ok(stats::county_player_counts(&self.store.players()?))
    }
}

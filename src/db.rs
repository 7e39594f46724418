// Database connections

// SPDX-FileCopyrightText: 2023 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::{
    store::{is_week, RankingStore},
    week::Week,
    Player, PlayerId, RankingError, SnapshotRow,
};

pub trait Database {
    fn open(&self) -> anyhow::Result<Connection>;
}

pub struct LocalDatabase {
    path: PathBuf,
}

impl LocalDatabase {
    pub fn new(path: PathBuf) -> Self {
        LocalDatabase { path }
    }
}

impl Database for LocalDatabase {
    fn open(&self) -> anyhow::Result<Connection> {
        Connection::open(&self.path)
            .with_context(|| format!("unable to open database {}", self.path.display()))
    }
}

/// Create the tables the rankings are read from.
pub fn create_database(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "
        create table if not exists players (
            playerId integer primary key,
            playerName text not null,
            county text,
            year integer
        );

        create table if not exists rankings (
            playerId integer not null,
            week text not null,
            points real not null,
            tournaments integer not null,

            unique(playerId, week),
            foreign key(playerId) references players(playerId)
        );

        create index if not exists rankings_week on rankings(week);
    ",
    )?;
    Ok(())
}

/// Rankings stored in SQLite.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database and check that it has the expected tables.
    pub fn open(db: &dyn Database) -> anyhow::Result<Self> {
        SqliteStore::from_connection(db.open()?)
    }

    pub fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.prepare("select playerId, playerName, county, year from players limit 0")
            .context("players table is missing or incomplete")?;
        conn.prepare("select playerId, week, points, tournaments from rankings limit 0")
            .context("rankings table is missing or incomplete")?;
        Ok(SqliteStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn player_from_row(row: &Row) -> rusqlite::Result<Player> {
    let county: Option<String> = row.get(2)?;
    Ok(Player {
        player_id: row.get(0)?,
        name: row.get(1)?,
        county: county
            .map(|county| county.trim().to_owned())
            .filter(|county| !county.is_empty()),
        birth_year: row.get(3)?,
    })
}

impl RankingStore for SqliteStore {
    fn players(&self) -> Result<Vec<Player>, RankingError> {
        let mut stmt = self.conn.prepare(
            "select playerId, playerName, county, year from players order by playerId asc",
        )?;
        let players = stmt
            .query_map([], player_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(players)
    }

    fn player(&self, player_id: PlayerId) -> Result<Option<Player>, RankingError> {
        Ok(self
            .conn
            .query_row(
                "select playerId, playerName, county, year from players where playerId = ?",
                params![player_id],
                player_from_row,
            )
            .optional()?)
    }

    fn week_labels(&self) -> Result<Vec<String>, RankingError> {
        let mut stmt = self.conn.prepare("select distinct week from rankings")?;
        let weeks = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(weeks)
    }

    fn counties(&self) -> Result<Vec<String>, RankingError> {
        let mut stmt = self.conn.prepare(
            "
            select distinct trim(county) from players
            where county is not null and trim(county) != ''
            order by 1 asc
        ",
        )?;
        let counties = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(counties)
    }

    fn birth_years(&self) -> Result<Vec<i32>, RankingError> {
        let mut stmt = self
            .conn
            .prepare("select distinct year from players where year is not null order by year asc")?;
        let years = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i32>, _>>()?;
        Ok(years)
    }

    fn week_snapshot(&self, week: &Week) -> Result<Vec<SnapshotRow>, RankingError> {
        let mut stmt = self.conn.prepare(
            "
            select
                players.playerId,
                players.playerName,
                players.county,
                players.year,
                rankings.points,
                rankings.tournaments
            from rankings join players on rankings.playerId = players.playerId
            where rankings.week = ?
        ",
        )?;
        let mut rows = Vec::new();
        for label in self
            .week_labels()?
            .iter()
            .filter(|label| is_week(label, week))
        {
            let snapshot = stmt
                .query_map(params![label], |row| {
                    Ok(SnapshotRow {
                        player: player_from_row(row)?,
                        points: row.get(4)?,
                        tournaments: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows.extend(snapshot);
        }
        Ok(rows)
    }

    fn player_weeks(&self, player_id: PlayerId) -> Result<Vec<String>, RankingError> {
        let mut stmt = self
            .conn
            .prepare("select distinct week from rankings where playerId = ?")?;
        let weeks = stmt
            .query_map(params![player_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(weeks)
    }

    fn snapshot_version(&self) -> Result<u64, RankingError> {
        // data_version only moves on commits of other connections
        let data_version: i64 = self
            .conn
            .query_row("pragma data_version", [], |row| row.get(0))?;
        let (count, max_rowid): (i64, i64) = self.conn.query_row(
            "select count(*), coalesce(max(rowid), 0) from rankings",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(((data_version as u64) << 40) ^ ((max_rowid as u64) << 20) ^ count as u64)
    }
}

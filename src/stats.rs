// SPDX-FileCopyrightText: 2025 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Aggregates over a week and over the registered players.

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    directory::DirectoryEntry,
    projection::WeekRanking,
    week::Week,
    Player,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyCount {
    pub county: String,
    pub player_count: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekReport {
    pub week: Week,
    pub top: Vec<DirectoryEntry>,
    /// Number of players in the top by tournament count, ascending.
    pub tournament_distribution: IndexMap<u32, usize>,
    pub county_breakdown: Vec<CountyCount>,
}

pub fn week_report(ranking: &WeekRanking, top_n: usize) -> WeekReport {
    let top: Vec<DirectoryEntry> = ranking
        .entries()
        .iter()
        .take(top_n)
        .map(|entry| DirectoryEntry {
            rank: entry.ranks.overall,
            player: entry.player.clone(),
            points: entry.points,
            tournaments: entry.tournaments,
        })
        .collect();

    let tournament_distribution = top
        .iter()
        .map(|entry| entry.tournaments)
        .counts()
        .into_iter()
        .sorted()
        .collect();

    let county_breakdown = count_by_county(top.iter().map(|entry| &entry.player));

    WeekReport {
        week: ranking.week().clone(),
        top,
        tournament_distribution,
        county_breakdown,
    }
}

/// Registered players per known county, largest county first.
pub fn county_player_counts(players: &[Player]) -> Vec<CountyCount> {
    count_by_county(players.iter())
}

fn count_by_county<'a>(players: impl Iterator<Item = &'a Player>) -> Vec<CountyCount> {
    players
        .filter_map(|player| player.county.as_deref())
        .counts()
        .into_iter()
        .map(|(county, player_count)| CountyCount {
            county: county.to_owned(),
            player_count,
        })
        .sorted_by(|a, b| {
            b.player_count
                .cmp(&a.player_count)
                .then_with(|| a.county.cmp(&b.county))
        })
        .collect()
}

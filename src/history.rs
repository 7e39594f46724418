// SPDX-FileCopyrightText: 2025 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    projection::{ScopeRanks, WeekRanking},
    week::Week,
    PlayerId,
};

/// A player's standing in one week, ready to be charted.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub week: Week,
    pub date: NaiveDate,
    pub points: f64,
    pub tournaments: u32,
    #[serde(flatten)]
    pub ranks: ScopeRanks,
}

/// Collect the entries of `player_id` from the rankings of every week, in
/// calendar order. Weeks without the player are left out.
pub fn assemble<'a>(
    player_id: PlayerId,
    rankings: impl IntoIterator<Item = &'a WeekRanking>,
) -> Vec<HistoryPoint> {
    rankings
        .into_iter()
        .filter_map(|ranking| {
            ranking.get(player_id).map(|entry| HistoryPoint {
                week: ranking.week().clone(),
                date: ranking.week().start_date(),
                points: entry.points,
                tournaments: entry.tournaments,
                ranks: entry.ranks,
            })
        })
        .sorted_by(|a, b| a.week.cmp(&b.week))
        .dedup_by(|a, b| a.week == b.week)
        .collect()
}

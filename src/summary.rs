// SPDX-FileCopyrightText: 2025 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::Serialize;

use crate::{
    projection::{Scope, ScopeKind, WeekRanking},
    week::Week,
    Player, PlayerId, RankingError,
};

/// Rank of a player within a scope, out of the number of ranked members.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopePosition {
    pub scope: Scope,
    pub rank: u32,
    pub of: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub week: Week,
    #[serde(flatten)]
    pub player: Player,
    pub points: f64,
    pub tournaments: u32,
    pub overall_rank: ScopePosition,
    pub county_rank: Option<ScopePosition>,
    pub age_group_rank: Option<ScopePosition>,
    pub county_age_group_rank: Option<ScopePosition>,
    /// Whether the overall rank is within the configured top.
    pub in_top: bool,
}

pub fn summarize(
    ranking: &WeekRanking,
    player_id: PlayerId,
    top_n: usize,
) -> Result<PlayerSummary, RankingError> {
    let entry = ranking
        .get(player_id)
        .ok_or_else(|| RankingError::PlayerNotInScope {
            player_id,
            week: ranking.week().label().to_owned(),
            scope: ScopeKind::Overall.to_string(),
        })?;

    let position = |kind: ScopeKind| {
        let scope = kind.scope_of(&entry.player)?;
        let rank = entry.ranks.get(kind)?;
        let of = ranking.scope_size(&scope);
        Some(ScopePosition { scope, rank, of })
    };

    Ok(PlayerSummary {
        week: ranking.week().clone(),
        player: entry.player.clone(),
        points: entry.points,
        tournaments: entry.tournaments,
        overall_rank: ScopePosition {
            scope: Scope::Overall,
            rank: entry.ranks.overall,
            of: ranking.len(),
        },
        county_rank: position(ScopeKind::County),
        age_group_rank: position(ScopeKind::AgeGroup),
        county_age_group_rank: position(ScopeKind::CountyAndAgeGroup),
        in_top: entry.ranks.overall as usize <= top_n,
    })
}

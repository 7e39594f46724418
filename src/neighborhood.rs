// SPDX-FileCopyrightText: 2025 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Competitors ranked close to a player.

use std::cmp::Ordering;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    projection::{RankedEntry, Scope, ScopeKind, WeekRanking},
    week::Week,
    Player, PlayerId, RankingError,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodRow {
    pub week: Week,
    pub rank: u32,
    pub player_id: PlayerId,
    pub player_name: String,
    pub points: f64,
    pub is_target: bool,
}

fn not_in_scope(ranking: &WeekRanking, player_id: PlayerId, scope: impl ToString) -> RankingError {
    RankingError::PlayerNotInScope {
        player_id,
        week: ranking.week().label().to_owned(),
        scope: scope.to_string(),
    }
}

/// The neighborhood of `player_id` in its own scope of the given kind.
pub fn select(
    ranking: &WeekRanking,
    player_id: PlayerId,
    kind: ScopeKind,
    radius: u32,
) -> Result<Vec<NeighborhoodRow>, RankingError> {
    let scope = ranking
        .get(player_id)
        .and_then(|entry| kind.scope_of(&entry.player))
        .ok_or_else(|| not_in_scope(ranking, player_id, kind))?;
    select_in(ranking, player_id, &scope, radius)
}

/// All members of `scope` ranked at most `radius` places from `player_id`.
///
/// Fails when the player has no ranking in the week or is not a member of
/// `scope`.
pub fn select_in(
    ranking: &WeekRanking,
    player_id: PlayerId,
    scope: &Scope,
    radius: u32,
) -> Result<Vec<NeighborhoodRow>, RankingError> {
    let target_rank = ranking
        .get(player_id)
        .filter(|entry| scope.contains(&entry.player))
        .and_then(|entry| entry.ranks.get(scope.kind()))
        .ok_or_else(|| not_in_scope(ranking, player_id, scope))?;

    let lowest = target_rank.saturating_sub(radius).max(1);
    let highest = target_rank.saturating_add(radius);

    let mut rows: Vec<NeighborhoodRow> = ranking
        .rank_view(scope)
        .into_iter()
        .filter(|entry| (lowest..=highest).contains(&entry.rank))
        .map(|entry| NeighborhoodRow {
            week: ranking.week().clone(),
            rank: entry.rank,
            is_target: entry.player_id == player_id,
            player_id: entry.player_id,
            player_name: entry.player_name,
            points: entry.points,
        })
        .collect();
    rows.sort_by(compare_rows);
    Ok(rows)
}

fn compare_rows(a: &NeighborhoodRow, b: &NeighborhoodRow) -> Ordering {
    a.week
        .cmp(&b.week)
        .then_with(|| a.rank.cmp(&b.rank))
        .then_with(|| a.player_name.cmp(&b.player_name))
        .then_with(|| a.player_id.cmp(&b.player_id))
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarPlayer {
    #[serde(flatten)]
    pub player: Player,
    pub points: f64,
    pub overall_rank: u32,
}

/// Players from the same county and birth year, or with points within 30%
/// of the player's, closest in points first.
pub fn similar_players(
    ranking: &WeekRanking,
    player_id: PlayerId,
    count: usize,
) -> Result<Vec<SimilarPlayer>, RankingError> {
    let target = ranking
        .get(player_id)
        .ok_or_else(|| not_in_scope(ranking, player_id, ScopeKind::Overall))?;
    let peers = ScopeKind::CountyAndAgeGroup.scope_of(&target.player);
    let lower = target.points * 0.7;
    let upper = target.points * 1.3;
    let distance = |entry: &RankedEntry| (entry.points - target.points).abs();

    Ok(ranking
        .entries()
        .iter()
        .filter(|entry| entry.player.player_id != player_id)
        .filter(|entry| {
            peers
                .as_ref()
                .is_some_and(|scope| scope.contains(&entry.player))
                || (lower..=upper).contains(&entry.points)
        })
        .sorted_by(|a, b| {
            distance(a)
                .total_cmp(&distance(b))
                .then_with(|| a.player.name.cmp(&b.player.name))
                .then_with(|| a.player.player_id.cmp(&b.player.player_id))
        })
        .take(count)
        .map(|entry| SimilarPlayer {
            player: entry.player.clone(),
            points: entry.points,
            overall_rank: entry.ranks.overall,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{select, select_in, similar_players, NeighborhoodRow};
    use crate::{
        projection::{project_week, Scope, ScopeKind, WeekRanking},
        week::Week,
        Player, RankingError, SnapshotRow,
    };

    fn row(id: i64, county: Option<&str>, year: i32, points: f64) -> SnapshotRow {
        SnapshotRow {
            player: Player {
                player_id: id,
                name: format!("Player {id:02}"),
                county: county.map(str::to_owned),
                birth_year: Some(year),
            },
            points,
            tournaments: 1,
        }
    }

    /// Twelve players with points 1200, 1100, ... 100.
    fn ladder() -> WeekRanking {
        project_week(
            Week::parse("9-2024").unwrap(),
            (1..=12)
                .map(|id| {
                    let county = if id % 2 == 0 { "Kent" } else { "Essex" };
                    row(id, Some(county), 2010 + (id % 3) as i32, (13 - id) as f64 * 100.0)
                })
                .collect(),
        )
    }

    fn ranks(rows: &[NeighborhoodRow]) -> Vec<u32> {
        rows.iter().map(|r| r.rank).collect()
    }

    fn assert_well_formed(rows: &[NeighborhoodRow], target: i64) {
        assert_eq!(rows.iter().filter(|r| r.is_target).count(), 1);
        assert!(rows.iter().any(|r| r.is_target && r.player_id == target));
        let ids: HashSet<i64> = rows.iter().map(|r| r.player_id).collect();
        assert_eq!(ids.len(), rows.len());
        assert!(rows.iter().all(|r| r.rank >= 1));
    }

    #[test]
    fn middle_of_ranking() {
        let ranking = ladder();
        let rows = select(&ranking, 6, ScopeKind::Overall, 3).unwrap();
        assert_eq!(ranks(&rows), vec![3, 4, 5, 6, 7, 8, 9]);
        assert_well_formed(&rows, 6);
    }

    #[test]
    fn top_of_ranking() {
        let ranking = ladder();
        let rows = select(&ranking, 1, ScopeKind::Overall, 3).unwrap();
        assert_eq!(ranks(&rows), vec![1, 2, 3, 4]);
        assert!(rows[0].is_target);
        assert_well_formed(&rows, 1);

        let rows = select(&ranking, 3, ScopeKind::Overall, 3).unwrap();
        assert_eq!(ranks(&rows), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn bottom_of_ranking() {
        let ranking = ladder();
        let rows = select(&ranking, 11, ScopeKind::Overall, 3).unwrap();
        assert_eq!(ranks(&rows), vec![8, 9, 10, 11, 12]);
        assert_well_formed(&rows, 11);
    }

    #[test]
    fn county_scope() {
        let ranking = ladder();
        // Kent: ids 2, 4, 6, 8, 10, 12 ranked 1..6 within the county
        let rows = select(&ranking, 4, ScopeKind::County, 3).unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.player_id).collect();
        assert_eq!(ids, vec![2, 4, 6, 8, 10]);
        assert_eq!(ranks(&rows), vec![1, 2, 3, 4, 5]);
        assert_well_formed(&rows, 4);
    }

    #[test]
    fn ties_at_target_rank() {
        let ranking = project_week(
            Week::parse("9-2024").unwrap(),
            vec![
                row(1, None, 2010, 900.0),
                row(2, None, 2010, 800.0),
                row(3, None, 2010, 800.0),
                row(4, None, 2010, 800.0),
                row(5, None, 2010, 700.0),
                row(6, None, 2010, 600.0),
                row(7, None, 2010, 500.0),
                row(8, None, 2010, 400.0),
            ],
        );
        let rows = select(&ranking, 3, ScopeKind::Overall, 3).unwrap();
        // ranks 1, 2, 2, 2, 5 fall within [1, 5]
        assert_eq!(ranks(&rows), vec![1, 2, 2, 2, 5]);
        let ids: Vec<i64> = rows.iter().map(|r| r.player_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_well_formed(&rows, 3);
    }

    #[test]
    fn ties_at_upper_edge() {
        let ranking = project_week(
            Week::parse("9-2024").unwrap(),
            vec![
                row(1, None, 2010, 1000.0),
                row(2, None, 2010, 900.0),
                row(3, None, 2010, 800.0),
                row(4, None, 2010, 700.0),
                row(5, None, 2010, 600.0),
                row(6, None, 2010, 600.0),
                row(7, None, 2010, 500.0),
            ],
        );
        let rows = select(&ranking, 2, ScopeKind::Overall, 3).unwrap();
        // both players tied at 5 are in [1, 5], the next one is ranked 7
        assert_eq!(ranks(&rows), vec![1, 2, 3, 4, 5, 5]);
        let ids: Vec<i64> = rows.iter().map(|r| r.player_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert_well_formed(&rows, 2);
    }

    #[test]
    fn absent_player() {
        let ranking = ladder();
        let err = select(&ranking, 99, ScopeKind::Overall, 3).unwrap_err();
        assert!(matches!(
            err,
            RankingError::PlayerNotInScope { player_id: 99, ref week, .. } if week == "9-2024"
        ));
        assert!(err.is_recoverable());
    }

    #[test]
    fn player_without_county() {
        let ranking = project_week(
            Week::parse("9-2024").unwrap(),
            vec![row(1, None, 2010, 10.0), row(2, Some("Kent"), 2010, 5.0)],
        );
        assert!(matches!(
            select(&ranking, 1, ScopeKind::County, 3),
            Err(RankingError::PlayerNotInScope { .. })
        ));
        assert_eq!(select(&ranking, 1, ScopeKind::AgeGroup, 3).unwrap().len(), 2);
    }

    #[test]
    fn foreign_scope_is_rejected() {
        let ranking = ladder();
        let essex = Scope::County {
            county: "Essex".to_owned(),
        };
        assert!(matches!(
            select_in(&ranking, 2, &essex, 3),
            Err(RankingError::PlayerNotInScope { .. })
        ));
        assert!(select_in(&ranking, 1, &essex, 3).is_ok());
    }

    #[test]
    fn radius_is_configurable() {
        let ranking = ladder();
        let rows = select(&ranking, 6, ScopeKind::Overall, 1).unwrap();
        assert_eq!(ranks(&rows), vec![5, 6, 7]);
    }

    #[test]
    fn similar() {
        let ranking = ladder();
        // player 6 has 700 points: 490..=910 covers ids 4..=8
        let similar = similar_players(&ranking, 6, 5).unwrap();
        let ids: Vec<i64> = similar.iter().map(|s| s.player.player_id).collect();
        assert!(!ids.contains(&6));
        assert_eq!(ids.len(), 5);
        assert_eq!(&ids[..2], &[5, 7]);

        // same county and birth year as player 6 (Kent, 2010): player 12
        let similar = similar_players(&ranking, 6, 20).unwrap();
        assert!(similar.iter().any(|s| s.player.player_id == 12));
    }
}

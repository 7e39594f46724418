// SPDX-FileCopyrightText: 2025 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Rankings of one week's snapshot.
//!
//! Every observation of a week gets four ranks at once: overall, within its
//! county, within its birth year and within county and birth year. All four
//! come from the same routine, parameterized by the [`ScopeKind`] that maps a
//! player to the population it is ranked in.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    hash::Hash,
};

use serde::Serialize;
use tracing::{debug, warn};

use crate::{week::Week, Player, PlayerId, SnapshotRow};

/// A population over which ranks are computed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Scope {
    Overall,
    County {
        county: String,
    },
    AgeGroup {
        #[serde(rename = "birthYear")]
        birth_year: i32,
    },
    CountyAndAgeGroup {
        county: String,
        #[serde(rename = "birthYear")]
        birth_year: i32,
    },
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            Scope::Overall => ScopeKind::Overall,
            Scope::County { .. } => ScopeKind::County,
            Scope::AgeGroup { .. } => ScopeKind::AgeGroup,
            Scope::CountyAndAgeGroup { .. } => ScopeKind::CountyAndAgeGroup,
        }
    }

    pub fn contains(&self, player: &Player) -> bool {
        self.kind().scope_of(player).as_ref() == Some(self)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Overall => write!(f, "overall"),
            Scope::County { county } => write!(f, "county {}", county),
            Scope::AgeGroup { birth_year } => write!(f, "born in {}", birth_year),
            Scope::CountyAndAgeGroup { county, birth_year } => {
                write!(f, "county {} born in {}", county, birth_year)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopeKind {
    Overall,
    County,
    AgeGroup,
    CountyAndAgeGroup,
}

impl ScopeKind {
    pub const ALL: [ScopeKind; 4] = [
        ScopeKind::Overall,
        ScopeKind::AgeGroup,
        ScopeKind::County,
        ScopeKind::CountyAndAgeGroup,
    ];

    /// The scope of this kind that `player` is ranked in.
    ///
    /// Players without a county or birth year have no scope of the kinds that
    /// need one.
    pub fn scope_of(self, player: &Player) -> Option<Scope> {
        match self {
            ScopeKind::Overall => Some(Scope::Overall),
            ScopeKind::County => player.county.clone().map(|county| Scope::County { county }),
            ScopeKind::AgeGroup => player
                .birth_year
                .map(|birth_year| Scope::AgeGroup { birth_year }),
            ScopeKind::CountyAndAgeGroup => match (&player.county, player.birth_year) {
                (Some(county), Some(birth_year)) => Some(Scope::CountyAndAgeGroup {
                    county: county.clone(),
                    birth_year,
                }),
                _ => None,
            },
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScopeKind::Overall => "overall",
            ScopeKind::County => "county",
            ScopeKind::AgeGroup => "age-group",
            ScopeKind::CountyAndAgeGroup => "county-age-group",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScopeRanks {
    #[serde(rename = "overallRanking")]
    pub overall: u32,
    #[serde(rename = "countyRanking")]
    pub county: Option<u32>,
    #[serde(rename = "ageGroupRanking")]
    pub age_group: Option<u32>,
    #[serde(rename = "countyAgeGroupRanking")]
    pub county_age_group: Option<u32>,
}

impl ScopeRanks {
    pub fn get(&self, kind: ScopeKind) -> Option<u32> {
        match kind {
            ScopeKind::Overall => Some(self.overall),
            ScopeKind::County => self.county,
            ScopeKind::AgeGroup => self.age_group,
            ScopeKind::CountyAndAgeGroup => self.county_age_group,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    #[serde(flatten)]
    pub player: Player,
    pub points: f64,
    pub tournaments: u32,
    #[serde(flatten)]
    pub ranks: ScopeRanks,
}

/// One row of a rank view: the rank of a player within a single scope.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankViewEntry {
    pub rank: u32,
    pub player_id: PlayerId,
    pub player_name: String,
    pub points: f64,
}

/// All observations of a week with their four ranks.
///
/// Entries are kept in display order: points descending, then player name,
/// then player id.
#[derive(Clone, Debug)]
pub struct WeekRanking {
    week: Week,
    entries: Vec<RankedEntry>,
    index: HashMap<PlayerId, usize>,
}

impl WeekRanking {
    pub fn week(&self) -> &Week {
        &self.week
    }

    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&RankedEntry> {
        self.index.get(&player_id).map(|&i| &self.entries[i])
    }

    pub fn members<'a>(&'a self, scope: &'a Scope) -> impl Iterator<Item = &'a RankedEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| scope.contains(&entry.player))
    }

    pub fn scope_size(&self, scope: &Scope) -> usize {
        self.members(scope).count()
    }

    /// Ranks of every member of `scope`, in rank order.
    pub fn rank_view(&self, scope: &Scope) -> Vec<RankViewEntry> {
        let kind = scope.kind();
        self.members(scope)
            .filter_map(|entry| {
                entry.ranks.get(kind).map(|rank| RankViewEntry {
                    rank,
                    player_id: entry.player.player_id,
                    player_name: entry.player.name.clone(),
                    points: entry.points,
                })
            })
            .collect()
    }
}

/// Rank a week's snapshot in all four scopes.
pub fn project_week(week: Week, rows: Vec<SnapshotRow>) -> WeekRanking {
    let mut seen = HashSet::new();
    let mut rows: Vec<SnapshotRow> = rows
        .into_iter()
        .filter(|row| {
            if !row.points.is_finite() || row.points < 0.0 {
                warn!(
                    "skipping player {} in {}: invalid points {}",
                    row.player.player_id, week, row.points
                );
                return false;
            }
            if !seen.insert(row.player.player_id) {
                warn!(
                    "skipping duplicate observation of player {} in {}",
                    row.player.player_id, week
                );
                return false;
            }
            true
        })
        .collect();

    rows.sort_by(|a, b| {
        b.points
            .total_cmp(&a.points)
            .then_with(|| a.player.name.cmp(&b.player.name))
            .then_with(|| a.player.player_id.cmp(&b.player.player_id))
    });

    let mut columns = ScopeKind::ALL
        .map(|kind| competition_ranks(&rows, |player| kind.scope_of(player)).into_iter());

    let entries: Vec<RankedEntry> = rows
        .into_iter()
        .map(|row| {
            // in ScopeKind::ALL order
            let [overall, age_group, county, county_age_group] =
                columns.each_mut().map(|column| column.next().flatten());
            RankedEntry {
                player: row.player,
                points: row.points,
                tournaments: row.tournaments,
                ranks: ScopeRanks {
                    overall: overall.unwrap_or_default(),
                    county,
                    age_group,
                    county_age_group,
                },
            }
        })
        .collect();

    let index = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry.player.player_id, i))
        .collect();

    debug!("ranked {} players for {}", entries.len(), week);
    WeekRanking {
        week,
        entries,
        index,
    }
}

/// Competition ranks ("1, 1, 3") of rows sorted by points descending, computed
/// independently within every group that `key` assigns. Rows without a group
/// get no rank.
fn competition_ranks<K, F>(rows: &[SnapshotRow], key: F) -> Vec<Option<u32>>
where
    K: Eq + Hash,
    F: Fn(&Player) -> Option<K>,
{
    struct Group {
        seen: u32,
        points: f64,
        rank: u32,
    }

    let mut groups: HashMap<K, Group> = HashMap::new();
    rows.iter()
        .map(|row| {
            let group = groups.entry(key(&row.player)?).or_insert(Group {
                seen: 0,
                points: row.points,
                rank: 1,
            });
            group.seen += 1;
            if row.points != group.points {
                group.points = row.points;
                group.rank = group.seen;
            }
            Some(group.rank)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{project_week, Scope, ScopeKind};
    use crate::{week::Week, Player, SnapshotRow};

    fn row(id: i64, name: &str, county: Option<&str>, year: Option<i32>, points: f64) -> SnapshotRow {
        SnapshotRow {
            player: Player {
                player_id: id,
                name: name.to_owned(),
                county: county.map(str::to_owned),
                birth_year: year,
            },
            points,
            tournaments: 1,
        }
    }

    fn week() -> Week {
        Week::parse("9-2024").unwrap()
    }

    #[test]
    fn ties_share_rank() {
        let ranking = project_week(
            week(),
            vec![
                row(3, "P3", None, None, 400.0),
                row(1, "P1", None, None, 500.0),
                row(2, "P2", None, None, 500.0),
            ],
        );
        let ranks: Vec<(i64, u32)> = ranking
            .entries()
            .iter()
            .map(|e| (e.player.player_id, e.ranks.overall))
            .collect();
        assert_eq!(ranks, vec![(1, 1), (2, 1), (3, 3)]);
    }

    #[test]
    fn competition_ranking_skips() {
        let ranking = project_week(
            week(),
            vec![
                row(1, "A", None, None, 100.0),
                row(2, "B", None, None, 100.0),
                row(3, "C", None, None, 90.0),
                row(4, "D", None, None, 90.0),
                row(5, "E", None, None, 80.0),
            ],
        );
        let ranks: Vec<u32> = ranking.entries().iter().map(|e| e.ranks.overall).collect();
        assert_eq!(ranks, vec![1, 1, 3, 3, 5]);
    }

    #[test]
    fn scoped_ranks_are_independent() {
        let ranking = project_week(
            week(),
            vec![
                row(1, "A", Some("Kent"), Some(2010), 900.0),
                row(2, "B", Some("Surrey"), Some(2010), 800.0),
                row(3, "C", Some("Kent"), Some(2011), 700.0),
                row(4, "D", Some("Kent"), Some(2010), 600.0),
                row(5, "E", None, Some(2010), 500.0),
                row(6, "F", Some("Kent"), None, 400.0),
            ],
        );
        let d = ranking.get(4).unwrap();
        assert_eq!(d.ranks.overall, 4);
        assert_eq!(d.ranks.county, Some(3));
        assert_eq!(d.ranks.age_group, Some(3));
        assert_eq!(d.ranks.county_age_group, Some(2));

        let e = ranking.get(5).unwrap();
        assert_eq!(e.ranks.overall, 5);
        assert_eq!(e.ranks.county, None);
        assert_eq!(e.ranks.age_group, Some(4));
        assert_eq!(e.ranks.county_age_group, None);

        let f = ranking.get(6).unwrap();
        assert_eq!(f.ranks.county, Some(4));
        assert_eq!(f.ranks.age_group, None);
    }

    #[test]
    fn overall_filtered_to_county_matches_county_view() {
        let ranking = project_week(
            week(),
            vec![
                row(1, "A", Some("Kent"), Some(2010), 900.0),
                row(2, "B", Some("Surrey"), Some(2010), 800.0),
                row(3, "C", Some("Kent"), Some(2011), 800.0),
                row(4, "D", None, Some(2010), 600.0),
                row(5, "E", Some("Kent"), None, 100.0),
            ],
        );
        let county = Scope::County {
            county: "Kent".to_owned(),
        };
        let mut from_overall: Vec<i64> = ranking
            .rank_view(&Scope::Overall)
            .into_iter()
            .filter(|e| ranking.get(e.player_id).unwrap().player.county.as_deref() == Some("Kent"))
            .map(|e| e.player_id)
            .collect();
        let mut direct: Vec<i64> = ranking
            .rank_view(&county)
            .into_iter()
            .map(|e| e.player_id)
            .collect();
        from_overall.sort_unstable();
        direct.sort_unstable();
        assert_eq!(from_overall, direct);
        assert_eq!(direct, vec![1, 3, 5]);
        assert_eq!(ranking.scope_size(&county), 3);
    }

    #[test]
    fn duplicates_and_invalid_points_are_skipped() {
        let ranking = project_week(
            week(),
            vec![
                row(1, "A", None, None, 10.0),
                row(1, "A", None, None, 20.0),
                row(2, "B", None, None, f64::NAN),
                row(3, "C", None, None, -1.0),
            ],
        );
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking.get(1).unwrap().points, 10.0);
    }

    #[test]
    fn ties_are_ordered_by_name() {
        let ranking = project_week(
            week(),
            vec![
                row(7, "Zoe", None, None, 50.0),
                row(8, "Adam", None, None, 50.0),
                row(9, "Adam", None, None, 50.0),
            ],
        );
        let ids: Vec<i64> = ranking.entries().iter().map(|e| e.player.player_id).collect();
        assert_eq!(ids, vec![8, 9, 7]);
        assert!(ranking.entries().iter().all(|e| e.ranks.overall == 1));
    }

    #[test]
    fn scope_of_player_without_county() {
        let player = row(1, "A", None, Some(2012), 0.0).player;
        assert_eq!(ScopeKind::County.scope_of(&player), None);
        assert_eq!(ScopeKind::CountyAndAgeGroup.scope_of(&player), None);
        assert_eq!(
            ScopeKind::AgeGroup.scope_of(&player),
            Some(Scope::AgeGroup { birth_year: 2012 })
        );
    }
}

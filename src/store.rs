// SPDX-FileCopyrightText: 2025 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Read access to players and their weekly rankings.

use std::collections::HashMap;

use itertools::Itertools;
use tracing::warn;

use crate::{
    week::{sort_weeks, Week},
    Player, PlayerId, RankingError, RankingObservation, SnapshotRow,
};

pub trait RankingStore {
    fn players(&self) -> Result<Vec<Player>, RankingError>;

    fn player(&self, player_id: PlayerId) -> Result<Option<Player>, RankingError>;

    /// Distinct week labels, in no particular order.
    fn week_labels(&self) -> Result<Vec<String>, RankingError>;

    /// Distinct weeks in calendar order.
    fn weeks(&self) -> Result<Vec<Week>, RankingError> {
        sort_weeks(self.week_labels()?)
    }

    /// Distinct known counties, sorted.
    fn counties(&self) -> Result<Vec<String>, RankingError>;

    /// Distinct known birth years, sorted.
    fn birth_years(&self) -> Result<Vec<i32>, RankingError>;

    /// All observations of `week` joined with their players.
    fn week_snapshot(&self, week: &Week) -> Result<Vec<SnapshotRow>, RankingError>;

    /// Labels of the weeks `player_id` has an observation for.
    fn player_weeks(&self, player_id: PlayerId) -> Result<Vec<String>, RankingError>;

    /// Changes whenever the stored data changes.
    fn snapshot_version(&self) -> Result<u64, RankingError>;
}

/// A store over data already held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    players: HashMap<PlayerId, Player>,
    observations: Vec<RankingObservation>,
    version: u64,
}

impl MemoryStore {
    pub fn new(players: Vec<Player>, observations: Vec<RankingObservation>) -> Self {
        let players = players
            .into_iter()
            .map(|player| (player.player_id, normalize(player)))
            .collect();
        MemoryStore {
            players,
            observations,
            version: 1,
        }
    }

    /// Swap in a new set of observations, e.g. after a new week was published.
    pub fn replace_observations(&mut self, observations: Vec<RankingObservation>) {
        self.observations = observations;
        self.version += 1;
    }
}

/// Whether a stored label spells `week`, e.g. `09-2024` for `9-2024`.
pub(crate) fn is_week(label: &str, week: &Week) -> bool {
    label == week.label() || Week::parse(label).is_ok_and(|parsed| parsed == *week)
}

fn normalize(player: Player) -> Player {
    let county = player
        .county
        .map(|county| county.trim().to_owned())
        .filter(|county| !county.is_empty());
    Player { county, ..player }
}

impl RankingStore for MemoryStore {
    fn players(&self) -> Result<Vec<Player>, RankingError> {
        Ok(self
            .players
            .values()
            .cloned()
            .sorted_by_key(|player| player.player_id)
            .collect())
    }

    fn player(&self, player_id: PlayerId) -> Result<Option<Player>, RankingError> {
        Ok(self.players.get(&player_id).cloned())
    }

    fn week_labels(&self) -> Result<Vec<String>, RankingError> {
        Ok(self
            .observations
            .iter()
            .map(|observation| observation.week.clone())
            .unique()
            .collect())
    }

    fn counties(&self) -> Result<Vec<String>, RankingError> {
        Ok(self
            .players
            .values()
            .filter_map(|player| player.county.clone())
            .unique()
            .sorted()
            .collect())
    }

    fn birth_years(&self) -> Result<Vec<i32>, RankingError> {
        Ok(self
            .players
            .values()
            .filter_map(|player| player.birth_year)
            .unique()
            .sorted()
            .collect())
    }

    fn week_snapshot(&self, week: &Week) -> Result<Vec<SnapshotRow>, RankingError> {
        Ok(self
            .observations
            .iter()
            .filter(|observation| is_week(&observation.week, week))
            .filter_map(|observation| match self.players.get(&observation.player_id) {
                Some(player) => Some(SnapshotRow {
                    player: player.clone(),
                    points: observation.points,
                    tournaments: observation.tournaments,
                }),
                None => {
                    warn!(
                        "skipping ranking of unknown player {} in {}",
                        observation.player_id, week
                    );
                    None
                }
            })
            .collect())
    }

    fn player_weeks(&self, player_id: PlayerId) -> Result<Vec<String>, RankingError> {
        Ok(self
            .observations
            .iter()
            .filter(|observation| observation.player_id == player_id)
            .map(|observation| observation.week.clone())
            .unique()
            .collect())
    }

    fn snapshot_version(&self) -> Result<u64, RankingError> {
        Ok(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryStore, RankingStore};
    use crate::{week::Week, Player, RankingObservation};

    fn store() -> MemoryStore {
        MemoryStore::new(
            vec![
                Player {
                    player_id: 1,
                    name: "Amy".to_owned(),
                    county: Some("Kent".to_owned()),
                    birth_year: Some(2011),
                },
                Player {
                    player_id: 2,
                    name: "Ben".to_owned(),
                    county: Some(" ".to_owned()),
                    birth_year: Some(2010),
                },
            ],
            vec![
                RankingObservation {
                    player_id: 1,
                    week: "10-2024".to_owned(),
                    points: 10.0,
                    tournaments: 1,
                },
                RankingObservation {
                    player_id: 1,
                    week: "9-2024".to_owned(),
                    points: 5.0,
                    tournaments: 1,
                },
                RankingObservation {
                    player_id: 3,
                    week: "9-2024".to_owned(),
                    points: 5.0,
                    tournaments: 1,
                },
            ],
        )
    }

    #[test]
    fn weeks_in_calendar_order() {
        let weeks = store().weeks().unwrap();
        let labels: Vec<&str> = weeks.iter().map(|w| w.label()).collect();
        assert_eq!(labels, vec!["9-2024", "10-2024"]);
    }

    #[test]
    fn blank_county_is_unknown() {
        let store = store();
        assert_eq!(store.counties().unwrap(), vec!["Kent".to_owned()]);
        assert_eq!(store.birth_years().unwrap(), vec![2010, 2011]);
        assert_eq!(store.player(2).unwrap().unwrap().county, None);
    }

    #[test]
    fn snapshot_skips_unknown_players() {
        let store = store();
        let rows = store.week_snapshot(&Week::parse("9-2024").unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player.player_id, 1);
    }

    #[test]
    fn padded_week_labels_are_found() {
        let mut store = store();
        store.replace_observations(vec![RankingObservation {
            player_id: 1,
            week: "09-2024".to_owned(),
            points: 5.0,
            tournaments: 1,
        }]);
        for label in ["9-2024", "09-2024", " 9-2024"] {
            let rows = store.week_snapshot(&Week::parse(label).unwrap()).unwrap();
            assert_eq!(rows.len(), 1, "{label:?}");
        }
        let labels: Vec<String> = store.weeks().unwrap().iter().map(|w| w.to_string()).collect();
        assert_eq!(labels, vec!["9-2024"]);
    }

    #[test]
    fn replacing_observations_bumps_version() {
        let mut store = store();
        let version = store.snapshot_version().unwrap();
        store.replace_observations(vec![]);
        assert!(store.snapshot_version().unwrap() > version);
        assert!(store.weeks().unwrap().is_empty());
    }
}

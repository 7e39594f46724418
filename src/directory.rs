// SPDX-FileCopyrightText: 2025 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Player directory of a single week.

use serde::{Deserialize, Serialize};

use crate::{projection::WeekRanking, Player};

/// How the name filter compares names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameMatch {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

impl NameMatch {
    fn matches(self, name: &str, search: &str) -> bool {
        match self {
            NameMatch::CaseSensitive => name.contains(search),
            NameMatch::CaseInsensitive => name.to_lowercase().contains(&search.to_lowercase()),
        }
    }
}

/// Filters of the directory; `None` means no filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DirectoryFilter {
    pub county: Option<String>,
    pub birth_year: Option<i32>,
    pub name: Option<String>,
}

impl DirectoryFilter {
    fn matches(&self, player: &Player, name_match: NameMatch) -> bool {
        if let Some(county) = &self.county {
            if player.county.as_ref() != Some(county) {
                return false;
            }
        }
        if let Some(birth_year) = self.birth_year {
            if player.birth_year != Some(birth_year) {
                return false;
            }
        }
        match self.name.as_deref() {
            Some(search) if !search.is_empty() => name_match.matches(&player.name, search),
            _ => true,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub rank: u32,
    #[serde(flatten)]
    pub player: Player,
    pub points: f64,
    pub tournaments: u32,
}

/// Players of the week matching `filter`, in overall rank order.
///
/// Ranks are those of the full week, not of the filtered players.
pub fn list(ranking: &WeekRanking, filter: &DirectoryFilter, name_match: NameMatch) -> Vec<DirectoryEntry> {
    ranking
        .entries()
        .iter()
        .filter(|entry| filter.matches(&entry.player, name_match))
        .map(|entry| DirectoryEntry {
            rank: entry.ranks.overall,
            player: entry.player.clone(),
            points: entry.points,
            tournaments: entry.tournaments,
        })
        .collect()
}

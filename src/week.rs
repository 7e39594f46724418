// SPDX-FileCopyrightText: 2025 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Ranking week labels.
//!
//! Weeks are published as `<month>-<year>` labels, e.g. `9-2024`. These do not
//! sort lexically in calendar order, so every ordering goes through
//! [`Week::ordinal`].

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::RankingError;

static WEEK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?<month>\d{1,2})-(?<year>\d{1,4})$").unwrap());

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Week {
    label: String,
    month: u32,
    year: i32,
}

impl Week {
    pub fn parse(label: &str) -> Result<Self, RankingError> {
        let malformed = || RankingError::MalformedWeekLabel {
            label: label.to_owned(),
        };
        let captures = WEEK_RE.captures(label.trim()).ok_or_else(malformed)?;
        let month: u32 = captures["month"].parse().map_err(|_| malformed())?;
        let year: i32 = captures["year"].parse().map_err(|_| malformed())?;
        // Rejects month 0 and 13+, which would alias a neighbouring year.
        NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(malformed)?;

        Ok(Week {
            label: format!("{month}-{year}"),
            month,
            year,
        })
    }

    /// Calendar position of the week: `year * 12 + (month - 1)`.
    pub fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    /// Unpadded `<month>-<year>` label, whatever spelling was parsed.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }
}

impl Ord for Week {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}

impl PartialOrd for Week {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Week {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Week::parse(s)
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl Serialize for Week {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

/// Parse and sort week labels chronologically.
pub fn sort_weeks<I, S>(labels: I) -> Result<Vec<Week>, RankingError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut weeks = labels
        .into_iter()
        .map(|label| Week::parse(label.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    weeks.sort();
    weeks.dedup();
    Ok(weeks)
}

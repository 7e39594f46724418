// SPDX-FileCopyrightText: 2021 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

use thiserror::Error;

use crate::{projection::ScopeKind, week::Week};

#[derive(Error, Debug, PartialEq)]
pub enum ArgumentsError {
    #[error("Invalid scope, valid scopes are: overall, county, age-group, county-age-group")]
    UnknownScope,
    #[error("Invalid week {0:?}, expected <month>-<year>")]
    InvalidWeek(String),
    #[error("Invalid birth year {0:?}")]
    InvalidYear(String),
}

pub fn parse_scope(flag: &str) -> Result<ScopeKind, ArgumentsError> {
    match flag {
        "overall" => Ok(ScopeKind::Overall),
        "county" => Ok(ScopeKind::County),
        "age-group" => Ok(ScopeKind::AgeGroup),
        "county-age-group" => Ok(ScopeKind::CountyAndAgeGroup),
        _ => Err(ArgumentsError::UnknownScope),
    }
}

pub fn parse_week(flag: &str) -> Result<Week, ArgumentsError> {
    Week::parse(flag).map_err(|_| ArgumentsError::InvalidWeek(flag.to_owned()))
}

/// A filter value where an empty value or "All" means no filter.
pub fn parse_filter(flag: &str) -> Option<String> {
    let flag = flag.trim();
    if flag.is_empty() || flag == "All" {
        None
    } else {
        Some(flag.to_owned())
    }
}

/// A name search; only an empty value means no filter.
pub fn parse_name_filter(flag: &str) -> Option<String> {
    if flag.trim().is_empty() {
        None
    } else {
        Some(flag.to_owned())
    }
}

pub fn parse_year_filter(flag: &str) -> Result<Option<i32>, ArgumentsError> {
    parse_filter(flag)
        .map(|year| {
            year.parse::<i32>()
                .map_err(|_| ArgumentsError::InvalidYear(year.clone()))
        })
        .transpose()
}

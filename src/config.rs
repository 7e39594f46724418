// Configuration loading (rankings.toml).

// SPDX-FileCopyrightText: 2025 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use crate::{directory::NameMatch, week::Week};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for `{field}`: {message}")]
    Invalid { field: String, message: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub database: PathBuf,
    /// The week the player directory is built from.
    pub current_week: Option<String>,
    /// Number of ranks shown above and below a player in a neighborhood.
    pub neighborhood_radius: u32,
    pub name_match: NameMatch,
    pub top_n: usize,
    pub similar_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: PathBuf::from("rankings.sqlite"),
            current_week: None,
            neighborhood_radius: 3,
            name_match: NameMatch::default(),
            top_n: 100,
            similar_count: 5,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(label) = &self.current_week {
            Week::parse(label).map_err(|err| ConfigError::Invalid {
                field: "current-week".to_owned(),
                message: err.to_string(),
            })?;
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid {
                field: "top-n".to_owned(),
                message: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    /// The directory week, for front ends that cannot serve without one.
    pub fn require_current_week(&self) -> Result<Week, ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            field: "current-week".to_owned(),
            message,
        };
        match &self.current_week {
            Some(label) => Week::parse(label).map_err(|err| invalid(err.to_string())),
            None => Err(invalid("must be set".to_owned())),
        }
    }
}

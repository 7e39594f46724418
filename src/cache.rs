// SPDX-FileCopyrightText: 2025 Jeroen Hoekx
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Memoized query results.
//!
//! Entries belong to a generation, the snapshot version of the store they
//! were computed from. Syncing to a different version drops every entry.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::debug;

use crate::{projection::WeekRanking, week::Week};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Weeks,
    WeekRanking(Week),
}

#[derive(Clone, Debug)]
enum CachedValue {
    Weeks(Arc<Vec<Week>>),
    WeekRanking(Arc<WeekRanking>),
}

#[derive(Debug, Default)]
struct Entries {
    generation: Option<u64>,
    values: HashMap<QueryKey, CachedValue>,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<Entries>,
}

impl QueryCache {
    pub fn new() -> Self {
        QueryCache::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // values are only ever inserted whole
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to the given snapshot version, dropping entries of other versions.
    pub fn sync(&self, version: u64) {
        let mut entries = self.lock();
        if entries.generation != Some(version) {
            if entries.generation.is_some() {
                debug!(
                    "snapshot version changed to {}, dropping {} cached results",
                    version,
                    entries.values.len()
                );
            }
            entries.values.clear();
            entries.generation = Some(version);
        }
    }

    pub fn invalidate(&self) {
        let mut entries = self.lock();
        entries.values.clear();
        entries.generation = None;
    }

    pub fn generation(&self) -> Option<u64> {
        self.lock().generation
    }

    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: &QueryKey) -> Option<CachedValue> {
        self.lock().values.get(key).cloned()
    }

    fn insert(&self, generation: Option<u64>, key: QueryKey, value: CachedValue) {
        let mut entries = self.lock();
        // a sync while computing makes the value stale
        if entries.generation == generation {
            entries.values.insert(key, value);
        }
    }

    pub fn weeks<E>(
        &self,
        compute: impl FnOnce() -> Result<Vec<Week>, E>,
    ) -> Result<Arc<Vec<Week>>, E> {
        if let Some(CachedValue::Weeks(weeks)) = self.get(&QueryKey::Weeks) {
            debug!("cache hit for weeks");
            return Ok(weeks);
        }
        let generation = self.generation();
        let weeks = Arc::new(compute()?);
        self.insert(generation, QueryKey::Weeks, CachedValue::Weeks(weeks.clone()));
        Ok(weeks)
    }

    pub fn week_ranking<E>(
        &self,
        week: &Week,
        compute: impl FnOnce() -> Result<WeekRanking, E>,
    ) -> Result<Arc<WeekRanking>, E> {
        let key = QueryKey::WeekRanking(week.clone());
        if let Some(CachedValue::WeekRanking(ranking)) = self.get(&key) {
            debug!("cache hit for ranking of {}", week);
            return Ok(ranking);
        }
        debug!("cache miss for ranking of {}", week);
        let generation = self.generation();
        let ranking = Arc::new(compute()?);
        self.insert(generation, key, CachedValue::WeekRanking(ranking.clone()));
        Ok(ranking)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, convert::Infallible};

    use super::QueryCache;
    use crate::{projection::project_week, week::Week};

    fn week() -> Week {
        Week::parse("9-2024").unwrap()
    }

    #[test]
    fn computes_once_per_generation() {
        let cache = QueryCache::new();
        let computed = Cell::new(0);
        let compute = || {
            computed.set(computed.get() + 1);
            Ok::<_, Infallible>(project_week(week(), vec![]))
        };

        cache.sync(1);
        cache.week_ranking(&week(), compute).unwrap();
        cache.week_ranking(&week(), compute).unwrap();
        assert_eq!(computed.get(), 1);

        cache.sync(1);
        cache.week_ranking(&week(), compute).unwrap();
        assert_eq!(computed.get(), 1);

        cache.sync(2);
        assert!(cache.is_empty());
        cache.week_ranking(&week(), compute).unwrap();
        assert_eq!(computed.get(), 2);
    }

    #[test]
    fn invalidate_drops_everything() {
        let cache = QueryCache::new();
        cache.sync(7);
        cache
            .weeks(|| Ok::<_, Infallible>(vec![week()]))
            .unwrap();
        assert_eq!(cache.len(), 1);
        cache.invalidate();
        assert!(cache.is_empty());
        assert_eq!(cache.generation(), None);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = QueryCache::new();
        cache.sync(1);
        assert!(cache.weeks(|| Err::<Vec<Week>, _>("down")).is_err());
        assert!(cache.is_empty());
    }
}

//! In-memory city record store
//!
//! The store is either uninitialized (no batch loaded yet) or holds zero or more
//! records with unique normalized names. Operations that need data report an
//! uninitialized or empty store as [`CityWeatherError::State`], distinct from
//! an empty listing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::enrichment::EnrichmentResult;
use crate::geo::haversine_km;
use crate::models::{CityRecord, Coordinates, Weather, normalize_name};
use crate::{CityWeatherError, Result};

/// Store shared between request handlers
pub type SharedStore = Arc<RwLock<CityStore>>;

const NOT_INITIALIZED: &str = "City data is not initialized. Load data first.";
const NO_CITIES: &str = "City data is uninitialized or empty.";

#[derive(Debug, Default)]
pub struct CityStore {
    records: Option<Vec<CityRecord>>,
    version: StoreVersion,
}

/// Membership version of the store.
///
/// `loads` counts batch loads; `edits` counts membership changes since the last load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreVersion {
    loads: u64,
    edits: u64,
}

/// How results enriched from an earlier snapshot were written back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchApply {
    /// Nothing changed meanwhile; the set was replaced by the successes
    Replaced,
    /// Cities were added or removed meanwhile; results were applied to the current set
    Merged,
    /// A new batch was loaded meanwhile; results were dropped
    Discarded,
}

/// Closest stored record to a query point
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestRecord {
    pub name: String,
    pub coordinates: Coordinates,
    pub distance_km: f64,
    pub weather: Option<Weather>,
}

impl CityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.records.is_some()
    }

    /// Number of records, zero when uninitialized
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.as_ref().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn version(&self) -> StoreVersion {
        self.version
    }

    /// Record with the given name, after normalization
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CityRecord> {
        let key = normalize_name(name);
        self.records
            .as_ref()
            .and_then(|records| records.iter().find(|record| record.name == key))
    }

    /// Replace the whole set with the given names, normalized and deduplicated.
    /// The first occurrence of a name wins. Returns the number of records loaded.
    pub fn load_batch<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let records: Vec<CityRecord> = names
            .into_iter()
            .map(|name| CityRecord::new(name.as_ref()))
            .filter(|record| !record.name.is_empty() && seen.insert(record.name.clone()))
            .collect();

        info!("Loaded {} cities", records.len());
        let count = records.len();
        self.records = Some(records);
        self.version = StoreVersion {
            loads: self.version.loads + 1,
            edits: 0,
        };
        count
    }

    /// Insert a bare record. Returns `false` when the name is already present.
    pub fn add_one(&mut self, name: &str) -> Result<bool> {
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(CityWeatherError::input("City name cannot be empty"));
        }
        let records = self
            .records
            .as_mut()
            .ok_or_else(|| CityWeatherError::state(NOT_INITIALIZED))?;

        if records.iter().any(|record| record.name == key) {
            return Ok(false);
        }
        records.push(CityRecord::new(&key));
        self.version.edits += 1;
        debug!("Added city '{}'", key);
        Ok(true)
    }

    /// Delete every record matching the normalized name
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let key = normalize_name(name);
        let records = self
            .records
            .as_mut()
            .ok_or_else(|| CityWeatherError::state(NOT_INITIALIZED))?;

        let before = records.len();
        records.retain(|record| record.name != key);
        if records.len() == before {
            return Err(CityWeatherError::not_found(format!(
                "City '{name}' does not exist."
            )));
        }
        self.version.edits += 1;
        debug!("Removed city '{}'", key);
        Ok(())
    }

    /// Replace the contents with the successful results only.
    /// Failed cities are dropped from the set. Returns whether any result failed.
    pub fn apply_enrichment(&mut self, results: &[EnrichmentResult]) -> bool {
        let mut had_failure = false;
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(results.len());

        for result in results {
            match result {
                EnrichmentResult::Success {
                    name,
                    coordinates,
                    weather,
                } => {
                    let record = CityRecord::enriched(name, *coordinates, weather.clone());
                    if seen.insert(record.name.clone()) {
                        records.push(record);
                    }
                }
                _ => had_failure = true,
            }
        }

        info!(
            "Applied enrichment: {} cities kept, failures: {}",
            records.len(),
            had_failure
        );
        self.records = Some(records);
        self.version.edits += 1;
        had_failure
    }

    /// Write back batch results enriched from the snapshot taken at `since`.
    ///
    /// If the store is unchanged this is [`CityStore::apply_enrichment`]. If cities
    /// were added or removed meanwhile, each current record with a result is updated
    /// on success or dropped on failure, and records without a result are kept. If a
    /// new batch was loaded meanwhile the results are dropped.
    pub fn apply_batch_enrichment(
        &mut self,
        since: StoreVersion,
        results: &[EnrichmentResult],
    ) -> BatchApply {
        if since == self.version {
            self.apply_enrichment(results);
            return BatchApply::Replaced;
        }
        if since.loads != self.version.loads {
            warn!(
                "City data was reloaded during enrichment, dropping {} results",
                results.len()
            );
            return BatchApply::Discarded;
        }

        let by_name: HashMap<String, &EnrichmentResult> = results
            .iter()
            .map(|result| (normalize_name(result.name()), result))
            .collect();

        let records = self.records.get_or_insert_with(Vec::new);
        records.retain_mut(|record| match by_name.get(&record.name) {
            Some(EnrichmentResult::Success {
                coordinates,
                weather,
                ..
            }) => {
                record.coordinates = Some(*coordinates);
                record.weather = Some(weather.clone());
                true
            }
            Some(_) => false,
            None => true,
        });
        self.version.edits += 1;

        info!("Merged enrichment into changed city data: {} cities kept", self.len());
        BatchApply::Merged
    }

    /// Set whatever the result resolved on the existing record with that name.
    /// Never inserts or deletes.
    pub fn apply_enrichment_to_one(&mut self, result: &EnrichmentResult) -> Result<()> {
        let key = normalize_name(result.name());
        if key.is_empty() {
            return Err(CityWeatherError::input("Enrichment result carries no city name"));
        }

        let record = self
            .records
            .as_mut()
            .and_then(|records| records.iter_mut().find(|record| record.name == key))
            .ok_or_else(|| {
                CityWeatherError::not_found(format!("City '{}' does not exist.", result.name()))
            })?;

        if let Some(coordinates) = result.coordinates() {
            record.coordinates = Some(coordinates);
        }
        if let Some(weather) = result.weather() {
            record.weather = Some(weather.clone());
        }
        Ok(())
    }

    /// Store weather fetched on demand for one record.
    ///
    /// Only applied when the record still exists at the same coordinates, so a
    /// concurrent reload or re-enrichment is never overwritten with stale data.
    pub fn backfill_weather(&mut self, name: &str, at: Coordinates, weather: Weather) -> bool {
        let Some(record) = self
            .records
            .as_mut()
            .and_then(|records| records.iter_mut().find(|record| record.name == name))
        else {
            return false;
        };
        if record.coordinates != Some(at) {
            return false;
        }
        record.weather = Some(weather);
        true
    }

    /// All records; fails when uninitialized or empty
    pub fn list(&self) -> Result<&[CityRecord]> {
        match &self.records {
            Some(records) if !records.is_empty() => Ok(records),
            _ => Err(CityWeatherError::state(NO_CITIES)),
        }
    }

    /// All record names; fails when uninitialized or empty
    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.list()?.iter().map(|record| record.name.clone()).collect())
    }

    /// Rank records by great-circle distance from `query` and pick the nearest.
    ///
    /// Records without coordinates rank at infinite distance. Ties go to the
    /// first record in store order. Fails when no record has coordinates.
    pub fn closest(&self, query: Coordinates) -> Result<ClosestRecord> {
        let records = self.list()?;

        let mut best: Option<(&CityRecord, Coordinates, f64)> = None;
        for record in records {
            let Some(at) = record.coordinates.filter(Coordinates::is_valid) else {
                continue;
            };
            let distance = haversine_km(query, at);
            if best.is_none_or(|(_, _, best_distance)| distance < best_distance) {
                best = Some((record, at, distance));
            }
        }

        let (record, coordinates, distance_km) = best.ok_or_else(|| {
            CityWeatherError::state("City coordinates are missing. Enrich the data first.")
        })?;

        Ok(ClosestRecord {
            name: record.name.clone(),
            coordinates,
            distance_km,
            weather: record.weather.clone(),
        })
    }
}

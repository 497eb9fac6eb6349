use std::collections::hash_map::Entry;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{MappedWeather, WeatherReading, celsius_to_fahrenheit};
use crate::dataset::ReferenceDataset;
use crate::error::{HarnessError, HarnessResult};
use crate::rt::join_ordered;

pub fn map_reading(reading: &WeatherReading, city: Arc<str>) -> MappedWeather {
    MappedWeather {
        city,
        date: reading.date,
        fahrenheit: celsius_to_fahrenheit(reading.celsius),
    }
}

/// Spawns one task per reading, each doing its own lookup, and joins them
/// back in input order.
pub async fn map_concurrently(
    readings: Vec<WeatherReading>,
    dataset: Arc<ReferenceDataset>,
) -> HarnessResult<Vec<MappedWeather>> {
    let handles = readings
        .into_iter()
        .map(|reading| {
            let dataset = Arc::clone(&dataset);
            tokio::spawn(async move {
                let city = dataset.lookup(reading.city_id).await?;
                Ok::<_, HarnessError>(map_reading(&reading, city))
            })
        })
        .collect();
    join_ordered(handles).await
}

/// Resolves each distinct city once, one lookup at a time, then maps every
/// reading against that table without further lookups.
pub fn map_sequentially(readings: &[WeatherReading], dataset: &ReferenceDataset) -> HarnessResult<Vec<MappedWeather>> {
    let mut cities: FxHashMap<u32, Arc<str>> = FxHashMap::default();
    for reading in readings {
        if let Entry::Vacant(slot) = cities.entry(reading.city_id) {
            slot.insert(dataset.resolve(reading.city_id)?);
        }
    }

    readings
        .iter()
        .map(|reading| {
            let city = cities
                .get(&reading.city_id)
                .cloned()
                .ok_or(HarnessError::Lookup { key: reading.city_id })?;
            Ok(map_reading(reading, city))
        })
        .collect()
}

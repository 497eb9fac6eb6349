//! Weather enrichment workload: the two mapping strategies being compared.

mod mappers;
mod suite;


pub use mappers::{map_concurrently, map_reading, map_sequentially};
pub use suite::{CONCURRENT_CASE, DEFAULT_DAYS, NUMBER_OF_DAYS, SEQUENTIAL_CASE, day_parameters, weather_suite};

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Raw reading as returned by the upstream weather source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReading {
    pub city_id: u32,
    pub date: NaiveDate,
    pub celsius: f64,
}

/// Reading enriched with the city name and converted to Fahrenheit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedWeather {
    pub city: Arc<str>,
    pub date: NaiveDate,
    pub fahrenheit: f64,
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Generates deterministic forecasts: day `i` (1-based) is `start + i` days
/// at `40 + i` degrees Celsius, cycling through `city_ids`.
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    start: NaiveDate,
    city_ids: Vec<u32>,
}

impl Workload {
    pub fn new(start: NaiveDate) -> Self {
        Self {
            start,
            city_ids: vec![1],
        }
    }

    pub fn with_city_ids(mut self, city_ids: impl Into<Vec<u32>>) -> Self {
        let ids = city_ids.into();
        if !ids.is_empty() {
            self.city_ids = ids;
        }
        self
    }

    pub fn readings(&self, days: u64) -> Vec<WeatherReading> {
        (1..=days)
            .map(|day| WeatherReading {
                city_id: self.city_ids[(day as usize - 1) % self.city_ids.len()],
                date: self.start.checked_add_days(Days::new(day)).unwrap_or(NaiveDate::MAX),
                celsius: 40.0 + day as f64,
            })
            .collect()
    }
}

pub mod config;
pub mod crisis;
pub mod prediction;

pub use config::{Config, SignalConfig};
pub use crisis::{Coordinates, Crisis, SignalBag};
pub use prediction::{CrisisPrediction, HeatmapPoint, Polygon};

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::Utc;

    use super::{Coordinates, Crisis};

    /// Crisis fixture shared across test modules.
    pub(crate) fn sample_crisis(id: &str, coordinates: Option<(f64, f64)>) -> Crisis {
        Crisis {
            id: id.to_string(),
            name: "Coastal Earthquake".to_string(),
            location: "Port Azura".to_string(),
            severity: 4,
            start_time: Utc::now(),
            description: "Magnitude 6.8 earthquake near the coast".to_string(),
            affected_population: 120_000,
            coordinator_contact: None,
            coordinates: coordinates.map(|(latitude, longitude)| Coordinates {
                latitude,
                longitude,
            }),
        }
    }
}

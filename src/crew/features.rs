//! Job feature extraction for crew-size prediction.
//!
//! Flattens a job plus the day's weather into the fixed-width numeric
//! vector the decision trees split on. Normalizations keep features in
//! comparable ranges but are not required for correctness — trees only
//! compare against thresholds within one feature.

use serde::{Deserialize, Serialize};

use crate::environment::WeatherReport;
use crate::models::Job;

/// Number of features in the vector.
pub const FEATURE_COUNT: usize = 14;

/// Feature names, index-aligned with [`JobFeatures::as_vector`].
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "volume_norm",
    "floors",
    "has_elevator",
    "stairs",
    "piano_count",
    "heavy_appliance_count",
    "fragile_count",
    "parking_norm",
    "narrow_staircase",
    "requires_disassembly",
    "weather_difficulty",
    "urgency",
    "flexibility",
    "difficulty",
];

/// The feature vector of one job under given weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFeatures {
    /// Volume normalized against a 50 m³ full load.
    pub volume_norm: f64,
    /// Floor count.
    pub floors: f64,
    /// 1.0 if the building has an elevator.
    pub has_elevator: f64,
    /// Stair flights.
    pub stairs: f64,
    /// Piano count.
    pub piano_count: f64,
    /// Heavy appliance count.
    pub heavy_appliance_count: f64,
    /// Fragile item count.
    pub fragile_count: f64,
    /// Parking distance normalized against 100 m.
    pub parking_norm: f64,
    /// 1.0 if the staircase is narrow.
    pub narrow_staircase: f64,
    /// 1.0 if disassembly is required.
    pub requires_disassembly: f64,
    /// Weather difficulty multiplier.
    pub weather_difficulty: f64,
    /// Customer urgency (1..=5).
    pub urgency: f64,
    /// Customer flexibility (0..=1).
    pub flexibility: f64,
    /// Composite difficulty score, rounded to one decimal.
    pub difficulty: f64,
}

impl JobFeatures {
    /// Extracts the feature vector from a job and weather snapshot.
    pub fn extract(job: &Job, weather: &WeatherReport) -> Self {
        Self {
            volume_norm: job.volume_m3 / 50.0,
            floors: job.floors as f64,
            has_elevator: if job.has_elevator { 1.0 } else { 0.0 },
            stairs: job.stairs as f64,
            piano_count: job.piano_count as f64,
            heavy_appliance_count: job.heavy_appliance_count as f64,
            fragile_count: job.fragile_count as f64,
            parking_norm: job.parking_distance_m / 100.0,
            narrow_staircase: if job.narrow_staircase { 1.0 } else { 0.0 },
            requires_disassembly: if job.requires_disassembly { 1.0 } else { 0.0 },
            weather_difficulty: weather.difficulty_multiplier,
            urgency: job.urgency as f64,
            flexibility: job.flexibility,
            difficulty: job.difficulty_score(),
        }
    }

    /// The vector as an index-addressable array for tree splits.
    pub fn as_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.volume_norm,
            self.floors,
            self.has_elevator,
            self.stairs,
            self.piano_count,
            self.heavy_appliance_count,
            self.fragile_count,
            self.parking_norm,
            self.narrow_staircase,
            self.requires_disassembly,
            self.weather_difficulty,
            self.urgency,
            self.flexibility,
            self.difficulty,
        ]
    }
}

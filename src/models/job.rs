//! Moving job model.
//!
//! A job is one customer move to be executed on the planning date:
//! a pickup location, a load volume, and the building-access and
//! special-item attributes that drive crew sizing and routing cost.
//! Jobs are immutable once submitted to an optimization run.

use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// A preferred execution window, in hours of the planning day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobWindow {
    /// Earliest acceptable start hour (e.g. 8.0 = 08:00).
    pub earliest_hour: f64,
    /// Latest acceptable start hour.
    pub latest_hour: f64,
}

impl JobWindow {
    /// Creates a window from earliest to latest start hour.
    pub fn new(earliest_hour: f64, latest_hour: f64) -> Self {
        Self {
            earliest_hour,
            latest_hour,
        }
    }

    /// Whether an arrival at `hour` falls inside the window.
    pub fn contains(&self, hour: f64) -> bool {
        hour >= self.earliest_hour && hour <= self.latest_hour
    }
}

/// A moving job to be scheduled.
///
/// Immutable input to an optimization run. Building-access attributes
/// (floors, elevator, parking) and special items (piano, heavy
/// appliances) feed both the clustering weight and the crew-size model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: String,
    /// Human-readable label (customer or address).
    pub name: String,
    /// Pickup location.
    pub location: GeoPoint,
    /// Load volume in cubic meters.
    pub volume_m3: f64,
    /// Estimated on-site work time in hours.
    pub estimated_hours: f64,
    /// Number of floors at the pickup address.
    pub floors: u32,
    /// Whether the building has a working elevator.
    pub has_elevator: bool,
    /// Number of stair flights outside the elevator path.
    pub stairs: u32,
    /// Whether the staircase is too narrow for standard furniture.
    pub narrow_staircase: bool,
    /// Carry distance from the closest truck parking, in meters.
    pub parking_distance_m: f64,
    /// Number of pianos.
    pub piano_count: u32,
    /// Number of heavy appliances (washer, fridge, safe, ...).
    pub heavy_appliance_count: u32,
    /// Number of fragile items needing individual handling.
    pub fragile_count: u32,
    /// Whether furniture must be disassembled on site.
    pub requires_disassembly: bool,
    /// Customer urgency, 1 (relaxed) to 5 (urgent). 3 is neutral.
    pub urgency: u32,
    /// Customer flexibility, 0.0 (rigid) to 1.0 (fully flexible).
    pub flexibility: f64,
    /// Preferred execution window, if the customer stated one.
    pub window: Option<JobWindow>,
    /// Scheduling priority (higher = keep when constraints force drops).
    pub priority: i32,
}

impl Job {
    /// Creates a job with neutral defaults at the given location.
    pub fn new(id: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            location,
            volume_m3: 0.0,
            estimated_hours: 0.0,
            floors: 1,
            has_elevator: true,
            stairs: 0,
            narrow_staircase: false,
            parking_distance_m: 0.0,
            piano_count: 0,
            heavy_appliance_count: 0,
            fragile_count: 0,
            requires_disassembly: false,
            urgency: 3,
            flexibility: 0.5,
            window: None,
            priority: 0,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the load volume (m³).
    pub fn with_volume(mut self, volume_m3: f64) -> Self {
        self.volume_m3 = volume_m3;
        self
    }

    /// Sets the estimated on-site work time (hours).
    pub fn with_estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = hours;
        self
    }

    /// Sets floor count and elevator availability.
    pub fn with_building(mut self, floors: u32, has_elevator: bool) -> Self {
        self.floors = floors;
        self.has_elevator = has_elevator;
        self
    }

    /// Sets stair flights and staircase width.
    pub fn with_stairs(mut self, stairs: u32, narrow: bool) -> Self {
        self.stairs = stairs;
        self.narrow_staircase = narrow;
        self
    }

    /// Sets the parking carry distance (meters).
    pub fn with_parking_distance(mut self, meters: f64) -> Self {
        self.parking_distance_m = meters;
        self
    }

    /// Sets special item counts.
    pub fn with_special_items(mut self, pianos: u32, heavy_appliances: u32, fragile: u32) -> Self {
        self.piano_count = pianos;
        self.heavy_appliance_count = heavy_appliances;
        self.fragile_count = fragile;
        self
    }

    /// Marks the job as requiring on-site disassembly.
    pub fn with_disassembly(mut self) -> Self {
        self.requires_disassembly = true;
        self
    }

    /// Sets urgency (clamped to 1..=5).
    pub fn with_urgency(mut self, urgency: u32) -> Self {
        self.urgency = urgency.clamp(1, 5);
        self
    }

    /// Sets flexibility (clamped to 0.0..=1.0).
    pub fn with_flexibility(mut self, flexibility: f64) -> Self {
        self.flexibility = flexibility.clamp(0.0, 1.0);
        self
    }

    /// Sets the preferred execution window.
    pub fn with_window(mut self, window: JobWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Sets the scheduling priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Composite difficulty score, rounded to one decimal.
    ///
    /// Combines volume, floor access without elevator, special items,
    /// and awkward-access penalties. Used as a tree feature and by the
    /// manual fallback packing order.
    pub fn difficulty_score(&self) -> f64 {
        let mut score = self.volume_m3 / 10.0;
        if !self.has_elevator {
            score += self.floors as f64 * 0.8;
        }
        score += self.piano_count as f64 * 2.0;
        score += self.heavy_appliance_count as f64 * 0.5;
        score += self.fragile_count as f64 * 0.2;
        if self.parking_distance_m > 50.0 {
            score += 1.0;
        }
        if self.narrow_staircase {
            score += 1.0;
        }
        if self.requires_disassembly {
            score += 0.5;
        }
        (score * 10.0).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> GeoPoint {
        GeoPoint::new(59.33, 18.07)
    }

    #[test]
    fn test_job_builder() {
        let job = Job::new("J1", point())
            .with_name("Svensson flytt")
            .with_volume(35.0)
            .with_estimated_hours(4.0)
            .with_building(3, false)
            .with_stairs(6, true)
            .with_parking_distance(80.0)
            .with_special_items(1, 2, 5)
            .with_disassembly()
            .with_urgency(4)
            .with_flexibility(0.2)
            .with_window(JobWindow::new(8.0, 12.0))
            .with_priority(10);

        assert_eq!(job.id, "J1");
        assert_eq!(job.floors, 3);
        assert!(!job.has_elevator);
        assert!(job.narrow_staircase);
        assert_eq!(job.piano_count, 1);
        assert!(job.requires_disassembly);
        assert_eq!(job.urgency, 4);
        assert!(job.window.unwrap().contains(9.0));
        assert!(!job.window.unwrap().contains(13.0));
    }

    #[test]
    fn test_urgency_and_flexibility_clamped() {
        let job = Job::new("J1", point()).with_urgency(9).with_flexibility(1.5);
        assert_eq!(job.urgency, 5);
        assert!((job.flexibility - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_difficulty_score_easy_job() {
        // 20 m³, elevator, ground access: 20/10 = 2.0
        let job = Job::new("J1", point()).with_volume(20.0);
        assert!((job.difficulty_score() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_difficulty_score_hard_job() {
        // 30/10 + 4*0.8 + 1*2.0 + 2*0.5 + 50*0 + parking + narrow + disassembly
        let job = Job::new("J1", point())
            .with_volume(30.0)
            .with_building(4, false)
            .with_special_items(1, 2, 0)
            .with_parking_distance(60.0)
            .with_stairs(8, true)
            .with_disassembly();
        // 3.0 + 3.2 + 2.0 + 1.0 + 1.0 + 1.0 + 0.5 = 11.7
        assert!((job.difficulty_score() - 11.7).abs() < 1e-10);
    }

    #[test]
    fn test_difficulty_rounded_to_one_decimal() {
        let job = Job::new("J1", point()).with_volume(33.33);
        let s = job.difficulty_score();
        assert!((s * 10.0 - (s * 10.0).round()).abs() < 1e-10);
    }

    #[test]
    fn test_serde_round_trip() {
        let job = Job::new("J1", point()).with_volume(25.0).with_priority(3);
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }
}

//! Environmental data advisors.
//!
//! Weather, traffic, and congestion-tax data are supplied by external
//! collaborators; only their data contracts matter here. Each contract
//! is a strategy trait injected at engine construction, so production
//! code wires real clients while tests wire the static implementations
//! below. Advisor failures are soft: the engine substitutes
//! `advisory_default()` values and records a warning.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::GeoPoint;

/// Day-level weather snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Mean temperature (°C).
    pub temperature_avg_c: f64,
    /// Expected precipitation (mm).
    pub precipitation_mm: f64,
    /// Snow depth on the ground (cm).
    pub snow_depth_cm: f64,
    /// Mean wind speed (m/s).
    pub wind_speed_ms: f64,
    /// Moving-difficulty multiplier, 1.0 = normal conditions.
    pub difficulty_multiplier: f64,
    /// Whether crews need extra time per stop (ice, heavy rain).
    pub requires_extra_time: bool,
    /// Safety warnings to surface to operators.
    pub safety_warnings: Vec<String>,
    /// Equipment recommendations (shovels, tarpaulins, ...).
    pub equipment_recommendations: Vec<String>,
}

impl WeatherReport {
    /// Neutral conditions assumed when the weather service is down.
    pub fn advisory_default() -> Self {
        Self {
            temperature_avg_c: 10.0,
            precipitation_mm: 0.0,
            snow_depth_cm: 0.0,
            wind_speed_ms: 3.0,
            difficulty_multiplier: 1.0,
            requires_extra_time: false,
            safety_warnings: Vec::new(),
            equipment_recommendations: Vec::new(),
        }
    }
}

/// Day-level traffic snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficReport {
    /// Whether the planning window overlaps rush hour.
    pub rush_hour: bool,
    /// Average speed as a fraction of free flow (1.0 = free flow).
    pub average_speed_factor: f64,
    /// Congestion level, 0.0 (empty roads) to 1.0 (gridlock).
    pub congestion_level: f64,
}

impl TrafficReport {
    /// Free-flow conditions assumed when the traffic service is down.
    pub fn advisory_default() -> Self {
        Self {
            rush_hour: false,
            average_speed_factor: 1.0,
            congestion_level: 0.3,
        }
    }
}

/// A geofenced congestion-tax zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxZone {
    /// Zone center.
    pub center: GeoPoint,
    /// Zone radius (km).
    pub radius_km: f64,
}

impl TaxZone {
    /// Creates a zone.
    pub fn new(center: GeoPoint, radius_km: f64) -> Self {
        Self { center, radius_km }
    }

    /// Whether a point lies inside the zone.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.center.haversine_km(point) <= self.radius_km
    }
}

/// Congestion-tax schedule for the planning date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongestionTaxSchedule {
    /// Whether the tax applies on this date (weekends/holidays exempt).
    pub is_active: bool,
    /// Hourly rate (SEK) charged per distinct zone entered.
    pub rate_per_hour_sek: f64,
    /// Taxed zones.
    pub zones: Vec<TaxZone>,
}

impl CongestionTaxSchedule {
    /// No-tax schedule assumed when the tax service is down.
    pub fn advisory_default() -> Self {
        Self {
            is_active: false,
            rate_per_hour_sek: 0.0,
            zones: Vec::new(),
        }
    }

    /// Whether a point lies inside any active zone.
    pub fn point_in_zone(&self, point: &GeoPoint) -> bool {
        self.is_active && self.zones.iter().any(|z| z.contains(point))
    }
}

/// Bundled environmental data for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Weather snapshot.
    pub weather: WeatherReport,
    /// Traffic snapshot.
    pub traffic: TrafficReport,
    /// Congestion-tax schedule.
    pub congestion_tax: CongestionTaxSchedule,
}

impl Environment {
    /// All-advisory-defaults environment.
    pub fn advisory_default() -> Self {
        Self {
            weather: WeatherReport::advisory_default(),
            traffic: TrafficReport::advisory_default(),
            congestion_tax: CongestionTaxSchedule::advisory_default(),
        }
    }
}

/// Supplies day-level weather data.
pub trait WeatherAdvisor: Send + Sync {
    /// Weather snapshot for the given date.
    fn weather_for_date(&self, date: NaiveDate) -> Result<WeatherReport>;
}

/// Supplies day-level traffic data.
pub trait TrafficAdvisor: Send + Sync {
    /// Traffic snapshot for the given date.
    fn traffic_for_date(&self, date: NaiveDate) -> Result<TrafficReport>;
}

/// Supplies the congestion-tax schedule.
pub trait CongestionTaxAdvisor: Send + Sync {
    /// Tax schedule for the given date.
    fn tax_for_date(&self, date: NaiveDate) -> Result<CongestionTaxSchedule>;
}

/// Weather advisor returning a fixed report (reference/test impl).
#[derive(Debug, Clone)]
pub struct StaticWeather {
    report: Option<WeatherReport>,
}

impl StaticWeather {
    /// Always returns the given report.
    pub fn new(report: WeatherReport) -> Self {
        Self {
            report: Some(report),
        }
    }

    /// Always fails, for exercising the soft-fail path.
    pub fn failing() -> Self {
        Self { report: None }
    }
}

impl Default for StaticWeather {
    fn default() -> Self {
        Self::new(WeatherReport::advisory_default())
    }
}

impl WeatherAdvisor for StaticWeather {
    fn weather_for_date(&self, _date: NaiveDate) -> Result<WeatherReport> {
        self.report
            .clone()
            .ok_or_else(|| crate::error::OptimizeError::advisor("weather", "service unavailable"))
    }
}

/// Traffic advisor returning a fixed report (reference/test impl).
#[derive(Debug, Clone)]
pub struct StaticTraffic {
    report: Option<TrafficReport>,
}

impl StaticTraffic {
    /// Always returns the given report.
    pub fn new(report: TrafficReport) -> Self {
        Self {
            report: Some(report),
        }
    }

    /// Always fails, for exercising the soft-fail path.
    pub fn failing() -> Self {
        Self { report: None }
    }
}

impl Default for StaticTraffic {
    fn default() -> Self {
        Self::new(TrafficReport::advisory_default())
    }
}

impl TrafficAdvisor for StaticTraffic {
    fn traffic_for_date(&self, _date: NaiveDate) -> Result<TrafficReport> {
        self.report
            .ok_or_else(|| crate::error::OptimizeError::advisor("traffic", "service unavailable"))
    }
}

/// Congestion-tax advisor returning a fixed schedule (reference/test impl).
#[derive(Debug, Clone)]
pub struct StaticTax {
    schedule: Option<CongestionTaxSchedule>,
}

impl StaticTax {
    /// Always returns the given schedule.
    pub fn new(schedule: CongestionTaxSchedule) -> Self {
        Self {
            schedule: Some(schedule),
        }
    }

    /// Always fails, for exercising the soft-fail path.
    pub fn failing() -> Self {
        Self { schedule: None }
    }
}

impl Default for StaticTax {
    fn default() -> Self {
        Self::new(CongestionTaxSchedule::advisory_default())
    }
}

impl CongestionTaxAdvisor for StaticTax {
    fn tax_for_date(&self, _date: NaiveDate) -> Result<CongestionTaxSchedule> {
        self.schedule.clone().ok_or_else(|| {
            crate::error::OptimizeError::advisor("congestion-tax", "service unavailable")
        })
    }
}

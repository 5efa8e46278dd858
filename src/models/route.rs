//! Route model.
//!
//! A route is an ordered job sequence assigned to one team, together
//! with its derived cost/duration metrics. At most one route exists
//! per team per optimization run.

use serde::{Deserialize, Serialize};

use super::Job;

/// Derived metrics of a route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    /// Total duration: travel + work + weather surcharge (hours).
    pub total_hours: f64,
    /// Driving time (hours).
    pub travel_hours: f64,
    /// On-site work time (hours).
    pub work_hours: f64,
    /// Efficiency score, 0..=100.
    pub efficiency_score: f64,
    /// Congestion-tax cost (SEK), counted once per distinct zone entered.
    pub congestion_tax_sek: f64,
    /// Driven distance (km).
    pub distance_km: f64,
    /// Recommended crew size for this route.
    pub crew_size: u32,
}

/// An ordered job sequence assigned to one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// The team executing this route.
    pub team_id: String,
    /// Jobs in visiting order.
    pub jobs: Vec<Job>,
    /// Derived metrics.
    pub metrics: RouteMetrics,
}

impl Route {
    /// Creates an empty route for a team.
    pub fn new(team_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            jobs: Vec::new(),
            metrics: RouteMetrics::default(),
        }
    }

    /// Number of stops.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the route has no stops.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Summed load volume (m³).
    pub fn total_volume(&self) -> f64 {
        self.jobs.iter().map(|j| j.volume_m3).sum()
    }

    /// Job ids in visiting order.
    pub fn job_ids(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.id.as_str()).collect()
    }
}

//! Optimization result model.
//!
//! The unit returned to callers for every run, regardless of which tier
//! produced it. Failures never escape as errors: a rejected or degraded
//! run is still an `OptimizationResult` with `success`, `fallback_reason`
//! and `warnings` describing what happened.

use serde::{Deserialize, Serialize};

use super::Route;
use crate::environment::WeatherReport;

/// Which tier/algorithm produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// Main path: density clustering + VRP + ensemble crew sizing.
    DbscanVrpMl,
    /// Round-robin fallback.
    SimpleFallback,
    /// Greedy bin-packing fallback.
    ManualFallback,
    /// Zone-based fallback.
    HybridFallback,
    /// Last-resort even distribution.
    Emergency,
    /// Input validation rejected the run; nothing was attempted.
    Rejected,
}

impl Algorithm {
    /// Operator-facing label for this algorithm.
    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::DbscanVrpMl => "DBSCAN+VRP+ML-Enhanced",
            Algorithm::SimpleFallback => "Simple Round-Robin Fallback",
            Algorithm::ManualFallback => "Manual Bin-Packing Fallback",
            Algorithm::HybridFallback => "Hybrid Zone Fallback",
            Algorithm::Emergency => "Emergency Distribution",
            Algorithm::Rejected => "Rejected",
        }
    }
}

/// The outcome of one optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Whether the run produced a plan the operator can dispatch as-is.
    pub success: bool,
    /// Which tier produced this result.
    pub algorithm: Algorithm,
    /// Aggregate efficiency score, 0..=100.
    pub efficiency_score: f64,
    /// One route per team that received jobs.
    pub routes: Vec<Route>,
    /// Weather snapshot used for the run, if any was fetched.
    pub weather: Option<WeatherReport>,
    /// Aggregate cost (SEK), currently congestion tax across routes.
    pub total_cost_sek: f64,
    /// Aggregate driven distance (km).
    pub total_distance_km: f64,
    /// Aggregate duration across routes (hours).
    pub total_duration_hours: f64,
    /// Wall-clock time spent in the run (ms).
    pub elapsed_ms: u64,
    /// Why a non-main tier was entered, if one was.
    pub fallback_reason: Option<String>,
    /// Operator-facing warnings.
    pub warnings: Vec<String>,
    /// Operator-facing recommendations.
    pub recommendations: Vec<String>,
    /// Run identifier (planning date + start timestamp).
    pub run_id: String,
}

impl OptimizationResult {
    /// Creates an empty result skeleton for a tier.
    pub fn new(algorithm: Algorithm, run_id: impl Into<String>) -> Self {
        Self {
            success: false,
            algorithm,
            efficiency_score: 0.0,
            routes: Vec::new(),
            weather: None,
            total_cost_sek: 0.0,
            total_distance_km: 0.0,
            total_duration_hours: 0.0,
            elapsed_ms: 0,
            fallback_reason: None,
            warnings: Vec::new(),
            recommendations: Vec::new(),
            run_id: run_id.into(),
        }
    }

    /// Recomputes the aggregate cost/distance/duration fields from the
    /// routes currently attached to the result.
    pub fn aggregate_route_totals(&mut self) {
        self.total_cost_sek = self.routes.iter().map(|r| r.metrics.congestion_tax_sek).sum();
        self.total_distance_km = self.routes.iter().map(|r| r.metrics.distance_km).sum();
        self.total_duration_hours = self.routes.iter().map(|r| r.metrics.total_hours).sum();
    }

    /// Total number of jobs across all routes.
    pub fn total_jobs(&self) -> usize {
        self.routes.iter().map(|r| r.len()).sum()
    }

    /// Route assigned to a team, if any.
    pub fn route_for_team(&self, team_id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.team_id == team_id)
    }
}

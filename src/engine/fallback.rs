//! Degraded-mode planning tiers.
//!
//! When the main pipeline fails, the engine asks a [`FallbackPlanner`]
//! for a cruder but dependable plan. Three strategies exist, selected
//! by configuration:
//!
//! - *Simple*: round-robin assignment by index, jobs sorted by priority
//!   then distance to the day's geographic center.
//! - *Manual*: greedy bin-packing, largest vehicles take the hardest
//!   jobs first.
//! - *Hybrid*: jobs bucketed into five fixed Stockholm zones, each zone
//!   packed onto the next team in rotation; degrades to *Simple* if the
//!   zone pass fails.
//!
//! The emergency distribution below the tiers never fails and is kept
//! as a free function, not a strategy.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{OptimizeError, Result};
use crate::models::{Algorithm, GeoPoint, Job, Route, Team};

/// Assumed driven distance per stop when no matrix is computed (km).
const ROUGH_KM_PER_STOP: f64 = 8.0;

/// Assumed average driving speed for rough estimates (km/h).
const ROUGH_SPEED_KMH: f64 = 30.0;

/// Fixed efficiency reported by the simple tier.
const SIMPLE_EFFICIENCY: f64 = 70.0;

/// Fixed metrics used by the emergency distribution.
const EMERGENCY_HOURS: f64 = 8.0;
const EMERGENCY_CREW: u32 = 2;
const EMERGENCY_EFFICIENCY: f64 = 50.0;

/// Which degraded strategy the engine should try first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Round-robin by index.
    Simple,
    /// Greedy bin-packing.
    Manual,
    /// Zone bucketing, then packing per zone.
    #[default]
    Hybrid,
}

/// A plan produced by a degraded tier.
#[derive(Debug, Clone)]
pub struct FallbackPlan {
    /// Which tier actually produced the routes (hybrid may degrade).
    pub algorithm: Algorithm,
    /// One route per team that received jobs.
    pub routes: Vec<Route>,
    /// Overall efficiency estimate, 0..=100.
    pub efficiency_score: f64,
    /// Ids of jobs no team could take.
    pub unassigned: Vec<String>,
    /// Operator-facing notes about the degraded plan.
    pub recommendations: Vec<String>,
}

/// Strategy seam for degraded planning, injected at engine construction.
pub trait FallbackPlanner: Send + Sync {
    /// Produces a plan in the requested mode.
    fn plan(&self, mode: FallbackMode, jobs: &[Job], teams: &[Team]) -> Result<FallbackPlan>;
}

/// The production planner implementing all three strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFallback;

impl StandardFallback {
    /// Creates the planner.
    pub fn new() -> Self {
        Self
    }

    /// Round-robin by index over priority/distance-sorted jobs.
    fn simple(&self, jobs: &[Job], teams: &[Team]) -> Result<FallbackPlan> {
        if teams.is_empty() {
            return Err(OptimizeError::fallback("simple", "inga team att fördela på"));
        }
        let center = GeoPoint::centroid(&jobs.iter().map(|j| j.location).collect::<Vec<_>>())
            .unwrap_or(STOCKHOLM_CENTER);

        let mut ordered: Vec<&Job> = jobs.iter().collect();
        ordered.sort_by(|a, b| {
            b.priority.cmp(&a.priority).then_with(|| {
                let da = a.location.haversine_km(&center);
                let db = b.location.haversine_km(&center);
                da.total_cmp(&db)
            })
        });

        let mut routes: Vec<Route> = teams.iter().map(|t| Route::new(&t.id)).collect();
        for (i, job) in ordered.iter().enumerate() {
            routes[i % teams.len()].jobs.push((*job).clone());
        }
        for (route, team) in routes.iter_mut().zip(teams) {
            apply_rough_metrics(route, team, SIMPLE_EFFICIENCY);
        }
        routes.retain(|r| !r.is_empty());

        Ok(FallbackPlan {
            algorithm: Algorithm::SimpleFallback,
            routes,
            efficiency_score: SIMPLE_EFFICIENCY,
            unassigned: Vec::new(),
            recommendations: vec![
                "Förenklad tilldelning utan ruttoptimering — kontrollera körordningen manuellt"
                    .to_string(),
            ],
        })
    }

    /// Greedy bin-packing: big vehicles take the hardest jobs first.
    fn manual(&self, jobs: &[Job], teams: &[Team]) -> Result<FallbackPlan> {
        if teams.is_empty() {
            return Err(OptimizeError::fallback("manual", "inga team att fördela på"));
        }

        let mut team_order: Vec<&Team> = teams.iter().collect();
        team_order.sort_by(|a, b| b.capacity_m3.total_cmp(&a.capacity_m3));

        let mut remaining: Vec<&Job> = jobs.iter().collect();
        remaining.sort_by(|a, b| pack_weight(b).total_cmp(&pack_weight(a)));

        let mut routes = Vec::new();
        for team in team_order {
            let mut route = Route::new(&team.id);
            let mut load = 0.0;
            let mut hours = 0.0;
            remaining.retain(|job| {
                if load + job.volume_m3 <= team.capacity_m3
                    && hours + job.estimated_hours <= team.available_hours
                {
                    load += job.volume_m3;
                    hours += job.estimated_hours;
                    route.jobs.push((*job).clone());
                    false
                } else {
                    true
                }
            });
            if !route.is_empty() {
                let eff = packing_efficiency(route.len());
                apply_rough_metrics(&mut route, team, eff);
                routes.push(route);
            }
        }

        let efficiency_score = mean_efficiency(&routes);
        let unassigned: Vec<String> = remaining.iter().map(|j| j.id.clone()).collect();

        Ok(FallbackPlan {
            algorithm: Algorithm::ManualFallback,
            routes,
            efficiency_score,
            unassigned,
            recommendations: vec![
                "Packningsbaserad tilldelning — rutterna är inte avståndsoptimerade".to_string(),
            ],
        })
    }

    /// Zone bucketing, then per-zone packing onto teams in rotation.
    fn hybrid(&self, jobs: &[Job], teams: &[Team]) -> Result<FallbackPlan> {
        if teams.is_empty() {
            return Err(OptimizeError::fallback("hybrid", "inga team att fördela på"));
        }

        // Bucket each job into the first zone containing it, or the
        // nearest zone center otherwise.
        let mut buckets: Vec<Vec<&Job>> = vec![Vec::new(); ZONES.len()];
        for job in jobs {
            let zone = ZONES
                .iter()
                .position(|z| job.location.haversine_km(&z.center) <= z.radius_km)
                .or_else(|| {
                    (0..ZONES.len()).min_by(|&a, &b| {
                        let da = job.location.haversine_km(&ZONES[a].center);
                        let db = job.location.haversine_km(&ZONES[b].center);
                        da.total_cmp(&db)
                    })
                })
                .ok_or_else(|| OptimizeError::fallback("hybrid", "inga zoner definierade"))?;
            buckets[zone].push(job);
        }

        // A team may serve several zones when zones outnumber teams, so
        // accumulate per-team before building routes.
        let mut assigned: Vec<Vec<Job>> = vec![Vec::new(); teams.len()];
        let mut load = vec![0.0; teams.len()];
        let mut hours = vec![0.0; teams.len()];
        let mut unassigned = Vec::new();
        let mut recommendations = Vec::new();
        let mut cursor = 0usize;

        for (zone, bucket) in ZONES.iter().zip(&mut buckets) {
            if bucket.is_empty() {
                continue;
            }
            bucket.sort_by(|a, b| pack_weight(b).total_cmp(&pack_weight(a)));
            let t = cursor % teams.len();
            cursor += 1;
            let team = &teams[t];

            let mut taken = 0usize;
            for job in bucket.iter() {
                if load[t] + job.volume_m3 <= team.capacity_m3
                    && hours[t] + job.estimated_hours <= team.available_hours
                {
                    load[t] += job.volume_m3;
                    hours[t] += job.estimated_hours;
                    assigned[t].push((*job).clone());
                    taken += 1;
                } else {
                    unassigned.push(job.id.clone());
                }
            }
            recommendations.push(format!("Zon {}: {} jobb till team {}", zone.name, taken, team.id));
        }

        let mut routes = Vec::new();
        for (team, jobs) in teams.iter().zip(assigned) {
            if jobs.is_empty() {
                continue;
            }
            let mut route = Route::new(&team.id);
            route.jobs = jobs;
            let eff = packing_efficiency(route.len());
            apply_rough_metrics(&mut route, team, eff);
            routes.push(route);
        }

        let efficiency_score = mean_efficiency(&routes);
        Ok(FallbackPlan {
            algorithm: Algorithm::HybridFallback,
            routes,
            efficiency_score,
            unassigned,
            recommendations,
        })
    }
}

impl FallbackPlanner for StandardFallback {
    fn plan(&self, mode: FallbackMode, jobs: &[Job], teams: &[Team]) -> Result<FallbackPlan> {
        match mode {
            FallbackMode::Simple => self.simple(jobs, teams),
            FallbackMode::Manual => self.manual(jobs, teams),
            FallbackMode::Hybrid => match self.hybrid(jobs, teams) {
                Ok(plan) => Ok(plan),
                Err(e) => {
                    warn!(error = %e, "zone packing failed, degrading to simple assignment");
                    self.simple(jobs, teams)
                }
            },
        }
    }
}

/// Last-resort distribution. Never fails: every team gets an equal
/// chunk of the job list and fixed default metrics. The caller marks
/// the result `success = false`.
pub fn emergency_distribution(jobs: &[Job], teams: &[Team]) -> Vec<Route> {
    if teams.is_empty() {
        return Vec::new();
    }
    let chunk = jobs.len().div_ceil(teams.len()).max(1);

    teams
        .iter()
        .enumerate()
        .map(|(i, team)| {
            let mut route = Route::new(&team.id);
            route.jobs = jobs.iter().skip(i * chunk).take(chunk).cloned().collect();
            route.metrics.work_hours = route.jobs.iter().map(|j| j.estimated_hours).sum();
            route.metrics.total_hours = EMERGENCY_HOURS;
            route.metrics.distance_km = ROUGH_KM_PER_STOP * route.len() as f64;
            route.metrics.crew_size = EMERGENCY_CREW;
            route.metrics.efficiency_score = EMERGENCY_EFFICIENCY;
            route
        })
        .collect()
}

/// One fixed geographic zone for the hybrid strategy.
struct Zone {
    name: &'static str,
    center: GeoPoint,
    radius_km: f64,
}

const STOCKHOLM_CENTER: GeoPoint = GeoPoint {
    lat: 59.3293,
    lng: 18.0686,
};

/// The five hybrid zones: inner city plus the four compass sectors.
const ZONES: [Zone; 5] = [
    Zone {
        name: "City",
        center: STOCKHOLM_CENTER,
        radius_km: 3.0,
    },
    Zone {
        name: "Norr",
        center: GeoPoint {
            lat: 59.4050,
            lng: 17.9550,
        },
        radius_km: 12.0,
    },
    Zone {
        name: "Söder",
        center: GeoPoint {
            lat: 59.2400,
            lng: 18.0100,
        },
        radius_km: 12.0,
    },
    Zone {
        name: "Öst",
        center: GeoPoint {
            lat: 59.3350,
            lng: 18.1900,
        },
        radius_km: 12.0,
    },
    Zone {
        name: "Väst",
        center: GeoPoint {
            lat: 59.3500,
            lng: 17.8800,
        },
        radius_km: 12.0,
    },
];

/// Packing order key: harder and bulkier jobs go first.
fn pack_weight(job: &Job) -> f64 {
    job.difficulty_score() + job.volume_m3 / 10.0
}

/// Job-count-scaled packing efficiency, 60 + 5 per job, capped at 90.
fn packing_efficiency(job_count: usize) -> f64 {
    (60.0 + 5.0 * job_count as f64).min(90.0)
}

fn mean_efficiency(routes: &[Route]) -> f64 {
    if routes.is_empty() {
        return 0.0;
    }
    routes.iter().map(|r| r.metrics.efficiency_score).sum::<f64>() / routes.len() as f64
}

/// Fills in estimated metrics for a route built without a cost matrix.
fn apply_rough_metrics(route: &mut Route, team: &Team, efficiency: f64) {
    let distance = ROUGH_KM_PER_STOP * route.len() as f64;
    let travel = distance / ROUGH_SPEED_KMH;
    let work: f64 = route.jobs.iter().map(|j| j.estimated_hours).sum();
    route.metrics.distance_km = distance;
    route.metrics.travel_hours = travel;
    route.metrics.work_hours = work;
    route.metrics.total_hours = travel + work;
    route.metrics.efficiency_score = efficiency;
    route.metrics.crew_size = (team.headcount() as u32).max(2);
}

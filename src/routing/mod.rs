//! Per-team vehicle routing.
//!
//! Solves a small capacitated, time-windowed routing problem for one
//! team over one cluster's jobs.
//!
//! # Algorithm
//!
//! 1. Distance matrix over {depot ∪ jobs}, haversine kilometers scaled
//!    by weather difficulty and inverse traffic speed.
//! 2. Nearest-neighbor construction respecting vehicle capacity and
//!    soft time windows; a stop with no feasible successor ends
//!    construction early.
//! 3. 2-opt local search: reverse the best improving sub-segment until
//!    no improving reversal remains.
//! 4. Constraint repair: drop lowest-priority jobs until both the
//!    capacity and working-hours constraints hold.
//! 5. Metric derivation (travel, work, surcharge, efficiency,
//!    congestion tax per distinct zone entered).
//!
//! # Complexity
//! O(n²) construction, O(n²) per 2-opt sweep; n is cluster-sized.
//!
//! # Reference
//! Croes (1958), "A Method for Solving Traveling-Salesman Problems",
//! *Operations Research* 6(6) — the 2-opt move.

use tracing::{debug, warn};

use crate::environment::Environment;
use crate::error::Result;
use crate::models::{GeoPoint, Job, Route, Team};

/// Fleet depot used when a team has no known current location
/// (Stockholm south terminal).
const DEFAULT_DEPOT: GeoPoint = GeoPoint {
    lat: 59.2930,
    lng: 18.0280,
};

/// Assumed average driving speed in town (km/h).
const AVERAGE_SPEED_KMH: f64 = 30.0;

/// Extra minutes per stop when the weather demands it.
const WEATHER_SURCHARGE_MIN_PER_STOP: f64 = 15.0;

/// Hour of day at which routes start.
const DAY_START_HOUR: f64 = 8.0;

/// A solved route plus the jobs that had to be left out of it.
#[derive(Debug, Clone)]
pub struct RoutingOutcome {
    /// The final route.
    pub route: Route,
    /// Jobs dropped by dead-end construction or constraint repair.
    pub dropped_jobs: Vec<Job>,
    /// Routing quality score, 0..=100 (the route's efficiency).
    pub score: f64,
}

/// Nearest-neighbor + 2-opt route solver.
#[derive(Debug, Clone, Default)]
pub struct RouteOptimizer;

impl RouteOptimizer {
    /// Creates a solver.
    pub fn new() -> Self {
        Self
    }

    /// Builds and improves a route for one team over the given jobs.
    pub fn solve(&self, jobs: &[Job], team: &Team, env: &Environment) -> Result<RoutingOutcome> {
        let mut route = Route::new(&team.id);
        if jobs.is_empty() {
            return Ok(RoutingOutcome {
                route,
                dropped_jobs: Vec::new(),
                score: 0.0,
            });
        }

        let depot = team.current_location.unwrap_or(DEFAULT_DEPOT);
        let matrix = CostMatrix::build(&depot, jobs, env);

        // 1-2. Construct, 3. improve.
        let (mut sequence, mut dropped) = self.construct(jobs, team, &matrix);
        self.two_opt(&mut sequence, &matrix);

        // 4. Hard-constraint repair.
        self.repair(&mut sequence, &mut dropped, jobs, team, &matrix, env);

        // 5. Metrics.
        route.jobs = sequence.iter().map(|&i| jobs[i].clone()).collect();
        self.apply_metrics(&mut route, &sequence, &depot, &matrix, env);

        let dropped_jobs: Vec<Job> = dropped.into_iter().map(|i| jobs[i].clone()).collect();
        if !dropped_jobs.is_empty() {
            warn!(
                team = %team.id,
                dropped = dropped_jobs.len(),
                "constraint repair dropped jobs from route"
            );
        }

        let score = route.metrics.efficiency_score;
        Ok(RoutingOutcome {
            route,
            dropped_jobs,
            score,
        })
    }

    /// Re-solves the not-yet-visited tail of a delayed route.
    ///
    /// Only the remaining jobs are re-planned; the team's available
    /// hours are reduced by the hours already worked and the delay.
    pub fn reoptimize_for_delay(
        &self,
        route: &Route,
        team: &Team,
        env: &Environment,
        current_job_index: usize,
        delay_minutes: f64,
    ) -> Result<RoutingOutcome> {
        let remaining: Vec<Job> = route.jobs.iter().skip(current_job_index).cloned().collect();
        let spent_hours: f64 = route
            .jobs
            .iter()
            .take(current_job_index)
            .map(|j| j.estimated_hours)
            .sum();

        let mut reduced_team = team.clone();
        reduced_team.available_hours =
            (team.available_hours - spent_hours - delay_minutes / 60.0).max(0.0);
        // Resume from the last completed stop rather than the depot.
        if current_job_index > 0 {
            reduced_team.current_location = Some(route.jobs[current_job_index - 1].location);
        }

        let mut outcome = self.solve(&remaining, &reduced_team, env)?;
        outcome.route.metrics.crew_size = route.metrics.crew_size;
        Ok(outcome)
    }

    /// Nearest-neighbor construction under capacity and time windows.
    ///
    /// Returns the visiting order (indices into `jobs`) and the indices
    /// left unrouted when construction dead-ends.
    fn construct(&self, jobs: &[Job], team: &Team, matrix: &CostMatrix) -> (Vec<usize>, Vec<usize>) {
        let n = jobs.len();
        let mut visited = vec![false; n];
        let mut sequence = Vec::with_capacity(n);
        let mut current = 0usize; // matrix index; 0 = depot
        let mut load = 0.0;
        let mut clock = DAY_START_HOUR;

        loop {
            let mut best: Option<(usize, f64, f64)> = None; // (job, cost, arrival)
            for (j, job) in jobs.iter().enumerate() {
                if visited[j] || load + job.volume_m3 > team.capacity_m3 {
                    continue;
                }
                let cost = matrix.get(current, j + 1);
                let mut arrival = clock + cost / AVERAGE_SPEED_KMH;
                if let Some(window) = job.window {
                    if arrival > window.latest_hour {
                        continue;
                    }
                    // Early arrivals wait for the window to open.
                    arrival = arrival.max(window.earliest_hour);
                }
                if best.map_or(true, |(_, c, _)| cost < c) {
                    best = Some((j, cost, arrival));
                }
            }

            match best {
                None => break, // dead end: no feasible successor
                Some((j, _, arrival)) => {
                    visited[j] = true;
                    sequence.push(j);
                    load += jobs[j].volume_m3;
                    clock = arrival + jobs[j].estimated_hours;
                    current = j + 1;
                }
            }
        }

        let dropped: Vec<usize> = (0..n).filter(|&j| !visited[j]).collect();
        (sequence, dropped)
    }

    /// Best-improvement 2-opt over an open tour anchored at the depot.
    fn two_opt(&self, sequence: &mut Vec<usize>, matrix: &CostMatrix) {
        if sequence.len() < 3 {
            return;
        }
        loop {
            let mut best_delta = -1e-9;
            let mut best_move: Option<(usize, usize)> = None;

            for i in 0..sequence.len() - 1 {
                for j in (i + 1)..sequence.len() {
                    let delta = self.reversal_delta(sequence, matrix, i, j);
                    if delta < best_delta {
                        best_delta = delta;
                        best_move = Some((i, j));
                    }
                }
            }

            match best_move {
                Some((i, j)) => sequence[i..=j].reverse(),
                None => break,
            }
        }
    }

    /// Cost change of reversing `sequence[i..=j]` (negative = improvement).
    fn reversal_delta(&self, sequence: &[usize], matrix: &CostMatrix, i: usize, j: usize) -> f64 {
        let prev = if i == 0 { 0 } else { sequence[i - 1] + 1 };
        let old_in = matrix.get(prev, sequence[i] + 1);
        let new_in = matrix.get(prev, sequence[j] + 1);

        let mut delta = new_in - old_in;
        if j + 1 < sequence.len() {
            let next = sequence[j + 1] + 1;
            delta += matrix.get(sequence[i] + 1, next) - matrix.get(sequence[j] + 1, next);
        }
        delta
    }

    /// Drops lowest-priority jobs until capacity and hours both hold.
    fn repair(
        &self,
        sequence: &mut Vec<usize>,
        dropped: &mut Vec<usize>,
        jobs: &[Job],
        team: &Team,
        matrix: &CostMatrix,
        env: &Environment,
    ) {
        loop {
            let volume: f64 = sequence.iter().map(|&i| jobs[i].volume_m3).sum();
            let duration = self.total_hours(sequence, jobs, matrix, env);
            if volume <= team.capacity_m3 && duration <= team.available_hours {
                break;
            }
            // Lowest priority goes first; ties resolved by drop order.
            let Some(pos) = (0..sequence.len())
                .min_by_key(|&p| jobs[sequence[p]].priority)
            else {
                break;
            };
            let removed = sequence.remove(pos);
            debug!(job = %jobs[removed].id, "dropping job to restore feasibility");
            dropped.push(removed);
        }
    }

    fn travel_hours(&self, sequence: &[usize], matrix: &CostMatrix) -> f64 {
        let mut cost = 0.0;
        let mut prev = 0usize;
        for &job in sequence {
            cost += matrix.get(prev, job + 1);
            prev = job + 1;
        }
        cost / AVERAGE_SPEED_KMH
    }

    fn total_hours(
        &self,
        sequence: &[usize],
        jobs: &[Job],
        matrix: &CostMatrix,
        env: &Environment,
    ) -> f64 {
        let work: f64 = sequence.iter().map(|&i| jobs[i].estimated_hours).sum();
        let surcharge = if env.weather.requires_extra_time {
            WEATHER_SURCHARGE_MIN_PER_STOP / 60.0 * sequence.len() as f64
        } else {
            0.0
        };
        self.travel_hours(sequence, matrix) + work + surcharge
    }

    fn apply_metrics(
        &self,
        route: &mut Route,
        sequence: &[usize],
        depot: &GeoPoint,
        matrix: &CostMatrix,
        env: &Environment,
    ) {
        // Raw driven kilometers (unscaled).
        let mut distance = 0.0;
        let mut prev = *depot;
        for job in &route.jobs {
            distance += prev.haversine_km(&job.location);
            prev = job.location;
        }

        let travel = self.travel_hours(sequence, matrix);
        let work: f64 = route.jobs.iter().map(|j| j.estimated_hours).sum();
        let surcharge = if env.weather.requires_extra_time {
            WEATHER_SURCHARGE_MIN_PER_STOP / 60.0 * route.jobs.len() as f64
        } else {
            0.0
        };
        let total = travel + work + surcharge;

        let efficiency = if total > 0.0 {
            ((work * 1.2) / total * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        // Tax is charged once per distinct zone the route enters.
        let tax = if env.congestion_tax.is_active {
            let zones_entered = env
                .congestion_tax
                .zones
                .iter()
                .filter(|zone| route.jobs.iter().any(|j| zone.contains(&j.location)))
                .count();
            env.congestion_tax.rate_per_hour_sek * zones_entered as f64
        } else {
            0.0
        };

        route.metrics.distance_km = distance;
        route.metrics.travel_hours = travel;
        route.metrics.work_hours = work;
        route.metrics.total_hours = total;
        route.metrics.efficiency_score = efficiency;
        route.metrics.congestion_tax_sek = tax;
    }
}

/// Environment-scaled travel cost matrix over {depot ∪ jobs}.
///
/// Index 0 is the depot; job `i` sits at index `i + 1`. Entries are
/// kilometers multiplied by weather difficulty and divided by the
/// traffic speed factor, so "expensive kilometers" repel the heuristics.
#[derive(Debug, Clone)]
struct CostMatrix {
    size: usize,
    entries: Vec<f64>,
}

impl CostMatrix {
    fn build(depot: &GeoPoint, jobs: &[Job], env: &Environment) -> Self {
        let scale =
            env.weather.difficulty_multiplier / env.traffic.average_speed_factor.max(0.1);
        let mut points = Vec::with_capacity(jobs.len() + 1);
        points.push(*depot);
        points.extend(jobs.iter().map(|j| j.location));

        let size = points.len();
        let mut entries = vec![0.0; size * size];
        for i in 0..size {
            for j in (i + 1)..size {
                let d = points[i].haversine_km(&points[j]) * scale;
                entries[i * size + j] = d;
                entries[j * size + i] = d;
            }
        }
        Self { size, entries }
    }

    #[inline]
    fn get(&self, from: usize, to: usize) -> f64 {
        self.entries[from * self.size + to]
    }
}

//! Density-based geographic clustering.
//!
//! Groups the day's jobs into geographically compact clusters so that
//! each crew works one part of town. The algorithm is DBSCAN-style
//! density growth with two local adaptations:
//!
//! 1. The neighborhood radius (epsilon) shrinks under bad weather,
//!    rush-hour traffic, and active congestion tax, producing tighter
//!    clusters on days when driving is expensive.
//! 2. Low-density points are never discarded as noise — every job must
//!    be scheduled, so each sub-threshold point becomes its own
//!    singleton cluster.
//!
//! The neighbor test is weighted: heavy or awkward jobs (big volume, no
//! elevator, long carry) inflate the effective radius around them so
//! they attract nearby help.
//!
//! # Complexity
//! O(n²) distance evaluations; fine at dispatch scale (tens of jobs).
//!
//! # Reference
//! Ester et al. (1996), "A Density-Based Algorithm for Discovering
//! Clusters in Large Spatial Databases with Noise", *KDD-96*

use tracing::debug;

use crate::environment::Environment;
use crate::error::Result;
use crate::models::{degrees_to_km, Cluster, Job};

/// Base neighborhood radius in degrees (≈ 1.6 km).
const BASE_EPSILON_DEG: f64 = 0.0145;

/// Epsilon never drops below this floor, whatever the conditions.
const MIN_EPSILON_DEG: f64 = 0.008;

/// Minimum neighbor count for a point to seed cluster growth.
const MIN_POINTS: usize = 2;

/// Strategy seam for job partitioning, injected at engine construction.
pub trait ClusterStrategy: Send + Sync {
    /// Partitions jobs into clusters under the given conditions.
    fn cluster(&self, jobs: &[Job], env: &Environment) -> Result<Clustering>;
}

impl ClusterStrategy for GeographicClusterer {
    fn cluster(&self, jobs: &[Job], env: &Environment) -> Result<Clustering> {
        GeographicClusterer::cluster(self, jobs, env)
    }
}

/// The outcome of one clustering pass.
#[derive(Debug, Clone)]
pub struct Clustering {
    /// Clusters covering every input job exactly once.
    pub clusters: Vec<Cluster>,
    /// Quality score for the partition, 0..=100.
    pub efficiency_score: f64,
}

/// Density-based clusterer with an environment-adjusted radius.
#[derive(Debug, Clone)]
pub struct GeographicClusterer {
    base_epsilon_deg: f64,
    min_epsilon_deg: f64,
    min_points: usize,
}

impl Default for GeographicClusterer {
    fn default() -> Self {
        Self {
            base_epsilon_deg: BASE_EPSILON_DEG,
            min_epsilon_deg: MIN_EPSILON_DEG,
            min_points: MIN_POINTS,
        }
    }
}

impl GeographicClusterer {
    /// Creates a clusterer with the default radius parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the base neighborhood radius (degrees).
    pub fn with_base_epsilon(mut self, epsilon_deg: f64) -> Self {
        self.base_epsilon_deg = epsilon_deg;
        self
    }

    /// The neighborhood radius for the given conditions, in degrees.
    ///
    /// Adjustments are multiplicative and applied in a fixed order, each
    /// clamped so the result never drops below the configured floor:
    /// snow > 5 cm ×0.7, precipitation > 10 mm ×0.8, wind > 15 m/s
    /// ×0.85, rush hour ×0.85, congestion > 0.7 ×0.9, active tax ×0.9.
    pub fn adjusted_epsilon_deg(&self, env: &Environment) -> f64 {
        let mut eps = self.base_epsilon_deg;
        let mut apply = |eps: &mut f64, factor: f64| {
            *eps = (*eps * factor).max(self.min_epsilon_deg);
        };

        if env.weather.snow_depth_cm > 5.0 {
            apply(&mut eps, 0.7);
        }
        if env.weather.precipitation_mm > 10.0 {
            apply(&mut eps, 0.8);
        }
        if env.weather.wind_speed_ms > 15.0 {
            apply(&mut eps, 0.85);
        }
        if env.traffic.rush_hour {
            apply(&mut eps, 0.85);
        }
        if env.traffic.congestion_level > 0.7 {
            apply(&mut eps, 0.9);
        }
        if env.congestion_tax.is_active {
            apply(&mut eps, 0.9);
        }

        eps
    }

    /// Neighborhood weight of a job under the given conditions.
    ///
    /// Heavier/awkward jobs get larger weights, widening the effective
    /// radius around them in the neighbor test.
    fn job_weight(&self, job: &Job, env: &Environment) -> f64 {
        let mut weight = 1.0 + job.volume_m3 / 20.0;
        if !job.has_elevator && job.floors > 2 {
            weight *= 1.3;
        }
        if job.parking_distance_m > 50.0 {
            weight *= 1.2;
        }
        if env.weather.difficulty_multiplier > 1.5 {
            weight *= 1.2;
        }
        weight *= job.urgency as f64 / 3.0;
        if env.congestion_tax.point_in_zone(&job.location) {
            weight *= 1.1;
        }
        weight
    }

    /// Partitions jobs into clusters and scores the partition.
    ///
    /// Every input job lands in exactly one cluster; points that fail
    /// the density threshold become singleton clusters rather than
    /// noise.
    pub fn cluster(&self, jobs: &[Job], env: &Environment) -> Result<Clustering> {
        if jobs.is_empty() {
            return Ok(Clustering {
                clusters: Vec::new(),
                efficiency_score: 0.0,
            });
        }

        let eps_km = degrees_to_km(self.adjusted_epsilon_deg(env));
        let weights: Vec<f64> = jobs.iter().map(|j| self.job_weight(j, env)).collect();

        // Precompute neighbor lists under the weighted radius.
        let n = jobs.len();
        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = jobs[i].location.haversine_km(&jobs[j].location);
                let threshold = eps_km * ((weights[i] + weights[j]) / 2.0).sqrt();
                if d <= threshold {
                    neighbors[i].push(j);
                    neighbors[j].push(i);
                }
            }
        }

        // Density growth: a core point (>= min_points neighbors) recruits
        // its neighborhood transitively.
        let mut assignment: Vec<Option<usize>> = vec![None; n];
        let mut clusters_members: Vec<Vec<usize>> = Vec::new();

        for seed in 0..n {
            if assignment[seed].is_some() || neighbors[seed].len() < self.min_points {
                continue;
            }

            let cluster_id = clusters_members.len();
            let mut members = Vec::new();
            let mut frontier = vec![seed];
            assignment[seed] = Some(cluster_id);

            while let Some(idx) = frontier.pop() {
                members.push(idx);
                if neighbors[idx].len() >= self.min_points {
                    for &next in &neighbors[idx] {
                        if assignment[next].is_none() {
                            assignment[next] = Some(cluster_id);
                            frontier.push(next);
                        }
                    }
                }
            }

            clusters_members.push(members);
        }

        // Sub-threshold leftovers become singleton clusters.
        for idx in 0..n {
            if assignment[idx].is_none() {
                assignment[idx] = Some(clusters_members.len());
                clusters_members.push(vec![idx]);
            }
        }

        let clusters: Vec<Cluster> = clusters_members
            .into_iter()
            .enumerate()
            .filter_map(|(id, members)| {
                let member_jobs = members.iter().map(|&i| jobs[i].clone()).collect();
                Cluster::from_jobs(id, member_jobs)
            })
            .collect();

        let efficiency_score = self.score_partition(&clusters, jobs.len(), env);
        debug!(
            clusters = clusters.len(),
            jobs = jobs.len(),
            eps_km,
            efficiency = efficiency_score,
            "clustering pass complete"
        );

        Ok(Clustering {
            clusters,
            efficiency_score,
        })
    }

    /// Job-count-weighted partition quality, 0..=100.
    fn score_partition(&self, clusters: &[Cluster], total_jobs: usize, env: &Environment) -> f64 {
        if clusters.is_empty() || total_jobs == 0 {
            return 0.0;
        }

        let mut weighted_sum = 0.0;
        for cluster in clusters {
            let mut eff = 100.0 - 20.0 * cluster.mean_centroid_distance_km();
            eff /= env.weather.difficulty_multiplier.max(1.0);
            eff *= env.traffic.average_speed_factor.min(1.0);
            if cluster.len() >= 3 {
                eff *= 1.1;
            }
            weighted_sum += eff.clamp(0.0, 100.0) * cluster.len() as f64;
        }
        let mean = weighted_sum / total_jobs as f64;

        // Penalize deviating from the ideal cluster count (~ jobs / 4).
        let ideal = (total_jobs as f64 / 4.0).max(1.0);
        let deviation = (clusters.len() as f64 - ideal).abs();

        (mean - 2.0 * deviation).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;

    fn job(id: &str, lat: f64, lng: f64) -> Job {
        Job::new(id, GeoPoint::new(lat, lng))
            .with_volume(15.0)
            .with_estimated_hours(2.0)
    }

    fn calm() -> Environment {
        Environment::advisory_default()
    }

    #[test]
    fn test_epsilon_unchanged_in_calm_conditions() {
        let c = GeographicClusterer::new();
        assert!((c.adjusted_epsilon_deg(&calm()) - BASE_EPSILON_DEG).abs() < 1e-12);
    }

    #[test]
    fn test_epsilon_monotone_in_snow() {
        let c = GeographicClusterer::new();
        let mut prev = f64::MAX;
        for snow in [0.0, 3.0, 5.0, 5.1, 10.0, 30.0] {
            let mut env = calm();
            env.weather.snow_depth_cm = snow;
            let eps = c.adjusted_epsilon_deg(&env);
            assert!(eps <= prev, "epsilon grew as snow increased");
            assert!(eps >= MIN_EPSILON_DEG);
            prev = eps;
        }
    }

    #[test]
    fn test_epsilon_never_below_floor() {
        let c = GeographicClusterer::new();
        let mut env = calm();
        env.weather.snow_depth_cm = 40.0;
        env.weather.precipitation_mm = 25.0;
        env.weather.wind_speed_ms = 22.0;
        env.traffic.rush_hour = true;
        env.traffic.congestion_level = 0.9;
        env.congestion_tax.is_active = true;
        assert!(c.adjusted_epsilon_deg(&env) >= MIN_EPSILON_DEG);
    }

    #[test]
    fn test_dense_points_form_one_cluster() {
        // Three jobs within a few hundred meters of each other.
        let jobs = vec![
            job("a", 59.3300, 18.0700),
            job("b", 59.3310, 18.0710),
            job("c", 59.3305, 18.0690),
        ];
        let c = GeographicClusterer::new();
        let result = c.cluster(&jobs, &calm()).unwrap();
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].len(), 3);
    }

    #[test]
    fn test_isolated_point_becomes_singleton() {
        let jobs = vec![
            job("a", 59.3300, 18.0700),
            job("b", 59.3310, 18.0710),
            job("c", 59.3305, 18.0690),
            job("far", 59.60, 17.80), // tens of km away
        ];
        let c = GeographicClusterer::new();
        let result = c.cluster(&jobs, &calm()).unwrap();
        assert_eq!(result.clusters.len(), 2);
        let singleton = result
            .clusters
            .iter()
            .find(|cl| cl.len() == 1)
            .expect("singleton cluster");
        assert_eq!(singleton.jobs[0].id, "far");
    }

    #[test]
    fn test_every_job_clustered_exactly_once() {
        let jobs: Vec<Job> = (0..12)
            .map(|i| {
                job(
                    &format!("j{i}"),
                    59.30 + (i % 4) as f64 * 0.05,
                    18.00 + (i / 4) as f64 * 0.05,
                )
            })
            .collect();
        let c = GeographicClusterer::new();
        let result = c.cluster(&jobs, &calm()).unwrap();

        let mut seen: Vec<&str> = result
            .clusters
            .iter()
            .flat_map(|cl| cl.jobs.iter().map(|j| j.id.as_str()))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen.len(), 12);
        seen.dedup();
        assert_eq!(seen.len(), 12, "a job appeared in two clusters");
    }

    #[test]
    fn test_two_isolated_points_pair_up_if_close() {
        // Two jobs ~0.5 km apart, nothing else: each has 1 neighbor,
        // below min_points, so both become singletons.
        let jobs = vec![job("a", 59.3300, 18.0700), job("b", 59.3345, 18.0700)];
        let c = GeographicClusterer::new();
        let result = c.cluster(&jobs, &calm()).unwrap();
        assert_eq!(result.clusters.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let c = GeographicClusterer::new();
        let result = c.cluster(&[], &calm()).unwrap();
        assert!(result.clusters.is_empty());
        assert!((result.efficiency_score - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_efficiency_bounded() {
        let jobs: Vec<Job> = (0..8)
            .map(|i| job(&format!("j{i}"), 59.33 + i as f64 * 0.001, 18.07))
            .collect();
        let c = GeographicClusterer::new();
        let result = c.cluster(&jobs, &calm()).unwrap();
        assert!(result.efficiency_score >= 0.0 && result.efficiency_score <= 100.0);
    }

    #[test]
    fn test_bad_weather_tightens_clusters() {
        // Jobs ~1.3 km apart: neighbors in calm weather, separated in
        // heavy snow (epsilon × 0.7).
        let jobs = vec![
            job("a", 59.3300, 18.0700),
            job("b", 59.3417, 18.0700),
            job("c", 59.3358, 18.0700),
        ];
        let c = GeographicClusterer::new();

        let calm_result = c.cluster(&jobs, &calm()).unwrap();
        let mut snowy = calm();
        snowy.weather.snow_depth_cm = 20.0;
        let snowy_result = c.cluster(&jobs, &snowy).unwrap();

        assert!(snowy_result.clusters.len() >= calm_result.clusters.len());
    }
}

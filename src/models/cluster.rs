//! Geographic job cluster.
//!
//! Clusters are transient groupings produced by the clusterer and
//! rebuilt on every run; they never outlive the optimization pass.

use serde::{Deserialize, Serialize};

use super::{GeoPoint, Job};

/// A geographically compact group of jobs with its centroid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster index within the run (0-based).
    pub id: usize,
    /// Member jobs.
    pub jobs: Vec<Job>,
    /// Arithmetic centroid of member locations.
    pub centroid: GeoPoint,
}

impl Cluster {
    /// Creates a cluster from its member jobs, computing the centroid.
    ///
    /// Returns `None` if `jobs` is empty.
    pub fn from_jobs(id: usize, jobs: Vec<Job>) -> Option<Self> {
        let points: Vec<GeoPoint> = jobs.iter().map(|j| j.location).collect();
        let centroid = GeoPoint::centroid(&points)?;
        Some(Self { id, jobs, centroid })
    }

    /// Number of member jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the cluster has no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Summed load volume of the member jobs (m³).
    pub fn total_volume(&self) -> f64 {
        self.jobs.iter().map(|j| j.volume_m3).sum()
    }

    /// Summed on-site work time of the member jobs (hours).
    pub fn total_work_hours(&self) -> f64 {
        self.jobs.iter().map(|j| j.estimated_hours).sum()
    }

    /// The member with the highest composite difficulty score.
    pub fn hardest_job(&self) -> Option<&Job> {
        self.jobs.iter().max_by(|a, b| {
            a.difficulty_score()
                .partial_cmp(&b.difficulty_score())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Mean distance from members to the centroid (km).
    pub fn mean_centroid_distance_km(&self) -> f64 {
        if self.jobs.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .jobs
            .iter()
            .map(|j| j.location.haversine_km(&self.centroid))
            .sum();
        sum / self.jobs.len() as f64
    }
}

//! Crew-size recommendation.
//!
//! Predicts how many movers a job needs from a bagged decision-tree
//! ensemble trained on historical job/outcome records, falling back to
//! a hand-authored two-level rule tree while the history is thin
//! (< 50 records). The model variant is explicit — [`CrewModel`] tags
//! which predictor is active — and the whole thing is a documented
//! heuristic, not a statistical learning pipeline.
//!
//! # Modules
//! - [`features`]: job → numeric feature vector
//! - [`tree`]: entropy-split decision trees and the bagged ensemble

pub mod features;
pub mod tree;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::environment::WeatherReport;
use crate::error::{OptimizeError, Result};
use crate::models::{GeoPoint, Job};
use features::JobFeatures;
use tree::{Ensemble, EnsembleConfig, Sample};

/// Records needed before the ensemble replaces the rule tree.
const MIN_ENSEMBLE_RECORDS: usize = 50;

/// New feedback records between retraining passes.
const RETRAIN_INTERVAL: usize = 50;

/// Valid crew sizes.
const MIN_CREW: u32 = 1;
const MAX_CREW: u32 = 6;

/// One historical job outcome, the training substrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    /// Feature vector of the job as planned.
    pub features: JobFeatures,
    /// Crew size actually sent.
    pub actual_crew_size: u32,
    /// Hours the job actually took.
    pub actual_hours: f64,
    /// Realized efficiency, 0..=100.
    pub efficiency: f64,
    /// Customer satisfaction, 1..=5.
    pub customer_satisfaction: f64,
}

/// A crew-size recommendation for one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewRecommendation {
    /// Recommended crew size.
    pub size: u32,
    /// Model confidence, 0..=100.
    pub confidence: f64,
    /// Why the model chose this size.
    pub reasoning: Vec<String>,
    /// Adjacent crew sizes worth considering.
    pub alternatives: Vec<u32>,
    /// Expected job duration with the recommended crew (hours).
    pub estimated_hours: f64,
    /// Expected efficiency with the recommended crew, 0..=100.
    pub estimated_efficiency: f64,
}

/// Which predictor is currently active.
#[derive(Debug, Clone)]
pub enum CrewModel {
    /// Bagged decision-tree ensemble over the job history.
    Ensemble(Ensemble),
    /// Hand-authored two-level rule tree used while history is thin.
    RuleBased,
}

/// Recommends crew sizes from historical outcomes.
#[derive(Debug)]
pub struct CrewSizeRecommender {
    history: Vec<HistoricalRecord>,
    model: CrewModel,
    config: EnsembleConfig,
    pending_feedback: usize,
    rng: SmallRng,
}

impl CrewSizeRecommender {
    /// Creates a recommender with no history (rule-based predictions).
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            model: CrewModel::RuleBased,
            config: EnsembleConfig::default(),
            pending_feedback: 0,
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Creates a recommender trained on the given history.
    ///
    /// The seed controls bootstrap sampling during training, making the
    /// trained model reproducible.
    pub fn with_history(history: Vec<HistoricalRecord>, seed: u64) -> Self {
        let mut recommender = Self {
            history,
            model: CrewModel::RuleBased,
            config: EnsembleConfig::default(),
            pending_feedback: 0,
            rng: SmallRng::seed_from_u64(seed),
        };
        recommender.retrain();
        recommender
    }

    /// Creates a recommender seeded with `n` synthetic outcome records.
    ///
    /// Reproduces the bootstrapping the original dispatch system does at
    /// startup, but explicitly and deterministically. Whether production
    /// should instead train on genuine operational history is an open
    /// product question; feedback records accumulate either way.
    pub fn with_synthetic_history(n: usize, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let history = (0..n).map(|i| synthetic_record(i, &mut rng)).collect();
        Self::with_history(history, seed)
    }

    /// The currently active model variant.
    pub fn model(&self) -> &CrewModel {
        &self.model
    }

    /// Number of historical records held.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Recommends a crew size for a job under the given weather,
    /// capped at the team's available headcount.
    pub fn recommend(
        &self,
        job: &Job,
        weather: &WeatherReport,
        available_headcount: usize,
    ) -> Result<CrewRecommendation> {
        let features = JobFeatures::extract(job, weather);
        let vector = features.as_vector();
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(OptimizeError::CrewSizing(format!(
                "non-finite feature for job '{}'",
                job.id
            )));
        }

        let (raw, variance) = match &self.model {
            CrewModel::Ensemble(ensemble) => ensemble.predict(&vector),
            // Fixed nominal spread: the rule tree reports middling confidence.
            CrewModel::RuleBased => (rule_based_size(job) as f64, 0.25),
        };

        let cap = (available_headcount as u32).max(MIN_CREW);
        let unclamped = raw.round() as i64;
        let size = (unclamped.clamp(MIN_CREW as i64, MAX_CREW as i64) as u32).min(cap);

        let confidence = (100.0 * (1.0 - variance.sqrt()).max(0.0)).clamp(0.0, 100.0);
        let mut reasoning = build_reasoning(job, weather);
        if unclamped > cap as i64 {
            reasoning.push(format!(
                "Begränsad till teamets bemanning ({cap} personer)"
            ));
        }

        let alternatives: Vec<u32> = [size.saturating_sub(1), size + 1]
            .into_iter()
            .filter(|&s| (MIN_CREW..=MAX_CREW.min(cap)).contains(&s) && s != size)
            .collect();

        // estimated_hours assumes the stated job duration is for a
        // two-person crew and scales with headcount and weather.
        let estimated_hours =
            job.estimated_hours * (2.0 / size as f64) * weather.difficulty_multiplier;
        let estimated_efficiency =
            (70.0 + size as f64 * 5.0 - job.difficulty_score() * 2.0).clamp(40.0, 95.0);

        Ok(CrewRecommendation {
            size,
            confidence,
            reasoning,
            alternatives,
            estimated_hours,
            estimated_efficiency,
        })
    }

    /// Appends an outcome record and retrains after every
    /// [`RETRAIN_INTERVAL`] new records.
    pub fn update_with_feedback(&mut self, record: HistoricalRecord) {
        self.history.push(record);
        self.pending_feedback += 1;
        if self.pending_feedback >= RETRAIN_INTERVAL {
            self.pending_feedback = 0;
            self.retrain();
        }
    }

    /// Fraction of historical records the active model predicts exactly,
    /// 0..=1. The rule tree reports a fixed nominal accuracy.
    pub fn model_accuracy(&self) -> f64 {
        match &self.model {
            CrewModel::RuleBased => 0.65,
            CrewModel::Ensemble(ensemble) => {
                if self.history.is_empty() {
                    return 0.0;
                }
                let hits = self
                    .history
                    .iter()
                    .filter(|r| {
                        let (raw, _) = ensemble.predict(&r.features.as_vector());
                        raw.round() as u32 == r.actual_crew_size
                    })
                    .count();
                hits as f64 / self.history.len() as f64
            }
        }
    }

    fn retrain(&mut self) {
        if self.history.len() < MIN_ENSEMBLE_RECORDS {
            debug!(
                records = self.history.len(),
                needed = MIN_ENSEMBLE_RECORDS,
                "history too thin, staying rule-based"
            );
            self.model = CrewModel::RuleBased;
            return;
        }
        let samples: Vec<Sample> = self
            .history
            .iter()
            .map(|r| Sample {
                features: r.features.as_vector(),
                crew_size: r.actual_crew_size,
            })
            .collect();
        let ensemble = Ensemble::train(&samples, &self.config, &mut self.rng);
        info!(
            records = self.history.len(),
            trees = ensemble.len(),
            "crew-size ensemble retrained"
        );
        self.model = CrewModel::Ensemble(ensemble);
    }
}

impl Default for CrewSizeRecommender {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-level rule tree keyed on volume then difficulty.
fn rule_based_size(job: &Job) -> u32 {
    let difficulty = job.difficulty_score();
    if job.volume_m3 > 40.0 {
        if difficulty > 8.0 {
            5
        } else {
            4
        }
    } else if job.volume_m3 > 20.0 {
        if difficulty > 6.0 {
            4
        } else {
            3
        }
    } else if difficulty > 4.0 {
        3
    } else {
        2
    }
}

/// Threshold-based reasoning strings shown to dispatchers.
fn build_reasoning(job: &Job, weather: &WeatherReport) -> Vec<String> {
    let mut reasoning = Vec::new();
    if job.volume_m3 > 25.0 {
        reasoning.push(format!("Stor volym ({} m³) kräver fler bärare", job.volume_m3));
    }
    if job.piano_count > 0 {
        reasoning.push("Piano kräver minst tre erfarna bärare".to_string());
    }
    if job.floors > 3 && !job.has_elevator {
        reasoning.push(format!("{} våningar utan hiss", job.floors));
    }
    if weather.difficulty_multiplier > 1.3 {
        reasoning.push("Besvärligt väder ökar tidsåtgången".to_string());
    }
    reasoning
}

/// Generates one plausible synthetic outcome record.
fn synthetic_record(index: usize, rng: &mut SmallRng) -> HistoricalRecord {
    let location = GeoPoint::new(
        59.25 + rng.random_range(0.0..0.15),
        17.95 + rng.random_range(0.0..0.25),
    );
    let floors = rng.random_range(1..=6);
    let job = Job::new(format!("hist-{index}"), location)
        .with_volume(rng.random_range(5.0..60.0))
        .with_estimated_hours(rng.random_range(1.0..8.0))
        .with_building(floors, rng.random_bool(0.6))
        .with_stairs(rng.random_range(0..10), rng.random_bool(0.2))
        .with_parking_distance(rng.random_range(0.0..120.0))
        .with_special_items(
            u32::from(rng.random_bool(0.08)),
            rng.random_range(0..3),
            rng.random_range(0..8),
        )
        .with_urgency(rng.random_range(1..=5));

    let mut weather = WeatherReport::advisory_default();
    weather.difficulty_multiplier = rng.random_range(1.0..1.8);

    // Outcome crew size tracks difficulty with a little noise.
    let difficulty = job.difficulty_score();
    let noise: i64 = rng.random_range(-1..=1);
    let crew = ((1.0 + difficulty / 2.5).round() as i64 + noise).clamp(1, 6) as u32;

    HistoricalRecord {
        features: JobFeatures::extract(&job, &weather),
        actual_crew_size: crew,
        actual_hours: job.estimated_hours * rng.random_range(0.8..1.4),
        efficiency: rng.random_range(55.0..95.0),
        customer_satisfaction: rng.random_range(2.5..5.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> GeoPoint {
        GeoPoint::new(59.33, 18.07)
    }

    fn weather() -> WeatherReport {
        WeatherReport::advisory_default()
    }

    #[test]
    fn test_rule_based_without_history() {
        let recommender = CrewSizeRecommender::new();
        assert!(matches!(recommender.model(), CrewModel::RuleBased));

        let small = Job::new("J1", point()).with_volume(10.0);
        let rec = recommender.recommend(&small, &weather(), 6).unwrap();
        assert_eq!(rec.size, 2);

        let big = Job::new("J2", point())
            .with_volume(45.0)
            .with_building(5, false)
            .with_special_items(1, 2, 0);
        let rec = recommender.recommend(&big, &weather(), 6).unwrap();
        assert_eq!(rec.size, 5);
    }

    #[test]
    fn test_synthetic_history_trains_ensemble() {
        let recommender = CrewSizeRecommender::with_synthetic_history(200, 42);
        assert!(matches!(recommender.model(), CrewModel::Ensemble(_)));
        assert_eq!(recommender.history_len(), 200);
    }

    #[test]
    fn test_recommendation_bounds() {
        let recommender = CrewSizeRecommender::with_synthetic_history(200, 42);
        let job = Job::new("J1", point())
            .with_volume(55.0)
            .with_building(6, false)
            .with_special_items(2, 3, 10)
            .with_parking_distance(90.0);
        let rec = recommender.recommend(&job, &weather(), 6).unwrap();

        assert!((MIN_CREW..=MAX_CREW).contains(&rec.size));
        assert!((0.0..=100.0).contains(&rec.confidence));
        assert!(rec.estimated_hours >= 0.0);
        assert!((40.0..=95.0).contains(&rec.estimated_efficiency));
    }

    #[test]
    fn test_headcount_cap() {
        let recommender = CrewSizeRecommender::new();
        let big = Job::new("J1", point())
            .with_volume(50.0)
            .with_building(5, false)
            .with_special_items(1, 2, 0);
        let rec = recommender.recommend(&big, &weather(), 2).unwrap();
        assert_eq!(rec.size, 2);
        assert!(rec
            .reasoning
            .iter()
            .any(|r| r.contains("Begränsad till teamets bemanning")));
    }

    #[test]
    fn test_recommendation_deterministic() {
        let recommender = CrewSizeRecommender::with_synthetic_history(100, 9);
        let job = Job::new("J1", point()).with_volume(30.0).with_building(3, false);
        let first = recommender.recommend(&job, &weather(), 6).unwrap();
        for _ in 0..5 {
            let again = recommender.recommend(&job, &weather(), 6).unwrap();
            assert_eq!(again.size, first.size);
            assert!((again.confidence - first.confidence).abs() < 1e-10);
        }
    }

    #[test]
    fn test_reasoning_thresholds() {
        let recommender = CrewSizeRecommender::new();
        let mut bad_weather = weather();
        bad_weather.difficulty_multiplier = 1.5;
        let job = Job::new("J1", point())
            .with_volume(30.0)
            .with_building(4, false)
            .with_special_items(1, 0, 0);

        let rec = recommender.recommend(&job, &bad_weather, 6).unwrap();
        assert!(rec.reasoning.iter().any(|r| r.contains("Stor volym")));
        assert!(rec.reasoning.iter().any(|r| r.contains("Piano")));
        assert!(rec.reasoning.iter().any(|r| r.contains("utan hiss")));
        assert!(rec.reasoning.iter().any(|r| r.contains("väder")));
    }

    #[test]
    fn test_alternatives_adjacent() {
        let recommender = CrewSizeRecommender::new();
        let job = Job::new("J1", point()).with_volume(30.0);
        let rec = recommender.recommend(&job, &weather(), 6).unwrap();
        for alt in &rec.alternatives {
            assert!(alt.abs_diff(rec.size) == 1);
        }
    }

    #[test]
    fn test_feedback_retrains_at_interval() {
        let mut recommender = CrewSizeRecommender::new();
        let mut rng = SmallRng::seed_from_u64(3);
        for i in 0..49 {
            recommender.update_with_feedback(synthetic_record(i, &mut rng));
            assert!(matches!(recommender.model(), CrewModel::RuleBased));
        }
        recommender.update_with_feedback(synthetic_record(49, &mut rng));
        assert!(matches!(recommender.model(), CrewModel::Ensemble(_)));
    }

    #[test]
    fn test_model_accuracy_bounds() {
        let rule = CrewSizeRecommender::new();
        assert!((rule.model_accuracy() - 0.65).abs() < 1e-10);

        let trained = CrewSizeRecommender::with_synthetic_history(150, 11);
        let acc = trained.model_accuracy();
        assert!((0.0..=1.0).contains(&acc));
    }
}

//! The optimization engine.
//!
//! Composes clustering, crew sizing, and routing into one synchronous
//! pipeline and wraps it in a defensive degradation policy. A run walks
//! the tiers in order until one produces a result:
//!
//! | Tier      | Entered when                  | `success` |
//! |-----------|-------------------------------|-----------|
//! | Main      | input validates               | true      |
//! | Fallback  | the main pass errors          | true      |
//! | Emergency | the fallback planner errors   | false     |
//!
//! Validation failures skip the chain entirely and reject the run.
//! Nothing escapes [`OptimizationEngine::optimize_schedule`] as an
//! error: every failure is folded into the returned result's
//! `fallback_reason` and `warnings`.
//!
//! All collaborators (environment advisors, the cluster strategy, the
//! fallback planner, the crew recommender) are injected at construction,
//! so tests can force any tier deterministically.
//!
//! # Modules
//! - [`fallback`]: the degraded planning strategies
//! - [`store`]: bounded run history and error log

pub mod fallback;
pub mod store;

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clustering::{ClusterStrategy, GeographicClusterer};
use crate::crew::{CrewSizeRecommender, HistoricalRecord};
use crate::environment::{
    CongestionTaxAdvisor, Environment, StaticTax, StaticTraffic, StaticWeather, TrafficAdvisor,
    WeatherAdvisor,
};
use crate::error::Result;
use crate::models::{Algorithm, Job, OptimizationResult, Team};
use crate::routing::RouteOptimizer;
use crate::validation::validate_input;
use fallback::{emergency_distribution, FallbackMode, FallbackPlanner, StandardFallback};
use store::{ErrorEntry, RunStore};

/// Crew-recommendation confidence below which a warning is emitted.
const LOW_CONFIDENCE: f64 = 70.0;

/// Weather multiplier above which safety-first mode warns.
const SAFETY_MULTIPLIER: f64 = 2.0;

/// Crew size assumed when nothing better is known.
const DEFAULT_CREW: u32 = 2;

/// Headcount assumed for teams with an empty roster.
const ASSUMED_ROSTER: usize = 6;

/// Synthetic history seeded into the crew model at startup.
const STARTUP_HISTORY: usize = 200;
const STARTUP_SEED: u64 = 42;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fetch weather data (soft-fails to advisory defaults).
    pub enable_weather_integration: bool,
    /// Fetch the congestion-tax schedule.
    pub enable_congestion_tax: bool,
    /// Use the crew-size model; off means roster-size crews.
    pub enable_ml_crew_sizing: bool,
    /// Advisory time budget (ms). Recorded for operators but not
    /// enforced as a hard timeout; a long VRP solve cannot be aborted.
    pub max_optimization_time_ms: u64,
    /// Which degraded strategy to try when the main pass fails.
    pub fallback_mode: FallbackMode,
    /// Warn loudly when the weather multiplier exceeds 2.0.
    pub safety_first: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_weather_integration: true,
            enable_congestion_tax: true,
            enable_ml_crew_sizing: true,
            max_optimization_time_ms: 30_000,
            fallback_mode: FallbackMode::Hybrid,
            safety_first: false,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables weather fetching.
    pub fn with_weather_integration(mut self, enabled: bool) -> Self {
        self.enable_weather_integration = enabled;
        self
    }

    /// Enables or disables congestion-tax fetching.
    pub fn with_congestion_tax(mut self, enabled: bool) -> Self {
        self.enable_congestion_tax = enabled;
        self
    }

    /// Enables or disables the crew-size model.
    pub fn with_ml_crew_sizing(mut self, enabled: bool) -> Self {
        self.enable_ml_crew_sizing = enabled;
        self
    }

    /// Sets the advisory time budget (ms).
    pub fn with_max_optimization_time_ms(mut self, ms: u64) -> Self {
        self.max_optimization_time_ms = ms;
        self
    }

    /// Sets the fallback strategy.
    pub fn with_fallback_mode(mut self, mode: FallbackMode) -> Self {
        self.fallback_mode = mode;
        self
    }

    /// Enables safety-first warnings.
    pub fn with_safety_first(mut self, enabled: bool) -> Self {
        self.safety_first = enabled;
        self
    }
}

/// Snapshot of engine health for the monitoring surface.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    /// Crew-model accuracy heuristic, 0..=1.
    pub model_accuracy: f64,
    /// Whether the latest weather fetch succeeded.
    pub weather_service_ok: bool,
    /// Optimization results retained in history.
    pub history_size: usize,
    /// Errors logged in the last 24 hours.
    pub errors_last_24h: usize,
}

/// The dispatch optimization engine.
pub struct OptimizationEngine {
    config: EngineConfig,
    weather: Box<dyn WeatherAdvisor>,
    traffic: Box<dyn TrafficAdvisor>,
    tax: Box<dyn CongestionTaxAdvisor>,
    clusterer: Box<dyn ClusterStrategy>,
    router: RouteOptimizer,
    recommender: Mutex<CrewSizeRecommender>,
    fallback: Box<dyn FallbackPlanner>,
    store: Mutex<RunStore>,
}

impl OptimizationEngine {
    /// Creates an engine with default collaborators: static advisors,
    /// the geographic clusterer, the standard fallback planner, and a
    /// crew model trained on synthetic startup history.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            weather: Box::new(StaticWeather::default()),
            traffic: Box::new(StaticTraffic::default()),
            tax: Box::new(StaticTax::default()),
            clusterer: Box::new(GeographicClusterer::new()),
            router: RouteOptimizer::new(),
            recommender: Mutex::new(CrewSizeRecommender::with_synthetic_history(
                STARTUP_HISTORY,
                STARTUP_SEED,
            )),
            fallback: Box::new(StandardFallback::new()),
            store: Mutex::new(RunStore::new()),
        }
    }

    /// Replaces the weather advisor.
    pub fn with_weather_advisor(mut self, advisor: impl WeatherAdvisor + 'static) -> Self {
        self.weather = Box::new(advisor);
        self
    }

    /// Replaces the traffic advisor.
    pub fn with_traffic_advisor(mut self, advisor: impl TrafficAdvisor + 'static) -> Self {
        self.traffic = Box::new(advisor);
        self
    }

    /// Replaces the congestion-tax advisor.
    pub fn with_tax_advisor(mut self, advisor: impl CongestionTaxAdvisor + 'static) -> Self {
        self.tax = Box::new(advisor);
        self
    }

    /// Replaces the cluster strategy.
    pub fn with_clusterer(mut self, clusterer: impl ClusterStrategy + 'static) -> Self {
        self.clusterer = Box::new(clusterer);
        self
    }

    /// Replaces the fallback planner.
    pub fn with_fallback_planner(mut self, planner: impl FallbackPlanner + 'static) -> Self {
        self.fallback = Box::new(planner);
        self
    }

    /// Replaces the crew-size recommender.
    pub fn with_recommender(mut self, recommender: CrewSizeRecommender) -> Self {
        self.recommender = Mutex::new(recommender);
        self
    }

    /// Runs one optimization pass over the day's jobs and teams.
    ///
    /// Never returns an error and never panics: validation failures
    /// produce a rejected result, pipeline failures enter the fallback
    /// chain, and the emergency tier always produces something.
    pub fn optimize_schedule(
        &self,
        jobs: &[Job],
        teams: &[Team],
        date: &str,
    ) -> OptimizationResult {
        let started = Instant::now();
        let run_id = format!("{date}-{}", Utc::now().timestamp_millis());

        let parsed = match validate_input(jobs, teams, date) {
            Ok(d) => d,
            Err(errors) => {
                warn!(issues = errors.len(), "input rejected");
                let mut result = OptimizationResult::new(Algorithm::Rejected, run_id);
                result.warnings = errors.into_iter().map(|e| e.message).collect();
                result.elapsed_ms = elapsed_ms(&started);
                return result;
            }
        };

        let (env, env_warnings) = self.fetch_environment(parsed);

        let mut result = match self.main_pass(jobs, teams, &env, &run_id) {
            Ok(mut result) => {
                result.success = true;
                result
            }
            Err(e) => {
                warn!(
                    error = %e,
                    mode = ?self.config.fallback_mode,
                    "main pass failed, entering fallback"
                );
                self.store()
                    .record_error("main", e.to_string(), jobs.len(), teams.len());
                self.run_fallback(jobs, teams, &e.to_string(), &run_id)
            }
        };

        result.weather = Some(env.weather.clone());
        let mut warnings = env_warnings;
        warnings.extend(env.weather.safety_warnings.clone());
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        result
            .recommendations
            .extend(env.weather.equipment_recommendations.clone());
        if self.config.safety_first && env.weather.difficulty_multiplier > SAFETY_MULTIPLIER {
            result.warnings.push(
                "Säkerhetsläge: extrema väderförhållanden, överväg att flytta jobb till annan dag"
                    .to_string(),
            );
        }

        result.aggregate_route_totals();
        result.elapsed_ms = elapsed_ms(&started);
        if result.success {
            self.store().record_result(result.clone());
        }
        info!(
            run = %result.run_id,
            algorithm = result.algorithm.label(),
            routes = result.routes.len(),
            efficiency = result.efficiency_score,
            elapsed_ms = result.elapsed_ms,
            "optimization run complete"
        );
        result
    }

    /// Re-plans the not-yet-visited tail of one delayed team's route.
    ///
    /// `current_job_index` is the number of stops already completed.
    /// Every other team's route is carried over unchanged.
    pub fn reoptimize_for_delay(
        &self,
        original: &OptimizationResult,
        teams: &[Team],
        team_id: &str,
        current_job_index: usize,
        delay_minutes: f64,
    ) -> OptimizationResult {
        let started = Instant::now();
        let mut result = original.clone();
        result.run_id = format!("{}-delay-{}", original.run_id, Utc::now().timestamp_millis());

        let Some(team) = teams.iter().find(|t| t.id == team_id) else {
            result
                .warnings
                .push(format!("Okänt team '{team_id}', ingen omplanering gjord"));
            result.elapsed_ms = elapsed_ms(&started);
            return result;
        };
        let Some(pos) = result.routes.iter().position(|r| r.team_id == team_id) else {
            result
                .warnings
                .push(format!("Team '{team_id}' har ingen rutt, ingen omplanering gjord"));
            result.elapsed_ms = elapsed_ms(&started);
            return result;
        };

        // Fresh environmental data for the rest of the day.
        let date = original
            .run_id
            .get(..10)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .unwrap_or_else(|| Utc::now().date_naive());
        let (env, env_warnings) = self.fetch_environment(date);

        match self.router.reoptimize_for_delay(
            &result.routes[pos],
            team,
            &env,
            current_job_index,
            delay_minutes,
        ) {
            Ok(outcome) => {
                for job in &outcome.dropped_jobs {
                    result
                        .warnings
                        .push(format!("Jobb '{}' fick strykas efter förseningen", job.id));
                }
                result.routes[pos] = outcome.route;
                result.warnings.push(format!(
                    "Rutt för team {team_id} omplanerad efter {delay_minutes:.0} min försening"
                ));
                info!(team = team_id, delay_minutes, "route re-planned after delay");
            }
            Err(e) => {
                warn!(error = %e, team = team_id, "re-planning failed, keeping original route");
                self.store()
                    .record_error("reoptimize", e.to_string(), result.total_jobs(), teams.len());
                result.warnings.push(format!(
                    "Omplanering misslyckades för team {team_id}, ursprunglig rutt behålls"
                ));
            }
        }

        result.warnings.extend(env_warnings);
        result.aggregate_route_totals();
        result.elapsed_ms = elapsed_ms(&started);
        self.store().record_result(result.clone());
        result
    }

    /// Appends an outcome record to the crew model's history.
    pub fn record_feedback(&self, record: HistoricalRecord) {
        self.recommender().update_with_feedback(record);
    }

    /// Retained optimization results, oldest first.
    pub fn history(&self) -> Vec<OptimizationResult> {
        self.store().history()
    }

    /// Retained error entries, oldest first.
    pub fn error_log(&self) -> Vec<ErrorEntry> {
        self.store().error_log()
    }

    /// Engine health snapshot.
    pub fn system_status(&self) -> SystemStatus {
        let store = self.store();
        SystemStatus {
            model_accuracy: self.recommender().model_accuracy(),
            weather_service_ok: store.weather_service_ok(),
            history_size: store.history_len(),
            errors_last_24h: store.errors_last_24h(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Cluster → crew-size → route → score.
    fn main_pass(
        &self,
        jobs: &[Job],
        teams: &[Team],
        env: &Environment,
        run_id: &str,
    ) -> Result<OptimizationResult> {
        let clustering = self.clusterer.cluster(jobs, env)?;

        // Round-robin clusters onto teams; a team may take several
        // clusters when clusters outnumber teams.
        let mut per_team: Vec<Vec<Job>> = vec![Vec::new(); teams.len()];
        for (i, cluster) in clustering.clusters.iter().enumerate() {
            per_team[i % teams.len()].extend(cluster.jobs.iter().cloned());
        }

        let mut result = OptimizationResult::new(Algorithm::DbscanVrpMl, run_id);
        let mut routing_weighted = 0.0;
        let mut routed_jobs = 0usize;

        for (team, team_jobs) in teams.iter().zip(&per_team) {
            if team_jobs.is_empty() {
                continue;
            }
            let crew = self.crew_size_for(team, team_jobs, env, &mut result.warnings);
            let outcome = self.router.solve(team_jobs, team, env)?;
            for job in &outcome.dropped_jobs {
                result.warnings.push(format!(
                    "Jobb '{}' rymdes inte i team {}s rutt och lämnades oplanerat",
                    job.id, team.id
                ));
            }
            let mut route = outcome.route;
            route.metrics.crew_size = crew;
            if !route.is_empty() {
                routing_weighted += outcome.score * route.len() as f64;
                routed_jobs += route.len();
                result.routes.push(route);
            }
        }

        let routing_score = if routed_jobs > 0 {
            routing_weighted / routed_jobs as f64
        } else {
            0.0
        };
        let blended = clustering.efficiency_score * 0.4 + routing_score * 0.6;
        let weather_penalty = (1.0 - (env.weather.difficulty_multiplier - 1.0) * 0.5).max(0.5);
        result.efficiency_score = (blended * weather_penalty).clamp(30.0, 100.0);

        if result.efficiency_score > 90.0 {
            result
                .warnings
                .push("Utmärkt optimering: effektivitet över 90".to_string());
        } else if result.efficiency_score >= 80.0 {
            result
                .warnings
                .push("God optimering: effektivitet 80-90".to_string());
        } else {
            result
                .warnings
                .push("Optimeringen nådde inte förväntad nivå".to_string());
            result.warnings.push(format!(
                "Låg effektivitet ({:.0}): överväg fler team eller färre jobb",
                result.efficiency_score
            ));
        }

        Ok(result)
    }

    /// Degraded planning: the configured tier, then emergency.
    fn run_fallback(
        &self,
        jobs: &[Job],
        teams: &[Team],
        main_error: &str,
        run_id: &str,
    ) -> OptimizationResult {
        match self.fallback.plan(self.config.fallback_mode, jobs, teams) {
            Ok(plan) => {
                let mut result = OptimizationResult::new(plan.algorithm, run_id);
                result.success = true;
                result.routes = plan.routes;
                result.efficiency_score = plan.efficiency_score;
                result.fallback_reason = Some(main_error.to_string());
                result.recommendations = plan.recommendations;
                result.warnings.push(format!(
                    "Reservplan användes: {}",
                    result.algorithm.label()
                ));
                for id in plan.unassigned {
                    result
                        .warnings
                        .push(format!("Jobb '{id}' kunde inte tilldelas något team"));
                }
                result
            }
            Err(fe) => {
                warn!(error = %fe, "fallback planner failed, entering emergency distribution");
                self.store()
                    .record_error("fallback", fe.to_string(), jobs.len(), teams.len());
                let mut result = OptimizationResult::new(Algorithm::Emergency, run_id);
                result.success = false;
                result.routes = emergency_distribution(jobs, teams);
                result.efficiency_score = 50.0;
                result.fallback_reason = Some(format!("{main_error}; därefter: {fe}"));
                result.warnings.push(
                    "Nödfördelning: jobben delades jämnt utan optimering, planen måste granskas manuellt"
                        .to_string(),
                );
                result
            }
        }
    }

    /// Crew size for one team's jobs, keyed on the hardest job.
    fn crew_size_for(
        &self,
        team: &Team,
        jobs: &[Job],
        env: &Environment,
        warnings: &mut Vec<String>,
    ) -> u32 {
        let roster = (team.headcount() as u32).max(DEFAULT_CREW);
        if !self.config.enable_ml_crew_sizing {
            return roster;
        }
        let Some(hardest) = jobs
            .iter()
            .max_by(|a, b| a.difficulty_score().total_cmp(&b.difficulty_score()))
        else {
            return DEFAULT_CREW;
        };

        // An empty roster means the crew pool is managed elsewhere.
        let cap = if team.headcount() == 0 {
            ASSUMED_ROSTER
        } else {
            team.headcount()
        };

        match self.recommender().recommend(hardest, &env.weather, cap) {
            Ok(rec) => {
                if rec.confidence < LOW_CONFIDENCE {
                    warnings.push(format!(
                        "Låg tillförlitlighet ({:.0}%) i bemanningsförslaget för team {}",
                        rec.confidence, team.id
                    ));
                }
                rec.size
            }
            Err(e) => {
                warn!(error = %e, team = %team.id, "crew recommender failed, using roster size");
                warnings.push(format!(
                    "Bemanningsmodellen fallerade för team {}, ordinarie bemanning används",
                    team.id
                ));
                roster
            }
        }
    }

    /// Fetches environmental data with soft-failure to advisory defaults.
    fn fetch_environment(&self, date: NaiveDate) -> (Environment, Vec<String>) {
        let mut env = Environment::advisory_default();
        let mut warnings = Vec::new();

        if self.config.enable_weather_integration {
            match self.weather.weather_for_date(date) {
                Ok(report) => {
                    self.store().set_weather_service_ok(true);
                    env.weather = report;
                }
                Err(e) => {
                    warn!(error = %e, "weather advisor failed, using advisory defaults");
                    self.store().set_weather_service_ok(false);
                    warnings
                        .push("Väderdata otillgänglig, antar normala förhållanden".to_string());
                }
            }
        }

        match self.traffic.traffic_for_date(date) {
            Ok(report) => env.traffic = report,
            Err(e) => {
                warn!(error = %e, "traffic advisor failed, using advisory defaults");
                warnings.push("Trafikdata otillgänglig, antar fritt flöde".to_string());
            }
        }

        if self.config.enable_congestion_tax {
            match self.tax.tax_for_date(date) {
                Ok(schedule) => env.congestion_tax = schedule,
                Err(e) => {
                    warn!(error = %e, "tax advisor failed, using advisory defaults");
                    warnings
                        .push("Trängselskattedata otillgänglig, skatten ignoreras".to_string());
                }
            }
        }

        (env, warnings)
    }

    fn store(&self) -> MutexGuard<'_, RunStore> {
        // A poisoned lock only means another run warned mid-append.
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn recommender(&self) -> MutexGuard<'_, CrewSizeRecommender> {
        self.recommender.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for OptimizationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn elapsed_ms(started: &Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::Clustering;
    use crate::environment::WeatherReport;
    use crate::error::OptimizeError;
    use crate::models::GeoPoint;
    use super::fallback::FallbackPlan;

    fn job(id: &str, lat: f64, lng: f64) -> Job {
        Job::new(id, GeoPoint::new(lat, lng))
            .with_volume(15.0)
            .with_estimated_hours(2.0)
    }

    fn teams(n: usize) -> Vec<Team> {
        (0..n)
            .map(|i| {
                Team::new(format!("T{i}"))
                    .with_capacity(120.0)
                    .with_available_hours(12.0)
            })
            .collect()
    }

    fn engine() -> OptimizationEngine {
        OptimizationEngine::new(EngineConfig::default())
    }

    struct FailingClusterer;

    impl ClusterStrategy for FailingClusterer {
        fn cluster(&self, _jobs: &[Job], _env: &Environment) -> Result<Clustering> {
            Err(OptimizeError::Clustering("inducerat fel".into()))
        }
    }

    struct FailingFallback;

    impl FallbackPlanner for FailingFallback {
        fn plan(
            &self,
            _mode: FallbackMode,
            _jobs: &[Job],
            _teams: &[Team],
        ) -> Result<FallbackPlan> {
            Err(OptimizeError::fallback("hybrid", "inducerat fel"))
        }
    }

    #[test]
    fn test_no_jobs_rejected() {
        let result = engine().optimize_schedule(&[], &teams(1), "2026-06-01");
        assert!(!result.success);
        assert_eq!(result.algorithm, Algorithm::Rejected);
        assert!(result.routes.is_empty());
        assert!(result.warnings.iter().any(|w| w == "Inga jobb att optimera"));
    }

    #[test]
    fn test_no_teams_rejected() {
        let jobs = vec![job("J1", 59.33, 18.07)];
        let result = engine().optimize_schedule(&jobs, &[], "2026-06-01");
        assert!(!result.success);
        assert!(result.warnings.iter().any(|w| w == "Inga tillgängliga team"));
    }

    #[test]
    fn test_bad_date_rejected_without_fallback() {
        let jobs = vec![job("J1", 59.33, 18.07)];
        let result = engine().optimize_schedule(&jobs, &teams(1), "next tuesday");
        assert_eq!(result.algorithm, Algorithm::Rejected);
        assert!(result.fallback_reason.is_none());
    }

    #[test]
    fn test_single_job_single_team() {
        let jobs = vec![job("J1", 59.33, 18.07)];
        let result = engine().optimize_schedule(&jobs, &teams(1), "2026-06-01");

        assert!(result.success);
        assert_eq!(result.algorithm, Algorithm::DbscanVrpMl);
        assert_eq!(result.routes.len(), 1);
        assert_eq!(result.routes[0].job_ids(), vec!["J1"]);
        assert!((30.0..=100.0).contains(&result.efficiency_score));
        assert!(result.weather.is_some());
        assert!(result.routes[0].metrics.crew_size >= 1);
    }

    #[test]
    fn test_main_pass_covers_every_job_once() {
        let jobs: Vec<Job> = (0..10)
            .map(|i| {
                job(
                    &format!("j{i}"),
                    59.30 + (i % 5) as f64 * 0.02,
                    18.00 + (i / 5) as f64 * 0.10,
                )
            })
            .collect();
        let result = engine().optimize_schedule(&jobs, &teams(3), "2026-06-01");

        assert!(result.success);
        assert_eq!(result.algorithm, Algorithm::DbscanVrpMl);
        let mut seen: Vec<&str> = result
            .routes
            .iter()
            .flat_map(|r| r.jobs.iter().map(|j| j.id.as_str()))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen.len(), 10, "a job was left unrouted");
        seen.dedup();
        assert_eq!(seen.len(), 10, "a job appeared in two routes");
    }

    #[test]
    fn test_fallback_carries_configured_label() {
        for (mode, algorithm) in [
            (FallbackMode::Simple, Algorithm::SimpleFallback),
            (FallbackMode::Manual, Algorithm::ManualFallback),
            (FallbackMode::Hybrid, Algorithm::HybridFallback),
        ] {
            let engine =
                OptimizationEngine::new(EngineConfig::default().with_fallback_mode(mode))
                    .with_clusterer(FailingClusterer);
            let jobs = vec![job("J1", 59.33, 18.07), job("J2", 59.34, 18.06)];
            let result = engine.optimize_schedule(&jobs, &teams(2), "2026-06-01");

            assert!(result.success);
            assert_eq!(result.algorithm, algorithm);
            assert!(result
                .fallback_reason
                .as_deref()
                .is_some_and(|r| r.contains("inducerat fel")));
        }
    }

    #[test]
    fn test_emergency_when_everything_fails() {
        let engine = engine()
            .with_clusterer(FailingClusterer)
            .with_fallback_planner(FailingFallback);
        let jobs: Vec<Job> = (0..7).map(|i| job(&format!("j{i}"), 59.33, 18.07)).collect();
        let result = engine.optimize_schedule(&jobs, &teams(3), "2026-06-01");

        assert!(!result.success);
        assert_eq!(result.algorithm, Algorithm::Emergency);
        assert_eq!(result.routes.len(), 3);
        // ⌈7/3⌉ = 3 jobs per chunk.
        assert!(result.routes.iter().all(|r| r.len() <= 3));
        assert_eq!(result.total_jobs(), 7);
        assert!(result.warnings.iter().any(|w| w.contains("Nödfördelning")));
        assert!(result.fallback_reason.is_some());
    }

    #[test]
    fn test_weather_soft_failure_warns_and_continues() {
        let engine = engine().with_weather_advisor(StaticWeather::failing());
        let jobs = vec![job("J1", 59.33, 18.07)];
        let result = engine.optimize_schedule(&jobs, &teams(1), "2026-06-01");

        assert!(result.success, "advisor failure must not fail the run");
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("Väderdata otillgänglig")));
        assert!(!engine.system_status().weather_service_ok);
    }

    #[test]
    fn test_bad_weather_penalizes_efficiency() {
        let jobs: Vec<Job> = (0..4)
            .map(|i| job(&format!("j{i}"), 59.33 + i as f64 * 0.002, 18.07))
            .collect();

        let calm_result = engine().optimize_schedule(&jobs, &teams(2), "2026-06-01");

        let mut storm = WeatherReport::advisory_default();
        storm.difficulty_multiplier = 1.8;
        let stormy_engine = engine().with_weather_advisor(StaticWeather::new(storm));
        let storm_result = stormy_engine.optimize_schedule(&jobs, &teams(2), "2026-06-01");

        assert!(storm_result.efficiency_score <= calm_result.efficiency_score);
        assert!(storm_result.efficiency_score >= 30.0);
    }

    #[test]
    fn test_safety_first_warns_in_extreme_weather() {
        let mut extreme = WeatherReport::advisory_default();
        extreme.difficulty_multiplier = 2.5;
        let engine = OptimizationEngine::new(EngineConfig::default().with_safety_first(true))
            .with_weather_advisor(StaticWeather::new(extreme));
        let jobs = vec![job("J1", 59.33, 18.07)];
        let result = engine.optimize_schedule(&jobs, &teams(1), "2026-06-01");

        assert!(result.warnings.iter().any(|w| w.contains("Säkerhetsläge")));
    }

    #[test]
    fn test_rule_based_model_triggers_low_confidence_warning() {
        // An untrained recommender reports 50% confidence, below the
        // 70% warning threshold.
        let engine = engine().with_recommender(CrewSizeRecommender::new());
        let jobs = vec![job("J1", 59.33, 18.07)];
        let result = engine.optimize_schedule(&jobs, &teams(1), "2026-06-01");

        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("Låg tillförlitlighet")));
    }

    #[test]
    fn test_ml_disabled_uses_roster_size() {
        let engine = OptimizationEngine::new(
            EngineConfig::default().with_ml_crew_sizing(false),
        );
        let jobs = vec![job("J1", 59.33, 18.07)];
        let result = engine.optimize_schedule(&jobs, &teams(1), "2026-06-01");
        // Empty roster falls back to the default crew of 2.
        assert_eq!(result.routes[0].metrics.crew_size, 2);
    }

    #[test]
    fn test_history_records_successful_runs_only() {
        let engine = engine();
        let jobs = vec![job("J1", 59.33, 18.07)];

        engine.optimize_schedule(&jobs, &teams(1), "2026-06-01");
        assert_eq!(engine.history().len(), 1);

        engine.optimize_schedule(&[], &teams(1), "2026-06-01");
        assert_eq!(engine.history().len(), 1, "rejected run must not enter history");
    }

    #[test]
    fn test_error_log_captures_main_failure() {
        let engine = engine().with_clusterer(FailingClusterer);
        let jobs = vec![job("J1", 59.33, 18.07)];
        engine.optimize_schedule(&jobs, &teams(1), "2026-06-01");

        let log = engine.error_log();
        assert!(!log.is_empty());
        assert_eq!(log[0].context, "main");
        assert!(log[0].message.contains("inducerat fel"));
        assert_eq!(log[0].job_count, 1);
        assert_eq!(engine.system_status().errors_last_24h, log.len());
    }

    #[test]
    fn test_reoptimize_only_touches_delayed_team() {
        // Two tight clusters far apart, one per team.
        let jobs = vec![
            job("a1", 59.3100, 18.0000),
            job("a2", 59.3110, 18.0010),
            job("a3", 59.3105, 18.0005),
            job("b1", 59.4100, 18.2000),
            job("b2", 59.4110, 18.2010),
            job("b3", 59.4105, 18.2005),
        ];
        let teams = teams(2);
        let engine = engine();
        let original = engine.optimize_schedule(&jobs, &teams, "2026-06-01");
        assert!(original.success);
        assert_eq!(original.routes.len(), 2);

        let delayed_id = original.routes[0].team_id.clone();
        let other_id = original.routes[1].team_id.clone();
        let redone = engine.reoptimize_for_delay(&original, &teams, &delayed_id, 1, 45.0);

        // The untouched team's route is byte-for-byte the original.
        assert_eq!(
            redone.route_for_team(&other_id),
            original.route_for_team(&other_id)
        );
        // The delayed team resumes after its first completed stop.
        let completed = &original.route_for_team(&delayed_id).unwrap().jobs[0].id;
        let redone_route = redone.route_for_team(&delayed_id).unwrap();
        assert_eq!(redone_route.len(), 2);
        assert!(!redone_route.jobs.iter().any(|j| &j.id == completed));
    }

    #[test]
    fn test_reoptimize_unknown_team_keeps_plan() {
        let jobs = vec![job("J1", 59.33, 18.07)];
        let teams = teams(1);
        let engine = engine();
        let original = engine.optimize_schedule(&jobs, &teams, "2026-06-01");

        let redone = engine.reoptimize_for_delay(&original, &teams, "ghost", 0, 30.0);
        assert_eq!(redone.routes, original.routes);
        assert!(redone.warnings.iter().any(|w| w.contains("Okänt team")));
    }

    #[test]
    fn test_run_id_carries_planning_date() {
        let jobs = vec![job("J1", 59.33, 18.07)];
        let result = engine().optimize_schedule(&jobs, &teams(1), "2026-06-01");
        assert!(result.run_id.starts_with("2026-06-01-"));
    }

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert!(config.enable_weather_integration);
        assert!(config.enable_congestion_tax);
        assert!(config.enable_ml_crew_sizing);
        assert_eq!(config.fallback_mode, FallbackMode::Hybrid);
        assert!(!config.safety_first);
    }
}

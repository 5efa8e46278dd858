//! Moving-day dispatch optimization.
//!
//! Assigns a day's moving jobs to available crews/vehicles and produces
//! per-team routes with cost, duration, and efficiency estimates. The
//! pipeline is: partition jobs geographically, recommend a crew size per
//! team, solve a small vehicle-routing problem per team, then blend the
//! partial scores into one result. A multi-tier fallback policy keeps
//! the engine producing dispatchable plans under partial failure.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Job`, `Team`, `Cluster`, `Route`,
//!   `OptimizationResult`, geographic primitives
//! - **`environment`**: Weather/traffic/congestion-tax advisor traits
//!   and their data contracts
//! - **`validation`**: Input integrity checks (empty inputs, dates,
//!   coordinates, duplicate IDs)
//! - **`clustering`**: Density-based geographic clustering with an
//!   environment-adjusted radius
//! - **`crew`**: Crew-size recommendation from a bagged decision-tree
//!   ensemble with a rule-based fallback
//! - **`routing`**: Nearest-neighbor + 2-opt route construction under
//!   capacity and time-window constraints
//! - **`engine`**: The orchestrating [`OptimizationEngine`], fallback
//!   tiers, and the bounded run store
//!
//! # Example
//!
//! ```
//! use move_optim::{EngineConfig, GeoPoint, Job, OptimizationEngine, Team};
//!
//! let engine = OptimizationEngine::new(EngineConfig::default());
//! let jobs = vec![
//!     Job::new("J1", GeoPoint::new(59.3326, 18.0649))
//!         .with_volume(22.0)
//!         .with_estimated_hours(3.0),
//!     Job::new("J2", GeoPoint::new(59.3350, 18.0710))
//!         .with_volume(14.0)
//!         .with_estimated_hours(2.0),
//! ];
//! let teams = vec![Team::new("T1").with_capacity(50.0)];
//!
//! let result = engine.optimize_schedule(&jobs, &teams, "2026-06-01");
//! assert!(result.success);
//! assert_eq!(result.total_jobs(), 2);
//! ```
//!
//! # References
//!
//! - Ester et al. (1996), "A Density-Based Algorithm for Discovering
//!   Clusters in Large Spatial Databases with Noise"
//! - Croes (1958), "A Method for Solving Traveling-Salesman Problems"
//! - Breiman (1996), "Bagging Predictors"

pub mod clustering;
pub mod crew;
pub mod engine;
pub mod environment;
pub mod error;
pub mod models;
pub mod routing;
pub mod validation;

pub use clustering::{ClusterStrategy, Clustering, GeographicClusterer};
pub use crew::{CrewRecommendation, CrewSizeRecommender, HistoricalRecord};
pub use engine::fallback::{FallbackMode, FallbackPlan, FallbackPlanner};
pub use engine::{EngineConfig, OptimizationEngine, SystemStatus};
pub use environment::{
    CongestionTaxAdvisor, CongestionTaxSchedule, Environment, TaxZone, TrafficAdvisor,
    TrafficReport, WeatherAdvisor, WeatherReport,
};
pub use error::{OptimizeError, Result};
pub use models::{
    Algorithm, Cluster, GeoPoint, Job, JobWindow, OptimizationResult, Route, RouteMetrics,
    SkillLevel, Team, TeamMember, VehicleClass,
};
pub use routing::{RouteOptimizer, RoutingOutcome};

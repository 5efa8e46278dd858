//! Dispatch-planning domain models.
//!
//! Core data types for one day's moving-job optimization: the immutable
//! inputs (`Job`, `Team`), the transient derivations (`Cluster`), and
//! the outputs (`Route`, `OptimizationResult`).
//!
//! # Domain Mappings
//!
//! | move-optim | VRP literature | Dispatch board |
//! |------------|----------------|----------------|
//! | Job | Customer/Demand | Booked move |
//! | Team | Vehicle | Crew + truck |
//! | Cluster | — | District batch |
//! | Route | Tour | Day plan per crew |

mod cluster;
mod geo;
mod job;
mod result;
mod route;
mod team;

pub use cluster::Cluster;
pub use geo::{degrees_to_km, GeoPoint, KM_PER_DEGREE};
pub use job::{Job, JobWindow};
pub use result::{Algorithm, OptimizationResult};
pub use route::{Route, RouteMetrics};
pub use team::{SkillLevel, Team, TeamMember, VehicleClass};

//! Input validation for optimization runs.
//!
//! Checks structural integrity of jobs, teams, and the planning date
//! before any optimization is attempted. Validation failures are
//! terminal: the engine rejects the run outright and no fallback tier
//! is entered. Detects:
//! - Empty job or team lists
//! - Unparseable planning dates
//! - Jobs with non-finite coordinates
//! - Duplicate job/team IDs
//! - Non-positive job volumes

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::models::{Job, Team};

/// Validation result: the parsed planning date, or all detected issues.
pub type ValidationResult = Result<NaiveDate, Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// No jobs were submitted.
    NoJobs,
    /// No teams are available.
    NoTeams,
    /// The planning date could not be parsed.
    InvalidDate,
    /// A job's coordinates are not finite numbers.
    MissingCoordinates,
    /// Two jobs or two teams share an ID.
    DuplicateId,
    /// A job has zero or negative volume.
    NonPositiveVolume,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Date format accepted for planning dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validates the input of an optimization run.
///
/// Checks:
/// 1. At least one job and at least one team
/// 2. The planning date parses as `YYYY-MM-DD`
/// 3. Every job has finite coordinates
/// 4. No duplicate job or team IDs
/// 5. Every job has positive volume
///
/// # Returns
/// The parsed date if all checks pass, `Err(errors)` with all detected
/// issues otherwise.
pub fn validate_input(jobs: &[Job], teams: &[Team], date: &str) -> ValidationResult {
    let mut errors = Vec::new();

    if jobs.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoJobs,
            "Inga jobb att optimera",
        ));
    }
    if teams.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoTeams,
            "Inga tillgängliga team",
        ));
    }

    let parsed = match NaiveDate::parse_from_str(date, DATE_FORMAT) {
        Ok(d) => Some(d),
        Err(_) => {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDate,
                format!("Ogiltigt datum: '{date}' (förväntat YYYY-MM-DD)"),
            ));
            None
        }
    };

    let mut job_ids = HashSet::new();
    for job in jobs {
        if !job_ids.insert(job.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate job ID: {}", job.id),
            ));
        }
        if !job.location.lat.is_finite() || !job.location.lng.is_finite() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingCoordinates,
                format!("Job '{}' saknar giltiga koordinater", job.id),
            ));
        }
        if job.volume_m3 <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveVolume,
                format!("Job '{}' has non-positive volume {}", job.id, job.volume_m3),
            ));
        }
    }

    let mut team_ids = HashSet::new();
    for team in teams {
        if !team_ids.insert(team.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate team ID: {}", team.id),
            ));
        }
    }

    match (errors.is_empty(), parsed) {
        (true, Some(d)) => Ok(d),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;

    fn sample_job(id: &str) -> Job {
        Job::new(id, GeoPoint::new(59.33, 18.07)).with_volume(20.0)
    }

    fn sample_team(id: &str) -> Team {
        Team::new(id).with_capacity(40.0)
    }

    #[test]
    fn test_valid_input() {
        let jobs = vec![sample_job("J1"), sample_job("J2")];
        let teams = vec![sample_team("T1")];
        let date = validate_input(&jobs, &teams, "2026-06-01").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
    }

    #[test]
    fn test_no_jobs() {
        let errors = validate_input(&[], &[sample_team("T1")], "2026-06-01").unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::NoJobs && e.message == "Inga jobb att optimera"));
    }

    #[test]
    fn test_no_teams() {
        let errors = validate_input(&[sample_job("J1")], &[], "2026-06-01").unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::NoTeams));
    }

    #[test]
    fn test_invalid_date() {
        let errors =
            validate_input(&[sample_job("J1")], &[sample_team("T1")], "june 1st").unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidDate));
    }

    #[test]
    fn test_non_finite_coordinates() {
        let mut job = sample_job("J1");
        job.location = GeoPoint::new(f64::NAN, 18.07);
        let errors = validate_input(&[job], &[sample_team("T1")], "2026-06-01").unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::MissingCoordinates));
    }

    #[test]
    fn test_duplicate_job_id() {
        let jobs = vec![sample_job("J1"), sample_job("J1")];
        let errors = validate_input(&jobs, &[sample_team("T1")], "2026-06-01").unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_non_positive_volume() {
        let job = Job::new("J1", GeoPoint::new(59.33, 18.07));
        let errors = validate_input(&[job], &[sample_team("T1")], "2026-06-01").unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::NonPositiveVolume));
    }

    #[test]
    fn test_multiple_errors_collected() {
        let errors = validate_input(&[], &[], "not-a-date").unwrap_err();
        assert!(errors.len() >= 3);
    }
}

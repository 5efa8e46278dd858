//! Crew/vehicle team model.
//!
//! A team is one vehicle plus its crew roster for the planning day.
//! Teams are read-only inputs to an optimization run; the engine never
//! mutates a team, it only assigns a route to it.

use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// Overall proficiency classification of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    /// First-season movers.
    Junior,
    /// Standard crew.
    Standard,
    /// Experienced crew, trusted with pianos and antiques.
    Senior,
}

/// Vehicle classification, which bounds what a team can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleClass {
    /// Van, up to ~20 m³.
    Van,
    /// Light truck, up to ~35 m³.
    LightTruck,
    /// Heavy truck with lift, 50+ m³.
    HeavyTruck,
}

/// A single crew member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Member name or employee id.
    pub name: String,
    /// Individual proficiency.
    pub skill: SkillLevel,
    /// Years of moving experience.
    pub experience_years: f64,
}

impl TeamMember {
    /// Creates a crew member.
    pub fn new(name: impl Into<String>, skill: SkillLevel, experience_years: f64) -> Self {
        Self {
            name: name.into(),
            skill,
            experience_years,
        }
    }
}

/// A crew/vehicle team available on the planning day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Unique team identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Crew roster.
    pub members: Vec<TeamMember>,
    /// Vehicle load capacity in cubic meters.
    pub capacity_m3: f64,
    /// Working hours available on the planning day.
    pub available_hours: f64,
    /// Overall team proficiency.
    pub skill_level: SkillLevel,
    /// Vehicle classification.
    pub vehicle: VehicleClass,
    /// Current vehicle position, if known (defaults to the depot).
    pub current_location: Option<GeoPoint>,
}

impl Team {
    /// Creates a team with standard defaults.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            members: Vec::new(),
            capacity_m3: 35.0,
            available_hours: 8.0,
            skill_level: SkillLevel::Standard,
            vehicle: VehicleClass::LightTruck,
            current_location: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a crew member.
    pub fn with_member(mut self, member: TeamMember) -> Self {
        self.members.push(member);
        self
    }

    /// Sets the vehicle capacity (m³).
    pub fn with_capacity(mut self, capacity_m3: f64) -> Self {
        self.capacity_m3 = capacity_m3;
        self
    }

    /// Sets the available working hours.
    pub fn with_available_hours(mut self, hours: f64) -> Self {
        self.available_hours = hours;
        self
    }

    /// Sets the overall skill level.
    pub fn with_skill_level(mut self, level: SkillLevel) -> Self {
        self.skill_level = level;
        self
    }

    /// Sets the vehicle class.
    pub fn with_vehicle(mut self, vehicle: VehicleClass) -> Self {
        self.vehicle = vehicle;
        self
    }

    /// Sets the current vehicle position.
    pub fn with_current_location(mut self, location: GeoPoint) -> Self {
        self.current_location = Some(location);
        self
    }

    /// Number of crew members on the roster.
    pub fn headcount(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_builder() {
        let team = Team::new("T1")
            .with_name("Norrort 1")
            .with_member(TeamMember::new("AL", SkillLevel::Senior, 8.0))
            .with_member(TeamMember::new("BK", SkillLevel::Junior, 0.5))
            .with_capacity(50.0)
            .with_available_hours(9.0)
            .with_skill_level(SkillLevel::Senior)
            .with_vehicle(VehicleClass::HeavyTruck)
            .with_current_location(GeoPoint::new(59.33, 18.07));

        assert_eq!(team.id, "T1");
        assert_eq!(team.headcount(), 2);
        assert_eq!(team.vehicle, VehicleClass::HeavyTruck);
        assert!(team.current_location.is_some());
    }

    #[test]
    fn test_team_defaults() {
        let team = Team::new("T1");
        assert_eq!(team.headcount(), 0);
        assert!((team.capacity_m3 - 35.0).abs() < 1e-10);
        assert!((team.available_hours - 8.0).abs() < 1e-10);
        assert_eq!(team.skill_level, SkillLevel::Standard);
    }
}

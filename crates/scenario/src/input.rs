use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DisasterType {
    Earthquake,
    Hurricane,
    Flood,
    Wildfire,
    Tornado,
    Tsunami,
}

impl DisasterType {
    pub const ALL: [DisasterType; 6] = [
        DisasterType::Earthquake,
        DisasterType::Hurricane,
        DisasterType::Flood,
        DisasterType::Wildfire,
        DisasterType::Tornado,
        DisasterType::Tsunami,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisasterType::Earthquake => "earthquake",
            DisasterType::Hurricane => "hurricane",
            DisasterType::Flood => "flood",
            DisasterType::Wildfire => "wildfire",
            DisasterType::Tornado => "tornado",
            DisasterType::Tsunami => "tsunami",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for DisasterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub state: String,
    pub country: String,
    pub population: i64,
}

/// Incoming disaster description, exactly as submitted by a caller.
///
/// Counts are signed so that negative values reach [`ScenarioInput::validate`]
/// and are reported per field instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioInput {
    pub disaster_type: DisasterType,
    pub severity: Severity,
    pub location: Location,
    pub affected_area_km2: f64,
    pub estimated_casualties: i64,
    pub infrastructure_damage: String,
    pub weather_conditions: String,
    pub available_volunteers: i64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ScenarioInput {
    /// Check every range constraint and report all violations at once.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        let loc = &self.location;

        if !(-90.0..=90.0).contains(&loc.latitude) {
            errors.push(FieldError {
                field: "location.latitude",
                message: format!("must be between -90 and 90, got {}", loc.latitude),
            });
        }
        if !(-180.0..=180.0).contains(&loc.longitude) {
            errors.push(FieldError {
                field: "location.longitude",
                message: format!("must be between -180 and 180, got {}", loc.longitude),
            });
        }
        if loc.population <= 0 {
            errors.push(FieldError {
                field: "location.population",
                message: format!("must be greater than 0, got {}", loc.population),
            });
        }
        // NaN fails this comparison too
        if !(self.affected_area_km2 > 0.0 && self.affected_area_km2.is_finite()) {
            errors.push(FieldError {
                field: "affected_area_km2",
                message: format!("must be greater than 0, got {}", self.affected_area_km2),
            });
        }
        if self.estimated_casualties < 0 {
            errors.push(FieldError {
                field: "estimated_casualties",
                message: format!("must not be negative, got {}", self.estimated_casualties),
            });
        }
        if self.available_volunteers < 0 {
            errors.push(FieldError {
                field: "available_volunteers",
                message: format!("must not be negative, got {}", self.available_volunteers),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn los_angeles() -> ScenarioInput {
        ScenarioInput {
            disaster_type: DisasterType::Earthquake,
            severity: Severity::High,
            location: Location {
                latitude: 34.0522,
                longitude: -118.2437,
                city: "Los Angeles".to_string(),
                state: "California".to_string(),
                country: "United States".to_string(),
                population: 3979576,
            },
            affected_area_km2: 150.5,
            estimated_casualties: 2500,
            infrastructure_damage: "Significant damage to buildings and roads".to_string(),
            weather_conditions: "Clear skies, moderate temperatures".to_string(),
            available_volunteers: 1500,
            description: "A 7.2 magnitude earthquake has struck Los Angeles".to_string(),
        }
    }

    #[test]
    fn test_valid_scenario_passes() {
        assert!(los_angeles().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        let mut scenario = los_angeles();
        scenario.location.latitude = 999.0;

        let errors = scenario.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "location.latitude");
    }

    #[test]
    fn test_negative_population_and_area_rejected() {
        let mut scenario = los_angeles();
        scenario.location.population = -1;
        scenario.affected_area_km2 = -1.0;

        let fields: Vec<_> = scenario.validate().unwrap_err().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["location.population", "affected_area_km2"]);
    }

    #[test]
    fn test_zero_counts_are_allowed() {
        let mut scenario = los_angeles();
        scenario.estimated_casualties = 0;
        scenario.available_volunteers = 0;
        assert!(scenario.validate().is_ok());

        scenario.location.population = 0;
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_enums_use_lowercase_names() {
        let json = serde_json::to_value(&los_angeles()).unwrap();
        assert_eq!(json["disaster_type"], "earthquake");
        assert_eq!(json["severity"], "high");

        let bad = json.to_string().replace("earthquake", "meteor");
        assert!(serde_json::from_str::<ScenarioInput>(&bad).is_err());
        assert_eq!(DisasterType::parse("tsunami"), Some(DisasterType::Tsunami));
        assert_eq!(Severity::parse("extreme"), None);
    }
}

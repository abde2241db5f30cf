use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who a profile belongs to. Doctors manage patients; patients only see
/// their own record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Patient,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Doctor => write!(f, "doctor"),
            Role::Patient => write!(f, "patient"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            _ => Err(format!(
                "Invalid role '{}'. Valid options: doctor, patient",
                s
            )),
        }
    }
}

/// Patient gender as stored in the `patients.gender` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
            Gender::Other => write!(f, "other"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(format!(
                "Invalid gender '{}'. Valid options: male, female, other",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("doctor").unwrap(), Role::Doctor);
        assert_eq!(Role::from_str("PATIENT").unwrap(), Role::Patient);
        assert!(Role::from_str("nurse").is_err());
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Doctor).unwrap(), "\"doctor\"");
        let parsed: Role = serde_json::from_str("\"patient\"").unwrap();
        assert_eq!(parsed, Role::Patient);
    }

    #[test]
    fn test_gender_from_str() {
        assert_eq!(Gender::from_str("Female").unwrap(), Gender::Female);
        assert!(Gender::from_str("").is_err());
        assert_eq!(format!("{}", Gender::Other), "other");
    }
}

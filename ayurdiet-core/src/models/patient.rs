use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::profile::Profile;
use super::role::Gender;
use super::Record;

/// Clinical record for one patient, one row of `patients` with the
/// patient-user profile embedded as `profile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub doctor_id: Option<Uuid>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub weight: Option<f64>, // kg
    #[serde(default)]
    pub height: Option<f64>, // cm
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub constitution: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub emergency_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

impl Record for Patient {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Patient {
    /// Display name from the linked profile, if the row has one.
    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .map(|p| p.full_name.as_str())
            .unwrap_or("Unknown")
    }
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.display_name();
        writeln!(f, "{}", name)?;
        writeln!(f, "{}", "=".repeat(name.len()))?;
        writeln!(f, "ID: {}", self.id)?;

        if let Some(age) = self.age {
            writeln!(f, "Age: {}", age)?;
        }
        if let Some(gender) = self.gender {
            writeln!(f, "Gender: {}", gender)?;
        }
        if let Some(weight) = self.weight {
            writeln!(f, "Weight: {} kg", weight)?;
        }
        if let Some(height) = self.height {
            writeln!(f, "Height: {} cm", height)?;
        }
        match self.bmi {
            Some(bmi) => writeln!(f, "BMI: {}", bmi)?,
            None => writeln!(f, "BMI: Not calculated")?,
        }

        let fields = [
            ("Blood group", &self.blood_group),
            ("Constitution", &self.constitution),
            ("Allergies", &self.allergies),
            ("Medical history", &self.medical_history),
            ("Occupation", &self.occupation),
            ("Address", &self.address),
            ("Emergency contact", &self.emergency_contact),
            ("Emergency phone", &self.emergency_phone),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                writeln!(f, "{}: {}", label, value)?;
            }
        }

        writeln!(f, "Last updated: {}", self.updated_at.format("%Y-%m-%d"))?;
        Ok(())
    }
}

/// Body mass index from kilograms and centimetres, rounded to one decimal.
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let metres = height_cm / 100.0;
    let bmi = weight_kg / (metres * metres);
    Some((bmi * 10.0).round() / 10.0)
}

/// A patient record that has not been stored yet. The remote store assigns
/// `id` and the timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constitution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_phone: Option<String>,
}

impl NewPatient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_doctor_id(mut self, doctor_id: Uuid) -> Self {
        self.doctor_id = Some(doctor_id);
        self
    }

    pub fn with_age(mut self, age: i32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    /// Sets weight (kg) and height (cm).
    pub fn with_measurements(mut self, weight: f64, height: f64) -> Self {
        self.weight = Some(weight);
        self.height = Some(height);
        self
    }

    /// Fills in `bmi` from weight and height when the caller left it empty.
    pub(crate) fn derive_bmi(&mut self) {
        if self.bmi.is_none() {
            if let (Some(weight), Some(height)) = (self.weight, self.height) {
                self.bmi = compute_bmi(weight, height);
            }
        }
    }
}

/// Partial set of patient fields. Only the fields that are `Some` are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constitution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_phone: Option<String>,
}

impl PatientUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fills in `bmi` when both measurements change together.
    pub(crate) fn derive_bmi(&mut self) {
        if self.bmi.is_none() {
            if let (Some(weight), Some(height)) = (self.weight, self.height) {
                self.bmi = compute_bmi(weight, height);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_compute_bmi() {
        assert_eq!(compute_bmi(65.0, 170.0), Some(22.5));
        assert_eq!(compute_bmi(80.0, 180.0), Some(24.7));
        assert_eq!(compute_bmi(65.0, 0.0), None);
        assert_eq!(compute_bmi(-1.0, 170.0), None);
    }

    #[test]
    fn test_new_patient_derives_bmi() {
        let mut draft = NewPatient::new().with_measurements(65.0, 170.0);
        draft.derive_bmi();
        assert_eq!(draft.bmi, Some(22.5));

        let mut explicit = NewPatient::new().with_measurements(65.0, 170.0);
        explicit.bmi = Some(21.0);
        explicit.derive_bmi();
        assert_eq!(explicit.bmi, Some(21.0));
    }

    #[test]
    fn test_new_patient_omits_unset_fields() {
        let draft = NewPatient::new().with_age(34).with_gender(Gender::Female);
        let value = serde_json::to_value(&draft).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 2);
        assert_eq!(object["age"], 34);
        assert_eq!(object["gender"], "female");
        assert!(!object.contains_key("doctor_id"));
    }

    #[test]
    fn test_update_is_empty() {
        assert!(PatientUpdate::default().is_empty());
        let update = PatientUpdate {
            allergies: Some("Peanuts".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_patient_with_embedded_profile() {
        let json = r#"{
            "id": "0b7c1c52-6a4e-4f5e-b2f2-7d1f7f0c3a11",
            "user_id": "5a0e8b1e-2f0b-4c7e-8e0a-0c4f7d5c9b22",
            "doctor_id": "6f1c1f4e-8d3a-4d0e-9d55-1f3c2b7a9e10",
            "age": 34,
            "gender": "female",
            "weight": 58.5,
            "height": 162,
            "bmi": null,
            "constitution": "Vata-Pitta",
            "created_at": "2024-01-15T10:00:00Z",
            "updated_at": "2024-02-01T09:30:00Z",
            "profile": {
                "id": "5a0e8b1e-2f0b-4c7e-8e0a-0c4f7d5c9b22",
                "email": "priya@example.com",
                "full_name": "Priya Sharma",
                "role": "patient",
                "created_at": "2024-01-15T10:00:00Z",
                "updated_at": "2024-01-15T10:00:00Z"
            }
        }"#;

        let patient: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(patient.display_name(), "Priya Sharma");
        assert_eq!(patient.gender, Some(Gender::Female));
        assert_eq!(patient.height, Some(162.0));
        assert_eq!(patient.profile.as_ref().unwrap().role, Role::Patient);
        assert!(patient.allergies.is_none());
    }

    #[test]
    fn test_patient_display() {
        let json = r#"{
            "id": "0b7c1c52-6a4e-4f5e-b2f2-7d1f7f0c3a11",
            "age": 41,
            "constitution": "Kapha",
            "created_at": "2024-01-15T10:00:00Z",
            "updated_at": "2024-02-01T09:30:00Z"
        }"#;
        let patient: Patient = serde_json::from_str(json).unwrap();

        let output = format!("{}", patient);
        assert!(output.contains("Unknown"));
        assert!(output.contains("Age: 41"));
        assert!(output.contains("Constitution: Kapha"));
        assert!(output.contains("BMI: Not calculated"));
        assert!(output.contains("Last updated: 2024-02-01"));
    }
}

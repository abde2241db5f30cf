use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::category::FoodCategory;
use super::dosha::DoshaEffect;
use super::Record;

/// Reference nutrition and dosha record, one row of `food_items`.
///
/// Macro-nutrients are per 100 g. Rows are never physically removed; a
/// deleted item has `is_active = false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodItem {
    pub id: Uuid,
    pub name: String,
    pub category: FoodCategory,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub dosha_effect: DoshaEffect,
    #[serde(default)]
    pub rasa: Option<String>,
    #[serde(default)]
    pub virya: Option<String>,
    #[serde(default)]
    pub vipaka: Option<String>,
    #[serde(default)]
    pub properties: Option<Vec<String>>,
    #[serde(default)]
    pub ayurvedic_note: Option<String>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for FoodItem {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for FoodItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "Category: {}", self.category)?;
        writeln!(f, "Dosha effect: {}", self.dosha_effect)?;
        writeln!(
            f,
            "Per 100g: {} kcal, protein {} g, carbs {} g, fat {} g, fiber {} g",
            self.calories, self.protein, self.carbs, self.fat, self.fiber
        )?;

        let qualities: Vec<String> = [
            self.rasa.as_ref().map(|r| format!("rasa: {}", r)),
            self.virya.as_ref().map(|v| format!("virya: {}", v)),
            self.vipaka.as_ref().map(|v| format!("vipaka: {}", v)),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !qualities.is_empty() {
            writeln!(f, "Qualities: {}", qualities.join(", "))?;
        }

        if let Some(properties) = &self.properties {
            if !properties.is_empty() {
                writeln!(f, "Properties: {}", properties.join(", "))?;
            }
        }

        if let Some(note) = &self.ayurvedic_note {
            writeln!(f, "\nNote:\n{}", note)?;
        }

        Ok(())
    }
}

/// A food item that has not been stored yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewFoodItem {
    pub name: String,
    pub category: FoodCategory,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub dosha_effect: DoshaEffect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rasa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virya: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vipaka: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ayurvedic_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
    pub is_active: bool,
}

impl NewFoodItem {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<FoodCategory>,
        dosha_effect: DoshaEffect,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            fiber: 0.0,
            dosha_effect,
            rasa: None,
            virya: None,
            vipaka: None,
            properties: None,
            ayurvedic_note: None,
            created_by: None,
            is_active: true,
        }
    }

    /// Sets calories, protein, carbs, fat and fiber, in that order.
    pub fn with_macros(mut self, calories: f64, protein: f64, carbs: f64, fat: f64, fiber: f64) -> Self {
        self.calories = calories;
        self.protein = protein;
        self.carbs = carbs;
        self.fat = fat;
        self.fiber = fiber;
        self
    }

    pub fn with_properties(mut self, properties: Vec<String>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.ayurvedic_note = Some(note.into());
        self
    }

    pub fn with_created_by(mut self, created_by: Uuid) -> Self {
        self.created_by = Some(created_by);
        self
    }

    /// Returns the name of the first macro-nutrient that is negative or not
    /// a finite number, if any.
    pub fn invalid_macro(&self) -> Option<&'static str> {
        invalid_macro([
            ("calories", Some(self.calories)),
            ("protein", Some(self.protein)),
            ("carbs", Some(self.carbs)),
            ("fat", Some(self.fat)),
            ("fiber", Some(self.fiber)),
        ])
    }
}

/// Partial set of food item fields. Only the fields that are `Some` are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FoodItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<FoodCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosha_effect: Option<DoshaEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rasa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virya: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vipaka: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ayurvedic_note: Option<String>,
}

impl FoodItemUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn invalid_macro(&self) -> Option<&'static str> {
        invalid_macro([
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
            ("fiber", self.fiber),
        ])
    }
}

/// NaN and infinities serialize as `null`, which the column rejects on read.
fn invalid_macro(values: [(&'static str, Option<f64>); 5]) -> Option<&'static str> {
    values
        .into_iter()
        .find(|(_, value)| value.is_some_and(|v| !v.is_finite() || v < 0.0))
        .map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ginger_row() -> &'static str {
        r#"{
            "id": "9d2f3b5c-1a2b-4c3d-8e9f-0a1b2c3d4e5f",
            "name": "Ginger",
            "category": "Spices",
            "calories": 80,
            "protein": 1.8,
            "carbs": 18,
            "fat": 0.8,
            "fiber": 2,
            "dosha_effect": "Vata+",
            "rasa": "Pungent",
            "virya": "Hot",
            "vipaka": "Sweet",
            "properties": ["digestive", "warming"],
            "ayurvedic_note": null,
            "is_active": true,
            "created_at": "2024-01-15T10:00:00Z",
            "updated_at": "2024-01-15T10:00:00Z"
        }"#
    }

    #[test]
    fn test_food_item_from_row() {
        let item: FoodItem = serde_json::from_str(ginger_row()).unwrap();
        assert_eq!(item.name, "Ginger");
        assert_eq!(item.category, FoodCategory::Spices);
        assert_eq!(item.dosha_effect, DoshaEffect::VataIncreasing);
        assert_eq!(item.calories, 80.0);
        assert_eq!(item.properties.as_ref().unwrap().len(), 2);
        assert!(item.created_by.is_none());
        assert!(item.is_active);
    }

    #[test]
    fn test_food_item_display() {
        let item: FoodItem = serde_json::from_str(ginger_row()).unwrap();
        let output = format!("{}", item);
        assert!(output.contains("Category: Spices"));
        assert!(output.contains("Dosha effect: Vata+"));
        assert!(output.contains("rasa: Pungent, virya: Hot, vipaka: Sweet"));
        assert!(output.contains("Properties: digestive, warming"));
    }

    #[test]
    fn test_new_food_item_defaults_active() {
        let draft = NewFoodItem::new("Basmati Rice", FoodCategory::Grains, DoshaEffect::Tridoshic)
            .with_macros(130.0, 2.7, 28.0, 0.3, 0.4);
        let value = serde_json::to_value(&draft).unwrap();

        assert_eq!(value["is_active"], true);
        assert_eq!(value["category"], "Grains");
        assert_eq!(value["dosha_effect"], "Tridoshic");
        assert!(value.get("rasa").is_none());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_new_food_item_builders() {
        let author = Uuid::new_v4();
        let draft = NewFoodItem::new("Ginger", "Spices", DoshaEffect::VataIncreasing)
            .with_properties(vec!["warming".to_string(), "digestive".to_string()])
            .with_note("Fresh ginger before meals kindles agni.")
            .with_created_by(author);
        let value = serde_json::to_value(&draft).unwrap();

        assert_eq!(value["properties"], serde_json::json!(["warming", "digestive"]));
        assert_eq!(value["ayurvedic_note"], "Fresh ginger before meals kindles agni.");
        assert_eq!(value["created_by"], serde_json::json!(author));
        assert_eq!(value["category"], "Spices");
    }

    #[test]
    fn test_invalid_macro_detection() {
        let draft = NewFoodItem::new("Ghee", FoodCategory::Dairy, DoshaEffect::Tridoshic)
            .with_macros(900.0, 0.0, 0.0, 100.0, -1.0);
        assert_eq!(draft.invalid_macro(), Some("fiber"));

        let update = FoodItemUpdate {
            protein: Some(-0.5),
            ..Default::default()
        };
        assert_eq!(update.invalid_macro(), Some("protein"));
        assert_eq!(FoodItemUpdate::default().invalid_macro(), None);
    }

    #[test]
    fn test_non_finite_macros_are_invalid() {
        let nan = NewFoodItem::new("Ghee", FoodCategory::Dairy, DoshaEffect::Tridoshic)
            .with_macros(f64::NAN, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(nan.invalid_macro(), Some("calories"));

        let infinite = FoodItemUpdate {
            carbs: Some(f64::INFINITY),
            ..Default::default()
        };
        assert_eq!(infinite.invalid_macro(), Some("carbs"));

        let negative_infinite = FoodItemUpdate {
            fat: Some(f64::NEG_INFINITY),
            ..Default::default()
        };
        assert_eq!(negative_infinite.invalid_macro(), Some("fat"));
    }
}

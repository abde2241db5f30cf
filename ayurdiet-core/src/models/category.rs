use serde::{Deserialize, Serialize};
use std::fmt;

/// Food category. The known categories are the ones the food database
/// offers as filters; anything else read from the store is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FoodCategory {
    Grains,
    Vegetables,
    Fruits,
    Spices,
    Legumes,
    Dairy,
    Oils,
    Nuts,
    Other(String),
}

impl FoodCategory {
    /// Categories offered as filter options, in display order.
    pub const KNOWN: [FoodCategory; 8] = [
        FoodCategory::Grains,
        FoodCategory::Vegetables,
        FoodCategory::Fruits,
        FoodCategory::Spices,
        FoodCategory::Legumes,
        FoodCategory::Dairy,
        FoodCategory::Oils,
        FoodCategory::Nuts,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            FoodCategory::Grains => "Grains",
            FoodCategory::Vegetables => "Vegetables",
            FoodCategory::Fruits => "Fruits",
            FoodCategory::Spices => "Spices",
            FoodCategory::Legumes => "Legumes",
            FoodCategory::Dairy => "Dairy",
            FoodCategory::Oils => "Oils",
            FoodCategory::Nuts => "Nuts",
            FoodCategory::Other(name) => name,
        }
    }
}

impl From<String> for FoodCategory {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Grains" => FoodCategory::Grains,
            "Vegetables" => FoodCategory::Vegetables,
            "Fruits" => FoodCategory::Fruits,
            "Spices" => FoodCategory::Spices,
            "Legumes" => FoodCategory::Legumes,
            "Dairy" => FoodCategory::Dairy,
            "Oils" => FoodCategory::Oils,
            "Nuts" => FoodCategory::Nuts,
            _ => FoodCategory::Other(s),
        }
    }
}

impl From<&str> for FoodCategory {
    fn from(s: &str) -> Self {
        FoodCategory::from(s.to_string())
    }
}

impl From<FoodCategory> for String {
    fn from(category: FoodCategory) -> Self {
        match category {
            FoodCategory::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Effect a food has on the three doshas. `Tridoshic` balances all three;
/// the others aggravate the named dosha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoshaEffect {
    Tridoshic,
    #[serde(rename = "Vata+")]
    VataIncreasing,
    #[serde(rename = "Pitta+")]
    PittaIncreasing,
    #[serde(rename = "Kapha+")]
    KaphaIncreasing,
}

impl DoshaEffect {
    pub const ALL: [DoshaEffect; 4] = [
        DoshaEffect::VataIncreasing,
        DoshaEffect::PittaIncreasing,
        DoshaEffect::KaphaIncreasing,
        DoshaEffect::Tridoshic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DoshaEffect::Tridoshic => "Tridoshic",
            DoshaEffect::VataIncreasing => "Vata+",
            DoshaEffect::PittaIncreasing => "Pitta+",
            DoshaEffect::KaphaIncreasing => "Kapha+",
        }
    }
}

impl fmt::Display for DoshaEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoshaEffect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tridoshic" => Ok(DoshaEffect::Tridoshic),
            "vata+" | "vata" => Ok(DoshaEffect::VataIncreasing),
            "pitta+" | "pitta" => Ok(DoshaEffect::PittaIncreasing),
            "kapha+" | "kapha" => Ok(DoshaEffect::KaphaIncreasing),
            _ => Err(format!(
                "Invalid dosha effect '{}'. Valid options: Tridoshic, Vata+, Pitta+, Kapha+",
                s
            )),
        }
    }
}

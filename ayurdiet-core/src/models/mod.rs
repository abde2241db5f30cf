mod category;
mod dosha;
mod food_item;
mod patient;
mod profile;
mod role;

use uuid::Uuid;

pub use category::FoodCategory;
pub use dosha::DoshaEffect;
pub use food_item::{FoodItem, FoodItemUpdate, NewFoodItem};
pub use patient::{compute_bmi, NewPatient, Patient, PatientUpdate};
pub use profile::Profile;
pub use role::{Gender, Role};

/// A row with a store-assigned primary key.
pub trait Record {
    fn id(&self) -> Uuid;
}

//! AyurDiet Core Library
//!
//! Typed access to the hosted backend behind the AyurDiet practice tools:
//! patient records scoped to the signed-in doctor or patient, and the food
//! reference database with local search.

pub mod auth;
pub mod foods;
mod mirror;
pub mod models;
pub mod patients;
pub mod search;
pub mod session;
pub mod store;

pub use auth::{AuthClient, AuthError, AuthSession};
pub use foods::FoodDatabase;
pub use models::{
    compute_bmi, DoshaEffect, FoodCategory, FoodItem, FoodItemUpdate, Gender, NewFoodItem,
    NewPatient, Patient, PatientUpdate, Profile, Record, Role,
};
pub use patients::PatientList;
pub use search::{filter_foods, FoodFilter};
pub use session::{Identity, SessionState};
pub use store::{Filter, MemoryStore, Order, Query, RemoteStore, RestStore, Select, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}

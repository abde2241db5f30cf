//! The food reference database.
//!
//! Only active items are mirrored. Deleting an item deactivates it on the
//! backend and drops it from the mirror, so the mirror always matches what a
//! fresh fetch would return, apart from ordering after [`FoodDatabase::add`].

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::mirror::{fetch_failure_message, Mirror};
use crate::models::{FoodCategory, FoodItem, FoodItemUpdate, NewFoodItem};
use crate::search::{filter_foods, FoodFilter, ALL};
use crate::store::{decode_rows, decode_single, Filter, Order, Query, RemoteStore, Select, StoreError};

const TABLE: &str = "food_items";
const FETCH_FAILED: &str = "Failed to fetch food items";

pub struct FoodDatabase {
    store: Arc<dyn RemoteStore>,
    mirror: Mirror<FoodItem>,
}

impl FoodDatabase {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            mirror: Mirror::new(),
        }
    }

    /// Creates the database and fetches the active items.
    pub async fn open(store: Arc<dyn RemoteStore>) -> Self {
        let db = Self::new(store);
        db.fetch().await;
        db
    }

    pub fn items(&self) -> Arc<Vec<FoodItem>> {
        self.mirror.items()
    }

    pub fn loading(&self) -> bool {
        self.mirror.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.mirror.error()
    }

    /// Category filter options: `All` followed by the known categories.
    pub fn categories() -> Vec<String> {
        std::iter::once(ALL.to_string())
            .chain(FoodCategory::KNOWN.iter().map(|c| c.to_string()))
            .collect()
    }

    /// Loads every active item, sorted by name.
    pub async fn fetch(&self) {
        let query = Query::new()
            .filter(Filter::eq("is_active", true))
            .order(Order::asc("name"));

        self.mirror.begin_load();
        let result = self
            .store
            .select(TABLE, &query)
            .await
            .and_then(decode_rows::<FoodItem>);

        match result {
            Ok(items) => {
                tracing::debug!(count = items.len(), "fetched food items");
                self.mirror.finish_load(Ok(items));
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch food items");
                self.mirror.finish_load(Err(fetch_failure_message(&e, FETCH_FAILED)));
            }
        }
    }

    pub async fn refetch(&self) {
        self.fetch().await
    }

    /// Stores a new item and appends it to the list. The list is not
    /// re-sorted; the next fetch restores name order.
    pub async fn add(&self, mut draft: NewFoodItem) -> Result<FoodItem, StoreError> {
        if let Some(field) = draft.invalid_macro() {
            return Err(StoreError::InvalidInput(format!("{} must be a non-negative number", field)));
        }
        if draft.name.trim().is_empty() {
            return Err(StoreError::InvalidInput("Food name cannot be empty".to_string()));
        }
        draft.is_active = true;

        let row = serde_json::to_value(&draft)?;
        let stored = self.store.insert(TABLE, row, &Select::all()).await?;
        let item: FoodItem = serde_json::from_value(stored)?;

        self.mirror.append(item.clone());
        Ok(item)
    }

    /// Applies `changes` to the item with `id` and replaces it in place.
    pub async fn update(&self, id: Uuid, changes: FoodItemUpdate) -> Result<FoodItem, StoreError> {
        if changes.is_empty() {
            return Err(StoreError::InvalidInput("No fields to update".to_string()));
        }
        if let Some(field) = changes.invalid_macro() {
            return Err(StoreError::InvalidInput(format!("{} must be a non-negative number", field)));
        }

        let patch = serde_json::to_value(&changes)?;
        let rows = self
            .store
            .update(TABLE, &[Filter::id(id)], patch, &Select::all())
            .await?;
        let item: FoodItem = decode_single(rows)?;

        self.mirror.replace(item.clone());
        Ok(item)
    }

    /// Deactivates the item with `id` and removes it from the list. The row
    /// itself stays on the backend.
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let rows = self
            .store
            .update(TABLE, &[Filter::id(id)], json!({ "is_active": false }), &Select::all())
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }

        self.mirror.remove(id);
        Ok(())
    }

    /// Items in the current list matching `query` (case-insensitive name
    /// substring), `category` and `dosha_effect`. `None` or `"All"` turns a
    /// filter off. Never contacts the backend.
    pub fn search(&self, query: &str, category: Option<&str>, dosha_effect: Option<&str>) -> Vec<FoodItem> {
        let filter = FoodFilter {
            query: query.to_string(),
            category: category.map(str::to_string),
            dosha_effect: dosha_effect.map(str::to_string),
        };
        self.search_with(&filter)
    }

    pub fn search_with(&self, filter: &FoodFilter) -> Vec<FoodItem> {
        filter_foods(&self.items(), filter)
    }
}

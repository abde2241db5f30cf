//! Local filtering of the food list.
//!
//! Pure and synchronous: it only reads the slice it is given, so it is safe
//! to run on every keystroke.

use crate::models::FoodItem;

/// Filter value that disables the category or dosha predicate.
pub const ALL: &str = "All";

/// Name search plus optional category and dosha-effect filters. All active
/// predicates must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodFilter {
    pub query: String,
    pub category: Option<String>,
    pub dosha_effect: Option<String>,
}

impl FoodFilter {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            dosha_effect: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_dosha_effect(mut self, dosha_effect: impl Into<String>) -> Self {
        self.dosha_effect = Some(dosha_effect.into());
        self
    }

    pub fn matches(&self, item: &FoodItem) -> bool {
        let query = self.query.to_lowercase();
        self.matches_lowered(item, &query)
    }

    fn matches_lowered(&self, item: &FoodItem, query_lower: &str) -> bool {
        let name_matches = item.name.to_lowercase().contains(query_lower);
        let category_matches =
            active(&self.category).map_or(true, |category| item.category.as_str() == category);
        let dosha_matches =
            active(&self.dosha_effect).map_or(true, |dosha| item.dosha_effect.as_str() == dosha);

        name_matches && category_matches && dosha_matches
    }
}

/// `None` when the selection is absent or [`ALL`].
fn active(selection: &Option<String>) -> Option<&str> {
    selection.as_deref().filter(|value| *value != ALL)
}

/// Items matching `filter`, in their original order.
pub fn filter_foods(items: &[FoodItem], filter: &FoodFilter) -> Vec<FoodItem> {
    let query_lower = filter.query.to_lowercase();
    items
        .iter()
        .filter(|item| filter.matches_lowered(item, &query_lower))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DoshaEffect, FoodCategory};
    use chrono::Utc;
    use uuid::Uuid;

    fn food(name: &str, category: FoodCategory, dosha: DoshaEffect) -> FoodItem {
        let now = Utc::now();
        FoodItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category,
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            fiber: 0.0,
            dosha_effect: dosha,
            rasa: None,
            virya: None,
            vipaka: None,
            properties: None,
            ayurvedic_note: None,
            created_by: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn spices() -> Vec<FoodItem> {
        vec![
            food("Ginger", FoodCategory::Spices, DoshaEffect::VataIncreasing),
            food("Turmeric", FoodCategory::Spices, DoshaEffect::KaphaIncreasing),
        ]
    }

    fn names(items: &[FoodItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_category_filter_keeps_both_spices() {
        let items = spices();
        let found = filter_foods(&items, &FoodFilter::new("").with_category("Spices").with_dosha_effect(ALL));
        assert_eq!(names(&found), vec!["Ginger", "Turmeric"]);
    }

    #[test]
    fn test_category_and_dosha_filter() {
        let items = spices();
        let found = filter_foods(
            &items,
            &FoodFilter::new("").with_category("Spices").with_dosha_effect("Kapha+"),
        );
        assert_eq!(names(&found), vec!["Turmeric"]);
    }

    #[test]
    fn test_name_substring() {
        let items = spices();
        assert_eq!(names(&filter_foods(&items, &FoodFilter::new("gin"))), vec!["Ginger"]);
    }

    #[test]
    fn test_empty_filter_returns_everything_in_order() {
        let mut items = spices();
        items.push(food("Almonds", FoodCategory::Nuts, DoshaEffect::VataIncreasing));

        let found = filter_foods(
            &items,
            &FoodFilter::new("").with_category(ALL).with_dosha_effect(ALL),
        );
        assert_eq!(found, items);
        assert_eq!(filter_foods(&items, &FoodFilter::default()), items);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let items = vec![food("Basmati Rice", FoodCategory::Grains, DoshaEffect::Tridoshic)];
        let upper = filter_foods(&items, &FoodFilter::new("RICE"));
        let lower = filter_foods(&items, &FoodFilter::new("rice"));
        assert_eq!(upper.len(), 1);
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_category_match_is_exact() {
        let items = spices();
        assert!(filter_foods(&items, &FoodFilter::new("").with_category("spices")).is_empty());
        assert!(filter_foods(&items, &FoodFilter::new("").with_dosha_effect("Pitta+")).is_empty());
    }

    #[test]
    fn test_results_satisfy_filter_and_exclusions_do_not() {
        let items = vec![
            food("Ginger", FoodCategory::Spices, DoshaEffect::VataIncreasing),
            food("Dry Ginger", FoodCategory::Spices, DoshaEffect::PittaIncreasing),
            food("Ginger Tea", FoodCategory::Other("Beverages".into()), DoshaEffect::VataIncreasing),
            food("Cumin", FoodCategory::Spices, DoshaEffect::Tridoshic),
            food("Mung Dal", FoodCategory::Legumes, DoshaEffect::Tridoshic),
        ];
        let filters = [
            FoodFilter::new("ginger"),
            FoodFilter::new("").with_category("Spices"),
            FoodFilter::new("GIN").with_category("Spices").with_dosha_effect("Vata+"),
            FoodFilter::new("").with_dosha_effect("Tridoshic"),
            FoodFilter::new("x").with_category(ALL),
        ];

        for filter in &filters {
            let found = filter_foods(&items, filter);
            assert!(found.iter().all(|item| filter.matches(item)));
            let excluded = items.iter().filter(|item| !found.contains(item));
            assert!(excluded.clone().all(|item| !filter.matches(item)));
            assert_eq!(found.len() + excluded.count(), items.len());
        }
    }
}

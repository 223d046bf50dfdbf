use std::path::Path;

use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;

use crate::aggregate::{self, CategoryGroup};
use crate::journal::{self, DrinkUpdate};
use crate::models::{
    ExtraIngredient, IngredientKey, PantryEntry, Recipe, Selection, clamp_portions, normalize,
    round2,
};
use crate::pantry::{self, PantryMatch};
use crate::store::{AppState, StateStore};

/// Application façade: owns the persisted state and funnels every mutation
/// back through the store boundary. Derived output (shopping list, matches)
/// is recomputed on demand; recipe-dependent operations take the recipe
/// list as an argument.
pub struct JuicyService {
    store: StateStore,
    state: AppState,
}

impl JuicyService {
    pub fn open(dir: &Path) -> Result<Self> {
        let store = StateStore::open(dir)?;
        let state = AppState::load(&store);
        Ok(Self { store, state })
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    // --- Selections ---

    pub fn add_selection(&mut self, recipe_id: &str, portions: u32) -> Selection {
        let selection = Selection::new(recipe_id, portions);
        self.state.selections.push(selection.clone());
        self.state.save_selections(&self.store);
        selection
    }

    pub fn set_portions(&mut self, id: &str, portions: u32) -> Result<u32> {
        let selection = self.find_selection_mut(id)?;
        selection.portions = clamp_portions(portions);
        let portions = selection.portions;
        self.state.save_selections(&self.store);
        Ok(portions)
    }

    pub fn set_active(&mut self, id: &str, active: bool) -> Result<()> {
        self.find_selection_mut(id)?.active = active;
        self.state.save_selections(&self.store);
        Ok(())
    }

    pub fn remove_selection(&mut self, id: &str) -> Result<()> {
        let before = self.state.selections.len();
        self.state.selections.retain(|s| s.id != id);
        if self.state.selections.len() == before {
            bail!("No selection with id '{id}'");
        }
        self.state.save_selections(&self.store);
        Ok(())
    }

    fn find_selection_mut(&mut self, id: &str) -> Result<&mut Selection> {
        self.state
            .selections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| anyhow!("No selection with id '{id}'"))
    }

    // --- Extras ---

    /// Repeated additions under the same key accumulate; a zero-or-negative
    /// running total drops the entry entirely.
    pub fn add_extra(&mut self, name: &str, qty: f64, unit: &str) -> IngredientKey {
        let normalized = normalize(name, qty, unit);
        let key = IngredientKey::new(&normalized.name, &normalized.unit);
        let existing = self.state.extras.get(&key).map_or(0.0, |e| e.qty);
        let total = round2(existing + normalized.qty);
        if total <= 0.0 {
            self.state.extras.remove(&key);
        } else {
            self.state.extras.insert(
                key.clone(),
                ExtraIngredient {
                    name: normalized.name,
                    unit: normalized.unit,
                    qty: total,
                },
            );
        }
        self.state.save_extras(&self.store);
        key
    }

    pub fn remove_extra(&mut self, key: &IngredientKey) -> bool {
        let removed = self.state.extras.remove(key).is_some();
        if removed {
            self.state.save_extras(&self.store);
        }
        removed
    }

    // --- Pantry ---

    /// Form semantics: a given quantity updates both fields; without one the
    /// existing quantity is kept and only the unit may carry over.
    pub fn set_pantry(&mut self, name: &str, qty: Option<f64>, unit: &str) {
        let existing = self.state.pantry.get(name);
        let entry = PantryEntry {
            qty: qty.or_else(|| existing.and_then(|e| e.qty)),
            unit: if qty.is_some() {
                unit.to_string()
            } else {
                existing.map(|e| e.unit.clone()).unwrap_or_default()
            },
        };
        self.state.pantry.insert(name.to_string(), entry);
        self.state.save_pantry(&self.store);
    }

    /// Adjust a tracked quantity by `delta`; dropping to zero or below
    /// deletes the entry. Returns the new quantity, `None` when deleted.
    pub fn bump_pantry(&mut self, name: &str, delta: f64) -> Option<f64> {
        let current = self.state.pantry.get(name).cloned().unwrap_or(PantryEntry {
            qty: None,
            unit: "st".to_string(),
        });
        let qty = round2(current.qty.unwrap_or(0.0) + delta);
        if qty <= 0.0 {
            self.state.pantry.remove(name);
            self.state.save_pantry(&self.store);
            return None;
        }
        let unit = if current.unit.is_empty() {
            "st".to_string()
        } else {
            current.unit
        };
        self.state.pantry.insert(
            name.to_string(),
            PantryEntry {
                qty: Some(qty),
                unit,
            },
        );
        self.state.save_pantry(&self.store);
        Some(qty)
    }

    pub fn remove_pantry(&mut self, name: &str) -> bool {
        let removed = self.state.pantry.remove(name).is_some();
        if removed {
            self.state.save_pantry(&self.store);
        }
        removed
    }

    pub fn clear_pantry(&mut self) {
        self.state.pantry.clear();
        self.state.save_pantry(&self.store);
    }

    // --- Checked items ---

    /// Unchecked entries are deleted rather than stored as false, so the
    /// record only ever holds the checked keys.
    pub fn set_checked(&mut self, key: IngredientKey, checked: bool) {
        if checked {
            self.state.checked.insert(key, true);
        } else {
            self.state.checked.remove(&key);
        }
        self.state.save_checked(&self.store);
    }

    #[must_use]
    pub fn is_checked(&self, key: &IngredientKey) -> bool {
        self.state.checked.get(key).copied().unwrap_or(false)
    }

    // --- Derived views ---

    #[must_use]
    pub fn shopping_list(&self, recipes: &[Recipe]) -> Vec<CategoryGroup> {
        aggregate::shopping_totals(&self.state.selections, &self.state.extras, recipes)
    }

    #[must_use]
    pub fn pantry_matches<'a>(
        &self,
        recipes: &'a [Recipe],
        tolerance: usize,
    ) -> Vec<PantryMatch<'a>> {
        pantry::find_matches(recipes, &self.state.pantry, tolerance)
    }

    /// Gap-fill: push a match's missing ingredients onto the extras list.
    /// Returns how many were added.
    pub fn add_missing_extras(&mut self, recipe: &Recipe, missing: &[String]) -> usize {
        let mut added = 0;
        for name in missing {
            if let Some(ingredient) = recipe.ingredients.iter().find(|i| &i.name == name) {
                self.add_extra(&ingredient.name, ingredient.qty, &ingredient.unit);
                added += 1;
            }
        }
        added
    }

    // --- Completion journal ---

    pub fn log_drink(&mut self, date: NaiveDate, delta: i32) -> DrinkUpdate {
        let update = journal::adjust(&mut self.state.completed, date, delta);
        self.state.save_completed(&self.store);
        update
    }

    pub fn reset_drinks(&mut self, date: NaiveDate) {
        journal::reset(&mut self.state.completed, date);
        self.state.save_completed(&self.store);
    }

    #[must_use]
    pub fn completed_on(&self, date: NaiveDate) -> u32 {
        journal::completed_on(&self.state.completed, date)
    }

    #[must_use]
    pub fn streak(&self, today: NaiveDate) -> u32 {
        journal::streak(&self.state.completed, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;

    fn sample_recipes() -> Vec<Recipe> {
        vec![Recipe {
            id: "green-detox".to_string(),
            title: "Green Detox".to_string(),
            goal: "Entgiften".to_string(),
            serves_ml: 300,
            steps: "Alles entsaften.".to_string(),
            ingredients: vec![
                Ingredient {
                    name: "Gurke".to_string(),
                    qty: 1.0,
                    unit: "st".to_string(),
                    note: None,
                },
                Ingredient {
                    name: "Spinat".to_string(),
                    qty: 50.0,
                    unit: "g".to_string(),
                    note: None,
                },
            ],
            tags: vec!["grün".to_string()],
            image: None,
            color: None,
        }]
    }

    fn service() -> (tempfile::TempDir, JuicyService) {
        let dir = tempfile::tempdir().unwrap();
        let svc = JuicyService::open(dir.path()).unwrap();
        (dir, svc)
    }

    #[test]
    fn test_selection_drives_shopping_list() {
        let (_dir, mut svc) = service();
        let recipes = sample_recipes();

        svc.add_selection("green-detox", 2);
        let groups = svc.shopping_list(&recipes);

        let gemuese = groups.iter().find(|g| g.category == "Gemüse").unwrap();
        let gurke = gemuese.items.iter().find(|i| i.name == "Gurke").unwrap();
        assert_eq!(gurke.unit, "st");
        assert!((gurke.qty - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let mut svc = JuicyService::open(dir.path()).unwrap();
            let selection = svc.add_selection("green-detox", 3);
            svc.add_extra("Minze", 1.0, "bund");
            selection.id
        };

        let svc = JuicyService::open(dir.path()).unwrap();
        assert_eq!(svc.state().selections.len(), 1);
        assert_eq!(svc.state().selections[0].id, id);
        assert_eq!(svc.state().selections[0].portions, 3);
        assert_eq!(svc.state().extras.len(), 1);
    }

    #[test]
    fn test_set_portions_clamps_and_persists() {
        let (_dir, mut svc) = service();
        let selection = svc.add_selection("green-detox", 1);
        assert_eq!(svc.set_portions(&selection.id, 99).unwrap(), 12);
        assert!(svc.set_portions("missing", 2).is_err());
    }

    #[test]
    fn test_toggle_and_remove_selection() {
        let (_dir, mut svc) = service();
        let recipes = sample_recipes();
        let selection = svc.add_selection("green-detox", 1);

        svc.set_active(&selection.id, false).unwrap();
        assert!(svc.shopping_list(&recipes).is_empty());

        svc.set_active(&selection.id, true).unwrap();
        assert!(!svc.shopping_list(&recipes).is_empty());

        svc.remove_selection(&selection.id).unwrap();
        assert!(svc.state().selections.is_empty());
        assert!(svc.remove_selection(&selection.id).is_err());
    }

    #[test]
    fn test_extras_accumulate_and_drop_at_zero() {
        let (_dir, mut svc) = service();

        let key = svc.add_extra("Ingwer", 1.5, "g");
        svc.add_extra("ingwer", 1.5, "g");
        assert!((svc.state().extras[&key].qty - 3.0).abs() < f64::EPSILON);

        svc.add_extra("Ingwer", -3.0, "g");
        assert!(!svc.state().extras.contains_key(&key));
    }

    #[test]
    fn test_remove_extra() {
        let (_dir, mut svc) = service();
        let key = svc.add_extra("Minze", 1.0, "bund");
        assert!(svc.remove_extra(&key));
        assert!(!svc.remove_extra(&key));
    }

    #[test]
    fn test_pantry_bump_deletes_at_zero() {
        let (_dir, mut svc) = service();

        assert_eq!(svc.bump_pantry("Apfel", 1.0), Some(1.0));
        assert_eq!(svc.bump_pantry("Apfel", 1.0), Some(2.0));
        assert_eq!(svc.bump_pantry("Apfel", -2.0), None);
        assert!(!svc.state().pantry.contains_key("Apfel"));
    }

    #[test]
    fn test_set_pantry_keeps_untracked_quantity() {
        let (_dir, mut svc) = service();

        svc.set_pantry("Gurke", None, "st");
        assert_eq!(svc.state().pantry["Gurke"].qty, None);

        svc.set_pantry("Gurke", Some(2.0), "st");
        assert_eq!(svc.state().pantry["Gurke"].qty, Some(2.0));

        // A later quantity-less update keeps the tracked amount.
        svc.set_pantry("Gurke", None, "g");
        assert_eq!(svc.state().pantry["Gurke"].qty, Some(2.0));
        assert_eq!(svc.state().pantry["Gurke"].unit, "st");
    }

    #[test]
    fn test_checked_entries_are_deleted_not_falsed() {
        let (dir, mut svc) = service();
        let key = IngredientKey::new("Gurke", "st");

        svc.set_checked(key.clone(), true);
        assert!(svc.is_checked(&key));

        svc.set_checked(key.clone(), false);
        assert!(!svc.is_checked(&key));

        let raw = std::fs::read_to_string(dir.path().join("checked.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.as_object().is_some_and(serde_json::Map::is_empty));
    }

    #[test]
    fn test_add_missing_extras() {
        let (_dir, mut svc) = service();
        let recipes = sample_recipes();
        svc.set_pantry("Gurke", Some(1.0), "st");

        let matches = svc.pantry_matches(&recipes, 1);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].missing, vec!["Spinat".to_string()]);

        let missing = matches[0].missing.clone();
        let added = svc.add_missing_extras(&recipes[0], &missing);
        assert_eq!(added, 1);
        assert!(
            svc.state()
                .extras
                .contains_key(&IngredientKey::new("Spinat", "g"))
        );
    }

    #[test]
    fn test_drink_log_and_streak() {
        let (_dir, mut svc) = service();
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        svc.log_drink(today, 3);
        let update = svc.log_drink(today, 1);
        assert!(update.reached_target());
        assert_eq!(svc.completed_on(today), 4);

        svc.log_drink(today - chrono::Duration::days(1), 4);
        assert_eq!(svc.streak(today), 2);

        svc.reset_drinks(today);
        assert_eq!(svc.completed_on(today), 0);
        assert_eq!(svc.streak(today), 0);
    }
}

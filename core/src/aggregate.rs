use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::Serialize;

use crate::models::{ExtrasMap, IngredientKey, Recipe, Selection, normalize, round2};

/// Fixed display order for shopping-list categories.
pub const CATEGORY_ORDER: [&str; 5] = [
    "Obst",
    "Gemüse",
    "Kräuter/Gewürze",
    "Öle/Extras",
    "Sonstiges",
];

const OBST: &[&str] = &[
    "orange",
    "zitrone",
    "grapefruit",
    "limette",
    "apfel",
    "grüner apfel",
    "ananas",
    "blaubeeren",
];
const GEMUESE: &[&str] = &[
    "karotte",
    "rote bete",
    "selleriestange",
    "sellerie",
    "gurke",
    "spinat",
    "grünkohl",
];
const KRAEUTER: &[&str] = &["ingwer", "kurkuma", "petersilie", "minze"];
const OELE: &[&str] = &["hanföl"];

/// Category assignment is a pure function of the lowercased name; unknown
/// names fall into `Sonstiges`.
#[must_use]
pub fn categorize(name: &str) -> &'static str {
    let lookup = name.to_lowercase();
    let lookup = lookup.as_str();
    if OBST.contains(&lookup) {
        "Obst"
    } else if GEMUESE.contains(&lookup) {
        "Gemüse"
    } else if KRAEUTER.contains(&lookup) {
        "Kräuter/Gewürze"
    } else if OELE.contains(&lookup) {
        "Öle/Extras"
    } else {
        "Sonstiges"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingItem {
    pub name: String,
    pub qty: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub items: Vec<ShoppingItem>,
}

/// Sort key standing in for locale-aware comparison: lowercase with German
/// umlauts folded onto their base letters.
#[must_use]
pub fn collation_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        match c {
            'ä' => key.push('a'),
            'ö' => key.push('o'),
            'ü' => key.push('u'),
            'ß' => key.push_str("ss"),
            _ => key.push(c),
        }
    }
    key
}

/// Derive the categorized shopping list from the active selections and the
/// manual extras. Pull-based: the result is always freshly computed, and
/// callers recompute after any mutation.
#[must_use]
pub fn shopping_totals(
    selections: &[Selection],
    extras: &ExtrasMap,
    recipes: &[Recipe],
) -> Vec<CategoryGroup> {
    let mut totals: HashMap<IngredientKey, ShoppingItem> = HashMap::new();

    for selection in selections {
        if !selection.active {
            continue;
        }
        // Stale references to deleted recipes are skipped silently.
        let Some(recipe) = recipes.iter().find(|r| r.id == selection.recipe_id) else {
            continue;
        };
        for ingredient in &recipe.ingredients {
            let scaled = ingredient.qty * f64::from(selection.portions);
            fold(&mut totals, &ingredient.name, scaled, &ingredient.unit);
        }
    }

    for extra in extras.values() {
        fold(&mut totals, &extra.name, extra.qty, &extra.unit);
    }

    let mut grouped: HashMap<&'static str, Vec<ShoppingItem>> = HashMap::new();
    for item in totals.into_values() {
        grouped.entry(categorize(&item.name)).or_default().push(item);
    }

    CATEGORY_ORDER
        .iter()
        .filter_map(|category| {
            let mut items = grouped.remove(category)?;
            items.sort_by_key(|item| (collation_key(&item.name), item.name.clone()));
            Some(CategoryGroup {
                category: (*category).to_string(),
                items,
            })
        })
        .collect()
}

fn fold(totals: &mut HashMap<IngredientKey, ShoppingItem>, name: &str, qty: f64, unit: &str) {
    let normalized = normalize(name, qty, unit);
    let key = IngredientKey::new(&normalized.name, &normalized.unit);
    match totals.entry(key) {
        Entry::Occupied(mut occupied) => {
            let item = occupied.get_mut();
            item.qty = round2(item.qty + normalized.qty);
        }
        Entry::Vacant(vacant) => {
            vacant.insert(ShoppingItem {
                name: normalized.name,
                qty: round2(normalized.qty),
                unit: normalized.unit,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtraIngredient, Ingredient};

    fn recipe(id: &str, ingredients: Vec<Ingredient>) -> Recipe {
        Recipe {
            id: id.to_string(),
            title: id.to_string(),
            goal: String::new(),
            serves_ml: 250,
            steps: String::new(),
            ingredients,
            tags: Vec::new(),
            image: None,
            color: None,
        }
    }

    fn ingredient(name: &str, qty: f64, unit: &str) -> Ingredient {
        Ingredient {
            name: name.to_string(),
            qty,
            unit: unit.to_string(),
            note: None,
        }
    }

    fn selection(recipe_id: &str, portions: u32, active: bool) -> Selection {
        Selection {
            id: format!("sel-{recipe_id}"),
            recipe_id: recipe_id.to_string(),
            portions,
            active,
        }
    }

    #[test]
    fn test_portions_scale_quantities() {
        let recipes = vec![recipe("green-detox", vec![ingredient("Gurke", 1.0, "st")])];
        let groups = shopping_totals(&[selection("green-detox", 2, true)], &ExtrasMap::new(), &recipes);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].category, "Gemüse");
        assert_eq!(groups[0].items[0].name, "Gurke");
        assert_eq!(groups[0].items[0].unit, "st");
        assert!((groups[0].items[0].qty - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_inactive_selection_is_ignored() {
        let recipes = vec![recipe("green-detox", vec![ingredient("Gurke", 1.0, "st")])];
        let groups = shopping_totals(&[selection("green-detox", 2, false)], &ExtrasMap::new(), &recipes);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_stale_recipe_reference_is_skipped() {
        let recipes = vec![recipe("green-detox", vec![ingredient("Gurke", 1.0, "st")])];
        let groups = shopping_totals(&[selection("deleted", 1, true)], &ExtrasMap::new(), &recipes);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_case_insensitive_merge_across_sources() {
        let recipes = vec![recipe("a", vec![ingredient("Ingwer", 1.0, "g")])];
        let mut extras = ExtrasMap::new();
        extras.insert(
            IngredientKey::new("ingwer", "g"),
            ExtraIngredient {
                name: "ingwer".to_string(),
                unit: "g".to_string(),
                qty: 2.5,
            },
        );
        let groups = shopping_totals(&[selection("a", 1, true)], &extras, &recipes);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].category, "Kräuter/Gewürze");
        assert_eq!(groups[0].items.len(), 1);
        assert!((groups[0].items[0].qty - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unit_conversion_merges_into_canonical_bucket() {
        // 1 tl of oil from a recipe plus 5 ml as an extra land in one bucket.
        let recipes = vec![recipe("a", vec![ingredient("Hanföl", 1.0, "tl")])];
        let mut extras = ExtrasMap::new();
        extras.insert(
            IngredientKey::new("Hanföl", "ml"),
            ExtraIngredient {
                name: "Hanföl".to_string(),
                unit: "ml".to_string(),
                qty: 5.0,
            },
        );
        let groups = shopping_totals(&[selection("a", 1, true)], &extras, &recipes);
        assert_eq!(groups[0].items.len(), 1);
        assert_eq!(groups[0].items[0].unit, "ml");
        assert!((groups[0].items[0].qty - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rounding_applied_at_each_fold() {
        let recipes = vec![recipe("a", vec![ingredient("Spinat", 0.1, "g"), ingredient("Spinat", 0.2, "g")])];
        let groups = shopping_totals(&[selection("a", 1, true)], &ExtrasMap::new(), &recipes);
        assert!((groups[0].items[0].qty - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_categories_follow_fixed_order() {
        let recipes = vec![recipe(
            "a",
            vec![
                ingredient("Hanföl", 1.0, "tl"),
                ingredient("Apfel", 1.0, "st"),
                ingredient("Wasser", 100.0, "ml"),
                ingredient("Gurke", 1.0, "st"),
            ],
        )];
        let groups = shopping_totals(&[selection("a", 1, true)], &ExtrasMap::new(), &recipes);
        let order: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(order, vec!["Obst", "Gemüse", "Öle/Extras", "Sonstiges"]);
    }

    #[test]
    fn test_items_sorted_with_umlaut_folding() {
        let recipes = vec![recipe(
            "a",
            vec![
                ingredient("Zitrone", 1.0, "st"),
                ingredient("Apfel", 1.0, "st"),
                ingredient("Ananas", 1.0, "st"),
            ],
        )];
        let groups = shopping_totals(&[selection("a", 1, true)], &ExtrasMap::new(), &recipes);
        let names: Vec<&str> = groups[0].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Ananas", "Apfel", "Zitrone"]);
    }

    #[test]
    fn test_idempotent_for_unchanged_inputs() {
        let recipes = vec![recipe(
            "a",
            vec![ingredient("Gurke", 1.0, "st"), ingredient("Apfel", 2.0, "st")],
        )];
        let selections = [selection("a", 3, true)];
        let first = shopping_totals(&selections, &ExtrasMap::new(), &recipes);
        let second = shopping_totals(&selections, &ExtrasMap::new(), &recipes);
        assert_eq!(first, second);
    }

    #[test]
    fn test_collation_key_folds_german_letters() {
        assert_eq!(collation_key("Grünkohl"), "grunkohl");
        assert_eq!(collation_key("Maß"), "mass");
    }

    #[test]
    fn test_categorize_unknown_is_sonstiges() {
        assert_eq!(categorize("Wasser"), "Sonstiges");
        assert_eq!(categorize("GURKE"), "Gemüse");
    }
}

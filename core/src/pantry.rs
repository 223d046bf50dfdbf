use serde::Serialize;

use crate::models::{PantryMap, Recipe};

/// A recipe alongside the ingredient names the pantry cannot cover.
#[derive(Debug, Clone, Serialize)]
pub struct PantryMatch<'a> {
    pub recipe: &'a Recipe,
    pub missing: Vec<String>,
}

/// Recipes whose missing-ingredient count stays within `tolerance`, sorted
/// ascending by missing count. The check is presence-only: pantry quantities
/// are never compared. `sort_by_key` is stable, so equal missing counts keep
/// the input recipe order.
#[must_use]
pub fn find_matches<'a>(
    recipes: &'a [Recipe],
    pantry: &PantryMap,
    tolerance: usize,
) -> Vec<PantryMatch<'a>> {
    let mut matches: Vec<PantryMatch<'a>> = recipes
        .iter()
        .map(|recipe| {
            let missing = recipe
                .ingredients
                .iter()
                .map(|i| i.name.clone())
                .filter(|name| !pantry.contains_key(name))
                .collect();
            PantryMatch { recipe, missing }
        })
        .filter(|m| m.missing.len() <= tolerance)
        .collect();
    matches.sort_by_key(|m| m.missing.len());
    matches
}

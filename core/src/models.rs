use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub qty: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub goal: String,
    pub serves_ml: u32,
    pub steps: String,
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Weekly plan document. The day entries are opaque to this crate and are
/// rendered as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub days: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Motivation {
    #[serde(default)]
    pub quotes: Vec<String>,
}

/// A chosen recipe contributing to the shopping list. `portions` and
/// `active` are the only mutable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub id: String,
    #[serde(rename = "recipeId")]
    pub recipe_id: String,
    pub portions: u32,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

pub const MIN_PORTIONS: u32 = 1;
pub const MAX_PORTIONS: u32 = 12;

#[must_use]
pub fn clamp_portions(portions: u32) -> u32 {
    portions.clamp(MIN_PORTIONS, MAX_PORTIONS)
}

impl Selection {
    #[must_use]
    pub fn new(recipe_id: &str, portions: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            recipe_id: recipe_id.to_string(),
            portions: clamp_portions(portions),
            active: true,
        }
    }
}

/// A manually-added (or pantry-gap-filled) ingredient not tied to a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraIngredient {
    pub name: String,
    pub unit: String,
    pub qty: f64,
}

/// `qty: None` means "present, amount untracked".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryEntry {
    #[serde(default)]
    pub qty: Option<f64>,
    #[serde(default)]
    pub unit: String,
}

pub type ExtrasMap = BTreeMap<IngredientKey, ExtraIngredient>;
pub type PantryMap = BTreeMap<String, PantryEntry>;
pub type CheckedMap = BTreeMap<IngredientKey, bool>;
pub type CompletionLog = BTreeMap<String, u32>;

/// Aggregation identity: case-insensitive trimmed name plus the exact
/// canonical unit. Serializes as the historical `name__unit` string so
/// persisted maps keep their on-disk shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IngredientKey {
    name: String,
    unit: String,
}

impl IngredientKey {
    #[must_use]
    pub fn new(name: &str, unit: &str) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            unit: unit.to_string(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }
}

impl fmt::Display for IngredientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}__{}", self.name, self.unit)
    }
}

impl FromStr for IngredientKey {
    type Err = anyhow::Error;

    /// Names may themselves contain `__`, so the split happens at the last
    /// occurrence.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.rfind("__") {
            Some(idx) => Ok(Self {
                name: s[..idx].to_lowercase(),
                unit: s[idx + 2..].to_string(),
            }),
            None => bail!("Invalid ingredient key '{s}': missing '__' separator"),
        }
    }
}

impl Serialize for IngredientKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IngredientKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Normalization result of a raw `(name, qty, unit)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedIngredient {
    pub name: String,
    pub qty: f64,
    pub unit: String,
}

/// Convert a raw (quantity, unit) pair into the canonical unit system.
/// Known volume shorthands are rewritten (1 tl = 5 ml); any other unit
/// passes through lowercased. Pure; a NaN quantity propagates untouched.
#[must_use]
pub fn normalize(name: &str, qty: f64, unit: &str) -> NormalizedIngredient {
    let name = name.trim().to_string();
    let lower = unit.trim().to_lowercase();
    match lower.as_str() {
        "tl" => NormalizedIngredient {
            name,
            qty: qty * 5.0,
            unit: "ml".to_string(),
        },
        _ => NormalizedIngredient {
            name,
            qty,
            unit: lower,
        },
    }
}

/// Round to 2 decimal places. Applied at every accumulation step so repeated
/// folds cannot drift.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Display form for quantities: whole number when within 0.05 of one,
/// otherwise one decimal.
#[must_use]
pub fn format_qty(value: f64) -> String {
    if (value - value.round()).abs() < 0.05 {
        format!("{:.0}", value.round())
    } else {
        format!("{value:.1}")
    }
}

use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use juicy_core::models::{Plan, Recipe, format_qty};

use super::helpers::{resolve_recipe, truncate};

pub(crate) fn cmd_recipes(recipes: &[Recipe], tag: Option<&str>, json: bool) -> Result<()> {
    let filtered: Vec<&Recipe> = recipes
        .iter()
        .filter(|r| {
            tag.is_none_or(|t| {
                let t = t.to_lowercase();
                r.tags.iter().any(|x| x.to_lowercase() == t)
            })
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&filtered)?);
        return Ok(());
    }

    if filtered.is_empty() {
        eprintln!("No recipes found");
        process::exit(2);
    }

    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Goal")]
        goal: String,
        #[tabled(rename = "ml")]
        serves_ml: u32,
        #[tabled(rename = "Tags")]
        tags: String,
    }

    let rows: Vec<RecipeRow> = filtered
        .iter()
        .map(|r| RecipeRow {
            id: r.id.clone(),
            title: truncate(&r.title, 30),
            goal: truncate(&r.goal, 35),
            serves_ml: r.serves_ml,
            tags: r.tags.join(", "),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_recipe_show(recipes: &[Recipe], needle: &str, json: bool) -> Result<()> {
    let recipe = resolve_recipe(recipes, needle)?;

    if json {
        println!("{}", serde_json::to_string_pretty(recipe)?);
        return Ok(());
    }

    println!("=== {} ===", recipe.title);
    println!("Goal:   {}", recipe.goal);
    println!("Yields: {} ml", recipe.serves_ml);
    if !recipe.tags.is_empty() {
        println!("Tags:   {}", recipe.tags.join(", "));
    }
    println!("\nIngredients:");
    for ingredient in &recipe.ingredients {
        let note = ingredient
            .note
            .as_deref()
            .map(|n| format!(" ({n})"))
            .unwrap_or_default();
        println!(
            "  - {} {} {}{note}",
            format_qty(ingredient.qty),
            ingredient.unit,
            ingredient.name
        );
    }
    println!("\nPreparation: {}", recipe.steps);

    Ok(())
}

pub(crate) fn cmd_plan(plan: &Plan, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(());
    }

    if plan.days.is_empty() {
        eprintln!("The weekly plan is empty");
        process::exit(2);
    }

    // Day entries are opaque documents; render them without interpretation.
    for (i, day) in plan.days.iter().enumerate() {
        println!("Day {}: {}", i + 1, serde_json::to_string(day)?);
    }

    Ok(())
}

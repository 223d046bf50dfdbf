use std::process;

use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use juicy_core::aggregate::collation_key;
use juicy_core::models::{Recipe, format_qty};
use juicy_core::service::JuicyService;

use super::helpers::{resolve_recipe, truncate};

pub(crate) fn cmd_pantry_show(svc: &JuicyService, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&svc.state().pantry)?);
        return Ok(());
    }

    if svc.state().pantry.is_empty() {
        eprintln!("Pantry is empty. Add something with `juicy pantry set <name>`");
        process::exit(2);
    }

    #[derive(Tabled)]
    struct PantryRow {
        #[tabled(rename = "Ingredient")]
        name: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Unit")]
        unit: String,
    }

    let mut names: Vec<&String> = svc.state().pantry.keys().collect();
    names.sort_by_key(|name| collation_key(name));

    let rows: Vec<PantryRow> = names
        .iter()
        .map(|name| {
            let entry = &svc.state().pantry[*name];
            PantryRow {
                name: (*name).clone(),
                amount: entry.qty.map_or("—".to_string(), format_qty),
                unit: entry.unit.clone(),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_pantry_set(
    svc: &mut JuicyService,
    name: &str,
    qty: Option<f64>,
    unit: &str,
) -> Result<()> {
    svc.set_pantry(name, qty, unit);
    let entry = &svc.state().pantry[name];
    let amount = entry.qty.map_or("untracked".to_string(), format_qty);
    println!("Pantry: {name} = {amount} {}", entry.unit);
    Ok(())
}

pub(crate) fn cmd_pantry_bump(svc: &mut JuicyService, name: &str, delta: f64) -> Result<()> {
    match svc.bump_pantry(name, delta) {
        Some(qty) => println!("Pantry: {name} = {}", format_qty(qty)),
        None => println!("Pantry: {name} used up, removed"),
    }
    Ok(())
}

pub(crate) fn cmd_pantry_remove(svc: &mut JuicyService, name: &str) -> Result<()> {
    if !svc.remove_pantry(name) {
        bail!("No pantry entry '{name}'");
    }
    println!("Removed {name} from the pantry");
    Ok(())
}

pub(crate) fn cmd_pantry_clear(svc: &mut JuicyService) -> Result<()> {
    svc.clear_pantry();
    println!("Pantry cleared");
    Ok(())
}

pub(crate) fn cmd_match(
    svc: &mut JuicyService,
    recipes: &[Recipe],
    tolerance: usize,
    add_missing: Option<&str>,
    json: bool,
) -> Result<()> {
    let matches = svc.pantry_matches(recipes, tolerance);

    if let Some(needle) = add_missing {
        let recipe = resolve_recipe(recipes, needle)?;
        let Some(missing) = matches
            .iter()
            .find(|m| m.recipe.id == recipe.id)
            .map(|m| m.missing.clone())
        else {
            bail!(
                "{} is missing more than {tolerance} ingredient(s); raise --tolerance",
                recipe.title
            );
        };
        let added = svc.add_missing_extras(recipe, &missing);
        println!("Added {added} missing ingredient(s) to the extras");
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        eprintln!("No recipes within {tolerance} missing ingredient(s)");
        process::exit(2);
    }

    #[derive(Tabled)]
    struct MatchRow {
        #[tabled(rename = "Recipe")]
        recipe: String,
        #[tabled(rename = "Missing")]
        missing: usize,
        #[tabled(rename = "Ingredients to buy")]
        names: String,
    }

    let rows: Vec<MatchRow> = matches
        .iter()
        .map(|m| MatchRow {
            recipe: truncate(&m.recipe.title, 30),
            missing: m.missing.len(),
            names: if m.missing.is_empty() {
                "—".to_string()
            } else {
                truncate(&m.missing.join(", "), 40)
            },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

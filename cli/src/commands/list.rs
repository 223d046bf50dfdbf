use std::path::Path;
use std::process;

use anyhow::{Result, bail};

use juicy_core::export;
use juicy_core::models::{IngredientKey, Recipe, format_qty, normalize};
use juicy_core::service::JuicyService;

use super::helpers::{resolve_recipe, resolve_selection_id, short_id};

pub(crate) fn cmd_list_show(svc: &JuicyService, recipes: &[Recipe], json: bool) -> Result<()> {
    let groups = svc.shopping_list(recipes);

    if json {
        let view = serde_json::json!({
            "selections": svc.state().selections,
            "extras": svc.state().extras,
            "list": groups,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if svc.state().selections.is_empty() && svc.state().extras.is_empty() {
        eprintln!("Shopping list is empty. Add a recipe with `juicy list add <recipe>`");
        process::exit(2);
    }

    println!("Recipes in the list:");
    for selection in &svc.state().selections {
        let title = recipes
            .iter()
            .find(|r| r.id == selection.recipe_id)
            .map_or(selection.recipe_id.as_str(), |r| r.title.as_str());
        let state = if selection.active { "on " } else { "off" };
        println!(
            "  [{}] {state} {}× {title}",
            short_id(&selection.id),
            selection.portions
        );
    }

    if !svc.state().extras.is_empty() {
        println!("\nExtra ingredients:");
        for extra in svc.state().extras.values() {
            println!("  - {} {} {}", format_qty(extra.qty), extra.unit, extra.name);
        }
    }

    println!("\nShopping list:");
    for group in &groups {
        println!("{}:", group.category);
        for item in &group.items {
            let key = IngredientKey::new(&item.name, &item.unit);
            let mark = if svc.is_checked(&key) { "[x]" } else { "[ ]" };
            println!("  {mark} {} {} {}", format_qty(item.qty), item.unit, item.name);
        }
    }

    Ok(())
}

pub(crate) fn cmd_list_add(
    svc: &mut JuicyService,
    recipes: &[Recipe],
    needle: &str,
    portions: u32,
    json: bool,
) -> Result<()> {
    let recipe = resolve_recipe(recipes, needle)?;
    let selection = svc.add_selection(&recipe.id, portions);

    if json {
        println!("{}", serde_json::to_string_pretty(&selection)?);
        return Ok(());
    }
    println!(
        "Added {} ({} portion(s)) as selection {}",
        recipe.title,
        selection.portions,
        short_id(&selection.id)
    );
    Ok(())
}

pub(crate) fn cmd_list_portions(svc: &mut JuicyService, needle: &str, portions: u32) -> Result<()> {
    let id = resolve_selection_id(&svc.state().selections, needle)?;
    let portions = svc.set_portions(&id, portions)?;
    println!("Selection {} now has {portions} portion(s)", short_id(&id));
    Ok(())
}

pub(crate) fn cmd_list_toggle(svc: &mut JuicyService, needle: &str, off: bool) -> Result<()> {
    let id = resolve_selection_id(&svc.state().selections, needle)?;
    svc.set_active(&id, !off)?;
    let state = if off { "deactivated" } else { "activated" };
    println!("Selection {} {state}", short_id(&id));
    Ok(())
}

pub(crate) fn cmd_list_remove(svc: &mut JuicyService, needle: &str) -> Result<()> {
    let id = resolve_selection_id(&svc.state().selections, needle)?;
    svc.remove_selection(&id)?;
    println!("Removed selection {}", short_id(&id));
    Ok(())
}

pub(crate) fn cmd_list_check(
    svc: &mut JuicyService,
    name: &str,
    unit: &str,
    checked: bool,
) -> Result<()> {
    let normalized = normalize(name, 0.0, unit);
    let key = IngredientKey::new(&normalized.name, &normalized.unit);
    svc.set_checked(key.clone(), checked);
    if checked {
        println!("Checked off {} ({})", normalized.name, normalized.unit);
    } else {
        println!("Unchecked {} ({})", normalized.name, normalized.unit);
    }
    Ok(())
}

pub(crate) fn cmd_extra_add(
    svc: &mut JuicyService,
    name: &str,
    qty: f64,
    unit: &str,
    json: bool,
) -> Result<()> {
    let key = svc.add_extra(name, qty, unit);
    match svc.state().extras.get(&key) {
        Some(extra) => {
            if json {
                println!("{}", serde_json::to_string_pretty(extra)?);
            } else {
                println!(
                    "Extras now hold {} {} {}",
                    format_qty(extra.qty),
                    extra.unit,
                    extra.name
                );
            }
        }
        // The running total dropped to zero and the entry was removed.
        None => println!("Extra '{}' removed", key.name()),
    }
    Ok(())
}

pub(crate) fn cmd_extra_remove(svc: &mut JuicyService, name: &str, unit: &str) -> Result<()> {
    let normalized = normalize(name, 0.0, unit);
    let key = IngredientKey::new(&normalized.name, &normalized.unit);
    if !svc.remove_extra(&key) {
        bail!("No extra '{}' with unit '{}'", normalized.name, normalized.unit);
    }
    println!("Removed extra {}", normalized.name);
    Ok(())
}

pub(crate) fn cmd_list_export(
    svc: &JuicyService,
    recipes: &[Recipe],
    csv: bool,
    output: Option<&Path>,
) -> Result<()> {
    let groups = svc.shopping_list(recipes);
    if groups.is_empty() {
        eprintln!("Nothing to export");
        process::exit(2);
    }

    let content = if csv {
        export::build_csv(&groups)?
    } else {
        export::build_text(&groups)
    };

    match output {
        Some(path) => {
            std::fs::write(path, &content)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, NaiveDate};

use juicy_core::models::{Recipe, Selection};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday")),
        },
    }
}

/// Accept a recipe id or a (case-insensitive) title.
pub(crate) fn resolve_recipe<'a>(recipes: &'a [Recipe], needle: &str) -> Result<&'a Recipe> {
    let lower = needle.to_lowercase();
    recipes
        .iter()
        .find(|r| r.id == needle)
        .or_else(|| recipes.iter().find(|r| r.title.to_lowercase() == lower))
        .ok_or_else(|| anyhow!("No recipe '{needle}'. Use `juicy recipes` to list them"))
}

/// Selection ids are uuids; accept any unambiguous prefix.
pub(crate) fn resolve_selection_id(selections: &[Selection], needle: &str) -> Result<String> {
    let matches: Vec<&Selection> = selections
        .iter()
        .filter(|s| s.id.starts_with(needle))
        .collect();
    match matches.as_slice() {
        [one] => Ok(one.id.clone()),
        [] => bail!("No selection matching '{needle}'. Use `juicy list show`"),
        _ => bail!("Selection id '{needle}' is ambiguous"),
    }
}

pub(crate) fn short_id(id: &str) -> &str {
    &id[..id.len().min(8)]
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

pub(crate) fn format_size(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let kib = bytes as f64 / 1024.0;
    if bytes < 1024 {
        format!("{bytes} B")
    } else if kib < 1024.0 {
        format!("{kib:.1} KiB")
    } else {
        format!("{:.1} MiB", kib / 1024.0)
    }
}

mod cache;
mod helpers;
mod list;
mod motivation;
mod pantry;
mod recipe;

pub(crate) use cache::{cmd_cache_clear, cmd_cache_status, cmd_sync};
pub(crate) use helpers::parse_date;
pub(crate) use list::{
    cmd_extra_add, cmd_extra_remove, cmd_list_add, cmd_list_check, cmd_list_export,
    cmd_list_portions, cmd_list_remove, cmd_list_show, cmd_list_toggle,
};
pub(crate) use motivation::{cmd_drink_log, cmd_drink_reset, cmd_drink_status, cmd_quote};
pub(crate) use pantry::{
    cmd_match, cmd_pantry_bump, cmd_pantry_clear, cmd_pantry_remove, cmd_pantry_set,
    cmd_pantry_show,
};
pub(crate) use recipe::{cmd_plan, cmd_recipe_show, cmd_recipes};

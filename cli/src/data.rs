use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;

use juicy_core::models::{Motivation, Plan, Recipe};

use crate::cache::{AssetRequest, CacheController, Fetcher};

pub const RECIPES_PATH: &str = "/data/recipes.json";
pub const PLAN_PATH: &str = "/data/plan-7days.json";
pub const MOTIVATION_PATH: &str = "/data/motivation.json";

pub struct AppData {
    pub recipes: Vec<Recipe>,
    pub plan: Plan,
    pub motivation: Motivation,
}

/// Load all three data documents through the cache controller. Any single
/// failure aborts with one user-visible notice.
pub async fn load_all<F: Fetcher>(controller: &CacheController<F>) -> Result<AppData> {
    Ok(AppData {
        recipes: fetch_json(controller, RECIPES_PATH).await?,
        plan: fetch_json(controller, PLAN_PATH).await?,
        motivation: fetch_json(controller, MOTIVATION_PATH).await?,
    })
}

pub async fn load_recipes<F: Fetcher>(controller: &CacheController<F>) -> Result<Vec<Recipe>> {
    fetch_json(controller, RECIPES_PATH).await
}

pub async fn load_plan<F: Fetcher>(controller: &CacheController<F>) -> Result<Plan> {
    fetch_json(controller, PLAN_PATH).await
}

pub async fn load_motivation<F: Fetcher>(controller: &CacheController<F>) -> Result<Motivation> {
    fetch_json(controller, MOTIVATION_PATH).await
}

/// Data paths take the stale-while-revalidate route: a cached copy keeps
/// the app usable offline while the network refreshes it in the background.
async fn fetch_json<F: Fetcher, T: DeserializeOwned>(
    controller: &CacheController<F>,
    path: &str,
) -> Result<T> {
    let url = controller.asset_url(path);
    let response = controller
        .handle(&AssetRequest::get(&url))
        .await
        .with_context(|| format!("Could not load {path}. Offline and not yet cached? Run `juicy sync` while online."))?;
    if !(200..300).contains(&response.status) {
        bail!("Could not load {path}: upstream returned status {}", response.status);
    }
    serde_json::from_slice(&response.body).with_context(|| format!("Could not parse {path}"))
}

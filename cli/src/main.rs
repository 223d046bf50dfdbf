mod cache;
mod commands;
mod config;
mod data;
mod server;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cache::{CacheController, CacheStorage, HttpFetcher};
use crate::commands::{
    cmd_cache_clear, cmd_cache_status, cmd_drink_log, cmd_drink_reset, cmd_drink_status,
    cmd_extra_add, cmd_extra_remove, cmd_list_add, cmd_list_check, cmd_list_export,
    cmd_list_portions, cmd_list_remove, cmd_list_show, cmd_list_toggle, cmd_match,
    cmd_pantry_bump, cmd_pantry_clear, cmd_pantry_remove, cmd_pantry_set, cmd_pantry_show,
    cmd_plan, cmd_quote, cmd_recipe_show, cmd_recipes, cmd_sync, parse_date,
};
use crate::config::Config;
use juicy_core::service::JuicyService;

#[derive(Parser)]
#[command(
    name = "juicy",
    version,
    about = "A local-first, offline-resilient juice planner",
    long_about = "\n\n   ██╗██╗   ██╗██╗ ██████╗██╗   ██╗
   ██║██║   ██║██║██╔════╝╚██╗ ██╔╝
   ██║██║   ██║██║██║      ╚████╔╝
██ ██║██║   ██║██║██║       ╚██╔╝
╚█████╔╝╚██████╔╝██║╚██████╗   ██║
 ╚════╝  ╚═════╝ ╚═╝ ╚═════╝   ╚═╝
      fresh juice, even offline.
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recipes, optionally filtered by tag
    Recipes {
        /// Only recipes carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one recipe (ingredients + preparation)
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Manage the shopping list
    List {
        #[command(subcommand)]
        command: ListCommands,
    },
    /// Manage extra ingredients not tied to a recipe
    Extra {
        #[command(subcommand)]
        command: ExtraCommands,
    },
    /// Manage the pantry inventory
    Pantry {
        #[command(subcommand)]
        command: PantryCommands,
    },
    /// Find recipes you can (almost) make from the pantry
    Match {
        /// Maximum number of missing ingredients
        #[arg(short, long, default_value = "0")]
        tolerance: usize,
        /// Add the missing ingredients of this recipe to the extras
        #[arg(long, value_name = "RECIPE")]
        add_missing: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Track daily drink completion
    Drink {
        #[command(subcommand)]
        command: DrinkCommands,
    },
    /// Show the quote of the day
    Quote,
    /// Show the weekly plan
    Plan {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Precache core assets and purge caches of previous versions
    Sync,
    /// Inspect or clear the offline caches
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Run the local offline-first gateway
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8787")]
        port: u16,
        /// Address to bind to
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// Show recipe details
    Show {
        /// Recipe id or title
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ListCommands {
    /// Show selections, extras, and the derived shopping list
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a recipe to the shopping list
    Add {
        /// Recipe id or title
        recipe: String,
        /// Number of portions (1-12)
        #[arg(short, long, default_value = "1")]
        portions: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the portions of a selection
    Portions {
        /// Selection id (any unambiguous prefix)
        selection: String,
        /// New portion count (1-12)
        portions: u32,
    },
    /// Toggle a selection on or off without removing it
    Toggle {
        /// Selection id (any unambiguous prefix)
        selection: String,
        /// Deactivate instead of activate
        #[arg(long)]
        off: bool,
    },
    /// Remove a selection
    Remove {
        /// Selection id (any unambiguous prefix)
        selection: String,
    },
    /// Check off a shopping-list item
    Check {
        /// Ingredient name
        name: String,
        /// Ingredient unit (st, g, ml, bund, ...)
        unit: String,
    },
    /// Uncheck a shopping-list item
    Uncheck {
        /// Ingredient name
        name: String,
        /// Ingredient unit (st, g, ml, bund, ...)
        unit: String,
    },
    /// Export the shopping list as text or CSV
    Export {
        /// Export as semicolon-separated CSV instead of plain text
        #[arg(long)]
        csv: bool,
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ExtraCommands {
    /// Add an extra ingredient (amounts accumulate per name + unit)
    Add {
        /// Ingredient name
        name: String,
        /// Quantity
        qty: f64,
        /// Unit (st, g, ml, bund, ...)
        unit: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an extra ingredient
    Remove {
        /// Ingredient name
        name: String,
        /// Ingredient unit
        unit: String,
    },
}

#[derive(Subcommand)]
enum PantryCommands {
    /// Show the pantry
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add or update a pantry entry
    Set {
        /// Ingredient name
        name: String,
        /// Amount on hand (omit for "present, untracked")
        #[arg(short, long)]
        qty: Option<f64>,
        /// Unit (st, g, ml, bund, ...)
        #[arg(short, long, default_value = "st")]
        unit: String,
    },
    /// Increase a pantry amount by one
    Inc {
        /// Ingredient name
        name: String,
    },
    /// Decrease a pantry amount by one (removes the entry at zero)
    Dec {
        /// Ingredient name
        name: String,
    },
    /// Remove a pantry entry
    Remove {
        /// Ingredient name
        name: String,
    },
    /// Remove every pantry entry
    Clear,
}

#[derive(Subcommand)]
enum DrinkCommands {
    /// Log finished drinks for a day (default: one more today)
    Log {
        /// How many to add (negative to undo)
        #[arg(default_value = "1", allow_hyphen_values = true)]
        count: i32,
        /// Date to log for (YYYY-MM-DD, today, yesterday)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reset a day's counter to zero
    Reset {
        /// Date to reset (YYYY-MM-DD, today, yesterday)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show today's progress and the current streak
    Status {
        /// Date to show (YYYY-MM-DD, today, yesterday)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show entry counts and sizes per cache
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every cache
    Clear,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let storage = CacheStorage::open(&config.cache_dir).context("Failed to open cache storage")?;
    let fetcher = Arc::new(HttpFetcher::new());
    let controller = CacheController::new(config.origin.clone(), storage, fetcher);
    let mut service = JuicyService::open(&config.storage_dir)?;

    match cli.command {
        Commands::Recipes { tag, json } => {
            let recipes = data::load_recipes(&controller).await?;
            cmd_recipes(&recipes, tag.as_deref(), json)
        }
        Commands::Recipe { command } => match command {
            RecipeCommands::Show { recipe, json } => {
                let recipes = data::load_recipes(&controller).await?;
                cmd_recipe_show(&recipes, &recipe, json)
            }
        },
        Commands::List { command } => match command {
            ListCommands::Show { json } => {
                let recipes = data::load_recipes(&controller).await?;
                cmd_list_show(&service, &recipes, json)
            }
            ListCommands::Add {
                recipe,
                portions,
                json,
            } => {
                let recipes = data::load_recipes(&controller).await?;
                cmd_list_add(&mut service, &recipes, &recipe, portions, json)
            }
            ListCommands::Portions {
                selection,
                portions,
            } => cmd_list_portions(&mut service, &selection, portions),
            ListCommands::Toggle { selection, off } => {
                cmd_list_toggle(&mut service, &selection, off)
            }
            ListCommands::Remove { selection } => cmd_list_remove(&mut service, &selection),
            ListCommands::Check { name, unit } => cmd_list_check(&mut service, &name, &unit, true),
            ListCommands::Uncheck { name, unit } => {
                cmd_list_check(&mut service, &name, &unit, false)
            }
            ListCommands::Export { csv, output } => {
                let recipes = data::load_recipes(&controller).await?;
                cmd_list_export(&service, &recipes, csv, output.as_deref())
            }
        },
        Commands::Extra { command } => match command {
            ExtraCommands::Add {
                name,
                qty,
                unit,
                json,
            } => cmd_extra_add(&mut service, &name, qty, &unit, json),
            ExtraCommands::Remove { name, unit } => cmd_extra_remove(&mut service, &name, &unit),
        },
        Commands::Pantry { command } => match command {
            PantryCommands::Show { json } => cmd_pantry_show(&service, json),
            PantryCommands::Set { name, qty, unit } => {
                cmd_pantry_set(&mut service, &name, qty, &unit)
            }
            PantryCommands::Inc { name } => cmd_pantry_bump(&mut service, &name, 1.0),
            PantryCommands::Dec { name } => cmd_pantry_bump(&mut service, &name, -1.0),
            PantryCommands::Remove { name } => cmd_pantry_remove(&mut service, &name),
            PantryCommands::Clear => cmd_pantry_clear(&mut service),
        },
        Commands::Match {
            tolerance,
            add_missing,
            json,
        } => {
            let recipes = data::load_recipes(&controller).await?;
            cmd_match(
                &mut service,
                &recipes,
                tolerance,
                add_missing.as_deref(),
                json,
            )
        }
        Commands::Drink { command } => match command {
            DrinkCommands::Log { count, date, json } => {
                let date = parse_date(date)?;
                cmd_drink_log(&mut service, date, count, json)
            }
            DrinkCommands::Reset { date } => {
                let date = parse_date(date)?;
                cmd_drink_reset(&mut service, date)
            }
            DrinkCommands::Status { date, json } => {
                let date = parse_date(date)?;
                cmd_drink_status(&service, date, json)
            }
        },
        Commands::Quote => {
            let motivation = data::load_motivation(&controller).await?;
            let today = parse_date(None)?;
            cmd_quote(&motivation, today)
        }
        Commands::Plan { json } => {
            let plan = data::load_plan(&controller).await?;
            cmd_plan(&plan, json)
        }
        Commands::Sync => cmd_sync(&controller).await,
        Commands::Cache { command } => match command {
            CacheCommands::Status { json } => cmd_cache_status(&controller, json),
            CacheCommands::Clear => cmd_cache_clear(&controller),
        },
        Commands::Serve { port, bind } => {
            server::start_server(Arc::new(controller), port, &bind).await
        }
    }
}

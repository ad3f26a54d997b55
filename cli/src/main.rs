mod commands;
mod config;
mod mealdb;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_add, cmd_favorite_toggle, cmd_favorites, cmd_list, cmd_mine, cmd_show, cmd_theme,
    recipe_form,
};
use crate::config::Config;
use crate::mealdb::MealDbClient;
use pantry_core::service::RecipeService;
use pantry_core::storage::Storage;
use pantry_core::store::SqliteStore;
use pantry_core::theme::ThemeService;

#[derive(Parser)]
#[command(
    name = "pantry",
    version,
    about = "A local-first recipe box backed by TheMealDB",
    long_about = "\n\n  ┌─┐┌─┐┌┐┌┌┬┐┬─┐┬ ┬
  ├─┘├─┤│││ │ ├┬┘└┬┘
  ┴  ┴ ┴┘└┘ ┴ ┴└─ ┴
  your recipes, and everyone else's.
"
)]
struct Cli {
    /// Show debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List your recipes followed by the catalog's
    List {
        /// Only show recipes whose name, category or area contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one recipe with its ingredients and instructions
    Show {
        /// Recipe ID (catalog ID or user-...)
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List only the recipes you added
    Mine {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a recipe of your own
    Add {
        /// Recipe name
        name: String,
        /// Preparation steps
        #[arg(long)]
        instructions: String,
        /// Ingredients as a block of text, one per line
        #[arg(long)]
        ingredients: Option<String>,
        /// A single ingredient line (repeatable)
        #[arg(short = 'i', long = "ingredient")]
        ingredient: Vec<String>,
        /// Category (default: "User Recipe")
        #[arg(long)]
        category: Option<String>,
        /// Cuisine or region (default: "Custom")
        #[arg(long)]
        area: Option<String>,
        /// Image URL (default: placeholder image)
        #[arg(long)]
        thumbnail: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List your favorite recipes
    Favorites {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark or unmark a recipe as a favorite
    Favorite {
        /// Recipe ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the current theme and its palette
    Theme {
        /// Switch between light and dark
        #[arg(long)]
        toggle: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the JSON API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (use 0.0.0.0 to expose on the network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication
        #[arg(long)]
        no_auth: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let store = SqliteStore::open(&config.db_path)?;
    let storage = Arc::new(Storage::new(Arc::new(store)));
    let catalog = MealDbClient::new(&config.catalog_url)?;
    let svc = RecipeService::new(Arc::clone(&storage), Arc::new(catalog));

    match cli.command {
        Commands::List { search, json } => cmd_list(&svc, search.as_deref(), json).await,
        Commands::Show { id, json } => cmd_show(&svc, &id, json).await,
        Commands::Mine { json } => cmd_mine(&svc, json).await,
        Commands::Add {
            name,
            instructions,
            ingredients,
            ingredient,
            category,
            area,
            thumbnail,
            json,
        } => {
            let form = recipe_form(
                name,
                instructions,
                ingredients,
                ingredient,
                category,
                area,
                thumbnail,
            );
            cmd_add(&svc, form, json).await
        }
        Commands::Favorites { json } => cmd_favorites(&svc, json).await,
        Commands::Favorite { id, json } => cmd_favorite_toggle(&svc, &id, json).await,
        Commands::Theme { toggle, json } => {
            let mut theme = ThemeService::load(storage).await?;
            cmd_theme(&mut theme, toggle, json).await
        }
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                Some(config.load_or_create_api_key()?.0)
            };
            let theme = ThemeService::load(storage).await?;
            server::start_server(svc, theme, port, &bind, api_key).await
        }
    }
}

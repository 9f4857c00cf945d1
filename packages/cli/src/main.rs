//! marksync: command-line front end for bookmark lists
//!
//! # Usage
//!
//! ```bash
//! # Import a nested tree as a new list owned by user 1
//! marksync import bookmarks.json --name "Reading" --user 1
//!
//! # Overwrite list 3 with a new version of the tree
//! marksync import bookmarks.json --name "Reading" --user 1 --list 3
//!
//! # Flat bookmarks-bar export, nested tree, or a user's lists
//! marksync export 3
//! marksync tree 3
//! marksync lists 1
//! ```
//!
//! # Environment Variables
//!
//! - `MARKSYNC_DB_PATH`: Database file (default: `~/.marksync/database/marksync.db`)
//! - `MARKSYNC_BUSY_TIMEOUT_MS`, `MARKSYNC_MAX_BATCH_ROWS`: Store tuning
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")
//!
//! Results go to stdout, logs to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use marksync_core::db::{DatabaseService, TursoListStore};
use marksync_core::{ListDocument, ListService, StoreConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "marksync")]
#[command(about = "Store bookmark trees as flat, pointer-linked rows")]
#[command(version)]
struct Cli {
    /// Database file
    #[arg(long, global = true, env = "MARKSYNC_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a nested tree document into a list
    Import {
        /// JSON file: `{ "contents": [...] }`, `{ "children": [...] }` or an array
        file: PathBuf,

        /// List name
        #[arg(long)]
        name: String,

        /// Owning user id
        #[arg(long)]
        user: i64,

        /// Existing list to overwrite instead of creating a new one
        #[arg(long)]
        list: Option<i64>,
    },

    /// Print a list as the flat bookmarks-bar export document
    Export {
        /// List id
        list: i64,
    },

    /// Print a list as a nested tree
    Tree {
        /// List id
        list: i64,
    },

    /// Print the lists a user owns
    Lists {
        /// User id
        user: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = StoreConfig::from_env();
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    tracing::debug!("Database: {}", config.database_path.display());

    let db = Arc::new(
        DatabaseService::with_config(&config)
            .await
            .with_context(|| format!("opening {}", config.database_path.display()))?,
    );
    let service = ListService::new(Arc::new(TursoListStore::new(db)));

    match cli.command {
        Commands::Import {
            file,
            name,
            user,
            list,
        } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let document: ListDocument = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", file.display()))?;

            let list_id = service
                .insert_structured_list(document.into_nodes(), &name, user, list)
                .await?;
            println!("{}", list_id);
        }
        Commands::Export { list } => {
            println!("{}", service.serialize_list(list).await?);
        }
        Commands::Tree { list } => {
            let root = service.create_structure(list).await?;
            println!("{}", serde_json::to_string_pretty(&root)?);
        }
        Commands::Lists { user } => {
            let ids = service.get_list_ids(user).await?;
            let lists = service.get_lists(&ids).await?;
            println!("{}", serde_json::to_string_pretty(&lists)?);
        }
    }

    Ok(())
}

//! # Biblot CLI (`biblot`)
//!
//! Look up scripture passages and keep personal notes on verses.
//!
//! ## Usage
//!
//! ```bash
//! biblot --config ./config/biblot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `biblot init` | Connect to PostgreSQL and create the tables |
//! | `biblot verse <ref>` | Print the cleaned text of one verse |
//! | `biblot chapter <ref>` | Print the cleaned text of a chapter |
//! | `biblot note add <user> <ref> <note>` | Save a note with the verse text |
//! | `biblot note list <user>` | List a user's notes, newest first |
//! | `biblot note show <id>` | Show one note with its stored verse text |
//! | `biblot stats` | Count users and notes |
//!
//! The database URL comes from `[db].url` or, when unset, from the
//! `DATABASE_URL` environment variable (a `.env` file in the working
//! directory is loaded first). Logs go to stderr; set `RUST_LOG` to change
//! the filter.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use biblot::resolver::PassageKind;
use biblot::{config, migrate, notes, resolver, stats};

const DEFAULT_LOG_FILTER: &str = "biblot=info";

/// Biblot CLI: scripture passage lookup with personal notes.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/biblot.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "biblot",
    about = "Biblot: scripture passage lookup with personal notes",
    version,
    long_about = "Biblot resolves references such as \"Juan 3:16\" into clean passage text \
    and stores personal notes on verses in PostgreSQL."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/biblot.toml`. A missing file means built-in
    /// defaults plus `DATABASE_URL` from the environment.
    #[arg(long, global = true, default_value = "./config/biblot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Connects with retries and creates the `users` and `notes` tables if
    /// they do not exist. Safe to run repeatedly.
    Init,

    /// Print the text of a single verse.
    Verse {
        /// Verse reference, e.g. `"Juan 3:16"`.
        reference: String,

        /// Translation code to request instead of `[passage].version`.
        #[arg(long)]
        translation: Option<String>,
    },

    /// Print the text of a whole chapter.
    Chapter {
        /// Chapter reference, e.g. `"Salmos 23"`.
        reference: String,

        /// Translation code to request instead of `[passage].version`.
        #[arg(long)]
        translation: Option<String>,
    },

    /// Save and read notes on verses.
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },

    /// Show user and note counts.
    Stats,
}

#[derive(Subcommand)]
enum NoteAction {
    /// Resolve a verse and save a note on it.
    ///
    /// The user is created on first use. The verse text is stored with the
    /// note and never refreshed.
    Add {
        /// User identifier.
        user: String,

        /// Verse reference, e.g. `"Juan 3:16"`.
        reference: String,

        /// The note text.
        annotation: String,

        /// Display name for a new user. Defaults to the identifier.
        #[arg(long)]
        name: Option<String>,

        /// Translation code to request instead of `[passage].version`.
        #[arg(long)]
        translation: Option<String>,
    },

    /// List a user's notes, newest first.
    List {
        /// User identifier.
        user: String,

        /// Print the notes as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a single note by id.
    Show {
        /// Note id.
        id: i32,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_init(&cfg).await?;
        }
        Commands::Verse {
            reference,
            translation,
        } => {
            resolver::run_passage(&cfg, &reference, PassageKind::Verse, translation).await?;
        }
        Commands::Chapter {
            reference,
            translation,
        } => {
            resolver::run_passage(&cfg, &reference, PassageKind::Chapter, translation).await?;
        }
        Commands::Note { action } => match action {
            NoteAction::Add {
                user,
                reference,
                annotation,
                name,
                translation,
            } => {
                notes::run_note_add(
                    &cfg,
                    &user,
                    name.as_deref(),
                    &reference,
                    &annotation,
                    translation,
                )
                .await?;
            }
            NoteAction::List { user, json } => {
                notes::run_note_list(&cfg, &user, json).await?;
            }
            NoteAction::Show { id } => {
                notes::run_note_show(&cfg, id).await?;
            }
        },
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}

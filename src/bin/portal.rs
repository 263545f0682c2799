//! portal CLI
//!
//! Ask the FAQ responder and inspect portal collections from a terminal.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, error};

use portal_store::faq::{respond, FaqRequest};
use portal_store::{open_registry, Criteria, Portal, Query, StoreConfig, StoreError, StoreResult};

#[derive(Parser)]
#[command(name = "portal", version, about = "Intern portal data store and FAQ")]
struct Cli {
    /// Directory of the file backend; overrides PORTAL_STORE_DIR.
    #[arg(long, short = 'd', global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question from the built-in FAQ.
    Ask {
        /// Question text.
        question: Vec<String>,
        /// Reply language code (pt, en).
        #[arg(long, short = 'l', default_value = "pt")]
        lang: String,
    },
    /// Print a collection as JSON.
    List {
        entity: Entity,
        /// Sort field, prefix with '-' for descending.
        #[arg(long, short = 's')]
        sort: Option<String>,
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },
    /// Print one record as JSON.
    Show { entity: Entity, id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Entity {
    Feedback,
    Categories,
    Topics,
    Replies,
}

impl Entity {
    const fn storage_key(self) -> &'static str {
        match self {
            Self::Feedback => portal_store::FeedbackEntries::STORAGE_KEY,
            Self::Categories => portal_store::ForumCategories::STORAGE_KEY,
            Self::Topics => portal_store::ForumTopics::STORAGE_KEY,
            Self::Replies => portal_store::ForumReplies::STORAGE_KEY,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> StoreResult<()> {
    if let Command::Ask { question, lang } = &cli.command {
        let request = FaqRequest::message(question.join(" ")).language(lang.clone());
        println!("{}", respond(&request));
        return Ok(());
    }

    let config = match cli.data_dir {
        Some(dir) => StoreConfig::file(dir).validate()?,
        None => StoreConfig::from_env()?,
    };
    debug!(backend = ?config.backend, "opening registry");
    let registry = open_registry(config)?;
    let portal = Portal::open(&registry)?;

    match cli.command {
        Command::Ask { .. } => Ok(()),
        Command::List {
            entity,
            sort,
            limit,
        } => {
            let mut query = Query::new();
            if let Some(sort) = sort.as_deref() {
                query = query.sort(sort);
            }
            if let Some(limit) = limit {
                query = query.limit(limit);
            }
            match entity {
                Entity::Feedback => print_json(&portal.feedback.list(&query)),
                Entity::Categories => print_json(&portal.categories.list(&query)),
                Entity::Topics => print_json(&portal.topics.list(&query)),
                Entity::Replies => print_json(&portal.replies.list(&query)),
            }
        }
        Command::Show { entity, id } => {
            let by_id = Criteria::new().field("id", id.as_str());
            let all = Query::new();
            let found = match entity {
                Entity::Feedback => first_json(portal.feedback.filter(&by_id, &all))?,
                Entity::Categories => portal.categories.get(&id).map(|r| to_json(&r)).transpose()?,
                Entity::Topics => portal.topics.get(&id).map(|r| to_json(&r)).transpose()?,
                Entity::Replies => first_json(portal.replies.filter(&by_id, &all))?,
            };
            match found {
                Some(json) => {
                    println!("{json}");
                    Ok(())
                }
                None => Err(StoreError::NotFound {
                    storage_key: entity.storage_key().to_string(),
                    id,
                }),
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> StoreResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn first_json<T: Serialize>(records: Vec<T>) -> StoreResult<Option<String>> {
    records.first().map(to_json).transpose()
}

fn print_json<T: Serialize>(value: &T) -> StoreResult<()> {
    println!("{}", to_json(value)?);
    Ok(())
}

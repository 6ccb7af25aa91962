// ghsearch command-line entry point.
// Parses arguments, sets up logging and storage, and dispatches to subcommands.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;

use ghsearch::cache::open_persistent;
use ghsearch::github::Repository;
use ghsearch::history::SearchHistory;
use ghsearch::logging::{self, LogLevel};
use ghsearch::pager::RepoPager;
use ghsearch::query::{MIN_QUERY_LENGTH, is_searchable, sanitize_query};
use ghsearch::{Config, ErrorKind, RequestCoordinator, SearchError};

/// Upper bound on pages fetched by `repos --all`.
const MAX_PAGES: u32 = 50;

#[derive(Parser, Debug)]
#[command(name = "ghsearch", version, about = "Search GitHub users and their repositories")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search users by login or name
    Users {
        query: String,
        /// Results per page (defaults to GHSEARCH_USERS_PER_PAGE or 5)
        #[arg(long)]
        per_page: Option<u32>,
    },
    /// List a user's public repositories
    Repos {
        login: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Repositories per page (defaults to GHSEARCH_REPOS_PER_PAGE or 30)
        #[arg(long)]
        per_page: Option<u32>,
        /// Fetch every page
        #[arg(long, conflicts_with = "page")]
        all: bool,
    },
    /// Show or clear recent searches
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Manage the local response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    List,
    Clear,
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Delete every cached response
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if !e.is_user_visible() => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = hint(&e) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn hint(err: &SearchError) -> Option<String> {
    match (err, err.kind()) {
        (SearchError::RateLimited { reset_at: Some(at) }, _) => Some(format!(
            "limit resets at {}; set GITHUB_TOKEN for a higher limit",
            at.format("%H:%M:%S UTC")
        )),
        (_, ErrorKind::RateLimit) => Some("set GITHUB_TOKEN for a higher limit".to_string()),
        (_, ErrorKind::Transient) | (_, ErrorKind::Unknown) => {
            Some("GitHub may be unreachable; try again shortly".to_string())
        }
        _ => None,
    }
}

async fn run() -> ghsearch::Result<()> {
    let cli = Cli::parse();

    logging::init(LogLevel::from_env().raised_by(cli.verbose));

    let config = Config::from_env();
    config.validate()?;
    let storage = open_persistent(config.storage_path.as_deref());
    debug!(api_url = %config.api_url, "Configuration loaded");

    match cli.command {
        Commands::Users { query, per_page } => {
            let query = sanitize_query(&query);
            if !is_searchable(&query) {
                return Err(SearchError::Config(format!(
                    "query must have at least {} letters, digits or dashes",
                    MIN_QUERY_LENGTH
                )));
            }

            let coordinator = RequestCoordinator::from_config(&config, storage.clone())?;
            let per_page = per_page.unwrap_or(config.pagination.users_per_page);
            let result = coordinator.search_users(&query, per_page).await?;
            SearchHistory::new(storage).add(&query);

            println!(
                "{} users match \"{}\"{}",
                result.total_count,
                query,
                if result.incomplete_results {
                    " (incomplete)"
                } else {
                    ""
                }
            );
            for user in &result.items {
                println!("{:<40} {}", user.login, user.html_url);
            }
        }
        Commands::Repos {
            login,
            page,
            per_page,
            all,
        } => {
            let coordinator = RequestCoordinator::from_config(&config, storage)?;
            let per_page = per_page.unwrap_or(config.pagination.repos_per_page);

            if all {
                let mut pager = RepoPager::new(per_page);
                pager.load(&coordinator, &login).await;
                pager.load_all(&coordinator, MAX_PAGES).await;
                print_repos(pager.items());
                if let Some(err) = pager.error() {
                    if !pager.items().is_empty() {
                        eprintln!("Stopped early after page {}", pager.page());
                    }
                    return Err(err.clone());
                }
            } else {
                let repos = coordinator
                    .get_user_repositories(&login, page, per_page)
                    .await?;
                print_repos(&repos);
            }
        }
        Commands::History { action } => {
            let history = SearchHistory::new(storage);
            match action.unwrap_or(HistoryAction::List) {
                HistoryAction::List => {
                    for entry in history.entries() {
                        println!("{}", entry);
                    }
                }
                HistoryAction::Clear => history.clear(),
            }
        }
        Commands::Cache {
            action: CacheAction::Clear,
        } => {
            let coordinator = RequestCoordinator::from_config(&config, storage)?;
            let count = coordinator.cache().len();
            coordinator.cache().clear();
            println!("Removed {} cached responses", count);
        }
    }

    Ok(())
}

fn print_repos(repos: &[Repository]) {
    for repo in repos {
        println!(
            "{:<40} {:>6}★ {:<12} {}",
            repo.full_name,
            repo.stargazers_count,
            repo.language.as_deref().unwrap_or("-"),
            repo.description.as_deref().unwrap_or("")
        );
    }
}

//! CodeIndex CLI - code-indexing and semantic-search service for developer assistants.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use codeindex::application::{invalidate, WatchedRepo, Watcher};
use codeindex::connector::adapter::CodeIndexMcpServer;
use codeindex::connector::api::{load_global_config, load_repo_config, Container, ContainerConfig};
use codeindex::domain::SearchQuery;

/// CodeIndex - code-indexing and semantic-search service for developer assistants
#[derive(Parser)]
#[command(name = "codeindex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the data directory (metrics, process-local state)
    #[arg(short, long, global = true, default_value = "~/.codeindex")]
    data_dir: String,

    /// Path to the global YAML config
    #[arg(short, long, global = true, default_value = "codeindex.global.yaml")]
    config: String,

    /// Root directory containing one subdirectory per watched/invalidated repository
    #[arg(long, global = true, default_value = ".")]
    repos_root: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a code repository
    Index {
        /// Path to the repository to index
        path: String,

        /// Force a full re-index, ignoring cached file hashes
        #[arg(long)]
        full: bool,
    },

    /// Search across indexed repositories
    Search {
        /// The search query
        query: String,

        /// Repository name, or "all" for every indexed repository
        #[arg(long, default_value = "all")]
        repo: String,

        /// Maximum number of results
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Opaque pagination cursor from a previous response
        #[arg(long)]
        cursor: Option<String>,
    },

    /// Watch every repository under --repos-root and re-index on head change
    Watch,

    /// Signal that a file was edited out-of-band, bumping its repo's index version
    Invalidate {
        /// Absolute path to the edited file
        path: String,
    },

    /// Show indexing statistics for a repository
    Stats {
        /// Repository name
        repo: String,
    },

    /// Serve the search_code tool over stdio via the Model Context Protocol
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let data_dir = expand_tilde(&cli.data_dir);
    let global = load_global_config(Path::new(&cli.config)).await;
    let container = Arc::new(Container::new(ContainerConfig { data_dir, global }).await?);

    match cli.command {
        Commands::Index { path, full } => run_index(&container, &path, full).await?,
        Commands::Search { query, repo, limit, cursor } => run_search(&container, query, repo, limit, cursor).await?,
        Commands::Watch => run_watch(&container, &cli.repos_root).await?,
        Commands::Invalidate { path } => run_invalidate(&container, &cli.repos_root, &path).await,
        Commands::Stats { repo } => run_stats(&container, &repo).await?,
        Commands::Serve => run_serve(&container).await?,
    }

    Ok(())
}

async fn run_index(container: &Container, path: &str, full: bool) -> Result<()> {
    let repo_path = PathBuf::from(path);
    let repo_name = repo_path.file_name().and_then(|n| n.to_str()).unwrap_or("repo").to_string();
    let config = load_repo_config(&repo_path).await.context("loading repo config")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("  {spinner:.green} {msg}").expect("invalid progress bar template"));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner.set_message(format!("indexing {repo_name}..."));

    let result = container.index_pipeline().index(&repo_path, &repo_name, &config, !full).await?;

    spinner.finish_and_clear();
    println!("indexed {repo_name}: {} files processed, {} skipped, {} chunks created", result.files_processed, result.files_skipped, result.chunks_created);
    if !result.errors.is_empty() {
        println!("{} file(s) failed:", result.errors.len());
        for err in &result.errors {
            println!("  {}: {}", err.file_path, err.message);
        }
    }
    Ok(())
}

async fn run_search(container: &Container, query: String, repo: String, limit: usize, cursor: Option<String>) -> Result<()> {
    let mut search_query = SearchQuery::new(query).with_repo(repo).with_limit(limit);
    if let Some(cursor) = cursor {
        search_query = search_query.with_cursor(cursor);
    }

    let response = container.search_router().search(search_query).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn run_watch(container: &Container, repos_root: &str) -> Result<()> {
    let root = PathBuf::from(repos_root);
    let mut repos = Vec::new();
    let mut entries = tokio::fs::read_dir(&root).await.context("reading repos root")?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        match load_repo_config(&path).await {
            Ok(config) => repos.push(WatchedRepo { name, path, config }),
            Err(e) => tracing::warn!("skipping {name}: {e}"),
        }
    }

    info!("watching {} repositories under {repos_root}", repos.len());
    let pipeline = Arc::new(container.index_pipeline());
    let watcher = Watcher::new(pipeline, repos, std::time::Duration::from_secs(30));

    let cancel = CancellationToken::new();
    let watch_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        watch_cancel.cancel();
    });
    watcher.run(cancel).await;
    Ok(())
}

async fn run_invalidate(container: &Container, repos_root: &str, edited_path: &str) {
    match container.cache() {
        Some(cache) => invalidate(&cache, Path::new(repos_root), Path::new(edited_path)).await,
        None => tracing::warn!("cache unavailable; invalidation hook is a no-op for {edited_path}"),
    }
}

async fn run_stats(container: &Container, repo: &str) -> Result<()> {
    use codeindex::application::{Filter, VECTOR_COLLECTION};

    let filter = Filter::new().eq_str("repo", repo);
    let chunks = container.vector_repo().scroll(VECTOR_COLLECTION, &filter, 1000).await?;
    println!("repository: {repo}");
    println!("chunks indexed (sampled up to 1000): {}", chunks.len());

    if let Some(graph) = container.graph_repo() {
        let hashes = graph.get_all_file_hashes(repo).await.unwrap_or_default();
        println!("files tracked in graph: {}", hashes.len());
    } else {
        println!("files tracked in graph: unavailable (no graph store)");
    }
    Ok(())
}

async fn run_serve(container: &Arc<Container>) -> Result<()> {
    let router = Arc::new(container.search_router());
    let server = CodeIndexMcpServer::new(router);
    let service = server.serve(stdio()).await.context("starting MCP stdio server")?;
    service.waiting().await.context("MCP server loop")?;
    Ok(())
}

/// Expand ~ to the home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest).to_string_lossy().to_string();
        }
    }
    path.to_string()
}

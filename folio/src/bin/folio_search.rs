//! folio-search: run the panel's search against a site's index from the shell
//!
//! Useful for checking how a published `index.json` ranks a query, or what
//! markup the panel would show for it.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use folio::loader::load_index;
use folio::search::{evaluate, QueryLimits};
use folio::{source_for, HttpIndexSource, IndexSource, LoadState, MemoryDocument, PanelConfig, SearchOutcome, SearchPanel};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio-search")]
#[command(about = "Query a Folio site index the way the search panel does", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON panel configuration (weights, limits, messages)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print ranked hits and the relaxation stage that produced them
    Query(QueryArgs),
    /// Print the panel markup for a query
    Render(QueryArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Index location: a path to index.json or an http(s) URL
    #[arg(short, long, required_unless_present = "site", conflicts_with = "site")]
    index: Option<String>,

    /// Site base URL; the index is fetched from the configured `index_url`
    #[arg(short, long)]
    site: Option<Url>,

    /// Query as typed into the search box
    query: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr) // stdout carries results only
        .init();

    let config = match &cli.config {
        Some(path) => PanelConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PanelConfig::default(),
    };

    match cli.command {
        Commands::Query(args) => run_query(&config, &args).await,
        Commands::Render(args) => run_render(config, &args).await,
    }
}

fn index_source(config: &PanelConfig, args: &QueryArgs) -> Result<Arc<dyn IndexSource>> {
    match (&args.index, &args.site) {
        (Some(location), _) => Ok(source_for(location)?),
        (None, Some(site)) => Ok(Arc::new(HttpIndexSource::for_site(config, site)?)),
        (None, None) => bail!("either --index or --site is required"),
    }
}

async fn run_query(config: &PanelConfig, args: &QueryArgs) -> Result<()> {
    let source = index_source(config, args)?;
    let engine = load_index(source.as_ref(), config.weights)
        .await
        .with_context(|| format!("loading index from {}", source.describe()))?;

    let limits = QueryLimits {
        max_results: config.max_results,
        min_query_chars: config.min_query_chars,
    };
    match evaluate(Some(&engine), &args.query, limits) {
        SearchOutcome::Idle => {
            println!("query shorter than {} characters", config.min_query_chars);
        }
        SearchOutcome::Loading => println!("{}", config.loading_message),
        SearchOutcome::NoResults => println!("{}", config.empty_message),
        SearchOutcome::Hits { stage, hits } => {
            println!("stage: {:?}", stage);
            for (rank, hit) in hits.iter().enumerate() {
                let title = engine
                    .snapshot()
                    .get(&hit.permalink)
                    .map(|r| r.title.as_str())
                    .unwrap_or("");
                println!("{:>2}. {:>8.3}  {}  {}", rank + 1, hit.score, hit.permalink, title);
            }
        }
    }
    Ok(())
}

async fn run_render(config: PanelConfig, args: &QueryArgs) -> Result<()> {
    let source = index_source(&config, args)?;
    let location = source.describe();
    let mut document = MemoryDocument::new();
    document.type_query(&args.query);

    let Some(panel) = SearchPanel::init(document, config, source) else {
        bail!("page is missing a search anchor");
    };
    if let LoadState::Failed(reason) = panel.index_settled().await {
        bail!("loading index from {}: {}", location, reason);
    }

    panel.search_now();
    let document = panel.teardown();
    // teardown hides the panel but leaves the last markup in place
    println!("{}", document.panel_html());
    if let Some(position) = document.panel_position() {
        tracing::debug!(top = position.top, right = position.right, "panel position");
    }
    Ok(())
}

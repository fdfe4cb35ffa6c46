mod config;
mod error;
mod models;
mod output;
mod pipeline;
mod scrapers;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use config::Config;
use models::ListingReference;
use scrapers::{DaysOnSite, ProxyRoute, SearchQuery};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Collect for-rent-by-owner leads from listing search results")]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file with the proxy API key, timings and browser options
    #[arg(short, long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// Fetch pages directly instead of through the proxy
    #[arg(long, global = true)]
    no_proxy: bool,

    /// Show the browser window
    #[arg(long, global = true)]
    visible: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search listings and save the links of every result
    Crawl(CrawlCommand),
    /// Visit saved links and write by-owner contacts to CSV
    Enrich(EnrichCommand),
    /// Crawl, then enrich the links just found
    Run(RunCommand),
}

#[derive(Args)]
struct SearchArgs {
    /// City and state, e.g. "Stamford, CT"
    #[arg(short, long)]
    location: String,

    /// Listing category
    #[arg(long, default_value = "rentals")]
    category: String,

    /// Sort results newest first
    #[arg(long)]
    newest: bool,

    /// Minimum monthly price
    #[arg(long)]
    min_price: Option<u32>,

    /// Only listings posted within 1, 7, 14, 30 or 90 days
    #[arg(short, long)]
    days: Option<DaysOnSite>,

    /// Number of result pages to walk
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pages: Option<u32>,
}

impl From<SearchArgs> for SearchQuery {
    fn from(args: SearchArgs) -> Self {
        Self {
            location: args.location,
            category: args.category,
            sort_newest: args.newest,
            min_price: args.min_price,
            days_on_site: args.days,
            page_count: args.pages,
        }
    }
}

#[derive(Args)]
struct CrawlCommand {
    #[command(flatten)]
    search: SearchArgs,

    /// Links file; named after the search by default
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct EnrichCommand {
    /// JSON list of listing links produced by `crawl`
    #[arg(short, long)]
    input: PathBuf,

    /// CSV report to write
    #[arg(short, long, default_value = "owner_listings.csv")]
    output: PathBuf,
}

#[derive(Args)]
struct RunCommand {
    #[command(flatten)]
    search: SearchArgs,

    /// Links file; named after the search by default
    #[arg(long)]
    links: Option<PathBuf>,

    /// CSV report to write
    #[arg(short, long, default_value = "owner_listings.csv")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("🏠 Owner Leads");
    info!("==========================================");

    let mut config = Config::load(&cli.config)?;
    if cli.visible {
        config.browser.headless = false;
    }
    let proxy = proxy_route(&config, &cli.config, cli.no_proxy)?;

    match cli.command {
        Commands::Crawl(cmd) => {
            let query = SearchQuery::from(cmd.search);
            let path = cmd.output.unwrap_or_else(|| PathBuf::from(query.links_filename()));
            crawl(config, proxy, query, &path).await?;
        }
        Commands::Enrich(cmd) => {
            let links = output::read_links(&cmd.input).await?;
            enrich(config, proxy, links, cmd.output).await?;
        }
        Commands::Run(cmd) => {
            let query = SearchQuery::from(cmd.search);
            let path = cmd.links.unwrap_or_else(|| PathBuf::from(query.links_filename()));
            let links = crawl(config.clone(), proxy.clone(), query, &path).await?;
            if links.is_empty() {
                warn!("No listing links were extracted, skipping enrichment");
                return Ok(());
            }
            enrich(config, proxy, links, cmd.output).await?;
        }
    }

    Ok(())
}

fn proxy_route(config: &Config, config_path: &Path, no_proxy: bool) -> anyhow::Result<ProxyRoute> {
    if no_proxy {
        warn!("Proxy disabled, pages will be fetched directly");
        return Ok(ProxyRoute::direct());
    }
    let key = config.require_api_key(config_path)?;
    info!("Proxy API key loaded");
    ProxyRoute::new(Some(key.to_string()), config.proxy.clone())
}

async fn crawl(
    config: Config,
    proxy: ProxyRoute,
    query: SearchQuery,
    path: &Path,
) -> anyhow::Result<Vec<ListingReference>> {
    let links =
        tokio::task::spawn_blocking(move || pipeline::collect_links(&config, proxy, &query))
            .await
            .context("Crawl task panicked")??;

    if links.is_empty() {
        warn!("No property links were extracted");
        return Ok(links);
    }

    for (i, link) in links.iter().enumerate() {
        println!("{}. {}", i + 1, link);
    }
    output::write_links(path, &links).await?;
    Ok(links)
}

async fn enrich(
    config: Config,
    proxy: ProxyRoute,
    links: Vec<ListingReference>,
    report: PathBuf,
) -> anyhow::Result<()> {
    info!("Checking {} listings for owner contacts", links.len());
    let summary = tokio::task::spawn_blocking(move || {
        pipeline::collect_leads(&config, proxy, &links, &report)
    })
    .await
    .context("Enrichment task panicked")??;

    info!("✅ Found {} by-owner listings", summary.eligible);
    Ok(())
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use skillradar_client::{HhConfig, HhFetcher, HtmdCleaner, ReqwestJsonClient};
use skillradar_core::models::{NormalizedVacancy, Region};
use skillradar_core::throttle::{ThrottleConfig, ThrottledClient};
use skillradar_core::traits::{ArtifactStore, Cleaner, RegionFetcher};
use skillradar_core::{HhNormalizer, Pipeline, run_name};
use skillradar_store::{LocalStorage, StorageConfig};

#[derive(Parser)]
#[command(name = "skillradar", version, about = "HeadHunter vacancy collector")]
struct Cli {
    /// Application root (defaults to ~/.skillradar)
    #[arg(long, global = true, env = "SKILLRADAR_HOME")]
    home: Option<PathBuf>,

    #[command(flatten)]
    api: ApiArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ApiArgs {
    /// HeadHunter API root
    #[arg(
        long,
        global = true,
        env = "SKILLRADAR_API_URL",
        default_value = skillradar_client::hh::DEFAULT_API_URL
    )]
    api_url: String,

    /// User-Agent sent with every request (HeadHunter requires one)
    #[arg(long, global = true, env = "SKILLRADAR_USER_AGENT")]
    user_agent: Option<String>,

    /// Minimum delay between requests, in milliseconds
    #[arg(long, global = true, env = "SKILLRADAR_REQUEST_DELAY_MS", default_value_t = 250)]
    delay_ms: u64,

    /// Random extra delay of up to this many milliseconds per request
    #[arg(long, global = true, env = "SKILLRADAR_REQUEST_JITTER_MS", default_value_t = 0)]
    jitter_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, normalize, and store vacancies matching a query
    Fetch {
        /// Search text, e.g. "Rust developer"
        #[arg(short, long)]
        query: String,

        /// Number of vacancies to collect
        #[arg(short, long, default_value_t = 20)]
        count: usize,

        /// Region id (see `skillradar regions`)
        #[arg(short, long)]
        region: Option<u32>,

        /// Detail requests in flight at once
        #[arg(long, default_value_t = 1)]
        concurrency: usize,
    },

    /// List the source's regions
    Regions {
        /// Case-insensitive substring to match region names against
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Print a stored normalized batch as JSON
    Show {
        /// Run name, e.g. vacancies_2024-05-01_12-00-00
        run: String,

        /// Render descriptions from HTML to Markdown
        #[arg(long, default_value_t = false)]
        markdown: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("skillradar=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            query,
            count,
            region,
            concurrency,
        } => {
            let config = hh_config(&cli.api)?.with_detail_concurrency(concurrency);
            let fetcher = build_fetcher(&cli.api, config)?;
            let store = open_store(cli.home)?;
            cmd_fetch(fetcher, store, &query, count, region).await?;
        }
        Commands::Regions { filter } => {
            let fetcher = build_fetcher(&cli.api, hh_config(&cli.api)?)?;
            cmd_regions(&fetcher, filter.as_deref()).await?;
        }
        Commands::Show { run, markdown } => {
            let store = open_store(cli.home)?;
            cmd_show(&store, &run, markdown)?;
        }
    }

    Ok(())
}

type Fetcher = HhFetcher<ThrottledClient<ReqwestJsonClient>>;

fn hh_config(api: &ApiArgs) -> Result<HhConfig> {
    let mut config = HhConfig::default()
        .with_base_url(&api.api_url)
        .map_err(|e| anyhow::anyhow!(e))?;
    if let Some(user_agent) = &api.user_agent {
        config = config.with_user_agent(user_agent.as_str());
    }
    Ok(config)
}

fn build_fetcher(api: &ApiArgs, config: HhConfig) -> Result<Fetcher> {
    let http = ReqwestJsonClient::with_options(&config.user_agent, config.timeout)
        .context("Failed to create HTTP client")?;
    let throttle = ThrottleConfig::new(Duration::from_millis(api.delay_ms))
        .with_jitter(Duration::from_millis(api.jitter_ms));
    Ok(HhFetcher::with_client(
        ThrottledClient::new(http, throttle),
        config,
    ))
}

fn open_store(home: Option<PathBuf>) -> Result<LocalStorage> {
    let config = match home {
        Some(root) => StorageConfig::new(root),
        None => StorageConfig::from_env().map_err(|e| anyhow::anyhow!(e))?,
    };
    tracing::debug!(root = %config.root.display(), "Using storage root");
    Ok(LocalStorage::new(config))
}

async fn cmd_fetch(
    fetcher: Fetcher,
    store: LocalStorage,
    query: &str,
    count: usize,
    region: Option<u32>,
) -> Result<()> {
    let pipeline = Pipeline::new(fetcher, HhNormalizer::new(), store);
    let name = run_name(chrono::Utc::now());

    let vacancies = pipeline
        .run_named(&name, query, count, region)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    println!("Run {name}: stored {} vacancies", vacancies.len());
    for vacancy in &vacancies {
        println!(
            "  {} | {} | {} | {}",
            vacancy.id,
            vacancy.title,
            vacancy.company_name.as_deref().unwrap_or("-"),
            vacancy.location.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}

async fn cmd_regions(fetcher: &Fetcher, filter: Option<&str>) -> Result<()> {
    let regions = fetcher
        .fetch_regions()
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    let matching = filter_regions(&regions, filter);
    if matching.is_empty() {
        println!("No regions found");
        return Ok(());
    }

    for region in &matching {
        match &region.parent_id {
            Some(parent) => println!("{:>6}  {} (in {parent})", region.id, region.name),
            None => println!("{:>6}  {}", region.id, region.name),
        }
    }
    println!("\nTotal: {} regions", matching.len());

    Ok(())
}

fn filter_regions<'a>(regions: &'a [Region], filter: Option<&str>) -> Vec<&'a Region> {
    match filter.map(str::to_lowercase) {
        Some(needle) => regions
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect(),
        None => regions.iter().collect(),
    }
}

fn cmd_show(store: &LocalStorage, run: &str, markdown: bool) -> Result<()> {
    let mut vacancies = store
        .load_normalized(run)
        .map_err(|e| anyhow::anyhow!(e))?;

    if markdown {
        render_descriptions(&HtmdCleaner::new(), &mut vacancies)?;
    }

    println!("{}", serde_json::to_string_pretty(&vacancies)?);
    Ok(())
}

fn render_descriptions<C: Cleaner>(cleaner: &C, vacancies: &mut [NormalizedVacancy]) -> Result<()> {
    for vacancy in vacancies.iter_mut() {
        if let Some(html) = &vacancy.description {
            let text = cleaner.clean(html).map_err(|e| anyhow::anyhow!(e))?;
            vacancy.description = Some(text);
        }
    }
    Ok(())
}

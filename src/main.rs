use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use chapterspin::{
    execute_fetch, BrowserPageFetcher, HttpPageFetcher, OpenRouterClient, PageFetcher, Pipeline,
    PipelineConfig, StageModels, StdinGate, Workspace,
};

#[derive(Parser)]
#[command(name = "chapterspin")]
#[command(author, version, long_about = None)]
#[command(about = "Scrape a chapter and spin it through an AI writing pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a chapter page into the working directory
    Scrape {
        /// Chapter URL
        #[arg(short, long)]
        url: String,

        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Run the writing pipeline on a previously scraped chapter
    Spin {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Scrape, then run the writing pipeline
    Run {
        /// Chapter URL
        #[arg(short, long)]
        url: String,

        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        fetch: FetchArgs,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Working directory for all artifacts
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Renderer {
    /// Headless Chromium: rendered DOM plus full-page screenshot
    Browser,
    /// Plain HTTP GET, no screenshot
    Http,
}

#[derive(Args)]
struct FetchArgs {
    /// How the chapter page is fetched
    #[arg(long, value_enum, default_value = "browser")]
    renderer: Renderer,

    /// Chromium executable (auto-detected if omitted)
    #[arg(long)]
    browser: Option<PathBuf>,
}

#[derive(Args)]
struct PipelineArgs {
    /// Model used for every stage
    #[arg(short, long)]
    model: Option<String>,

    /// Chat-completion endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Read the start of the edited chapter aloud after scoring
    #[arg(long)]
    narrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape { url, common, fetch } => {
            setup_logging(common.verbose);
            scrape(&url, &Workspace::new(common.output_dir), fetch).await
        }
        Commands::Spin { common, pipeline } => {
            setup_logging(common.verbose);
            spin(build_config(common.output_dir, pipeline)?).await
        }
        Commands::Run {
            url,
            common,
            fetch,
            pipeline,
        } => {
            setup_logging(common.verbose);
            let config = build_config(common.output_dir, pipeline)?;
            scrape(&url, &config.workspace, fetch).await?;
            spin(config).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn build_config(output_dir: PathBuf, args: PipelineArgs) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::from_env().context("Failed to load pipeline configuration")?;
    config.workspace = Workspace::new(output_dir);
    config.narrate = args.narrate;
    if let Some(model) = args.model {
        config.models = StageModels::uniform(model);
    }
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    Ok(config)
}

fn build_fetcher(args: FetchArgs) -> Result<Box<dyn PageFetcher>> {
    if let Renderer::Browser = args.renderer {
        let mut browser = BrowserPageFetcher::new();
        if let Some(path) = args.browser {
            browser = browser.with_executable(path);
        }
        if browser.is_available() {
            return Ok(Box::new(browser));
        }
        warn!("No Chromium executable found, falling back to plain HTTP fetch without screenshot");
    }
    let http = HttpPageFetcher::new().context("Failed to create page fetcher")?;
    Ok(Box::new(http))
}

async fn scrape(url: &str, workspace: &Workspace, args: FetchArgs) -> Result<()> {
    let fetcher = build_fetcher(args)?;
    execute_fetch(fetcher.as_ref(), url, workspace)
        .await
        .with_context(|| format!("Failed to scrape {}", url))?;
    Ok(())
}

async fn spin(config: PipelineConfig) -> Result<()> {
    let client = OpenRouterClient::new(config.client_config());
    let pipeline = Pipeline::new(config, Box::new(client), Box::new(StdinGate::new()));

    let report = pipeline
        .run_from_workspace()
        .await
        .context("Chapter pipeline failed")?;

    info!("Final version saved: {:?}", report.artifact.path);
    info!(
        "Complete: run {}, score {}, {} chars archived",
        report.run_id,
        report.score,
        report.artifact.text.chars().count()
    );

    Ok(())
}

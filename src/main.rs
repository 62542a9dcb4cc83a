use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reviews_widget::dom::{site_skeleton, DomView};
use reviews_widget::transport::EnvelopeSource;
use reviews_widget::{Config, Page, PageEvent, RefreshOutcome, ReviewFetcher, ReviewsController};

#[derive(Parser)]
#[command(name = "reviews-widget")]
#[command(about = "Fetch, watch and render the reviews widget")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(long, default_value = ".reviews-widget/config.yml")]
    config: PathBuf,

    /// Override the reviews endpoint
    #[arg(long, env = "REVIEWS_ENDPOINT")]
    endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the review envelope once and print it as JSON
    Fetch,

    /// Load reviews into the page skeleton and print the reviews region
    Render,

    /// Keep the page running with periodic refresh until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reviews_widget=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(endpoint) = cli.endpoint {
        config.reviews.endpoint = endpoint;
    }
    let fetcher = ReviewFetcher::from_config(&config.reviews)?;

    match cli.command {
        Commands::Fetch => fetch(fetcher).await?,
        Commands::Render => render(fetcher).await?,
        Commands::Watch => watch(&config, fetcher).await?,
    }

    Ok(())
}

async fn fetch(fetcher: ReviewFetcher) -> Result<()> {
    let envelope = fetcher
        .fetch_envelope()
        .await
        .context("Failed to fetch reviews")?;

    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

async fn render(fetcher: ReviewFetcher) -> Result<()> {
    let document = site_skeleton();
    let controller = ReviewsController::new(fetcher, DomView::new(document.clone()));

    if let RefreshOutcome::Failed(e) = controller.refresh_reviews(true).await {
        info!(error = %e, "Rendering error state");
    }

    let region = document
        .query_class("reviews-display")
        .into_iter()
        .next()
        .context("Page skeleton has no reviews area")?;
    println!("{}", document.outer_html(region));
    Ok(())
}

async fn watch(config: &Config, fetcher: ReviewFetcher) -> Result<()> {
    let page = Page::new(site_skeleton(), config, fetcher);

    page.start();
    page.dispatch(PageEvent::Loaded).await;
    info!("Watching reviews, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    page.debug_reviews();
    page.dispatch(PageEvent::BeforeUnload).await;
    Ok(())
}
